// Offload Simulator Runner

use super::config::OffloadSimConfig;
use super::stats::*;
use super::substrate::{SimForwarder, APP_FACE, BROADCAST_FACE, OFFLOAD_FACE};
use hashbrown::{HashMap, HashSet};
use log::{debug, error, info};
use ndn_offload::ndn_interface::{format_seconds, MICROS_PER_SECOND};
use ndn_offload::ndn_telemetry::SharedSink;
use ndn_offload::{
    CsvSink, DecisionCounters, EnergySample, EnergySampler, FaceId, LiIonBattery, NodeId,
    OffloadNode, OffloadStrategy, PendingEntry, Request, RequestMetadata, SeqNo, SimTime,
    TracerRegistry,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

// ============================================================================
// Core Structures
// ============================================================================

/// Consumer application id on every node
const CONSUMER_APP: u32 = 0;

/// Main simulator runner
pub struct OffloadSimRunner {
    config: OffloadSimConfig,
    seed: [u8; 32],
    rng: StdRng,
    now: SimTime,

    nodes: BTreeMap<NodeId, SimNode>,

    // Event queue ordered by (time, insertion order)
    events: BTreeMap<(SimTime, u64), SimEvent>,
    next_event: u64,

    // Consumer-side state
    pending: HashMap<(NodeId, SeqNo), PendingRequest>,
    next_seq: HashMap<NodeId, SeqNo>,

    // Telemetry
    energy_sink: Option<Rc<RefCell<CsvSink<EnergySample>>>>,
    tracers: TracerRegistry,

    stats: TrafficStats,
}

/// A simulated node
struct SimNode {
    node: OffloadNode,
    /// None for depots
    battery: Option<Rc<RefCell<LiIonBattery>>>,
    forwarder: SimForwarder,
    /// Request attempts already seen, for loop suppression
    seen: HashSet<(NodeId, SeqNo, u32)>,
    depleted_at: Option<SimTime>,
}

impl SimNode {
    fn is_up(&self) -> bool {
        self.depleted_at.is_none()
    }

    fn is_depot(&self) -> bool {
        self.battery.is_none()
    }
}

/// One outstanding request of a consumer
struct PendingRequest {
    first_sent: SimTime,
    last_sent: SimTime,
    retx_count: u32,
    attempt: u32,
}

/// Identifies the attempt a transmission belongs to
#[derive(Clone, Copy, Debug)]
struct Origin {
    consumer: NodeId,
    seq: SeqNo,
    attempt: u32,
}

#[derive(Debug)]
enum SimEvent {
    /// Consumer issues its next request
    Issue { consumer: NodeId },
    /// Request reaches a node
    Arrive {
        node: NodeId,
        in_face: FaceId,
        request: Request,
        origin: Origin,
    },
    /// Data reaches the consumer
    Satisfy { origin: Origin, hop_count: u32 },
    /// Retransmission timer
    Timeout { origin: Origin },
    /// Once a second: idle drain and depletion checks
    Tick,
}

// ============================================================================
// Implementation
// ============================================================================

impl OffloadSimRunner {
    /// Create new simulator
    pub fn new(config: OffloadSimConfig) -> Self {
        // Initialize RNG with seed
        let seed = config.seed.unwrap_or_else(|| {
            let mut seed = [0u8; 32];
            rand::thread_rng().fill(&mut seed);
            seed
        });
        let rng = StdRng::from_seed(seed);

        Self {
            config,
            seed,
            rng,
            now: 0,
            nodes: BTreeMap::new(),
            events: BTreeMap::new(),
            next_event: 0,
            pending: HashMap::new(),
            next_seq: HashMap::new(),
            energy_sink: None,
            tracers: TracerRegistry::new(),
            stats: TrafficStats::default(),
        }
    }

    /// Run the simulation
    pub fn run(mut self) -> SimulationResult {
        // 1. Open telemetry sinks and build the node population
        self.open_energy_sink();
        self.initialize_nodes();
        self.install_tracers();

        // 2. Seed the event queue
        let consumers: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| !n.is_depot())
            .map(|(&id, _)| id)
            .collect();
        for consumer in consumers {
            self.schedule(0, SimEvent::Issue { consumer });
        }
        self.schedule(MICROS_PER_SECOND, SimEvent::Tick);

        // 3. Process events until the end of the run
        let end = self.config.duration();
        while let Some(((time, _), event)) = self.events.pop_first() {
            if time > end {
                break;
            }
            self.now = time;
            self.handle(event);
        }

        // 4. Tear down telemetry and build final result
        let delay_rows = self.tracers.rows_written();
        self.tracers.destroy();
        if let Some(sink) = &self.energy_sink {
            sink.borrow_mut().close();
        }
        self.build_result(delay_rows)
    }

    fn schedule(&mut self, time: SimTime, event: SimEvent) {
        self.events.insert((time, self.next_event), event);
        self.next_event += 1;
    }

    fn open_energy_sink(&mut self) {
        let Some(path) = self.config.telemetry.energy_file.clone() else {
            return;
        };
        match CsvSink::<EnergySample>::create(&path) {
            Ok(mut sink) => {
                sink.set_flush_each_row(self.config.telemetry.flush_each_row);
                info!("Energy sampling to {}", path);
                self.energy_sink = Some(Rc::new(RefCell::new(sink)));
            }
            Err(e) => {
                error!(
                    "File {} cannot be opened for writing ({}). Energy sampling disabled",
                    path, e
                );
            }
        }
    }

    /// Mobile nodes first (ids 0..), depots after
    fn initialize_nodes(&mut self) {
        let battery_config = self.config.battery.clone();
        let strategy_config = self.config.strategy.clone();
        let interval = self.config.telemetry.sample_interval();

        for i in 0..self.config.mobile_nodes {
            let node_id = i as NodeId;
            let max = battery_config.max_start_percent.min(100);
            let min = battery_config.min_start_percent.min(max);
            let start_percent = self.rng.gen_range(min..=max) as f64;
            let start_energy = battery_config.full_energy_j * start_percent / 100.0;

            let mut battery = LiIonBattery::new(battery_config.full_energy_j);
            battery.drain(battery_config.full_energy_j - start_energy);
            let battery = Rc::new(RefCell::new(battery));

            let energy = OffloadNode::battery(battery.clone(), &strategy_config);
            let strategy = OffloadStrategy::new(&strategy_config);
            let node = match &self.energy_sink {
                Some(sink) => {
                    let sink: SharedSink<EnergySample> = sink.clone();
                    OffloadNode::new_with_sampler(
                        node_id,
                        energy,
                        strategy,
                        EnergySampler::new(interval, sink),
                    )
                }
                None => OffloadNode::new(node_id, energy, strategy),
            };

            debug!("Node {} starts at {:.0}%", node_id, start_percent);
            self.nodes.insert(
                node_id,
                SimNode {
                    node,
                    battery: Some(battery),
                    forwarder: SimForwarder::mobile(),
                    seen: HashSet::new(),
                    depleted_at: None,
                },
            );
        }

        for i in 0..self.config.infrastructure_nodes {
            let node_id = (self.config.mobile_nodes + i) as NodeId;
            let node = OffloadNode::new(
                node_id,
                ndn_offload::NodeEnergy::Unconstrained,
                OffloadStrategy::new(&strategy_config),
            )
            .with_name(&format!("depot{}", i));

            self.nodes.insert(
                node_id,
                SimNode {
                    node,
                    battery: None,
                    forwarder: SimForwarder::depot(),
                    seen: HashSet::new(),
                    depleted_at: None,
                },
            );
        }

        info!(
            "Initialized {} mobile node(s) and {} depot(s)",
            self.config.mobile_nodes, self.config.infrastructure_nodes
        );
    }

    fn install_tracers(&mut self) {
        self.tracers
            .set_flush_each_row(self.config.telemetry.flush_each_row);
        if let Some(path) = self.config.telemetry.delay_file.clone() {
            let nodes = self.nodes.values().map(|n| &n.node);
            self.tracers.install_all(nodes, &path);
        }
    }

    fn handle(&mut self, event: SimEvent) {
        match event {
            SimEvent::Issue { consumer } => self.issue_request(consumer),
            SimEvent::Arrive {
                node,
                in_face,
                request,
                origin,
            } => self.deliver(node, in_face, request, origin),
            SimEvent::Satisfy { origin, hop_count } => self.satisfy(origin, hop_count),
            SimEvent::Timeout { origin } => self.timeout(origin),
            SimEvent::Tick => self.tick(),
        }
    }

    // ------------------------------------------------------------------------
    // Consumer
    // ------------------------------------------------------------------------

    fn issue_request(&mut self, consumer: NodeId) {
        if !self.nodes.get(&consumer).is_some_and(SimNode::is_up) {
            return;
        }

        let seq = {
            let next = self.next_seq.entry(consumer).or_insert(0);
            let seq = *next;
            *next += 1;
            seq
        };
        self.pending.insert(
            (consumer, seq),
            PendingRequest {
                first_sent: self.now,
                last_sent: self.now,
                retx_count: 0,
                attempt: 0,
            },
        );
        self.stats.requests_issued += 1;

        self.express(Origin {
            consumer,
            seq,
            attempt: 0,
        });

        let period = self.config.consumer.request_period();
        self.schedule(self.now + period, SimEvent::Issue { consumer });
    }

    /// Hand an attempt to the consumer's own forwarder through the app face
    fn express(&mut self, origin: Origin) {
        let content = origin.seq % self.config.consumer.catalog_size.max(1);
        let request = Request {
            name: format!("/content/{}", content),
            nonce: self.rng.gen(),
            metadata: RequestMetadata {
                hop_count: None,
                is_retransmission: origin.attempt > 0,
            },
        };

        let timeout = self.config.consumer.retx_timeout();
        self.schedule(self.now + timeout, SimEvent::Timeout { origin });
        self.deliver(origin.consumer, APP_FACE, request, origin);
    }

    fn timeout(&mut self, origin: Origin) {
        let key = (origin.consumer, origin.seq);
        let max_retx = self.config.consumer.max_retransmissions;
        let up = self.nodes.get(&origin.consumer).is_some_and(SimNode::is_up);

        let Some(entry) = self.pending.get_mut(&key) else {
            return;
        };
        if entry.attempt != origin.attempt {
            return;
        }
        if !up || entry.retx_count >= max_retx {
            self.pending.remove(&key);
            self.stats.abandoned += 1;
            return;
        }

        entry.retx_count += 1;
        entry.attempt += 1;
        entry.last_sent = self.now;
        let attempt = entry.attempt;
        self.stats.retransmissions += 1;

        self.express(Origin { attempt, ..origin });
    }

    fn satisfy(&mut self, origin: Origin, hop_count: u32) {
        let Some(entry) = self.pending.remove(&(origin.consumer, origin.seq)) else {
            // Already satisfied by another copy, or abandoned
            return;
        };

        let first_delay = self.now - entry.first_sent;
        let last_delay = self.now - entry.last_sent;
        self.tracers.on_first_completion(
            origin.consumer,
            self.now,
            CONSUMER_APP,
            origin.seq,
            first_delay,
            entry.retx_count,
            hop_count,
        );
        self.tracers.on_last_retransmitted_completion(
            origin.consumer,
            self.now,
            CONSUMER_APP,
            origin.seq,
            last_delay,
            hop_count,
        );

        self.stats.satisfied += 1;
        self.stats.first_delay_total += first_delay;
        self.stats.last_delay_total += last_delay;
        self.stats.hop_count_total += hop_count as u64;
    }

    // ------------------------------------------------------------------------
    // Forwarding
    // ------------------------------------------------------------------------

    fn deliver(&mut self, node_id: NodeId, in_face: FaceId, request: Request, origin: Origin) {
        let answer_probability = {
            let Some(sim) = self.nodes.get_mut(&node_id) else {
                return;
            };
            if !sim.is_up() {
                return;
            }
            // Loop suppression: each node handles an attempt once
            if !sim.seen.insert((origin.consumer, origin.seq, origin.attempt)) {
                return;
            }
            if in_face == APP_FACE {
                None
            } else if node_id == origin.consumer {
                return;
            } else if sim.is_depot() {
                Some(self.config.radio.depot_cache_hit)
            } else {
                Some(self.config.radio.mobile_cache_hit)
            }
        };

        let hops = request.metadata.hops();
        if let Some(p) = answer_probability {
            if self.rng.gen_bool(p.clamp(0.0, 1.0)) {
                // Data retraces the broadcast path
                let back = self.config.radio.broadcast_hop_delay() * hops as SimTime;
                self.schedule(self.now + back, SimEvent::Satisfy { origin, hop_count: hops });
                self.stats.cache_hits += 1;
                return;
            }
        }

        let pending = PendingEntry {
            id: ((origin.consumer as u64) << 32) | origin.seq as u64,
            name: request.name.clone(),
        };

        let now = self.now;
        let outbox = {
            let Some(sim) = self.nodes.get_mut(&node_id) else {
                return;
            };
            sim.node
                .on_request_arrival(now, in_face, &request, &pending, &mut sim.forwarder);
            sim.forwarder.drain_outbox()
        };

        for (out_face, request) in outbox {
            self.transmit(node_id, out_face, request, origin);
        }
    }

    fn transmit(&mut self, from: NodeId, out_face: FaceId, request: Request, origin: Origin) {
        let cost = match out_face {
            BROADCAST_FACE => self.config.radio.broadcast_tx_j,
            OFFLOAD_FACE => self.config.radio.offload_tx_j,
            _ => 0.0,
        };
        self.drain(from, cost);

        let hops = request.metadata.hops();
        match out_face {
            BROADCAST_FACE => {
                self.stats.broadcast_transmissions += 1;
                let neighbours: Vec<NodeId> = self
                    .nodes
                    .iter()
                    .filter(|&(&id, n)| id != from && n.is_up())
                    .map(|(&id, _)| id)
                    .collect();
                let chosen: Vec<NodeId> = neighbours
                    .choose_multiple(&mut self.rng, self.config.radio.broadcast_neighbors)
                    .copied()
                    .collect();

                let arrival = self.now + self.config.radio.broadcast_hop_delay();
                let loss = self.config.radio.broadcast_loss.clamp(0.0, 1.0);
                for node in chosen {
                    if self.rng.gen_bool(loss) {
                        continue;
                    }
                    let mut relayed = request.clone();
                    relayed.metadata.hop_count = Some(hops + 1);
                    self.schedule(
                        arrival,
                        SimEvent::Arrive {
                            node,
                            in_face: BROADCAST_FACE,
                            request: relayed,
                            origin,
                        },
                    );
                }
            }
            OFFLOAD_FACE => {
                self.stats.offload_transmissions += 1;
                let success = self.config.radio.offload_success.clamp(0.0, 1.0);
                if self.rng.gen_bool(success) {
                    // Back to the consumer over the relay path already taken
                    let back = self.config.radio.broadcast_hop_delay() * hops as SimTime;
                    let at = self.now + self.config.radio.offload_delay() + back;
                    self.schedule(
                        at,
                        SimEvent::Satisfy {
                            origin,
                            hop_count: hops + 1,
                        },
                    );
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Energy
    // ------------------------------------------------------------------------

    fn drain(&mut self, node_id: NodeId, joules: f64) {
        let now = self.now;
        let Some(sim) = self.nodes.get_mut(&node_id) else {
            return;
        };
        let Some(battery) = &sim.battery else {
            return;
        };
        let depleted = {
            let mut battery = battery.borrow_mut();
            battery.drain(joules);
            battery.is_depleted()
        };
        if depleted && sim.depleted_at.is_none() {
            sim.depleted_at = Some(now);
            info!("Node {} battery depleted at {}s", sim.node.label(), format_seconds(now));
        }
    }

    fn tick(&mut self) {
        let idle = self.config.battery.idle_power_w;
        let ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.is_up() && !n.is_depot())
            .map(|(&id, _)| id)
            .collect();
        for id in &ids {
            self.drain(*id, idle);
        }

        if let Some(every) = self.config.battery.refresh_power_level_s {
            if every > 0 && (self.now / MICROS_PER_SECOND) % every == 0 {
                for sim in self.nodes.values() {
                    self.tracers.refresh_energy_level(&sim.node);
                }
            }
        }

        self.schedule(self.now + MICROS_PER_SECOND, SimEvent::Tick);
    }

    // ------------------------------------------------------------------------
    // Result
    // ------------------------------------------------------------------------

    fn build_result(self, delay_rows: usize) -> SimulationResult {
        let mut decisions = DecisionCounters::default();
        let mut final_percent = Vec::new();
        let mut depleted_nodes = 0;
        for sim in self.nodes.values() {
            decisions.merge(sim.node.counters());
            if let Some(state) = sim.node.energy().state() {
                final_percent.push(state.percent_remaining());
            }
            if sim.depleted_at.is_some() {
                depleted_nodes += 1;
            }
        }

        let energy_samples = self
            .energy_sink
            .as_ref()
            .map(|s| s.borrow().rows_written())
            .unwrap_or(0);

        let mut traffic = self.stats;
        traffic.outstanding = self.pending.len();

        SimulationResult {
            seed_used: self.seed,
            duration_s: self.config.duration_s,
            mobile_nodes: self.config.mobile_nodes,
            infrastructure_nodes: self.config.infrastructure_nodes,
            traffic,
            decisions,
            telemetry: TelemetryStats {
                energy_samples,
                delay_rows,
            },
            energy: EnergySummary::from_percentages(&final_percent, depleted_nodes),
        }
    }
}
