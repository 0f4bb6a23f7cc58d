// Delay tracer registry
//
// Owns every installed completion-delay tracer together with the sink each
// installation writes to. Created and torn down by whoever runs the
// simulation; there is no process-wide tracer list.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, error, info};

use crate::ndn_interface::{AppId, NodeId, SeqNo, SimTime};
use crate::ndn_node::OffloadNode;
use crate::ndn_telemetry::{CsvSink, DelayRecord, DelayTracer, TelemetrySink};

/// One installation: a sink and the tracers attached to it
struct TracerGroup {
    sink: Rc<RefCell<dyn TelemetrySink<DelayRecord>>>,
    csv: Option<Rc<RefCell<CsvSink<DelayRecord>>>>,
    tracers: IndexMap<NodeId, DelayTracer>,
}

pub struct TracerRegistry {
    groups: Vec<TracerGroup>,
    flush_each_row: bool,
}

impl Default for TracerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TracerRegistry {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            flush_each_row: true,
        }
    }

    /// Flush policy for file sinks opened by later installations
    pub fn set_flush_each_row(&mut self, flush: bool) {
        self.flush_each_row = flush;
    }

    /// Install on every node, writing to `path` (`-` for stdout)
    pub fn install_all<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a OffloadNode>,
        path: &str,
    ) -> usize {
        self.install(nodes, path)
    }

    /// Install on a single node, writing to its own `path`
    pub fn install_node(&mut self, node: &OffloadNode, path: &str) -> usize {
        self.install(std::iter::once(node), path)
    }

    /// Install on the given nodes. Opens `path` once (truncating it) and
    /// writes the header; if it cannot be opened nothing is installed.
    /// Returns the number of tracers attached.
    pub fn install<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a OffloadNode>,
        path: &str,
    ) -> usize {
        let csv = match CsvSink::<DelayRecord>::create(path) {
            Ok(mut sink) => {
                sink.set_flush_each_row(self.flush_each_row);
                Rc::new(RefCell::new(sink))
            }
            Err(e) => {
                error!("File {} cannot be opened for writing ({}). Tracing disabled", path, e);
                return 0;
            }
        };

        let sink: Rc<RefCell<dyn TelemetrySink<DelayRecord>>> = csv.clone();
        let attached = self.attach(nodes, sink, Some(csv));
        info!("Delay tracing to {}: {} node(s)", path, attached);
        attached
    }

    /// Install on the given nodes with a caller-provided sink
    pub fn install_with_sink<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a OffloadNode>,
        sink: Rc<RefCell<dyn TelemetrySink<DelayRecord>>>,
    ) -> usize {
        self.attach(nodes, sink, None)
    }

    fn attach<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a OffloadNode>,
        sink: Rc<RefCell<dyn TelemetrySink<DelayRecord>>>,
        csv: Option<Rc<RefCell<CsvSink<DelayRecord>>>>,
    ) -> usize {
        let mut tracers = IndexMap::new();
        for node in nodes {
            // Wired/infrastructure nodes have no power level to report
            let Some(energy) = node.energy().state() else {
                debug!("Node {}: no energy model, not tracing delays", node.label());
                continue;
            };
            tracers.insert(
                node.get_node_id(),
                DelayTracer::new(&node.label(), energy, sink.clone()),
            );
        }

        let attached = tracers.len();
        self.groups.push(TracerGroup { sink, csv, tracers });
        attached
    }

    pub fn num_tracers(&self) -> usize {
        self.groups.iter().map(|g| g.tracers.len()).sum()
    }

    pub fn is_traced(&self, node_id: NodeId) -> bool {
        self.groups.iter().any(|g| g.tracers.contains_key(&node_id))
    }

    /// Rows successfully written to file-backed sinks so far
    pub fn rows_written(&self) -> usize {
        self.groups
            .iter()
            .filter_map(|g| g.csv.as_ref())
            .map(|csv| csv.borrow().rows_written())
            .sum()
    }

    /// Re-read the power level of `node` into every tracer attached to it
    pub fn refresh_energy_level(&mut self, node: &OffloadNode) {
        let Some(energy) = node.energy().state() else {
            return;
        };
        for group in &mut self.groups {
            if let Some(tracer) = group.tracers.get_mut(&node.get_node_id()) {
                tracer.refresh_energy_level(energy);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn on_first_completion(
        &self,
        node_id: NodeId,
        now: SimTime,
        app_id: AppId,
        seq_no: SeqNo,
        delay: SimTime,
        retx_count: u32,
        hop_count: u32,
    ) {
        for tracer in self.tracers_for(node_id) {
            tracer.on_first_completion(now, app_id, seq_no, delay, retx_count, hop_count);
        }
    }

    pub fn on_last_retransmitted_completion(
        &self,
        node_id: NodeId,
        now: SimTime,
        app_id: AppId,
        seq_no: SeqNo,
        delay: SimTime,
        hop_count: u32,
    ) {
        for tracer in self.tracers_for(node_id) {
            tracer.on_last_retransmitted_completion(now, app_id, seq_no, delay, hop_count);
        }
    }

    fn tracers_for(&self, node_id: NodeId) -> impl Iterator<Item = &DelayTracer> {
        self.groups
            .iter()
            .filter_map(move |g| g.tracers.get(&node_id))
    }

    /// Flush and release every sink and tracer
    pub fn destroy(&mut self) {
        for group in self.groups.drain(..) {
            group.sink.borrow_mut().flush();
            if let Some(csv) = &group.csv {
                csv.borrow_mut().close();
            }
        }
        debug!("Tracer registry cleared");
    }
}

impl Drop for TracerRegistry {
    fn drop(&mut self) {
        self.destroy();
    }
}
