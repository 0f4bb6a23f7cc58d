use std::cell::RefCell;
use std::rc::Rc;

use crate::ndn_config::StrategyConfig;
use crate::ndn_energy::{EnergySource, EnergyState, NodeEnergy};
use crate::ndn_interface::{FaceId, Forwarder, NodeId, PendingEntry, Request, SimTime};
use crate::ndn_strategy::{Decision, DecisionCounters, OffloadStrategy};
use crate::ndn_telemetry::EnergySampler;

/// One simulated node: its energy capability, forwarding strategy and
/// (optionally) energy sampling
pub struct OffloadNode {
    node_id: NodeId,
    name: Option<String>,
    energy: NodeEnergy,
    strategy: OffloadStrategy,
    sampler: Option<EnergySampler>,
}

impl OffloadNode {
    /// Node without sampling (zero telemetry overhead)
    pub fn new(node_id: NodeId, energy: NodeEnergy, strategy: OffloadStrategy) -> Self {
        Self {
            node_id,
            name: None,
            energy,
            strategy,
            sampler: None,
        }
    }

    /// Node that samples its energy on request arrivals
    pub fn new_with_sampler(
        node_id: NodeId,
        energy: NodeEnergy,
        strategy: OffloadStrategy,
        sampler: EnergySampler,
    ) -> Self {
        Self {
            sampler: Some(sampler),
            ..Self::new(node_id, energy, strategy)
        }
    }

    /// Battery-backed energy for a node, thresholds taken from `config`
    pub fn battery(source: Rc<RefCell<dyn EnergySource>>, config: &StrategyConfig) -> NodeEnergy {
        NodeEnergy::Battery(EnergyState::with_thresholds(
            source,
            config.initial_capacity_ah,
            config.high_threshold_fraction,
            config.critical_threshold_fraction,
        ))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn get_node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name used in telemetry rows: the node name when set, else its id.
    /// Commas and line breaks would break the CSV layout and are replaced.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.replace([',', '\n', '\r'], "_"),
            None => self.node_id.to_string(),
        }
    }

    pub fn energy(&self) -> &NodeEnergy {
        &self.energy
    }

    pub fn counters(&self) -> &DecisionCounters {
        self.strategy.counters()
    }

    pub fn strategy(&self) -> &OffloadStrategy {
        &self.strategy
    }

    /// A request reached this node on `in_face`
    ///
    /// Samples energy first (when this is a sampling boundary), then lets the
    /// strategy pick at most one face and transmit through `forwarder`.
    pub fn on_request_arrival<F: Forwarder>(
        &mut self,
        now: SimTime,
        in_face: FaceId,
        request: &Request,
        pending: &PendingEntry,
        forwarder: &mut F,
    ) -> Decision {
        if let (Some(sampler), Some(state)) = (&self.sampler, self.energy.state()) {
            sampler.on_request_arrival(now, &self.label(), request.metadata.hops(), state);
        }

        self.strategy
            .after_receive_request(in_face, request, pending, self.energy.state(), forwarder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndn_energy::tests::FixedSource;
    use crate::ndn_interface::RequestMetadata;
    use crate::ndn_strategy::DropReason;
    use crate::ndn_telemetry::{CollectorSink, EnergySample};

    struct TwoFaceForwarder {
        sent: Vec<FaceId>,
    }

    impl Forwarder for TwoFaceForwarder {
        fn candidate_faces(&self, _pending: &PendingEntry) -> Vec<FaceId> {
            vec![10, 11]
        }

        fn would_violate_scope(&self, _in: FaceId, _request: &Request, _out: FaceId) -> bool {
            false
        }

        fn send_request(&mut self, _pending: &PendingEntry, out_face: FaceId, _request: &Request) {
            self.sent.push(out_face);
        }
    }

    fn request(hops: u32) -> (Request, PendingEntry) {
        let request = Request {
            name: "/video/seg=3".to_string(),
            nonce: 1,
            metadata: RequestMetadata {
                hop_count: Some(hops),
                is_retransmission: false,
            },
        };
        let pending = PendingEntry {
            id: 3,
            name: request.name.clone(),
        };
        (request, pending)
    }

    fn sampled_node(
        remaining: f64,
    ) -> (
        OffloadNode,
        Rc<RefCell<FixedSource>>,
        Rc<RefCell<CollectorSink<EnergySample>>>,
    ) {
        let config = StrategyConfig::default();
        let source = Rc::new(RefCell::new(FixedSource(remaining)));
        let samples = Rc::new(RefCell::new(CollectorSink::new()));
        let node = OffloadNode::new_with_sampler(
            4,
            OffloadNode::battery(source.clone(), &config),
            OffloadStrategy::new(&config),
            EnergySampler::new(60_000_000, samples.clone()),
        );
        (node, source, samples)
    }

    #[test]
    fn test_arrival_on_boundary_samples_and_forwards() {
        let (mut node, _, samples) = sampled_node(2.45);
        let mut forwarder = TwoFaceForwarder { sent: Vec::new() };
        let (req, pending) = request(2);

        let decision = node.on_request_arrival(120_000_000, 10, &req, &pending, &mut forwarder);
        assert_eq!(decision, Decision::ForwardVia(10));
        assert_eq!(samples.borrow().records.len(), 1);
        assert_eq!(samples.borrow().records[0].hop_count, 2);

        node.on_request_arrival(119_500_000, 10, &req, &pending, &mut forwarder);
        assert_eq!(samples.borrow().records.len(), 1);
        assert_eq!(forwarder.sent, vec![10, 10]);
    }

    #[test]
    fn test_decision_follows_battery() {
        let (mut node, source, _) = sampled_node(2.45);
        let mut forwarder = TwoFaceForwarder { sent: Vec::new() };
        let (req, pending) = request(4);

        assert_eq!(
            node.on_request_arrival(1, 10, &req, &pending, &mut forwarder),
            Decision::ForwardVia(10)
        );

        source.borrow_mut().0 = 0.70;
        assert_eq!(
            node.on_request_arrival(2, 10, &req, &pending, &mut forwarder),
            Decision::Drop(DropReason::BeyondFloodRadius)
        );

        source.borrow_mut().0 = 0.40;
        assert_eq!(
            node.on_request_arrival(3, 10, &req, &pending, &mut forwarder),
            Decision::ForwardVia(11)
        );

        assert_eq!(node.counters().forwarded(), 2);
        assert_eq!(node.counters().dropped(), 1);
    }

    #[test]
    fn test_unconstrained_node_never_samples() {
        let config = StrategyConfig::default();
        let samples = Rc::new(RefCell::new(CollectorSink::<EnergySample>::new()));
        let mut node = OffloadNode::new_with_sampler(
            0,
            NodeEnergy::Unconstrained,
            OffloadStrategy::new(&config),
            EnergySampler::new(60_000_000, samples.clone()),
        );
        let mut forwarder = TwoFaceForwarder { sent: Vec::new() };
        let (req, pending) = request(5);

        assert_eq!(
            node.on_request_arrival(60_000_000, 10, &req, &pending, &mut forwarder),
            Decision::ForwardVia(10)
        );
        assert!(samples.borrow().records.is_empty());
    }

    #[test]
    fn test_label_prefers_name() {
        let config = StrategyConfig::default();
        let node = OffloadNode::new(7, NodeEnergy::Unconstrained, OffloadStrategy::new(&config));
        assert_eq!(node.label(), "7");

        let node = node.with_name("depot,1");
        assert_eq!(node.label(), "depot_1");
        assert_eq!(node.name(), Some("depot,1"));
    }

    #[test]
    fn test_label_strips_line_breaks() {
        let config = StrategyConfig::default();
        let node = OffloadNode::new(8, NodeEnergy::Unconstrained, OffloadStrategy::new(&config))
            .with_name("ped\r\n8,a");
        assert_eq!(node.label(), "ped__8_a");
        assert!(!node.label().contains(['\n', '\r', ',']));
    }
}
