use log::{debug, warn};

use crate::ndn_config::StrategyConfig;
use crate::ndn_energy::{EnergyReading, EnergyState};
use crate::ndn_interface::{FaceId, FaceRole, Forwarder, PendingEntry, Request, RequestMetadata};

pub const STRATEGY_NAME: &str = "/localhost/nfd/strategy/broadcast";
pub const STRATEGY_VERSION: u64 = 2;

/// Problems constructing a strategy from an instance name
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// Name does not start with [`STRATEGY_NAME`]
    UnknownStrategy(String),
    /// Version component present but not [`STRATEGY_VERSION`]
    UnsupportedVersion(u64),
    /// Components after the version
    ParametersNotAccepted(Vec<String>),
    /// Component that is not valid percent-encoding
    MalformedName(String),
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::UnknownStrategy(name) => write!(f, "unknown strategy {}", name),
            StrategyError::UnsupportedVersion(v) => {
                write!(f, "BroadcastStrategy does not support version {}", v)
            }
            StrategyError::ParametersNotAccepted(params) => write!(
                f,
                "BroadcastStrategy does not accept parameters (got /{})",
                params.join("/")
            ),
            StrategyError::MalformedName(name) => write!(f, "malformed strategy name {}", name),
        }
    }
}

impl std::error::Error for StrategyError {}

/// Where a request falls in the priority chain
///
/// Computed fresh for every request; the only state carried between requests
/// is the node's energy level, which moves on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestState {
    Critical,
    FirstAttemptFresh,
    FirstAttemptRetx,
    DegradedWithinRadius,
    DegradedBeyondRadius,
    HealthyWithinRadius,
    HealthyBeyondRadius,
}

impl RequestState {
    /// Face the state forwards on, `None` for the drop states
    pub fn target(self) -> Option<FaceRole> {
        match self {
            RequestState::Critical | RequestState::FirstAttemptRetx => Some(FaceRole::Offload),
            RequestState::FirstAttemptFresh
            | RequestState::DegradedWithinRadius
            | RequestState::HealthyWithinRadius => Some(FaceRole::Broadcast),
            RequestState::DegradedBeyondRadius | RequestState::HealthyBeyondRadius => None,
        }
    }
}

/// Hop limits per energy band
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HopLimits {
    pub degraded: u32,
    pub healthy: u32,
}

impl Default for HopLimits {
    fn default() -> Self {
        Self {
            degraded: 3,
            healthy: 5,
        }
    }
}

/// Run the priority chain. First matching rule wins:
///
/// 1. critical energy (`0 < remaining <= critical`) -> offload
/// 2. hop count 0 -> broadcast, or offload when it is a retransmission
/// 3. degraded energy (`remaining <= high`) -> broadcast within `degraded` hops
/// 4. otherwise -> broadcast within `healthy` hops
///
/// `energy` is `None` for nodes without an energy model; rules 1 and 3 never
/// match for them.
pub fn classify(
    energy: Option<&EnergyReading>,
    metadata: &RequestMetadata,
    limits: &HopLimits,
) -> RequestState {
    if energy.map_or(false, EnergyReading::is_critical) {
        return RequestState::Critical;
    }

    let hops = metadata.hops();
    if hops == 0 {
        return if metadata.is_retransmission {
            RequestState::FirstAttemptRetx
        } else {
            RequestState::FirstAttemptFresh
        };
    }

    if energy.map_or(false, EnergyReading::is_degraded) {
        if hops > limits.degraded {
            RequestState::DegradedBeyondRadius
        } else {
            RequestState::DegradedWithinRadius
        }
    } else if hops > limits.healthy {
        RequestState::HealthyBeyondRadius
    } else {
        RequestState::HealthyWithinRadius
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Hop count exceeds the flood radius of the node's energy band
    BeyondFloodRadius,
    /// Rule needs the offload face but the candidate list has only one entry
    MissingOffloadFace,
    /// Substrate returned no candidate faces at all
    NoCandidates,
    /// Sending on the chosen face would cross a scope boundary
    ScopeViolation,
}

/// Outcome of one invocation: at most one face
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    ForwardVia(FaceId),
    Drop(DropReason),
}

/// Map a classified request to a face of the candidate list, without side effects
pub fn select(state: RequestState, candidates: &[FaceId]) -> Decision {
    let role = match state.target() {
        Some(role) => role,
        None => return Decision::Drop(DropReason::BeyondFloodRadius),
    };

    if candidates.is_empty() {
        return Decision::Drop(DropReason::NoCandidates);
    }

    match candidates.get(role.index()) {
        Some(face) => Decision::ForwardVia(*face),
        None => Decision::Drop(DropReason::MissingOffloadFace),
    }
}

/// Running totals kept by a strategy instance
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecisionCounters {
    pub forwarded_broadcast: u64,
    pub forwarded_offload: u64,
    pub dropped_beyond_radius: u64,
    pub dropped_missing_offload: u64,
    pub dropped_no_candidates: u64,
    pub dropped_scope: u64,
}

impl DecisionCounters {
    pub fn forwarded(&self) -> u64 {
        self.forwarded_broadcast + self.forwarded_offload
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_beyond_radius
            + self.dropped_missing_offload
            + self.dropped_no_candidates
            + self.dropped_scope
    }

    pub fn merge(&mut self, other: &DecisionCounters) {
        self.forwarded_broadcast += other.forwarded_broadcast;
        self.forwarded_offload += other.forwarded_offload;
        self.dropped_beyond_radius += other.dropped_beyond_radius;
        self.dropped_missing_offload += other.dropped_missing_offload;
        self.dropped_no_candidates += other.dropped_no_candidates;
        self.dropped_scope += other.dropped_scope;
    }

    fn count_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::BeyondFloodRadius => self.dropped_beyond_radius += 1,
            DropReason::MissingOffloadFace => self.dropped_missing_offload += 1,
            DropReason::NoCandidates => self.dropped_no_candidates += 1,
            DropReason::ScopeViolation => self.dropped_scope += 1,
        }
    }
}

/// Energy-aware single next-hop strategy for a node with a broadcast and an
/// offload face
///
/// Registered as the "broadcast" strategy for historical reasons; it never
/// fans out, every request goes to at most one face.
pub struct OffloadStrategy {
    instance_name: String,
    limits: HopLimits,
    counters: DecisionCounters,
}

impl OffloadStrategy {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            instance_name: versioned_name(),
            limits: HopLimits {
                degraded: config.degraded_hop_limit,
                healthy: config.healthy_hop_limit,
            },
            counters: DecisionCounters::default(),
        }
    }

    /// Build from an instance name such as `/localhost/nfd/strategy/broadcast/%FD%02`
    pub fn from_instance_name(name: &str, config: &StrategyConfig) -> Result<Self, StrategyError> {
        let parsed = parse_instance_name(name)?;
        if parsed.prefix != STRATEGY_NAME {
            return Err(StrategyError::UnknownStrategy(name.to_string()));
        }
        if !parsed.parameters.is_empty() {
            return Err(StrategyError::ParametersNotAccepted(parsed.parameters));
        }
        if let Some(version) = parsed.version {
            if version != STRATEGY_VERSION {
                return Err(StrategyError::UnsupportedVersion(version));
            }
        }
        Ok(Self::new(config))
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn counters(&self) -> &DecisionCounters {
        &self.counters
    }

    pub fn hop_limits(&self) -> &HopLimits {
        &self.limits
    }

    /// Pure decision for one request: classify, then pick from the candidates
    pub fn decide(
        &self,
        energy: Option<&EnergyReading>,
        metadata: &RequestMetadata,
        candidates: &[FaceId],
    ) -> Decision {
        select(classify(energy, metadata, &self.limits), candidates)
    }

    /// Handle an incoming request: decide, check scope, and transmit on the
    /// chosen face if allowed
    pub fn after_receive_request<F: Forwarder>(
        &mut self,
        in_face: FaceId,
        request: &Request,
        pending: &PendingEntry,
        energy: Option<&EnergyState>,
        forwarder: &mut F,
    ) -> Decision {
        let candidates = forwarder.candidate_faces(pending);
        let reading = energy.map(EnergyState::reading);
        let state = classify(reading.as_ref(), &request.metadata, &self.limits);

        let decision = match select(state, &candidates) {
            Decision::ForwardVia(out_face)
                if forwarder.would_violate_scope(in_face, request, out_face) =>
            {
                debug!(
                    "{}: out face {} would violate scope (in face {})",
                    request.name, out_face, in_face
                );
                Decision::Drop(DropReason::ScopeViolation)
            }
            decision => decision,
        };

        match decision {
            Decision::ForwardVia(out_face) => {
                debug!("{}: {:?} -> out face {}", request.name, state, out_face);
                forwarder.send_request(pending, out_face, request);
                match state.target() {
                    Some(FaceRole::Offload) => self.counters.forwarded_offload += 1,
                    _ => self.counters.forwarded_broadcast += 1,
                }
            }
            Decision::Drop(reason) => {
                if reason == DropReason::MissingOffloadFace {
                    warn!(
                        "{}: {:?} needs an offload face but only {} candidate(s) exist, dropping",
                        request.name,
                        state,
                        candidates.len()
                    );
                }
                self.counters.count_drop(reason);
            }
        }

        decision
    }
}

fn versioned_name() -> String {
    format!("{}/%FD%{:02X}", STRATEGY_NAME, STRATEGY_VERSION)
}

/// Strategy instance name split into prefix, version and parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstanceName {
    pub prefix: String,
    pub version: Option<u64>,
    pub parameters: Vec<String>,
}

/// Split at the last version component (`%FD` marker). Without one the whole
/// name is the prefix and there are no parameters.
pub fn parse_instance_name(name: &str) -> Result<ParsedInstanceName, StrategyError> {
    let components: Vec<&str> = name.split('/').filter(|c| !c.is_empty()).collect();

    let version_at = components.iter().rposition(|c| c.starts_with("%FD"));
    let Some(at) = version_at else {
        return Ok(ParsedInstanceName {
            prefix: join_components(&components),
            version: None,
            parameters: Vec::new(),
        });
    };

    let version = decode_version(&components[at][3..])
        .ok_or_else(|| StrategyError::MalformedName(name.to_string()))?;

    Ok(ParsedInstanceName {
        prefix: join_components(&components[..at]),
        version: Some(version),
        parameters: components[at + 1..].iter().map(|c| c.to_string()).collect(),
    })
}

fn join_components(components: &[&str]) -> String {
    format!("/{}", components.join("/"))
}

/// Big-endian nonNegativeInteger from `%XX` escapes, 1 to 8 bytes
fn decode_version(escaped: &str) -> Option<u64> {
    let bytes = escaped.as_bytes();
    if bytes.is_empty() || bytes.len() % 3 != 0 || bytes.len() / 3 > 8 {
        return None;
    }

    let mut value = 0u64;
    for chunk in bytes.chunks(3) {
        if chunk[0] != b'%' {
            return None;
        }
        let hex = std::str::from_utf8(&chunk[1..]).ok()?;
        value = (value << 8) | u64::from(u8::from_str_radix(hex, 16).ok()?);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndn_energy::tests::fixed_state;

    const BROADCAST: FaceId = 256;
    const OFFLOAD: FaceId = 257;
    const APP: FaceId = 1;

    /// Forwarder double that records every transmission
    struct RecordingForwarder {
        faces: Vec<FaceId>,
        blocked: Option<FaceId>,
        sent: Vec<(FaceId, String)>,
    }

    impl RecordingForwarder {
        fn two_faces() -> Self {
            Self {
                faces: vec![BROADCAST, OFFLOAD],
                blocked: None,
                sent: Vec::new(),
            }
        }
    }

    impl Forwarder for RecordingForwarder {
        fn candidate_faces(&self, _pending: &PendingEntry) -> Vec<FaceId> {
            self.faces.clone()
        }

        fn would_violate_scope(&self, _in: FaceId, _request: &Request, out: FaceId) -> bool {
            self.blocked == Some(out)
        }

        fn send_request(&mut self, _pending: &PendingEntry, out_face: FaceId, request: &Request) {
            self.sent.push((out_face, request.name.clone()));
        }
    }

    fn request(hops: u32, retx: bool) -> Request {
        Request {
            name: "/data/1".to_string(),
            nonce: 7,
            metadata: RequestMetadata {
                hop_count: if hops == 0 { None } else { Some(hops) },
                is_retransmission: retx,
            },
        }
    }

    fn pending() -> PendingEntry {
        PendingEntry {
            id: 1,
            name: "/data/1".to_string(),
        }
    }

    fn reading(remaining: f64) -> EnergyReading {
        EnergyReading {
            remaining,
            high_threshold: 2.45 * 0.35,
            critical_threshold: 2.45 * 0.20,
        }
    }

    fn meta(hops: u32, retx: bool) -> RequestMetadata {
        request(hops, retx).metadata
    }

    #[test]
    fn test_critical_always_offloads() {
        let limits = HopLimits::default();
        for remaining in [0.01, 0.2, 0.40, 0.48] {
            for hops in 0..10 {
                for retx in [false, true] {
                    let state = classify(Some(&reading(remaining)), &meta(hops, retx), &limits);
                    assert_eq!(state, RequestState::Critical);
                    assert_eq!(
                        select(state, &[BROADCAST, OFFLOAD]),
                        Decision::ForwardVia(OFFLOAD)
                    );
                }
            }
        }
    }

    #[test]
    fn test_first_attempt_above_critical() {
        let limits = HopLimits::default();
        for remaining in [0.5, 0.7, 1.0, 2.45] {
            let fresh = classify(Some(&reading(remaining)), &meta(0, false), &limits);
            assert_eq!(fresh, RequestState::FirstAttemptFresh);
            assert_eq!(select(fresh, &[BROADCAST, OFFLOAD]), Decision::ForwardVia(BROADCAST));

            let retx = classify(Some(&reading(remaining)), &meta(0, true), &limits);
            assert_eq!(retx, RequestState::FirstAttemptRetx);
            assert_eq!(select(retx, &[BROADCAST, OFFLOAD]), Decision::ForwardVia(OFFLOAD));
        }
    }

    #[test]
    fn test_healthy_flood_radius() {
        let limits = HopLimits::default();
        for hops in 1..=5 {
            let state = classify(Some(&reading(2.0)), &meta(hops, false), &limits);
            assert_eq!(state, RequestState::HealthyWithinRadius);
            assert_eq!(select(state, &[BROADCAST, OFFLOAD]), Decision::ForwardVia(BROADCAST));
        }
        for hops in 6..12 {
            let state = classify(Some(&reading(2.0)), &meta(hops, true), &limits);
            assert_eq!(state, RequestState::HealthyBeyondRadius);
            assert_eq!(
                select(state, &[BROADCAST, OFFLOAD]),
                Decision::Drop(DropReason::BeyondFloodRadius)
            );
        }
    }

    #[test]
    fn test_degraded_flood_radius() {
        let limits = HopLimits::default();
        for remaining in [0.5, 0.7, 0.85] {
            for hops in 1..=3 {
                let state = classify(Some(&reading(remaining)), &meta(hops, false), &limits);
                assert_eq!(state, RequestState::DegradedWithinRadius);
            }
            for hops in 4..9 {
                let state = classify(Some(&reading(remaining)), &meta(hops, false), &limits);
                assert_eq!(state, RequestState::DegradedBeyondRadius);
                assert_eq!(
                    select(state, &[BROADCAST, OFFLOAD]),
                    Decision::Drop(DropReason::BeyondFloodRadius)
                );
            }
        }
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let limits = HopLimits::default();

        let at_critical = classify(Some(&reading(2.45 * 0.20)), &meta(4, false), &limits);
        assert_eq!(at_critical, RequestState::Critical);

        let at_high = classify(Some(&reading(2.45 * 0.35)), &meta(4, false), &limits);
        assert_eq!(at_high, RequestState::DegradedBeyondRadius);
    }

    #[test]
    fn test_threshold_values_through_strategy() {
        use crate::ndn_energy::{
            CRITICAL_THRESHOLD_FRACTION, DEFAULT_INITIAL_CAPACITY_AH, HIGH_THRESHOLD_FRACTION,
        };

        let (source, energy) =
            fixed_state(DEFAULT_INITIAL_CAPACITY_AH * CRITICAL_THRESHOLD_FRACTION);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();

        let decision =
            strategy.after_receive_request(BROADCAST, &request(4, false), &pending(), Some(&energy), &mut forwarder);
        assert_eq!(decision, Decision::ForwardVia(OFFLOAD));

        source.borrow_mut().0 = DEFAULT_INITIAL_CAPACITY_AH * HIGH_THRESHOLD_FRACTION;
        let decision =
            strategy.after_receive_request(BROADCAST, &request(4, false), &pending(), Some(&energy), &mut forwarder);
        assert_eq!(decision, Decision::Drop(DropReason::BeyondFloodRadius));
        assert_eq!(forwarder.sent, vec![(OFFLOAD, "/data/1".to_string())]);
    }

    #[test]
    fn test_empty_battery_falls_into_degraded_band() {
        let state = classify(Some(&reading(0.0)), &meta(2, false), &HopLimits::default());
        assert_eq!(state, RequestState::DegradedWithinRadius);
    }

    #[test]
    fn test_unconstrained_node_skips_energy_rules() {
        let limits = HopLimits::default();
        assert_eq!(classify(None, &meta(0, true), &limits), RequestState::FirstAttemptRetx);
        assert_eq!(classify(None, &meta(4, false), &limits), RequestState::HealthyWithinRadius);
        assert_eq!(classify(None, &meta(6, false), &limits), RequestState::HealthyBeyondRadius);
    }

    #[test]
    fn test_missing_offload_face_drops() {
        assert_eq!(
            select(RequestState::Critical, &[BROADCAST]),
            Decision::Drop(DropReason::MissingOffloadFace)
        );
        assert_eq!(
            select(RequestState::FirstAttemptRetx, &[BROADCAST]),
            Decision::Drop(DropReason::MissingOffloadFace)
        );
        assert_eq!(
            select(RequestState::FirstAttemptFresh, &[BROADCAST]),
            Decision::ForwardVia(BROADCAST)
        );
        assert_eq!(
            select(RequestState::HealthyWithinRadius, &[]),
            Decision::Drop(DropReason::NoCandidates)
        );
    }

    #[test]
    fn test_full_battery_fresh_request_uses_broadcast() {
        let (_, energy) = fixed_state(2.45);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();

        let decision =
            strategy.after_receive_request(APP, &request(0, false), &pending(), Some(&energy), &mut forwarder);

        assert_eq!(decision, Decision::ForwardVia(BROADCAST));
        assert_eq!(forwarder.sent, vec![(BROADCAST, "/data/1".to_string())]);
        assert_eq!(strategy.counters().forwarded_broadcast, 1);
    }

    #[test]
    fn test_low_battery_relay_uses_offload() {
        let (_, energy) = fixed_state(0.40);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();

        let decision =
            strategy.after_receive_request(BROADCAST, &request(2, false), &pending(), Some(&energy), &mut forwarder);

        assert_eq!(decision, Decision::ForwardVia(OFFLOAD));
        assert_eq!(forwarder.sent.len(), 1);
        assert_eq!(strategy.counters().forwarded_offload, 1);
    }

    #[test]
    fn test_degraded_relay_beyond_radius_is_dropped() {
        let (_, energy) = fixed_state(0.70);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();

        let decision =
            strategy.after_receive_request(BROADCAST, &request(4, false), &pending(), Some(&energy), &mut forwarder);

        assert_eq!(decision, Decision::Drop(DropReason::BeyondFloodRadius));
        assert!(forwarder.sent.is_empty());
        assert_eq!(strategy.counters().dropped_beyond_radius, 1);
    }

    #[test]
    fn test_healthy_relay_beyond_radius_sends_nothing() {
        let (_, energy) = fixed_state(2.0);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();

        strategy.after_receive_request(BROADCAST, &request(6, false), &pending(), Some(&energy), &mut forwarder);
        assert!(forwarder.sent.is_empty());

        strategy.after_receive_request(BROADCAST, &request(5, false), &pending(), Some(&energy), &mut forwarder);
        assert_eq!(forwarder.sent, vec![(BROADCAST, "/data/1".to_string())]);
    }

    #[test]
    fn test_scope_violation_drops_silently() {
        let (_, energy) = fixed_state(2.45);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder::two_faces();
        forwarder.blocked = Some(BROADCAST);

        let decision =
            strategy.after_receive_request(APP, &request(0, false), &pending(), Some(&energy), &mut forwarder);

        assert_eq!(decision, Decision::Drop(DropReason::ScopeViolation));
        assert!(forwarder.sent.is_empty());
        assert_eq!(strategy.counters().dropped_scope, 1);
    }

    #[test]
    fn test_single_face_retransmission_counts_missing_offload() {
        let (_, energy) = fixed_state(2.45);
        let mut strategy = OffloadStrategy::new(&StrategyConfig::default());
        let mut forwarder = RecordingForwarder {
            faces: vec![BROADCAST],
            blocked: None,
            sent: Vec::new(),
        };

        let decision =
            strategy.after_receive_request(APP, &request(0, true), &pending(), Some(&energy), &mut forwarder);

        assert_eq!(decision, Decision::Drop(DropReason::MissingOffloadFace));
        assert!(forwarder.sent.is_empty());
        assert_eq!(strategy.counters().dropped_missing_offload, 1);
        assert_eq!(strategy.counters().dropped(), 1);
    }

    #[test]
    fn test_custom_hop_limits() {
        let config = StrategyConfig {
            healthy_hop_limit: 8,
            ..Default::default()
        };
        let strategy = OffloadStrategy::new(&config);
        assert_eq!(
            strategy.decide(Some(&reading(2.0)), &meta(7, false), &[BROADCAST, OFFLOAD]),
            Decision::ForwardVia(BROADCAST)
        );
    }

    #[test]
    fn test_instance_name_parsing() {
        let config = StrategyConfig::default();

        let strategy = OffloadStrategy::from_instance_name(STRATEGY_NAME, &config).unwrap();
        assert_eq!(strategy.instance_name(), "/localhost/nfd/strategy/broadcast/%FD%02");

        assert!(OffloadStrategy::from_instance_name(
            "/localhost/nfd/strategy/broadcast/%FD%02",
            &config
        )
        .is_ok());

        assert_eq!(
            OffloadStrategy::from_instance_name("/localhost/nfd/strategy/broadcast/%FD%05", &config)
                .err(),
            Some(StrategyError::UnsupportedVersion(5))
        );

        assert_eq!(
            OffloadStrategy::from_instance_name(
                "/localhost/nfd/strategy/broadcast/%FD%02/fast",
                &config
            )
            .err(),
            Some(StrategyError::ParametersNotAccepted(vec!["fast".to_string()]))
        );

        assert!(matches!(
            OffloadStrategy::from_instance_name("/localhost/nfd/strategy/multicast", &config),
            Err(StrategyError::UnknownStrategy(_))
        ));

        assert!(matches!(
            parse_instance_name("/localhost/nfd/strategy/broadcast/%FDzz"),
            Err(StrategyError::MalformedName(_))
        ));
    }

    #[test]
    fn test_multi_byte_version() {
        let parsed = parse_instance_name("/a/b/%FD%01%00").unwrap();
        assert_eq!(parsed.prefix, "/a/b");
        assert_eq!(parsed.version, Some(256));
        assert!(parsed.parameters.is_empty());
    }
}
