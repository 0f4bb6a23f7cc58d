// all the same numeric type of some size to allow casting/interop
pub type NodeId = u32;
pub type FaceId = u64;
pub type AppId = u32;
pub type SeqNo = u32;

/// Simulation clock and delays, in whole microseconds
pub type SimTime = u64;

pub const MICROS_PER_SECOND: SimTime = 1_000_000;

/// Candidate list convention: the short-range broadcast face comes first
pub const BROADCAST_FACE_INDEX: usize = 0;
/// Candidate list convention: the long-range offload face (when present) comes second
pub const OFFLOAD_FACE_INDEX: usize = 1;

/// Role of a face in the candidate list
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceRole {
    Broadcast,
    Offload,
}

impl FaceRole {
    pub fn index(self) -> usize {
        match self {
            FaceRole::Broadcast => BROADCAST_FACE_INDEX,
            FaceRole::Offload => OFFLOAD_FACE_INDEX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaceRole::Broadcast => "broadcast",
            FaceRole::Offload => "offload",
        }
    }
}

/// Tags attached to a request by the substrate before the strategy sees it
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Relay hops traversed so far. `None` when the tag is missing
    /// (locally originated, or answered from the local cache).
    pub hop_count: Option<u32>,
    pub is_retransmission: bool,
}

impl RequestMetadata {
    pub fn hops(&self) -> u32 {
        self.hop_count.unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub name: String,
    pub nonce: u32,
    pub metadata: RequestMetadata,
}

/// Substrate-owned bookkeeping for an outstanding request
#[derive(Clone, Debug, PartialEq)]
pub struct PendingEntry {
    pub id: u64,
    pub name: String,
}

/// Packet-forwarding substrate the strategy runs on top of
pub trait Forwarder {
    /// Ordered candidate faces for the pending entry's name prefix
    /// (broadcast first, offload second when present).
    fn candidate_faces(&self, pending: &PendingEntry) -> Vec<FaceId>;

    fn would_violate_scope(&self, in_face: FaceId, request: &Request, out_face: FaceId) -> bool;

    fn send_request(&mut self, pending: &PendingEntry, out_face: FaceId, request: &Request);
}

/// Render microseconds as seconds with exactly six decimals
pub fn format_seconds(micros: SimTime) -> String {
    format!(
        "{}.{:06}",
        micros / MICROS_PER_SECOND,
        micros % MICROS_PER_SECOND
    )
}

/// Inverse of [`format_seconds`]. Accepts up to six decimals.
pub fn parse_seconds(text: &str) -> Option<SimTime> {
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: SimTime = whole.parse().ok()?;
    let mut micros: SimTime = 0;
    for (i, digit) in frac.bytes().enumerate() {
        micros += SimTime::from(digit - b'0') * 10u64.pow(5 - i as u32);
    }

    whole.checked_mul(MICROS_PER_SECOND)?.checked_add(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(120 * MICROS_PER_SECOND), "120.000000");
        assert_eq!(format_seconds(119_500_000), "119.500000");
        assert_eq!(format_seconds(7), "0.000007");
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("120.000000"), Some(120_000_000));
        assert_eq!(parse_seconds("0.25"), Some(250_000));
        assert_eq!(parse_seconds("3"), Some(3_000_000));
        assert_eq!(parse_seconds("1.0000001"), None);
        assert_eq!(parse_seconds("-1.0"), None);
        assert_eq!(parse_seconds(".5"), None);
    }

    #[test]
    fn test_missing_hop_tag_counts_as_zero() {
        let meta = RequestMetadata::default();
        assert_eq!(meta.hops(), 0);
        assert!(!meta.is_retransmission);
    }
}
