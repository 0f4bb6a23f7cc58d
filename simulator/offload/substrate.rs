// Simulated forwarding substrate: the faces a node owns and the
// transmissions its strategy asked for

use ndn_offload::{FaceId, Forwarder, PendingEntry, Request};

/// Local application face
pub const APP_FACE: FaceId = 1;
/// Ad-hoc WiFi face
pub const BROADCAST_FACE: FaceId = 256;
/// Point-to-point LTE face
pub const OFFLOAD_FACE: FaceId = 257;

/// Faces of one node, candidate order: broadcast first, offload second
pub struct SimForwarder {
    faces: Vec<FaceId>,
    outbox: Vec<(FaceId, Request)>,
}

impl SimForwarder {
    pub fn mobile() -> Self {
        Self::with_faces(vec![BROADCAST_FACE, OFFLOAD_FACE])
    }

    pub fn depot() -> Self {
        Self::with_faces(vec![BROADCAST_FACE])
    }

    fn with_faces(faces: Vec<FaceId>) -> Self {
        Self {
            faces,
            outbox: Vec::new(),
        }
    }

    /// Transmissions queued since the last drain
    pub fn drain_outbox(&mut self) -> Vec<(FaceId, Request)> {
        std::mem::take(&mut self.outbox)
    }
}

impl Forwarder for SimForwarder {
    fn candidate_faces(&self, _pending: &PendingEntry) -> Vec<FaceId> {
        self.faces.clone()
    }

    // Ad-hoc faces may send back out the face a request came in on;
    // point-to-point faces may not
    fn would_violate_scope(&self, in_face: FaceId, _request: &Request, out_face: FaceId) -> bool {
        in_face == out_face && out_face != BROADCAST_FACE
    }

    fn send_request(&mut self, _pending: &PendingEntry, out_face: FaceId, request: &Request) {
        self.outbox.push((out_face, request.clone()));
    }
}
