use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EventError, EventKind, MAX_PAYLOAD_BYTES};

/// A single immutable record appended to a staging block.
///
/// The `payload` is opaque to the ledger; the driver uses JSON-encoded
/// transfer data but nothing here depends on that. The digest commits the
/// kind code, the payload bytes, and the creation timestamp; the `id` is an
/// identity for display and logging and is not part of the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event.
    pub id: Uuid,

    /// The kind of record this event carries.
    pub kind: EventKind,

    /// Opaque payload, at most [`MAX_PAYLOAD_BYTES`] bytes.
    pub payload: Vec<u8>,

    /// Wall-clock creation time, `YYYY-MM-DD HH:MM:SS` (UTC).
    pub timestamp: String,

    /// Digest of `kind code || payload || timestamp`.
    pub digest: String,

    /// Validation status assigned at creation time.
    pub valid: bool,
}

impl Event {
    /// Create a new event stamped with the current wall-clock time.
    pub fn new(kind: EventKind, payload: Vec<u8>) -> Result<Self, EventError> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(EventError::PayloadTooLarge(payload.len()));
        }

        let mut event = Self {
            id: Uuid::new_v4(),
            kind,
            payload,
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            digest: String::new(),
            valid: false,
        };
        event.digest = event.compute_digest();
        event.valid = validate_event(&event);
        Ok(event)
    }

    /// Recompute the digest from the event's current contents.
    pub fn compute_digest(&self) -> String {
        let mut bytes =
            Vec::with_capacity(3 + self.payload.len() + self.timestamp.len());
        bytes.extend_from_slice(self.kind.code().to_string().as_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(self.timestamp.as_bytes());
        mn_digest::digest(&bytes)
    }
}

/// Validation hook for a single event.
///
/// A real ledger would check signatures and balances here; the simulation
/// accepts every event. The hook stays so that the call sites do not change
/// when a stricter policy lands.
pub fn validate_event(_event: &Event) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_events_have_unique_ids() {
        let a = Event::new(EventKind::Transfer, b"payload-a".to_vec()).unwrap();
        let b = Event::new(EventKind::Transfer, b"payload-b".to_vec()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn digest_matches_recomputation() {
        let event = Event::new(EventKind::Contract, b"hello".to_vec()).unwrap();
        assert_eq!(event.digest, event.compute_digest());
        assert_eq!(event.digest.len(), mn_digest::HASH_LEN);
    }

    #[test]
    fn different_payloads_produce_different_digests() {
        let make = |p: &[u8]| Event {
            id: Uuid::nil(),
            kind: EventKind::Transfer,
            payload: p.to_vec(),
            timestamp: "2026-01-01 00:00:00".into(),
            digest: String::new(),
            valid: true,
        };
        assert_ne!(make(b"a").compute_digest(), make(b"b").compute_digest());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let err = Event::new(EventKind::Transfer, vec![0u8; MAX_PAYLOAD_BYTES + 1]);
        assert!(matches!(err, Err(EventError::PayloadTooLarge(_))));
    }

    #[test]
    fn payload_at_the_limit_is_accepted() {
        assert!(Event::new(EventKind::Contract, vec![0u8; MAX_PAYLOAD_BYTES]).is_ok());
    }

    #[test]
    fn every_event_validates_by_default() {
        let event = Event::new(EventKind::Transfer, b"anything".to_vec()).unwrap();
        assert!(event.valid);
        assert!(validate_event(&event));
    }
}
