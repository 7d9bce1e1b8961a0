use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("payload of {0} bytes exceeds the {max} byte limit", max = crate::MAX_PAYLOAD_BYTES)]
    PayloadTooLarge(usize),
}
