//! Reference numbers for returns and support tickets.
//!
//! Both are derived from a SHA-256 digest of their inputs, so the same inputs
//! give the same id in every process and on every platform. They are short
//! display references, not unique keys: different inputs can and will
//! collide (one in a thousand for RMAs, one in ten thousand for tickets).

use sha2::{Digest, Sha256};

/// First eight bytes of the SHA-256 digest, big-endian.
pub fn stable_hash(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// `RMA-<order id>-<3 digits>`, the suffix derived from the return reason.
pub fn return_authorization(order_id: &str, reason: &str) -> String {
    format!("RMA-{order_id}-{:03}", stable_hash(reason) % 1000)
}

/// Joins hashed fields so that shifting text between them changes the input.
const FIELD_SEPARATOR: char = '\u{1f}';

/// `TICKET-<4 digits>`, derived from the customer's message and the reason.
pub fn ticket_id(customer_message: &str, reason: &str) -> String {
    let input = format!("{customer_message}{FIELD_SEPARATOR}{reason}");
    format!("TICKET-{:04}", stable_hash(&input) % 10_000)
}
