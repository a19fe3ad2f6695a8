//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Session identifiers are opaque; accept anything non-blank up to 128 chars
pub fn is_valid_session_id(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.len() <= 128 && trimmed == s
}
