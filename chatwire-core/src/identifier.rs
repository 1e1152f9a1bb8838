//! ID generation utilities.
//!
//! Parts and tool calls need stable identifiers even when a vendor never
//! supplies one, so that a later tool response can still be correlated.

use uuid::Uuid;

/// Generate a synthetic tool call ID.
///
/// Used when a dialect opens a function call or code execution without
/// an upstream identifier.
///
/// # Example
///
/// ```rust
/// use chatwire_core::identifier::generate_tool_call_id;
///
/// let id = generate_tool_call_id();
/// assert!(id.starts_with("call_"));
/// assert_eq!(id.len(), 37); // "call_" + 32 hex chars
/// ```
#[must_use]
pub fn generate_tool_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// Generate a unique part ID.
///
/// Returns a UUID v4 string prefixed with "part_".
#[must_use]
pub fn generate_part_id() -> String {
    format!("part_{}", Uuid::new_v4().simple())
}

/// Generate a unique stream ID.
///
/// Returns a UUID v4 string prefixed with "gen_". One is minted per
/// dispatched generation and threaded through log spans.
#[must_use]
pub fn generate_stream_id() -> String {
    format!("gen_{}", Uuid::new_v4().simple())
}

/// Type-safe wrapper for a part ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PartId(String);

impl PartId {
    /// Create a new random part ID.
    #[must_use]
    pub fn new() -> Self {
        Self(generate_part_id())
    }

    /// Create from an existing string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for PartId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tool_call_id() {
        let id = generate_tool_call_id();
        assert!(id.starts_with("call_"));
        assert_eq!(id.len(), 37);
    }

    #[test]
    fn test_generate_unique_ids() {
        assert_ne!(generate_tool_call_id(), generate_tool_call_id());
        assert_ne!(PartId::new(), PartId::new());
    }

    #[test]
    fn test_part_id_type() {
        let id = PartId::new();
        assert!(id.as_str().starts_with("part_"));

        let custom = PartId::from_string("part_custom");
        assert_eq!(custom.to_string(), "part_custom");
    }

    #[test]
    fn test_stream_id_prefix() {
        assert!(generate_stream_id().starts_with("gen_"));
    }

    #[test]
    fn test_serde_transparent() {
        let id = PartId::from("part_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"part_1\"");
    }
}
