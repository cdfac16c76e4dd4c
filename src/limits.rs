use serde::{Deserialize, Serialize};

/// Default ceiling for decoded string lengths, in bytes.
pub const MAX_STRING_LEN: u32 = 10 * 1024 * 1024;
/// Default ceiling for decoded byte array lengths.
pub const MAX_BYTES_LEN: u32 = 1024 * 1024;
/// Default ceiling for decoded sequence element counts.
pub const MAX_SEQUENCE_LEN: u32 = 1024 * 1024;

/// Sanity ceilings applied to length prefixes while decoding.
///
/// A length field above its ceiling is rejected before the reader looks at
/// how many bytes actually remain, which bounds the allocation a corrupt or
/// hostile prefix can request.
///
/// Hosts usually load these from their own configuration; missing fields
/// fall back to the defaults:
///
/// ```
/// let limits: bsatn::Limits = serde_json::from_str(r#"{"max_sequence_len": 64}"#).unwrap();
/// assert_eq!(limits.max_sequence_len, 64);
/// assert_eq!(limits.max_string_len, bsatn::limits::MAX_STRING_LEN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_string_len: u32,
    pub max_bytes_len: u32,
    pub max_sequence_len: u32,
}

impl Limits {
    /// Ceilings that accept any length representable on the wire.
    pub const UNBOUNDED: Limits = Limits {
        max_string_len: u32::MAX,
        max_bytes_len: u32::MAX,
        max_sequence_len: u32::MAX,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_string_len: MAX_STRING_LEN,
            max_bytes_len: MAX_BYTES_LEN,
            max_sequence_len: MAX_SEQUENCE_LEN,
        }
    }
}
