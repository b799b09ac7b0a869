//! Key validation and the boolean encoding shared by every writer.

use super::file::TEMP_MARKER;
use crate::error::StoreError;


/// Stored form of `true`.
pub const TRUE_BYTES: &[u8] = b"1";
/// Stored form of `false`.
pub const FALSE_BYTES: &[u8] = b"0";


/// Check that `key` can be used as a file name inside the parameter directory.
///
/// Keys must be non-empty, contain no path separators or NUL bytes, must
/// not start with `.` and must not contain the temp-file marker. Both forms
/// are reserved for in-flight temp files, which the watcher ignores.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(TEMP_MARKER)
        || key.contains(['/', '\\', '\0']);
    if bad {
        Err(StoreError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}


/// Decode a stored boolean. Only `1` (optionally surrounded by whitespace,
/// as shell scripts tend to write it) is true.
pub fn decode_bool(value: &[u8]) -> bool {
    value.trim_ascii() == TRUE_BYTES
}


pub fn encode_bool(value: bool) -> &'static [u8] {
    if value {
        TRUE_BYTES
    } else {
        FALSE_BYTES
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_are_valid() {
        assert!(validate_key("IsMetric").is_ok());
        assert!(validate_key("DisableRadar_Allow").is_ok());
        assert!(validate_key("Opkr.Version-2").is_ok());
    }

    #[test]
    fn separators_and_hidden_names_are_rejected() {
        for key in ["", "a/b", "a\\b", ".hidden", "..", "nul\0byte"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "{:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn temp_marker_keys_are_rejected() {
        for key in ["Backup.tmp.old", "IsMetric.tmp.1.0"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "{:?} should be rejected",
                key
            );
        }
        assert!(validate_key("Backup.tmp").is_ok());
    }

    #[test]
    fn bool_decoding() {
        assert!(decode_bool(b"1"));
        assert!(decode_bool(b"1\n"));
        assert!(!decode_bool(b"0"));
        assert!(!decode_bool(b""));
        assert!(!decode_bool(b"true"));
        assert!(!decode_bool(b"11"));
    }

    #[test]
    fn bool_encoding_matches_decoding() {
        assert!(decode_bool(encode_bool(true)));
        assert!(!decode_bool(encode_bool(false)));
    }
}
