//! Identity handshake for the HR/RR sensor
//!
//! The host sends a single `t`, waits for the device to settle, then drains
//! whatever the device buffered. The reply must equal [`EXPECTED_IDENTITY`]
//! byte for byte after lossy UTF-8 decoding.

use std::time::Duration;

/// Byte sent to ask the device for its identity
pub const HANDSHAKE_REQUEST: u8 = b't';

/// Identity string the sensor answers with
pub const EXPECTED_IDENTITY: &str = "HR/RR sensor";

/// Time the device needs between the request and a complete reply
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Decode a reply, replacing invalid UTF-8 sequences with U+FFFD
pub fn decode_reply(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Check a decoded reply against the expected identity
pub fn is_expected_identity(reply: &str) -> bool {
    reply == EXPECTED_IDENTITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_identity_matches() {
        assert!(is_expected_identity(&decode_reply(b"HR/RR sensor")));
    }

    #[test]
    fn test_comparison_is_verbatim() {
        assert!(!is_expected_identity("HR/RR sensor\r\n"));
        assert!(!is_expected_identity(" HR/RR sensor"));
        assert!(!is_expected_identity("hr/rr sensor"));
        assert!(!is_expected_identity(""));
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let decoded = decode_reply(&[b'H', 0xFF, b'R']);
        assert_eq!(decoded, "H\u{FFFD}R");
        assert!(!is_expected_identity(&decoded));
    }
}
