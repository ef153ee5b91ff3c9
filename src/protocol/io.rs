//! Payload encoding and decoding
//!
//! Every decode takes the raw notification object (which may be absent) and
//! returns a typed result. Callers log and drop on failure; nothing here
//! panics on peer input.

use tracing::warn;

use super::types::{ClickEvent, MenuItem};
use super::{MENU_ITEM_CLICKED_NOTIF, MENU_ITEM_INFO_NOTIF};
use crate::error::{FinderMenuError, Result};

/// Maximum length for raw payloads in logs
const MAX_RAW_LOG_PREVIEW: usize = 200;

/// Get a truncated preview of a raw payload for logging.
///
/// Returns the preview and the full length in bytes. The cut never splits a
/// UTF-8 character.
pub fn log_preview(raw: &str) -> (&str, usize) {
    let len = raw.len();
    if len <= MAX_RAW_LOG_PREVIEW {
        return (raw, len);
    }
    let mut end = MAX_RAW_LOG_PREVIEW;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    (&raw[..end], len)
}

/// Serialize a menu snapshot for `menuItemInfoNotif`
pub fn encode_menu_items(items: &[MenuItem]) -> Result<String> {
    serde_json::to_string(items).map_err(|source| FinderMenuError::Encode {
        channel: MENU_ITEM_INFO_NOTIF,
        source,
    })
}

/// Parse a `menuItemInfoNotif` payload
pub fn decode_menu_items(payload: Option<&str>) -> Result<Vec<MenuItem>> {
    let raw = payload.ok_or(FinderMenuError::MissingPayload {
        channel: MENU_ITEM_INFO_NOTIF,
    })?;
    serde_json::from_str(raw).map_err(|source| {
        let (preview, raw_len) = log_preview(raw);
        warn!(raw_preview = %preview, raw_len, error = %source, "Malformed menu snapshot");
        FinderMenuError::Decode {
            channel: MENU_ITEM_INFO_NOTIF,
            source,
        }
    })
}

/// Serialize a click for `menuItemClickedNotif`
pub fn encode_click(click: &ClickEvent) -> Result<String> {
    serde_json::to_string(click).map_err(|source| FinderMenuError::Encode {
        channel: MENU_ITEM_CLICKED_NOTIF,
        source,
    })
}

/// Parse a `menuItemClickedNotif` payload
pub fn decode_click(payload: Option<&str>) -> Result<ClickEvent> {
    let raw = payload.ok_or(FinderMenuError::MissingPayload {
        channel: MENU_ITEM_CLICKED_NOTIF,
    })?;
    serde_json::from_str(raw).map_err(|source| {
        let (preview, raw_len) = log_preview(raw);
        warn!(raw_preview = %preview, raw_len, error = %source, "Malformed click event");
        FinderMenuError::Decode {
            channel: MENU_ITEM_CLICKED_NOTIF,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preview_truncation() {
        let short = "hello";
        let (preview, len) = log_preview(short);
        assert_eq!(preview, "hello");
        assert_eq!(len, 5);

        let long = "a".repeat(500);
        let (preview, len) = log_preview(&long);
        assert_eq!(preview.len(), 200);
        assert_eq!(len, 500);
    }

    #[test]
    fn test_log_preview_respects_char_boundary() {
        // 'é' is two bytes, so byte 200 falls inside a character
        let long = format!("a{}", "é".repeat(150));
        let (preview, len) = log_preview(&long);
        assert_eq!(preview.len(), 199);
        assert_eq!(len, 301);
    }

    #[test]
    fn test_menu_items_wire_format() {
        let items = vec![MenuItem::new(0, "Open Terminal"), MenuItem::new(1, "Zip")];
        let json = encode_menu_items(&items).unwrap();
        assert_eq!(
            json,
            r#"[{"id":0,"title":"Open Terminal"},{"id":1,"title":"Zip"}]"#
        );
    }

    #[test]
    fn test_click_wire_format() {
        let click = ClickEvent::new(2, "/Users/me/Projects");
        let json = encode_click(&click).unwrap();
        assert_eq!(json, r#"{"id":2,"target":"/Users/me/Projects"}"#);
    }

    #[test]
    fn test_empty_menu_round_trip() {
        let json = encode_menu_items(&[]).unwrap();
        assert_eq!(json, "[]");
        assert!(decode_menu_items(Some(&json)).unwrap().is_empty());
    }

    #[test]
    fn test_click_round_trip_with_spaces_and_unicode() {
        let click = ClickEvent::new(1, "/Users/me/My Folder/日本語 ü");
        let json = encode_click(&click).unwrap();
        assert_eq!(decode_click(Some(&json)).unwrap(), click);
    }

    #[test]
    fn test_menu_round_trip_preserves_duplicate_titles() {
        let items = vec![MenuItem::new(0, "Build"), MenuItem::new(1, "Build")];
        let json = encode_menu_items(&items).unwrap();
        assert_eq!(decode_menu_items(Some(&json)).unwrap(), items);
    }

    #[test]
    fn test_encode_of_decoded_payload_is_identical() {
        let raw = r#"[{"id":0,"title":"a b"},{"id":1,"title":"ç"}]"#;
        let items = decode_menu_items(Some(raw)).unwrap();
        assert_eq!(encode_menu_items(&items).unwrap(), raw);
    }

    #[test]
    fn test_decode_menu_missing_payload() {
        match decode_menu_items(None) {
            Err(FinderMenuError::MissingPayload { channel }) => {
                assert_eq!(channel, MENU_ITEM_INFO_NOTIF);
            }
            other => panic!("Expected MissingPayload, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_menu_rejects_wrong_shape() {
        // A click payload is not a snapshot
        let result = decode_menu_items(Some(r#"{"id":0,"target":"/tmp"}"#));
        assert!(matches!(result, Err(FinderMenuError::Decode { .. })));
    }

    #[test]
    fn test_decode_click_rejects_garbage() {
        let result = decode_click(Some("not json"));
        assert!(matches!(result, Err(FinderMenuError::Decode { .. })));
    }

    #[test]
    fn test_decode_click_requires_target() {
        let result = decode_click(Some(r#"{"id":3}"#));
        assert!(matches!(result, Err(FinderMenuError::Decode { .. })));
    }

    #[test]
    fn test_decode_click_accepts_negative_id() {
        let click = decode_click(Some(r#"{"id":-1,"target":"/tmp"}"#)).unwrap();
        assert_eq!(click.id, -1);
    }
}
