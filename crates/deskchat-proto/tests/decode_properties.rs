//! Property-based tests for wire decoding.
//!
//! Decoding is fed arbitrary server output. These tests check that it stays
//! total: no panics, and error bodies always reduce to readable text.

use deskchat_proto::{
    GENERIC_ERROR_MESSAGE, MessageKind, ProtocolError, RawMessage, ServerFrame,
    extract_error_message,
};
use proptest::prelude::*;

fn arbitrary_kind() -> impl Strategy<Value = MessageKind> {
    prop_oneof![Just(MessageKind::Text), Just(MessageKind::Image), Just(MessageKind::Audio)]
}

fn arbitrary_message() -> impl Strategy<Value = RawMessage> {
    (
        "2024-0[1-9]-[0-2][1-9]T[0-1][0-9]:[0-5][0-9]:[0-5][0-9]Z",
        "[a-z]{1,12}",
        arbitrary_kind(),
        ".{0,64}",
        prop::option::of("[A-Za-z0-9_-]{1,20}"),
    )
        .prop_map(|(timestamp, user_name, message_type, content, file_id)| RawMessage {
            timestamp,
            user_name,
            message_type,
            content,
            file_id,
        })
}

proptest! {
    #[test]
    fn frame_parse_never_panics(text in ".{0,256}") {
        let _ = ServerFrame::parse(&text);
    }

    #[test]
    fn unknown_actions_are_rejected(action in "[a-z_]{1,16}") {
        prop_assume!(action != "new_message" && action != "delete_message");

        let text = serde_json::json!({"action": action, "payload": {}}).to_string();
        let is_unknown = matches!(ServerFrame::parse(&text), Err(ProtocolError::UnknownAction(a)) if a == action);
        prop_assert!(is_unknown);
    }

    #[test]
    fn new_message_frames_decode(message in arbitrary_message()) {
        let text = serde_json::json!({"action": "new_message", "payload": message}).to_string();
        prop_assert_eq!(ServerFrame::parse(&text).unwrap(), ServerFrame::NewMessage(message));
    }

    #[test]
    fn error_text_is_never_empty(body in ".{0,128}") {
        let message = extract_error_message(&body);
        prop_assert!(!message.trim().is_empty());
        prop_assert_ne!(message.as_str(), "undefined");
        prop_assert_ne!(message.as_str(), "[object Object]");
    }

    #[test]
    fn string_errors_are_surfaced(text in "[A-Za-z][A-Za-z0-9 ]{0,40}") {
        let body = serde_json::json!({"error": text}).to_string();
        prop_assert_eq!(extract_error_message(&body), text);
    }

    #[test]
    fn structured_errors_fall_back(n in any::<i64>()) {
        let body = serde_json::json!({"message": {"code": n}, "error": [n]}).to_string();
        prop_assert_eq!(extract_error_message(&body), GENERIC_ERROR_MESSAGE);
    }
}
