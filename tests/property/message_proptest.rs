//! Property-based tests for inbound message normalization
//!
//! Uses proptest to generate random inputs and verify properties

use chrono::Utc;
use proptest::prelude::*;
use roomchat::shared::{MessageOrigin, RawInboundMessage, RawUser};

fn text() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![Just(String::new()), Just("   ".to_string()), ".{0,12}"])
}

proptest! {
    #[test]
    fn test_normalized_messages_have_body_and_author(
        message in text(),
        content in text(),
        username in text(),
        nested in text(),
        nested_author in text(),
    ) {
        let raw = RawInboundMessage {
            message,
            content,
            username,
            user: Some(RawUser {
                username: nested,
                author: nested_author,
            }),
            ..Default::default()
        };
        if let Ok(normalized) = raw.normalize(MessageOrigin::Live, Utc::now()) {
            prop_assert!(!normalized.body.trim().is_empty());
            prop_assert!(!normalized.author_name.trim().is_empty());
            prop_assert_eq!(normalized.origin, MessageOrigin::Live);
        }
    }

    #[test]
    fn test_every_author_alias_is_accepted(name in "[a-z]{1,12}", alias in 0usize..4) {
        let author = match alias {
            0 => format!(r#""username": "{}""#, name),
            1 => format!(r#""author": "{}""#, name),
            2 => format!(r#""user": {{"username": "{}"}}"#, name),
            _ => format!(r#""user": {{"author": "{}"}}"#, name),
        };
        let frame = format!(r#"{{"id": 1, "message": "m", {}}}"#, author);
        let normalized = RawInboundMessage::from_json(&frame)
            .unwrap()
            .normalize(MessageOrigin::Live, Utc::now())
            .unwrap();
        prop_assert_eq!(normalized.author_name, name);
    }

    #[test]
    fn test_arbitrary_frames_never_panic(frame in ".{0,64}") {
        if let Ok(raw) = RawInboundMessage::from_json(&frame) {
            let _ = raw.normalize(MessageOrigin::Live, Utc::now());
        }
    }

    #[test]
    fn test_numeric_and_string_ids_agree(id in 0u32..1_000_000) {
        let numeric = RawInboundMessage::from_json(&format!(r#"{{"id": {}, "message": "m", "username": "u"}}"#, id))
            .unwrap()
            .normalize(MessageOrigin::Live, Utc::now())
            .unwrap();
        let string = RawInboundMessage::from_json(&format!(r#"{{"id": "{}", "message": "m", "username": "u"}}"#, id))
            .unwrap()
            .normalize(MessageOrigin::Live, Utc::now())
            .unwrap();
        prop_assert_eq!(numeric.id, string.id);
    }
}
