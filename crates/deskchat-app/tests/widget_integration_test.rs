//! Integration tests for the chat widget.
//!
//! # Oracle Pattern
//!
//! Each test drives the widget the way the runtime does (events in, actions
//! out) and ends with oracle checks on:
//! - Store contents and order
//! - Actions requested from the runtime
//! - Side effects on the injected collaborators (cue plays, preferences)

use std::time::Duration;

use deskchat_app::{ChatAction, ChatEvent, ChatWidget, KeyInput, SendId};
use deskchat_core::{
    ConnectionState, MUTE_KEY, MessageMapper, NotificationGate, PassthroughUrls, RECONNECT_DELAY,
    Roster, RosterEntry, SocketId, SyncMode,
    test_utils::{RecordingSink, SharedPreferences},
};
use deskchat_proto::{
    GENERIC_ERROR_MESSAGE, MessageKind, RawMessage, close_code, extract_error_message,
};

type Widget = ChatWidget<Duration>;

const T0: Duration = Duration::ZERO;

struct Harness {
    widget: Widget,
    sink: RecordingSink,
    prefs: SharedPreferences,
}

fn harness(user: &str) -> Harness {
    let roster = Roster::new(vec![
        RosterEntry::new("sok", "Sok Dara"),
        RosterEntry::new("sao", "Sao Lina"),
        RosterEntry::new("admin", "Administrator"),
    ]);
    let sink = RecordingSink::new();
    let prefs = SharedPreferences::new();
    let gate = NotificationGate::new(user, Some(Box::new(sink.clone())), Box::new(prefs.clone()));
    let widget = ChatWidget::new(user, MessageMapper::new(roster, PassthroughUrls), gate);
    Harness { widget, sink, prefs }
}

fn raw(ts: &str, user: &str, content: &str) -> RawMessage {
    RawMessage {
        timestamp: ts.to_string(),
        user_name: user.to_string(),
        message_type: MessageKind::Text,
        content: content.to_string(),
        file_id: None,
    }
}

fn new_message_frame(message: &RawMessage) -> String {
    frame_json("new_message", &format!(
        r#"{{"Timestamp":"{}","UserName":"{}","MessageType":"text","Content":"{}"}}"#,
        message.timestamp, message.user_name, message.content
    ))
}

fn delete_frame(id: &str) -> String {
    frame_json("delete_message", &format!(r#"{{"timestamp":"{id}"}}"#))
}

fn frame_json(action: &str, payload: &str) -> String {
    format!(r#"{{"action":"{action}","payload":{payload}}}"#)
}

fn opened_socket(actions: &[ChatAction]) -> SocketId {
    actions
        .iter()
        .find_map(|a| match a {
            ChatAction::OpenSocket { socket } => Some(*socket),
            _ => None,
        })
        .unwrap_or_else(|| panic!("expected OpenSocket in {actions:?}"))
}

/// Open the widget, complete the cold load with `history` and the socket
/// handshake. Returns the live socket.
fn connect(w: &mut Widget, history: Vec<RawMessage>) -> SocketId {
    w.open();
    let actions =
        w.handle(ChatEvent::HistoryFetched { mode: SyncMode::Cold, result: Ok(history) }, T0);
    let socket = opened_socket(&actions);

    let actions = w.handle(ChatEvent::SocketOpened { socket }, T0);
    assert!(actions.contains(&ChatAction::FetchHistory { mode: SyncMode::Resync }));
    assert_eq!(w.connection_state(), ConnectionState::Connected);
    socket
}

fn ids(w: &Widget) -> Vec<String> {
    w.messages().iter().map(|m| m.id.clone()).collect()
}

#[test]
fn live_echo_of_history_is_deduplicated() {
    let Harness { mut widget, sink, .. } = harness("sok");
    let m = raw("2024-05-01T10:00:00Z", "sao", "hello");
    let socket = connect(&mut widget, vec![m.clone()]);

    let actions =
        widget.handle(ChatEvent::FrameReceived { socket, text: new_message_frame(&m) }, T0);

    assert!(actions.is_empty());
    assert_eq!(ids(&widget), ["2024-05-01T10:00:00Z"]);
    assert_eq!(sink.plays(), 0);
}

#[test]
fn resync_keeps_live_only_messages() {
    let Harness { mut widget, .. } = harness("sok");
    let a = raw("2024-05-01T10:00:00Z", "sao", "A");
    let b = raw("2024-05-01T10:00:05Z", "admin", "B");
    let socket = connect(&mut widget, vec![a.clone()]);

    widget.handle(ChatEvent::FrameReceived { socket, text: new_message_frame(&b) }, T0);
    widget.handle(ChatEvent::HistoryFetched { mode: SyncMode::Resync, result: Ok(vec![a]) }, T0);

    assert_eq!(ids(&widget), ["2024-05-01T10:00:00Z", "2024-05-01T10:00:05Z"]);
}

#[test]
fn live_frames_render_in_timestamp_order() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    for ts in ["2024-05-01T10:00:03Z", "2024-05-01T10:00:01Z", "2024-05-01T10:00:02Z"] {
        let text = new_message_frame(&raw(ts, "sao", "x"));
        widget.handle(ChatEvent::FrameReceived { socket, text }, T0);
    }

    assert_eq!(ids(&widget), [
        "2024-05-01T10:00:01Z",
        "2024-05-01T10:00:02Z",
        "2024-05-01T10:00:03Z"
    ]);
}

#[test]
fn abnormal_close_reconnects_after_delay_and_resyncs() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    let actions =
        widget.handle(ChatEvent::SocketClosed { socket, code: close_code::ABNORMAL }, T0);
    let schedules: Vec<_> =
        actions.iter().filter(|a| matches!(a, ChatAction::ScheduleReconnect { .. })).collect();
    assert_eq!(schedules, [&ChatAction::ScheduleReconnect { delay: RECONNECT_DELAY }]);

    // A timer firing early re-arms for the remainder
    let early = widget.handle(ChatEvent::ReconnectDue, Duration::from_millis(2500));
    assert!(!early.iter().any(|a| matches!(a, ChatAction::OpenSocket { .. })));
    assert!(early.contains(&ChatAction::ScheduleReconnect { delay: Duration::from_millis(500) }));

    let actions = widget.handle(ChatEvent::ReconnectDue, RECONNECT_DELAY);
    let next = opened_socket(&actions);
    assert_ne!(next, socket);

    let actions = widget.handle(ChatEvent::SocketOpened { socket: next }, RECONNECT_DELAY);
    assert!(actions.contains(&ChatAction::FetchHistory { mode: SyncMode::Resync }));
}

#[test]
fn clean_close_does_not_reconnect() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    let actions = widget.handle(ChatEvent::SocketClosed { socket, code: close_code::NORMAL }, T0);

    assert!(!actions.iter().any(|a| matches!(a, ChatAction::ScheduleReconnect { .. })));
    assert_eq!(widget.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn mention_candidates_exclude_self() {
    let Harness { mut widget, .. } = harness("sok");
    connect(&mut widget, vec![]);

    widget.handle(ChatEvent::SetText("hello @sa".into()), T0);
    let names: Vec<_> = widget
        .mentions()
        .query()
        .map(|q| q.candidates.iter().map(|e| e.username.clone()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["sao"]);

    widget.handle(ChatEvent::SetText("hello @".into()), T0);
    let names: Vec<_> = widget
        .mentions()
        .query()
        .map(|q| q.candidates.iter().map(|e| e.username.clone()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["sao", "admin"]);
}

#[test]
fn delete_waits_for_broadcast() {
    let Harness { mut widget, .. } = harness("sok");
    let mut m = raw("2024-05-01T10:00:00Z", "sok", "oops");
    m.file_id = Some("drive-123".into());
    let socket = connect(&mut widget, vec![m]);

    let actions = widget.delete("2024-05-01T10:00:00Z");
    let [ChatAction::Delete { request }] = actions.as_slice() else {
        panic!("expected Delete, got {actions:?}");
    };
    assert_eq!(request.file_id.as_deref(), Some("drive-123"));

    widget.handle(
        ChatEvent::DeleteFinished { id: "2024-05-01T10:00:00Z".into(), result: Ok(()) },
        T0,
    );
    assert_eq!(widget.messages().len(), 1);

    widget.handle(
        ChatEvent::FrameReceived { socket, text: delete_frame("2024-05-01T10:00:00Z") },
        T0,
    );
    assert!(widget.messages().is_empty());
}

#[test]
fn rejected_send_surfaces_server_message() {
    let Harness { mut widget, .. } = harness("sok");
    connect(&mut widget, vec![]);
    widget.handle(ChatEvent::SetText("my draft".into()), T0);

    let send_id = sent_id(&widget.send_text());
    let message = extract_error_message(r#"{"error":"Upload Folder ID is not configured"}"#);
    let actions = widget.handle(ChatEvent::SendFinished { send_id, result: Err(message) }, T0);

    assert!(matches!(
        actions.first(),
        Some(ChatAction::Alert { message }) if message.contains("Upload Folder ID is not configured")
    ));
    assert_eq!(widget.compose().text(), "my draft");
}

#[test]
fn unparsable_error_body_surfaces_fallback() {
    let Harness { mut widget, .. } = harness("sok");
    connect(&mut widget, vec![]);
    widget.handle(ChatEvent::SetText("x".into()), T0);

    let send_id = sent_id(&widget.send_text());
    let message = extract_error_message("<html>Bad Gateway</html>");
    let actions = widget.handle(ChatEvent::SendFinished { send_id, result: Err(message) }, T0);

    assert!(matches!(
        actions.first(),
        Some(ChatAction::Alert { message }) if message == GENERIC_ERROR_MESSAGE
    ));
}

#[test]
fn successful_send_is_not_inserted_locally() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);
    for c in "hi".chars() {
        widget.handle(ChatEvent::Key(KeyInput::Char(c)), T0);
    }

    let send_id = sent_id(&widget.handle(ChatEvent::Key(KeyInput::Enter), T0));
    assert!(widget.handle(ChatEvent::SendFinished { send_id, result: Ok(()) }, T0).is_empty());
    assert!(widget.messages().is_empty());

    let echo = raw("2024-05-01T10:00:00Z", "sok", "hi");
    widget.handle(ChatEvent::FrameReceived { socket, text: new_message_frame(&echo) }, T0);
    assert_eq!(widget.messages().len(), 1);
}

#[test]
fn cue_plays_for_others_unless_muted() {
    let Harness { mut widget, sink, prefs } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    let frame = |ts: &str, who: &str| new_message_frame(&raw(ts, who, "x"));
    widget.handle(ChatEvent::FrameReceived { socket, text: frame("t1", "sao") }, T0);
    widget.handle(ChatEvent::FrameReceived { socket, text: frame("t2", "sok") }, T0);
    assert_eq!(sink.plays(), 1);

    widget.toggle_mute();
    assert_eq!(prefs.value(MUTE_KEY).as_deref(), Some("true"));
    widget.handle(ChatEvent::FrameReceived { socket, text: frame("t3", "sao") }, T0);
    assert_eq!(sink.plays(), 1);
}

#[test]
fn malformed_and_stale_frames_are_ignored() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    for text in ["not json", r#"{"action":"typing","payload":{}}"#, r#"{"payload":1}"#] {
        let actions = widget.handle(ChatEvent::FrameReceived { socket, text: text.into() }, T0);
        assert!(actions.is_empty());
    }

    widget.handle(ChatEvent::SocketClosed { socket, code: close_code::ABNORMAL }, T0);
    let text = new_message_frame(&raw("t1", "sao", "late"));
    assert!(widget.handle(ChatEvent::FrameReceived { socket, text }, T0).is_empty());
    assert!(widget.messages().is_empty());
}

#[test]
fn close_tears_down_in_order() {
    let Harness { mut widget, .. } = harness("sok");
    let socket = connect(&mut widget, vec![]);

    assert_eq!(widget.close(), vec![
        ChatAction::DetachSocket { socket },
        ChatAction::CloseSocket { socket, code: close_code::NORMAL },
        ChatAction::CancelReconnect,
    ]);

    let late = widget.handle(
        ChatEvent::HistoryFetched {
            mode: SyncMode::Resync,
            result: Ok(vec![raw("t1", "sao", "late")]),
        },
        T0,
    );
    assert!(late.is_empty());
    assert!(widget.messages().is_empty());
}

fn sent_id(actions: &[ChatAction]) -> SendId {
    actions
        .iter()
        .find_map(|a| match a {
            ChatAction::Send { send_id, .. } => Some(*send_id),
            _ => None,
        })
        .unwrap_or_else(|| panic!("expected Send in {actions:?}"))
}
