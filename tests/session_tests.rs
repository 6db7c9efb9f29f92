// Integration tests for the voice session task
//
// A real server is out of reach here, so these tests exercise the paths a
// session takes when the endpoint is unreachable: commands fail soft, the
// render callback stays silent, and an exhausted connection budget is fatal.

use std::time::Duration;

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use voice_session::audio::{DEFAULT_BATCH_SAMPLES, HEADER_BYTES};
use voice_session::config::{AudioConfig, ConnectionConfig};
use voice_session::conversation::ConversationState;
use voice_session::session::{SessionConfig, SessionEvent, VoiceSession};

fn unreachable_config() -> SessionConfig {
    SessionConfig {
        connection: ConnectionConfig {
            // Port 9 (discard) is never a websocket listener.
            url: "ws://127.0.0.1:9/ws".to_string(),
            max_reconnect_attempts: 1,
            reconnect_delay_ms: 10,
            auto_reconnect: false,
        },
        audio: AudioConfig::default(),
        ..SessionConfig::default()
    }
}

async fn next_event(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("session event channel closed")
}

#[tokio::test]
async fn test_unreachable_endpoint_is_fatal() {
    let (_handle, mut events) = VoiceSession::spawn(unreachable_config());

    let mut saw_error_state = false;
    loop {
        match next_event(&mut events).await {
            SessionEvent::StateChanged(ConversationState::Error) => saw_error_state = true,
            SessionEvent::ConnectionFailed => break,
            other => panic!("unexpected event before failure: {:?}", other),
        }
    }
    assert!(saw_error_state, "fatal connection loss must surface the error state");
}

#[tokio::test]
async fn test_start_without_connection_fails_soft() {
    let (handle, mut events) = VoiceSession::spawn(unreachable_config());
    handle.start_conversation();

    let mut saw_status = false;
    loop {
        match next_event(&mut events).await {
            SessionEvent::StatusText(text) => {
                assert!(text.contains("not connected"), "text was: {}", text);
                saw_status = true;
            }
            SessionEvent::ConnectionFailed => break,
            SessionEvent::StateChanged(_) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }
    assert!(saw_status, "start must be rejected with a status message");
}

#[tokio::test]
async fn test_render_is_silent_without_audio() {
    let (handle, _events) = VoiceSession::spawn(unreachable_config());

    let mut out = [1.0f32; 128];
    handle.render(&mut out);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[tokio::test]
async fn test_peer_close_discards_trailing_partial_batch() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept one session, read the first complete audio frame, then close.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut binary_frames: Vec<Vec<u8>> = Vec::new();
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Binary(bytes)) => {
                    binary_frames.push(bytes);
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        ws.close(None).await.ok();
        binary_frames
    });

    let config = SessionConfig {
        connection: ConnectionConfig {
            url: format!("ws://{}/ws", addr),
            max_reconnect_attempts: 1,
            reconnect_delay_ms: 10,
            auto_reconnect: false,
        },
        audio: AudioConfig::default(),
        ..SessionConfig::default()
    };
    let (handle, mut events) = VoiceSession::spawn(config);

    loop {
        if let SessionEvent::Connected = next_event(&mut events).await {
            break;
        }
    }

    // One full batch plus a 100-sample partial left pending in the framer.
    handle.push_mic_samples(vec![7; DEFAULT_BATCH_SAMPLES + 100]);

    let frames = server.await.unwrap();
    assert_eq!(frames.len(), 1, "only the complete batch reaches the wire");
    assert_eq!(frames[0].len(), HEADER_BYTES + DEFAULT_BATCH_SAMPLES * 2);

    // The pending partial dies with the socket; the session reports the
    // close and its terminal failure without stalling.
    let mut saw_disconnect = false;
    loop {
        match next_event(&mut events).await {
            SessionEvent::Disconnected => saw_disconnect = true,
            SessionEvent::ConnectionFailed => break,
            _ => {}
        }
    }
    assert!(saw_disconnect, "peer close must surface a disconnect event");
}

#[tokio::test]
async fn test_mic_samples_are_accepted_while_disconnected() {
    // Frames are dropped at the closed socket, never an error to the caller.
    let (handle, mut events) = VoiceSession::spawn(unreachable_config());
    handle.push_mic_samples(vec![0; 4096]);

    loop {
        if let SessionEvent::ConnectionFailed = next_event(&mut events).await {
            break;
        }
    }
}
