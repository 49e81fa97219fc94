use std::time::Duration;

use pitchroom_config::LiveConfig;
use pitchroom_transcript::{LiveCallSession, SessionEvent};
use serde_json::json;
use tokio::time::timeout;

use crate::fixtures::{ChannelEventSource, init_tracing};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_view(
    rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Vec<pitchroom_transcript::RenderEntry> {
    loop {
        let event = timeout(RECV_TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for view update")
            .expect("event channel closed");
        if let SessionEvent::TranscriptChanged(view) = event {
            return view;
        }
    }
}

#[tokio::test]
async fn live_feed_merges_partials_and_finals() {
    init_tracing();
    let (session, mut rx) = LiveCallSession::new(&LiveConfig::default());
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    frames.send(json!({"type": "call-start"})).await.unwrap();
    frames
        .send(json!({
            "type": "transcript",
            "transcript": "I was wonder",
            "transcriptType": "partial",
            "role": "assistant",
        }))
        .await
        .unwrap();

    let view = next_view(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert!(!view[0].is_final);
    assert_eq!(view[0].text, "I was wonder");

    // A longer partial for the same speaker+source replaces the slot.
    frames
        .send(json!({
            "type": "transcript",
            "transcript": "I was wondering about pricing",
            "transcriptType": "partial",
            "role": "assistant",
        }))
        .await
        .unwrap();

    let view = next_view(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].text, "I was wondering about pricing");

    // The final clears the interim and is retained permanently.
    frames
        .send(json!({
            "type": "transcript",
            "transcript": "I was wondering about pricing.",
            "transcriptType": "final",
            "role": "assistant",
        }))
        .await
        .unwrap();

    let view = next_view(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert!(view[0].is_final);

    session.detach();
}

#[tokio::test]
async fn finals_from_both_speakers_interleave_in_order() {
    init_tracing();
    let (session, mut rx) = LiveCallSession::new(&LiveConfig::default());
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    for (role, text) in [
        ("user", "Hi, thanks for taking the call."),
        ("assistant", "Sure, what are you selling?"),
        ("user", "Let me show you."),
    ] {
        frames
            .send(json!({"type": "transcript", "transcript": text, "role": role}))
            .await
            .unwrap();
    }

    let mut view = Vec::new();
    for _ in 0..3 {
        view = next_view(&mut rx).await;
    }

    let texts: Vec<&str> = view.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Hi, thanks for taking the call.",
            "Sure, what are you selling?",
            "Let me show you.",
        ]
    );
    assert!(view.iter().all(|e| e.is_final));
}

#[tokio::test]
async fn call_lifecycle_events_are_forwarded() {
    init_tracing();
    let (session, mut rx) = LiveCallSession::new(&LiveConfig::default());
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    frames.send(json!({"type": "call-start"})).await.unwrap();
    frames.send(json!({"type": "call-end"})).await.unwrap();

    let first = timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(first, SessionEvent::CallStarted));
    let second = timeout(RECV_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert!(matches!(second, SessionEvent::CallEnded));

    // The merged transcript survives call end until the caller detaches.
    session.detach();
    session.detach();
}

#[tokio::test]
async fn malformed_and_unknown_frames_are_skipped() {
    init_tracing();
    let (session, mut rx) = LiveCallSession::new(&LiveConfig::default());
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    frames.send(json!(null)).await.unwrap();
    frames.send(json!({"type": "metrics", "v": 1})).await.unwrap();
    frames
        .send(json!({"type": "transcript", "transcript": "   "}))
        .await
        .unwrap();
    frames
        .send(json!({"type": "transcript", "transcript": "survivor"}))
        .await
        .unwrap();

    let view = next_view(&mut rx).await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].text, "survivor");
}

#[tokio::test]
async fn snapshot_frames_bypass_the_interim_path() {
    init_tracing();
    let (session, mut rx) = LiveCallSession::new(&LiveConfig::default());
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    // An interim from the streaming source stays live while snapshot
    // finals arrive on their own source key.
    frames
        .send(json!({
            "type": "transcript",
            "transcript": "half a sent",
            "transcriptType": "partial",
        }))
        .await
        .unwrap();
    frames
        .send(json!({
            "type": "conversation-update",
            "transcript": {"content": "full snapshot line"},
            "role": "assistant",
        }))
        .await
        .unwrap();

    let mut view = Vec::new();
    for _ in 0..2 {
        view = next_view(&mut rx).await;
    }

    assert_eq!(view.len(), 2);
    assert!(view.iter().any(|e| e.is_final && e.source == "conversation"));
    assert!(view.iter().any(|e| !e.is_final && e.source == "stream"));
}

#[tokio::test]
async fn interim_display_can_be_disabled() {
    init_tracing();
    let config = LiveConfig {
        show_interim: false,
        ..LiveConfig::default()
    };
    let (session, mut rx) = LiveCallSession::new(&config);
    let (source, frames) = ChannelEventSource::new();
    session.attach(source).await.unwrap();

    frames
        .send(json!({
            "type": "transcript",
            "transcript": "still typing",
            "transcriptType": "partial",
        }))
        .await
        .unwrap();

    let view = next_view(&mut rx).await;
    assert!(view.is_empty());
    assert!(session.view().is_empty());
}
