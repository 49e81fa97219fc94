use pitchroom_core::Speaker;
use serde::Deserialize;
use tracing::{debug, warn};

/// Raw frame from the live call event source, classified by its `type`
/// tag before any field is read.
///
/// The upstream service is loose about where transcript text lives
/// (plain string vs nested object) and how finality is flagged; all of
/// that ambiguity is contained here, at the decode boundary.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundFrame {
    CallStart,
    CallEnd,
    Transcript(TranscriptFrame),
    ConversationUpdate(SnapshotFrame),
    SpeechUpdate(SnapshotFrame),
    #[serde(other)]
    Unknown,
}

/// A speech-recognition frame: may be partial or final.
#[derive(Debug, Deserialize)]
pub struct TranscriptFrame {
    #[serde(default)]
    transcript: Option<TextPayload>,
    #[serde(default)]
    role: Option<String>,
    /// Explicit finality marker ("partial"/"final"); beats `isFinal`.
    #[serde(default, rename = "transcriptType")]
    transcript_type: Option<String>,
    #[serde(default, rename = "isFinal")]
    is_final: Option<bool>,
    #[serde(default)]
    source: Option<String>,
}

/// A conversation-snapshot or speech-update frame. Always final.
#[derive(Debug, Deserialize)]
pub struct SnapshotFrame {
    #[serde(default)]
    transcript: Option<TextPayload>,
    #[serde(default)]
    role: Option<String>,
}

/// Where the text lives inside a frame: either a plain string or a
/// nested object offering several field names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextPayload {
    Plain(String),
    Nested {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        transcript: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
}

impl TextPayload {
    /// Extraction precedence: plain string, else `.text`, else
    /// `.transcript`, else `.content`; first non-empty wins.
    fn extract(&self) -> Option<&str> {
        let candidates: [Option<&String>; 3] = match self {
            TextPayload::Plain(s) => return non_empty(s),
            TextPayload::Nested {
                text,
                transcript,
                content,
            } => [text.as_ref(), transcript.as_ref(), content.as_ref()],
        };
        candidates.into_iter().flatten().find_map(|s| non_empty(s))
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Canonical transcript event after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptUpdate {
    pub text: String,
    pub speaker: Speaker,
    pub is_final: bool,
    pub source: String,
}

/// Canonical actions routed to the merge engine and session handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    CallStarted,
    CallEnded,
    Transcript(TranscriptUpdate),
}

/// Decodes a raw JSON frame. Undecodable payloads are dropped with a
/// warning; they are recoverable, not fatal.
pub fn decode(raw: &serde_json::Value) -> Option<InboundFrame> {
    match InboundFrame::deserialize(raw) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(%e, "Dropping malformed event frame");
            None
        }
    }
}

/// Normalizes a classified frame into a canonical event, or `None` when
/// the frame carries nothing actionable (unknown type, empty text).
pub fn classify(frame: InboundFrame) -> Option<CallEvent> {
    match frame {
        InboundFrame::CallStart => Some(CallEvent::CallStarted),
        InboundFrame::CallEnd => Some(CallEvent::CallEnded),
        InboundFrame::Transcript(frame) => {
            let text = match frame.transcript.as_ref().and_then(TextPayload::extract) {
                Some(t) => t.to_string(),
                None => {
                    debug!("Dropping transcript frame with empty text");
                    return None;
                }
            };

            // transcriptType is authoritative; isFinal is the fallback;
            // absent both, the frame is final.
            let is_final = match frame.transcript_type.as_deref() {
                Some(t) => !t.trim().eq_ignore_ascii_case("partial"),
                None => frame.is_final.unwrap_or(true),
            };

            Some(CallEvent::Transcript(TranscriptUpdate {
                text,
                speaker: speaker_from(frame.role.as_deref()),
                is_final,
                source: frame.source.unwrap_or_else(|| "stream".to_string()),
            }))
        }
        InboundFrame::ConversationUpdate(frame) => snapshot_update(frame, "conversation"),
        InboundFrame::SpeechUpdate(frame) => snapshot_update(frame, "speech"),
        InboundFrame::Unknown => {
            debug!("Dropping frame with unknown type");
            None
        }
    }
}

/// Snapshot frames bypass the interim path entirely: always final.
fn snapshot_update(frame: SnapshotFrame, source: &str) -> Option<CallEvent> {
    let text = match frame.transcript.as_ref().and_then(TextPayload::extract) {
        Some(t) => t.to_string(),
        None => {
            debug!(source, "Dropping snapshot frame with empty text");
            return None;
        }
    };
    Some(CallEvent::Transcript(TranscriptUpdate {
        text,
        speaker: speaker_from(frame.role.as_deref()),
        is_final: true,
        source: source.to_string(),
    }))
}

fn speaker_from(role: Option<&str>) -> Speaker {
    role.map(Speaker::from_role_tag).unwrap_or(Speaker::User)
}
