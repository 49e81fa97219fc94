use std::collections::HashMap;

use pitchroom_core::Speaker;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// An immutable, permanently retained transcript fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub id: Uuid,
    pub text: String,
    pub speaker: Speaker,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Upstream channel that produced this fragment.
    pub source: String,
}

/// Dedupe key for interim buffers: one live interim per speaker+source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InterimKey {
    speaker: Speaker,
    source: String,
}

#[derive(Debug, Clone)]
struct InterimBuffer {
    text: String,
}

/// One row of the merged, render-ready transcript view.
#[derive(Debug, Clone, Serialize)]
pub struct RenderEntry {
    /// Set for final chunks, `None` for interim entries.
    pub id: Option<Uuid>,
    pub text: String,
    pub speaker: Speaker,
    pub source: String,
    pub timestamp_ms: i64,
    pub is_final: bool,
}

/// Reconciles interim and final transcript fragments into one ordered view.
///
/// Finals are append-only and never mutated. Interims live in a
/// per-(speaker, source) slot: a newer partial overwrites the slot, and a
/// final for the same key clears it. In-order delivery per key is assumed;
/// there is no reordering buffer.
#[derive(Debug, Default)]
pub struct MergeEngine {
    finals: Vec<TranscriptChunk>,
    interims: HashMap<InterimKey, InterimBuffer>,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the interim buffer for `(speaker, source)`. Empty text is
    /// a no-op: empty interim state is never stored.
    pub fn apply_partial(&mut self, text: &str, speaker: Speaker, source: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let key = InterimKey {
            speaker,
            source: source.to_string(),
        };
        debug!(%speaker, source, chars = text.len(), "Interim updated");
        self.interims.insert(
            key,
            InterimBuffer {
                text: text.to_string(),
            },
        );
    }

    /// Appends an immutable final chunk and clears the interim buffer for
    /// that exact key, leaving other keys' interims untouched.
    pub fn apply_final(&mut self, text: &str, speaker: Speaker, source: &str, timestamp_ms: i64) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.interims.remove(&InterimKey {
            speaker,
            source: source.to_string(),
        });
        self.finals.push(TranscriptChunk {
            id: Uuid::new_v4(),
            text: text.to_string(),
            speaker,
            timestamp_ms,
            source: source.to_string(),
        });
    }

    pub fn finals(&self) -> &[TranscriptChunk] {
        &self.finals
    }

    /// Number of live interim buffers.
    pub fn interim_count(&self) -> usize {
        self.interims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finals.is_empty() && self.interims.is_empty()
    }

    /// Discards all state. Used when a new call starts on a live session.
    pub fn reset(&mut self) {
        self.finals.clear();
        self.interims.clear();
    }

    /// Produces the ordered render view: all finals plus, when
    /// `include_interim` is set, one entry per live interim buffer.
    ///
    /// Interims have no stable capture time, so they are stamped with
    /// `now_ms` and therefore sort after any final captured earlier; their
    /// order among themselves is merge-time order, not speech order.
    pub fn render(&self, include_interim: bool, now_ms: i64) -> Vec<RenderEntry> {
        let mut entries: Vec<RenderEntry> = self
            .finals
            .iter()
            .map(|c| RenderEntry {
                id: Some(c.id),
                text: c.text.clone(),
                speaker: c.speaker,
                source: c.source.clone(),
                timestamp_ms: c.timestamp_ms,
                is_final: true,
            })
            .collect();

        if include_interim {
            entries.extend(self.interims.iter().map(|(key, buf)| RenderEntry {
                id: None,
                text: buf.text.clone(),
                speaker: key.speaker,
                source: key.source.clone(),
                timestamp_ms: now_ms,
                is_final: false,
            }));
        }

        // Stable sort keeps arrival order among equal timestamps.
        entries.sort_by_key(|e| e.timestamp_ms);
        entries
    }
}
