use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is talking in a practice call: the trainee or the simulated buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Prospect,
}

impl Speaker {
    /// Maps an upstream role tag onto a speaker.
    ///
    /// The AI call source tags its own turns `assistant`; anything it does
    /// not recognize belongs to the trainee.
    pub fn from_role_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "assistant" | "prospect" => Speaker::Prospect,
            _ => Speaker::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Prospect => "prospect",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a recorded practice call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
