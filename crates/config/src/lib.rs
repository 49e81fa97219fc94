use serde::{Deserialize, Serialize};

/// Top-level application configuration.
///
/// Loaded from an optional TOML file with `PITCHROOM_*` environment
/// overrides layered on top; every section has usable defaults so a bare
/// `AppConfig::default()` is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub replay: ReplayConfig,
    pub segmentation: SegmentationConfig,
    pub synthesis: SynthesisConfig,
    pub store: StoreConfig,
    pub live: LiveConfig,
}

/// Replay player tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Wall-clock interval between playback clock ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Step applied by skip back/forward controls, in seconds.
    pub skip_step_secs: f64,
    /// Initial volume, 0.0..=1.0.
    pub default_volume: f64,
    /// Initial playback rate multiplier.
    pub default_rate: f64,
    /// Capacity of the replay event broadcast channel.
    pub event_buffer: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            skip_step_secs: 10.0,
            default_volume: 1.0,
            default_rate: 1.0,
            event_buffer: 256,
        }
    }
}

/// Parameters of the reading-duration heuristic used when a call has no
/// precomputed segment list and segments must be derived from its
/// stored transcript text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Estimated reading time per character, in seconds.
    pub secs_per_char: f64,
    /// Floor for a single utterance's duration, in seconds.
    pub min_utterance_secs: f64,
    /// Silence inserted between consecutive utterances, in seconds.
    pub utterance_gap_secs: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            secs_per_char: 0.05,
            min_utterance_secs: 2.0,
            utterance_gap_secs: 0.5,
        }
    }
}

/// Voice synthesis collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// HTTP endpoint of the synthesis service.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Voice id used for the trainee's lines.
    pub user_voice: String,
    /// Voice id used for the simulated prospect's lines.
    pub prospect_voice: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8700/v1/synthesize".to_string(),
            timeout_secs: 30,
            user_voice: "echo".to_string(),
            prospect_voice: "alloy".to_string(),
        }
    }
}

/// Replay data backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the call record backend.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8600".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Live transcript session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Whether interim (not-yet-final) entries appear in the rendered view.
    pub show_interim: bool,
    /// Capacity of the session event broadcast channel.
    pub event_buffer: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            show_interim: true,
            event_buffer: 256,
        }
    }
}

impl AppConfig {
    /// Loads configuration from an optional TOML file plus `PITCHROOM_*`
    /// environment variables (e.g. `PITCHROOM_REPLAY__TICK_INTERVAL_MS`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder
            .add_source(
                config::Environment::with_prefix("PITCHROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
