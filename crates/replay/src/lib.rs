pub mod clock;
pub mod error;
pub mod resolver;
pub mod scheduler;
pub mod segment;
pub mod segmentation;
pub mod session;
pub mod store;
pub mod synth;

pub use clock::{PlaybackClock, PlaybackState};
pub use error::ReplayError;
pub use resolver::{AudioHandle, AudioResolver};
pub use scheduler::{SegmentScheduler, TickAction};
pub use segment::{Segment, Timeline};
pub use session::{ReplayEvent, ReplaySession};
pub use store::{CallRecord, HttpReplayStore, ReplayStore, SegmentRecord, StoreError};
pub use synth::{HttpSynthesizer, SpeechSynthesizer, VoiceMap};
