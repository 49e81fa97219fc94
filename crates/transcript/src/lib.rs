pub mod event;
pub mod merge;
pub mod session;

pub use event::{CallEvent, InboundFrame, TranscriptUpdate};
pub use merge::{MergeEngine, RenderEntry, TranscriptChunk};
pub use session::{EventSource, LiveCallSession, SessionEvent};
