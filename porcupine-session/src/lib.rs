/// Porcupine detection session library
///
/// Streaming wake-word detection over the Porcupine keyword-spotting engine:
/// keyword specification parsing, single/multi-keyword detection sessions
/// with strict framing, engine status translation, and a chunked stream
/// adapter for continuous audio.

pub mod config;
pub mod engine;
pub mod error;
pub mod frame_buffer;
pub mod keyword;
#[cfg(feature = "native")]
pub mod native;
pub mod session;
pub mod status;
pub mod stream;
pub mod wav;

// Re-export main types
pub use config::{ConfigError, SpotterConfig};
pub use engine::{Engine, EngineInfo};
pub use error::{Result, SpotterError};
pub use keyword::{KeywordEntry, KeywordSet, KeywordSpec, Keywords, DEFAULT_SENSITIVITY};
pub use session::{Detection, DetectionSession, Mode};
pub use status::EngineStatus;
pub use stream::{KeywordEvent, KeywordStream, StreamStats};

#[cfg(feature = "native")]
pub use native::{frame_length, sample_rate, version, NativeEngine};

/// Session bound to libpv_porcupine
#[cfg(feature = "native")]
pub type PorcupineSession = DetectionSession<NativeEngine>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
