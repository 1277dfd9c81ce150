/// Keyword-spotting engine seam
///
/// The acoustic model lives behind these primitives. `NativeEngine` (feature
/// `native`) binds them to libpv_porcupine; tests substitute mocks.

use crate::keyword::KeywordSpec;
use crate::status::EngineStatus;
use std::path::Path;

#[cfg_attr(test, mockall::automock(type Handle = u32;))]
pub trait Engine {
    /// Opaque per-instance engine object
    type Handle;

    fn init_single(
        &self,
        model_path: &Path,
        keyword: &KeywordSpec,
    ) -> Result<Self::Handle, EngineStatus>;

    fn init_multiple(
        &self,
        model_path: &Path,
        keywords: &[KeywordSpec],
    ) -> Result<Self::Handle, EngineStatus>;

    /// `pcm` is exactly `frame_length()` samples
    fn process_single(&self, handle: &mut Self::Handle, pcm: &[i16]) -> Result<bool, EngineStatus>;

    /// Returns the detected keyword index, or -1 when nothing fired
    fn process_multiple(&self, handle: &mut Self::Handle, pcm: &[i16]) -> Result<i32, EngineStatus>;

    fn teardown(&self, handle: Self::Handle);

    fn sample_rate(&self) -> u32;

    fn frame_length(&self) -> usize;

    fn version(&self) -> String;
}

/// Fixed engine parameters, queried once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub sample_rate: u32,
    pub frame_length: usize,
    pub version: String,
}

impl EngineInfo {
    pub fn query<E: Engine>(engine: &E) -> Self {
        Self {
            sample_rate: engine.sample_rate(),
            frame_length: engine.frame_length(),
            version: engine.version(),
        }
    }

    /// Bytes in one frame of 16-bit PCM
    pub fn frame_bytes(&self) -> usize {
        self.frame_length * std::mem::size_of::<i16>()
    }

    /// Duration of one frame in milliseconds
    pub fn frame_duration_ms(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_length as f32 * 1000.0 / self.sample_rate as f32
    }
}
