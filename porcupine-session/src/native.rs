/// Porcupine engine over the `pv_porcupine` crate
///
/// Sample rate, frame length and version are fixed by the library. They are
/// cached from the first engine instance; before any instance exists the
/// documented Porcupine frame parameters are reported.

use crate::engine::Engine;
use crate::keyword::KeywordSpec;
use crate::status::EngineStatus;
use porcupine::{Porcupine, PorcupineBuilder, PorcupineError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const PORCUPINE_SAMPLE_RATE: u32 = 16000;
const PORCUPINE_FRAME_LENGTH: usize = 512;

static SAMPLE_RATE: OnceLock<u32> = OnceLock::new();
static FRAME_LENGTH: OnceLock<usize> = OnceLock::new();
static VERSION: OnceLock<String> = OnceLock::new();

/// Audio sample rate accepted by the engine
pub fn sample_rate() -> u32 {
    SAMPLE_RATE.get().copied().unwrap_or(PORCUPINE_SAMPLE_RATE)
}

/// Samples per frame
pub fn frame_length() -> usize {
    FRAME_LENGTH.get().copied().unwrap_or(PORCUPINE_FRAME_LENGTH)
}

/// Engine version string, "unknown" until an engine has been initialized
pub fn version() -> &'static str {
    VERSION.get().map(String::as_str).unwrap_or("unknown")
}

fn remember_constants(porcupine: &Porcupine) {
    SAMPLE_RATE.get_or_init(|| porcupine.sample_rate() as u32);
    FRAME_LENGTH.get_or_init(|| porcupine.frame_length() as usize);
    VERSION.get_or_init(|| porcupine.version().to_string());
}

/// Map a binding error onto the engine status taxonomy
///
/// The binding only exposes its status through `Debug`, which carries the
/// `pv_status_t` name.
fn to_status(error: PorcupineError) -> EngineStatus {
    let text = format!("{:?}", error);
    debug!("Porcupine binding error: {}", text);
    status_from_text(&text)
}

fn status_from_text(text: &str) -> EngineStatus {
    if text.contains("OUT_OF_MEMORY") {
        EngineStatus::OutOfMemory
    } else if text.contains("IO_ERROR") {
        EngineStatus::IoError
    } else if text.contains("INVALID_ARGUMENT")
        || text.contains("ArgumentError")
        || text.contains("FrameLengthError")
    {
        EngineStatus::InvalidArgument
    } else {
        EngineStatus::Unknown(-1)
    }
}

/// Owned Porcupine instance; dropping it deletes the native object
pub struct NativeHandle(Porcupine);

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("frame_length", &self.0.frame_length())
            .finish()
    }
}

fn build(model_path: &Path, keywords: &[KeywordSpec]) -> Result<NativeHandle, EngineStatus> {
    let paths: Vec<PathBuf> = keywords.iter().map(|k| k.file_path().to_path_buf()).collect();
    let sensitivities: Vec<f32> = keywords.iter().map(|k| k.sensitivity()).collect();

    let porcupine = PorcupineBuilder::new_with_keyword_paths(&paths)
        .model_path(model_path.to_path_buf())
        .sensitivities(&sensitivities)
        .init()
        .map_err(to_status)?;

    remember_constants(&porcupine);
    Ok(NativeHandle(porcupine))
}

fn process_frame(handle: &mut NativeHandle, pcm: &[i16]) -> Result<i32, EngineStatus> {
    if pcm.len() != frame_length() {
        return Err(EngineStatus::InvalidArgument);
    }
    handle.0.process(pcm).map_err(to_status)
}

/// Engine backed by libpv_porcupine
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl Engine for NativeEngine {
    type Handle = NativeHandle;

    fn init_single(&self, model_path: &Path, keyword: &KeywordSpec) -> Result<NativeHandle, EngineStatus> {
        build(model_path, std::slice::from_ref(keyword))
    }

    fn init_multiple(&self, model_path: &Path, keywords: &[KeywordSpec]) -> Result<NativeHandle, EngineStatus> {
        build(model_path, keywords)
    }

    fn process_single(&self, handle: &mut NativeHandle, pcm: &[i16]) -> Result<bool, EngineStatus> {
        Ok(process_frame(handle, pcm)? >= 0)
    }

    fn process_multiple(&self, handle: &mut NativeHandle, pcm: &[i16]) -> Result<i32, EngineStatus> {
        process_frame(handle, pcm)
    }

    fn teardown(&self, handle: NativeHandle) {
        drop(handle);
    }

    fn sample_rate(&self) -> u32 {
        sample_rate()
    }

    fn frame_length(&self) -> usize {
        frame_length()
    }

    fn version(&self) -> String {
        version().to_string()
    }
}
