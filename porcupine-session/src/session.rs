/// Detection session
///
/// Owns one engine instance, fixed in single- or multi-keyword mode at
/// construction. Every `process` call validates the frame length, then makes
/// exactly one engine call. Disposal releases the engine handle once; later
/// calls fail with `SpotterError::Disposed` without touching the engine.

use crate::engine::Engine;
use crate::error::{Result, SpotterError};
use crate::keyword::{validate_path, KeywordSet, Keywords};
use crate::status::translate;
use std::path::Path;
use tracing::{debug, info, trace};

/// Which engine primitives a session dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Multiple { keywords: usize },
}

/// Result of processing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Single-keyword session: whether the keyword ended in this frame
    Single(bool),

    /// Multi-keyword session: zero-based index of the keyword that fired
    Multiple(Option<usize>),
}

impl Detection {
    pub fn is_detected(&self) -> bool {
        self.keyword_index().is_some()
    }

    /// Index of the detected keyword; a single-keyword hit is index 0
    pub fn keyword_index(&self) -> Option<usize> {
        match *self {
            Detection::Single(true) => Some(0),
            Detection::Single(false) => None,
            Detection::Multiple(index) => index,
        }
    }
}

/// Engine handle with guaranteed single release
struct EngineInstance<E: Engine> {
    engine: E,
    handle: Option<E::Handle>,
}

impl<E: Engine> EngineInstance<E> {
    fn release(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                self.engine.teardown(handle);
                true
            }
            None => false,
        }
    }
}

impl<E: Engine> Drop for EngineInstance<E> {
    fn drop(&mut self) {
        if self.release() {
            debug!("Released Porcupine instance on drop");
        }
    }
}

/// Live keyword detector bound to one engine instance
pub struct DetectionSession<E: Engine> {
    instance: EngineInstance<E>,
    mode: Mode,
    /// Decoded samples of the current frame, reused across `process` calls
    samples: Vec<i16>,
}

impl<E: Engine> DetectionSession<E> {
    /// Validate the keywords and initialize the engine
    ///
    /// A list of keywords (of any length) selects `Mode::Multiple`; a single
    /// keyword selects `Mode::Single`. Nothing reaches the engine unless every
    /// keyword validates.
    pub fn new(engine: E, model_path: impl AsRef<Path>, keywords: &Keywords) -> Result<Self> {
        let model_path = model_path.as_ref();
        validate_path(model_path, "model file path")?;
        let keyword_set = keywords.parse()?;

        let (handle, mode) = match &keyword_set {
            KeywordSet::Single(spec) => {
                let handle = translate(engine.init_single(model_path, spec))?;
                (handle, Mode::Single)
            }
            KeywordSet::Multiple(specs) => {
                let handle = translate(engine.init_multiple(model_path, specs))?;
                (handle, Mode::Multiple { keywords: specs.len() })
            }
        };

        info!(
            "Porcupine session initialized: model={}, keywords={}, mode={:?}",
            model_path.display(),
            keyword_set.len(),
            mode
        );

        Ok(Self {
            instance: EngineInstance {
                engine,
                handle: Some(handle),
            },
            mode,
            samples: Vec::new(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Samples required per `process` call
    pub fn frame_length(&self) -> usize {
        self.instance.engine.frame_length()
    }

    /// Bytes required per `process` call
    pub fn frame_bytes(&self) -> usize {
        self.frame_length() * std::mem::size_of::<i16>()
    }

    pub fn is_disposed(&self) -> bool {
        self.instance.handle.is_none()
    }

    pub fn engine(&self) -> &E {
        &self.instance.engine
    }

    /// Process one frame of little-endian 16-bit PCM bytes
    pub fn process(&mut self, pcm: &[u8]) -> Result<Detection> {
        let expected = self.frame_bytes();
        if pcm.len() != expected {
            return Err(SpotterError::validation(format!(
                "frame must be exactly {} bytes, got {}",
                expected,
                pcm.len()
            )));
        }

        let mut samples = std::mem::take(&mut self.samples);
        samples.clear();
        samples.extend(pcm.chunks_exact(2).map(|b| i16::from_le_bytes([b[0], b[1]])));

        let result = self.dispatch(&samples);
        self.samples = samples;
        result
    }

    /// Process one frame of samples
    pub fn process_samples(&mut self, pcm: &[i16]) -> Result<Detection> {
        let expected = self.frame_length();
        if pcm.len() != expected {
            return Err(SpotterError::validation(format!(
                "frame must be exactly {} samples, got {}",
                expected,
                pcm.len()
            )));
        }

        self.dispatch(pcm)
    }

    fn dispatch(&mut self, pcm: &[i16]) -> Result<Detection> {
        let mode = self.mode;
        let instance = &mut self.instance;
        let handle = instance.handle.as_mut().ok_or(SpotterError::Disposed)?;
        let engine = &instance.engine;

        let detection = match mode {
            Mode::Single => Detection::Single(translate(engine.process_single(handle, pcm))?),
            Mode::Multiple { keywords } => {
                let index = translate(engine.process_multiple(handle, pcm))?;
                Detection::Multiple(keyword_index(index, keywords)?)
            }
        };

        if detection.is_detected() {
            debug!("Keyword detected: {:?}", detection);
        } else {
            trace!("No keyword in frame");
        }

        Ok(detection)
    }

    /// Release the engine instance; repeated calls are no-ops
    pub fn dispose(&mut self) {
        if self.instance.release() {
            debug!("Porcupine session disposed");
        }
    }
}

/// Map the engine's raw index into `[0, keywords)`, -1 meaning none
fn keyword_index(raw: i32, keywords: usize) -> Result<Option<usize>> {
    if raw == -1 {
        return Ok(None);
    }

    match usize::try_from(raw) {
        Ok(index) if index < keywords => Ok(Some(index)),
        _ => Err(SpotterError::Engine(raw)),
    }
}

impl<E: Engine> std::fmt::Debug for DetectionSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionSession")
            .field("mode", &self.mode)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::keyword::KeywordEntry;
    use crate::status::EngineStatus;
    use mockall::predicate::eq;

    const FRAME: usize = 512;

    fn engine_with_frame() -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_frame_length().return_const(FRAME);
        engine
    }

    fn single_session(mut engine: MockEngine) -> DetectionSession<MockEngine> {
        engine.expect_init_single().times(1).returning(|_, _| Ok(7));
        engine.expect_teardown().with(eq(7)).times(1).return_const(());
        DetectionSession::new(engine, "model.pv", &Keywords::from("hello.ppn")).unwrap()
    }

    #[test]
    fn test_single_mode_returns_bool() {
        let mut engine = engine_with_frame();
        engine
            .expect_process_single()
            .times(1)
            .returning(|_, _| Ok(false));
        let mut session = single_session(engine);

        assert_eq!(session.mode(), Mode::Single);
        let result = session.process_samples(&[0i16; FRAME]).unwrap();
        assert_eq!(result, Detection::Single(false));
        assert!(!result.is_detected());
    }

    #[test]
    fn test_single_list_selects_multiple_mode() {
        let mut engine = engine_with_frame();
        engine
            .expect_init_multiple()
            .withf(|_, keywords| keywords.len() == 1)
            .times(1)
            .returning(|_, _| Ok(1));
        engine
            .expect_process_multiple()
            .times(1)
            .returning(|_, _| Ok(0));
        engine.expect_teardown().times(1).return_const(());

        let keywords = Keywords::from(vec![KeywordEntry::from("hello.ppn")]);
        let mut session = DetectionSession::new(engine, "model.pv", &keywords).unwrap();

        assert_eq!(session.mode(), Mode::Multiple { keywords: 1 });
        assert_eq!(
            session.process_samples(&[0i16; FRAME]).unwrap(),
            Detection::Multiple(Some(0))
        );
    }

    #[test]
    fn test_process_bytes_decodes_little_endian() {
        let mut engine = engine_with_frame();
        engine
            .expect_process_single()
            .withf(|_, pcm| pcm[0] == 0x0201 && pcm[1] == -1)
            .times(1)
            .returning(|_, _| Ok(true));
        let mut session = single_session(engine);

        let mut bytes = vec![0u8; FRAME * 2];
        bytes[0] = 0x01;
        bytes[1] = 0x02;
        bytes[2] = 0xff;
        bytes[3] = 0xff;

        let result = session.process(&bytes).unwrap();
        assert_eq!(result, Detection::Single(true));
        assert_eq!(result.keyword_index(), Some(0));
    }

    #[test]
    fn test_process_reuses_sample_buffer() {
        let mut engine = engine_with_frame();
        engine
            .expect_process_single()
            .times(3)
            .returning(|_, pcm| Ok(pcm.len() == FRAME && pcm[0] == 2 && pcm[FRAME - 1] == 0));
        let mut session = single_session(engine);

        let mut first = vec![0xffu8; FRAME * 2];
        first[0] = 1;
        first[1] = 0;
        let mut second = vec![0u8; FRAME * 2];
        second[0] = 2;

        assert_eq!(session.process(&first).unwrap(), Detection::Single(false));
        let buffer = session.samples.as_ptr();

        // No samples from the previous frame leak into the next one
        assert_eq!(session.process(&second).unwrap(), Detection::Single(true));
        assert_eq!(session.process(&second).unwrap(), Detection::Single(true));
        assert_eq!(session.samples.len(), FRAME);
        assert_eq!(session.samples.as_ptr(), buffer);
    }

    #[test]
    fn test_wrong_frame_size_never_reaches_engine() {
        let mut session = single_session(engine_with_frame());

        for len in [0, FRAME * 2 - 1, FRAME * 2 - 2, FRAME * 2 + 2] {
            let result = session.process(&vec![0u8; len]);
            assert!(matches!(result, Err(SpotterError::Validation(_))));
        }
        assert!(matches!(
            session.process_samples(&[0i16; FRAME + 1]),
            Err(SpotterError::Validation(_))
        ));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut session = single_session(engine_with_frame());

        session.dispose();
        session.dispose();
        session.dispose();
        assert!(session.is_disposed());
    }

    #[test]
    fn test_process_after_dispose_fails() {
        let mut session = single_session(engine_with_frame());
        session.dispose();

        assert_eq!(
            session.process_samples(&[0i16; FRAME]),
            Err(SpotterError::Disposed)
        );
    }

    #[test]
    fn test_size_check_precedes_disposed_check() {
        let mut session = single_session(engine_with_frame());
        session.dispose();

        assert!(matches!(
            session.process_samples(&[0i16; FRAME - 1]),
            Err(SpotterError::Validation(_))
        ));
    }

    #[test]
    fn test_drop_releases_handle() {
        // teardown expectation (times(1)) is verified when the mock drops
        let session = single_session(engine_with_frame());
        drop(session);
    }

    #[test]
    fn test_init_failure_yields_no_session() {
        let mut engine = MockEngine::new();
        engine
            .expect_init_single()
            .returning(|_, _| Err(EngineStatus::IoError));
        engine.expect_teardown().never();

        let result = DetectionSession::new(engine, "model.pv", &Keywords::from("missing.ppn"));
        assert_eq!(result.unwrap_err(), SpotterError::Io);
    }

    #[test]
    fn test_invalid_keyword_skips_engine() {
        let engine = MockEngine::new();
        let keywords = Keywords::from(vec![KeywordEntry::from("a.ppn"), KeywordEntry::from("")]);

        let result = DetectionSession::new(engine, "model.pv", &keywords);
        assert!(matches!(result, Err(SpotterError::Validation(_))));
    }

    #[test]
    fn test_empty_model_path_rejected() {
        let engine = MockEngine::new();
        let result = DetectionSession::new(engine, "", &Keywords::from("a.ppn"));
        assert!(matches!(result, Err(SpotterError::Validation(_))));
    }

    #[test]
    fn test_process_failure_keeps_session_usable() {
        let mut engine = engine_with_frame();
        let mut calls = 0;
        engine.expect_process_single().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(EngineStatus::OutOfMemory)
            } else {
                Ok(true)
            }
        });
        let mut session = single_session(engine);

        assert_eq!(
            session.process_samples(&[0i16; FRAME]),
            Err(SpotterError::OutOfMemory)
        );
        assert!(!session.is_disposed());
        assert_eq!(
            session.process_samples(&[0i16; FRAME]),
            Ok(Detection::Single(true))
        );
    }

    #[test]
    fn test_keyword_index_bounds() {
        assert_eq!(keyword_index(-1, 3), Ok(None));
        assert_eq!(keyword_index(0, 3), Ok(Some(0)));
        assert_eq!(keyword_index(2, 3), Ok(Some(2)));
        assert_eq!(keyword_index(3, 3), Err(SpotterError::Engine(3)));
        assert_eq!(keyword_index(-2, 3), Err(SpotterError::Engine(-2)));
    }
}
