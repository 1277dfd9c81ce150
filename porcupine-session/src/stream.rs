/// Streaming keyword detector
///
/// Accepts PCM chunks of any length, slices them into engine frames and runs
/// each through a `DetectionSession`. The first detection in a chunk ends
/// processing of that chunk: the event carries the bytes that followed the
/// detecting frame, and those bytes are not buffered.

use crate::engine::Engine;
use crate::error::{Result, SpotterError};
use crate::frame_buffer::FrameAssembler;
use crate::keyword::Keywords;
use crate::session::{Detection, DetectionSession};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A keyword heard in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEvent {
    /// Zero-based keyword index; always 0 for single-keyword sessions
    pub keyword_index: usize,

    /// Rest of the chunk after the frame that triggered the detection
    pub remainder: Vec<u8>,

    /// Zero-based number of the detecting frame since the stream opened
    pub frame: u64,
}

/// Stream statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames_processed: u64,
    pub keywords_detected: u64,
    pub bytes_written: u64,
    pub pending_bytes: usize,
}

pub struct KeywordStream<E: Engine> {
    session: DetectionSession<E>,
    assembler: FrameAssembler,
    event_tx: Option<mpsc::UnboundedSender<KeywordEvent>>,
    frames_processed: u64,
    keywords_detected: u64,
    bytes_written: u64,
}

impl<E: Engine> KeywordStream<E> {
    /// Wrap an existing session
    pub fn new(session: DetectionSession<E>) -> Result<Self> {
        let assembler = FrameAssembler::new(session.frame_bytes())?;

        info!(
            "Keyword stream opened ({} bytes per frame, mode={:?})",
            assembler.frame_bytes(),
            session.mode()
        );

        Ok(Self {
            session,
            assembler,
            event_tx: None,
            frames_processed: 0,
            keywords_detected: 0,
            bytes_written: 0,
        })
    }

    /// Create the session and the stream in one step
    pub fn open(engine: E, model_path: impl AsRef<Path>, keywords: &Keywords) -> Result<Self> {
        Self::new(DetectionSession::new(engine, model_path, keywords)?)
    }

    /// Receive every future `KeywordEvent`; replaces any earlier subscriber
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<KeywordEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = Some(tx);
        rx
    }

    pub fn session(&self) -> &DetectionSession<E> {
        &self.session
    }

    /// Feed a chunk of little-endian 16-bit PCM
    ///
    /// On an engine error the frame being processed is dropped and the rest
    /// of the chunk is discarded; the stream stays usable.
    pub fn write(&mut self, chunk: &[u8]) -> Result<Option<KeywordEvent>> {
        if self.session.is_disposed() {
            return Err(SpotterError::Disposed);
        }

        self.bytes_written += chunk.len() as u64;
        let frame_bytes = self.assembler.frame_bytes();
        let mut offset = 0;

        if !self.assembler.is_empty() {
            offset = self.assembler.fill(chunk);

            if let Some(frame) = self.assembler.take_frame() {
                let detection = self.session.process(&frame)?;
                if let Some(event) = self.on_frame(detection, &chunk[offset..]) {
                    return Ok(Some(event));
                }
            }
        }

        while offset + frame_bytes <= chunk.len() {
            let detection = self.session.process(&chunk[offset..offset + frame_bytes])?;
            offset += frame_bytes;

            if let Some(event) = self.on_frame(detection, &chunk[offset..]) {
                return Ok(Some(event));
            }
        }

        if offset < chunk.len() {
            self.assembler.fill(&chunk[offset..]);
        }

        Ok(None)
    }

    fn on_frame(&mut self, detection: Detection, rest: &[u8]) -> Option<KeywordEvent> {
        let frame = self.frames_processed;
        self.frames_processed += 1;

        let keyword_index = detection.keyword_index()?;
        self.keywords_detected += 1;

        let event = KeywordEvent {
            keyword_index,
            remainder: rest.to_vec(),
            frame,
        };

        info!("Keyword {} detected at frame {}", keyword_index, frame);

        let delivered = self
            .event_tx
            .as_ref()
            .map(|tx| tx.send(event.clone()).is_ok());
        if delivered == Some(false) {
            debug!("Keyword event receiver dropped");
            self.event_tx = None;
        }

        Some(event)
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            frames_processed: self.frames_processed,
            keywords_detected: self.keywords_detected,
            bytes_written: self.bytes_written,
            pending_bytes: self.assembler.len(),
        }
    }

    /// Dispose the session, drop pending audio and close the event channel
    pub fn destroy(&mut self) {
        if !self.assembler.is_empty() {
            warn!(
                "Discarding {} bytes of incomplete frame",
                self.assembler.len()
            );
            self.assembler.clear();
        }

        self.event_tx = None;
        self.session.dispose();
    }
}
