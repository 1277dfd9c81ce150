/// Partial-frame accumulator
///
/// Holds the tail of a chunk that did not fill a whole frame, until the next
/// chunk completes it. Capacity is exactly one frame of PCM bytes.

use crate::error::{Result, SpotterError};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::trace;

pub struct FrameAssembler {
    producer: HeapProd<u8>,
    consumer: HeapCons<u8>,
}

impl FrameAssembler {
    /// Create an accumulator for frames of `frame_bytes` bytes
    pub fn new(frame_bytes: usize) -> Result<Self> {
        if frame_bytes == 0 {
            return Err(SpotterError::validation("frame size must be greater than 0"));
        }

        let (producer, consumer) = HeapRb::<u8>::new(frame_bytes).split();
        Ok(Self { producer, consumer })
    }

    /// Copy as much of `chunk` as fits into the pending frame
    ///
    /// Returns the number of bytes consumed from `chunk`.
    pub fn fill(&mut self, chunk: &[u8]) -> usize {
        let written = self.producer.push_slice(chunk);
        trace!("Buffered {} bytes ({} pending)", written, self.len());
        written
    }

    /// Remove and return the pending frame once it is complete
    pub fn take_frame(&mut self) -> Option<Vec<u8>> {
        if !self.is_full() {
            return None;
        }

        let mut frame = vec![0u8; self.frame_bytes()];
        let read = self.consumer.pop_slice(&mut frame);
        frame.truncate(read);
        Some(frame)
    }

    pub fn is_full(&self) -> bool {
        self.consumer.occupied_len() == self.frame_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending bytes
    pub fn len(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn frame_bytes(&self) -> usize {
        self.consumer.capacity().get()
    }

    /// Discard any pending bytes
    pub fn clear(&mut self) {
        let occupied = self.consumer.occupied_len();
        self.consumer.skip(occupied);
    }
}
