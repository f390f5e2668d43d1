//! Host-side frame reassembly from the raw serial byte stream.
//!
//! The synchronizer is a two-state machine. In `Searching` it discards bytes
//! until one equals the marker; in `Collecting` it accumulates exactly
//! `sample_count` bytes and emits them as a [`Frame`]. A collected byte with
//! a nonzero high nibble cannot be a legitimate sample, so it aborts the
//! partial frame and resynchronization starts over, at most one marker away.

use std::io::Read;

use crate::wire_format::{Frame, Sample, SAMPLE_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Searching,
    Collecting,
}

#[derive(Debug)]
pub struct FrameSynchronizer {
    marker: u8,
    sample_count: usize,
    state: SyncState,
    partial: Vec<u8>,
    next_offset: u64,
    frames_emitted: u64,
    resyncs: u64,
}

impl FrameSynchronizer {
    pub fn new(marker: u8, sample_count: usize) -> Self {
        assert!(
            marker & !SAMPLE_MASK != 0,
            "marker 0x{:02X} must be outside the sample byte range",
            marker
        );
        assert!(sample_count > 0, "sample count must be nonzero");
        Self {
            marker,
            sample_count,
            state: SyncState::Searching,
            partial: Vec::with_capacity(sample_count),
            next_offset: 0,
            frames_emitted: 0,
            resyncs: 0,
        }
    }

    /// Consume one byte from the stream; returns a frame when it completes
    /// one.
    pub fn push_byte(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            SyncState::Searching => {
                if byte == self.marker {
                    self.state = SyncState::Collecting;
                    self.partial.clear();
                }
                None
            }
            SyncState::Collecting => {
                if !Sample::is_valid_raw(byte) {
                    // Not a sample byte: the stream slipped. Drop the partial
                    // frame; if the offender is itself a marker, collection
                    // restarts right away.
                    self.resyncs += 1;
                    log::debug!(
                        "stream desync after {} of {} samples, searching again",
                        self.partial.len(),
                        self.sample_count
                    );
                    self.partial.clear();
                    self.state = if byte == self.marker {
                        SyncState::Collecting
                    } else {
                        SyncState::Searching
                    };
                    return None;
                }
                self.partial.push(byte);
                if self.partial.len() < self.sample_count {
                    return None;
                }
                let samples =
                    std::mem::replace(&mut self.partial, Vec::with_capacity(self.sample_count));
                let frame = Frame::new(samples, self.next_offset);
                self.next_offset += self.sample_count as u64;
                self.frames_emitted += 1;
                self.state = SyncState::Searching;
                Some(frame)
            }
        }
    }

    /// Consume a chunk of the stream, collecting every completed frame.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in bytes {
            if let Some(frame) = self.push_byte(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Block on `reader` until a full frame assembles.
    ///
    /// Works against any byte source: the live serial port, or a recorded
    /// capture replayed from a file or slice. A read failure (including a
    /// timeout or end of input) surfaces as the reader's error with any
    /// partial frame still held, ready to continue or be [`reset`](Self::reset).
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> std::io::Result<Frame> {
        let mut byte = [0u8; 1];
        loop {
            reader.read_exact(&mut byte)?;
            if let Some(frame) = self.push_byte(byte[0]) {
                return Ok(frame);
            }
        }
    }

    /// Discard any partial frame and return to `Searching`. Used when the
    /// stream is interrupted outside the byte path (stop, disconnect).
    pub fn reset(&mut self) {
        if self.state == SyncState::Collecting && !self.partial.is_empty() {
            log::debug!(
                "discarding incomplete frame ({} of {} samples)",
                self.partial.len(),
                self.sample_count
            );
        }
        self.partial.clear();
        self.state = SyncState::Searching;
    }

    pub fn is_searching(&self) -> bool {
        self.state == SyncState::Searching
    }

    /// Frames emitted since construction.
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Times the collector had to abandon a partial frame.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }
}
