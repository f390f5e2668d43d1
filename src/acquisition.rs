//! Sampler-side engine: timer-paced sampling into two fixed buffers with an
//! atomic ownership handoff to the transport.
//!
//! The engine is pure logic. The platform supplies the tick cadence (a timer
//! interrupt on a microcontroller, a loop in tests and demos) and a
//! [`FrameTransport`] that moves bytes. Nothing here allocates after
//! construction and nothing on the tick path can block, so worst-case tick
//! latency is bounded regardless of what the transport is doing.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::capture_config::{CaptureConfig, ConfigError};
use crate::wire_format::{Sample, CHANNEL_COUNT};

const GATE_READY: u8 = 0;
const GATE_IN_FLIGHT: u8 = 1;

/// Ownership-transfer point between the sampler and the transport.
///
/// The gate is the only state shared between the tick context and the
/// transport completion context. It holds a single atomic flag: `Ready`
/// (the transport may be handed a buffer) or `InFlight` (the transport still
/// owns one). The sampler claims it with [`try_claim`](Self::try_claim) at
/// the moment of handoff; the transport releases it with
/// [`complete`](Self::complete) once the last byte is out. Neither side ever
/// waits on the other.
#[derive(Debug)]
pub struct TransmitGate {
    state: AtomicU8,
}

impl TransmitGate {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(GATE_READY),
        }
    }

    /// Whether the transport is ready to accept a buffer.
    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == GATE_READY
    }

    /// Attempt the `Ready` to `InFlight` transition. Returns `false` without
    /// waiting when a transfer is still in flight.
    pub fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(
                GATE_READY,
                GATE_IN_FLIGHT,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Signal that the in-flight transfer has fully drained. Safe to call
    /// from any context, including a completion interrupt or another thread.
    pub fn complete(&self) {
        self.state.store(GATE_READY, Ordering::Release);
    }
}

impl Default for TransmitGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Asynchronous frame sender.
///
/// `start_transfer` receives the marker and the filled sample buffer and must
/// queue the whole frame without blocking the caller; it is never invoked
/// while a previous transfer is in flight, and a transfer is never canceled
/// or interleaved with another. Implementations signal completion by calling
/// [`TransmitGate::complete`] on the gate they share with the engine.
pub trait FrameTransport {
    fn start_transfer(&mut self, marker: u8, samples: &[u8]);
}

/// Sampler and buffer swap coordinator.
///
/// Two buffers are allocated once at construction. Exactly one is active
/// (written by [`tick`](Self::tick)); the other is either idle or owned by
/// the transport. The swap is an index toggle guarded by the gate, so the
/// transport can never observe a buffer the sampler is still writing.
#[derive(Debug)]
pub struct AcquisitionEngine<T> {
    buffers: [Box<[u8]>; 2],
    active: usize,
    write_index: usize,
    marker: u8,
    gate: Arc<TransmitGate>,
    transport: T,
    dropped_ticks: u64,
}

impl<T: FrameTransport> AcquisitionEngine<T> {
    /// Build the engine around a gate the transport side also holds, so it
    /// can signal completion.
    pub fn new(
        config: &CaptureConfig,
        transport: T,
        gate: Arc<TransmitGate>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let buffers = [
            vec![0u8; config.sample_count].into_boxed_slice(),
            vec![0u8; config.sample_count].into_boxed_slice(),
        ];
        Ok(Self {
            buffers,
            active: 0,
            write_index: 0,
            marker: config.marker,
            gate,
            transport,
            dropped_ticks: 0,
        })
    }

    /// Handle one sampler tick.
    ///
    /// Appends the packed sample to the active buffer. When the buffer is
    /// full, the tick first tries to hand it off: if the transport is still
    /// draining the previous one, the tick is dropped (counted, never
    /// blocking); otherwise the buffers swap roles, the transfer starts, and
    /// the sample lands in the fresh buffer.
    pub fn tick(&mut self, levels: [bool; CHANNEL_COUNT]) {
        if self.write_index == self.buffers[self.active].len() {
            if !self.gate.try_claim() {
                self.dropped_ticks += 1;
                return;
            }
            self.transport
                .start_transfer(self.marker, &self.buffers[self.active]);
            self.active ^= 1;
            self.write_index = 0;
        }
        self.buffers[self.active][self.write_index] = Sample::pack(levels).raw();
        self.write_index += 1;
    }

    /// Ticks dropped because the transport was not ready when a buffer
    /// filled. Monotonic over the engine lifetime.
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    /// Fill level of the active buffer.
    pub fn pending_samples(&self) -> usize {
        self.write_index
    }

    pub fn gate(&self) -> Arc<TransmitGate> {
        Arc::clone(&self.gate)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records transfers; completion is driven by the test.
    struct MockTransport {
        gate: Arc<TransmitGate>,
        frames: Vec<Vec<u8>>,
        auto_complete: bool,
    }

    impl MockTransport {
        fn new(gate: Arc<TransmitGate>, auto_complete: bool) -> Self {
            Self {
                gate,
                frames: Vec::new(),
                auto_complete,
            }
        }
    }

    impl FrameTransport for MockTransport {
        fn start_transfer(&mut self, marker: u8, samples: &[u8]) {
            let mut frame = Vec::with_capacity(samples.len() + 1);
            frame.push(marker);
            frame.extend_from_slice(samples);
            self.frames.push(frame);
            if self.auto_complete {
                self.gate.complete();
            }
        }
    }

    fn small_config(sample_count: usize) -> CaptureConfig {
        CaptureConfig {
            sample_count,
            sampling_rate_hz: 1000,
            baud_rate: 921_600,
            ..CaptureConfig::default()
        }
    }

    fn engine(sample_count: usize, auto_complete: bool) -> AcquisitionEngine<MockTransport> {
        let gate = Arc::new(TransmitGate::new());
        let transport = MockTransport::new(Arc::clone(&gate), auto_complete);
        AcquisitionEngine::new(&small_config(sample_count), transport, gate).unwrap()
    }

    fn alternating(i: u64) -> [bool; CHANNEL_COUNT] {
        [i % 2 == 0, false, i % 2 == 1, false]
    }

    #[test]
    fn test_gate_claim_and_complete() {
        let gate = TransmitGate::new();
        assert!(gate.is_ready());
        assert!(gate.try_claim());
        assert!(!gate.is_ready());
        assert!(!gate.try_claim());
        gate.complete();
        assert!(gate.try_claim());
    }

    #[test]
    fn test_frames_carry_samples_in_tick_order() {
        let mut engine = engine(4, true);
        for i in 0..9 {
            engine.tick(alternating(i));
        }
        // Two handoffs happen, on the fifth and ninth ticks.
        let frames = &engine.transport().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![0xAA, 0b0001, 0b0100, 0b0001, 0b0100]);
        assert_eq!(frames[1], vec![0xAA, 0b0001, 0b0100, 0b0001, 0b0100]);
        assert_eq!(engine.pending_samples(), 1);
        assert_eq!(engine.dropped_ticks(), 0);
    }

    #[test]
    fn test_withheld_readiness_drops_exactly_k_ticks() {
        let mut engine = engine(4, false);
        // Fill the first buffer and trigger the first handoff.
        for i in 0..5 {
            engine.tick(alternating(i));
        }
        assert_eq!(engine.transport().frames.len(), 1);
        // Fill the second buffer while the transfer stays in flight.
        for i in 5..8 {
            engine.tick(alternating(i));
        }
        assert_eq!(engine.dropped_ticks(), 0);
        // Both buffers are now spoken for: every further tick is dropped.
        let k = 7;
        for i in 0..k {
            engine.tick(alternating(i));
        }
        assert_eq!(engine.dropped_ticks(), k);
        assert_eq!(engine.transport().frames.len(), 1);
        // Completion unblocks the next handoff and ticks land again.
        engine.gate().complete();
        engine.tick([true, true, true, true]);
        assert_eq!(engine.transport().frames.len(), 2);
        assert_eq!(engine.dropped_ticks(), k);
        assert_eq!(engine.pending_samples(), 1);
    }

    #[test]
    fn test_no_torn_frames_under_overrun() {
        // Feed a nibble counter and sporadically complete transfers. The
        // concatenated frames must reproduce the accepted ticks exactly, in
        // order, with no bytes from a buffer the sampler was still writing.
        let mut engine = engine(8, false);
        let mut accepted = Vec::new();
        for step in 0..200u64 {
            let value = (step % 16) as u8;
            let levels = [
                value & 1 != 0,
                value & 2 != 0,
                value & 4 != 0,
                value & 8 != 0,
            ];
            let dropped_before = engine.dropped_ticks();
            engine.tick(levels);
            if engine.dropped_ticks() == dropped_before {
                accepted.push(value);
            }
            if step % 29 == 0 {
                engine.gate().complete();
            }
        }
        let mut streamed = Vec::new();
        for frame in &engine.transport().frames {
            assert_eq!(frame[0], 0xAA);
            assert_eq!(frame.len(), 9);
            streamed.extend_from_slice(&frame[1..]);
        }
        assert!(!streamed.is_empty());
        assert_eq!(streamed[..], accepted[..streamed.len()]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let gate = Arc::new(TransmitGate::new());
        let transport = MockTransport::new(Arc::clone(&gate), true);
        let config = CaptureConfig {
            sample_count: 0,
            ..CaptureConfig::default()
        };
        assert!(AcquisitionEngine::new(&config, transport, gate).is_err());
    }
}
