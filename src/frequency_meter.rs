//! Rising-edge frequency measurement over a rolling edge history.

use std::collections::VecDeque;

use crate::wire_format::{Frame, CHANNEL_COUNT};

/// Default number of edge timestamps kept in the rolling history.
pub const DEFAULT_EDGE_HISTORY: usize = 64;

/// Measures the rate of rising edges on one channel.
///
/// Edges are timestamped on the session-wide sample counter carried by each
/// frame, so timing runs uninterrupted across frame boundaries. The history
/// is bounded; the estimate is `sampling_rate / mean(consecutive deltas)`
/// over whatever the window holds, and absent entirely below two edges.
#[derive(Debug)]
pub struct FrequencyMeter {
    channel: usize,
    sampling_rate_hz: f64,
    history: VecDeque<u64>,
    capacity: usize,
    last_level: Option<bool>,
}

impl FrequencyMeter {
    pub fn new(channel: usize, sampling_rate_hz: u32) -> Self {
        Self::with_history(channel, sampling_rate_hz, DEFAULT_EDGE_HISTORY)
    }

    pub fn with_history(channel: usize, sampling_rate_hz: u32, capacity: usize) -> Self {
        assert!(
            channel < CHANNEL_COUNT,
            "channel index {} out of range, must be below {}",
            channel,
            CHANNEL_COUNT
        );
        assert!(sampling_rate_hz > 0, "sampling rate must be nonzero");
        assert!(capacity >= 2, "history must hold at least two edges");
        Self {
            channel,
            sampling_rate_hz: f64::from(sampling_rate_hz),
            history: VecDeque::with_capacity(capacity),
            capacity,
            last_level: None,
        }
    }

    /// Record every rising edge in the frame.
    pub fn ingest(&mut self, frame: &Frame) {
        for index in 0..frame.len() {
            let level = frame.channel_level(index, self.channel);
            if self.last_level == Some(false) && level {
                if self.history.len() == self.capacity {
                    self.history.pop_front();
                }
                self.history.push_back(frame.start_offset() + index as u64);
            }
            self.last_level = Some(level);
        }
    }

    /// Averaged instantaneous frequency in Hz, or `None` while fewer than
    /// two edges are in the window (no signal).
    pub fn frequency_hz(&self) -> Option<f64> {
        let first = *self.history.front()?;
        let last = *self.history.back()?;
        if self.history.len() < 2 || last == first {
            return None;
        }
        let mean_period_samples = (last - first) as f64 / (self.history.len() - 1) as f64;
        Some(self.sampling_rate_hz / mean_period_samples)
    }

    /// Edges currently in the window.
    pub fn edge_count(&self) -> usize {
        self.history.len()
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Switch the measured channel, discarding history gathered on the old
    /// one.
    pub fn set_channel(&mut self, channel: usize) {
        assert!(
            channel < CHANNEL_COUNT,
            "channel index {} out of range, must be below {}",
            channel,
            CHANNEL_COUNT
        );
        if channel != self.channel {
            self.channel = channel;
            self.clear();
        }
    }

    /// Forget all edges and the remembered level. Used when stream
    /// continuity breaks (resynchronization, session restart), since deltas
    /// spanning a gap would be meaningless.
    pub fn clear(&mut self) {
        self.history.clear();
        self.last_level = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire_format::Frame;

    fn edge_train_frame(len: usize, period: usize, start_offset: u64) -> Frame {
        // High for the first half of every period, starting at index 0.
        let samples = (0..len)
            .map(|i| u8::from(i % period < period / 2))
            .collect();
        Frame::new(samples, start_offset)
    }

    #[test]
    fn test_edge_train_measures_within_one_percent() {
        let sampling_rate_hz = 83_300;
        let mut meter = FrequencyMeter::new(0, sampling_rate_hz);
        meter.ingest(&edge_train_frame(1000, 100, 0));
        let expected = f64::from(sampling_rate_hz) / 100.0;
        let measured = meter.frequency_hz().unwrap();
        assert!(
            (measured - expected).abs() / expected < 0.01,
            "measured {measured} Hz, expected {expected} Hz"
        );
    }

    #[test]
    fn test_timing_spans_frame_boundaries() {
        let mut meter = FrequencyMeter::new(0, 1000);
        // Period 10 continues seamlessly over two frames of 50 samples.
        meter.ingest(&edge_train_frame(50, 10, 0));
        meter.ingest(&edge_train_frame(50, 10, 50));
        let measured = meter.frequency_hz().unwrap();
        assert!((measured - 100.0).abs() < 1.0, "measured {measured} Hz");
    }

    #[test]
    fn test_no_signal_below_two_edges() {
        let mut meter = FrequencyMeter::new(0, 1000);
        assert_eq!(meter.frequency_hz(), None);
        // One rising edge only.
        meter.ingest(&Frame::new(vec![0, 0, 1, 1, 1], 0));
        assert_eq!(meter.edge_count(), 1);
        assert_eq!(meter.frequency_hz(), None);
    }

    #[test]
    fn test_constant_level_is_no_signal() {
        let mut meter = FrequencyMeter::new(0, 1000);
        meter.ingest(&Frame::new(vec![1; 100], 0));
        assert_eq!(meter.frequency_hz(), None);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut meter = FrequencyMeter::with_history(0, 1000, 4);
        meter.ingest(&edge_train_frame(100, 10, 0));
        assert_eq!(meter.edge_count(), 4);
        // The surviving window still measures the true period.
        let measured = meter.frequency_hz().unwrap();
        assert!((measured - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_clear_resets_measurement() {
        let mut meter = FrequencyMeter::new(0, 1000);
        meter.ingest(&edge_train_frame(100, 10, 0));
        assert!(meter.frequency_hz().is_some());
        meter.clear();
        assert_eq!(meter.frequency_hz(), None);
        assert_eq!(meter.edge_count(), 0);
    }
}
