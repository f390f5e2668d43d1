//! Bounded per-channel accumulation of decoded levels for the display layer.
//!
//! Plain data only. The window keeps the most recent `capacity` samples per
//! channel; when the trigger fires, the consumer re-anchors it so the next
//! rendered sweep starts at the trigger point. By default nothing from
//! before the trigger survives the re-anchor; a pre-trigger retention count
//! can keep a short tail of context instead.

use std::collections::VecDeque;

use crate::wire_format::{Frame, CHANNEL_COUNT};

#[derive(Debug)]
pub struct WaveformWindow {
    channels: [VecDeque<bool>; CHANNEL_COUNT],
    capacity: usize,
    pre_trigger_retention: usize,
}

impl WaveformWindow {
    pub fn new(window_samples: usize) -> Self {
        Self::with_pre_trigger_retention(window_samples, 0)
    }

    /// A window that keeps up to `retention` samples of pre-trigger context
    /// when re-anchored.
    pub fn with_pre_trigger_retention(window_samples: usize, retention: usize) -> Self {
        assert!(window_samples > 0, "window size must be nonzero");
        Self {
            channels: std::array::from_fn(|_| VecDeque::with_capacity(window_samples)),
            capacity: window_samples,
            pre_trigger_retention: retention.min(window_samples),
        }
    }

    /// Append a whole frame.
    pub fn push_frame(&mut self, frame: &Frame) {
        self.push_tail(frame, 0);
    }

    /// Append the samples of `frame` starting at `from`, typically the
    /// trigger index.
    pub fn push_tail(&mut self, frame: &Frame, from: usize) {
        for index in from..frame.len() {
            let sample = frame.sample(index);
            for (channel, levels) in self.channels.iter_mut().enumerate() {
                if levels.len() == self.capacity {
                    levels.pop_front();
                }
                levels.push_back(sample.channel(channel));
            }
        }
    }

    /// Start a new sweep: drop everything except the configured pre-trigger
    /// tail.
    pub fn re_anchor(&mut self) {
        for levels in &mut self.channels {
            while levels.len() > self.pre_trigger_retention {
                levels.pop_front();
            }
        }
    }

    /// Change the window size, discarding the oldest samples if it shrinks.
    pub fn resize(&mut self, window_samples: usize) {
        assert!(window_samples > 0, "window size must be nonzero");
        self.capacity = window_samples;
        self.pre_trigger_retention = self.pre_trigger_retention.min(window_samples);
        for levels in &mut self.channels {
            while levels.len() > self.capacity {
                levels.pop_front();
            }
        }
    }

    /// Samples currently held (identical across channels).
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Levels of one channel, oldest first.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = bool> + '_ {
        self.channels[channel].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire_format::Frame;

    #[test]
    fn test_window_is_bounded() {
        let mut window = WaveformWindow::new(4);
        window.push_frame(&Frame::new(vec![1, 0, 1, 0, 1, 1], 0));
        assert_eq!(window.len(), 4);
        let kept: Vec<bool> = window.channel(0).collect();
        assert_eq!(kept, vec![true, false, true, true]);
    }

    #[test]
    fn test_re_anchor_discards_pre_trigger_data() {
        let mut window = WaveformWindow::new(10);
        window.push_frame(&Frame::new(vec![1; 6], 0));
        window.re_anchor();
        assert!(window.is_empty());
        window.push_tail(&Frame::new(vec![0, 0, 1, 1], 6), 2);
        let kept: Vec<bool> = window.channel(0).collect();
        assert_eq!(kept, vec![true, true]);
    }

    #[test]
    fn test_pre_trigger_retention_keeps_tail() {
        let mut window = WaveformWindow::with_pre_trigger_retention(10, 3);
        window.push_frame(&Frame::new(vec![0, 0, 0, 1, 1, 1], 0));
        window.re_anchor();
        assert_eq!(window.len(), 3);
        let kept: Vec<bool> = window.channel(0).collect();
        assert_eq!(kept, vec![true, true, true]);
    }

    #[test]
    fn test_resize_trims_oldest() {
        let mut window = WaveformWindow::new(8);
        window.push_frame(&Frame::new(vec![1, 1, 0, 0], 0));
        window.resize(2);
        let kept: Vec<bool> = window.channel(0).collect();
        assert_eq!(kept, vec![false, false]);
        assert_eq!(window.capacity(), 2);
    }

    #[test]
    fn test_channels_accumulate_independently() {
        let mut window = WaveformWindow::new(4);
        window.push_frame(&Frame::new(vec![0b0001, 0b0010], 0));
        assert_eq!(window.channel(0).collect::<Vec<_>>(), vec![true, false]);
        assert_eq!(window.channel(1).collect::<Vec<_>>(), vec![false, true]);
        assert_eq!(window.channel(2).collect::<Vec<_>>(), vec![false, false]);
    }
}
