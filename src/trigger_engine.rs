//! Edge trigger over reassembled frames.

use crate::wire_format::{Frame, CHANNEL_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Rising,
    Falling,
}

impl TriggerEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEdge::Rising => "rising",
            TriggerEdge::Falling => "falling",
        }
    }
}

/// Scans frames for the first matching transition on one channel.
///
/// The engine remembers the selected channel's level across frames, so a
/// transition split over a frame boundary is detected at index 0 of the
/// later frame. A hit disarms the engine; re-arming is an explicit request
/// (the host "Run" action), never automatic, so a periodic signal cannot
/// re-anchor the display on every frame.
#[derive(Debug)]
pub struct TriggerEngine {
    channel: usize,
    edge: TriggerEdge,
    armed: bool,
    last_level: Option<bool>,
}

impl TriggerEngine {
    pub fn new(channel: usize, edge: TriggerEdge) -> Self {
        assert!(
            channel < CHANNEL_COUNT,
            "channel index {} out of range, must be below {}",
            channel,
            CHANNEL_COUNT
        );
        Self {
            channel,
            edge,
            armed: false,
            last_level: None,
        }
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Switch the watched channel. The remembered level belongs to the old
    /// channel, so it is forgotten.
    pub fn set_channel(&mut self, channel: usize) {
        assert!(
            channel < CHANNEL_COUNT,
            "channel index {} out of range, must be below {}",
            channel,
            CHANNEL_COUNT
        );
        if channel != self.channel {
            self.channel = channel;
            self.last_level = None;
        }
    }

    /// Forget the remembered level, so the next scan starts a fresh pair
    /// comparison at the frame's second sample. Used when stream continuity
    /// breaks and a transition spanning the lost bytes would be fiction.
    pub fn forget_level(&mut self) {
        self.last_level = None;
    }

    pub fn edge(&self) -> TriggerEdge {
        self.edge
    }

    pub fn set_edge(&mut self, edge: TriggerEdge) {
        self.edge = edge;
    }

    /// Scan one frame in sample order.
    ///
    /// Returns the index of the sample that completed the configured
    /// transition, or `None` when disarmed or no transition occurred. The
    /// engine disarms itself on a hit; no earlier index can be reported
    /// because scanning stops at the first match.
    pub fn scan(&mut self, frame: &Frame) -> Option<usize> {
        if frame.is_empty() {
            return None;
        }
        let mut hit = None;
        if self.armed {
            let mut prev = self.last_level;
            for index in 0..frame.len() {
                let level = frame.channel_level(index, self.channel);
                if let Some(prev) = prev {
                    let fired = match self.edge {
                        TriggerEdge::Rising => !prev && level,
                        TriggerEdge::Falling => prev && !level,
                    };
                    if fired {
                        hit = Some(index);
                        self.armed = false;
                        log::debug!(
                            "{} edge on channel {} at sample {}",
                            self.edge.as_str(),
                            self.channel,
                            index
                        );
                        break;
                    }
                }
                prev = Some(level);
            }
        }
        // The final sample is what the next frame's first sample compares
        // against, whether or not this scan fired.
        self.last_level = Some(frame.channel_level(frame.len() - 1, self.channel));
        hit
    }
}
