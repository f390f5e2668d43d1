use std::time::Duration;

use crate::trigger_engine::TriggerEdge;
use crate::wire_format::{CHANNEL_COUNT, DEFAULT_MARKER, DEFAULT_SAMPLE_COUNT, SAMPLE_MASK};

/// Bits on the wire per transmitted byte: one start bit, eight data bits,
/// one stop bit.
const WIRE_BITS_PER_BYTE: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sample count must be nonzero")]
    ZeroSampleCount,

    #[error("sampling rate must be nonzero")]
    ZeroSamplingRate,

    #[error("baud rate must be nonzero")]
    ZeroBaudRate,

    #[error("channel index {index} out of range, must be below {}", CHANNEL_COUNT)]
    ChannelOutOfRange { index: usize },

    #[error(
        "marker 0x{marker:02X} collides with the sample byte range, must be above 0x{:02X}",
        SAMPLE_MASK
    )]
    MarkerCollidesWithSamples { marker: u8 },

    #[error(
        "frame transmit time {transmit_ms:.2}ms exceeds frame sample time {sample_ms:.2}ms; \
         lower the sampling rate or raise the baud rate"
    )]
    TimingContractViolated { transmit_ms: f64, sample_ms: f64 },
}

/// Everything the acquisition engine and the host session need to agree on.
///
/// All fields are plain numbers and enums. The only cross-field rule is the
/// timing contract checked by [`validate`](Self::validate): a full frame must
/// drain over the serial link faster than the sampler fills the other buffer,
/// otherwise ticks are dropped under the backpressure policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
    /// Sampler tick rate in Hz.
    pub sampling_rate_hz: u32,
    /// Samples per frame (and per acquisition buffer).
    pub sample_count: usize,
    /// Frame marker byte. Must have a nonzero high nibble.
    pub marker: u8,
    /// Serial link speed in bits per second.
    pub baud_rate: u32,
    /// Channel the trigger engine watches.
    pub trigger_channel: usize,
    pub trigger_edge: TriggerEdge,
    /// Channel the frequency meter watches.
    pub frequency_channel: usize,
    /// Display window size in samples.
    pub window_samples: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 83333,
            sample_count: DEFAULT_SAMPLE_COUNT,
            marker: DEFAULT_MARKER,
            baud_rate: 921_600,
            trigger_channel: 0,
            trigger_edge: TriggerEdge::Rising,
            frequency_channel: 0,
            window_samples: 10_000,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 {
            return Err(ConfigError::ZeroSampleCount);
        }
        if self.sampling_rate_hz == 0 {
            return Err(ConfigError::ZeroSamplingRate);
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        if self.marker & !SAMPLE_MASK == 0 {
            return Err(ConfigError::MarkerCollidesWithSamples { marker: self.marker });
        }
        for index in [self.trigger_channel, self.frequency_channel] {
            if index >= CHANNEL_COUNT {
                return Err(ConfigError::ChannelOutOfRange { index });
            }
        }

        let transmit = self.frame_transmit_time();
        let sample = self.frame_sample_time();
        if transmit > sample {
            return Err(ConfigError::TimingContractViolated {
                transmit_ms: transmit.as_secs_f64() * 1e3,
                sample_ms: sample.as_secs_f64() * 1e3,
            });
        }
        Ok(())
    }

    /// Time to push one full frame (marker plus samples) through the link.
    pub fn frame_transmit_time(&self) -> Duration {
        let bits = (self.sample_count as u64 + 1) * WIRE_BITS_PER_BYTE;
        Duration::from_secs_f64(bits as f64 / self.baud_rate as f64)
    }

    /// Time the sampler takes to fill one buffer.
    pub fn frame_sample_time(&self) -> Duration {
        Duration::from_secs_f64(self.sample_count as f64 / self.sampling_rate_hz as f64)
    }

    /// Interval between two sampler ticks.
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sampling_rate_hz as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_reference_timing_contract_holds() {
        // The stock deployment: 1000 samples per frame at 83333 Hz over a
        // 921600 baud link. Transmit must finish before the other buffer
        // fills, with roughly a millisecond to spare.
        let config = CaptureConfig {
            sampling_rate_hz: 83333,
            sample_count: 1000,
            marker: 0xAA,
            baud_rate: 921_600,
            ..CaptureConfig::default()
        };
        let transmit = config.frame_transmit_time();
        let sample = config.frame_sample_time();
        assert!(transmit < sample, "{:?} >= {:?}", transmit, sample);
        assert!((transmit.as_secs_f64() - 0.010_86).abs() < 0.000_05);
        assert!((sample.as_secs_f64() - 0.012).abs() < 0.000_05);
    }

    #[test]
    fn test_timing_contract_violation_detected() {
        let config = CaptureConfig {
            baud_rate: 115_200,
            ..CaptureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TimingContractViolated { .. })
        ));
    }

    #[test]
    fn test_marker_collision_rejected() {
        let config = CaptureConfig {
            marker: 0x0F,
            ..CaptureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MarkerCollidesWithSamples { marker: 0x0F })
        ));
    }

    #[test]
    fn test_channel_out_of_range_rejected() {
        let config = CaptureConfig {
            trigger_channel: 4,
            ..CaptureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChannelOutOfRange { index: 4 })
        ));
    }
}
