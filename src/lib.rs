//! # QuadProbe RS
//!
//! A Rust library for a 4-channel serial logic analyzer: the sampler-side
//! acquisition engine, the framed wire protocol, and the host-side analysis
//! chain that turns the raw byte stream back into waveforms.
//!
//! The probe samples four digital inputs at a fixed rate, packs each instant
//! into one byte, and streams marker-delimited frames over a serial link.
//! This crate implements both ends of that pipeline:
//!
//! - **Acquisition engine**: timer-paced sampling into two fixed buffers
//!   with a lock-free ownership handoff to an asynchronous transport;
//!   backpressure drops ticks (counted) instead of ever blocking the tick
//!   path
//! - **Frame synchronization**: marker search and fixed-length frame
//!   reassembly that self-heals after stream corruption
//! - **Edge triggering**: rising/falling trigger on a selected channel with
//!   manual re-arm, anchoring the display window at the trigger point
//! - **Frequency measurement**: averaged rising-edge frequency over a
//!   bounded rolling history that spans frame boundaries
//! - **Session control**: Run/Stop over a `serialport` link as a typestate
//!   pair, with device discovery
//!
//! ## Examples
//!
//! ### Packing and unpacking samples
//!
//! ```rust
//! use quadprobe_rs::Sample;
//!
//! let sample = Sample::pack([true, false, true, false]);
//! assert_eq!(sample.raw(), 0b0101);
//! assert!(sample.channel(0));
//! assert!(!sample.channel(3));
//! ```
//!
//! ### The sampler side
//!
//! ```rust
//! use std::sync::Arc;
//! use quadprobe_rs::{AcquisitionEngine, CaptureConfig, FrameTransport, TransmitGate};
//!
//! // A transport that drops frames on the floor; real ones queue the bytes
//! // and call `TransmitGate::complete` once the last one is out.
//! struct NullTransport(Arc<TransmitGate>);
//!
//! impl FrameTransport for NullTransport {
//!     fn start_transfer(&mut self, _marker: u8, _samples: &[u8]) {
//!         self.0.complete();
//!     }
//! }
//!
//! let config = CaptureConfig::default();
//! let gate = Arc::new(TransmitGate::new());
//! let transport = NullTransport(Arc::clone(&gate));
//! let mut engine = AcquisitionEngine::new(&config, transport, gate)?;
//!
//! // The platform timer calls this once per sampling period.
//! engine.tick([true, false, false, false]);
//! assert_eq!(engine.dropped_ticks(), 0);
//! # Ok::<(), quadprobe_rs::ConfigError>(())
//! ```
//!
//! ### The host side, without hardware
//!
//! ```rust
//! use quadprobe_rs::{CaptureConfig, FramePipeline};
//!
//! let config = CaptureConfig {
//!     sample_count: 8,
//!     sampling_rate_hz: 1000,
//!     ..CaptureConfig::default()
//! };
//! let mut pipeline = FramePipeline::new(&config)?;
//!
//! // One marker-delimited frame with a rising edge on channel 0.
//! let mut stream = vec![config.marker];
//! stream.extend_from_slice(&[0, 0, 0, 0, 1, 1, 1, 1]);
//! let updates = pipeline.push_bytes(&stream);
//! assert_eq!(updates.len(), 1);
//! assert_eq!(updates[0].trigger_index, Some(4));
//! # Ok::<(), quadprobe_rs::ConfigError>(())
//! ```
//!
//! ### Live capture
//!
//! ```rust,no_run
//! use quadprobe_rs::{CaptureConfig, IdleProbe};
//!
//! let probe = IdleProbe::connect(None, CaptureConfig::default())?;
//! let mut streaming = probe.run()?;
//! for _ in 0..100 {
//!     let update = streaming.next_update()?;
//!     if let Some(hz) = update.frequency_hz {
//!         println!("{:.2} Hz", hz);
//!     }
//! }
//! let _idle = streaming.stop();
//! # Ok::<(), quadprobe_rs::SessionError>(())
//! ```
//!
//! ### Device discovery
//!
//! ```rust,no_run
//! use quadprobe_rs::ProbeConnector;
//!
//! for device in ProbeConnector::available_devices()? {
//!     println!("Found probe: {} at {}", device.name, device.port);
//! }
//! # Ok::<(), quadprobe_rs::ConnectorError>(())
//! ```

pub mod acquisition;
pub mod capture_config;
pub mod frame_sync;
pub mod frequency_meter;
pub mod probe_connector;
pub mod probe_session;
pub mod trigger_engine;
pub mod waveform_window;
pub mod wire_format;

// Re-export the main types for convenience
pub use wire_format::{
    Frame, Sample, CHANNEL_COUNT, DEFAULT_MARKER, DEFAULT_SAMPLE_COUNT, SAMPLE_MASK,
};

pub use acquisition::{AcquisitionEngine, FrameTransport, TransmitGate};

pub use capture_config::{CaptureConfig, ConfigError};

pub use frame_sync::FrameSynchronizer;

pub use trigger_engine::{TriggerEdge, TriggerEngine};

pub use frequency_meter::{FrequencyMeter, DEFAULT_EDGE_HISTORY};

pub use waveform_window::WaveformWindow;

pub use probe_connector::{ConnectorError, ProbeConnector, ProbeDevice};

pub use probe_session::{FramePipeline, FrameUpdate, IdleProbe, SessionError, StreamingProbe};
