//! Host capture session: the serial link plus the per-frame processing
//! pipeline, split Run/Stop as a typestate pair.

use std::io::Read;

use serialport::SerialPort;

use crate::capture_config::{CaptureConfig, ConfigError};
use crate::frame_sync::FrameSynchronizer;
use crate::frequency_meter::FrequencyMeter;
use crate::probe_connector::{ConnectorError, ProbeConnector};
use crate::trigger_engine::{TriggerEdge, TriggerEngine};
use crate::waveform_window::WaveformWindow;
use crate::wire_format::Frame;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("serial link lost: {0}")]
    LinkLost(#[source] std::io::Error),
}

/// What one frame produced: the frame itself plus whatever the analyzers
/// derived from it. Plain data for the display layer.
#[derive(Debug)]
pub struct FrameUpdate {
    pub frame: Frame,
    /// Sample index the trigger fired at, if it fired in this frame.
    pub trigger_index: Option<usize>,
    /// Current frequency estimate, absent while under two edges are known.
    pub frequency_hz: Option<f64>,
}

/// The full host-side processing chain, independent of where the bytes come
/// from: frame reassembly, edge trigger, frequency measurement, display
/// accumulation.
///
/// [`StreamingProbe`] feeds it from the serial port; tests and the loopback
/// demo feed it directly.
#[derive(Debug)]
pub struct FramePipeline {
    sync: FrameSynchronizer,
    trigger: TriggerEngine,
    frequency: FrequencyMeter,
    window: WaveformWindow,
    seen_resyncs: u64,
}

impl FramePipeline {
    /// Build the pipeline with the trigger armed, an empty edge history and
    /// the synchronizer searching.
    pub fn new(config: &CaptureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut trigger = TriggerEngine::new(config.trigger_channel, config.trigger_edge);
        trigger.arm();
        Ok(Self {
            sync: FrameSynchronizer::new(config.marker, config.sample_count),
            trigger,
            frequency: FrequencyMeter::new(config.frequency_channel, config.sampling_rate_hz),
            window: WaveformWindow::new(config.window_samples),
            seen_resyncs: 0,
        })
    }

    /// Consume one stream byte; returns an update when it completes a frame.
    pub fn push_byte(&mut self, byte: u8) -> Option<FrameUpdate> {
        let frame = self.sync.push_byte(byte)?;
        Some(self.apply(frame))
    }

    /// Consume a chunk of the stream.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<FrameUpdate> {
        bytes.iter().filter_map(|&byte| self.push_byte(byte)).collect()
    }

    /// Block on `reader` until the next frame assembles and report what it
    /// produced. Works against any byte source, live or recorded.
    pub fn read_update<R: Read>(&mut self, reader: &mut R) -> std::io::Result<FrameUpdate> {
        let frame = self.sync.read_frame(reader)?;
        Ok(self.apply(frame))
    }

    fn apply(&mut self, frame: Frame) -> FrameUpdate {
        if self.sync.resyncs() != self.seen_resyncs {
            // Bytes were lost between this frame and the previous one, so
            // an edge delta or a level pair spanning the gap would be
            // fiction.
            self.seen_resyncs = self.sync.resyncs();
            self.trigger.forget_level();
            self.frequency.clear();
        }
        let trigger_index = self.trigger.scan(&frame);
        if let Some(index) = trigger_index {
            self.window.re_anchor();
            self.window.push_tail(&frame, index);
        } else if !self.trigger.is_armed() {
            self.window.push_frame(&frame);
        }
        self.frequency.ingest(&frame);
        FrameUpdate {
            trigger_index,
            frequency_hz: self.frequency.frequency_hz(),
            frame,
        }
    }

    pub fn arm_trigger(&mut self) {
        self.trigger.arm();
    }

    pub fn disarm_trigger(&mut self) {
        self.trigger.disarm();
    }

    pub fn trigger_armed(&self) -> bool {
        self.trigger.is_armed()
    }

    /// Point both the trigger and the frequency meter at `channel`.
    pub fn select_channel(&mut self, channel: usize) {
        self.trigger.set_channel(channel);
        self.frequency.set_channel(channel);
    }

    pub fn set_trigger_edge(&mut self, edge: TriggerEdge) {
        self.trigger.set_edge(edge);
    }

    pub fn set_window_samples(&mut self, window_samples: usize) {
        self.window.resize(window_samples);
    }

    pub fn window(&self) -> &WaveformWindow {
        &self.window
    }

    pub fn frames_emitted(&self) -> u64 {
        self.sync.frames_emitted()
    }

    pub fn resyncs(&self) -> u64 {
        self.sync.resyncs()
    }
}

/// A connected probe that is not consuming the stream.
pub struct IdleProbe {
    port: Box<dyn SerialPort>,
    config: CaptureConfig,
}

impl IdleProbe {
    /// Open the link to a probe. With `port` of `None` the first enumerated
    /// probe-looking device is used.
    pub fn connect(port: Option<&str>, config: CaptureConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let port = ProbeConnector::open(port, config.baud_rate)?;
        Ok(Self { port, config })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Start consuming the stream.
    ///
    /// Builds a fresh pipeline every time: the trigger is armed, the edge
    /// history is empty and the synchronizer searches for the next marker.
    /// Nothing carries over from an earlier run except the configuration.
    pub fn run(self) -> Result<StreamingProbe, SessionError> {
        // Whatever accumulated in the OS buffer predates this run.
        self.port.clear(serialport::ClearBuffer::All)?;
        let pipeline = FramePipeline::new(&self.config)?;
        log::debug!(
            "capture running: {} samples per frame at {} Hz",
            self.config.sample_count,
            self.config.sampling_rate_hz
        );
        Ok(StreamingProbe {
            port: self.port,
            config: self.config,
            pipeline,
        })
    }
}

/// A probe session that is actively consuming frames.
pub struct StreamingProbe {
    port: Box<dyn SerialPort>,
    config: CaptureConfig,
    pipeline: FramePipeline,
}

impl StreamingProbe {
    /// Block until the next complete frame and report what it produced.
    ///
    /// Any read failure, including a timeout, is terminal for the session;
    /// reconnecting starts from scratch.
    pub fn next_update(&mut self) -> Result<FrameUpdate, SessionError> {
        self.pipeline.read_update(&mut self.port).map_err(|error| {
            log::debug!("serial read failed: {}", error);
            SessionError::LinkLost(error)
        })
    }

    /// Stop consuming. Always lands between frames, since the stream is only
    /// advanced inside [`next_update`](Self::next_update). The pipeline dies
    /// here; the next [`run`](IdleProbe::run) builds a fresh one, searching,
    /// armed and with empty history.
    pub fn stop(self) -> IdleProbe {
        log::debug!(
            "capture stopped after {} frames ({} resyncs)",
            self.pipeline.frames_emitted(),
            self.pipeline.resyncs()
        );
        IdleProbe {
            port: self.port,
            config: self.config,
        }
    }

    /// Re-arm the trigger for the next sweep.
    pub fn arm_trigger(&mut self) {
        self.pipeline.arm_trigger();
    }

    /// Free-running mode: frames accumulate without waiting for an edge.
    pub fn disarm_trigger(&mut self) {
        self.pipeline.disarm_trigger();
    }

    pub fn trigger_armed(&self) -> bool {
        self.pipeline.trigger_armed()
    }

    /// Select the channel both the trigger and the frequency measurement
    /// follow, and remember it for later runs.
    pub fn select_channel(&mut self, channel: usize) {
        self.pipeline.select_channel(channel);
        self.config.trigger_channel = channel;
        self.config.frequency_channel = channel;
    }

    pub fn set_trigger_edge(&mut self, edge: TriggerEdge) {
        self.pipeline.set_trigger_edge(edge);
        self.config.trigger_edge = edge;
    }

    pub fn set_window_samples(&mut self, window_samples: usize) {
        self.pipeline.set_window_samples(window_samples);
        self.config.window_samples = window_samples;
    }

    pub fn window(&self) -> &WaveformWindow {
        self.pipeline.window()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.pipeline.frames_emitted()
    }

    pub fn resyncs(&self) -> u64 {
        self.pipeline.resyncs()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}
