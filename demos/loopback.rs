// In-process loopback of the whole pipeline, no hardware required
//
// The acquisition engine ticks over a synthetic square wave, its transport
// feeds the byte stream straight into the host pipeline, and the demo shows
// triggering, frequency measurement and the overrun counter at work.

use quadprobe_rs::{
    AcquisitionEngine, CaptureConfig, FramePipeline, FrameTransport, TransmitGate,
};
use std::sync::Arc;

/// Transport that appends every frame to an in-memory stream.
struct LoopbackTransport {
    gate: Arc<TransmitGate>,
    stream: Vec<u8>,
    complete_immediately: bool,
}

impl FrameTransport for LoopbackTransport {
    fn start_transfer(&mut self, marker: u8, samples: &[u8]) {
        self.stream.push(marker);
        self.stream.extend_from_slice(samples);
        if self.complete_immediately {
            self.gate.complete();
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("QuadProbe Loopback Example");
    println!("==========================\n");

    let config = CaptureConfig {
        sample_count: 100,
        sampling_rate_hz: 10_000,
        window_samples: 500,
        ..CaptureConfig::default()
    };

    // 1. A healthy link: the transport drains instantly.
    println!("1. Capturing a 500 Hz square wave over a healthy link...");
    let gate = Arc::new(TransmitGate::new());
    let transport = LoopbackTransport {
        gate: Arc::clone(&gate),
        stream: Vec::new(),
        complete_immediately: true,
    };
    let mut engine = AcquisitionEngine::new(&config, transport, gate)?;

    // 10000 Hz sampling, 20-tick period: a 500 Hz square wave on channel 0,
    // half that on channel 1.
    for tick in 0..2001u64 {
        engine.tick([tick % 20 < 10, tick % 40 < 20, false, false]);
    }
    println!("   Dropped ticks: {}", engine.dropped_ticks());

    let mut pipeline = FramePipeline::new(&config)?;
    let updates = pipeline.push_bytes(&engine.transport().stream);
    println!("   Frames assembled: {}", updates.len());
    for update in &updates {
        if let Some(index) = update.trigger_index {
            println!(
                "   Triggered at sample {} of frame {}",
                index,
                update.frame.start_offset() / config.sample_count as u64
            );
        }
    }
    if let Some(hz) = updates.last().and_then(|u| u.frequency_hz) {
        println!("   Measured frequency: {:.1} Hz", hz);
    }
    println!("   Window holds {} samples", pipeline.window().len());

    // 2. A stalled link: completion never arrives, so full-buffer ticks are
    // dropped instead of blocking the sampler.
    println!("\n2. Same signal with the transport stalled...");
    let gate = Arc::new(TransmitGate::new());
    let transport = LoopbackTransport {
        gate: Arc::clone(&gate),
        stream: Vec::new(),
        complete_immediately: false,
    };
    let mut engine = AcquisitionEngine::new(&config, transport, gate)?;
    for tick in 0..2001u64 {
        engine.tick([tick % 20 < 10, false, false, false]);
    }
    println!(
        "   Dropped ticks: {} (one frame in flight, one buffer filled, the rest dropped)",
        engine.dropped_ticks()
    );

    println!("\nLoopback example completed!");
    Ok(())
}
