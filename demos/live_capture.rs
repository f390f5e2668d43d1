// Live capture example
//
// This example continuously consumes frames from a probe, printing the
// measured frequency and trigger anchors as they happen.

use clap::Parser;
use quadprobe_rs::{CaptureConfig, IdleProbe, SessionError, TriggerEdge};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "live_capture")]
#[command(version = "1.0")]
#[command(about = "Continuous waveform capture from a logic probe")]
#[command(
    long_about = "Consume the probe's frame stream, trigger on the selected edge and report the measured frequency. Reconnects from scratch when the link drops."
)]
struct Args {
    /// Serial port of the probe; the first discovered device when omitted
    #[arg(short, long)]
    port: Option<String>,

    /// Channel to trigger and measure on
    #[arg(short, long, default_value_t = 0)]
    channel: usize,

    /// Trigger edge direction
    #[arg(short, long, default_value = "rising", value_parser = ["rising", "falling"])]
    edge: String,

    /// Display window size in samples
    #[arg(short, long, default_value_t = 10_000)]
    window: usize,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let config = CaptureConfig {
        trigger_channel: args.channel,
        frequency_channel: args.channel,
        trigger_edge: match args.edge.as_str() {
            "falling" => TriggerEdge::Falling,
            _ => TriggerEdge::Rising,
        },
        window_samples: args.window,
        ..CaptureConfig::default()
    };
    config.validate()?;

    println!("QuadProbe Live Capture");
    println!("======================");
    println!("Channel: {}", args.channel);
    println!("Edge: {}", config.trigger_edge.as_str());
    println!("Window: {} samples", args.window);
    println!("Press Ctrl+C to stop\n");

    loop {
        let probe = match IdleProbe::connect(args.port.as_deref(), config) {
            Ok(probe) => probe,
            Err(e) => {
                eprintln!("Connection failed: {}", e);
                eprintln!("Retrying in 2s...");
                std::thread::sleep(Duration::from_secs(2));
                continue;
            }
        };
        println!("✓ Connected, capture running");

        let mut streaming = probe.run()?;
        loop {
            match streaming.next_update() {
                Ok(update) => {
                    if let Some(index) = update.trigger_index {
                        println!(
                            "\nTriggered at sample {} (frame offset {})",
                            index,
                            update.frame.start_offset()
                        );
                    }
                    let frequency = update
                        .frequency_hz
                        .map_or_else(|| "--".to_string(), |hz| format!("{:.2} Hz", hz));
                    print!(
                        "\r{} frames | {} resyncs | window {} samples | freq {}   ",
                        streaming.frames_emitted(),
                        streaming.resyncs(),
                        streaming.window().len(),
                        frequency
                    );
                    use std::io::Write;
                    std::io::stdout().flush()?;
                }
                Err(SessionError::LinkLost(e)) => {
                    eprintln!("\nSerial link lost: {}", e);
                    eprintln!("Reconnecting...");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        // The session is gone; trigger state and edge history die with it.
        std::thread::sleep(Duration::from_millis(500));
    }
}
