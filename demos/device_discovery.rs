// Basic device discovery and connection example
//
// This example shows how to discover probes and establish a connection.

use quadprobe_rs::{CaptureConfig, IdleProbe, ProbeConnector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    env_logger::init();

    println!("QuadProbe Device Discovery Example");
    println!("==================================\n");

    // Method 1: List all probe-looking serial devices
    println!("1. Discovering available probes...");
    let devices = ProbeConnector::available_devices()?;

    if devices.is_empty() {
        println!("No probe found. Please connect a device and try again.");
        return Ok(());
    }

    println!("Found {} device(s):", devices.len());
    for (i, device) in devices.iter().enumerate() {
        println!("  {}. {} at {}", i + 1, device.name, device.port);
    }
    println!();

    // Method 2: Connect to the first available device
    println!("2. Connecting to first available device...");
    let config = CaptureConfig::default();
    let probe = IdleProbe::connect(None, config)?;
    println!("Successfully connected!");

    // Method 3: Check the link budget for the configured rates
    println!("\n3. Timing budget:");
    println!(
        "   Frame transmit time: {:.2}ms",
        probe.config().frame_transmit_time().as_secs_f64() * 1e3
    );
    println!(
        "   Frame sample time:   {:.2}ms",
        probe.config().frame_sample_time().as_secs_f64() * 1e3
    );
    println!("   (transmit must stay below sample time for lossless capture)");

    println!("\n4. Connection test completed successfully!");

    Ok(())
}
