use std::time::Duration;

use serialport::{SerialPort, SerialPortType};

/// USB vendor/product pairs of the bridge chips the probe firmware ships
/// behind.
const VALID_USB_IDS: [(u16, u16); 4] = [
    (0x0403, 0x6001), // FT232R
    (0x10C4, 0xEA60), // CP210x
    (0x1A86, 0x7523), // CH340
    (0x2E8A, 0x000A), // RP2040 CDC
];

/// Read timeout on the opened port. Frames arrive every few milliseconds
/// while streaming, so a full second of silence means the link is gone.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ProbeDevice {
    pub name: String,
    pub port: String,
}

impl ProbeDevice {
    pub fn new(name: String, port: String) -> Self {
        Self { name, port }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("no logic probe found; connect a device or specify the port manually")]
    DeviceNotFound,
}

pub struct ProbeConnector;

impl ProbeConnector {
    /// Open the serial link to a probe.
    ///
    /// With an explicit `port` that port is opened directly; otherwise the
    /// first enumerated probe-looking device is used.
    pub fn open(port: Option<&str>, baud_rate: u32) -> Result<Box<dyn SerialPort>, ConnectorError> {
        let port = match port {
            Some(port) => port.to_string(),
            None => {
                let device = Self::available_devices()?
                    .into_iter()
                    .next()
                    .ok_or(ConnectorError::DeviceNotFound)?;
                log::debug!("auto-selected probe {} at {}", device.name, device.port);
                device.port
            }
        };
        log::debug!("opening {} at {} baud", port, baud_rate);
        let port = serialport::new(&port, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(port)
    }

    /// Enumerate serial ports that look like a probe.
    pub fn available_devices() -> Result<Vec<ProbeDevice>, ConnectorError> {
        let mut devices = Vec::new();
        for info in serialport::available_ports()? {
            if let SerialPortType::UsbPort(usb) = &info.port_type {
                if !VALID_USB_IDS.contains(&(usb.vid, usb.pid)) {
                    continue;
                }
                let name = usb
                    .product
                    .clone()
                    .unwrap_or_else(|| format!("{:04x}:{:04x}", usb.vid, usb.pid));
                devices.push(ProbeDevice::new(name, info.port_name));
            }
        }
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_devices_have_names_and_ports() {
        // Depends on what is actually plugged in; just check the shape of
        // whatever enumeration returns.
        if let Ok(devices) = ProbeConnector::available_devices() {
            for device in devices {
                assert!(!device.name.is_empty());
                assert!(!device.port.is_empty());
            }
        }
    }
}
