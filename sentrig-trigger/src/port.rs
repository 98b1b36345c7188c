use crate::error::{Result, TriggerError};
use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;

/// Connection parameters for the trigger line.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound on how long the listener idles between polls.
    pub poll_timeout: Duration,
}

/// Byte source polled by the listener. Dropping the value closes the device.
pub trait TriggerPort: Send + 'static {
    fn bytes_available(&mut self) -> io::Result<u32>;
    fn read_byte(&mut self) -> io::Result<u8>;
}

impl TriggerPort for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> io::Result<u32> {
        self.bytes_to_read().map_err(io::Error::from)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}

/// Names of every serial device the OS currently reports.
pub fn available_port_names() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(TriggerError::Enumerate)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

pub fn ensure_port_available(port: &str, available: &[String]) -> Result<()> {
    if available.iter().any(|p| p == port) {
        Ok(())
    } else {
        Err(TriggerError::PortNotFound {
            port: port.to_string(),
            available: available.to_vec(),
        })
    }
}

/// Checks that the configured port is enumerable, then opens it 8N1 without
/// flow control.
pub fn open_serial(settings: &SerialSettings) -> Result<Box<dyn SerialPort>> {
    let available = available_port_names()?;
    ensure_port_available(&settings.port, &available)?;

    log::info!(
        "Opening serial port: {} at {} baud",
        settings.port,
        settings.baud_rate
    );

    serialport::new(&settings.port, settings.baud_rate)
        .timeout(settings.poll_timeout)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .open()
        .map_err(|source| TriggerError::Open {
            port: settings.port.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_port_must_be_listed() {
        let available = vec!["/dev/ttyUSB0".to_string(), "COM8".to_string()];
        assert!(ensure_port_available("COM8", &available).is_ok());

        let err = ensure_port_available("COM3", &available).unwrap_err();
        match &err {
            TriggerError::PortNotFound { port, available } => {
                assert_eq!(port, "COM3");
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "serial port COM3 not found (available: /dev/ttyUSB0, COM8)"
        );
    }

    #[test]
    fn missing_port_message_with_no_devices() {
        let err = ensure_port_available("COM8", &[]).unwrap_err();
        assert_eq!(err.to_string(), "serial port COM8 not found (available: none)");
    }
}
