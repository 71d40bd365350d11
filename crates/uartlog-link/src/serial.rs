//! Serial port transport
//!
//! The receive loop only reads and the input forwarder only writes, so the
//! port is split into two handles with `try_clone`. serialport supports
//! concurrent reads and writes on cloned handles from different threads,
//! which is what lets the two flows run without a lock.

use std::time::Duration;

use serialport::SerialPort;
use uartlog_core::prelude::*;

/// How long a single read may wait for data. Timeouts are retried by the
/// framer, so this only bounds how often an idle link wakes up.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// An open serial link (8N1)
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    /// Open `port_name` at `baud_rate`
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        info!("Opening serial port {} @ {} baud", port_name, baud_rate);

        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| Error::serial_open(port_name, e.to_string()))?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into a read handle and a write handle
    pub fn split(self) -> Result<(Box<dyn SerialPort>, Box<dyn SerialPort>)> {
        let writer = self
            .port
            .try_clone()
            .map_err(|e| Error::serial(format!("cannot clone {} for writing: {}", self.name, e)))?;
        debug!("Split {} into reader and writer handles", self.name);
        Ok((self.port, writer))
    }
}

/// Names of the serial ports present on this machine, for error hints
pub fn available_port_names() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Failed to list serial ports: {}", e);
            Vec::new()
        }
    }
}
