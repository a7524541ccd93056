//! Serial link handling
//!
//! The peripherals only need a line-oriented byte stream: `is_open`,
//! `send_line` and `flush_buffers`. [`SerialPortLink`] backs that with a real
//! UART and auto-discovers a port; [`LoopbackLink`] records lines in memory
//! for demo mode and tests.

use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::collections::BTreeSet;
#[cfg(target_os = "linux")]
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{LinkError, DEFAULT_BAUD_RATE};

/// Line-oriented transport used by every peripheral
pub trait SerialLink {
    /// Best-effort readiness poll
    fn is_open(&self) -> bool;

    /// Write one line (terminator appended). Returns false when the write
    /// did not happen.
    fn send_line(&mut self, line: &str) -> bool;

    /// Discard pending input and output
    fn flush_buffers(&mut self);

    /// Housekeeping once per frame (reconnect attempts)
    fn poll(&mut self) {}
}

/// Link shared between all controllers
pub type SharedLink = Arc<Mutex<dyn SerialLink + Send>>;

/// Run `f` with the link locked. A poisoned lock is recovered, the link has
/// no invariants a panicking writer could break.
pub fn with_link<R>(link: &SharedLink, f: impl FnOnce(&mut (dyn SerialLink + Send)) -> R) -> R {
    let mut guard = match link.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut *guard)
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Ports whose name contains this text are tried first (e.g. "ACM" or "COM3")
    pub preferred_port_contains: String,
    /// Line speed
    pub baud_rate: u32,
    /// Assert DTR after opening
    pub dtr_enable: bool,
    /// Assert RTS after opening
    pub rts_enable: bool,
    /// Reopen a lost port on the next send
    pub auto_reconnect: bool,
    /// Minimum wait between reopen attempts, ms
    pub reconnect_interval_ms: u64,
    /// Per-line write timeout, ms
    pub write_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            preferred_port_contains: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            dtr_enable: true,
            rts_enable: true,
            auto_reconnect: true,
            reconnect_interval_ms: 2000,
            write_timeout_ms: 500,
        }
    }
}

/// Try order: ttyACM* first, then ttyUSB* (both numerically), then the rest by name
fn port_rank(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let numbered = |prefix: &str| {
        basename
            .strip_prefix(prefix)
            .map(|rest| rest.parse::<usize>().unwrap_or(usize::MAX))
    };
    if let Some(num) = numbered("ttyACM") {
        return (0, num, basename.to_string());
    }
    if let Some(num) = numbered("ttyUSB") {
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// USB CDC adapters that the enumeration API misses
#[cfg(target_os = "linux")]
fn dev_tty_ports() -> Vec<String> {
    let Ok(entries) = fs::read_dir("/dev") else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.starts_with("ttyACM") || name.starts_with("ttyUSB"))
        .map(|name| format!("/dev/{}", name))
        .collect()
}

/// Names of every serial port the adapter could be on, without duplicates,
/// in the order they are tried
pub fn list_ports() -> Vec<String> {
    let mut names: BTreeSet<String> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| info.port_name)
        .collect();

    #[cfg(target_os = "linux")]
    names.extend(dev_tty_ports());

    let mut names: Vec<String> = names.into_iter().collect();
    names.sort_by_key(|name| port_rank(name));
    names
}

/// Order candidate ports: preferred matches (case-insensitive) first, then the rest
fn candidate_order(ports: &[String], preferred_contains: &str) -> Vec<String> {
    let needle = preferred_contains.trim().to_lowercase();
    if needle.is_empty() {
        return ports.to_vec();
    }
    let (mut preferred, rest): (Vec<String>, Vec<String>) = ports
        .iter()
        .cloned()
        .partition(|p| p.to_lowercase().contains(&needle));
    preferred.extend(rest);
    preferred
}

/// Serial link backed by a UART adapter, with port discovery and auto-reconnect
pub struct SerialPortLink {
    config: LinkConfig,
    port: Option<Box<dyn SerialPort>>,
    port_name: String,
    next_reconnect: Option<Instant>,
}

impl SerialPortLink {
    /// Closed link; the first send opens a port
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            port: None,
            port_name: String::new(),
            next_reconnect: None,
        }
    }

    /// Name of the open port, empty when closed
    pub fn current_port_name(&self) -> &str {
        &self.port_name
    }

    /// Open a specific port (8N1, no flow control)
    pub fn open_port(&mut self, name: &str) -> Result<(), LinkError> {
        self.close();

        let mut port = serialport::new(name, self.config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(self.config.write_timeout_ms))
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => LinkError::PortNotFound(name.to_string()),
                _ => LinkError::SerialError(e.to_string()),
            })?;

        if let Err(e) = port.write_data_terminal_ready(self.config.dtr_enable) {
            debug!("failed to set DTR on {}: {} (continuing)", name, e);
        }
        if let Err(e) = port.write_request_to_send(self.config.rts_enable) {
            debug!("failed to set RTS on {}: {} (continuing)", name, e);
        }
        port.clear(serialport::ClearBuffer::All)
            .map_err(|e| LinkError::SerialError(e.to_string()))?;

        info!("Serial opened {} @ {}", name, self.config.baud_rate);
        self.port = Some(port);
        self.port_name = name.to_string();
        Ok(())
    }

    /// Try every known port, preferred ones first. Returns the opened port name.
    pub fn try_open_any_port(&mut self) -> Result<String, LinkError> {
        let names = list_ports();
        if names.is_empty() {
            return Err(LinkError::NoPortAvailable);
        }

        for name in candidate_order(&names, &self.config.preferred_port_contains) {
            match self.open_port(&name) {
                Ok(()) => return Ok(name),
                Err(e) => warn!("Serial open failed on {}: {}", name, e),
            }
        }
        Err(LinkError::NoPortAvailable)
    }

    /// Drop the port; auto-reconnect may reopen it later
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Serial closed {}", self.port_name);
        }
        self.port_name.clear();
    }
}

impl SerialLink for SerialPortLink {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn send_line(&mut self, line: &str) -> bool {
        let Some(port) = self.port.as_mut() else {
            return false;
        };

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');

        match port.write_all(&bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!("Serial write error: {}", e);
                self.close();
                false
            }
        }
    }

    fn flush_buffers(&mut self) {
        if let Some(port) = self.port.as_mut() {
            if let Err(e) = port.clear(serialport::ClearBuffer::All) {
                debug!("Serial clear failed: {}", e);
            }
        }
    }

    /// Reconnect while closed, at most once per reconnect interval
    fn poll(&mut self) {
        if self.port.is_some() || !self.config.auto_reconnect {
            return;
        }
        let now = Instant::now();
        if self.next_reconnect.is_some_and(|at| now < at) {
            return;
        }
        self.next_reconnect = Some(now + Duration::from_millis(self.config.reconnect_interval_ms));
        if let Err(e) = self.try_open_any_port() {
            debug!("Serial reconnect attempt failed: {}", e);
        }
    }
}

/// In-memory link that records every line it is given
#[derive(Debug, Default)]
pub struct LoopbackLink {
    open: bool,
    lines: Vec<String>,
    flushes: usize,
}

impl LoopbackLink {
    /// A link that is ready to send
    pub fn open() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    /// A link that refuses to send until [`LoopbackLink::set_open`] is called
    pub fn closed() -> Self {
        Self::default()
    }

    /// Open or close the fake port
    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    /// Lines sent so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drain recorded lines
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    /// Number of `flush_buffers` calls so far
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl SerialLink for LoopbackLink {
    fn is_open(&self) -> bool {
        self.open
    }

    fn send_line(&mut self, line: &str) -> bool {
        if !self.open {
            return false;
        }
        self.lines.push(line.to_string());
        true
    }

    fn flush_buffers(&mut self) {
        if self.open {
            self.flushes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_rank_order() {
        let mut names = vec![
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
        ];
        names.sort_by_key(|n| port_rank(n));

        assert_eq!(
            names,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_listed_ports_are_unique_and_ranked() {
        let ports = list_ports();
        let unique: BTreeSet<&String> = ports.iter().collect();
        assert_eq!(unique.len(), ports.len());
        assert!(ports
            .windows(2)
            .all(|pair| port_rank(&pair[0]) <= port_rank(&pair[1])));
    }

    #[test]
    fn test_preferred_ports_first() {
        let ports = vec![
            "/dev/ttyACM0".to_string(),
            "/dev/ttyUSB0".to_string(),
            "/dev/ttyUSB1".to_string(),
        ];
        let ordered = candidate_order(&ports, "usb");
        assert_eq!(ordered, vec!["/dev/ttyUSB0", "/dev/ttyUSB1", "/dev/ttyACM0"]);
        assert_eq!(candidate_order(&ports, " "), ports);
    }

    #[test]
    fn test_loopback_records_only_when_open() {
        let mut link = LoopbackLink::closed();
        assert!(!link.send_line("TX STD DATA 7B8"));
        link.set_open(true);
        assert!(link.send_line("TX STD DATA 7B8"));
        link.flush_buffers();
        assert_eq!(link.lines(), &["TX STD DATA 7B8".to_string()]);
        assert_eq!(link.flush_count(), 1);
    }

    #[test]
    fn test_closed_serial_link_refuses_send() {
        let mut link = SerialPortLink::new(LinkConfig::default());
        assert!(!link.is_open());
        assert!(!link.send_line("TX STD DATA 7B8"));
        assert_eq!(link.current_port_name(), "");
    }
}
