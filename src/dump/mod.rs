mod classify;
mod extract;

pub use classify::{classify, LineKind};

use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Observed reachability of a service (and, by aggregation, of a VIP).
/// `Unknown` is the pre-probe state and the final state of probes cut off by
/// the deadline or skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Unknown,
    Up,
    NoServicesUp,
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the device's own vocabulary
        f.write_str(match self {
            Reachability::Unknown => "UNKNOWN",
            Reachability::Up => "UP",
            Reachability::NoServicesUp => "NO SERVICES UP",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtServer {
    pub id: String,
    pub name: String,
    pub state: Reachability,
    /// Keyed by service port string.
    pub services: BTreeMap<String, Service>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub port: String,
    pub real_port: String,
    pub group: String,
    pub desc: String,
    pub state: Reachability,
    /// Keyed by real-server name.
    pub real_servers: BTreeMap<String, RealServer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealServer {
    pub id: String,
    pub addr: String,
    pub name: String,
    /// Verbatim trailing token from the source line.
    pub state: String,
}

/// The parsed "Virtual server state" section of an Alteon info dump, keyed by
/// VIP address. `BTreeMap` keeps iteration (and so the report) deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dump {
    pub virts: BTreeMap<String, VirtServer>,
}

enum Window {
    Outside,
    Capturing,
}

impl Dump {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Unable to read dump file {:?}", path))?;
        Self::parse(&text)
    }

    /// Walks the dump line by line. The capture window opens on the section
    /// header and closes for good on the footer: a second header later in the
    /// file does not reopen it. Lines outside the window never produce
    /// records, whatever their shape.
    ///
    /// Parsing is pure, every service's reachability is left `Unknown` here;
    /// see the prober for the enrichment pass.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut virts: BTreeMap<String, VirtServer> = BTreeMap::new();
        let mut window = Window::Outside;
        // cursors: only VipStart/ServiceStart lines move these, and they
        // always point at a record inserted in this walk
        let mut vip_cursor: Option<String> = None;
        let mut service_cursor: Option<String> = None;
        let mut row = 0;

        for line in text.lines() {
            row += 1;
            let kind = classify(line);
            if let Window::Outside = window {
                if kind == LineKind::SectionStart {
                    window = Window::Capturing;
                }
                continue;
            }
            match kind {
                LineKind::VipStart => {
                    let (addr, virt) = extract::virt(line)
                        .with_context(|| format!("bad virtual server line {}", row))?;
                    // duplicate address: last write wins, dropping the
                    // earlier record's services wholesale
                    virts.insert(addr.clone(), virt);
                    vip_cursor = Some(addr);
                    service_cursor = None;
                }
                LineKind::ServiceStart => {
                    let addr = vip_cursor.as_ref().with_context(|| {
                        format!("service line {} before any virtual server", row)
                    })?;
                    let (port, service) = extract::service(line)
                        .with_context(|| format!("bad service line {}", row))?;
                    let virt = virts
                        .get_mut(addr)
                        .with_context(|| format!("stale virtual server cursor at line {}", row))?;
                    virt.services.insert(port.clone(), service);
                    service_cursor = Some(port);
                }
                LineKind::RealServerStart => {
                    let addr = vip_cursor.as_ref().with_context(|| {
                        format!("real server line {} before any virtual server", row)
                    })?;
                    let port = service_cursor.as_ref().with_context(|| {
                        format!("real server line {} before any service", row)
                    })?;
                    let (name, real) = extract::real_server(line)
                        .with_context(|| format!("bad real server line {}", row))?;
                    let service = virts
                        .get_mut(addr)
                        .and_then(|v| v.services.get_mut(port))
                        .with_context(|| format!("stale service cursor at line {}", row))?;
                    service.real_servers.insert(name, real);
                }
                LineKind::SectionEnd => break,
                LineKind::SectionStart | LineKind::Other => {}
            }
        }
        Ok(Dump { virts })
    }

    /// Total number of services across all VIPs.
    pub fn service_count(&self) -> usize {
        self.virts.values().map(|v| v.services.len()).sum()
    }
}
