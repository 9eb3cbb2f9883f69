use crate::dump::{Dump, Reachability, VirtServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Service names the dump may use in place of a numeric port. Anything else
/// non-numeric is an error, the probe never guesses a port.
const WELL_KNOWN_PORTS: &[(&str, u16)] = &[
    ("http", 80),
    ("https", 443),
    ("ssh", 22),
    ("smtp", 25),
    ("ftp", 21),
];

pub fn resolve_port(spec: &str) -> anyhow::Result<u16> {
    if let Ok(port) = spec.parse::<u16>() {
        return Ok(port);
    }
    WELL_KNOWN_PORTS
        .iter()
        .find(|(name, _)| *name == spec)
        .map(|(_, port)| *port)
        .with_context(|| format!("unknown service name '{}'", spec))
}

/// Connect-only liveness check. A completed connect is `Up`; refusal,
/// unreachability or the timeout all collapse to `NoServicesUp` and never
/// surface as errors.
pub async fn probe(addr: &str, port: u16, timeout: Duration) -> Reachability {
    match tokio::time::timeout(timeout, TcpStream::connect((addr, port))).await {
        Ok(Ok(_)) => Reachability::Up,
        _ => Reachability::NoServicesUp,
    }
}

pub struct Prober {
    /// Per-connect timeout.
    pub timeout: Duration,
    /// Cap on in-flight probes.
    pub concurrency: usize,
    /// Cuts off outstanding probes; their services stay `Unknown`.
    pub cutoff: CancellationToken,
    /// Overall deadline for the whole pass, wired onto `cutoff`.
    pub deadline: Option<Duration>,
}

impl Prober {
    pub fn new(timeout: Duration, concurrency: usize) -> Self {
        Self {
            timeout,
            concurrency,
            cutoff: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Probes every (VIP address, service port) pair in the dump and merges
    /// the outcome into its service record, then derives each VIP's state
    /// from its services. Probes are independent, so they run concurrently
    /// under the semaphore; every spawned probe is joined before this
    /// returns, the cutoff only decides whether it got to open a socket.
    pub async fn enrich(&self, dump: &mut Dump) -> anyhow::Result<()> {
        // resolve all port specs up front so a bad service name fails the
        // run before any socket work
        let mut targets = Vec::new();
        for (addr, virt) in &dump.virts {
            for spec in virt.services.keys() {
                let port = resolve_port(spec)
                    .with_context(|| format!("virtual server {}", addr))?;
                targets.push((addr.clone(), spec.clone(), port));
            }
        }
        tracing::info!("probing {} services", targets.len());

        if let Some(deadline) = self.deadline {
            let cutoff = self.cutoff.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                cutoff.cancel();
            });
        }

        let limit = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();
        for (addr, spec, port) in targets {
            let limit = limit.clone();
            let cutoff = self.cutoff.clone();
            let timeout = self.timeout;
            join_set.spawn(async move {
                let state = if cutoff.is_cancelled() {
                    Reachability::Unknown
                } else {
                    tokio::select! {
                        _ = cutoff.cancelled() => Reachability::Unknown,
                        permit = limit.acquire_owned() => match permit {
                            Ok(_permit) => tokio::select! {
                                _ = cutoff.cancelled() => Reachability::Unknown,
                                state = probe(&addr, port, timeout) => state,
                            },
                            Err(_) => Reachability::Unknown,
                        },
                    }
                };
                tracing::debug!("{}:{} -> {}", addr, spec, state);
                (addr, spec, state)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let (addr, spec, state) =
                joined.map_err(|e| anyhow::format_err!("Internal error in spawn: {e}"))?;
            if let Some(service) = dump
                .virts
                .get_mut(&addr)
                .and_then(|v| v.services.get_mut(&spec))
            {
                service.state = state;
            }
        }

        for virt in dump.virts.values_mut() {
            virt.state = aggregate(virt);
        }
        Ok(())
    }
}

/// A VIP is up if anything behind it answered; it is down only when at least
/// one service was probed and none answered. A VIP whose probes were all
/// skipped or cut off stays unknown.
fn aggregate(virt: &VirtServer) -> Reachability {
    let mut probed = false;
    for service in virt.services.values() {
        match service.state {
            Reachability::Up => return Reachability::Up,
            Reachability::NoServicesUp => probed = true,
            Reachability::Unknown => {}
        }
    }
    if probed {
        Reachability::NoServicesUp
    } else {
        Reachability::Unknown
    }
}
