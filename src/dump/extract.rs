//! Pure per-line extractors. Input lines are assumed to be pre-classified;
//! fields are lifted out of whitespace tokens by position, with `,`/`:`
//! punctuation trimmed. A missing structural token is an error the walker
//! turns into a parse failure with the row number attached; trailing
//! descriptive tokens get documented defaults instead.

use crate::dump::{Reachability, RealServer, Service, VirtServer};
use anyhow::Context;
use std::collections::BTreeMap;

const PUNCT: [char; 2] = [':', ','];

/// Default display name for a VIP whose source line carries no name token.
pub const UNNAMED_VIP: &str = "none";

pub fn virt(line: &str) -> anyhow::Result<(String, VirtServer)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let id = required(&tokens, 0, "virtual server id")?;
    let addr = required(&tokens, 2, "virtual server address")?;
    let name = optional(&tokens, 5).unwrap_or_else(|| UNNAMED_VIP.to_string());
    let virt = VirtServer {
        id,
        name,
        state: Reachability::Unknown,
        services: BTreeMap::new(),
    };
    Ok((addr, virt))
}

pub fn service(line: &str) -> anyhow::Result<(String, Service)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let port = required(&tokens, 0, "service port")?;
    let real_port = required(&tokens, 2, "real port mapping")?;
    let group = optional(&tokens, 4).unwrap_or_default();
    let desc = optional(&tokens, 5).unwrap_or_default();
    let service = Service {
        port: port.clone(),
        real_port,
        group,
        desc,
        state: Reachability::Unknown,
        real_servers: BTreeMap::new(),
    };
    Ok((port, service))
}

pub fn real_server(line: &str) -> anyhow::Result<(String, RealServer)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let id = required(&tokens, 0, "real server id")?;
    let addr = required(&tokens, 1, "real server address")?;
    let name = required(&tokens, 2, "real server name")?;
    // the state is whatever trails the line, not a fixed column
    let state = tokens.last().copied().unwrap_or_default().to_string();
    let real = RealServer {
        id,
        addr,
        name: name.clone(),
        state,
    };
    Ok((name, real))
}

fn required(tokens: &[&str], idx: usize, field: &str) -> anyhow::Result<String> {
    optional(tokens, idx).with_context(|| format!("missing {} (token {})", field, idx))
}

fn optional(tokens: &[&str], idx: usize) -> Option<String> {
    tokens.get(idx).map(|t| t.trim_matches(PUNCT).to_string())
}
