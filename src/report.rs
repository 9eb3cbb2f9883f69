//! CSV rendering of a finished dump: one row per (VIP, service, real server)
//! rather than the appliance-style wide row, so a service's pool size never
//! truncates the output.

use crate::dump::Dump;
use anyhow::Context;
use chrono::Local;
use std::fs;
use std::path::Path;

const HEADER: &[&str] = &[
    "LB VIP ID",
    "LB VIP Name",
    "LB VIP IP Addr",
    "VIP State",
    "Service Port",
    "RealPort Mapping",
    "Service Group",
    "Service Desc",
    "Service State",
    "Real Server Name",
    "Real Server IP Addr",
    "Real Server State",
];

/// Output filename carrying the scan time, `<stem>_dd-mm-yy_HHMMSS.csv`.
pub fn timestamped_name(stem: &str) -> String {
    format!("{}_{}.csv", stem, Local::now().format("%d-%m-%y_%H%M%S"))
}

pub fn write(dump: &Dump, path: &Path) -> anyhow::Result<()> {
    fs::write(path, render(dump))
        .with_context(|| format!("Unable to write report file {:?}", path))
}

pub fn render(dump: &Dump) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().copied());
    for (addr, virt) in &dump.virts {
        for service in virt.services.values() {
            let vip_state = virt.state.to_string();
            let svc_state = service.state.to_string();
            let head = [
                virt.id.as_str(),
                virt.name.as_str(),
                addr.as_str(),
                vip_state.as_str(),
                service.port.as_str(),
                service.real_port.as_str(),
                service.group.as_str(),
                service.desc.as_str(),
                svc_state.as_str(),
            ];
            if service.real_servers.is_empty() {
                // a service with an empty pool still gets its row
                push_row(&mut out, head.into_iter().chain(["", "", ""]));
            } else {
                for real in service.real_servers.values() {
                    push_row(
                        &mut out,
                        head.into_iter().chain([
                            real.name.as_str(),
                            real.addr.as_str(),
                            real.state.as_str(),
                        ]),
                    );
                }
            }
        }
    }
    out
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(field);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Virtual server state:
1: IP4 10.0.0.1, 00:00:5e:00:01:01, ena, vip-a
    80: rport 8080, group 1, tcp, web-farm
        1: 10.0.1.1, real-a, UP
        2: 10.0.1.2, real-b, DOWN
    443: rport 8443, group 2, tcp, web-farm-tls
IDS group state:
";

    #[test]
    fn one_row_per_real_server() {
        let dump = Dump::parse(SAMPLE).unwrap();
        let csv = render(&dump);
        let lines: Vec<&str> = csv.lines().collect();
        // header + two pool members + one empty-pool service; services
        // iterate in key order, so "443" sorts before "80"
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("LB VIP ID,LB VIP Name,"));
        assert_eq!(
            lines[2],
            "1,vip-a,10.0.0.1,UNKNOWN,80,8080,1,tcp,UNKNOWN,real-a,10.0.1.1,UP"
        );
        assert_eq!(
            lines[3],
            "1,vip-a,10.0.0.1,UNKNOWN,80,8080,1,tcp,UNKNOWN,real-b,10.0.1.2,DOWN"
        );
    }

    #[test]
    fn empty_pool_service_keeps_its_row() {
        let dump = Dump::parse(SAMPLE).unwrap();
        let csv = render(&dump);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "1,vip-a,10.0.0.1,UNKNOWN,443,8443,2,tcp,UNKNOWN,,,");
    }

    #[test]
    fn timestamped_name_shape() {
        let name = timestamped_name("lb01");
        assert!(name.starts_with("lb01_"));
        assert!(name.ends_with(".csv"));
    }
}
