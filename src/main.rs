mod dump;
mod logs;
mod probe;
mod report;

use crate::dump::Dump;
use crate::logs::registry_logs;
use crate::probe::Prober;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::Level;

/// Scan an Alteon SLB info dump: rebuild the virtual server tree, check
/// which services answer on the wire, and write the result as CSV.
#[derive(Parser, Debug)]
#[command(name = "slbscan", version)]
struct Args {
    /// Path to the Alteon info dump file
    dump: PathBuf,
    /// Output CSV path; defaults to `<dump stem>_<dd-mm-yy_HHMMSS>.csv`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Per-service connect timeout in milliseconds
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,
    /// Maximum number of in-flight probes
    #[arg(long, default_value_t = 64)]
    concurrency: usize,
    /// Overall probing deadline in seconds; services still pending when it
    /// expires are reported UNKNOWN
    #[arg(long)]
    deadline_secs: Option<u64>,
    /// Parse only; leave every reachability state UNKNOWN
    #[arg(long)]
    skip_probe: bool,
    /// Log each probe result as it lands
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    registry_logs(if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    });

    let mut dump = Dump::load(&args.dump).with_context(|| "Failed to parse dump file")?;
    tracing::info!(
        "parsed {} virtual servers, {} services",
        dump.virts.len(),
        dump.service_count()
    );

    if !args.skip_probe {
        let mut prober = Prober::new(
            Duration::from_millis(args.timeout_ms),
            args.concurrency.max(1),
        );
        prober.deadline = args.deadline_secs.map(Duration::from_secs);
        // ctrl+c cuts the pass short instead of abandoning it mid-merge
        {
            let cutoff = prober.cutoff.clone();
            tokio::spawn(async move {
                let _ = signal::ctrl_c().await;
                cutoff.cancel();
            });
        }
        prober.enrich(&mut dump).await?;
    }

    let out = args.output.unwrap_or_else(|| {
        let stem = args
            .dump
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("slbdump");
        PathBuf::from(report::timestamped_name(stem))
    });
    report::write(&dump, &out).with_context(|| "Failed to write report")?;
    tracing::info!("report written to {:?}", out);
    Ok(())
}
