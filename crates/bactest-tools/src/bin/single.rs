//! Single-device BACnet conformance client.
//!
//! Checks one richly-typed simulated device (one object of each kind)
//! against the flat expected-state table.

use bactest_harness::{
    run_single, CheckReporter, SessionConfig, SimFleet, SingleOptions, BACNET_PORT, SINGLE_DEVICE,
};
use bactest_tools::{exit_code, parse_client_cidr, print_rule, print_summary};
use clap::Parser;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "bactest-single",
    about = "BACnet protocol conformance client, single-device edition"
)]
struct Args {
    /// Simulator device IP.
    #[arg(long, default_value = "172.20.0.10")]
    device_ip: Ipv4Addr,
    /// Local client address in CIDR form.
    #[arg(long, default_value = "172.20.0.100/24", value_parser = parse_client_cidr)]
    client_ip: (Ipv4Addr, u8),
    /// Upper bound of the injected per-request lag, in milliseconds.
    #[arg(long, default_value_t = 10)]
    lag_max_ms: u64,
    /// Shrink all settle intervals for local smoke runs.
    #[arg(long)]
    quick: bool,
    /// Emit the full run report as JSON after the summary.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let (client_ip, prefix_len) = args.client_ip;

    print_rule();
    println!("BACnet Protocol Conformance Client -- Single Device");
    println!("  Device : {}:{}", args.device_ip, BACNET_PORT);
    println!("  Client : {client_ip}/{prefix_len}");
    print_rule();

    println!("\n--- Initializing client session on {client_ip}/{prefix_len} ---");
    let session = SimFleet::open(SessionConfig::new(client_ip, prefix_len))
        .with_devices(args.device_ip, &[SINGLE_DEVICE])
        .with_lag(Duration::ZERO, Duration::from_millis(args.lag_max_ms));

    let mut options = SingleOptions::new(args.device_ip);
    if args.quick {
        options = options.quick();
    }

    let mut reporter = CheckReporter::new();
    run_single(&session, &options, &mut reporter).await;
    drop(session);

    let summary = reporter.summary();
    print_summary(&summary);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reporter.into_report())?);
    }
    match exit_code(&summary) {
        0 => {
            println!("\nAll BACnet protocol checks passed!");
            Ok(())
        }
        code => std::process::exit(code),
    }
}
