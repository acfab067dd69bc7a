//! Multi-device BACnet conformance client.
//!
//! Runs the full fleet check sequence against the in-process simulated
//! fleet. A wire-level BACnet/IP stack plugs in at the `BacnetCapability`
//! seam without changing anything here but the session construction.

use bactest_harness::{
    run_fleet, CheckReporter, FleetOptions, SessionConfig, SimFleet, BACNET_PORT, DEVICE_TABLE,
};
use bactest_tools::{exit_code, parse_client_cidr, print_rule, print_summary};
use clap::Parser;
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "bactest-fleet",
    about = "BACnet protocol conformance client, multi-device fleet edition"
)]
struct Args {
    /// First simulator device IP; the fleet occupies consecutive addresses.
    #[arg(long, default_value = "172.20.0.10")]
    device_ip: Ipv4Addr,
    /// How many devices of the static table to exercise.
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=9))]
    device_count: u8,
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
    let count = usize::from(args.device_count);

    print_rule();
    println!("BACnet Protocol Conformance Client -- Fleet Edition");
    println!("  First device : {}:{}", args.device_ip, BACNET_PORT);
    println!("  Device count : {count}");
    println!("  Client       : {client_ip}/{prefix_len}");
    print_rule();

    println!("\n--- Initializing client session on {client_ip}/{prefix_len} ---");
    let lag_range = (Duration::ZERO, Duration::from_millis(args.lag_max_ms));
    let session = SimFleet::open(SessionConfig::new(client_ip, prefix_len))
        .with_devices(args.device_ip, &DEVICE_TABLE[..count])
        .with_lag(lag_range.0, lag_range.1);

    let mut options = FleetOptions::new(args.device_ip, count);
    options.lag_range = Some(lag_range);
    if args.quick {
        options = options.quick();
    }

    let mut reporter = CheckReporter::new();
    run_fleet(&session, &options, &mut reporter).await;
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
