//! Shared helpers for the bactest command-line clients.

use bactest_harness::RunSummary;
use std::net::Ipv4Addr;

/// Parses a client address in CIDR form, e.g. `172.20.0.100/24`.
///
/// Usable directly as a clap value parser.
pub fn parse_client_cidr(s: &str) -> Result<(Ipv4Addr, u8), String> {
    let (ip, prefix) = s
        .split_once('/')
        .ok_or_else(|| format!("'{s}' is not in address/prefix form"))?;
    let ip: Ipv4Addr = ip
        .parse()
        .map_err(|e| format!("bad address '{ip}': {e}"))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|e| format!("bad prefix '{prefix}': {e}"))?;
    if prefix > 32 {
        return Err(format!("prefix /{prefix} out of range"));
    }
    Ok((ip, prefix))
}

/// Prints the run banner line framing.
pub fn print_rule() {
    println!("{}", "=".repeat(60));
}

/// Process exit code for a finished run: 0 when no check failed, 1
/// otherwise. Skipped checks never affect the exit code.
pub fn exit_code(summary: &RunSummary) -> i32 {
    if summary.is_success() {
        0
    } else {
        1
    }
}

/// Prints the end-of-run tally in the conformance log format.
pub fn print_summary(summary: &RunSummary) {
    let total = summary.total();
    println!();
    print_rule();
    println!(
        "Results: {}/{} passed, {}/{} failed",
        summary.passed, total, summary.failed, total
    );
    if summary.skipped > 0 {
        println!("  ({} check(s) skipped)", summary.skipped);
    }
    print_rule();
}
