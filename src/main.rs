//! QRIS Engine CLI
//!
//! Reads a merchant's static QRIS payload and a CSV of orders, and writes one
//! dynamic payload per order.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- merchant.txt orders.csv > payloads.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `QRIS_ID_MAX_ATTEMPTS`: Candidates drawn per order code before giving up
//! - `QRIS_ID_BODY_LEN`: Random characters in allocated order codes

use qris_engine::{AllocatorConfig, IdentifierAllocator, QrisBatch, QrisError, Result};
use std::env;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(QrisError::MissingArgument);
    }

    let static_payload = fs::read_to_string(&args[1])?;
    let allocator = IdentifierAllocator::with_config(AllocatorConfig::from_env()?)?;

    let file = File::open(&args[2])?;
    let reader = BufReader::new(file);

    let mut batch = QrisBatch::new(&static_payload, allocator)?;
    batch.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    batch.write_output(handle)?;

    Ok(())
}
