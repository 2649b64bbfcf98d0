//! Opus Invoice CLI
//!
//! Validates an invoice described in a JSON file and creates the matching
//! reallocation document in Opus.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- invoice.json
//! cargo run -- invoice.json --csv-only
//! ```
//!
//! # Environment Variables
//!
//! - `OPUS_URL`, `OPUS_MUNICIPALITY_CODE`, `OPUS_USER`, `OPUS_USER_PASSWORD`:
//!   Opus connection (not needed with `--csv-only`)
//! - `OPUS_WEBDRIVER_URL`, `OPUS_HEADLESS`, `OPUS_STRICT_UPLOAD`: browser session
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use opus_invoice::{
    create_invoice, write_csv, Error, FlowState, InvoiceData, InvoiceError, OpusConfig,
    Phase, RawInvoice, RawOpusConfig, Result, SessionLogger, SessionOptions,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

/// Exit code when Opus rejected the document.
const EXIT_REJECTED: i32 = 2;

fn main() {
    env_logger::init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_REJECTED),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns whether the document was accepted.
fn run() -> Result<bool> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(Error::MissingArgument);
    }
    let csv_only = args[2..].iter().any(|a| a == "--csv-only");

    let file = File::open(&args[1])?;
    let raw: RawInvoice = serde_json::from_reader(BufReader::new(file))?;
    let invoice = InvoiceData::try_from(raw)?;

    if csv_only {
        write_csv(&invoice)
            .map_err(|source| InvoiceError::new(Phase::CsvExport, FlowState::Idle, source))?;
        println!("{}", invoice.csv_filename().display());
        return Ok(true);
    }

    let config = OpusConfig::try_from(RawOpusConfig::from_env())?;
    let options = SessionOptions::from_env();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(create_invoice(
        config,
        invoice,
        options,
        SessionLogger::global(),
    ))?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    serde_json::to_writer_pretty(handle, &result)?;
    println!();

    Ok(result.is_success())
}
