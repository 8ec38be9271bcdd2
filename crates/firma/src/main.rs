#![forbid(unsafe_code)]

//! firma CLI: validate the signature of a Facturae invoice.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use firma_core::Error;
use firma_xades::{SignatureVerdict, ValidationContext};
use std::path::{Path, PathBuf};
use std::process;

/// Accepted input file extensions.
const EXTENSIONS: [&str; 2] = ["xml", "xsig"];

/// Default upper bound on the input size: 10 MiB.
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "firma",
    about = "Validate XAdES signatures in Facturae electronic invoices",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a signed invoice and print the verdict as JSON
    Verify {
        /// Input file (.xml or .xsig)
        file: PathBuf,

        /// Reject files larger than this many bytes
        #[arg(long = "max-size", default_value_t = DEFAULT_MAX_SIZE)]
        max_size: u64,

        /// Evaluate certificate validity at this RFC 3339 instant instead of now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Do not recompute reference digests
        #[arg(long = "skip-references")]
        skip_references: bool,

        /// Pretty-print the JSON verdict
        #[arg(long)]
        pretty: bool,

        /// Emit log events as JSON
        #[arg(long = "log-json")]
        log_json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List supported algorithms
    Info,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify {
            file,
            max_size,
            at,
            skip_references,
            pretty,
            log_json,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "warn" };
            if log_json {
                firma::logging::init_tracing_json_with(level);
            } else {
                firma::logging::init_tracing_with(level);
            }
            cmd_verify(&file, max_size, at, skip_references, pretty)
        }
        Commands::Info => cmd_info().map(|()| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn cmd_verify(
    file: &Path,
    max_size: u64,
    at: Option<DateTime<Utc>>,
    skip_references: bool,
    pretty: bool,
) -> Result<i32, Error> {
    let data = read_gated(file, max_size)?;

    let mut ctx = ValidationContext::new().with_reference_checks(!skip_references);
    if let Some(at) = at {
        ctx = ctx.with_verification_time(at);
    }

    tracing::debug!(file = %file.display(), bytes = data.len(), "validating");
    let verdict = firma_xades::validate(&ctx, &data);

    let json = if pretty {
        serde_json::to_string_pretty(&verdict)
    } else {
        serde_json::to_string(&verdict)
    }
    .map_err(|e| Error::Other(format!("serializing verdict: {e}")))?;
    println!("{json}");

    Ok(exit_code(&verdict))
}

fn cmd_info() -> Result<(), Error> {
    println!("firma: XAdES signature validation for Facturae invoices");
    println!();
    println!("Supported signature algorithms:");
    println!("  RSA PKCS#1 v1.5 (SHA-1, SHA-256, SHA-512)");
    println!("  ECDSA P-256/P-384/P-521 (SHA-1, SHA-256, SHA-512)");
    println!();
    println!("Supported digest algorithms:");
    println!("  SHA-1, SHA-224, SHA-256, SHA-384, SHA-512");
    println!();
    println!("Supported canonicalization:");
    println!("  C14N 1.0 (±comments)");
    println!("  C14N 1.1 (±comments)");
    println!("  Exclusive C14N 1.0 (±comments)");
    println!();
    println!("Supported transforms:");
    println!("  enveloped-signature, XPath not(ancestor-or-self::ds:Signature)");
    println!();
    println!("Detected profiles:");
    println!("  XMLDSig, XAdES-BES, XAdES-T, XAdES-C, XAdES-XL");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn exit_code(verdict: &SignatureVerdict) -> i32 {
    match verdict.valid {
        Some(true) => 0,
        Some(false) => 1,
        None => 2,
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 instant: {e}"))
}

fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|ok| ext.eq_ignore_ascii_case(ok)))
}

fn read_gated(path: &Path, max_size: u64) -> Result<Vec<u8>, Error> {
    if !has_accepted_extension(path) {
        return Err(Error::Other(format!(
            "{}: unsupported file type (expected .xml or .xsig)",
            path.display()
        )));
    }
    let len = std::fs::metadata(path)
        .map_err(|e| Error::Other(format!("{}: {e}", path.display())))?
        .len();
    if len > max_size {
        return Err(Error::Other(format!(
            "{}: file is {len} bytes, limit is {max_size}",
            path.display()
        )));
    }
    std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}
