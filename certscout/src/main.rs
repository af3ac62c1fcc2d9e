//! certscout: Command-line tool for nginx TLS certificate monitoring.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "certscout=warn,certscout_lib=warn";
const VERBOSE_LOG_FILTER: &str = "certscout=debug,certscout_lib=debug";

#[derive(Parser)]
#[command(
    name = "certscout",
    version,
    about = "Discover, check and verify the TLS certificates used by nginx",
    long_about = "certscout finds the certificates referenced by nginx server blocks,\n\
                  checks a certificate's validity window, and verifies a certificate\n\
                  chain against a trust anchor bundle. Results are printed as JSON\n\
                  for consumption by monitoring agents.",
    after_help = "EXAMPLES:\n\
                  \n  certscout discovery\
                  \n  certscout discovery /etc/nginx/conf.d\
                  \n  certscout check /etc/ssl/example.pem\
                  \n  certscout verify /etc/ssl/fullchain.pem\
                  \n  certscout verify --pretty fullchain.pem /etc/ssl/roots.pem"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List certificates referenced by nginx server blocks (low-level discovery JSON)
    #[command(after_help = "Without CONF_DIR the platform default is used:\n\
                      \n  FreeBSD  /usr/local/etc/nginx/conf.d\
                      \n  Linux    /etc/nginx/conf.d (/etc/opt/kusanagi/nginx/conf.d under KUSANAGI)")]
    Discovery {
        /// nginx configuration directory, scanned recursively for *.conf files
        conf_dir: Option<PathBuf>,
    },
    /// Check a certificate's validity window and self-signed status
    Check {
        /// PEM certificate file
        file: Option<PathBuf>,
        /// Check at a specific Unix timestamp instead of current time
        #[arg(long, value_name = "EPOCH")]
        attime: Option<i64>,
    },
    /// Verify a certificate chain against trust anchors
    #[command(after_help = "Without CA_FILE the system CA bundle is used, located the way\n\
                      OpenSSL does it: SSL_CERT_FILE, then the platform default bundle.")]
    Verify {
        /// PEM file with the entity certificate first, then its intermediates
        file: Option<PathBuf>,
        /// PEM bundle of trust anchors
        ca_file: Option<PathBuf>,
        /// Verify at a specific Unix timestamp instead of current time
        #[arg(long, value_name = "EPOCH")]
        attime: Option<i64>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Discovery { conf_dir } => {
            let conf_dir = conf_dir
                .clone()
                .or_else(certscout_lib::default_conf_dir)
                .unwrap_or_default();
            match certscout_lib::discover(&conf_dir) {
                Ok(entries) => {
                    println!("{}", certscout_lib::to_json(&entries, cli.pretty)?);
                }
                Err(err) => {
                    tracing::error!(dir = %conf_dir.display(), "{}", err);
                    let empty: Vec<certscout_lib::DiscoveryEntry> = Vec::new();
                    println!("{}", certscout_lib::to_json(&empty, cli.pretty)?);
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file, attime } => {
            let path = file.clone().unwrap_or_default();
            let now = attime.unwrap_or_else(certscout_lib::now_timestamp);
            let report = certscout_lib::check_certificate(&path, now);
            let json = certscout_lib::to_json(&report, cli.pretty)
                .context("failed to serialize check report")?;
            println!("{}", json);
            if report.input_failed() {
                std::process::exit(1);
            }
        }
        Commands::Verify {
            file,
            ca_file,
            attime,
        } => {
            let path = file.clone().unwrap_or_default();
            let now = attime.unwrap_or_else(certscout_lib::now_timestamp);
            let report = certscout_lib::verify_files(&path, ca_file.as_deref(), now);
            let json = certscout_lib::to_json(&report, cli.pretty)
                .context("failed to serialize verify report")?;
            println!("{}", json);
            if report.input_failed() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
