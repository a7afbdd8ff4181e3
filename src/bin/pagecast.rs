//! CLI binary for pagecast.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PublishConfig`, reads the input files, and prints the ordered
//! locator list.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pagecast::{
    process_upload, PublishConfig, PublishOutput, SourceFile, StorageSettings,
};
use pagecast::storage::s3::S3Settings;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Publish a document to the default local directory (public/uploads)
  pagecast report.pdf

  # Publish a set of standalone page images, in the given order
  pagecast scan-01.png scan-02.png scan-03.png

  # Choose the output directory and the public base path
  pagecast report.pdf --out-dir /srv/www/uploads --public-base /uploads

  # Publish to S3-compatible object storage (MinIO shown)
  pagecast report.pdf --s3 \
      --s3-bucket pages --s3-endpoint http://localhost:9000 \
      --s3-access-key minio --s3-secret-key minio123

  # Encrypted document
  pagecast secret.pdf --password hunter2

  # Machine-readable output
  pagecast report.pdf --json

ENVIRONMENT VARIABLES:
  PAGECAST_S3_BUCKET       S3 bucket name
  PAGECAST_S3_ENDPOINT     S3 endpoint URL
  PAGECAST_S3_REGION       S3 region (default: us-east-1)
  PAGECAST_S3_ACCESS_KEY   S3 access key
  PAGECAST_S3_SECRET_KEY   S3 secret key
  PAGECAST_S3_PUBLIC_BASE  Public URL prefix for S3 locators (e.g. a CDN)
  PDFIUM_DYNAMIC_LIB_PATH  Path to an existing libpdfium copy

SETUP:
  pagecast renders through the system pdfium library. Install libpdfium
  via your package manager, or set PDFIUM_DYNAMIC_LIB_PATH.
"#;

/// Rasterise documents and publish ordered page images.
#[derive(Parser, Debug)]
#[command(
    name = "pagecast",
    version,
    about = "Rasterise documents and publish ordered page images",
    long_about = "Accepts one paginated document (PDF) or a set of standalone page images, \
renders document pages at a fixed 1.5x scale, persists every image through the configured \
storage backend, and prints the ordered list of public locators.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files: one PDF, or one or more standalone page images.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory to write assets under (filesystem storage).
    #[arg(short, long, env = "PAGECAST_FS_ROOT", default_value = "public/uploads")]
    out_dir: PathBuf,

    /// Public URL prefix under which --out-dir is served.
    #[arg(long, env = "PAGECAST_PUBLIC_BASE", default_value = "/uploads")]
    public_base: String,

    /// Use S3-compatible object storage instead of the filesystem.
    #[arg(long)]
    s3: bool,

    /// S3 bucket name.
    #[arg(long, env = "PAGECAST_S3_BUCKET")]
    s3_bucket: Option<String>,

    /// S3 endpoint URL.
    #[arg(long, env = "PAGECAST_S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region.
    #[arg(long, env = "PAGECAST_S3_REGION")]
    s3_region: Option<String>,

    /// S3 access key.
    #[arg(long, env = "PAGECAST_S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key.
    #[arg(long, env = "PAGECAST_S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Public URL prefix for S3 locators (e.g. a CDN in front of the bucket).
    #[arg(long, env = "PAGECAST_S3_PUBLIC_BASE")]
    s3_public_base: Option<String>,

    /// Document password for encrypted uploads.
    #[arg(long, env = "PAGECAST_PASSWORD")]
    password: Option<String>,

    /// Maximum rendered surface edge in pixels.
    #[arg(long, env = "PAGECAST_MAX_EDGE", default_value_t = 10_000)]
    max_edge: u32,

    /// Output the full PublishOutput as JSON instead of one locator per line.
    #[arg(long, env = "PAGECAST_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGECAST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the locator list.
    #[arg(short, long, env = "PAGECAST_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read input file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        files.push(SourceFile::from_bytes(name, media_type, bytes));
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let output = process_upload(files, &config)
        .await
        .context("publishing failed")?;

    print_output(&cli, &output)?;
    Ok(())
}

/// Map CLI args to `PublishConfig`.
fn build_config(cli: &Cli) -> Result<PublishConfig> {
    let storage_settings = if cli.s3 {
        fn missing(flag: &str) -> String {
            let env = flag.to_uppercase().replace('-', "_");
            format!("--{flag} (or PAGECAST_{env}) is required with --s3")
        }
        let Some(bucket) = cli.s3_bucket.clone() else { bail!(missing("s3-bucket")) };
        let Some(endpoint) = cli.s3_endpoint.clone() else { bail!(missing("s3-endpoint")) };
        let Some(access_key) = cli.s3_access_key.clone() else { bail!(missing("s3-access-key")) };
        let Some(secret_key) = cli.s3_secret_key.clone() else { bail!(missing("s3-secret-key")) };

        StorageSettings::S3(S3Settings {
            bucket,
            endpoint,
            region: cli.s3_region.clone(),
            access_key,
            secret_key,
            public_base: cli.s3_public_base.clone(),
        })
    } else {
        StorageSettings::Filesystem {
            root: cli.out_dir.clone(),
            public_base: cli.public_base.clone(),
        }
    };

    let mut builder = PublishConfig::builder()
        .max_surface_pixels(cli.max_edge)
        .storage_settings(storage_settings);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("invalid configuration")
}

/// Print the ordered locator list (or the full JSON output).
fn print_output(cli: &Cli, output: &PublishOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("failed to serialise output")?;
        writeln!(handle, "{json}").context("failed to write to stdout")?;
    } else {
        for locator in output.locators() {
            writeln!(handle, "{locator}").context("failed to write to stdout")?;
        }
        if !cli.quiet {
            eprintln!(
                "{} assets published in {}ms ({} bytes stored)",
                output.stats.pages, output.stats.total_duration_ms, output.stats.bytes_stored
            );
        }
    }

    Ok(())
}
