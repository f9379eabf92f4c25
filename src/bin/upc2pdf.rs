//! CLI binary for upc2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`,
//! then either converts one spreadsheet or serves the upload form.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use upc2pdf::{
    generate_to_file, ColumnSelector, FailurePolicy, PageSize, ProgressCallback, RunConfig,
    RunProgressCallback, RunReport,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the sheet is read, then a bar
/// over the identifiers with one log line per skipped row.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Reading");
        bar.set_message("spreadsheet…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_identifiers: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>4}/{len} barcodes  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_length(total_identifiers as u64);
        self.bar.set_prefix("Rendering");
        self.bar.set_message("");
    }

    fn on_item_rendered(&self, _index: usize, _total: usize, identifier: &str) {
        self.bar.set_message(identifier.to_string());
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, row: usize, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} row {:>5}  {}", yellow("–"), row, dim(reason)));
    }

    fn on_run_complete(&self, rendered: usize, skipped: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} barcodes{}",
            green("✔"),
            bold(&rendered.to_string()),
            if skipped > 0 {
                format!("  ({} rows skipped)", yellow(&skipped.to_string()))
            } else {
                String::new()
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default template: 10 banner rows, identifiers in column N (index 13)
  upc2pdf products.xlsx

  # Column chosen by header text, custom output path
  upc2pdf --column UPC products.xlsx -o labels/barcodes.pdf

  # Fail instead of skipping identifiers that are not 12 or 13 digits
  upc2pdf --policy abort products.xlsx

  # Machine-readable run report on stdout
  upc2pdf --json products.xlsx > report.json

  # Serve the upload form on port 8080
  upc2pdf --serve 0.0.0.0:8080

ENVIRONMENT VARIABLES:
  Every flag can also be set through UPC2PDF_<FLAG>, e.g. UPC2PDF_COLUMN=UPC.
  RUST_LOG overrides the log filter (default: info, debug with --verbose).
"#;

/// Turn a spreadsheet column of UPC/EAN codes into a printable barcode PDF.
#[derive(Parser, Debug)]
#[command(
    name = "upc2pdf",
    version,
    about = "Turn a spreadsheet column of UPC/EAN codes into a printable barcode PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Spreadsheet to read (xlsx, xlsm, xlsb, xls, ods).
    #[arg(required_unless_present = "serve")]
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, env = "UPC2PDF_OUTPUT", default_value = "barcodes.pdf")]
    output: PathBuf,

    /// Identifier column: 0-based index (13 = column N) or header text.
    #[arg(long, env = "UPC2PDF_COLUMN", default_value = "13")]
    column: ColumnSelector,

    /// Banner rows above the header row.
    #[arg(long, env = "UPC2PDF_SKIP_ROWS", default_value_t = 10)]
    skip_rows: usize,

    /// What to do with identifiers that are not 12 or 13 digits.
    #[arg(long, env = "UPC2PDF_POLICY", value_enum, default_value = "skip")]
    policy: PolicyArg,

    /// Page size.
    #[arg(long, env = "UPC2PDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Directory under which the per-run scratch directory is created.
    #[arg(long, env = "UPC2PDF_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "UPC2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "UPC2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "UPC2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "UPC2PDF_QUIET")]
    quiet: bool,

    /// Serve the HTTP upload form on this address instead of converting a file.
    #[arg(long, env = "UPC2PDF_SERVE", value_name = "ADDR")]
    serve: Option<SocketAddr>,

    /// Upload size limit for --serve, in MiB (1-4096).
    #[arg(
        long,
        env = "UPC2PDF_MAX_UPLOAD_MB",
        default_value_t = 16,
        value_parser = clap::value_parser!(u32).range(1..=4096)
    )]
    max_upload_mb: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Skip,
    Abort,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Skip => FailurePolicy::Skip,
            PolicyArg::Abort => FailurePolicy::Abort,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::LETTER,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs; the server has no
    // bar and always logs.
    let show_progress = cli.serve.is_none() && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Server mode ──────────────────────────────────────────────────────
    if let Some(addr) = cli.serve {
        return upc2pdf::server::serve(addr, config, upload_limit_bytes(cli.max_upload_mb))
            .await
            .with_context(|| format!("Server on {addr} failed"));
    }

    // ── One-shot conversion ──────────────────────────────────────────────
    let input = cli
        .input
        .clone()
        .context("An input spreadsheet is required unless --serve is given")?;
    let output = cli.output.clone();
    let report = tokio::task::spawn_blocking(move || generate_to_file(&input, &output, &config))
        .await
        .context("Run task failed")?
        .context("Generation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report, &cli.output, show_progress);
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let mut builder = RunConfig::builder()
        .header_rows(cli.skip_rows)
        .column(cli.column.clone())
        .render_policy(cli.policy.into())
        .page_size(cli.page_size.into());

    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(name) = cli.output.file_name() {
        builder = builder.output_name(name.to_string_lossy());
    }

    builder.build().context("Invalid configuration")
}

fn upload_limit_bytes(mib: u32) -> usize {
    (mib as usize).saturating_mul(1024 * 1024)
}

fn print_summary(report: &RunReport, output: &std::path::Path, show_progress: bool) {
    // With a progress bar the callback already listed skipped rows.
    if !show_progress {
        for row in &report.skipped {
            eprintln!("  {} {}", yellow("–"), row);
        }
    }
    eprintln!(
        "{}  {} barcodes on {} pages  {}ms  →  {}",
        if report.skipped.is_empty() {
            green("✔")
        } else {
            yellow("⚠")
        },
        report.placed(),
        report.pages,
        report.duration_ms,
        bold(&output.display().to_string()),
    );
    if report.pages == 0 {
        eprintln!("   {}", yellow("no usable identifiers; the PDF has no pages"));
    }
}
