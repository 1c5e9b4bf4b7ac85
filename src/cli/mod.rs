//! # CLI Module
//!
//! Command-line interface for the similarity analyzer.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for near-duplicates
//! similar-scan scan ~/Photos
//!
//! # Stricter threshold
//! similar-scan scan ~/Photos --threshold 4
//!
//! # JSON output
//! similar-scan scan ~/Photos --output json
//!
//! # Print the fingerprint of one image
//! similar-scan fingerprint ~/Photos/IMG_0042.jpg
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_similarity_analyzer::core::fingerprint::{to_hex, FingerprintExtractor, HashKind};
use image_similarity_analyzer::core::pipeline::{ScanConfig, ScanReport, SimilarityScanner};
use image_similarity_analyzer::core::sampler::SourceSampler;
use image_similarity_analyzer::core::source::{
    Access, AssetHandle, DirectoryAccessGate, DirectoryAssetSource, DirectoryConfig,
};
use image_similarity_analyzer::error::{Result, SimilarityError};
use image_similarity_analyzer::events::{Event, EventChannel, FingerprintEvent, ScanEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Image Similarity Analyzer - find near-duplicate images
#[derive(Parser, Debug)]
#[command(name = "similar-scan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan directories for near-duplicate images
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Maximum aHash distance (lower = stricter, 0-64)
        #[arg(short, long, default_value = "8")]
        threshold: u32,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Follow symbolic links while walking
        #[arg(long)]
        follow_symlinks: bool,

        /// Maximum directory depth below each path
        #[arg(long)]
        max_depth: Option<usize>,

        /// Only list these extensions (comma separated, e.g. jpg,png)
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Assets fingerprinted per batch
        #[arg(long, default_value = "50")]
        batch_size: usize,

        /// Maximum simultaneous decodes (defaults to the core count, up to 8)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the aHash and dHash of a single image
    Fingerprint {
        /// Image file
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one group per line, tab separated)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            threshold,
            output,
            include_hidden,
            follow_symlinks,
            max_depth,
            extensions,
            batch_size,
            workers,
            verbose,
        } => {
            image_similarity_analyzer::init_tracing(verbose);

            let mut config = ScanConfig {
                batch_size,
                ..Default::default()
            };
            if let Some(workers) = workers {
                config.max_workers = workers;
            }

            let walk = DirectoryConfig {
                follow_symlinks,
                include_hidden,
                max_depth,
                extensions,
            };

            run_scan(paths, threshold, output, walk, config, verbose)
        }
        Commands::Fingerprint { path } => {
            image_similarity_analyzer::init_tracing(false);
            run_fingerprint(&path)
        }
    }
}

fn run_scan(
    paths: Vec<PathBuf>,
    threshold: u32,
    output: OutputFormat,
    walk: DirectoryConfig,
    config: ScanConfig,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Image Similarity Analyzer").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let source = DirectoryAssetSource::with_config(paths.clone(), walk);

    let scanner = SimilarityScanner::builder(Arc::new(source))
        .gate(Box::new(DirectoryAccessGate::new(paths)))
        .config(config)
        .build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Scan(ScanEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Fingerprint(FingerprintEvent::Started { total_assets, .. }) => {
                    pb.set_length(total_assets as u64);
                }
                Event::Fingerprint(FingerprintEvent::BatchCompleted(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose && p.skipped > 0 {
                        pb.set_message(format!("Fingerprinting ({} skipped)", p.skipped));
                    }
                }
                Event::Fingerprint(FingerprintEvent::AssetSkipped { asset_id, reason }) => {
                    if verbose {
                        let label = style("skip").yellow();
                        pb.println(format!("  {} {}: {}", label, asset_id, reason));
                    }
                }
                Event::Scan(ScanEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = scanner.scan_with_events(threshold, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &report, threshold, verbose),
        OutputFormat::Json => print_json_results(&report, threshold)?,
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

fn run_fingerprint(path: &Path) -> Result<()> {
    let sampler = SourceSampler::new(Arc::new(DirectoryAssetSource::new(Vec::new())));
    let asset = AssetHandle::new(path.display().to_string());
    let fingerprint = FingerprintExtractor::new().fingerprint(&sampler, &asset)?;

    println!("{}", display_path(path));
    println!(
        "  {}  {}  ({})",
        style(HashKind::Average).bold(),
        to_hex(fingerprint.a_hash()),
        HashKind::Average.description()
    );
    println!(
        "  {}  {}  ({})",
        style(HashKind::Difference).bold(),
        to_hex(fingerprint.d_hash()),
        HashKind::Difference.description()
    );
    Ok(())
}

fn print_pretty_results(term: &Term, report: &ScanReport, threshold: u32, verbose: bool) {
    term.write_line("").ok();

    if report.access == Access::Denied {
        term.write_line(&format!(
            "{} Access to the scan directories was denied",
            style("✗").red().bold()
        ))
        .ok();
        return;
    }

    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    let summary = &report.summary;
    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(summary.total_assets).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();

    if summary.skipped > 0 {
        term.write_line(&format!(
            "  {} images could not be decoded",
            style(summary.skipped).yellow()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {} duplicate groups found (threshold {})",
        style(summary.duplicate_groups).cyan(),
        threshold
    ))
    .ok();

    let duplicate_count: usize = report.groups.iter().map(|g| g.duplicate_count()).sum();
    term.write_line(&format!(
        "  {} duplicate images",
        style(duplicate_count).cyan()
    ))
    .ok();

    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
        return;
    }

    term.write_line(&format!(
        "{}",
        style("Duplicate Groups:").bold().underlined()
    ))
    .ok();
    term.write_line("").ok();

    for (i, group) in report.groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} {} ({} images, max distance {})",
            style(format!("Group {}:", i + 1)).bold(),
            style(format!("{}", group.match_type)).yellow(),
            group.len(),
            group.max_distance
        ))
        .ok();

        if verbose {
            term.write_line(&format!(
                "    {} {}",
                style("dHash").dim(),
                style(to_hex(group.bucket)).dim()
            ))
            .ok();
        }

        for (idx, asset_id) in group.asset_ids.iter().enumerate() {
            let marker = if idx == 0 {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };

            term.write_line(&format!(
                "    {} {}",
                marker,
                display_path(Path::new(asset_id))
            ))
            .ok();
        }

        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style("No files were modified. Starred images are what the others were compared against.")
            .dim()
    ))
    .ok();
}

fn print_json_results(report: &ScanReport, threshold: u32) -> Result<()> {
    let output = serde_json::json!({
        "threshold": threshold,
        "access": report.access,
        "summary": report.summary,
        "groups": report.groups.iter().map(|g| {
            serde_json::json!({
                "bucket": to_hex(g.bucket),
                "match_type": format!("{}", g.match_type),
                "max_distance": g.max_distance,
                "primary": g.primary(),
                "assets": g.asset_ids,
            })
        }).collect::<Vec<_>>()
    });

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| SimilarityError::Config(format!("failed to render JSON: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn print_minimal_results(report: &ScanReport) {
    for group in &report.groups {
        println!("{}", group.asset_ids.join("\t"));
    }
}

/// Shorten paths under the home directory to `~/...`
fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}
