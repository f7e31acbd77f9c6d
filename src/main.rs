use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};

use feed_extractor::parser::{self, Extraction};
use feed_extractor::{dump, scan_feed, HtmlSnapshot, ReplayDocument, Settings, Snapshot};

#[derive(Parser)]
#[command(name = "feed_extractor", about = "Feed readiness and post extraction over saved pages")]
struct Cli {
    /// Settings file (TOML or JSON); FEED__* env vars override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every feed item in a saved page
    Classify {
        file: PathBuf,
    },
    /// Extract post records from saved pages
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Run the readiness poller over a directory of recorded frames
    Replay {
        /// Directory of *.html frames, replayed in file-name order
        dir: PathBuf,
        /// Also write a timestamped scan dump into this directory
        #[arg(long)]
        dump: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;

    let result = match cli.command {
        Commands::Classify { file } => classify_file(&file, &settings),
        Commands::Extract { files, pretty } => {
            println!("{}", extract_files(&files, &settings, pretty)?);
            Ok(())
        }
        Commands::Replay { dir, dump: dump_dir } => {
            let mut doc = ReplayDocument::from_dir(&dir)
                .with_context(|| format!("loading frames from {}", dir.display()))?;
            let scan = scan_feed(&mut doc, &settings).await?;
            println!("{}", serde_json::to_string_pretty(&scan)?);

            if let Some(dump_dir) = dump_dir {
                let label = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let path = dump::write_scan_dump(&dump_dir, &label, &scan)?;
                eprintln!("Dump written to {}", path.display());
            }

            eprintln!(
                "{} after {} attempts ({} genuine, {} scrolls)",
                if scan.readiness.converged { "Converged" } else { "Gave up" },
                scan.readiness.attempts,
                scan.readiness.genuine_count,
                doc.scrolls()
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", elapsed_label(elapsed));
    }

    result
}

fn classify_file(file: &Path, settings: &Settings) -> anyhow::Result<()> {
    let snap = HtmlSnapshot::from_file(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let survey = parser::survey(&snap, settings)?;

    println!("{:>3} | {:<11} | {}", "#", "Kind", "Text");
    println!("{}", "-".repeat(80));
    for (i, item) in survey.items.iter().enumerate() {
        let kind = item
            .kind
            .map(|k| format!("{:?}", k).to_lowercase())
            .unwrap_or_else(|| "skipped".into());
        let text = snap.text(item.node).unwrap_or_default();
        println!("{:>3} | {:<11} | {}", i + 1, kind, clip(&text, 60));
    }

    let t = survey.tally;
    println!(
        "\n{} items: {} genuine, {} placeholder, {} comment, {} skipped",
        t.total(),
        t.genuine,
        t.placeholder,
        t.comment,
        t.skipped
    );
    Ok(())
}

fn extract_files(files: &[PathBuf], settings: &Settings, pretty: bool) -> anyhow::Result<String> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    // Each worker owns its parsed page; only the extracted records cross threads.
    let results: Vec<anyhow::Result<Extraction>> = files
        .par_iter()
        .map(|file| {
            let snap = HtmlSnapshot::from_file(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let extraction = parser::extract_posts(&snap, settings)
                .with_context(|| format!("extracting {}", file.display()))?;
            pb.inc(1);
            Ok(extraction)
        })
        .collect();
    pb.finish_and_clear();

    let mut records = Vec::new();
    for extraction in results {
        records.extend(extraction?.posts.into_iter().map(|p| p.record));
    }
    eprintln!("Extracted {} posts from {} files.", records.len(), files.len());

    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    Ok(json)
}

/// First `max` characters of a feed item's text, with an ellipsis when cut.
fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn elapsed_label(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, secs % 3600 / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{m}m {s}s"),
        (h, m, s) => format!("{h}h {m}m {s}s"),
    }
}
