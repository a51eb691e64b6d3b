use clap::{Parser, Subcommand, ValueEnum};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pa_linescan::pipeline::open_image;
use pa_linescan::{Pipeline, PipelineConfig, PipelineOutput, RankingCriterion};

#[derive(Parser)]
#[command(name = "pa-linescan")]
#[command(about = "Rank pressure advance test lines from a masked photograph")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one masked image and print the ranked lines
    Analyze {
        /// Image with an alpha channel marking the printed pattern
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        /// Number of ranked lines to print
        #[arg(long)]
        top: Option<usize>,

        /// Score used for ranking
        #[arg(long, value_enum)]
        ranking: Option<Ranking>,

        /// Write the full analysis as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Save intermediate masks and images to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        debug_out: Option<PathBuf>,
    },

    /// Check the best line of every `<name>_<expected>_out.png` below a directory
    Evaluate {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Ranking {
    Regional,
    Global,
}

impl From<Ranking> for RankingCriterion {
    fn from(r: Ranking) -> Self {
        match r {
            Ranking::Regional => RankingCriterion::Regional,
            Ranking::Global => RankingCriterion::Global,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    match args.command {
        Command::Analyze {
            image_path,
            top,
            ranking,
            report,
            debug_out,
        } => {
            if let Some(top) = top {
                config.scoring.top_n = top;
            }
            if let Some(ranking) = ranking {
                config.scoring.ranking = ranking.into();
            }
            analyze(&Pipeline::with_config(config)?, &image_path, report, debug_out)
        }
        Command::Evaluate { dir } => {
            let failures = evaluate(&Pipeline::with_config(config)?, &dir)?;
            if failures > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    open_image(path).map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
}

/// The directory must be empty or non-existent
fn prepare_debug_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!(
                "Debug directory is not empty: {}",
                dir.display()
            ));
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn save_debug_outputs(dir: &Path, output: &PipelineOutput) -> anyhow::Result<()> {
    output.write_debug_outputs(dir)?;
    tracing::info!("Debug outputs saved to {}", dir.display());
    Ok(())
}

fn analyze(
    pipeline: &Pipeline,
    image_path: &Path,
    report: Option<PathBuf>,
    debug_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(dir) = &debug_out {
        prepare_debug_dir(dir)?;
    }

    let img = load_image(image_path)?;
    tracing::debug!("Image loaded: {}x{}", img.width(), img.height());

    let output = pipeline.run(&img)?;

    if let Some(dir) = &debug_out {
        save_debug_outputs(dir, &output)?;
    }
    if let Some(path) = &report {
        output.report().write_json(path)?;
    }

    println!("=== Smoothest Lines ===");
    println!("{:>6} {:>12} {:>12}", "line", "S1", "S2");
    for ranked in &output.ranking {
        println!(
            "{:>6} {:>12.2} {:>12.2}",
            ranked.line_number, ranked.global_score, ranked.regional_score
        );
    }
    if let Some(best) = output.best_line() {
        println!("Best line: {}", best);
    }

    Ok(())
}

/// Expected line numbers encoded in a file name such as `pa_3,4_out.png`
fn expected_lines(path: &Path) -> Option<Vec<usize>> {
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_suffix("_out")?;
    let (_, encoded) = rest.rsplit_once('_')?;
    encoded
        .split(',')
        .map(|v| v.parse::<usize>().ok())
        .collect()
}

fn collect_images(dir: &Path, found: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_images(&path, found)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        {
            found.push(path);
        }
    }
    Ok(())
}

/// Returns the number of failing images
fn evaluate(pipeline: &Pipeline, dir: &Path) -> anyhow::Result<usize> {
    let mut images = Vec::new();
    collect_images(dir, &mut images)?;
    images.sort();

    let mut passed = 0;
    let mut failures = Vec::new();

    for path in images {
        let Some(expected) = expected_lines(&path) else {
            tracing::debug!("Skipping {}: name does not encode expected lines", path.display());
            continue;
        };

        let result = load_image(&path).and_then(|img| Ok(pipeline.run(&img)?));
        match result {
            Ok(output) => match output.best_line() {
                Some(best) if expected.contains(&best) => passed += 1,
                best => {
                    let msg = format!(
                        "{} (expected one of {:?}, got {:?})",
                        path.display(),
                        expected,
                        best
                    );
                    println!("FAIL: {}", msg);
                    failures.push(msg);
                }
            },
            Err(e) => {
                let msg = format!("{} (error: {})", path.display(), e);
                println!("FAIL: {}", msg);
                failures.push(msg);
            }
        }
    }

    println!("\nSummary:");
    println!("Num tests passed: {}", passed);
    println!("Num tests failed: {}", failures.len());
    if !failures.is_empty() {
        println!("\nFailed tests:");
        for failure in &failures {
            println!("{}", failure);
        }
    }

    Ok(failures.len())
}
