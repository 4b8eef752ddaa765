use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum, ValueHint};
use tracing::info;

use denoise::{AdaptiveMedianFilter, FilterConfig, Halo, Raster, Strategy, add_salt_and_pepper};

#[derive(Parser, Debug)]
#[command(
    name = "denoise",
    author,
    version,
    about = "Remove salt-and-pepper noise with an adaptive median filter"
)]
struct Cli {
    /// Input raster (pgm, ppm, pnm, png, jpg, tiff, bmp)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output raster; the format follows the extension
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Smallest window side tried (odd)
    #[arg(long)]
    min_window: Option<usize>,

    /// Largest window side tried before returning the last median (odd)
    #[arg(long)]
    max_window: Option<usize>,

    /// Work decomposition
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Worker threads for the threaded strategy (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Ranks for the distributed strategy
    #[arg(long)]
    ranks: Option<usize>,

    /// How distributed ranks receive their halo rows
    #[arg(long, value_enum)]
    halo: Option<HaloKind>,

    /// YAML or JSON filter configuration; flags override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Corrupt this fraction of pixels with salt-and-pepper noise before filtering
    #[arg(long, value_name = "DENSITY")]
    add_noise: Option<f64>,

    /// Seed for --add-noise
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write daily rolling log files to this directory
    #[arg(long, value_hint = ValueHint::DirPath)]
    log_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    Sequential,
    Threaded,
    Distributed,
    Gpu,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum HaloKind {
    Scatter,
    Broadcast,
}

impl From<HaloKind> for Halo {
    fn from(kind: HaloKind) -> Self {
        match kind {
            HaloKind::Scatter => Halo::Scatter,
            HaloKind::Broadcast => Halo::Broadcast,
        }
    }
}

impl From<Strategy> for StrategyKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Sequential => StrategyKind::Sequential,
            Strategy::Threaded { .. } => StrategyKind::Threaded,
            Strategy::Distributed { .. } => StrategyKind::Distributed,
            Strategy::Gpu => StrategyKind::Gpu,
            Strategy::Auto => StrategyKind::Auto,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    common::log_setup::setup_logging(&cli.log_level, "denoise", cli.log_dir.as_deref())
        .context("failed to initialize logging")?;

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let filter = AdaptiveMedianFilter::new(config).context("invalid filter configuration")?;

    let mut raster = Raster::read_file(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    if let Some(density) = cli.add_noise {
        let corrupted = add_salt_and_pepper(&mut raster, density, cli.seed)?;
        info!(density, seed = cli.seed, corrupted, "Added salt-and-pepper noise");
    }

    let start = Instant::now();
    let output = filter.apply(&raster).context("filtering failed")?;
    info!(
        backend = filter.backend_name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Filtered {}",
        cli.input.display()
    );

    output
        .save_file(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("Saved {}", cli.output.display());

    Ok(())
}

/// Config file values first, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<FilterConfig> {
    let mut config: FilterConfig = match &cli.config {
        Some(path) => common::file_format::load_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FilterConfig::default(),
    };

    if let Some(min) = cli.min_window {
        config.window.min = min;
    }
    if let Some(max) = cli.max_window {
        config.window.max = max;
    }
    config.strategy = resolve_strategy(config.strategy, cli);

    Ok(config)
}

fn resolve_strategy(current: Strategy, cli: &Cli) -> Strategy {
    let kind = cli.strategy.unwrap_or(StrategyKind::from(current));

    match kind {
        StrategyKind::Sequential => Strategy::Sequential,
        StrategyKind::Threaded => {
            let threads = match current {
                Strategy::Threaded { threads } => threads,
                _ => 0,
            };
            Strategy::Threaded {
                threads: cli.threads.unwrap_or(threads),
            }
        }
        StrategyKind::Distributed => {
            let (ranks, halo) = match current {
                Strategy::Distributed { ranks, halo } => (ranks, halo),
                _ => (default_ranks(), Halo::default()),
            };
            Strategy::Distributed {
                ranks: cli.ranks.unwrap_or(ranks),
                halo: cli.halo.map(Halo::from).unwrap_or(halo),
            }
        }
        StrategyKind::Gpu => Strategy::Gpu,
        StrategyKind::Auto => Strategy::Auto,
    }
}

fn default_ranks() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use denoise::WindowSize;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["denoise", "in.pgm", "out.pgm"].iter().chain(args)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = resolve_config(&parse(&[])).unwrap();
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_window_and_strategy_flags() {
        let cli = parse(&[
            "--min-window",
            "5",
            "--max-window",
            "9",
            "--strategy",
            "distributed",
            "--ranks",
            "3",
            "--halo",
            "broadcast",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.window, WindowSize::new(5, 9));
        assert_eq!(
            config.strategy,
            Strategy::Distributed {
                ranks: 3,
                halo: Halo::Broadcast
            }
        );
    }

    #[test]
    fn test_threads_override_keeps_strategy() {
        let config = resolve_config(&parse(&["--threads", "6"])).unwrap();
        assert_eq!(config.strategy, Strategy::Threaded { threads: 6 });
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.yaml");
        std::fs::write(
            &path,
            "window:\n  min: 3\n  max: 11\nstrategy:\n  kind: distributed\n  ranks: 2\n",
        )
        .unwrap();

        let config_arg = path.to_string_lossy().to_string();
        let config =
            resolve_config(&parse(&["--config", &config_arg, "--halo", "broadcast"])).unwrap();

        assert_eq!(config.window, WindowSize::new(3, 11));
        assert_eq!(
            config.strategy,
            Strategy::Distributed {
                ranks: 2,
                halo: Halo::Broadcast
            }
        );
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let result = Cli::try_parse_from(["denoise", "a.pgm", "b.pgm", "--strategy", "cluster"]);
        assert!(result.is_err());
    }
}
