//! FiiLab CLI: fetch, screen, peer search, and cache management commands.
//!
//! Commands:
//! - `fetch`: download the Fundamentus FII listing and cache it as Parquet
//! - `screen`: score the listing with a preset and show the funds that pass
//! - `similar`: rank funds resembling a target fund
//! - `suggest`: show the suggested similarity window for a target fund
//! - `overview`: fund count, mean yield, mean P/VP, mean vacancy, total market value
//! - `cache status`: report what is cached, its age, and its size
//! - `cache clear`: remove the cached snapshot

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use fiilab_core::advisor::suggest;
use fiilab_core::data::{CacheState, FundamentusProvider, SnapshotCache, SnapshotProvider};
use fiilab_core::domain::{MacroSegment, ScoredTable};
use fiilab_core::scoring::score;
use fiilab_core::similarity::similar;
use fiilab_runner::export::timestamped_stem;
use fiilab_runner::{
    available_segments, export_csv, export_json, export_markdown, load_table, overview,
    save_exports, screen, ExportView, FiiLabConfig, LoadOptions, LoadedTable, PresetName,
    ScreenRequest,
};

#[derive(Parser)]
#[command(name = "fiilab", about = "FiiLab CLI: Brazilian real-estate fund screener")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the cache directory from the config.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the listing and cache it.
    Fetch {
        /// Download even if the cached snapshot is still fresh.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Score the listing and show the funds that pass.
    Screen {
        /// Scoring preset: beginner or advanced.
        #[arg(long, default_value = "beginner")]
        preset: PresetName,

        /// Minimum score (0-5). Defaults to the preset's.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
        min_score: Option<u8>,

        /// Keep only these macro-segments (repeatable).
        #[arg(long = "macro", value_enum)]
        macro_segments: Vec<MacroArg>,

        /// Keep only these segment labels, as published (repeatable).
        #[arg(long = "segment")]
        segments: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Rank funds resembling a target fund.
    Similar {
        /// Target ticker (e.g., HGLG11).
        ticker: String,

        /// Scoring preset used for the score column.
        #[arg(long, default_value = "beginner")]
        preset: PresetName,

        /// Maximum dividend-yield gap, in percentage points. Defaults to the suggestion.
        #[arg(long)]
        yield_tolerance: Option<f64>,

        /// Maximum P/VP gap. Defaults to the suggestion.
        #[arg(long)]
        ratio_tolerance: Option<f64>,

        /// Minimum peer liquidity (R$/day). Defaults to the suggestion.
        #[arg(long)]
        min_liquidity: Option<f64>,

        /// Search across all segments instead of the target's own.
        #[arg(long, default_value_t = false)]
        any_segment: bool,

        /// Search only among these macro-segments (repeatable).
        #[arg(long = "macro", value_enum)]
        macro_segments: Vec<MacroArg>,

        /// Search only among these segment labels, as published (repeatable).
        #[arg(long = "segment")]
        segments: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the suggested similarity window for a target fund.
    Suggest {
        /// Target ticker (e.g., HGLG11).
        ticker: String,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Headline numbers for the whole listing.
    Overview {
        /// Print the overview as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report what is cached, its age, and its size.
    Status,
    /// Remove the cached snapshot.
    Clear,
}

/// Where the listing comes from.
#[derive(Args)]
struct SourceArgs {
    /// Read a CSV export instead of the cache or the network.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Field separator for --csv (e.g., ';').
    #[arg(long)]
    separator: Option<char>,

    /// Offline mode: use the cached snapshot, whatever its age.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Download even if the cached snapshot is still fresh.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write the output to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write CSV, JSON, and Markdown files into this directory.
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Markdown,
}

impl OutputArgs {
    /// Status text: stdout for tables, stderr when stdout carries data.
    fn note(&self, line: &str) {
        match self.format {
            OutputFormat::Table => println!("{line}"),
            _ => eprintln!("{line}"),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MacroArg {
    Papers,
    Logistics,
    Shopping,
    Fof,
    Offices,
    Other,
}

impl From<MacroArg> for MacroSegment {
    fn from(arg: MacroArg) -> Self {
        match arg {
            MacroArg::Papers => MacroSegment::PapersCri,
            MacroArg::Logistics => MacroSegment::Logistics,
            MacroArg::Shopping => MacroSegment::Shopping,
            MacroArg::Fof => MacroSegment::FundOfFunds,
            MacroArg::Offices => MacroSegment::Offices,
            MacroArg::Other => MacroSegment::Other,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = FiiLabConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache.dir = dir;
    }

    match cli.command {
        Commands::Fetch { force } => run_fetch(&config, force),
        Commands::Screen {
            preset,
            min_score,
            macro_segments,
            segments,
            source,
            output,
        } => {
            let mut request = {
                let p = config.presets.get(preset);
                ScreenRequest::new(p.thresholds(), min_score.unwrap_or(p.min_score))
            };
            request.macro_segments = macro_segments.into_iter().map(Into::into).collect();
            request.segments = segments;
            run_screen(&config, &request, &source, &output)
        }
        Commands::Similar {
            ticker,
            preset,
            yield_tolerance,
            ratio_tolerance,
            min_liquidity,
            any_segment,
            macro_segments,
            segments,
            source,
            output,
        } => {
            let mut universe = ScreenRequest::new(config.presets.get(preset).thresholds(), 0);
            universe.macro_segments = macro_segments.into_iter().map(Into::into).collect();
            universe.segments = segments;
            run_similar(
                &config,
                &ticker,
                &universe,
                Overrides {
                    yield_tolerance,
                    ratio_tolerance,
                    min_liquidity,
                    any_segment,
                },
                &source,
                &output,
            )
        }
        Commands::Suggest { ticker, source } => run_suggest(&config, &ticker, &source),
        Commands::Overview { json, source } => run_overview(&config, json, &source),
        Commands::Cache { action } => match action {
            CacheAction::Status => run_cache_status(&config.cache.build()),
            CacheAction::Clear => run_cache_clear(&config.cache.build()),
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(config: &FiiLabConfig, source: &SourceArgs) -> Result<LoadedTable> {
    let csv_separator = match source.separator {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => bail!("separator must be a single ASCII character, got '{c}'"),
        None => None,
    };
    let opts = LoadOptions {
        csv: source.csv.clone(),
        csv_separator,
        offline: source.offline,
        force: source.force,
    };

    let provider = if opts.csv.is_none() && !opts.offline {
        Some(FundamentusProvider::new(config.source.settings())?)
    } else {
        None
    };

    let cache = config.cache.build();
    let loaded = load_table(
        &cache,
        provider.as_ref().map(|p| p as &dyn SnapshotProvider),
        &opts,
        &config.validation.required(),
    )
    .context("failed to load the FII listing")?;

    if let Some(at) = loaded.fetched_at {
        tracing::info!(
            fetched_at = %at.format("%Y-%m-%d %H:%M UTC"),
            age_min = (Utc::now() - at).num_minutes(),
            "snapshot from cache"
        );
    }
    Ok(loaded)
}

fn run_fetch(config: &FiiLabConfig, force: bool) -> Result<()> {
    let cache = config.cache.build();
    let provider = FundamentusProvider::new(config.source.settings())?;

    let snapshot = cache
        .get_or_fetch(&provider, force)
        .context("failed to fetch the FII listing")?;

    println!("Source:  {:?}", snapshot.source());
    println!("Rows:    {}", snapshot.height());
    println!("Columns: {}", snapshot.column_names().len());
    println!("Health:  {}", snapshot.health());
    println!("Cache:   {}", cache.cache_dir().display());
    Ok(())
}

fn run_screen(
    config: &FiiLabConfig,
    request: &ScreenRequest,
    source: &SourceArgs,
    output: &OutputArgs,
) -> Result<()> {
    let loaded = load(config, source)?;
    let result = screen(&loaded.table, request)?;

    output.note(&format!(
        "{} of {} funds scored >= {}",
        result.passed.len(),
        result.scored.len(),
        request.min_score
    ));
    output.note(&result.advice.to_string());
    let no_match = result.scored.is_empty() && !request.segments.is_empty();
    if no_match {
        output.note(&format!(
            "No fund in the chosen segments. Available: {}",
            available_segments(&loaded.table).join(", ")
        ));
    }
    if matches!(output.format, OutputFormat::Table) {
        if no_match {
            return Ok(());
        }
        println!();
    }

    emit(&result.passed, ExportView::Passed, output, "fiis")
}

/// Explicit similarity settings from the command line.
struct Overrides {
    yield_tolerance: Option<f64>,
    ratio_tolerance: Option<f64>,
    min_liquidity: Option<f64>,
    any_segment: bool,
}

fn run_similar(
    config: &FiiLabConfig,
    ticker: &str,
    universe: &ScreenRequest,
    overrides: Overrides,
    source: &SourceArgs,
    output: &OutputArgs,
) -> Result<()> {
    let ticker = ticker.trim().to_uppercase();
    let loaded = load(config, source)?;
    let scored = screen(&loaded.table, universe)?.scored;
    if scored.get(&ticker).is_none() && loaded.table.get(&ticker).is_some() {
        bail!("fund '{ticker}' is outside the chosen segments");
    }

    let mut params = suggest(&scored, &ticker).into_params(!overrides.any_segment);
    if let Some(v) = overrides.yield_tolerance {
        params.yield_tolerance = v;
    }
    if let Some(v) = overrides.ratio_tolerance {
        params.ratio_tolerance = v;
    }
    if let Some(v) = overrides.min_liquidity {
        params.min_liquidity = v;
    }

    let peers = similar(&scored, &ticker, &params)?;

    output.note(&format!(
        "Peers of {ticker}: ±{:.1} pp DY, ±{:.2} P/VP, liquidity >= {:.0}{}",
        params.yield_tolerance,
        params.ratio_tolerance,
        params.min_liquidity,
        if params.same_category {
            ", same segment"
        } else {
            ""
        }
    ));
    if peers.is_empty() {
        output.note("No similar funds found. Try wider tolerances or --any-segment.");
    }
    if matches!(output.format, OutputFormat::Table) {
        if peers.is_empty() {
            return Ok(());
        }
        println!();
    }

    emit(&peers, ExportView::Peers, output, "peers")
}

fn run_suggest(config: &FiiLabConfig, ticker: &str, source: &SourceArgs) -> Result<()> {
    let ticker = ticker.trim().to_uppercase();
    let loaded = load(config, source)?;
    let scored = score(&loaded.table, &config.presets.get(PresetName::Advanced).thresholds());

    let Some(fund) = scored.get(&ticker) else {
        bail!("fund '{ticker}' not found in the listing");
    };
    let suggested = suggest(&scored, &ticker);

    println!("Fund:            {ticker}");
    println!(
        "Segment:         {} ({})",
        fund.fund.segment.as_deref().unwrap_or("-"),
        fund.fund.macro_segment.map_or("-", |m| m.label())
    );
    println!(
        "Dividend yield:  {}",
        fund.fund
            .dy_pct
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}%"))
    );
    println!();
    println!("Suggested window:");
    println!("  yield tolerance  ±{:.1} pp", suggested.yield_tolerance);
    println!("  P/VP tolerance   ±{:.2}", suggested.ratio_tolerance);
    println!("  min liquidity    R$ {:.0}/day", suggested.min_liquidity);
    Ok(())
}

fn run_overview(config: &FiiLabConfig, json: bool, source: &SourceArgs) -> Result<()> {
    let loaded = load(config, source)?;
    let o = overview(&loaded.table);
    if json {
        println!("{}", serde_json::to_string_pretty(&o)?);
        return Ok(());
    }

    let mean = |v: Option<f64>, suffix: &str| {
        v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}{suffix}"))
    };
    println!("Funds:           {}", o.fund_count);
    println!("Mean DY:         {}", mean(o.mean_dy_pct, "%"));
    println!("Mean P/VP:       {}", mean(o.mean_p_vp, ""));
    println!("Mean vacancy:    {}", mean(o.mean_vacancy_pct, "%"));
    println!("Market value:    R$ {}", group_thousands(o.total_market_value));
    Ok(())
}

/// Whole reais with '.' between thousands, as Brazilian listings print them.
fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value.round() < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

fn emit(table: &ScoredTable, view: ExportView, output: &OutputArgs, prefix: &str) -> Result<()> {
    if let Some(dir) = &output.export_dir {
        let paths = save_exports(table, view, dir, &timestamped_stem(prefix))?;
        for path in &paths {
            output.note(&format!("Wrote {}", path.display()));
        }
    }

    let body = match output.format {
        OutputFormat::Table => format_table(table, view),
        OutputFormat::Csv => export_csv(table, view)?,
        OutputFormat::Json => export_json(table, view)?,
        OutputFormat::Markdown => export_markdown(table, view),
    };

    match &output.output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("failed to write {}", path.display()))?;
            output.note(&format!("Wrote {}", path.display()));
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn format_table(table: &ScoredTable, view: ExportView) -> String {
    let num = |v: Option<f64>, decimals: usize| {
        v.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
    };

    let mut out = String::new();
    match view {
        ExportView::Passed => {
            out.push_str(&format!(
                "{:<8} {:<20} {:>9} {:>7} {:>6} {:>14} {:>7} {:>5}\n",
                "Fundo", "Macro", "Cotação", "DY %", "P/VP", "Liquidez", "Vac %", "Score"
            ));
            out.push_str(&format!("{}\n", "-".repeat(83)));
            for f in table.funds() {
                let fund = &f.fund;
                out.push_str(&format!(
                    "{:<8} {:<20} {:>9.2} {:>7} {:>6} {:>14} {:>7} {:>5}\n",
                    fund.ticker,
                    fund.macro_segment.map_or("-", |m| m.label()),
                    fund.price,
                    num(fund.dy_pct, 2),
                    num(fund.p_vp, 2),
                    num(fund.liquidity, 0),
                    num(fund.vacancy_pct, 2),
                    f.score()
                ));
            }
        }
        ExportView::Peers => {
            out.push_str(&format!(
                "{:<8} {:<24} {:>7} {:>6} {:>14} {:>5}\n",
                "Fundo", "Segmento", "DY %", "P/VP", "Liquidez", "Score"
            ));
            out.push_str(&format!("{}\n", "-".repeat(69)));
            for f in table.funds() {
                let fund = &f.fund;
                out.push_str(&format!(
                    "{:<8} {:<24} {:>7} {:>6} {:>14} {:>5}\n",
                    fund.ticker,
                    fund.segment.as_deref().unwrap_or("-"),
                    num(fund.dy_pct, 2),
                    num(fund.p_vp, 2),
                    num(fund.liquidity, 0),
                    f.score()
                ));
            }
        }
    }
    out
}

fn run_cache_status(cache: &SnapshotCache) -> Result<()> {
    let dir = cache.cache_dir();
    println!("Cache: {}", dir.display());
    println!("TTL:   {} s", cache.ttl().as_secs());

    let (label, meta) = match cache.state() {
        CacheState::Missing => {
            println!("State: empty");
            return Ok(());
        }
        CacheState::Fresh(meta) => ("fresh", meta),
        CacheState::Stale(meta) => ("stale", meta),
    };

    let age = meta.age_at(Utc::now());
    println!("State: {label}");
    println!(
        "Fetched: {} ({} min ago)",
        meta.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        age.num_minutes()
    );
    println!("Source:  {:?}", meta.source);
    println!("Rows:    {}", meta.row_count);
    println!("Columns: {}", meta.column_count);
    println!("Hash:    {}", meta.data_hash.get(..16).unwrap_or(meta.data_hash.as_str()));
    println!("Size:    {}", format_size(dir_size(dir)));
    Ok(())
}

fn run_cache_clear(cache: &SnapshotCache) -> Result<()> {
    cache.clear()?;
    println!("Cleared {}", cache.cache_dir().display());
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
