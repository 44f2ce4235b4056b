//! Command-line interface.
//!
//! Subcommands over one loaded dataset: `ask` answers a Portuguese
//! question, `report` renders a dashboard cut, `info` prints table stats,
//! and `config` shows or persists defaults. Answers go to stdout; notices
//! and logs go to stderr so piped output stays clean.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use crate::config::{BotConfig, ConfigError};
use crate::dataset::{self, Dataset, DatasetStats, RecordFilter};
use crate::format;
use crate::query::engine::{self, QueryOptions};
use crate::query::period::Window;
use crate::query::regions;
use crate::report::{LogisticsReport, OverviewReport, ProductsReport, RegionalReport};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Assistente de análise de vendas por palavras-chave",
    long_about = None
)]
pub struct Cli {
    /// Path to the order export CSV.
    #[arg(long, global = true, env = "BOTDASH_DATA", value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer one question about the selected period.
    Ask(AskArgs),
    /// Render a dashboard report.
    Report(ReportArgs),
    /// Show statistics about the loaded dataset.
    Info(InfoArgs),
    /// Show or set persistent defaults.
    Config(ConfigArgs),
}

/// Window flags shared by `ask` and `report`.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Window start (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD), inclusive.
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Calendar-year shorthand.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub year: Option<i32>,

    /// Month within --year.
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

impl WindowArgs {
    /// Effective window: explicit bounds, then the year/month shorthand,
    /// then the dataset's full purchase range.
    fn resolve(&self, data: &Dataset) -> Result<Window> {
        let full = data
            .date_range()
            .context("dataset has no purchase dates")?;
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                if from > to {
                    bail!("--from ({}) is after --to ({})", from, to);
                }
                Ok(Window::new(from, to))
            }
            (Some(from), None) => {
                if from > full.end {
                    bail!("--from ({}) is after the last purchase ({})", from, full.end);
                }
                Ok(Window::new(from, full.end))
            }
            (None, Some(to)) => {
                if to < full.start {
                    bail!("--to ({}) is before the first purchase ({})", to, full.start);
                }
                Ok(Window::new(full.start, to))
            }
            (None, None) => match self.year {
                Some(year) => match self.month {
                    Some(month) => Window::month(year, month)
                        .with_context(|| format!("invalid month {}/{}", month, year)),
                    None => Window::year(year).with_context(|| format!("invalid year {}", year)),
                },
                None => Ok(full),
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// The question, in Portuguese.
    #[arg(value_name = "QUESTION")]
    pub question: String,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Apply a region filter as if the question named it.
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Restrict to one seller id (overrides the config default).
    #[arg(long, value_name = "ID")]
    pub seller: Option<String>,

    /// Emit the answer as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Which report to build.
    #[arg(value_enum)]
    pub kind: ReportKind,

    #[command(flatten)]
    pub window: WindowArgs,

    /// Restrict to one seller id (overrides the config default).
    #[arg(long, value_name = "ID")]
    pub seller: Option<String>,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportKind {
    Overview,
    Products,
    Logistics,
    Regional,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Emit the stats as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Save this dataset path as the default.
    #[arg(long, value_name = "PATH")]
    pub set_dataset: Option<PathBuf>,

    /// Save this seller id as the default cut.
    #[arg(long, value_name = "ID")]
    pub set_seller: Option<String>,

    /// Remove the saved seller cut.
    #[arg(long, conflicts_with = "set_seller")]
    pub clear_seller: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose, cli.no_color);

    let config = match &cli.config {
        Some(path) => match BotConfig::load_from(path) {
            // `config` may point at a file that does not exist yet;
            // saving creates it. The other subcommands keep the hard error.
            Err(ConfigError::Read(err))
                if err.kind() == std::io::ErrorKind::NotFound
                    && matches!(cli.command, Command::Config(_)) =>
            {
                BotConfig::default()
            }
            other => {
                other.with_context(|| format!("loading config from {}", path.display()))?
            }
        },
        None => BotConfig::load().context("loading config")?,
    };

    match cli.command {
        Command::Ask(args) => {
            let (data, _) = load_dataset(&cli.data, &config)?;
            cmd_ask(data, &config, args)
        }
        Command::Report(args) => {
            let (data, _) = load_dataset(&cli.data, &config)?;
            cmd_report(data, &config, args)
        }
        Command::Info(args) => {
            let (data, data_path) = load_dataset(&cli.data, &config)?;
            cmd_info(data, &data_path, args)
        }
        Command::Config(args) => cmd_config(config, cli.config.as_deref(), args),
    }
}

fn load_dataset(
    flag: &Option<PathBuf>,
    config: &BotConfig,
) -> Result<(&'static Dataset, PathBuf)> {
    let path = config.dataset_path(flag.as_deref());
    let data = dataset::init(&path)
        .with_context(|| format!("loading dataset from {}", path.display()))?;
    Ok((data, path))
}

fn init_tracing(verbosity: u8, no_color: bool) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .init();
}

fn cmd_ask(data: &Dataset, config: &BotConfig, args: AskArgs) -> Result<()> {
    let ui_window = args.window.resolve(data)?;
    let forced_region = match &args.region {
        Some(name) => Some(regions::by_name(name).with_context(|| {
            format!(
                "unknown region '{}'; use norte, nordeste, sudeste, sul or centro-oeste",
                name
            )
        })?),
        None => None,
    };
    let seller = args.seller.as_deref().or(config.seller.as_deref());

    let opts = QueryOptions {
        forced_region,
        seller,
    };
    let answer = engine::answer_with(data, &args.question, ui_window, &opts);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    let notice = if answer.period_from_question {
        format!(
            "Análise específica para {} de {}",
            format::month_name_pt(answer.window.start.month()).unwrap_or("?"),
            answer.window.start.year()
        )
    } else {
        format!(
            "Análise entre {} e {}",
            format::date_br(answer.window.start),
            format::date_br(answer.window.end)
        )
    };
    eprintln!("{}", notice.dimmed());
    println!("{}", answer.text);
    Ok(())
}

fn cmd_report(data: &Dataset, config: &BotConfig, args: ReportArgs) -> Result<()> {
    let window = args.window.resolve(data)?;
    let seller = args.seller.as_deref().or(config.seller.as_deref());

    let mut filter = RecordFilter::window(window);
    if let Some(seller) = seller {
        filter = filter.with_seller(seller);
    }
    let rows = data.select(&filter);

    match args.kind {
        ReportKind::Overview => {
            let mut prev_filter = RecordFilter::window(window.previous());
            if let Some(seller) = seller {
                prev_filter = prev_filter.with_seller(seller);
            }
            let prev_rows = data.select(&prev_filter);
            let report = OverviewReport::build(&rows, window).with_previous(&prev_rows);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
        ReportKind::Products => {
            let report = ProductsReport::build(&rows, window);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
        ReportKind::Logistics => {
            let report = LogisticsReport::build(&rows, window);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
        ReportKind::Regional => {
            let report = RegionalReport::build(&rows, window);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render());
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InfoOutput<'a> {
    path: String,
    #[serde(flatten)]
    stats: &'a DatasetStats,
}

fn cmd_config(mut config: BotConfig, explicit_path: Option<&Path>, args: ConfigArgs) -> Result<()> {
    let mut changed = false;
    if let Some(path) = args.set_dataset {
        config.dataset = Some(path);
        changed = true;
    }
    if let Some(seller) = args.set_seller {
        config.seller = Some(seller);
        changed = true;
    }
    if args.clear_seller {
        config.seller = None;
        changed = true;
    }

    if changed {
        // Write back to the file the values came from.
        let saved = match explicit_path {
            Some(path) => {
                config.save_to(path).context("saving config")?;
                path.to_path_buf()
            }
            None => config.save().context("saving config")?,
        };
        eprintln!(
            "{}",
            format!("Configuração gravada em {}", saved.display()).dimmed()
        );
    }

    println!("dataset: {}", config.dataset_path(None).display());
    match &config.seller {
        Some(seller) => println!("seller:  {}", seller),
        None => println!("seller:  (todos)"),
    }
    Ok(())
}

fn cmd_info(data: &Dataset, path: &Path, args: InfoArgs) -> Result<()> {
    let stats = data.stats();
    if args.json {
        let out = InfoOutput {
            path: path.display().to_string(),
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", "DATASET".bold());
    println!("-------");
    println!("Arquivo:            {}", path.display());
    println!("Linhas:             {}", format::thousands(stats.rows as u64));
    println!(
        "Linhas descartadas: {}",
        format::thousands(stats.rows_skipped as u64)
    );
    println!("Pedidos:            {}", format::thousands(stats.orders as u64));
    println!(
        "Clientes:           {}",
        format::thousands(stats.customers as u64)
    );
    println!("Estados:            {}", stats.states);
    println!("Categorias:         {}", stats.categories);
    if let (Some(first), Some(last)) = (stats.first_purchase, stats.last_purchase) {
        println!(
            "Período:            {} a {}",
            format::date_br(first),
            format::date_br(last)
        );
    }
    Ok(())
}
