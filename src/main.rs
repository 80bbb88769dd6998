//! Ecomanage CLI

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use ecomanage::{
    config::Tariffs,
    listings::{Category, Condition, estimate},
    logging::{LoggingConfig, init_subscriber},
    points::PointsCalculator,
    pricing::quote_pickup,
    reports,
    subscriptions::Catalog,
    tags::TagSet,
    waste::{RecyclingRequest, WasteType},
};
use rust_decimal::Decimal;
use rusty_money::Money;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "ecomanage", about = "EcoManage pricing and billing rules", long_about = None)]
struct Cli {
    /// Tariffs YAML file; the built-in tariffs are used when omitted
    #[arg(long, env = "ECOMANAGE_TARIFFS", global = true)]
    tariffs: Option<PathBuf>,

    /// Plan catalog YAML file; the built-in catalog is used when omitted
    #[arg(long, env = "ECOMANAGE_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a pickup request
    Quote(QuoteArgs),

    /// Compute points for a pickup weight or a purchase
    Points(PointsArgs),

    /// Estimate the eco score of a listing
    EcoScore(EcoScoreArgs),

    /// Show subscription plans and billing options
    Plans(PlansArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Waste type (mixed, paper, plastic, glass, metal, ewaste)
    #[arg(long)]
    waste: WasteType,

    /// Weight in kilograms
    #[arg(long)]
    weight: u32,

    /// Distance to the collection point in kilometres
    #[arg(long, default_value_t = 0)]
    distance: u32,

    /// Apply member pricing
    #[arg(long)]
    member: bool,
}

#[derive(Debug, Args)]
struct PointsArgs {
    /// Weight in kilograms
    #[arg(long, requires = "rate", conflicts_with = "purchase")]
    weight: Option<u32>,

    /// Points per kilogram
    #[arg(long)]
    rate: Option<Decimal>,

    /// Purchase total in minor units
    #[arg(long, required_unless_present = "weight")]
    purchase: Option<i64>,

    /// Apply the member multiplier
    #[arg(long)]
    member: bool,
}

#[derive(Debug, Args)]
struct EcoScoreArgs {
    /// Item condition (new, excellent, good, fair)
    #[arg(long)]
    condition: Condition,

    /// Marketplace category
    #[arg(long)]
    category: Category,

    /// Listing tag; repeat for several
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Args)]
struct PlansArgs {
    /// Only show this plan
    #[arg(long)]
    plan: Option<String>,
}

fn main() -> ExitCode {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = init_subscriber(&cli.logging) {
        report_error(&error.to_string());
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let out = io::stdout().lock();

    match cli.command {
        Commands::Quote(args) => {
            let tariffs = load_tariffs(cli.tariffs.as_deref())?;
            let request = RecyclingRequest::new(args.waste, args.weight, args.distance, args.member)
                .map_err(|error| error.to_string())?;

            let breakdown = quote_pickup(&request, &tariffs)
                .map_err(|error| format!("failed to price pickup: {error}"))?;
            let points = PointsCalculator::from_tariffs(&tariffs)
                .pickup_points(&request, &tariffs)
                .map_err(|error| format!("failed to compute points: {error}"))?;

            reports::write_quote(out, &request, &breakdown, points).map_err(|error| error.to_string())
        }
        Commands::Points(args) => {
            let tariffs = load_tariffs(cli.tariffs.as_deref())?;
            let calculator = PointsCalculator::from_tariffs(&tariffs);

            let (basis, points) = match (args.weight, args.rate, args.purchase) {
                (Some(weight), Some(rate), _) => (
                    format!("{weight} kg at {rate}/kg"),
                    calculator.compute_points(weight, rate, args.member),
                ),
                (_, _, Some(minor)) => {
                    let total = Money::from_minor(minor, tariffs.currency());
                    (format!("purchase of {total}"), calculator.purchase_points(&total, args.member))
                }
                _ => return Err("either --weight with --rate, or --purchase is required".to_string()),
            };

            let points = points.map_err(|error| format!("failed to compute points: {error}"))?;

            reports::write_points(out, &basis, args.member, points).map_err(|error| error.to_string())
        }
        Commands::EcoScore(args) => {
            let tags: TagSet = args.tags.iter().map(String::as_str).collect();
            let score = estimate(args.condition, &args.category, &tags);

            reports::write_eco_score(out, args.condition, &args.category, &tags, score)
                .map_err(|error| error.to_string())
        }
        Commands::Plans(args) => {
            let catalog = match cli.catalog {
                Some(path) => Catalog::from_path(&path),
                None => Catalog::builtin(),
            }
            .map_err(|error| format!("failed to load catalog: {error}"))?;

            reports::write_plans(out, &catalog, args.plan.as_deref()).map_err(|error| error.to_string())
        }
    }
}

fn load_tariffs(path: Option<&Path>) -> Result<Tariffs, String> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading tariffs");

            Tariffs::from_path(path).map_err(|error| format!("failed to load tariffs: {error}"))
        }
        None => Ok(Tariffs::default()),
    }
}

fn report_error(message: &str) {
    let _written = writeln!(io::stderr(), "{message}");
}
