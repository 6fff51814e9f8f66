use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use chem_inventory::{
    commands::NewChemical,
    config::{self, AppConfig},
    db,
    errors::ServiceError,
    events,
    models::{Chemical, ExpirationStatus, HistoryEntry, HistoryFilter, StockLevel, Unit},
    notifications::Notification,
    repositories::{InventoryRepository, SeaOrmRepository},
    services::{InventoryLedger, LedgerSettings},
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut context = CliContext::initialize().await?;
    let json = cli.json;

    let outcome = match cli.command {
        Commands::List(args) => handle_list(&context, args, json),
        Commands::LowStock => handle_low_stock(&context, json),
        Commands::Locations => handle_locations(&context, json),
        Commands::History(args) => handle_history(&context, args, json),
        Commands::Register(args) => handle_register(&mut context, args, json).await,
        Commands::Consume(args) => handle_consume(&mut context, args, json).await,
        Commands::Correct(args) => handle_correct(&mut context, args, json).await,
        Commands::Seed(args) => handle_seed(&mut context, args, json).await,
    };

    context.shutdown().await;
    outcome
}

#[derive(Parser)]
#[command(
    name = "chem-inventory",
    about = "Laboratory chemical inventory with usage and stock-correction history",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List chemicals with stock level and expiration status
    List(ListArgs),
    /// List chemicals below the low-stock threshold
    LowStock,
    /// List known storage locations
    Locations,
    /// Register a new chemical
    Register(RegisterArgs),
    /// Log consumption of a chemical
    Consume(ConsumeArgs),
    /// Set the stock of a chemical to a counted value
    Correct(CorrectArgs),
    /// Show usage and stock-update history, newest first
    History(HistoryArgs),
    /// Register the demo inventory
    Seed(SeedArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, help = "Filter by name, formula or CAS number (case-insensitive)")]
    search: Option<String>,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    formula: String,
    #[arg(long, help = "Opening stock, also the 100% reference")]
    initial_stock: f64,
    #[arg(long, help = "One of: mL, g, L, kg")]
    unit: Unit,
    #[arg(long)]
    location: String,
    #[arg(long = "cas", default_value = "")]
    cas_number: String,
    #[arg(long = "expires", help = "Expiration date (YYYY-MM-DD)")]
    expiration_date: Option<NaiveDate>,
    #[arg(long, help = "Name of the person registering the chemical")]
    user: String,
}

#[derive(Args)]
struct ConsumeArgs {
    #[arg(long = "id")]
    chemical_id: Uuid,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    user: String,
}

#[derive(Args)]
struct CorrectArgs {
    #[arg(long = "id")]
    chemical_id: Uuid,
    #[arg(long = "stock", help = "Counted stock level")]
    new_stock: f64,
    #[arg(long)]
    user: String,
}

#[derive(Args)]
struct HistoryArgs {
    #[arg(long, default_value = "all", help = "One of: all, usage, stock_update")]
    kind: HistoryFilter,
    #[arg(long = "chemical", help = "Restrict to one chemical id")]
    chemical_id: Option<Uuid>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, default_value = "seed")]
    user: String,
}

struct CliContext {
    _config: AppConfig,
    ledger: InventoryLedger,
    events_task: JoinHandle<()>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let repository: Arc<dyn InventoryRepository> =
            Arc::new(SeaOrmRepository::new(Arc::new(db_pool)));

        let (event_sender, event_rx) = events::channel(config.event_channel_capacity);
        let events_task = tokio::spawn(events::process_events(event_rx));

        let ledger = InventoryLedger::load(repository, LedgerSettings::from(&config))
            .await
            .context("failed to load the inventory")?
            .with_event_sender(event_sender);

        Ok(Self {
            _config: config,
            ledger,
            events_task,
        })
    }

    /// Drops the ledger so the event loop drains and stops.
    async fn shutdown(self) {
        let Self {
            ledger,
            events_task,
            ..
        } = self;
        drop(ledger);
        if let Err(err) = events_task.await {
            debug!(error = %err, "event loop ended abnormally");
        }
    }
}

#[derive(Serialize)]
struct ChemicalRow<'a> {
    #[serde(flatten)]
    chemical: &'a Chemical,
    stock_percentage: f64,
    stock_level: StockLevel,
    expiration_status: ExpirationStatus,
    low_stock: bool,
}

#[derive(Serialize)]
struct MutationOutput<T: Serialize> {
    notification: Notification,
    record: T,
}

fn chemical_rows<'a>(
    ledger: &'a InventoryLedger,
    chemicals: &[&'a Chemical],
) -> Vec<ChemicalRow<'a>> {
    let threshold = ledger.settings().low_stock_threshold;
    chemicals
        .iter()
        .map(|&chemical| ChemicalRow {
            chemical,
            stock_percentage: chemical.stock_percentage(),
            stock_level: chemical.stock_level(),
            expiration_status: ledger.expiration_status(chemical),
            low_stock: chemical.is_low_stock(threshold),
        })
        .collect()
}

fn handle_list(context: &CliContext, args: ListArgs, json: bool) -> Result<ExitCode> {
    let ledger = &context.ledger;
    let matches = ledger.search(args.search.as_deref().unwrap_or_default());
    let rows = chemical_rows(ledger, &matches);

    if json {
        print_json(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }
    if rows.is_empty() {
        println!("No chemicals found.");
    }
    for row in &rows {
        render_chemical(row);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_low_stock(context: &CliContext, json: bool) -> Result<ExitCode> {
    let ledger = &context.ledger;
    let rows = chemical_rows(ledger, &ledger.low_stock());

    if json {
        print_json(&rows)?;
        return Ok(ExitCode::SUCCESS);
    }
    if rows.is_empty() {
        println!("All chemicals are sufficiently stocked.");
    }
    for row in &rows {
        render_chemical(row);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_locations(context: &CliContext, json: bool) -> Result<ExitCode> {
    let locations = context.ledger.locations();
    if json {
        print_json(&locations)?;
        return Ok(ExitCode::SUCCESS);
    }
    for location in locations {
        println!("- {}", location);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_history(context: &CliContext, args: HistoryArgs, json: bool) -> Result<ExitCode> {
    let ledger = &context.ledger;
    let entries: Vec<HistoryEntry> = match args.chemical_id {
        Some(id) => ledger.history_for(id, args.kind),
        None => ledger.history(args.kind),
    };

    if json {
        print_json(&entries)?;
        return Ok(ExitCode::SUCCESS);
    }
    if entries.is_empty() {
        println!("No history yet.");
    }
    for entry in &entries {
        println!(
            "{} • {}",
            entry.timestamp().format("%Y-%m-%d %H:%M:%S"),
            entry
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_register(
    context: &mut CliContext,
    args: RegisterArgs,
    json: bool,
) -> Result<ExitCode> {
    let new = NewChemical {
        name: args.name,
        formula: args.formula,
        initial_stock: args.initial_stock,
        unit: args.unit,
        location: args.location,
        cas_number: args.cas_number,
        expiration_date: args.expiration_date,
    };

    let result = context.ledger.register(new, &args.user).await;
    report(result, Notification::chemical_registered, json)
}

async fn handle_consume(
    context: &mut CliContext,
    args: ConsumeArgs,
    json: bool,
) -> Result<ExitCode> {
    let result = context
        .ledger
        .consume(args.chemical_id, args.amount, &args.user)
        .await;
    report(result, Notification::usage_logged, json)
}

async fn handle_correct(
    context: &mut CliContext,
    args: CorrectArgs,
    json: bool,
) -> Result<ExitCode> {
    let result = context
        .ledger
        .correct_stock(args.chemical_id, args.new_stock, &args.user)
        .await;
    report(result, Notification::stock_corrected, json)
}

async fn handle_seed(context: &mut CliContext, args: SeedArgs, json: bool) -> Result<ExitCode> {
    let mut registered = Vec::new();

    for (chemical, current_stock) in demo_inventory()? {
        if context
            .ledger
            .chemicals()
            .iter()
            .any(|existing| existing.name == chemical.name)
        {
            debug!(name = %chemical.name, "already present, skipping");
            continue;
        }

        let stored = match context.ledger.register(chemical, &args.user).await {
            Ok(stored) => stored,
            Err(err) => {
                return report::<Chemical>(Err(err), Notification::chemical_registered, json)
            }
        };
        if current_stock < stored.initial_stock {
            if let Err(err) = context
                .ledger
                .correct_stock(stored.id, current_stock, &args.user)
                .await
            {
                return report::<Chemical>(Err(err), Notification::chemical_registered, json);
            }
        }
        registered.push(stored.name);
    }

    info!(count = registered.len(), "Demo inventory seeded");
    let notification = Notification::success(format!(
        "{} demo chemicals added successfully!",
        registered.len()
    ));
    if json {
        print_json(&MutationOutput {
            notification,
            record: registered,
        })?;
    } else {
        println!("{}", notification);
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the notification for a mutation; failures exit non-zero.
fn report<T: Serialize>(
    result: Result<T, ServiceError>,
    notify: impl FnOnce(&T) -> Notification,
    json: bool,
) -> Result<ExitCode> {
    match result {
        Ok(record) => {
            let notification = notify(&record);
            if json {
                print_json(&MutationOutput {
                    notification,
                    record,
                })?;
            } else {
                println!("{}", notification);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let notification = Notification::failure(&err);
            if json {
                print_json(&serde_json::json!({
                    "notification": notification,
                    "error": { "kind": err.kind(), "detail": err.to_string() },
                }))?;
            } else {
                eprintln!("{}", notification);
                debug!(error = %err, kind = err.kind(), "mutation failed");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn demo_inventory() -> Result<Vec<(NewChemical, f64)>> {
    let rows: [(&str, &str, f64, f64, Unit, &str, &str, Option<&str>); 8] = [
        (
            "Asam Klorida",
            "HCl",
            5000.0,
            4500.0,
            Unit::Milliliter,
            "Rak A1",
            "7647-01-0",
            Some("2025-12-31"),
        ),
        (
            "Natrium Hidroksida",
            "NaOH",
            2000.0,
            1850.0,
            Unit::Gram,
            "Rak A2",
            "1310-73-2",
            Some("2026-06-01"),
        ),
        (
            "Asam Sulfat",
            "H₂SO₄",
            3000.0,
            120.0,
            Unit::Milliliter,
            "Rak B1",
            "7664-93-9",
            Some("2025-08-15"),
        ),
        (
            "Etanol",
            "C₂H₅OH",
            10000.0,
            9500.0,
            Unit::Milliliter,
            "Rak C3",
            "64-17-5",
            Some("2027-01-01"),
        ),
        (
            "Aseton",
            "C₃H₆O",
            5000.0,
            4800.0,
            Unit::Milliliter,
            "Rak C4",
            "67-64-1",
            Some("2026-10-20"),
        ),
        (
            "Kalium Permanganat",
            "KMnO₄",
            500.0,
            45.0,
            Unit::Gram,
            "Rak D1",
            "7722-64-7",
            Some("2024-09-01"),
        ),
        (
            "Metanol",
            "CH₃OH",
            5000.0,
            4900.0,
            Unit::Milliliter,
            "Rak C5",
            "67-56-1",
            Some("2023-01-01"),
        ),
        ("Iodium", "I₂", 250.0, 250.0, Unit::Gram, "Rak D2", "7553-56-2", None),
    ];

    rows.into_iter()
        .map(|(name, formula, initial, current, unit, location, cas, expires)| {
            let expiration_date = expires
                .map(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
                .transpose()
                .with_context(|| format!("invalid demo expiration date for {}", name))?;
            Ok((
                NewChemical {
                    name: name.to_string(),
                    formula: formula.to_string(),
                    initial_stock: initial,
                    unit,
                    location: location.to_string(),
                    cas_number: cas.to_string(),
                    expiration_date,
                },
                current,
            ))
        })
        .collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_chemical(row: &ChemicalRow<'_>) {
    let chemical = row.chemical;
    let expiry = match (chemical.expiration_date, row.expiration_status) {
        (Some(date), status) => format!("expires {} ({})", date, status),
        (None, _) => "no expiration date".to_string(),
    };
    println!(
        "- {} ({}) • {}/{} {} ({:.0}%, {}) • {} • CAS {} • {} • id {}",
        chemical.name,
        chemical.formula,
        chemical.current_stock,
        chemical.initial_stock,
        chemical.unit,
        row.stock_percentage,
        row.stock_level,
        chemical.location,
        chemical.cas_number,
        expiry,
        chemical.id
    );
    if row.low_stock {
        println!("  ! low stock");
    }
}
