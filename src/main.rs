mod cli;

use anyhow::{Context, Result};
use cli::{Args, Command, FilterArgs};
use sales_explorer::config::{Config, DEFAULT_CONFIG_FILE};
use sales_explorer::{export_dashboard, load_csv, Dashboard, Dataset, Tabular};
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    init_logging(&args);
    info!("Sales Explorer v{}", sales_explorer::VERSION);
    debug!("Arguments: {:?}", args);

    let config = Config::resolve(args.config.as_deref())?;
    let data_path = args.data.clone().unwrap_or_else(|| config.data.path.clone());
    let dataset = load_dataset(&data_path, &config)?;

    match &args.command {
        Command::Summary { filter } => run_summary(&dataset, filter),
        Command::Options { filter } => run_options(&dataset, filter),
        Command::Export { filter, out } => {
            let dir = out.clone().unwrap_or_else(|| config.export.output_dir.clone());
            run_export(&dataset, filter, &dir)
        }
        Command::InitConfig => Ok(()),
    }
}

/// Handle init-config: generate a default .sales-explorer.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn load_dataset(path: &Path, config: &Config) -> Result<Dataset> {
    println!("📂 Loading {}...", path.display());
    let dataset = load_csv(path, &config.data.load_options())
        .with_context(|| format!("Failed to load sales data from {}", path.display()))?;
    println!("✓ Loaded {} records", dataset.len());
    Ok(dataset)
}

fn compute(dataset: &Dataset, filter: &FilterArgs) -> Dashboard {
    let criteria = filter.criteria(dataset);
    info!(
        from = %criteria.date_from(),
        to = %criteria.date_to(),
        regions = criteria.regions().len(),
        states = criteria.states().len(),
        cities = criteria.cities().len(),
        "Applying filters"
    );
    Dashboard::compute(dataset.records(), &criteria)
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn run_summary(dataset: &Dataset, filter: &FilterArgs) -> Result<()> {
    let dashboard = compute(dataset, filter);
    let totals = &dashboard.totals;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "📅 {} → {}",
        dashboard.criteria.date_from(),
        dashboard.criteria.date_to()
    );
    println!(
        "🧾 {} records | Sales {} | Profit {} | Quantity {}",
        totals.records, totals.sales, totals.profit, totals.quantity
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if dashboard.records.is_empty() {
        println!("\nNo records match the selected filters.");
        return Ok(());
    }

    print_table("Sales by Category", &dashboard.by_category);
    print_table("Sales by Region", &dashboard.by_region);
    print_table("Sales by Segment", &dashboard.by_segment);
    print_table("Monthly Sales", dashboard.monthly.as_slice());
    print_table("Sub-Category x Month", &dashboard.sub_category_by_month);
    print_table("Preview", dashboard.preview.as_slice());

    Ok(())
}

fn run_options(dataset: &Dataset, filter: &FilterArgs) -> Result<()> {
    let dashboard = compute(dataset, filter);
    let options = &dashboard.options;

    println!("\n🌎 Regions: {}", options.regions.join(", "));
    println!("🏛️  States:  {}", options.states.join(", "));
    println!("🏙️  Cities:  {}", options.cities.join(", "));
    Ok(())
}

fn run_export(dataset: &Dataset, filter: &FilterArgs, dir: &Path) -> Result<()> {
    let dashboard = compute(dataset, filter);

    println!("\n💾 Exporting to {}...", dir.display());
    let written = export_dashboard(&dashboard, dir)?;
    for path in &written {
        println!("✓ {}", path.display());
    }
    Ok(())
}

// ============================================================================
// TABLE RENDERING
// ============================================================================

/// Print a table with left-aligned, width-fitted columns.
fn print_table<T: Tabular + ?Sized>(title: &str, table: &T) {
    let headers = table.headers();
    let rows = table.rows();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("\n📊 {}", title);
    println!("{}", render(headers.as_slice()));
    println!(
        "{}",
        widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &rows {
        println!("{}", render(row.as_slice()));
    }
}
