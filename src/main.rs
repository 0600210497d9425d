// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use student_roster::{
    format_amount, logging, source_from_location, QuickXmlReader, RosterConfig, RosterSession,
    SortDirection, SortDirective, SortKey,
};

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Browse, search and export a student roster")]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Configuration file (default: ./roster.toml if present)")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "LOCATION", help = "Input document path or URL")]
    source: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive table (default)
    Tui,
    /// Print the filtered, sorted roster
    List {
        #[arg(long, short, default_value = "", help = "Case-insensitive name/section filter")]
        query: String,
        #[arg(long, default_value = "name", value_parser = parse_sort_key)]
        sort: SortKey,
        #[arg(long, help = "Sort descending")]
        desc: bool,
        #[arg(long, help = "Emit JSON instead of a table")]
        json: bool,
    },
    /// Re-serialize the loaded roster
    Export {
        #[arg(long, short, value_name = "PATH", help = "Output file (default: <export_dir>/students_export.xml)")]
        output: Option<PathBuf>,
    },
}

fn parse_sort_key(raw: &str) -> std::result::Result<SortKey, String> {
    raw.parse::<SortKey>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RosterConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(source) = cli.source {
        config.source = source;
    }

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(&config),
        Command::List {
            query,
            sort,
            desc,
            json,
        } => {
            logging::init(&config.log_filter);
            run_list(&config, &query, sort, desc, json)
        }
        Command::Export { output } => {
            logging::init(&config.log_filter);
            run_export(&config, output)
        }
    }
}

fn load_session(config: &RosterConfig) -> Result<RosterSession> {
    let source = source_from_location(&config.source)?;
    let mut session = RosterSession::new();
    session
        .load(source.as_ref(), &QuickXmlReader::new())
        .with_context(|| format!("{} ({})", session.status(), source.describe()))?;
    Ok(session)
}

fn run_list(config: &RosterConfig, query: &str, sort: SortKey, desc: bool, json: bool) -> Result<()> {
    let mut session = load_session(config)?;
    session.set_query(query);
    session.set_directive(SortDirective::new(
        sort,
        if desc { SortDirection::Desc } else { SortDirection::Asc },
    ));

    let rows = session.visible();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<12} {:<30} {:<12} {:>14} {:>14}",
        "Student ID", "Name", "Section", "Tuition Fee", "Initial Payout"
    );
    println!("{}", "━".repeat(86));
    for s in &rows {
        println!(
            "{:<12} {:<30} {:<12} {:>14} {:>14}",
            s.identifier,
            s.name,
            s.section,
            format_amount(s.tuition_fee),
            format_amount(s.initial_payout)
        );
    }
    println!("{}", "━".repeat(86));
    let directive = session.directive();
    println!(
        "✓ {} of {} students, by {} {}",
        rows.len(),
        session.store().len(),
        directive.key,
        directive.direction
    );

    Ok(())
}

fn run_export(config: &RosterConfig, output: Option<PathBuf>) -> Result<()> {
    println!("📂 Loading {}...", config.source);
    let mut session = load_session(config)?;
    println!("✓ {}", session.status());

    let export = session.export();
    let path = output.unwrap_or_else(|| config.export_dir.join(export.filename));
    std::fs::write(&path, &export.document)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Wrote {} students to {}", export.count, path.display());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &RosterConfig) -> Result<()> {
    logging::init_to_file(&config.log_filter, &config.export_dir.join("roster.log"));

    println!("🖥️  Loading Student Roster UI...\n");

    let source = source_from_location(&config.source)?;
    let reader = QuickXmlReader::new();

    // a failed load still opens the UI, the status line reports it and `r` retries
    let mut session = RosterSession::new();
    let _ = session.load(source.as_ref(), &reader);
    println!("{}", session.status());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(session, source, Box::new(reader), config.export_dir.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &RosterConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: roster list / roster export");
    std::process::exit(1);
}
