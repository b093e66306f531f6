use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slot_journal::api::{self, middleware::SecurityConfig};
use slot_journal::config::JournalConfig;
use slot_journal::{db, seed};

#[derive(Parser)]
#[command(name = "sjrnl")]
#[command(about = "Timeframe slot planner for a daily trading journal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the journal server
    Serve {
        /// Port for HTTP API (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Add the default concept library to the database
    Seed,
    /// Check server status
    Status,
    /// Print a day's slots as stored on the server
    Show {
        /// Day to show, as YYYY-MM-DD
        date: NaiveDate,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "slot_journal=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &JournalConfig) -> anyhow::Result<db::Database> {
    let db = match config.db_path {
        Some(ref path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: &JournalConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting slot journal server on port {}", port);

    let db = open_database(config)?;
    let app = api::create_router_with_security(db, SecurityConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Slot journal listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = JournalConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => {
            serve(&config, port.unwrap_or(config.port)).await?;
        }
        Some(Commands::Seed) => {
            let db = open_database(&config)?;
            let created = seed::seed_default_concepts(&db)?;
            println!("Created {} concept(s).", created);
        }
        Some(Commands::Status) => {
            let client = config.client();
            match client.health().await {
                Ok(health) => println!("{}: {}", client.base_url(), health.status),
                Err(e) => {
                    println!("{}: unreachable ({})", client.base_url(), e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Show { date }) => {
            let day = config.client().get_day(date).await?;
            println!(
                "{} [{}] {}",
                day.journal.date, day.journal.session, day.journal.symbol
            );
            for slot in &day.slots {
                println!("{}", slot.label);
                for item in &slot.items {
                    if item.note.is_empty() {
                        println!("  {}. {}", item.position, item.concept_name);
                    } else {
                        println!("  {}. {} - {}", item.position, item.concept_name, item.note);
                    }
                }
            }
        }
        None => serve(&config, config.port).await?,
    }

    Ok(())
}
