use clap::{Parser, Subcommand, ValueEnum};
use reviewstore::schema;
use reviewstore::{Database, RecordKind, Serializer, StoreConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reviewstore")]
#[command(about = "Inspect the customers/items/reviews store")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Database path, overrides the configured one
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the tables if they do not exist
    Init,

    /// Print serialized records as JSON
    Dump {
        #[arg(value_enum)]
        kind: Kind,
    },

    /// Print the generated DDL
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Customers,
    Items,
    Reviews,
}

impl From<Kind> for RecordKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Customers => RecordKind::Customer,
            Kind::Items => RecordKind::Item,
            Kind::Reviews => RecordKind::Review,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match StoreConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.database.clone() {
        config.database.path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Schema => {
            println!("{}", schema::schema_sql());
        }
        Commands::Init => {
            let db = Database::open(&config.database)?;
            db.create_schema().await?;
            info!(path = %config.database.path, "Store initialised");
        }
        Commands::Dump { kind } => {
            let db = Database::open(&config.database)?;
            let snapshot = db.load_snapshot().await?;
            let records = Serializer::new(&snapshot).serialize_all(kind.into())?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
