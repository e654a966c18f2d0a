mod prompts;
mod session;
mod vendor_cmds;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vendor_client::RestVendorStore;
use vendor_config::{AppConfig, StorageBackend};
use vendor_onboarding::{
    Field, SortKey, SortOrder, VendorDraft, VendorFilter, VendorStatus, VendorStore, Wizard,
};
use vendor_registry::LocalVendorStore;

use crate::prompts::Console;

#[derive(Debug, Parser)]
#[command(
    name = "vendor",
    version,
    about = "Onboard vendors and manage the vendor registry"
)]
struct Cli {
    /// Configuration file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config/vendor.toml")]
    config: PathBuf,
    /// Override `storage.backend` (remote or local).
    #[arg(long, global = true, value_parser = StorageBackend::parse)]
    backend: Option<StorageBackend>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a new vendor with the step-by-step wizard.
    Onboard,
    /// Re-run the wizard over an existing vendor.
    Edit {
        #[arg(value_name = "VENDOR_ID")]
        vendor_id: String,
    },
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "vendor-id")]
        sort: SortKey,
        #[arg(long)]
        desc: bool,
    },
    Show {
        #[arg(value_name = "VENDOR_ID")]
        vendor_id: String,
    },
    Delete {
        #[arg(value_name = "VENDOR_ID")]
        vendor_id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Write matching vendors as CSV (stdout when no path is given).
    Export {
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show the identifier the next vendor will receive.
    NextId,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Matches vendor id, company, contact or email (case-insensitive).
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    status: Option<VendorStatus>,
}

impl From<FilterArgs> for VendorFilter {
    fn from(args: FilterArgs) -> Self {
        VendorFilter {
            search: args.search,
            country: args.country,
            status: args.status,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)?;
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = open_store(&config).await?;

    match cli.command {
        Commands::Onboard => {
            match store.next_identifier().await {
                Ok(next) => println!("New vendor will be registered as {next}."),
                Err(err) => tracing::warn!(error = %err, "could not preview next vendor id"),
            }

            let mut draft = VendorDraft::default();
            let country = config.onboarding.default_country.trim();
            if !country.is_empty() {
                draft.set(Field::Country, country);
            }

            let mut console = Console::stdio();
            session::run(&mut console, Wizard::with_draft(draft), store.as_ref()).await?;
        }
        Commands::Edit { vendor_id } => {
            let record = store.get(&vendor_id).await?;
            let mut console = Console::stdio();
            session::run(&mut console, Wizard::edit(&record), store.as_ref()).await?;
        }
        Commands::List { filter, sort, desc } => {
            let order = if desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            vendor_cmds::run_list(store.as_ref(), &filter.into(), sort, order).await?;
        }
        Commands::Show { vendor_id } => {
            vendor_cmds::run_show(store.as_ref(), &vendor_id).await?;
        }
        Commands::Delete { vendor_id, yes } => {
            vendor_cmds::run_delete(store.as_ref(), &vendor_id, yes).await?;
        }
        Commands::Export { path, filter } => {
            vendor_cmds::run_export(store.as_ref(), &filter.into(), path.as_deref()).await?;
        }
        Commands::NextId => {
            println!("{}", store.next_identifier().await?);
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Box<dyn VendorStore>> {
    if config.uses_local_storage() {
        tracing::debug!(path = %config.storage.data_path, "using local vendor registry");
        return Ok(Box::new(LocalVendorStore::open(&config.storage.data_path).await?));
    }

    let store = RestVendorStore::from_config(&config.api)?;
    tracing::debug!(url = %store.base_url(), "using remote vendor api");
    Ok(Box::new(store))
}
