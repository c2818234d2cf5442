use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use migrator::features::accounts::{AccountStore, AccountSummary};
use migrator::features::migration::{
    CompositeEventHandler, LoggingEventHandler, MigrationEvent, MigrationEventHandler,
    MigrationOrchestrator,
};
use migrator::services::client::{
    ClientError, PlatformClient, Region, VenuesQueryOverrides, VenuesQueryResponse,
};
use migrator::services::config::{get_global_config, init_global_config, MigrationConfig};
use migrator::services::errors::{ErrorSeverity, MigrationError};
use migrator::services::storage::JsonFileBackend;

/// Move tenants between accounts of the network management platform
#[derive(Parser)]
#[command(name = "tenant-migrate")]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Saved account collection (overrides config)
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Log verbosity when RUST_LOG is unset (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage saved accounts
    #[command(subcommand)]
    Accounts(AccountCommands),
    /// Migrate tenants from the source account to the target account
    Migrate {
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        /// Tenant ids to migrate, processed in order
        #[arg(required = true)]
        tenant_ids: Vec<String>,
        /// Print a line per finished tenant to stderr
        #[arg(long)]
        progress: bool,
    },
    /// Query venues visible to an account
    Venues(QueryArgs),
    /// Query access points visible to an account
    Aps(QueryArgs),
    /// Query Wi-Fi networks visible to an account
    WifiNetworks(QueryArgs),
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Validate credentials and save a new account
    Add {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        client_secret: String,
        /// EU, ASIA or NA
        #[arg(long)]
        region: Region,
    },
    /// List saved accounts
    List {
        #[arg(long)]
        region: Option<Region>,
    },
    /// Delete a saved account
    Delete { account_id: String },
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long)]
    account: String,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Clone, Copy)]
enum QueryKind {
    Venues,
    Aps,
    WifiNetworks,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<MigrationConfig> {
    let config = match path {
        Some(path) => MigrationConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MigrationConfig::default(),
    };
    init_global_config(config);
    Ok(get_global_config())
}

fn accounts_path(cli: &Cli, config: &MigrationConfig) -> Result<PathBuf> {
    if let Some(path) = cli.accounts.clone().or_else(|| config.storage.accounts_path.clone()) {
        return Ok(path);
    }
    let data_dir = dirs::data_dir().context("no platform data directory; pass --accounts")?;
    Ok(data_dir.join("tenant-migration").join("accounts.json"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_query(store: &AccountStore, kind: QueryKind, args: QueryArgs) -> Result<VenuesQueryResponse> {
    let account = store
        .get(&args.account)
        .await?
        .with_context(|| format!("unknown account {}", args.account))?;
    let client = store.client();
    let api_base = client.endpoints(account.region)?.api_base;
    let token = client
        .fetch_token(
            &account.tenant_id,
            &account.client_id,
            &account.client_secret,
            account.region,
        )
        .await?;

    let overrides = VenuesQueryOverrides {
        page: args.page,
        page_size: args.page_size,
        search_string: args.search,
        ..Default::default()
    };

    let response = match kind {
        QueryKind::Venues => {
            client
                .query_venues(&api_base, &account.tenant_id, &token, overrides)
                .await?
        }
        QueryKind::Aps => {
            client
                .query_aps(&api_base, &account.tenant_id, &token, overrides)
                .await?
        }
        QueryKind::WifiNetworks => {
            client
                .query_wifi_networks(&api_base, &account.tenant_id, &token, overrides)
                .await?
        }
    };
    Ok(response)
}

/// Prints one line per finished tenant to stderr
struct ProgressPrinter {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ProgressPrinter {
    fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }

    fn advance(&self) -> (usize, usize) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        (done, self.total.load(Ordering::SeqCst))
    }
}

impl MigrationEventHandler for ProgressPrinter {
    fn handle_event(&self, event: MigrationEvent) {
        match event {
            MigrationEvent::Started { tenant_count, .. } => {
                self.total.store(tenant_count, Ordering::SeqCst);
            }
            MigrationEvent::TenantMigrated { tenant_id, .. } => {
                let (done, total) = self.advance();
                eprintln!("[{}/{}] {} migrated", done, total, tenant_id);
            }
            MigrationEvent::TenantFailed { tenant_id, message, .. } => {
                let (done, total) = self.advance();
                eprintln!("[{}/{}] {} failed: {}", done, total, tenant_id, message);
            }
            MigrationEvent::TenantStarted { .. } | MigrationEvent::Completed { .. } => {}
        }
    }
}

/// Log a failed command at the level its severity calls for
fn report_error(e: &anyhow::Error) {
    let classified = e.chain().find_map(|cause| {
        if let Some(migration_error) = cause.downcast_ref::<MigrationError>() {
            return Some((migration_error.severity(), migration_error.is_temporary()));
        }
        cause.downcast_ref::<ClientError>().map(|client_error| {
            let migration_error = MigrationError::from(client_error.clone());
            (migration_error.severity(), migration_error.is_temporary())
        })
    });
    let Some((severity, temporary)) = classified else {
        tracing::error!("{:#}", e);
        return;
    };

    match severity {
        ErrorSeverity::Critical | ErrorSeverity::High => tracing::error!("{:#}", e),
        ErrorSeverity::Medium => tracing::warn!("{:#}", e),
        ErrorSeverity::Low => tracing::info!("{:#}", e),
    }
    if temporary {
        tracing::info!("The failure looks temporary; running the command again may succeed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = run(cli).await;
    if let Err(e) = &outcome {
        report_error(e);
    }
    outcome
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let path = accounts_path(&cli, &config)?;
    tracing::debug!("Using account collection at {}", path.display());

    let client = PlatformClient::from_config(&config)?;
    let store = Arc::new(AccountStore::new(Arc::new(JsonFileBackend::new(path)), client));

    match cli.command {
        Commands::Accounts(AccountCommands::Add {
            tenant_id,
            client_id,
            client_secret,
            region,
        }) => {
            let account = store.add(&tenant_id, &client_id, &client_secret, region).await?;
            print_json(&AccountSummary::from(&account))?;
        }
        Commands::Accounts(AccountCommands::List { region }) => {
            let accounts = match region {
                Some(region) => store.list(region).await?,
                None => store.list_all().await?,
            };
            let summaries: Vec<AccountSummary> = accounts.iter().map(AccountSummary::from).collect();
            print_json(&summaries)?;
        }
        Commands::Accounts(AccountCommands::Delete { account_id }) => {
            let deleted = store.delete(&account_id).await?;
            print_json(&serde_json::json!({ "accountId": account_id, "deleted": deleted }))?;
        }
        Commands::Migrate {
            source,
            target,
            tenant_ids,
            progress,
        } => {
            let mut events = CompositeEventHandler::new();
            events.add_handler(LoggingEventHandler);
            if progress {
                events.add_handler(ProgressPrinter::new());
            }
            let orchestrator =
                MigrationOrchestrator::new(store.clone(), &config).with_event_handler(Arc::new(events));
            let result = orchestrator.migrate(&source, &target, &tenant_ids).await?;
            print_json(&result)?;
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Venues(args) => print_json(&run_query(&store, QueryKind::Venues, args).await?)?,
        Commands::Aps(args) => print_json(&run_query(&store, QueryKind::Aps, args).await?)?,
        Commands::WifiNetworks(args) => {
            print_json(&run_query(&store, QueryKind::WifiNetworks, args).await?)?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use migrator::features::accounts::Account;
    use migrator::services::client::ApiEndpoints;
    use migrator::services::storage::InMemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_only_query_leaves_account_file_alone() {
        let server = MockServer::start();
        let token = server.mock(|when, then| {
            when.method(POST).path("/oauth2/token/tenant-aaaa-0001");
            then.status(200).json_body(json!({"access_token": "tok-read"}));
        });
        let venues = server.mock(|when, then| {
            when.method(POST)
                .path("/venues/query")
                .header("x-rks-tenantid", "tenant-aaaa-0001")
                .header("authorization", "Bearer tok-read");
            then.status(200).json_body(json!({"data": [{"id": "v1"}, {"id": "v2"}], "totalCount": 2}));
        });

        let mut config = MigrationConfig::default();
        config.network.endpoint_override = Some(ApiEndpoints {
            auth_base: server.base_url(),
            api_base: server.base_url(),
        });
        let account = Account {
            id: "acct-1".to_string(),
            name: "Account tenant-a...".to_string(),
            tenant_id: "tenant-aaaa-0001".to_string(),
            client_id: "client-0001".to_string(),
            client_secret: "secret-0001".to_string(),
            session_token: Some("tok-stale".to_string()),
            region: Region::Europe,
        };
        let backend = Arc::new(InMemoryBackend::with_accounts(&[account]).unwrap());
        let before = backend.document();
        let store = AccountStore::new(backend.clone(), PlatformClient::from_config(&config).unwrap());

        let args = QueryArgs {
            account: "acct-1".to_string(),
            page: None,
            page_size: None,
            search: None,
        };
        let response = run_query(&store, QueryKind::Venues, args).await.unwrap();

        assert_eq!(response.total_count, 2);
        assert_eq!(token.calls(), 1);
        assert_eq!(venues.calls(), 1);
        assert_eq!(backend.save_count(), 0);
        assert_eq!(backend.document(), before);
    }
}
