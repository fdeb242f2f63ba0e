use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clinic_core::entities::{BillingMode, EpisodeStatus};
use clinic_core::{
    ApiClient, ClientConfig, ClinicStores, DateRange, Envelope, LifecycleStatus, ListQuery,
    ListStore, PageRequest, Resource,
};
use clinic_types::{NonEmptyText, RecordId};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic management API client")]
struct Cli {
    /// API base URL (overrides CLINIC_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// File holding the session token between runs (overrides CLINIC_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Entity {
    Patients,
    Episodes,
    Visits,
    Services,
    Staff,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login { email: String, password: String },
    /// Forget the stored session token
    Logout,
    /// Show who the stored token belongs to
    Whoami,
    /// List one page of records
    List {
        entity: Entity,
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Page size (defaults to CLINIC_PAGE_SIZE)
        #[arg(long)]
        size: Option<u32>,
        /// Only active records
        #[arg(long, conflicts_with_all = ["status", "search", "from"])]
        active: bool,
        /// Only records in this lifecycle status
        #[arg(long, conflicts_with_all = ["search", "from"])]
        status: Option<String>,
        /// Free-text search
        #[arg(long, conflicts_with = "from")]
        search: Option<String>,
        /// Range start (YYYY-MM-DD); ignored without --to
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Range end (YYYY-MM-DD); ignored without --from
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Count records
    Count {
        entity: Entity,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Create a record from a JSON payload
    Create { entity: Entity, json: String },
    /// Replace a record from a JSON payload
    Update {
        entity: Entity,
        id: String,
        json: String,
    },
    /// Re-enable a record
    Enable { entity: Entity, id: String },
    /// Disable a record
    Disable { entity: Entity, id: String },
    /// Visit lifecycle transitions
    Visit {
        #[command(subcommand)]
        action: VisitAction,
    },
    /// Episode transitions
    Episode {
        #[command(subcommand)]
        action: EpisodeAction,
    },
    /// Visit counts per status
    Dashboard {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum VisitAction {
    Start { id: String },
    Complete { id: String },
    Cancel { id: String },
}

#[derive(Subcommand)]
enum EpisodeAction {
    /// Move an episode to another status (OPEN, ON_HOLD, CLOSED, CANCELLED)
    Status { id: String, status: String },
    /// Change the episode type
    Type { id: String, episode_type: String },
    /// Change the billing mode (PER_VISIT, PACKAGE, INSURANCE)
    BillingMode { id: String, mode: String },
    /// Delete an episode
    Delete { id: String },
}

/// An operation that works the same way for every entity.
enum EntityOp {
    List {
        page: PageRequest,
        active: bool,
        status: Option<String>,
        search: Option<String>,
        range: DateRange,
    },
    Count {
        status: Option<String>,
        range: DateRange,
    },
    Create(String),
    Update(RecordId, String),
    Enable(RecordId),
    Disable(RecordId),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run one command. `Ok(false)` means the API answered with an error envelope.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(true);
    };

    let config = resolve_config(cli.base_url, cli.token_file)?;
    tracing::debug!(
        base_url = %config.base_url(),
        token_file = ?config.token_file(),
        "resolved configuration"
    );
    let client = ApiClient::from_config(&config)?;
    let size = config.page_size();
    let stores = ClinicStores::new(client.clone(), size);

    match command {
        Commands::Login { email, password } => {
            let env = stores.auth().login(&email, &password).await;
            if config.token_file().is_none() && env.is_success() {
                eprintln!("Note: no token file configured; the session ends with this process");
            }
            Ok(report(&env))
        }
        Commands::Logout => {
            stores.auth().logout();
            println!("Logged out");
            Ok(true)
        }
        Commands::Whoami => {
            let session = client.session();
            match session.claims() {
                Some(claims) => {
                    println!("User: {}", claims.sub);
                    println!("Role: {}", claims.role.as_deref().unwrap_or("-"));
                    match claims.expires_at() {
                        Some(exp) => println!("Expires: {exp}"),
                        None => println!("Expires: never"),
                    }
                    println!("Authenticated: {}", session.is_authenticated());
                }
                None => println!("Not logged in"),
            }
            Ok(true)
        }
        Commands::List {
            entity,
            page,
            size: page_size,
            active,
            status,
            search,
            from,
            to,
        } => {
            let op = EntityOp::List {
                page: PageRequest::new(page, page_size.unwrap_or(size)),
                active,
                status,
                search,
                range: DateRange::new(from, to),
            };
            dispatch(&stores, entity, op).await
        }
        Commands::Count {
            entity,
            status,
            from,
            to,
        } => {
            let op = EntityOp::Count {
                status,
                range: DateRange::new(from, to),
            };
            dispatch(&stores, entity, op).await
        }
        Commands::Create { entity, json } => dispatch(&stores, entity, EntityOp::Create(json)).await,
        Commands::Update { entity, id, json } => {
            dispatch(&stores, entity, EntityOp::Update(RecordId::parse(&id)?, json)).await
        }
        Commands::Enable { entity, id } => {
            dispatch(&stores, entity, EntityOp::Enable(RecordId::parse(&id)?)).await
        }
        Commands::Disable { entity, id } => {
            dispatch(&stores, entity, EntityOp::Disable(RecordId::parse(&id)?)).await
        }
        Commands::Visit { action } => {
            let env = match action {
                VisitAction::Start { id } => stores.visits.start(&RecordId::parse(&id)?).await,
                VisitAction::Complete { id } => {
                    stores.visits.complete(&RecordId::parse(&id)?).await
                }
                VisitAction::Cancel { id } => stores.visits.cancel(&RecordId::parse(&id)?).await,
            };
            Ok(report(&env))
        }
        Commands::Episode { action } => {
            let episodes = &stores.episodes;
            let env = match action {
                EpisodeAction::Status { id, status } => {
                    let status = EpisodeStatus::parse_wire(&status)
                        .ok_or_else(|| anyhow::anyhow!("unknown episode status '{status}'"))?;
                    episodes.change_status(&RecordId::parse(&id)?, status).await
                }
                EpisodeAction::Type { id, episode_type } => {
                    let episode_type = NonEmptyText::new(&episode_type)?;
                    episodes
                        .change_type(&RecordId::parse(&id)?, &episode_type)
                        .await
                }
                EpisodeAction::BillingMode { id, mode } => {
                    let mode = BillingMode::parse_wire(&mode)
                        .ok_or_else(|| anyhow::anyhow!("unknown billing mode '{mode}'"))?;
                    episodes
                        .change_billing_mode(&RecordId::parse(&id)?, mode)
                        .await
                }
                EpisodeAction::Delete { id } => episodes.delete(&RecordId::parse(&id)?).await,
            };
            Ok(report(&env))
        }
        Commands::Dashboard { from, to } => {
            let range = DateRange::new(from, to);
            if !range.is_filtering() && (from.is_some() || to.is_some()) {
                eprintln!("Note: both --from and --to are needed for a date filter; counting all visits");
            }
            let counts = stores.dashboard().refresh(range).await;
            for (status, count) in &counts {
                println!("{:<10} {count}", status.as_wire());
            }
            Ok(true)
        }
    }
}

fn resolve_config(
    base_url: Option<String>,
    token_file: Option<PathBuf>,
) -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::from_env()?;
    if base_url.is_none() && token_file.is_none() {
        return Ok(config);
    }
    let base_url = base_url.unwrap_or_else(|| config.base_url().to_string());
    let token_file = token_file.or_else(|| config.token_file().map(PathBuf::from));
    Ok(ClientConfig::new(&base_url, token_file, config.page_size())?)
}

async fn dispatch(stores: &ClinicStores, entity: Entity, op: EntityOp) -> anyhow::Result<bool> {
    match entity {
        Entity::Patients => run_entity(&stores.patients, op).await,
        Entity::Episodes => run_entity(&stores.episodes, op).await,
        Entity::Visits => run_entity(&stores.visits, op).await,
        Entity::Services => run_entity(&stores.services, op).await,
        Entity::Staff => run_entity(&stores.staff, op).await,
    }
}

async fn run_entity<R: Resource>(store: &ListStore<R>, op: EntityOp) -> anyhow::Result<bool> {
    match op {
        EntityOp::List {
            page,
            active,
            status,
            search,
            range,
        } => {
            let query = if active {
                ListQuery::Active
            } else if let Some(status) = status {
                ListQuery::ByStatus(parse_status::<R>(&status)?)
            } else if let Some(search) = search {
                ListQuery::from_search_input(&search)
            } else if range.is_filtering() {
                ListQuery::Range(range)
            } else {
                ListQuery::All
            };

            let env = store.fetch(query, page).await;
            if !env.is_success() {
                return Ok(report(&env));
            }

            let state = store.snapshot();
            if state.items.is_empty() {
                println!("No {} found.", R::ENDPOINTS.name);
            }
            for item in &state.items {
                let status = item.status().map(|s| s.as_wire()).unwrap_or("-");
                let flag = if item.is_active() { "" } else { " (disabled)" };
                println!("{}\t{status}\t{}{flag}", item.id(), item.label());
            }
            println!(
                "Page {} of {} ({} total)",
                state.current_page + 1,
                state.total_pages.max(1),
                state.total_items
            );
            Ok(true)
        }
        EntityOp::Count { status, range } => {
            let status = status.as_deref().map(parse_status::<R>).transpose()?;
            let env = store.count(status, &range).await;
            match env.data {
                Some(count) if env.is_success() => {
                    println!("{count}");
                    Ok(true)
                }
                _ => Ok(report(&env)),
            }
        }
        EntityOp::Create(json) => {
            let payload: R::Payload = serde_json::from_str(&json)?;
            let env = store.create(&payload).await;
            if let Some(record) = &env.data {
                println!("{}\t{}", record.id(), record.label());
            }
            Ok(report(&env))
        }
        EntityOp::Update(id, json) => {
            let payload: R::Payload = serde_json::from_str(&json)?;
            Ok(report(&store.update(&id, &payload).await))
        }
        EntityOp::Enable(id) => Ok(report(&store.enable(&id).await)),
        EntityOp::Disable(id) => Ok(report(&store.disable(&id).await)),
    }
}

fn parse_status<R: Resource>(raw: &str) -> anyhow::Result<R::Status> {
    R::Status::parse_wire(raw).ok_or_else(|| {
        let known: Vec<&str> = R::Status::ALL.iter().map(|s| s.as_wire()).collect();
        anyhow::anyhow!(
            "unknown {} status '{raw}' (expected one of {})",
            R::ENDPOINTS.name,
            known.join(", ")
        )
    })
}

/// Print the envelope the way the toast area would show it.
fn report<T>(env: &Envelope<T>) -> bool {
    let line = format!("[{}] {} ({})", env.severity, env.message, env.status);
    if env.is_success() {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
    env.is_success()
}
