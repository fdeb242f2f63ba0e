use chrono::{Days, Utc};
use clinic_core::store::LifecycleStatus;
use clinic_core::{ApiClient, ClientConfig, ClinicStores, DateRange, PageRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the login email for an unattended run.
const ENV_EMAIL: &str = "CLINIC_EMAIL";
/// Environment variable holding the login password for an unattended run.
const ENV_PASSWORD: &str = "CLINIC_PASSWORD";
/// Days of visits the dashboard summary covers.
const DASHBOARD_DAYS: u64 = 30;

/// Main entry point for the clinic client
///
/// Resolves configuration, logs in when credentials are supplied, then loads the first page
/// of every entity and the visit dashboard for the last thirty days, logging a summary of
/// each. Useful as a smoke check against a running backend.
///
/// # Environment Variables
/// - `CLINIC_API_BASE_URL`: API base URL (default: "http://localhost:8080/api/")
/// - `CLINIC_TOKEN_FILE`: File persisting the session token (default: in memory)
/// - `CLINIC_PAGE_SIZE`: Page size for list requests (default: 10)
/// - `CLINIC_EMAIL` / `CLINIC_PASSWORD`: Credentials to log in with (optional)
///
/// # Returns
/// * `Ok(())` - If configuration resolves; API failures are logged, not returned
/// * `Err(anyhow::Error)` - If configuration or client construction fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url(), page_size = config.page_size(), "starting");

    let client = ApiClient::from_config(&config)?;
    let stores = ClinicStores::new(client.clone(), config.page_size());

    if let (Ok(email), Ok(password)) = (std::env::var(ENV_EMAIL), std::env::var(ENV_PASSWORD)) {
        let env = stores.auth().login(&email, &password).await;
        if !env.is_success() {
            tracing::error!(status = env.status, message = %env.message, "login failed");
            return Ok(());
        }
    }

    if !client.session().is_authenticated() {
        tracing::warn!("no valid session; requests will likely be rejected");
    }

    let page = PageRequest::first(config.page_size());
    let (patients, episodes, visits, services, staff) = tokio::join!(
        stores.patients.fetch_all(page),
        stores.episodes.fetch_all(page),
        stores.visits.fetch_all(page),
        stores.services.fetch_all(page),
        stores.staff.fetch_all(page),
    );
    for (name, status, total) in [
        ("patients", patients.status, stores.patients.snapshot().total_items),
        ("episodes", episodes.status, stores.episodes.snapshot().total_items),
        ("visits", visits.status, stores.visits.snapshot().total_items),
        ("services", services.status, stores.services.snapshot().total_items),
        ("staff", staff.status, stores.staff.snapshot().total_items),
    ] {
        tracing::info!(resource = name, status, total, "loaded first page");
    }

    let today = Utc::now().date_naive();
    let range = match today.checked_sub_days(Days::new(DASHBOARD_DAYS)) {
        Some(start) => DateRange::between(start, today),
        None => DateRange::default(),
    };
    let counts = stores.dashboard().refresh(range).await;
    for (status, count) in counts {
        tracing::info!(status = status.as_wire(), count, "visits");
    }

    Ok(())
}
