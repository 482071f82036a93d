use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

use portal::auth::{AuthError, AuthState};
use portal::config::{ConfigError, PortalConfig};
use portal::net::{ApiClient, ApiError};
use portal::router::{Navigation, NavigationError, Navigator, RouteTable, navigation_channel};
use portal::storage::{FileStore, MemoryStore, TokenStore};
use portal::stores::{MemberStatus, ProfileStore, ProfileUpdate, ServicesStore, StoreState};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("login rejected: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("{store} request failed: {message}")]
    Store { store: &'static str, message: String },
    #[error("session expired; now at {0}")]
    SessionExpired(String),
    #[error("nothing to update; pass at least one field")]
    EmptyUpdate,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Admin/member portal session and API CLI")]
struct Cli {
    /// Overrides `PORTAL_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `PORTAL_STATE_DIR`.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a bearer token and start a session.
    Login {
        #[arg(long, env = "PORTAL_TOKEN")]
        token: String,
    },
    Logout,
    /// Show the current session.
    Status,
    /// Resolve a path through the route guard.
    Navigate { path: String },
    /// List the route table.
    Routes,
    Profile(ProfileCommand),
    Services(ServicesCommand),
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update(ProfileFields),
}

#[derive(Args, Debug)]
struct ProfileFields {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    date_of_birth: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    disability_type: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    contact_no: Option<String>,
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    avatar: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Active,
    Inactive,
}

impl From<StatusArg> for MemberStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Active => Self::Active,
            StatusArg::Inactive => Self::Inactive,
        }
    }
}

impl From<ProfileFields> for ProfileUpdate {
    fn from(f: ProfileFields) -> Self {
        Self {
            full_name: f.full_name,
            date_of_birth: f.date_of_birth,
            gender: f.gender,
            disability_type: f.disability_type,
            address: f.address,
            contact_no: f.contact_no,
            status: f.status.map(MemberStatus::from),
            email: f.email,
            avatar: f.avatar,
        }
    }
}

#[derive(Args, Debug)]
struct ServicesCommand {
    #[command(subcommand)]
    command: ServicesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ServicesSubcommand {
    List {
        /// Only services currently offered.
        #[arg(long)]
        active: bool,
    },
}

/// Everything one CLI invocation needs, wired the way the app wires it.
struct Portal {
    auth: Arc<AuthState>,
    navigator: Navigator,
    api: Arc<ApiClient>,
}

impl Portal {
    fn build(config: &PortalConfig) -> Result<Self, CliError> {
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()), Arc::new(FileStore::in_dir(&config.state_dir)));
        let auth = AuthState::shared(tokens);
        let (signal_tx, signal_rx) = navigation_channel();
        let navigator = Navigator::new(RouteTable::portal(), auth.clone()).with_signals(signal_rx);
        let api = ApiClient::from_config(config, auth.clone())?.with_signals(signal_tx);
        Ok(Self { auth, navigator, api: Arc::new(api) })
    }

    /// Apply queued 401 redirects. Errors if one fired.
    fn drain_signals(&mut self) -> Result<(), CliError> {
        match self.navigator.apply_pending_signals() {
            Some(Ok(nav)) => Err(CliError::SessionExpired(nav.route.path)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("ignoring unreadable .env: {e}");
    }
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env()?;
    if let Some(raw) = cli.base_url.as_deref() {
        config = config.with_api_base_url(raw)?;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    let mut portal = Portal::build(&config)?;
    match cli.command {
        Command::Login { token } => run_login(&mut portal, &token),
        Command::Logout => {
            portal.auth.logout();
            println!("signed out");
            Ok(())
        }
        Command::Status => run_status(&portal),
        Command::Navigate { path } => {
            let nav = portal.navigator.navigate(&path)?;
            print_navigation(&nav)
        }
        Command::Routes => run_routes(&portal),
        Command::Profile(profile) => run_profile(&mut portal, profile).await,
        Command::Services(services) => run_services(&mut portal, services).await,
    }
}

fn run_login(portal: &mut Portal, token: &str) -> Result<(), CliError> {
    let claims = portal.auth.login(token)?;
    tracing::info!(role = claims.role_name().unwrap_or("none"), "signed in");
    let home = portal.auth.home_path().unwrap_or("/");
    let nav = portal.navigator.navigate(home)?;
    print_navigation(&nav)
}

fn run_status(portal: &Portal) -> Result<(), CliError> {
    let session = portal.auth.session();
    let status = json!({
        "authenticated": session.is_authenticated(),
        "role": session.role().map(|r| r.as_str()),
        "home": portal.auth.home_path(),
        "claims": session.user(),
    });
    print_json(&status)
}

fn run_routes(portal: &Portal) -> Result<(), CliError> {
    let routes: Vec<Value> = portal
        .navigator
        .table()
        .routes()
        .iter()
        .map(|route| {
            json!({
                "path": route.path,
                "name": route.name,
                "requires_auth": route.meta.requires_auth,
                "role": route.meta.role.map(|r| r.as_str()),
                "guest_only": route.meta.guest_only,
            })
        })
        .collect();
    print_json(&Value::Array(routes))
}

async fn run_profile(portal: &mut Portal, profile: ProfileCommand) -> Result<(), CliError> {
    let store = ProfileStore::new(portal.api.clone());
    store.fetch().await;
    portal.drain_signals()?;
    check_store("profile", &store.state())?;

    if let ProfileSubcommand::Update(fields) = profile.command {
        let changes = ProfileUpdate::from(fields);
        if changes.is_empty() {
            return Err(CliError::EmptyUpdate);
        }
        store.update(changes).await;
        portal.drain_signals()?;
        check_store("profile", &store.state())?;
    }

    let Some(member) = store.profile() else {
        return print_json(&Value::Null);
    };
    let mut rendered = serde_json::to_value(&member)?;
    rendered["age"] = json!(member.age());
    rendered["avatar_url"] = json!(member.avatar_url());
    print_json(&rendered)
}

async fn run_services(portal: &mut Portal, services: ServicesCommand) -> Result<(), CliError> {
    let ServicesSubcommand::List { active } = services.command;
    let store = ServicesStore::new(portal.api.clone());
    store.fetch().await;
    portal.drain_signals()?;
    check_store("services", &store.state())?;

    let listed = if active { store.active_services() } else { store.services() };
    print_json(&serde_json::to_value(listed)?)
}

fn check_store<T>(store: &'static str, state: &StoreState<T>) -> Result<(), CliError> {
    if state.has_error() {
        return Err(CliError::Store { store, message: state.error.clone() });
    }
    Ok(())
}

fn print_navigation(nav: &Navigation) -> Result<(), CliError> {
    print_json(&json!({
        "path": nav.route.path,
        "name": nav.route.name,
        "view": nav.route.view,
        "redirected_from": nav.redirected_from,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
