use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use decorhub::api::Credentials;
use decorhub::cache::{CacheStorage, SqliteStorage};
use decorhub::app::App;
use decorhub::client::DecorClient;
use decorhub::config::Config;
use decorhub::guard::RouteGuard;
use decorhub::logging;
use decorhub::progress::{ActivityIndicator, NoProgress};
use decorhub::resources::account::LoginRequest;
use decorhub::routes::HOME;
use decorhub::session::{Session, SessionStore};
use decorhub::ui::view::Services;

#[derive(Parser, Debug)]
#[command(name = "decorhub")]
#[command(about = "A terminal client for the decoration services marketplace")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/decorhub/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Page to open first, e.g. /orders
  #[arg(short, long)]
  route: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and store the session
  Login {
    #[arg(short, long)]
    email: String,
  },
  /// Forget the stored session
  Logout,
  /// Show the stored session and its role
  Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = logging::init()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;
  let sessions = SessionStore::open()?;

  match args.command {
    Some(Command::Login { email }) => login(&config, &sessions, email).await,
    Some(Command::Logout) => {
      let cache = if config.cache.persist {
        Some(SqliteStorage::open()?)
      } else {
        None
      };
      sessions.sign_out(cache.as_ref().map(|c| c as &dyn CacheStorage))?;
      info!("signed out");
      println!("Signed out.");
      Ok(())
    }
    Some(Command::Whoami) => whoami(&config, &sessions),
    None => run_tui(config, &sessions, args.route).await,
  }
}

async fn login(config: &Config, sessions: &SessionStore, email: String) -> Result<()> {
  let password = rpassword::prompt_password(format!("Password for {email}: "))?;
  let client = DecorClient::from_config(config, Credentials::new(None), Arc::new(NoProgress))?;
  let token = client
    .login(&LoginRequest {
      email: email.clone(),
      password,
    })
    .await?;
  sessions.save(&Session::new(token, Some(email.clone())))?;
  info!(email = %email, "signed in");
  println!("Signed in as {email}.");
  Ok(())
}

fn whoami(config: &Config, sessions: &SessionStore) -> Result<()> {
  let session = sessions.load().ok_or_else(|| eyre!("Not signed in. Run `decorhub login`."))?;
  let secret = Config::jwt_secret().ok();
  let guard = RouteGuard::new(&config.guard, secret.as_deref());

  println!("Email:     {}", session.email.as_deref().unwrap_or("-"));
  println!("Signed in: {}", session.signed_in_at.format("%Y-%m-%d %H:%M UTC"));
  match guard.role_of(&session.token) {
    Some(role) => println!("Role:      {role}"),
    None if secret.is_none() => println!("Role:      unknown (token secret not set)"),
    None => println!("Role:      none (token not verified)"),
  }
  Ok(())
}

async fn run_tui(config: Config, sessions: &SessionStore, route: Option<String>) -> Result<()> {
  let session = sessions.load();
  let secret = Config::jwt_secret().ok();
  if secret.is_none() {
    warn!("token secret not set, guarded pages will redirect to sign in");
  }
  let guard = RouteGuard::new(&config.guard, secret.as_deref());

  let activity = Arc::new(ActivityIndicator::new());
  let signed_in = session.is_some();
  let credentials = Credentials::new(session.map(|s| s.token));
  let client = DecorClient::from_config(&config, credentials, activity.clone())?;
  if !signed_in {
    // A persisted cache may still hold an earlier account's reads
    client.cache().clear()?;
  }

  let services = Services {
    client,
    config: Arc::new(config),
  };
  let start = route.unwrap_or_else(|| HOME.to_string());
  let mut app = App::new(services, guard, activity, &start);
  app.run().await
}
