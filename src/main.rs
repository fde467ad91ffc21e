use chrono::Utc;
use clap::Parser;
use clinic_companion::app::{App, Credentials};
use clinic_companion::companion::Companion;
use clinic_companion::config::Config;
use clinic_companion::logging;
use clinic_companion::remote::{
  http_client, AuthProvider, InMemoryGateway, RemoteGateway, StaticAuth, SupabaseAuth,
  SupabaseGateway,
};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "clinic-companion")]
#[command(about = "Browse a clinic's patients and visits from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/clinic-companion/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Browse a built-in demo roster instead of the remote backend
  #[arg(long)]
  demo: bool,

  /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
  #[arg(long)]
  log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Demo mode runs without a config file
  let config = match Config::load(args.config.as_deref()) {
    Ok(config) => Some(config),
    Err(_) if args.demo && args.config.is_none() => None,
    Err(e) => return Err(e),
  };

  let logging_config = config
    .as_ref()
    .map(|c| c.logging.clone())
    .unwrap_or_default();
  let log_dir = logging_config
    .directory
    .clone()
    .or_else(logging::default_directory)
    .ok_or_else(|| eyre!("No data directory for logs; set logging.directory"))?;
  let level = args.log_level.as_deref().or(logging_config.level.as_deref());
  let _guard = logging::init(&log_dir, level)?;

  let settings = config
    .as_ref()
    .map(|c| c.companion.clone())
    .unwrap_or_default();

  let (gateway, auth, credentials, backend_url): (
    Arc<dyn RemoteGateway>,
    Arc<dyn AuthProvider>,
    Option<Credentials>,
    String,
  ) = match config {
    Some(config) if !args.demo => {
      let http = http_client(settings.request_timeout())?;
      let anon_key = Config::get_anon_key()?;
      let auth: Arc<dyn AuthProvider> = Arc::new(SupabaseAuth::new(
        http.clone(),
        &config.supabase.url,
        anon_key.clone(),
      )?);
      let gateway = SupabaseGateway::new(http, &config.supabase.url, anon_key, Arc::clone(&auth))?;

      let credentials = match Config::get_password() {
        Ok(password) => Some(Credentials {
          email: config.supabase.email.clone(),
          password,
        }),
        Err(e) => {
          warn!(error = %e, "no password configured; sign-in disabled");
          None
        }
      };

      info!(url = %config.supabase.url, "using remote backend");
      (
        Arc::new(gateway) as Arc<dyn RemoteGateway>,
        auth,
        credentials,
        config.supabase.url,
      )
    }
    _ => {
      info!("using demo roster");
      (
        Arc::new(InMemoryGateway::demo(Utc::now())) as Arc<dyn RemoteGateway>,
        Arc::new(StaticAuth::signed_in("demo@clinic.local")) as Arc<dyn AuthProvider>,
        None,
        "demo".to_string(),
      )
    }
  };

  let companion = Companion::new(gateway, settings.search_debounce());
  let mut app = App::new(companion, auth, credentials, backend_url);
  app.run().await?;

  Ok(())
}
