use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub supabase: SupabaseConfig,
  #[serde(default)]
  pub companion: CompanionConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
  /// Project URL, e.g. https://abcd.supabase.co
  pub url: String,
  /// Account used to sign in; the password comes from the environment
  pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanionConfig {
  /// Quiet period after the last keystroke before a search is sent
  #[serde(default = "default_debounce_ms")]
  pub search_debounce_ms: u64,
  /// Transport timeout for every remote request
  #[serde(default = "default_timeout_secs")]
  pub request_timeout_secs: u64,
}

impl Default for CompanionConfig {
  fn default() -> Self {
    Self {
      search_debounce_ms: default_debounce_ms(),
      request_timeout_secs: default_timeout_secs(),
    }
  }
}

impl CompanionConfig {
  pub fn search_debounce(&self) -> Duration {
    Duration::from_millis(self.search_debounce_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

fn default_debounce_ms() -> u64 {
  300
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Filter directive, e.g. "info" or "clinic_companion=debug"
  pub level: Option<String>,
  /// Directory for log files (default: $XDG_DATA_HOME/clinic-companion/logs)
  pub directory: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./clinic-companion.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/clinic-companion/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/clinic-companion/config.yaml\n\
                 See config.example.yaml for the format, or run with --demo."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("clinic-companion.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("clinic-companion").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.supabase.url.trim().is_empty() {
      return Err(eyre!("supabase.url must not be empty"));
    }
    Ok(config)
  }

  /// Get the Supabase anon key from environment variables.
  ///
  /// Checks CLINIC_SUPABASE_ANON_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_anon_key() -> Result<String> {
    std::env::var("CLINIC_SUPABASE_ANON_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .map_err(|_| {
        eyre!(
          "Supabase anon key not found. Set CLINIC_SUPABASE_ANON_KEY or SUPABASE_ANON_KEY environment variable."
        )
      })
  }

  /// Get the account password from environment variables.
  ///
  /// Checks CLINIC_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("CLINIC_PASSWORD")
      .map_err(|_| eyre!("Account password not found. Set CLINIC_PASSWORD environment variable."))
  }
}
