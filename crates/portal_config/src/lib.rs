// --- File: crates/portal_config/src/lib.rs ---
//! Layered configuration: `config/default`, `config/{RUN_ENV}`, then
//! `PORTAL__*` environment variables. Values set to `secret_from_env` are
//! replaced from the environment after loading, or cleared when the variable
//! is missing.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod models;
pub use models::*;

const SECRET_MARKER: &str = "secret_from_env";

/// Loads the application configuration from the workspace `config/` directory.
///
/// `PORTAL_CONFIG_DIR` points the loader at another directory, `RUN_ENV`
/// selects the environment overlay (default `debug`) and `PREFIX` the
/// environment variable prefix (default `PORTAL`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "PORTAL".to_string());

    load_config_from(&config_dir(), &run_env, &prefix)
}

/// Loads configuration from an explicit directory. Used by `load_config` and by tests.
pub fn load_config_from(dir: &Path, run_env: &str, prefix: &str) -> Result<AppConfig, ConfigError> {
    let default_path = dir.join("default");
    let env_path = dir.join(run_env);
    debug!(
        "Loading config from {} (overlay {})",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("PORTAL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_config = PathBuf::from("config");
    if cwd_config.is_dir() {
        return cwd_config;
    }
    // crates/portal_config -> workspace root
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(|root| root.join("config"))
        .unwrap_or(cwd_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => {
                        warn!("env var {} not found for {}, leaving it unset", env_key, SECRET_MARKER);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config).map_err(|e| ConfigError::Message(e.to_string()))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json).map_err(|e| ConfigError::Message(e.to_string()))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file once per process.
///
/// `DOTENV_OVERRIDE` wins over a first command line argument starting with
/// `.env`; otherwise `.env` in the working directory is used. A missing file
/// is not an error.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
