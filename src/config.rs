//! Env-driven configuration for the tool server, the CLI and the library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults are provided for convenience during development.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub comfyui_url: String,
    pub templates_dir: PathBuf,
    pub output_dir: PathBuf,
    pub api_host: String,
    pub api_port: String,
    /// Passed through to ComfyUI as `extra_data.api_key_comfy_org`.
    pub comfy_org_key: Option<String>,
    pub poll_interval: Duration,
    /// `None` polls until the backend reaches a terminal state.
    pub max_poll_attempts: Option<u32>,
    /// Directory for the rolling tool-call log; console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            comfyui_url: "http://127.0.0.1:8188".to_string(),
            templates_dir: PathBuf::from("./templates"),
            output_dir: PathBuf::from("./output"),
            api_host: "127.0.0.1".to_string(),
            api_port: "9000".to_string(),
            comfy_org_key: None,
            poll_interval: Duration::from_secs(3),
            max_poll_attempts: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Self {
        let defaults = Config::default();
        let fallback_secs = defaults.poll_interval.as_secs();
        let poll_secs = non_zero_or(
            "POLL_INTERVAL_SECS",
            parse_or("POLL_INTERVAL_SECS", fallback_secs),
            fallback_secs,
        );
        Config {
            comfyui_url: env::var("COMFYUI_URL")
                .unwrap_or(defaults.comfyui_url)
                .trim_end_matches('/')
                .to_string(),
            templates_dir: env::var("TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_dir),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: env::var("API_PORT").unwrap_or(defaults.api_port),
            comfy_org_key: env::var("COMFY_ORG").ok().filter(|k| !k.trim().is_empty()),
            poll_interval: Duration::from_secs(poll_secs),
            max_poll_attempts: env::var("MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|raw| match raw.parse::<u32>() {
                    Ok(0) | Err(_) => {
                        tracing::warn!("Invalid MAX_POLL_ATTEMPTS '{}', polling without limit", raw);
                        None
                    }
                    Ok(n) => Some(n),
                }),
            log_dir: env::var("LOG_DIR")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn print_env_vars(&self) {
        tracing::info!("COMFYUI_URL: {}", self.comfyui_url);
        tracing::info!("TEMPLATES_DIR: {}", self.templates_dir.display());
        tracing::info!("OUTPUT_DIR: {}", self.output_dir.display());
        tracing::info!("API_HOST: {}", self.api_host);
        tracing::info!("API_PORT: {}", self.api_port);
        tracing::info!(
            "COMFY_ORG: {}",
            if self.comfy_org_key.is_some() { "<set>" } else { "<unset>" }
        );
        tracing::info!("POLL_INTERVAL_SECS: {}", self.poll_interval.as_secs());
        match self.max_poll_attempts {
            Some(n) => tracing::info!("MAX_POLL_ATTEMPTS: {}", n),
            None => tracing::info!("MAX_POLL_ATTEMPTS: <unbounded>"),
        }
        match &self.log_dir {
            Some(dir) => tracing::info!("LOG_DIR: {}", dir.display()),
            None => tracing::info!("LOG_DIR: <console only>"),
        }
    }

    /// Output directory made absolute against the working directory, so that
    /// Markdown `file://` references stay valid for the caller.
    pub fn absolute_output_dir(&self) -> PathBuf {
        if self.output_dir.is_absolute() {
            return self.output_dir.clone();
        }
        env::current_dir()
            .map(|cwd| cwd.join(&self.output_dir))
            .unwrap_or_else(|_| self.output_dir.clone())
    }
}

fn non_zero_or(key: &str, value: u64, fallback: u64) -> u64 {
    if value == 0 {
        tracing::warn!("{} must be positive, falling back to {}", key, fallback);
        return fallback;
    }
    value
}

fn parse_or<T: FromStr + std::fmt::Display + Copy>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', falling back to {}", key, raw, fallback);
            fallback
        }),
        Err(_) => fallback,
    }
}
