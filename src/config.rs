use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "finsight.db";
pub const DEFAULT_PORT: u16 = 8000;

const REMOTE_SCHEMES: &[&str] = &["libsql://", "http://", "https://", "ws://", "wss://"];

#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(about = "Runs the FinSight backend service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finsight")
        .join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_database() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            auth_token: None,
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Blank tokens (e.g. an unset `${VAR}`) count as absent.
    pub fn get_auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn is_remote(&self) -> bool {
        REMOTE_SCHEMES.iter().any(|scheme| self.database.starts_with(scheme))
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// Builds the configuration from `DATABASE_URL`, `DATABASE_AUTH_TOKEN` and `PORT`,
    /// falling back to a local database file on port 8000.
    pub fn from_env() -> Result<Self> {
        let database = env::var("DATABASE_URL").unwrap_or_else(|_| default_database());
        let auth_token = env::var("DATABASE_AUTH_TOKEN").ok();
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {raw:?}: {e}"))?,
            Err(_) => default_port(),
        };

        Ok(Config {
            app: App {
                database,
                auth_token,
                port,
                allowed_origins: default_allowed_origins(),
            },
        })
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-default}` placeholders from the environment.
    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| anyhow::anyhow!("unterminated placeholder: {}", &rest[start..]))?;

            let placeholder = &after[..end];
            let value = match placeholder.split_once(":-") {
                Some((name, default)) => env::var(name).unwrap_or_else(|_| default.to_string()),
                None => env::var(placeholder).unwrap_or_else(|_| {
                    tracing::warn!(var = placeholder, "environment variable not found");
                    String::new()
                }),
            };

            out.push_str(&value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}
