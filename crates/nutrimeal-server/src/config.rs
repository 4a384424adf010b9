use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use nutrimeal_api::generate::GeneratorEndpoint;

const PLACEHOLDER_SECRETS: &[&str] = &["", "changeme", "change-me", "secret", "dev-secret-change-me"];

pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub store_timeout: Duration,
    pub admin: Option<AdminSeed>,
    pub generator: Option<GeneratorEndpoint>,
    pub generator_timeout: Duration,
    pub pdf_font_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("NUTRIMEAL_JWT_SECRET").unwrap_or_default();
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.trim()) {
            bail!("NUTRIMEAL_JWT_SECRET must be set to a real secret");
        }

        let admin = match (
            optional("NUTRIMEAL_ADMIN_USERNAME"),
            optional("NUTRIMEAL_ADMIN_EMAIL"),
            optional("NUTRIMEAL_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(AdminSeed {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                warn!("Admin bootstrap needs NUTRIMEAL_ADMIN_USERNAME, _EMAIL and _PASSWORD; skipping");
                None
            }
        };

        let generator = match (
            optional("NUTRIMEAL_AI_URL"),
            optional("NUTRIMEAL_AI_KEY"),
            optional("NUTRIMEAL_AI_MODEL"),
        ) {
            (Some(url), Some(api_key), Some(model)) => Some(GeneratorEndpoint { url, api_key, model }),
            _ => {
                info!("AI generator not configured, recipe lookups fall back to the stub");
                None
            }
        };

        Ok(Self {
            host: try_load("NUTRIMEAL_HOST", "0.0.0.0")?,
            port: try_load("NUTRIMEAL_PORT", "3000")?,
            db_path: try_load("NUTRIMEAL_DB_PATH", "nutrimeal.db")?,
            jwt_secret,
            token_ttl: chrono::Duration::hours(try_load("NUTRIMEAL_TOKEN_TTL_HOURS", "576")?),
            store_timeout: Duration::from_millis(try_load("NUTRIMEAL_STORE_TIMEOUT_MS", "5000")?),
            admin,
            generator,
            generator_timeout: Duration::from_secs(try_load("NUTRIMEAL_AI_TIMEOUT_SECS", "30")?),
            pdf_font_dir: try_load("NUTRIMEAL_PDF_FONT_DIR", "./fonts")?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value '{raw}'"))
}
