use serde::Deserialize;

use crate::reports::lifecycle::TransitionPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub max_connections: u32,
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub db: DbConfig,
    pub transition_policy: TransitionPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = std::env::var("JWT_SECRET")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            ttl_hours: jwt_ttl_hours(std::env::var("JWT_TTL_HOURS").ok().as_deref())?,
        };
        let db = DbConfig {
            max_connections: parse_env("DB_MAX_CONNECTIONS").unwrap_or(25),
            query_timeout_secs: parse_env("DB_QUERY_TIMEOUT_SECS").unwrap_or(6),
        };

        // Hosting platforms inject PORT; APP_PORT wins when both are set.
        let port = parse_env("APP_PORT")
            .or_else(|| parse_env("PORT"))
            .unwrap_or(4000);

        let transition_policy = match std::env::var("REPORT_TRANSITIONS").ok().as_deref() {
            None | Some("") | Some("permissive") => TransitionPolicy::Permissive,
            Some("forward") => TransitionPolicy::Forward,
            Some(other) => anyhow::bail!("unknown REPORT_TRANSITIONS value: {other}"),
        };

        Ok(Self {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url,
            jwt,
            db,
            transition_policy,
        })
    }
}

const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

/// Unset means 24 hours. Anything unparsable or outside `1..=MAX_JWT_TTL_HOURS` is refused.
fn jwt_ttl_hours(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return Ok(24);
    };
    let hours: i64 = raw
        .parse()
        .map_err(|_| anyhow::anyhow!("JWT_TTL_HOURS must be an integer, got {raw:?}"))?;
    anyhow::ensure!(
        (1..=MAX_JWT_TTL_HOURS).contains(&hours),
        "JWT_TTL_HOURS must be between 1 and {MAX_JWT_TTL_HOURS}, got {hours}"
    );
    Ok(hours)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
