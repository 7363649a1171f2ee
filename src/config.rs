use crate::models::Position;
use crate::utils::blend::BlendWeights;
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "DA_";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: String, value: String },
    #[error("blend weight {name} must be within [0, 1], got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("invalid host address: {0}")]
    InvalidHost(String),
}

/// Starting lineup plus bench for one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RosterRequirements {
    pub qb: u32,
    pub rb: u32,
    pub wr: u32,
    pub te: u32,
    pub flex: u32,
    pub k: u32,
    pub def: u32,
    pub bench: u32,
}

impl RosterRequirements {
    pub fn required(&self, position: Position) -> u32 {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
            Position::K => self.k,
            Position::DEF => self.def,
        }
    }
}

impl Default for RosterRequirements {
    fn default() -> Self {
        Self {
            qb: 1,
            rb: 2,
            wr: 3,
            te: 0,
            flex: 1,
            k: 1,
            def: 1,
            bench: 5,
        }
    }
}

/// Everything the service needs, read once at startup and passed around
/// explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub export_path: PathBuf,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    pub data_ttl: Duration,
    pub news_ttl: Duration,
    pub league_size: u32,
    pub suggest_top: usize,
    pub suggest_next: usize,
    pub roster: RosterRequirements,
    pub weights: BlendWeights,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "data/draft.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            export_path: PathBuf::from("data/picks_export.csv"),
            cache_dir: PathBuf::from("cache"),
            use_cache: false,
            data_ttl: Duration::from_secs(10 * 60),
            news_ttl: Duration::from_secs(90),
            league_size: 12,
            suggest_top: 3,
            suggest_next: 10,
            roster: RosterRequirements::default(),
            weights: BlendWeights::default(),
        }
    }
}

impl AppConfig {
    /// Read `DA_*` variables, honouring a `.env` file if present
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let defaults = Self::default();

        let weights = BlendWeights {
            consensus: env.parse("WEIGHT_CONSENSUS", defaults.weights.consensus)?,
            primary_adp: env.parse("WEIGHT_PRIMARY_ADP", defaults.weights.primary_adp)?,
            secondary_adp: env.parse("WEIGHT_SECONDARY_ADP", defaults.weights.secondary_adp)?,
        };
        validate_weights(&weights)?;

        let roster = RosterRequirements {
            qb: env.parse("ROSTER_QB", defaults.roster.qb)?,
            rb: env.parse("ROSTER_RB", defaults.roster.rb)?,
            wr: env.parse("ROSTER_WR", defaults.roster.wr)?,
            te: env.parse("ROSTER_TE", defaults.roster.te)?,
            flex: env.parse("ROSTER_FLEX", defaults.roster.flex)?,
            k: env.parse("ROSTER_K", defaults.roster.k)?,
            def: env.parse("ROSTER_DEF", defaults.roster.def)?,
            bench: env.parse("BENCH", defaults.roster.bench)?,
        };

        Ok(Self {
            db_path: env.string("DB_PATH", &defaults.db_path),
            host: env.string("HOST", &defaults.host),
            port: env.parse("PORT", defaults.port)?,
            export_path: PathBuf::from(
                env.string("EXPORT_PATH", &defaults.export_path.to_string_lossy()),
            ),
            cache_dir: PathBuf::from(env.string("CACHE_DIR", &defaults.cache_dir.to_string_lossy())),
            use_cache: env.string("USE_CACHE", "0") == "1",
            data_ttl: Duration::from_secs(60 * env.parse("DATA_TTL_MIN", 10u64)?),
            news_ttl: Duration::from_secs(env.parse("NEWS_TTL_SEC", 90u64)?),
            league_size: env.parse("LEAGUE_SIZE", defaults.league_size)?,
            suggest_top: env.parse("SUGGEST_TOP", defaults.suggest_top)?,
            suggest_next: env.parse("SUGGEST_NEXT", defaults.suggest_next)?,
            roster,
            weights,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

pub fn validate_weights(weights: &BlendWeights) -> Result<(), ConfigError> {
    for (name, value) in [
        ("consensus", weights.consensus),
        ("primary_adp", weights.primary_adp),
        ("secondary_adp", weights.secondary_adp),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidWeight { name, value });
        }
    }
    Ok(())
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str, default: &str) -> String {
        (self.lookup)(&format!("{ENV_PREFIX}{key}")).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        let full_key = format!("{ENV_PREFIX}{key}");
        match (self.lookup)(&full_key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: full_key,
                value: raw,
            }),
        }
    }
}
