use chrono::NaiveTime;
use clap::Parser;

/// Scoreboard snapshot proxy for display clients
#[derive(Parser, Debug, Clone)]
#[command(name = "scoreboard-proxy", version, about)]
pub struct Config {
    /// Listen address for the scoreboard API
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:5050")]
    pub listen_addr: String,

    /// Directory where snapshot files are stored
    #[arg(long, env = "STORE_DIR", default_value = "store")]
    pub store_dir: String,

    /// Upstream URL for upcoming fixtures
    #[arg(long, env = "UPCOMING_API")]
    pub upcoming_api_url: String,

    /// Upstream URL for live scores
    #[arg(long, env = "LIVE_API")]
    pub live_api_url: String,

    /// Upstream base URL for point tables (match id and query suffix are appended)
    #[arg(long, env = "POINTTABLE_API")]
    pub pointtable_api_url: String,

    /// Query suffix appended after the match id when building point-table URLs.
    /// Tied to the upstream API version, so kept configurable.
    #[arg(long, env = "POINTTABLE_QUERY_SUFFIX", default_value = "_table?json=1")]
    pub pointtable_query_suffix: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "15")]
    pub fetch_timeout_secs: u64,

    /// Live-score refresh interval in seconds
    #[arg(long, env = "LIVE_INTERVAL_SECS", default_value = "10")]
    pub live_interval_secs: u64,

    /// Point-table refresh interval in minutes
    #[arg(long, env = "POINTTABLE_INTERVAL_MINS", default_value = "30")]
    pub pointtable_interval_mins: u64,

    /// UTC wall-clock time (HH:MM) of the daily upcoming-fixtures refresh
    #[arg(long, env = "UPCOMING_REFRESH_TIME", default_value = "00:10")]
    pub upcoming_refresh_time: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be positive");
        }
        if self.live_interval_secs == 0 {
            anyhow::bail!("live_interval_secs must be positive");
        }
        if self.pointtable_interval_mins == 0 {
            anyhow::bail!("pointtable_interval_mins must be positive");
        }
        self.parsed_upcoming_refresh_time()?;
        Ok(())
    }

    /// The daily refresh time parsed into a `NaiveTime`.
    pub fn parsed_upcoming_refresh_time(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.upcoming_refresh_time, "%H:%M").map_err(|e| {
            anyhow::anyhow!(
                "upcoming_refresh_time '{}' is not HH:MM: {}",
                self.upcoming_refresh_time,
                e
            )
        })
    }
}
