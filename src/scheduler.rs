//! Timer-driven refresh schedules. Each job runs on its own task; a failed
//! tick is logged and never affects the other schedules.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::FetchJobs;
use crate::store::{Snapshot, SnapshotKey};

/// Spawn the three refresh tasks. Every job also fires once immediately so
/// the store fills up right after startup.
pub fn start(jobs: Arc<FetchJobs>, config: &Config) -> anyhow::Result<()> {
    let daily_at = config.parsed_upcoming_refresh_time()?;
    spawn_upcoming(Arc::clone(&jobs), daily_at);
    spawn_live(
        Arc::clone(&jobs),
        Duration::from_secs(config.live_interval_secs),
    );
    spawn_pointtable(
        jobs,
        Duration::from_secs(config.pointtable_interval_mins * 60),
    );
    Ok(())
}

fn spawn_live(jobs: Arc<FetchJobs>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            // First tick completes immediately, covering the startup fire.
            ticker.tick().await;
            match jobs.refresh_live().await {
                Ok(_) => info!("Live score snapshot updated"),
                Err(e) => warn!("Live score refresh failed: {:#}", e),
            }
        }
    });
}

fn spawn_upcoming(jobs: Arc<FetchJobs>, daily_at: NaiveTime) {
    tokio::spawn(async move {
        loop {
            match jobs.refresh_upcoming().await {
                Ok(_) => info!("Upcoming fixtures snapshot updated"),
                Err(e) => warn!("Upcoming fixtures refresh failed: {:#}", e),
            }
            let wait = until_next_occurrence(Utc::now(), daily_at);
            debug!("Next upcoming fixtures refresh in {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    });
}

fn spawn_pointtable(jobs: Arc<FetchJobs>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let live = jobs.store().read(&SnapshotKey::Live);
            let Some(match_id) = live_match_id(live.as_ref()) else {
                debug!("No live match id, skipping point-table tick");
                continue;
            };
            match jobs.refresh_pointtable(&match_id).await {
                Ok(_) => info!("Point table snapshot updated ({})", match_id),
                Err(e) => warn!("Point table refresh failed ({}): {:#}", match_id, e),
            }
        }
    });
}

/// Time until the next daily occurrence of `at`, strictly after `now`.
fn until_next_occurrence(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// Match id carried in the live snapshot, if any. The upstream sends it as
/// either a string or a number.
fn live_match_id(snapshot: Option<&Snapshot>) -> Option<String> {
    match snapshot?.data.get("match_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
