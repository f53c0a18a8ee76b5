use std::time::Duration;

use anyhow::{Context, Result};
use campground_model::MonthRange;
use reservation_sync::SyncConfig;

/// Runtime configuration of the planner, read from the environment
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Root of the calendar API (`CALENDAR_API_URL`, default: http://localhost:8080/api)
    pub api_url: String,
    /// Bearer token sent with every request (`CALENDAR_API_TOKEN`)
    pub api_token: Option<String>,
    /// Month shown when none is given on the command line (`CALENDAR_MONTH`, default: this month)
    pub month: Option<MonthRange>,
    /// Store tunables; `CALENDAR_STUCK_TIMEOUT_SECS` overrides the stuck timeout
    pub sync: SyncConfig,
}

impl PlannerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("CALENDAR_API_URL")
            .unwrap_or_else(|| "http://localhost:8080/api".to_string());
        let api_token = lookup("CALENDAR_API_TOKEN").filter(|token| !token.trim().is_empty());

        let month = lookup("CALENDAR_MONTH")
            .map(|value| value.parse::<MonthRange>())
            .transpose()
            .context("CALENDAR_MONTH must be in YYYY-MM form")?;

        let mut sync = SyncConfig::default();
        if let Some(secs) = lookup("CALENDAR_STUCK_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("CALENDAR_STUCK_TIMEOUT_SECS must be a whole number of seconds")?;
            sync.stuck_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            api_url,
            api_token,
            month,
            sync,
        })
    }
}
