use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest session lifetime accepted from settings (one year)
pub const MAX_SESSION_LIFETIME_HOURS: u32 = 24 * 365;

/// Remote bridge timeouts and session bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Bound on the reachability probe issued by `connect`
    pub probe_timeout_secs: u64,
    /// Bound on a single remote generation
    pub submit_timeout_secs: u64,
    /// Informational lifetime of a pasted notebook URL
    pub session_lifetime_hours: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 10,
            submit_timeout_secs: 15 * 60,
            session_lifetime_hours: 72,
        }
    }
}

impl RemoteConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        let hours = self.session_lifetime_hours.min(MAX_SESSION_LIFETIME_HOURS);
        chrono::Duration::try_hours(i64::from(hours)).unwrap_or_else(chrono::Duration::zero)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_lifetime_hours > MAX_SESSION_LIFETIME_HOURS {
            anyhow::bail!(
                "remote.session_lifetime_hours must be at most {} (got {})",
                MAX_SESSION_LIFETIME_HOURS,
                self.session_lifetime_hours
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifetime_bounds() {
        let config = RemoteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_lifetime(), chrono::Duration::hours(72));

        let huge = RemoteConfig {
            session_lifetime_hours: u32::MAX,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
        assert_eq!(
            huge.session_lifetime(),
            chrono::Duration::hours(i64::from(MAX_SESSION_LIFETIME_HOURS))
        );
    }
}
