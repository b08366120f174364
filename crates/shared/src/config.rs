//! Environment-backed configuration for the gymbook binaries.

use anyhow::Context;

/// Day of month on which charges fall due when `BILLING_DUE_DAY` is unset.
pub const DEFAULT_DUE_DAY: u8 = 15;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the API server binds to (`BIND_ADDRESS`).
    pub bind_address: String,
    /// Canonical due day applied to every generated charge
    /// (`BILLING_DUE_DAY`, 1-31; days past the end of a month clamp to its
    /// last day).
    pub due_day: u8,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let due_day = match std::env::var("BILLING_DUE_DAY") {
            Ok(raw) => raw
                .parse::<u8>()
                .context("BILLING_DUE_DAY must be a day of month (1-31)")?,
            Err(_) => DEFAULT_DUE_DAY,
        };
        anyhow::ensure!(
            (1..=31).contains(&due_day),
            "BILLING_DUE_DAY out of range: {due_day}"
        );

        Ok(Self {
            bind_address,
            due_day,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            due_day: DEFAULT_DUE_DAY,
        }
    }
}
