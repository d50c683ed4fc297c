//! Community settings loading from config.toml
//!
//! Every field has a default, so a partial file (or none at all) still yields a
//! usable [`Settings`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default settings file name
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Community-wide policies
    pub community: CommunityConfig,
    /// Dashboard display policies
    pub dashboard: DashboardConfig,
}

/// How permissive complaint status changes are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintTransitions {
    /// Any status may be selected from any other
    #[default]
    Permissive,
    /// pending -> in-progress -> resolved only
    ForwardOnly,
}

/// `[community]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Name shown in summaries
    pub name: String,
    /// Default monthly maintenance charge
    pub maintenance_amount: f64,
    /// Day of month maintenance falls due
    pub due_day: u32,
    /// Complaint status policy
    pub complaint_transitions: ComplaintTransitions,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            name: "ResiHub".to_string(),
            maintenance_amount: 0.0,
            due_day: 5,
            complaint_transitions: ComplaintTransitions::default(),
        }
    }
}

/// `[dashboard]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Trailing window for "recent" counts
    pub recent_window_hours: i64,
    /// Maximum number of recent announcements shown
    pub recent_announcement_cap: usize,
    /// Number of months in the fund chart
    pub chart_months: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_window_hours: 24,
            recent_announcement_cap: 5,
            chart_months: 6,
        }
    }
}

impl Settings {
    /// Trailing window used by the recency aggregates.
    #[must_use]
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.dashboard.recent_window_hours)
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - `due_day` is outside 1..=28
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_settings(&contents)
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if !(1..=28).contains(&settings.community.due_day) {
        return Err(Error::Config {
            message: format!(
                "due_day must be between 1 and 28, got {}",
                settings.community.due_day
            ),
        });
    }

    Ok(settings)
}

/// Loads settings from `RESIHUB_CONFIG`, or ./config.toml when unset.
pub fn load_default_settings() -> Result<Settings> {
    let path =
        std::env::var("RESIHUB_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [community]
            name = "Green Meadows"
            maintenance_amount = 2500.0
            due_day = 10
            complaint_transitions = "forward-only"

            [dashboard]
            recent_window_hours = 48
            recent_announcement_cap = 3
            chart_months = 12
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.community.name, "Green Meadows");
        assert_eq!(settings.community.maintenance_amount, 2500.0);
        assert_eq!(settings.community.due_day, 10);
        assert_eq!(
            settings.community.complaint_transitions,
            ComplaintTransitions::ForwardOnly
        );
        assert_eq!(settings.dashboard.recent_announcement_cap, 3);
        assert_eq!(settings.dashboard.chart_months, 12);
        assert_eq!(settings.recent_window(), chrono::Duration::hours(48));
    }

    #[test]
    fn test_missing_tables_fall_back_to_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.community.due_day, 5);
        assert_eq!(
            settings.community.complaint_transitions,
            ComplaintTransitions::Permissive
        );
        assert_eq!(settings.dashboard.recent_window_hours, 24);
        assert_eq!(settings.dashboard.recent_announcement_cap, 5);
        assert_eq!(settings.dashboard.chart_months, 6);
    }

    #[test]
    fn test_rejects_out_of_range_due_day() {
        let result = parse_settings("[community]\ndue_day = 31\n");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_settings("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }
}
