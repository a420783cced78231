//! Command-line / environment configuration for the statistics service.
//!
//! Every option can come from a flag or an environment variable; a `.env` file
//! is loaded first so deployments can keep settings next to the binary.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use crate::data::DEFAULT_SOURCE_URL;
use crate::domain::RangePolicy;
use crate::error::AppError;

/// Longest accepted refresh interval (one year).
pub const MAX_UPDATE_INTERVAL_HOURS: u64 = 24 * 366;

/// Top-level CLI.
#[derive(Debug, Parser, Clone)]
#[command(name = "covid-stats", version, about = "Daily/weekly/monthly COVID-19 statistics API")]
pub struct Cli {
    /// Country to serve, matched exactly against the feed's `location` column.
    #[arg(long, env = "COUNTRY")]
    pub country: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// CSV feed to poll.
    #[arg(long, env = "SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Hours between feed refreshes.
    #[arg(long, env = "UPDATE_INTERVAL_HOURS", default_value_t = 24)]
    pub update_interval_hours: u64,

    /// Give up on a feed download after this many seconds (no limit by default).
    #[arg(long, env = "FETCH_TIMEOUT_SECS")]
    pub fetch_timeout_secs: Option<u64>,

    /// Weekly/monthly behaviour when the feed has not reached today yet.
    #[arg(long, env = "RANGE_POLICY", value_enum, default_value_t = RangePolicy::Partial)]
    pub range_policy: RangePolicy,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub country: String,
    pub addr: SocketAddr,
    pub source_url: String,
    pub update_interval: Duration,
    pub fetch_timeout: Option<Duration>,
    pub range_policy: RangePolicy,
}

impl Cli {
    /// Load `.env`, then parse flags and environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn into_settings(self) -> Result<Settings, AppError> {
        let country = self.country.trim().to_string();
        if country.is_empty() {
            return Err(AppError::config("COUNTRY must not be empty."));
        }
        if self.update_interval_hours == 0 {
            return Err(AppError::config("UPDATE_INTERVAL_HOURS must be at least 1."));
        }
        let interval_secs = self
            .update_interval_hours
            .checked_mul(60 * 60)
            .filter(|_| self.update_interval_hours <= MAX_UPDATE_INTERVAL_HOURS)
            .ok_or_else(|| {
                AppError::config(format!(
                    "UPDATE_INTERVAL_HOURS must be at most {MAX_UPDATE_INTERVAL_HOURS}."
                ))
            })?;
        if self.source_url.trim().is_empty() {
            return Err(AppError::config("SOURCE_URL must not be empty."));
        }

        Ok(Settings {
            country,
            addr: SocketAddr::new(self.host, self.port),
            source_url: self.source_url,
            update_interval: Duration::from_secs(interval_secs),
            fetch_timeout: self.fetch_timeout_secs.map(Duration::from_secs),
            range_policy: self.range_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    /// Parse with every env-backed option given on the command line, so the
    /// test environment's variables never leak in.
    fn parse(overrides: &[(&str, &str)]) -> Cli {
        let mut opts: Vec<(&str, &str)> = vec![
            ("--country", "Netherlands"),
            ("--port", "3000"),
            ("--host", "0.0.0.0"),
            ("--source-url", DEFAULT_SOURCE_URL),
            ("--update-interval-hours", "24"),
            ("--range-policy", "partial"),
        ];
        for &(flag, value) in overrides {
            match opts.iter_mut().find(|(f, _)| *f == flag) {
                Some(slot) => slot.1 = value,
                None => opts.push((flag, value)),
            }
        }

        let mut argv = vec!["covid-stats"];
        for (flag, value) in opts {
            argv.push(flag);
            argv.push(value);
        }
        Cli::try_parse_from(argv).unwrap()
    }

    fn declared_default(id: &str) -> Option<String> {
        let cmd = Cli::command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == id)?;
        arg.get_default_values()
            .first()
            .map(|v| v.to_string_lossy().into_owned())
    }

    #[test]
    fn declared_defaults_poll_owid_daily() {
        assert_eq!(declared_default("port").as_deref(), Some("3000"));
        assert_eq!(declared_default("host").as_deref(), Some("0.0.0.0"));
        assert_eq!(declared_default("source_url").as_deref(), Some(DEFAULT_SOURCE_URL));
        assert_eq!(declared_default("update_interval_hours").as_deref(), Some("24"));
        assert_eq!(declared_default("range_policy").as_deref(), Some("partial"));
        assert_eq!(declared_default("fetch_timeout_secs"), None);
    }

    #[test]
    fn default_interval_is_one_day() {
        let settings = parse(&[]).into_settings().unwrap();

        assert_eq!(settings.country, "Netherlands");
        assert_eq!(settings.update_interval, crate::app::updater::DEFAULT_INTERVAL);
        assert_eq!(settings.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(settings.range_policy, RangePolicy::Partial);
    }

    #[test]
    fn flags_override_defaults() {
        let settings = parse(&[
            ("--country", "United Kingdom"),
            ("--port", "8080"),
            ("--host", "127.0.0.1"),
            ("--update-interval-hours", "6"),
            ("--fetch-timeout-secs", "300"),
            ("--range-policy", "strict"),
        ])
        .into_settings()
        .unwrap();

        assert_eq!(settings.country, "United Kingdom");
        assert_eq!(settings.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.update_interval, Duration::from_secs(6 * 60 * 60));
        assert_eq!(settings.fetch_timeout, Some(Duration::from_secs(300)));
        assert_eq!(settings.range_policy, RangePolicy::Strict);
    }

    #[test]
    fn rejects_blank_country_and_zero_interval() {
        let err = parse(&[("--country", "  ")]).into_settings().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);

        let err = parse(&[("--update-interval-hours", "0")]).into_settings().unwrap_err();
        assert!(err.message().contains("UPDATE_INTERVAL_HOURS"));
    }

    #[test]
    fn rejects_oversized_interval_instead_of_overflowing() {
        let max = MAX_UPDATE_INTERVAL_HOURS.to_string();
        let settings = parse(&[("--update-interval-hours", max.as_str())]).into_settings().unwrap();
        assert_eq!(
            settings.update_interval,
            Duration::from_secs(MAX_UPDATE_INTERVAL_HOURS * 60 * 60)
        );

        let over = (MAX_UPDATE_INTERVAL_HOURS + 1).to_string();
        let err = parse(&[("--update-interval-hours", over.as_str())]).into_settings().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);

        let huge = u64::MAX.to_string();
        let err = parse(&[("--update-interval-hours", huge.as_str())]).into_settings().unwrap_err();
        assert!(err.message().contains("at most"));
    }
}
