//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.
//! Every field has a default so the binary starts with no environment at all.

use chrono::NaiveTime;
use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: SQLite connection string, defaults to `sqlite://biometric.db`
/// - `SERVER_HOST` / `SERVER_PORT`: bind address, defaults to `0.0.0.0:5000`
/// - `TLS_CERT_PATH` / `TLS_KEY_PATH`: PEM files enabling HTTPS when both exist
/// - `FACE_TOLERANCE`, `FACE_CACHE_TTL_SECS`: face matching parameters
/// - `MORNING_MIN_TIME`, `MORNING_LATE_THRESHOLD`, `AFTERNOON_START`,
///   `AFTERNOON_LATE_THRESHOLD`: attendance windows as `HH:MM` (24h)
/// - `SESSION_TTL_HOURS`, `PASSWORD_MIN_LENGTH`: admin security settings
/// - `BOOTSTRAP_ADMIN_*`: account created when no admin exists yet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub server_host: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_cert_path")]
    pub tls_cert_path: String,

    #[serde(default = "default_key_path")]
    pub tls_key_path: String,

    #[serde(default = "default_face_tolerance")]
    pub face_tolerance: f64,

    #[serde(default = "default_face_cache_ttl")]
    pub face_cache_ttl_secs: u64,

    #[serde(default = "default_morning_min")]
    pub morning_min_time: String,

    #[serde(default = "default_morning_late")]
    pub morning_late_threshold: String,

    #[serde(default = "default_afternoon_start")]
    pub afternoon_start: String,

    #[serde(default = "default_afternoon_late")]
    pub afternoon_late_threshold: String,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,

    #[serde(default = "default_admin_username")]
    pub bootstrap_admin_username: String,

    #[serde(default = "default_admin_password")]
    pub bootstrap_admin_password: String,

    #[serde(default = "default_admin_name")]
    pub bootstrap_admin_name: String,
}

fn default_database_url() -> String {
    "sqlite://biometric.db".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    5000
}

fn default_cert_path() -> String {
    "certs/server.crt".to_string()
}

fn default_key_path() -> String {
    "certs/server.key".to_string()
}

fn default_face_tolerance() -> f64 {
    0.6
}

fn default_face_cache_ttl() -> u64 {
    300
}

fn default_morning_min() -> String {
    "05:00".to_string()
}

fn default_morning_late() -> String {
    "08:01".to_string()
}

fn default_afternoon_start() -> String {
    "12:00".to_string()
}

fn default_afternoon_late() -> String {
    "13:01".to_string()
}

fn default_session_ttl() -> i64 {
    12
}

fn default_password_min_length() -> usize {
    8
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_admin_name() -> String {
    "System Admin".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed into
    /// its expected type (e.g. a non-numeric `SERVER_PORT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Build a configuration from explicit key/value pairs.
    pub fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Attendance time windows, parsed once from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceWindows {
    /// Earliest accepted morning time-in
    pub morning_min: NaiveTime,
    /// Morning time-ins at or after this are late
    pub morning_late: NaiveTime,
    /// Punches at or after this belong to the afternoon session
    pub afternoon_start: NaiveTime,
    /// Afternoon time-ins at or after this are late
    pub afternoon_late: NaiveTime,
}

impl AttendanceWindows {
    pub fn from_config(config: &Config) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            morning_min: parse_hhmm(&config.morning_min_time)?,
            morning_late: parse_hhmm(&config.morning_late_threshold)?,
            afternoon_start: parse_hhmm(&config.afternoon_start)?,
            afternoon_late: parse_hhmm(&config.afternoon_late_threshold)?,
        })
    }
}

impl Default for AttendanceWindows {
    fn default() -> Self {
        Self {
            morning_min: hm(5, 0),
            morning_late: hm(8, 1),
            afternoon_start: hm(12, 0),
            afternoon_late: hm(13, 1),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time literal")
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_with_empty_environment() {
        let config = Config::from_iter(Vec::new()).unwrap();
        assert_eq!(config.database_url, "sqlite://biometric.db");
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.tls_cert_path, "certs/server.crt");
        assert_eq!(config.tls_key_path, "certs/server.key");
        assert!((config.face_tolerance - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.face_cache_ttl_secs, 300);
        assert_eq!(config.password_min_length, 8);
        assert_eq!(config.bootstrap_admin_username, "admin");
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_iter(vars(&[
            ("SERVER_PORT", "8443"),
            ("FACE_TOLERANCE", "0.5"),
            ("MORNING_LATE_THRESHOLD", "09:00"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8443);
        assert!((config.face_tolerance - 0.5).abs() < f64::EPSILON);

        let windows = AttendanceWindows::from_config(&config).unwrap();
        assert_eq!(windows.morning_late, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(Config::from_iter(vars(&[("SERVER_PORT", "not-a-port")])).is_err());
    }

    #[test]
    fn default_windows_match_default_config() {
        let config = Config::from_iter(Vec::new()).unwrap();
        let windows = AttendanceWindows::from_config(&config).unwrap();
        assert_eq!(windows, AttendanceWindows::default());
    }

    #[test]
    fn malformed_window_is_rejected() {
        let config = Config::from_iter(vars(&[("AFTERNOON_START", "noon")])).unwrap();
        assert!(AttendanceWindows::from_config(&config).is_err());
    }
}
