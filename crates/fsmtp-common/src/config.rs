//! Configuration for FSMTP provisioning

use crate::types::{CertificateSubject, ConnectionCredentials, TEN_YEARS_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Prefix for environment overrides, e.g. `FSMTP__DATABASE__CASSANDRA_HOSTS`
pub const ENV_PREFIX: &str = "FSMTP";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster connection settings
    pub database: DatabaseConfig,

    /// Schema options
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Self-signed certificate settings
    #[serde(default)]
    pub certificate: CertificateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cluster connection configuration
///
/// Key names match the `database` object of the mail server's
/// `config.json`, so the same file drives both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Comma separated contact hosts
    pub cassandra_hosts: String,

    /// CQL native transport port
    pub cassandra_native: u16,

    pub cassandra_username: Option<String>,

    pub cassandra_password: Option<String>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_statement_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    /// Build validated connection credentials.
    ///
    /// Empty username or password strings count as absent. Zero timeouts
    /// are rejected here as well.
    pub fn credentials(&self) -> crate::Result<ConnectionCredentials> {
        let hosts = ConnectionCredentials::parse_hosts(&self.cassandra_hosts);
        if hosts.is_empty() {
            return Err(crate::Error::Config(
                "database.cassandra_hosts must list at least one host".to_string(),
            ));
        }

        if self.cassandra_native == 0 {
            return Err(crate::Error::Config(
                "database.cassandra_native must be a non-zero port".to_string(),
            ));
        }

        for (key, secs) in [
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("statement_timeout_secs", self.statement_timeout_secs),
        ] {
            if secs == 0 {
                return Err(crate::Error::Config(format!(
                    "database.{} must be at least 1",
                    key
                )));
            }
        }

        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();

        Ok(ConnectionCredentials {
            hosts,
            port: self.cassandra_native,
            username: non_empty(&self.cassandra_username),
            password: non_empty(&self.cassandra_password),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

/// Schema configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Replication factor of the `fannst` keyspace
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,

    /// Domain inserted into `local_domain`; empty disables the seed
    #[serde(default = "default_seed_domain")]
    pub seed_domain: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            replication_factor: default_replication_factor(),
            seed_domain: default_seed_domain(),
        }
    }
}

fn default_replication_factor() -> u32 {
    3
}

fn default_seed_domain() -> Option<String> {
    Some("fannst.nl".to_string())
}

impl SchemaConfig {
    /// The seed domain, if seeding is enabled
    pub fn seed_domain(&self) -> Option<&str> {
        self.seed_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Certificate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    #[serde(default = "default_country")]
    pub country_name: String,

    #[serde(default = "default_state")]
    pub state_name: String,

    #[serde(default = "default_locality")]
    pub locality_name: String,

    #[serde(default = "default_organization")]
    pub organization_name: String,

    #[serde(default = "default_organization_unit")]
    pub organization_unit: String,

    #[serde(default = "default_common_name")]
    pub common_name: String,

    #[serde(default = "default_email")]
    pub email_address: String,

    #[serde(default)]
    pub serial_number: u64,

    #[serde(default)]
    pub validity_start_in_seconds: i64,

    #[serde(default = "default_validity_end")]
    pub validity_end_in_seconds: i64,

    /// RSA modulus size in bits
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,

    /// Certificate output path
    #[serde(default = "default_cert_out")]
    pub cert_out: PathBuf,

    /// Private key output path
    #[serde(default = "default_key_out")]
    pub key_out: PathBuf,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            country_name: default_country(),
            state_name: default_state(),
            locality_name: default_locality(),
            organization_name: default_organization(),
            organization_unit: default_organization_unit(),
            common_name: default_common_name(),
            email_address: default_email(),
            serial_number: 0,
            validity_start_in_seconds: 0,
            validity_end_in_seconds: default_validity_end(),
            key_bits: default_key_bits(),
            cert_out: default_cert_out(),
            key_out: default_key_out(),
        }
    }
}

fn default_country() -> String {
    "CN".to_string()
}

fn default_state() -> String {
    "State".to_string()
}

fn default_locality() -> String {
    "Locality".to_string()
}

fn default_organization() -> String {
    "Organization".to_string()
}

fn default_organization_unit() -> String {
    "Unit".to_string()
}

fn default_common_name() -> String {
    "example.com".to_string()
}

fn default_email() -> String {
    "someone@example.com".to_string()
}

fn default_validity_end() -> i64 {
    TEN_YEARS_SECS
}

fn default_key_bits() -> usize {
    4096
}

fn default_cert_out() -> PathBuf {
    PathBuf::from("./env/keys/cert.pem")
}

fn default_key_out() -> PathBuf {
    PathBuf::from("./env/keys/key.pem")
}

impl CertificateConfig {
    /// The subject record handed to the minter
    pub fn subject(&self) -> CertificateSubject {
        CertificateSubject {
            country_name: self.country_name.clone(),
            state_name: self.state_name.clone(),
            locality_name: self.locality_name.clone(),
            organization_name: self.organization_name.clone(),
            organization_unit: self.organization_unit.clone(),
            common_name: self.common_name.clone(),
            email_address: self.email_address.clone(),
            serial_number: self.serial_number,
            validity_start_in_seconds: self.validity_start_in_seconds,
            validity_end_in_seconds: self.validity_end_in_seconds,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from a file, with `FSMTP__*` environment overrides.
    ///
    /// The format follows the file extension (json, toml, yaml).
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        Self::from_sources(path, environment())
    }

    fn from_sources(path: &Path, environment: config::Environment) -> crate::Result<Self> {
        debug!(path = %path.display(), "Loading configuration");

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment)
            .build()
            .map_err(|e| {
                crate::Error::Config(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let config: Config = settings.try_deserialize().map_err(|e| {
            crate::Error::Config(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Load from an explicit path, or from the first default location found
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        match Self::locate(explicit) {
            Some(path) => Self::from_file(&path),
            None => Err(crate::Error::Config(
                "No configuration file found".to_string(),
            )),
        }
    }

    /// The explicit path, or the first default location that exists
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|path| path.exists()),
        }
    }

    /// Default locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("./config.json"),
            PathBuf::from("../config.json"),
            PathBuf::from("../fallback/config.json"),
            PathBuf::from("./config.toml"),
            PathBuf::from("/etc/fsmtp/config.toml"),
        ]
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let schema = SchemaConfig::default();
        assert_eq!(schema.replication_factor, 3);
        assert_eq!(schema.seed_domain(), Some("fannst.nl"));

        let cert = CertificateConfig::default();
        assert_eq!(cert.key_bits, 4096);
        assert_eq!(cert.subject(), CertificateSubject::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[database]
cassandra_hosts = "10.0.0.1, 10.0.0.2"
cassandra_native = 9042

[schema]
seed_domain = ""

[certificate]
country_name = "NL"
common_name = "test"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.cassandra_native, 9042);
        assert_eq!(config.database.statement_timeout(), Duration::from_secs(30));
        assert_eq!(config.schema.seed_domain(), None);
        assert_eq!(config.certificate.subject().country_name, "NL");
        assert_eq!(config.logging.level, "info");

        let creds = config.database.credentials().unwrap();
        assert_eq!(creds.hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(creds.auth(), None);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
  "database": {{
    "cassandra_username": "cassandra",
    "cassandra_password": "cassandra",
    "cassandra_hosts": "127.0.0.1",
    "cassandra_native": 9042
  }}
}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        let creds = config.database.credentials().unwrap();
        assert_eq!(creds.port, 9042);
        assert_eq!(creds.auth(), Some(("cassandra", "cassandra")));
    }

    #[test]
    fn test_empty_password_means_unauthenticated() {
        let database = DatabaseConfig {
            cassandra_hosts: "db1".to_string(),
            cassandra_native: 9042,
            cassandra_username: Some("cassandra".to_string()),
            cassandra_password: Some(String::new()),
            connect_timeout_secs: 10,
            statement_timeout_secs: 30,
        };
        assert_eq!(database.credentials().unwrap().auth(), None);
    }

    #[test]
    fn test_missing_hosts_is_config_error() {
        let database = DatabaseConfig {
            cassandra_hosts: " , ".to_string(),
            cassandra_native: 9042,
            cassandra_username: None,
            cassandra_password: None,
            connect_timeout_secs: 10,
            statement_timeout_secs: 30,
        };
        assert!(matches!(
            database.credentials(),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_malformed_port_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"database": {{"cassandra_hosts": "db1", "cassandra_native": "not-a-port"}}}}"#
        )
        .unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_zero_timeout_is_config_error() {
        let mut database = DatabaseConfig {
            cassandra_hosts: "db1".to_string(),
            cassandra_native: 9042,
            cassandra_username: None,
            cassandra_password: None,
            connect_timeout_secs: 10,
            statement_timeout_secs: 0,
        };
        let err = database.credentials().unwrap_err();
        assert!(err.to_string().contains("statement_timeout_secs"));

        database.statement_timeout_secs = 30;
        database.connect_timeout_secs = 0;
        let err = database.credentials().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"database": {{"cassandra_hosts": "127.0.0.1", "cassandra_native": 9042}}}}"#
        )
        .unwrap();

        let vars: config::Map<String, String> = [
            ("FSMTP__DATABASE__CASSANDRA_HOSTS", "10.0.0.9,10.0.0.8"),
            ("FSMTP__DATABASE__CASSANDRA_USERNAME", "cassandra"),
            ("FSMTP__DATABASE__CASSANDRA_PASSWORD", "12345"),
            ("FSMTP__SCHEMA__REPLICATION_FACTOR", "1"),
            ("OTHER__DATABASE__CASSANDRA_NATIVE", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config =
            Config::from_sources(file.path(), environment().source(Some(vars))).unwrap();
        assert_eq!(config.database.cassandra_hosts, "10.0.0.9,10.0.0.8");
        assert_eq!(config.database.cassandra_native, 9042);
        assert_eq!(config.schema.replication_factor, 1);

        let creds = config.database.credentials().unwrap();
        assert_eq!(creds.hosts, vec!["10.0.0.9", "10.0.0.8"]);
        assert_eq!(creds.auth(), Some(("cassandra", "12345")));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("/nonexistent/fsmtp.toml");
        assert_eq!(Config::locate(Some(explicit)), Some(explicit.to_path_buf()));
        assert!(matches!(
            Config::load(Some(explicit)),
            Err(crate::Error::Config(_))
        ));
    }
}
