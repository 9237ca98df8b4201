//! Value types handed from the orchestrator to the provisioning components

use crate::error::MintError;
use std::fmt;

/// Ten years, the default certificate lifetime
pub const TEN_YEARS_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Credentials and contact points for the wide-column cluster
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionCredentials {
    /// Contact hosts, never empty once validated
    pub hosts: Vec<String>,

    /// CQL native transport port
    pub port: u16,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl ConnectionCredentials {
    /// Unauthenticated credentials for the given hosts
    pub fn new(hosts: Vec<String>, port: u16) -> Self {
        Self {
            hosts,
            port,
            username: None,
            password: None,
        }
    }

    /// Attach a username and password
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Split a comma separated host list, dropping blanks
    pub fn parse_hosts(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Username and password, only when both are present
    pub fn auth(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// `host:port` contact points, bracketing IPv6 literals
    pub fn contact_points(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| {
                if host.contains(':') && !host.starts_with('[') {
                    format!("[{}]:{}", host, self.port)
                } else {
                    format!("{}:{}", host, self.port)
                }
            })
            .collect()
    }
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("hosts", &self.hosts)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Subject and validity of the self-signed certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSubject {
    pub country_name: String,
    pub state_name: String,
    pub locality_name: String,
    pub organization_name: String,
    pub organization_unit: String,
    pub common_name: String,
    pub email_address: String,
    pub serial_number: u64,

    /// Seconds from mint time until the certificate becomes valid
    pub validity_start_in_seconds: i64,

    /// Seconds from mint time until the certificate expires
    pub validity_end_in_seconds: i64,
}

impl Default for CertificateSubject {
    fn default() -> Self {
        Self {
            country_name: "CN".to_string(),
            state_name: "State".to_string(),
            locality_name: "Locality".to_string(),
            organization_name: "Organization".to_string(),
            organization_unit: "Unit".to_string(),
            common_name: "example.com".to_string(),
            email_address: "someone@example.com".to_string(),
            serial_number: 0,
            validity_start_in_seconds: 0,
            validity_end_in_seconds: TEN_YEARS_SECS,
        }
    }
}

impl CertificateSubject {
    /// Length of the validity window in seconds
    pub fn validity_secs(&self) -> i64 {
        self.validity_end_in_seconds - self.validity_start_in_seconds
    }

    /// Check the subject before any key material is generated
    pub fn validate(&self) -> Result<(), MintError> {
        if self.validity_end_in_seconds <= self.validity_start_in_seconds {
            return Err(MintError::InvalidSubject(format!(
                "validity end ({}s) must be after validity start ({}s)",
                self.validity_end_in_seconds, self.validity_start_in_seconds
            )));
        }

        if self.common_name.trim().is_empty() {
            return Err(MintError::InvalidSubject(
                "common name must not be empty".to_string(),
            ));
        }

        let country = &self.country_name;
        if !country.is_empty()
            && (country.len() != 2 || !country.bytes().all(|b| b.is_ascii_alphabetic()))
        {
            return Err(MintError::InvalidSubject(format!(
                "country name '{}' must be a two-letter code",
                country
            )));
        }

        if !self.email_address.is_ascii() {
            return Err(MintError::InvalidSubject(format!(
                "email address '{}' must be ASCII",
                self.email_address
            )));
        }

        Ok(())
    }
}
