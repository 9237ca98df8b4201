//! Schema statements for the FSMTP keyspace

use std::fmt;

/// Keyspace holding all mail server tables
pub const KEYSPACE: &str = "fannst";

/// Whether a statement can be re-applied without further effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotence {
    /// `CREATE ... IF NOT EXISTS`
    Idempotent,
    /// Unconditional `INSERT`; every run appends a row
    Append,
}

/// One CQL statement in a provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaStatement {
    label: String,
    text: String,
    idempotence: Idempotence,
}

impl SchemaStatement {
    /// A re-appliable statement
    pub fn idempotent(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(label, text, Idempotence::Idempotent)
    }

    /// A statement that appends data on every run
    pub fn append(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(label, text, Idempotence::Append)
    }

    fn new(label: impl Into<String>, text: impl Into<String>, idempotence: Idempotence) -> Self {
        let text = text.into();
        let text = text.trim().trim_end_matches(';').trim_end().to_string();
        Self {
            label: label.into(),
            text,
            idempotence,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Statement text without the trailing semicolon
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn idempotence(&self) -> Idempotence {
        self.idempotence
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotence == Idempotence::Idempotent
    }
}

impl fmt::Display for SchemaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Knobs for [`fsmtp_schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Replication factor for the `SimpleStrategy` keyspace
    pub replication_factor: u32,

    /// Domain seeded into `local_domain`, if any
    pub seed_domain: Option<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            replication_factor: 3,
            seed_domain: Some("fannst.nl".to_string()),
        }
    }
}

const RAW_EMAILS: &str = "
CREATE TABLE IF NOT EXISTS fannst.raw_emails (
  e_bucket BIGINT,
  e_domain VARCHAR,
  e_owners_uuid TIMEUUID,
  e_email_uuid TIMEUUID,
  e_content TEXT,
  PRIMARY KEY ((e_bucket), e_domain, e_owners_uuid, e_email_uuid)
) WITH CLUSTERING ORDER BY (e_domain DESC, e_owners_uuid DESC, e_email_uuid DESC)";

const EMAIL_SHORTCUTS: &str = "
CREATE TABLE IF NOT EXISTS fannst.email_shortcuts (
  e_domain VARCHAR,
  e_subject VARCHAR,
  e_preview VARCHAR,
  e_owners_uuid TIMEUUID,
  e_email_uuid TIMEUUID,
  e_bucket BIGINT,
  e_size_octets BIGINT,
  e_uid INT,
  e_from VARCHAR,
  e_flags INT,
  e_mailbox VARCHAR,
  PRIMARY KEY ((e_domain), e_owners_uuid, e_mailbox, e_email_uuid)
) WITH CLUSTERING ORDER BY (e_owners_uuid DESC, e_mailbox DESC, e_email_uuid DESC)";

const LOCAL_DOMAIN: &str = "
CREATE TABLE IF NOT EXISTS fannst.local_domain (
  e_domain VARCHAR,
  e_domain_uuid TIMEUUID,
  PRIMARY KEY (e_domain, e_domain_uuid)
)";

const MAILBOXES: &str = "
CREATE TABLE IF NOT EXISTS fannst.mailboxes (
  e_bucket BIGINT,
  e_domain VARCHAR,
  e_uuid TIMEUUID,
  e_mailbox_path VARCHAR,
  e_mailbox_stand BOOLEAN,
  e_message_count INT,
  e_flags INT,
  e_subscribed BOOLEAN,
  PRIMARY KEY ((e_bucket), e_domain, e_uuid, e_mailbox_path)
) WITH CLUSTERING ORDER BY (e_domain DESC, e_uuid DESC, e_mailbox_path DESC)";

const ACCOUNTS: &str = "
CREATE TABLE IF NOT EXISTS fannst.accounts (
  a_username VARCHAR,
  a_picture_uri VARCHAR,
  a_password VARCHAR,
  a_domain VARCHAR,
  a_bucket BIGINT,
  a_full_name VARCHAR,
  a_birth_date BIGINT,
  a_creation_date BIGINT,
  a_rsa_public TEXT,
  a_rsa_private TEXT,
  a_gas DOUBLE,
  a_country VARCHAR,
  a_region VARCHAR,
  a_city VARCHAR,
  a_address VARCHAR,
  a_phone VARCHAR,
  a_type TINYINT,
  a_uuid TIMEUUID,
  a_flags BIGINT,
  a_storage_used_bytes BIGINT,
  a_storage_max_bytes BIGINT,
  PRIMARY KEY ((a_bucket), a_domain, a_uuid)
) WITH CLUSTERING ORDER BY (a_domain DESC, a_uuid DESC)";

const ACCOUNT_SHORTCUTS: &str = "
CREATE TABLE IF NOT EXISTS fannst.account_shortcuts (
  a_bucket BIGINT,
  a_domain VARCHAR,
  a_uuid TIMEUUID,
  a_username VARCHAR,
  PRIMARY KEY ((a_domain), a_username)
) WITH CLUSTERING ORDER BY (a_username DESC)";

/// The FSMTP keyspace, its tables and the optional `local_domain` seed.
///
/// Order matters: the keyspace comes first and the seed insert follows
/// every table. Only the seed is non-idempotent.
pub fn fsmtp_schema(options: &SchemaOptions) -> Vec<SchemaStatement> {
    let mut statements = vec![
        SchemaStatement::idempotent(
            "keyspace",
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = {{\n  'class': 'SimpleStrategy',\n  'replication_factor': {}\n}}",
                KEYSPACE, options.replication_factor
            ),
        ),
        SchemaStatement::idempotent("raw_emails", RAW_EMAILS),
        SchemaStatement::idempotent("email_shortcuts", EMAIL_SHORTCUTS),
        SchemaStatement::idempotent("local_domain", LOCAL_DOMAIN),
        SchemaStatement::idempotent("mailboxes", MAILBOXES),
        SchemaStatement::idempotent("accounts", ACCOUNTS),
        SchemaStatement::idempotent("account_shortcuts", ACCOUNT_SHORTCUTS),
    ];

    if let Some(domain) = options.seed_domain.as_deref().filter(|d| !d.is_empty()) {
        statements.push(SchemaStatement::append(
            "seed_local_domain",
            format!(
                "INSERT INTO {}.local_domain (e_domain, e_domain_uuid) VALUES ('{}', now())",
                KEYSPACE,
                quote_literal(domain)
            ),
        ));
    }

    statements
}

/// Render statements as a CQL script for operator review
pub fn render_script(statements: &[SchemaStatement]) -> String {
    let mut script = String::new();
    for (index, statement) in statements.iter().enumerate() {
        let marker = if statement.is_idempotent() {
            ""
        } else {
            ", NOT idempotent"
        };
        script.push_str(&format!("-- #{} {}{}\n", index, statement.label(), marker));
        script.push_str(statement.text());
        script.push_str(";\n\n");
    }
    script
}

/// Escape a CQL string literal body
fn quote_literal(value: &str) -> String {
    value.replace('\'', "''")
}
