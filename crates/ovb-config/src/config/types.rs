//! Shared types and error types for server configuration documents.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Reserved inline blocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The five reserved inline block names a server configuration may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockName {
    Ca,
    Cert,
    Key,
    Dh,
    TlsAuth,
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_name())
    }
}

impl BlockName {
    pub const ALL: [BlockName; 5] = [
        BlockName::Ca,
        BlockName::Cert,
        BlockName::Key,
        BlockName::Dh,
        BlockName::TlsAuth,
    ];

    /// Bare tag name without the angle brackets.
    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Ca => "ca",
            Self::Cert => "cert",
            Self::Key => "key",
            Self::Dh => "dh",
            Self::TlsAuth => "tls-auth",
        }
    }

    /// Opening tag line, e.g. `<ca>`.
    pub fn open_tag(&self) -> String {
        format!("<{}>", self.tag_name())
    }

    /// Closing tag line, e.g. `</ca>`.
    pub fn close_tag(&self) -> String {
        format!("</{}>", self.tag_name())
    }

    /// Match a trimmed line against the reserved opening tags.
    pub fn from_open_tag(line: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| line == b.open_tag())
    }

    /// Match a trimmed line against the reserved closing tags.
    pub fn from_close_tag(line: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| line == b.close_tag())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parsed server configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A parsed server configuration: directives in file order plus the
/// reserved inline blocks, stored whitespace-trimmed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Key/value directives in the order they appeared.
    pub directives: Vec<(String, String)>,
    pub inline_ca: Option<String>,
    pub inline_cert: Option<String>,
    pub inline_key: Option<String>,
    pub inline_dh: Option<String>,
    pub inline_tls_auth: Option<String>,
}

impl ServerConfig {
    /// Look up a directive by key. Last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.directives
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an inline block body.
    pub fn block(&self, name: BlockName) -> Option<&str> {
        match name {
            BlockName::Ca => self.inline_ca.as_deref(),
            BlockName::Cert => self.inline_cert.as_deref(),
            BlockName::Key => self.inline_key.as_deref(),
            BlockName::Dh => self.inline_dh.as_deref(),
            BlockName::TlsAuth => self.inline_tls_auth.as_deref(),
        }
    }

    pub fn set_block(&mut self, name: BlockName, body: String) {
        let slot = match name {
            BlockName::Ca => &mut self.inline_ca,
            BlockName::Cert => &mut self.inline_cert,
            BlockName::Key => &mut self.inline_key,
            BlockName::Dh => &mut self.inline_dh,
            BlockName::TlsAuth => &mut self.inline_tls_auth,
        };
        *slot = Some(body);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Crate-level error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigErrorKind {
    MalformedConfig,
    MissingField,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::MalformedConfig, msg)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ConfigErrorKind::MissingField,
            format!("missing required field: {}", field),
        )
    }
}

impl From<ConfigError> for String {
    fn from(e: ConfigError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── BlockName ────────────────────────────────────────────────

    #[test]
    fn block_name_tags() {
        assert_eq!(BlockName::Ca.open_tag(), "<ca>");
        assert_eq!(BlockName::TlsAuth.close_tag(), "</tls-auth>");
        assert_eq!(BlockName::Dh.tag_name(), "dh");
    }

    #[test]
    fn block_name_from_open_tag() {
        assert_eq!(BlockName::from_open_tag("<ca>"), Some(BlockName::Ca));
        assert_eq!(
            BlockName::from_open_tag("<tls-auth>"),
            Some(BlockName::TlsAuth)
        );
        assert_eq!(BlockName::from_open_tag("<unknown>"), None);
        assert_eq!(BlockName::from_open_tag("</ca>"), None);
    }

    #[test]
    fn block_name_from_close_tag() {
        assert_eq!(BlockName::from_close_tag("</key>"), Some(BlockName::Key));
        assert_eq!(BlockName::from_close_tag("<key>"), None);
    }

    #[test]
    fn block_name_serde() {
        let json = serde_json::to_string(&BlockName::TlsAuth).unwrap();
        assert_eq!(json, "\"tls-auth\"");
        let back: BlockName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BlockName::TlsAuth);
    }

    // ── ServerConfig ─────────────────────────────────────────────

    #[test]
    fn get_last_duplicate_wins() {
        let mut cfg = ServerConfig::default();
        cfg.directives.push(("port".into(), "1194".into()));
        cfg.directives.push(("port".into(), "443".into()));
        assert_eq!(cfg.get("port"), Some("443"));
    }

    #[test]
    fn get_missing_key() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.get("proto"), None);
    }

    #[test]
    fn block_roundtrip_through_setter() {
        let mut cfg = ServerConfig::default();
        cfg.set_block(BlockName::Dh, "DH-BODY".into());
        assert_eq!(cfg.block(BlockName::Dh), Some("DH-BODY"));
        assert_eq!(cfg.block(BlockName::Ca), None);
    }

    // ── ConfigError ──────────────────────────────────────────────

    #[test]
    fn error_display() {
        let e = ConfigError::malformed("bad tag").with_detail("line 3");
        let s = e.to_string();
        assert!(s.contains("bad tag"));
        assert!(s.contains("line 3"));
    }

    #[test]
    fn missing_field_names_the_field() {
        let e = ConfigError::missing_field("remote");
        assert_eq!(e.kind, ConfigErrorKind::MissingField);
        assert!(e.message.contains("remote"));
    }

    #[test]
    fn error_into_string() {
        let e = ConfigError::malformed("oops");
        let s: String = e.into();
        assert!(s.contains("oops"));
    }
}
