//! Shared types, error types, and binary discovery for the PKI crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Crate-level error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkiErrorKind {
    ToolNotFound,
    ToolFailed,
    IoError,
    ParseError,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkiError {
    pub kind: PkiErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for PkiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for PkiError {}

impl PkiError {
    pub fn new(kind: PkiErrorKind, msg: impl Into<String>) -> Self {
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
}

impl From<PkiError> for String {
    fn from(e: PkiError) -> String {
        e.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tool command description
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single external command to execute: program, args, env, working dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Single-line rendering for logs and error messages.
    pub fn display_line(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_line())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Provisioned PKI materials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The five PEM materials a provisioned PKI workspace produces, read back
/// as opaque text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkiMaterials {
    pub ca_cert: String,
    pub server_cert: String,
    pub server_key: String,
    pub dh_params: String,
    pub tls_auth_key: String,
}

impl PkiMaterials {
    /// Relative paths of the five output files under the workspace root.
    pub const OUTPUT_FILES: [&'static str; 5] = [
        "pki/ca.crt",
        "pki/issued/server.crt",
        "pki/private/server.key",
        "pki/dh.pem",
        "ta.key",
    ];

    /// Read the five output files from a provisioned workspace directory.
    pub async fn load(dir: &Path) -> Result<Self, PkiError> {
        let read = |rel: &'static str| {
            let path = dir.join(rel);
            async move {
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    PkiError::new(
                        PkiErrorKind::IoError,
                        format!("cannot read {}", path.display()),
                    )
                    .with_detail(e.to_string())
                })
            }
        };

        Ok(Self {
            ca_cert: read("pki/ca.crt").await?,
            server_cert: read("pki/issued/server.crt").await?,
            server_key: read("pki/private/server.key").await?,
            dh_params: read("pki/dh.pem").await?,
            tls_auth_key: read("ta.key").await?,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Binary location helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Well-known locations of the easy-rsa script distribution.
pub fn default_easy_rsa_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/share/easy-rsa"),
        PathBuf::from("/usr/local/share/easy-rsa"),
        PathBuf::from("/etc/easy-rsa"),
    ]
}

/// Find an easy-rsa distribution directory on the system.
pub fn find_easy_rsa_dir() -> Option<PathBuf> {
    default_easy_rsa_dirs().into_iter().find(|p| p.is_dir())
}

/// Well-known OpenVPN binary paths.
pub fn default_openvpn_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/sbin/openvpn"),
        PathBuf::from("/usr/bin/openvpn"),
        PathBuf::from("/usr/local/sbin/openvpn"),
    ]
}

/// Try to find the openvpn binary on the system.
pub fn find_openvpn_binary() -> Option<PathBuf> {
    for p in default_openvpn_paths() {
        if p.exists() {
            return Some(p);
        }
    }
    // Fall back to PATH
    if let Ok(path_env) = std::env::var("PATH") {
        for dir in path_env.split(':') {
            let full = PathBuf::from(dir).join("openvpn");
            if full.exists() {
                return Some(full);
            }
        }
    }
    None
}

/// Pull the version number out of an OpenVPN banner line.
pub fn parse_openvpn_version(output: &str) -> Option<String> {
    let re = regex::Regex::new(r"OpenVPN\s+(\d+\.\d+\.\d+)").ok()?;
    re.captures(output).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── PkiError ─────────────────────────────────────────────────

    #[test]
    fn error_display() {
        let e = PkiError::new(PkiErrorKind::ToolFailed, "gen-dh failed");
        assert!(e.to_string().contains("gen-dh failed"));
        let e2 = e.with_detail("stderr text");
        assert!(e2.to_string().contains("stderr text"));
    }

    #[test]
    fn error_into_string() {
        let e = PkiError::new(PkiErrorKind::ToolNotFound, "no easyrsa");
        let s: String = e.into();
        assert!(s.contains("no easyrsa"));
    }

    // ── ToolCommand ──────────────────────────────────────────────

    #[test]
    fn tool_command_builder() {
        let cmd = ToolCommand::new("./easyrsa")
            .arg("init-pki")
            .env("EASYRSA_BATCH", "1")
            .cwd("/tmp/work");
        assert_eq!(cmd.program, "./easyrsa");
        assert_eq!(cmd.args, vec!["init-pki"]);
        assert_eq!(cmd.env, vec![("EASYRSA_BATCH".to_string(), "1".to_string())]);
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/tmp/work")));
    }

    #[test]
    fn tool_command_display_line() {
        let cmd = ToolCommand::new("openvpn").args(["--genkey", "--secret", "ta.key"]);
        assert_eq!(cmd.display_line(), "openvpn --genkey --secret ta.key");
    }

    // ── Binary helpers ───────────────────────────────────────────

    #[test]
    fn default_paths_not_empty() {
        assert!(!default_easy_rsa_dirs().is_empty());
        assert!(!default_openvpn_paths().is_empty());
    }

    #[test]
    fn parse_version_valid() {
        let out = "OpenVPN 2.6.8 x86_64-pc-linux-gnu [SSL (OpenSSL)]";
        assert_eq!(parse_openvpn_version(out), Some("2.6.8".into()));
    }

    #[test]
    fn parse_version_invalid() {
        assert_eq!(parse_openvpn_version("no version here"), None);
    }

    // ── Output file list ─────────────────────────────────────────

    #[test]
    fn output_files_cover_all_materials() {
        assert_eq!(PkiMaterials::OUTPUT_FILES.len(), 5);
        assert!(PkiMaterials::OUTPUT_FILES.contains(&"ta.key"));
    }
}
