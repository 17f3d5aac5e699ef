//! Service configuration, built once at startup from environment variables.

use ovb_pki::{find_easy_rsa_dir, find_openvpn_binary};
use std::path::PathBuf;

/// Runtime settings for the bundler service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory holding the easy-rsa distribution to stage per request.
    pub easy_rsa_dir: PathBuf,
    /// OpenVPN binary used for tls-auth key generation.
    pub openvpn_binary: PathBuf,
}

impl Settings {
    /// Read settings from `OVB_BIND`, `OVB_EASYRSA_DIR` and
    /// `OVB_OPENVPN_BIN`, falling back to discovery and sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Tests inject a
    /// closure here instead of mutating process-wide environment state.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = get("OVB_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let easy_rsa_dir = get("OVB_EASYRSA_DIR").map(PathBuf::from).unwrap_or_else(|| {
            find_easy_rsa_dir().unwrap_or_else(|| PathBuf::from("/usr/share/easy-rsa"))
        });
        let openvpn_binary = get("OVB_OPENVPN_BIN").map(PathBuf::from).unwrap_or_else(|| {
            find_openvpn_binary().unwrap_or_else(|| PathBuf::from("openvpn"))
        });

        Self {
            bind_addr,
            easy_rsa_dir,
            openvpn_binary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_take_precedence() {
        let s = Settings::from_lookup(|key| match key {
            "OVB_BIND" => Some("0.0.0.0:9999".to_string()),
            "OVB_EASYRSA_DIR" => Some("/opt/easy-rsa".to_string()),
            "OVB_OPENVPN_BIN" => Some("/opt/bin/openvpn".to_string()),
            _ => None,
        });
        assert_eq!(s.bind_addr, "0.0.0.0:9999");
        assert_eq!(s.easy_rsa_dir, PathBuf::from("/opt/easy-rsa"));
        assert_eq!(s.openvpn_binary, PathBuf::from("/opt/bin/openvpn"));
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let s = Settings::from_lookup(|_| None);
        assert_eq!(s.bind_addr, "127.0.0.1:8080");
        assert!(!s.openvpn_binary.as_os_str().is_empty());
    }
}
