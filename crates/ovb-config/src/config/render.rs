//! Config rendering (`ServerConfig` → client text, parameters → server text).

use crate::config::types::*;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Client config rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Directives a client config requires from the parsed server config,
/// checked in this order.
const REQUIRED_DIRECTIVES: [&str; 4] = ["dev", "proto", "remote", "port"];

/// Inline blocks a client config requires, checked after the directives.
/// The `dh` block is server-side only and is never re-emitted.
const REQUIRED_BLOCKS: [BlockName; 4] = [
    BlockName::Ca,
    BlockName::Cert,
    BlockName::Key,
    BlockName::TlsAuth,
];

/// Render a client `.ovpn` config from a parsed server configuration.
///
/// Fails with a `MissingField` error naming the first absent directive or
/// block before producing any output.
pub fn render_client_config(cfg: &ServerConfig) -> Result<String, ConfigError> {
    for key in REQUIRED_DIRECTIVES {
        if cfg.get(key).is_none() {
            return Err(ConfigError::missing_field(key));
        }
    }
    for name in REQUIRED_BLOCKS {
        if cfg.block(name).is_none() {
            return Err(ConfigError::missing_field(name.tag_name()));
        }
    }

    // Presence checked above.
    let dev = cfg.get("dev").unwrap_or_default();
    let proto = cfg.get("proto").unwrap_or_default();
    let remote = cfg.get("remote").unwrap_or_default();
    let port = cfg.get("port").unwrap_or_default();

    let mut lines: Vec<String> = Vec::new();
    lines.push("client".to_string());
    lines.push(format!("dev {}", dev));
    lines.push(format!("proto {}", proto));
    lines.push(format!("remote {} {}", remote, port));
    lines.push("resolv-retry infinite".to_string());
    lines.push("nobind".to_string());
    lines.push("user nobody".to_string());
    lines.push("group nogroup".to_string());
    lines.push("persist-key".to_string());
    lines.push("persist-tun".to_string());
    lines.push("ca [inline]".to_string());
    lines.push("cert [inline]".to_string());
    lines.push("key [inline]".to_string());
    lines.push("tls-auth [inline] 1".to_string());
    lines.push("cipher AES-256-CBC".to_string());
    lines.push("verb 3".to_string());
    lines.push(String::new());

    for name in REQUIRED_BLOCKS {
        push_block(&mut lines, name, cfg.block(name).unwrap_or_default());
    }

    Ok(lines.join("\n") + "\n")
}

fn push_block(lines: &mut Vec<String>, name: BlockName, body: &str) {
    lines.push(name.open_tag());
    lines.push(body.trim_end().to_string());
    lines.push(name.close_tag());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Server config rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection parameters for a rendered server config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerParams {
    pub ip: String,
    pub port: String,
    pub proto: String,
    pub dev: String,
}

/// The five PEM materials embedded into a server config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineMaterials {
    pub ca: String,
    pub cert: String,
    pub key: String,
    pub dh: String,
    pub tls_auth: String,
}

/// Render a full server config with all five inline blocks. The output
/// parses back through [`crate::config::parse::parse_server_config`].
pub fn render_server_config(params: &ServerParams, materials: &InlineMaterials) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("port {}", params.port));
    lines.push(format!("proto {}", params.proto));
    lines.push(format!("dev {}", params.dev));
    lines.push(format!("remote {}", params.ip));
    lines.push("server 10.8.0.0 255.255.255.0".to_string());
    lines.push("ifconfig-pool-persist ipp.txt".to_string());
    lines.push("keepalive 10 120".to_string());
    lines.push("cipher AES-256-CBC".to_string());
    lines.push("user nobody".to_string());
    lines.push("group nogroup".to_string());
    lines.push("persist-key".to_string());
    lines.push("persist-tun".to_string());
    lines.push("status openvpn-status.log".to_string());
    lines.push("log-append /var/log/openvpn.log".to_string());
    lines.push("verb 3".to_string());
    lines.push(String::new());

    push_block(&mut lines, BlockName::Ca, &materials.ca);
    push_block(&mut lines, BlockName::Cert, &materials.cert);
    push_block(&mut lines, BlockName::Key, &materials.key);
    push_block(&mut lines, BlockName::Dh, &materials.dh);
    push_block(&mut lines, BlockName::TlsAuth, &materials.tls_auth);

    lines.join("\n") + "\n"
}
