//! HTTP boundary: form page, server bundle generation, and client config
//! generation from an uploaded server config.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use ovb_archive::{write_tar_gz, ArchiveEntry, ArchiveError};
use ovb_config::{
    parse_server_config, render_client_config, render_server_config, ConfigError,
    ConfigErrorKind, InlineMaterials, ServerParams,
};
use ovb_pki::{PkiError, PkiWorkspace, ToolRunner};

use crate::settings::Settings;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  State and router
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shared per-request state. No process-wide singletons; everything a
/// handler needs travels through here.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub runner: Arc<dyn ToolRunner>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, runner: Arc<dyn ToolRunner>) -> Self {
        Self { settings, runner }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/generate_client_from_server", post(generate_client))
        .with_state(state)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Handler-level error, rendered back onto the index page.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Pki(PkiError),
    Archive(ArchiveError),
    BadRequest(String),
    Internal(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PkiError> for AppError {
    fn from(e: PkiError) -> Self {
        Self::Pki(e)
    }
}

impl From<ArchiveError> for AppError {
    fn from(e: ArchiveError) -> Self {
        Self::Archive(e)
    }
}

impl AppError {
    /// User-facing message. Each error kind keeps a distinct phrasing so
    /// the page tells parse failures, incomplete configs, and tool
    /// failures apart.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => match e.kind {
                ConfigErrorKind::MalformedConfig => {
                    format!("Could not parse the server configuration: {}", e.message)
                }
                ConfigErrorKind::MissingField => {
                    format!("The server configuration is incomplete: {}", e.message)
                }
            },
            Self::Pki(e) => match &e.detail {
                Some(stderr) if !stderr.is_empty() => {
                    format!("External tool error: {}: {}", e.message, stderr.trim())
                }
                _ => format!("External tool error: {}", e.message),
            },
            Self::Archive(e) => format!("Could not build the archive: {}", e.message),
            Self::BadRequest(msg) => msg.clone(),
            Self::Internal(msg) => format!("Internal error: {}", msg),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Pki(_) | Self::Archive(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.user_message();
        log::warn!("request failed: {}", message);
        (self.status(), Html(render_page(Some(&message)))).into_response()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Index page
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>OpenVPN Bundler</title></head>
<body>
<h1>OpenVPN Configuration Bundler</h1>
{error}
<h2>Generate server bundle</h2>
<form action="/generate" method="post">
  <label>Server IP <input type="text" name="server_ip" required></label><br>
  <label>Port <input type="text" name="port" value="1194" required></label><br>
  <label>Protocol <select name="proto"><option value="udp">udp</option><option value="tcp">tcp</option></select></label><br>
  <label>Device <select name="dev"><option value="tun">tun</option><option value="tap">tap</option></select></label><br>
  <button type="submit">Generate</button>
</form>
<h2>Generate client config from server config</h2>
<form action="/generate_client_from_server" method="post" enctype="multipart/form-data">
  <label>Server config <input type="file" name="server_conf_file" required></label><br>
  <label>Client name <input type="text" name="client_name" required></label><br>
  <button type="submit">Generate client</button>
</form>
</body>
</html>
"#;

fn render_page(error: Option<&str>) -> String {
    let banner = match error {
        Some(msg) => format!("<p class=\"error\">{}</p>", escape_html(msg)),
        None => String::new(),
    };
    INDEX_TEMPLATE.replace("{error}", &banner)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

async fn index() -> Html<String> {
    Html(render_page(None))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Server bundle generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub server_ip: String,
    pub port: String,
    pub proto: String,
    pub dev: String,
}

async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, AppError> {
    for (name, value) in [
        ("server_ip", &form.server_ip),
        ("port", &form.port),
        ("proto", &form.proto),
        ("dev", &form.dev),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{} must not be empty", name)));
        }
    }

    // Per-request scratch dir; dropped (and deleted) on any exit path, so
    // a failed run leaves no partial state behind.
    let scratch = tempfile::tempdir()
        .map_err(|e| AppError::Internal(format!("cannot create scratch dir: {}", e)))?;
    let root = scratch.path().join("easy-rsa");

    let workspace = PkiWorkspace::stage(&state.settings.easy_rsa_dir, &root, state.runner.clone())?;
    workspace.provision(&state.settings.openvpn_binary).await?;
    let materials = workspace.materials().await?;

    let params = ServerParams {
        ip: form.server_ip,
        port: form.port,
        proto: form.proto,
        dev: form.dev,
    };
    let inline = InlineMaterials {
        ca: materials.ca_cert,
        cert: materials.server_cert,
        key: materials.server_key,
        dh: materials.dh_params,
        tls_auth: materials.tls_auth_key,
    };
    let server_conf = render_server_config(&params, &inline);

    let archive_path = scratch.path().join("configurations.tar.gz");
    write_tar_gz(&[ArchiveEntry::text("server.conf", server_conf)], &archive_path)?;
    let bytes = tokio::fs::read(&archive_path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read archive: {}", e)))?;
    tracing::info!(ip = %params.ip, "generated server bundle");
    Ok(attachment("configurations.tar.gz", bytes))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Client config generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn generate_client(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut server_conf: Option<String> = None;
    let mut client_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("server_conf_file") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("cannot read upload: {}", e)))?;
                server_conf = Some(text);
            }
            Some("client_name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("cannot read field: {}", e)))?;
                client_name = Some(text);
            }
            _ => {}
        }
    }

    let server_conf = server_conf
        .ok_or_else(|| AppError::BadRequest("server_conf_file is required".to_string()))?;
    let client_name = sanitize_client_name(client_name.as_deref().unwrap_or_default())?;

    let cfg = parse_server_config(&server_conf)?;
    let client_conf = render_client_config(&cfg)?;

    // Same scratch-dir discipline as /generate: dropped on any exit path.
    let scratch = tempfile::tempdir()
        .map_err(|e| AppError::Internal(format!("cannot create scratch dir: {}", e)))?;
    let archive_name = format!("{}_configurations.tar.gz", client_name);
    let archive_path = scratch.path().join(&archive_name);
    write_tar_gz(
        &[ArchiveEntry::text(format!("{}.ovpn", client_name), client_conf)],
        &archive_path,
    )?;
    let bytes = tokio::fs::read(&archive_path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read archive: {}", e)))?;
    tracing::info!(client = %client_name, "generated client bundle");
    Ok(attachment(&archive_name, bytes))
}

/// The client name becomes part of two filenames; reject anything that
/// could escape the attachment name or the archive entry.
pub fn sanitize_client_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("client_name must not be empty".to_string()));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || name.contains("..") || Path::new(name).components().count() != 1 {
        return Err(AppError::BadRequest(format!(
            "client_name '{}' contains invalid characters",
            name
        )));
    }
    Ok(name.to_string())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Responses
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/gzip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovb_config::ConfigError;
    use ovb_pki::{PkiErrorKind, SystemRunner};

    // ── Router ───────────────────────────────────────────────────

    #[test]
    fn router_builds() {
        let settings = Arc::new(Settings {
            bind_addr: "127.0.0.1:0".into(),
            easy_rsa_dir: "/usr/share/easy-rsa".into(),
            openvpn_binary: "openvpn".into(),
        });
        let state = AppState::new(settings, Arc::new(SystemRunner));
        let _router = create_router(state);
    }

    // ── Client name sanitising ───────────────────────────────────

    #[test]
    fn sanitize_accepts_plain_names() {
        assert_eq!(sanitize_client_name("laptop-01").unwrap(), "laptop-01");
        assert_eq!(sanitize_client_name("  alice_phone ").unwrap(), "alice_phone");
    }

    #[test]
    fn sanitize_rejects_empty() {
        assert!(sanitize_client_name("").is_err());
        assert!(sanitize_client_name("   ").is_err());
    }

    #[test]
    fn sanitize_rejects_path_escapes() {
        assert!(sanitize_client_name("../etc/passwd").is_err());
        assert!(sanitize_client_name("a/b").is_err());
        assert!(sanitize_client_name("a\\b").is_err());
        assert!(sanitize_client_name("name with spaces").is_err());
    }

    // ── Error messages ───────────────────────────────────────────

    #[test]
    fn malformed_and_missing_messages_differ() {
        let malformed = AppError::Config(ConfigError::malformed("unterminated block <ca>"));
        let missing = AppError::Config(ConfigError::missing_field("remote"));
        let m1 = malformed.user_message();
        let m2 = missing.user_message();
        assert!(m1.contains("Could not parse"));
        assert!(m2.contains("incomplete"));
        assert!(m2.contains("remote"));
        assert_ne!(m1, m2);
    }

    #[test]
    fn tool_error_carries_stderr() {
        let e = AppError::Pki(
            PkiError::new(PkiErrorKind::ToolFailed, "command failed: ./easyrsa gen-dh")
                .with_detail("easyrsa: broken\n"),
        );
        let msg = e.user_message();
        assert!(msg.contains("External tool error"));
        assert!(msg.contains("gen-dh"));
        assert!(msg.contains("easyrsa: broken"));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            AppError::Config(ConfigError::malformed("x")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Pki(PkiError::new(PkiErrorKind::ToolFailed, "x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    // ── Page rendering ───────────────────────────────────────────

    #[test]
    fn page_without_error_has_no_banner() {
        let page = render_page(None);
        assert!(!page.contains("class=\"error\""));
        assert!(page.contains("/generate_client_from_server"));
    }

    #[test]
    fn page_escapes_error_text() {
        let page = render_page(Some("bad <tag> & more"));
        assert!(page.contains("bad &lt;tag&gt; &amp; more"));
        assert!(!page.contains("bad <tag>"));
    }
}
