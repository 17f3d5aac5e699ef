//! PKI workspace provisioning – easy-rsa staging, the fixed certificate
//! issuance sequence, and material readback.

use crate::pki::pem::extract_pem_blocks;
use crate::pki::runner::ToolRunner;
use crate::pki::types::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Command plan
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the fixed easy-rsa issuance sequence for a staged workspace.
///
/// All `easyrsa` steps run batch with CN `server` so nothing prompts; the
/// final step uses the OpenVPN binary itself to generate the static
/// tls-auth key.
pub fn provision_plan(workspace: &Path, openvpn_binary: &Path) -> Vec<ToolCommand> {
    let batch = |cmd: ToolCommand| {
        cmd.env("EASYRSA_BATCH", "1")
            .env("EASYRSA_REQ_CN", "server")
            .cwd(workspace)
    };

    vec![
        batch(ToolCommand::new("./easyrsa").arg("init-pki")),
        batch(ToolCommand::new("./easyrsa").args(["build-ca", "nopass"])),
        batch(ToolCommand::new("./easyrsa").arg("gen-dh")),
        batch(ToolCommand::new("./easyrsa").args(["gen-req", "server", "nopass"])),
        batch(ToolCommand::new("./easyrsa").args(["sign-req", "server", "server"])),
        ToolCommand::new(openvpn_binary.to_string_lossy().to_string())
            .args(["--genkey", "--secret", "ta.key"])
            .cwd(workspace),
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Version probing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ask the OpenVPN binary for its version. The banner goes to stdout and
/// the binary exits nonzero for `--version`, so the output is parsed
/// regardless of exit status.
pub async fn probe_openvpn_version(
    runner: &dyn ToolRunner,
    openvpn_binary: &Path,
) -> Result<Option<String>, PkiError> {
    let cmd = ToolCommand::new(openvpn_binary.to_string_lossy().to_string()).arg("--version");
    let output = runner.run(&cmd).await?;
    Ok(parse_openvpn_version(&output.stdout).or_else(|| parse_openvpn_version(&output.stderr)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Staging
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Copy the easy-rsa distribution into the workspace so issuance never
/// touches the system-wide install.
pub fn stage_easy_rsa(source: &Path, workspace: &Path) -> Result<(), PkiError> {
    if !source.is_dir() {
        return Err(PkiError::new(
            PkiErrorKind::ToolNotFound,
            format!("easy-rsa distribution not found at {}", source.display()),
        ));
    }

    std::fs::create_dir_all(workspace).map_err(|e| {
        PkiError::new(
            PkiErrorKind::IoError,
            format!("cannot create workspace {}", workspace.display()),
        )
        .with_detail(e.to_string())
    })?;

    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), workspace.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        let entries = std::fs::read_dir(&from).map_err(|e| {
            PkiError::new(
                PkiErrorKind::IoError,
                format!("cannot read {}", from.display()),
            )
            .with_detail(e.to_string())
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                PkiError::new(PkiErrorKind::IoError, "cannot enumerate easy-rsa files")
                    .with_detail(e.to_string())
            })?;
            let src = entry.path();
            let dst = to.join(entry.file_name());
            let file_type = entry.file_type().map_err(|e| {
                PkiError::new(PkiErrorKind::IoError, "cannot stat easy-rsa file")
                    .with_detail(e.to_string())
            })?;
            if file_type.is_dir() {
                std::fs::create_dir_all(&dst).map_err(|e| {
                    PkiError::new(
                        PkiErrorKind::IoError,
                        format!("cannot create {}", dst.display()),
                    )
                    .with_detail(e.to_string())
                })?;
                pending.push((src, dst));
            } else {
                std::fs::copy(&src, &dst).map_err(|e| {
                    PkiError::new(
                        PkiErrorKind::IoError,
                        format!("cannot copy {}", src.display()),
                    )
                    .with_detail(e.to_string())
                })?;
            }
        }
    }

    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Workspace
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A scratch directory holding a staged easy-rsa tree and, after
/// [`provision`](Self::provision), the issued PKI materials.
pub struct PkiWorkspace {
    root: PathBuf,
    runner: Arc<dyn ToolRunner>,
}

impl PkiWorkspace {
    /// Stage the easy-rsa distribution from `easy_rsa_source` into `root`.
    pub fn stage(
        easy_rsa_source: &Path,
        root: impl Into<PathBuf>,
        runner: Arc<dyn ToolRunner>,
    ) -> Result<Self, PkiError> {
        let root = root.into();
        stage_easy_rsa(easy_rsa_source, &root)?;
        Ok(Self { root, runner })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the full issuance sequence. Stops at the first failing step and
    /// surfaces its command line and captured stderr unchanged.
    pub async fn provision(&self, openvpn_binary: &Path) -> Result<(), PkiError> {
        for cmd in provision_plan(&self.root, openvpn_binary) {
            let output = self.runner.run(&cmd).await?;
            if !output.success() {
                log::error!("tool step failed: {}", cmd.display_line());
                return Err(PkiError::new(
                    PkiErrorKind::ToolFailed,
                    format!("command failed: {}", cmd.display_line()),
                )
                .with_detail(output.stderr));
            }
        }
        Ok(())
    }

    /// Read back the issued materials and log their certificate
    /// fingerprints.
    pub async fn materials(&self) -> Result<PkiMaterials, PkiError> {
        let materials = PkiMaterials::load(&self.root).await?;
        for block in extract_pem_blocks(&materials.ca_cert)
            .iter()
            .chain(extract_pem_blocks(&materials.server_cert).iter())
        {
            match block.fingerprint_sha256() {
                Ok(fp) => log::info!("issued {}: sha256 {}", block.label, fp),
                Err(e) => log::warn!("cannot fingerprint {}: {}", block.label, e),
            }
        }
        Ok(materials)
    }
}
