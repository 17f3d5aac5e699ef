//! In-memory tar.gz bundling for generated configuration files.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::path::Path;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Crate-level error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveErrorKind {
    IoError,
    EmptyArchive,
}

/// Crate-level error.
#[derive(Debug, Clone)]
pub struct ArchiveError {
    pub kind: ArchiveErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for ArchiveError {}

impl ArchiveError {
    pub fn new(kind: ArchiveErrorKind, msg: impl Into<String>) -> Self {
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

impl From<ArchiveError> for String {
    fn from(e: ArchiveError) -> String {
        e.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Archive building
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One named file inside the bundle.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ArchiveEntry {
    pub fn text(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into().into_bytes(),
        }
    }
}

/// Build a gzip-compressed tar archive in memory.
pub fn build_tar_gz(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    if entries.is_empty() {
        return Err(ArchiveError::new(
            ArchiveErrorKind::EmptyArchive,
            "no files to bundle",
        ));
    }

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, &entry.name, entry.contents.as_slice())
            .map_err(|e| {
                ArchiveError::new(
                    ArchiveErrorKind::IoError,
                    format!("cannot append {}", entry.name),
                )
                .with_detail(e.to_string())
            })?;
    }

    let encoder = builder.into_inner().map_err(|e| {
        ArchiveError::new(ArchiveErrorKind::IoError, "cannot finalise tar stream")
            .with_detail(e.to_string())
    })?;
    encoder.finish().map_err(|e| {
        ArchiveError::new(ArchiveErrorKind::IoError, "cannot finalise gzip stream")
            .with_detail(e.to_string())
    })
}

/// Build the bundle and write it to `path`.
pub fn write_tar_gz(entries: &[ArchiveEntry], path: &Path) -> Result<(), ArchiveError> {
    let bytes = build_tar_gz(entries)?;
    log::debug!("writing {} byte archive to {}", bytes.len(), path.display());
    std::fs::write(path, bytes).map_err(|e| {
        ArchiveError::new(
            ArchiveErrorKind::IoError,
            format!("cannot write {}", path.display()),
        )
        .with_detail(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn unpack(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        let mut out = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            out.push((name, contents));
        }
        out
    }

    #[test]
    fn single_entry_roundtrip() {
        let bytes = build_tar_gz(&[ArchiveEntry::text("server.conf", "port 1194\n")]).unwrap();
        let files = unpack(&bytes);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "server.conf");
        assert_eq!(files[0].1, "port 1194\n");
    }

    #[test]
    fn multiple_entries_keep_order() {
        let bytes = build_tar_gz(&[
            ArchiveEntry::text("a.ovpn", "A"),
            ArchiveEntry::text("b.ovpn", "B"),
        ])
        .unwrap();
        let files = unpack(&bytes);
        assert_eq!(files[0].0, "a.ovpn");
        assert_eq!(files[1].0, "b.ovpn");
    }

    #[test]
    fn empty_archive_is_error() {
        let err = build_tar_gz(&[]).unwrap_err();
        assert_eq!(err.kind, ArchiveErrorKind::EmptyArchive);
    }

    #[test]
    fn output_is_gzip() {
        let bytes = build_tar_gz(&[ArchiveEntry::text("f", "x")]).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn write_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.tar.gz");
        write_tar_gz(&[ArchiveEntry::text("client.ovpn", "client\n")], &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let files = unpack(&bytes);
        assert_eq!(files[0].0, "client.ovpn");
    }
}
