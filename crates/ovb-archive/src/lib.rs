pub mod archive;

pub use archive::{build_tar_gz, write_tar_gz, ArchiveEntry, ArchiveError, ArchiveErrorKind};
