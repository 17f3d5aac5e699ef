pub mod pki;

pub use pki::pem::{extract_pem_blocks, PemBlock};
pub use pki::runner::{SystemRunner, ToolOutput, ToolRunner};
pub use pki::toolkit::{probe_openvpn_version, provision_plan, stage_easy_rsa, PkiWorkspace};
pub use pki::types::{
    find_easy_rsa_dir, find_openvpn_binary, parse_openvpn_version, PkiError, PkiErrorKind,
    PkiMaterials, ToolCommand,
};
