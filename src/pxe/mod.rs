//! Boot configuration generation.
//!
//! # Data Flow
//! ```text
//! apply request (template id, serial)
//!     → storage: Server + ConfigTemplate
//!     → mac.rs (MAC → 01-aa-bb-cc-dd-ee-ff)
//!     → generator.rs (pick BootFamily, render, write)
//!         → kickstart.rs / preseed.rs (legacy PXE document)
//!         → grub.rs (UEFI descriptor, optional)
//!     → <tftp root>/<legacy path>/<filename> [+ <tftp root>/<uefi path>/grub.cfg]
//! ```
//!
//! # Design Decisions
//! - Rendering is pure; all filesystem effects live in the generator
//! - Files are replaced via rename so a booting machine never reads a
//!   half-written document
//! - No rollback across the two files; a failed generate is retried by
//!   generating again

mod generator;
mod grub;
mod kickstart;
mod mac;
mod preseed;

pub use generator::{BootConfigGenerator, BootFamily, GeneratedArtifacts};
pub use mac::pxe_filename;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootConfigError {
    #[error("invalid MAC address: '{0}'")]
    InvalidAddress(String),

    #[error("unsupported system type: '{0}'")]
    UnsupportedSystemType(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
