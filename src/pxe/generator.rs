//! Boot artifact generator.
//!
//! # Responsibilities
//! - Select a renderer from the template's OS family
//! - Derive the per-MAC legacy PXE path
//! - Write the legacy document and, when enabled, the UEFI GRUB menu
//!
//! # Design Decisions
//! - Everything that can be rejected (MAC, family) is checked before any
//!   file is touched
//! - Writes go to a hidden sibling first and are renamed into place
//! - Legacy first, then UEFI; a failure after the first write leaves the
//!   legacy document in place and regenerating overwrites both

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::TftpConfig;
use crate::observability::metrics;
use crate::storage::{ConfigTemplate, Server};

use super::{grub, kickstart, mac, preseed, BootConfigError};

/// Installer family, selected from a template's `system_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootFamily {
    /// Anaconda kickstart: CentOS, RHEL, Rocky, AlmaLinux.
    Kickstart,
    /// debian-installer preseed: Ubuntu, Debian.
    Preseed,
}

impl BootFamily {
    pub fn for_system_type(system_type: &str) -> Result<Self, BootConfigError> {
        match system_type.trim().to_ascii_lowercase().as_str() {
            "centos" | "rhel" | "rocky" | "almalinux" => Ok(Self::Kickstart),
            "ubuntu" | "debian" => Ok(Self::Preseed),
            _ => Err(BootConfigError::UnsupportedSystemType(system_type.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kickstart => "kickstart",
            Self::Preseed => "preseed",
        }
    }

    pub fn render(&self, server: &Server, template: &ConfigTemplate) -> String {
        match self {
            Self::Kickstart => kickstart::render(server, template),
            Self::Preseed => preseed::render(server, template),
        }
    }
}

/// Files produced by one successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub family: BootFamily,
    pub filename: String,
    pub legacy_path: PathBuf,
    pub uefi_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct UefiTarget {
    path: PathBuf,
    boot_server_url: String,
    legacy_url_path: String,
}

#[derive(Debug, Clone)]
pub struct BootConfigGenerator {
    legacy_dir: PathBuf,
    uefi: Option<UefiTarget>,
}

impl BootConfigGenerator {
    pub fn from_config(config: &TftpConfig) -> Self {
        let root = PathBuf::from(&config.root);
        let uefi = config.enable_uefi.then(|| UefiTarget {
            path: root.join(&config.uefi_boot_path).join(&config.uefi_config_file),
            boot_server_url: config.boot_server_url.trim_end_matches('/').to_string(),
            legacy_url_path: config.legacy_boot_path.trim_matches('/').to_string(),
        });

        Self {
            legacy_dir: root.join(&config.legacy_boot_path),
            uefi,
        }
    }

    /// Path the legacy document for `mac` is written to.
    pub fn legacy_path(&self, mac: &str) -> Result<PathBuf, BootConfigError> {
        Ok(self.legacy_dir.join(mac::pxe_filename(mac)?))
    }

    /// Render and write the boot artifacts for `server` using `template`.
    ///
    /// Blocking; call from `spawn_blocking` on async paths.
    pub fn generate(
        &self,
        server: &Server,
        template: &ConfigTemplate,
    ) -> Result<GeneratedArtifacts, BootConfigError> {
        let family = match BootFamily::for_system_type(&template.system_type) {
            Ok(family) => family,
            Err(e) => {
                metrics::record_boot_config("unsupported", "rejected");
                return Err(e);
            }
        };

        let result = self.write_artifacts(family, server, template);
        metrics::record_boot_config(
            family.as_str(),
            if result.is_ok() { "success" } else { "failure" },
        );
        result
    }

    fn write_artifacts(
        &self,
        family: BootFamily,
        server: &Server,
        template: &ConfigTemplate,
    ) -> Result<GeneratedArtifacts, BootConfigError> {
        let filename = mac::pxe_filename(&server.mac_address)?;
        let legacy_path = self.legacy_dir.join(&filename);

        let document = family.render(server, template);
        let descriptor = self.uefi.as_ref().map(|uefi| {
            let url = format!("{}/{}/{}", uefi.boot_server_url, uefi.legacy_url_path, filename);
            (uefi.path.clone(), grub::render(family, server, template, &url))
        });

        write_replace(&legacy_path, document.as_bytes())?;
        tracing::info!(
            serial = %server.serial,
            family = family.as_str(),
            path = %legacy_path.display(),
            "Boot config written"
        );

        let uefi_path = match descriptor {
            Some((path, content)) => {
                write_replace(&path, content.as_bytes())?;
                tracing::info!(serial = %server.serial, path = %path.display(), "UEFI boot descriptor written");
                Some(path)
            }
            None => None,
        };

        Ok(GeneratedArtifacts {
            family,
            filename,
            legacy_path,
            uefi_path,
        })
    }
}

/// Replace `path` with `content` through a temporary sibling and a rename.
fn write_replace(path: &Path, content: &[u8]) -> Result<(), BootConfigError> {
    let io_err = |source| BootConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(io_err)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{}.tmp", file_name));

    let written = fs::File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(content)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(())
}
