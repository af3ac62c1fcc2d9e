//! TLS certificate discovery over an nginx configuration tree.

use crate::fields::CertificateMode;
use crate::input::{self, PathError, CERTIFICATE_FILE, CONFIGURATION_DIRECTORY};
use crate::nginx::{self, ConfigFile};
use crate::parser::parse_certificate;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FREEBSD_CONF_DIR: &str = "/usr/local/etc/nginx/conf.d";
pub const LINUX_CONF_DIR: &str = "/etc/nginx/conf.d";
pub const KUSANAGI_CONF_DIR: &str = "/etc/opt/kusanagi/nginx/conf.d";

/// One discovered certificate, keyed for low-level discovery consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryEntry {
    #[serde(rename = "{#SERVERNAME}")]
    pub server_name: String,
    #[serde(rename = "{#CERTNAME}")]
    pub certificate_common_name: String,
    #[serde(rename = "{#CERTPATH}")]
    pub certificate_path: String,
}

/// Platform default configuration directory, if the platform has one.
pub fn default_conf_dir() -> Option<PathBuf> {
    if cfg!(target_os = "freebsd") {
        return Some(PathBuf::from(FREEBSD_CONF_DIR));
    }
    if cfg!(target_os = "linux") {
        let under_kusanagi = std::env::current_exe()
            .map(|exe| exe.to_string_lossy().contains("/kusanagi/"))
            .unwrap_or(false);
        let dir = if under_kusanagi {
            KUSANAGI_CONF_DIR
        } else {
            LINUX_CONF_DIR
        };
        return Some(PathBuf::from(dir));
    }
    None
}

/// All `*.conf` files below `dir`, recursively, in sorted order.
pub fn find_config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_config_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn is_config_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("conf")
}

/// Discover every TLS binding in the configuration tree at `conf_dir` whose
/// certificate parses and carries a common name.
///
/// Only an unusable directory is an error; problems with individual files or
/// certificates are logged and skipped.
pub fn discover(conf_dir: &Path) -> Result<Vec<DiscoveryEntry>, PathError> {
    input::check_directory(conf_dir, CONFIGURATION_DIRECTORY)?;
    let files = find_config_files(conf_dir);
    tracing::debug!(dir = %conf_dir.display(), files = files.len(), "scanning configuration");

    Ok(files
        .into_iter()
        .flat_map(|path| discover_file(&ConfigFile::new(path)))
        .collect())
}

/// Discovery over a single configuration file.
pub fn discover_file(config: &ConfigFile) -> Vec<DiscoveryEntry> {
    let blocks = match config.blocks() {
        Ok(blocks) => blocks,
        Err(err) => {
            tracing::warn!(
                path = %config.path().display(),
                error = %err,
                "skipping configuration file"
            );
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for block in blocks {
        for binding in block.tls_bindings() {
            let path = nginx::resolve_relative(&binding.certificate_path, config.root_dir());
            match certificate_common_name(&path) {
                Ok(cn) if cn.is_empty() => {
                    tracing::debug!(
                        path = %path.display(),
                        "certificate has no common name, skipped"
                    );
                }
                Ok(cn) => entries.push(DiscoveryEntry {
                    server_name: binding.server_name.clone(),
                    certificate_common_name: cn,
                    certificate_path: path.to_string_lossy().into_owned(),
                }),
                Err(err) => {
                    tracing::warn!(
                        server_name = %binding.server_name,
                        path = %path.display(),
                        error = %err,
                        "skipping certificate"
                    );
                }
            }
        }
    }
    entries
}

fn certificate_common_name(path: &Path) -> Result<String, crate::CertscoutError> {
    let data = input::read_file(path, CERTIFICATE_FILE)?;
    let cert = parse_certificate(&data, CertificateMode::Simple)?;
    Ok(cert.common_name().to_string())
}
