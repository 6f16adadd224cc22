//! Platform directories and host identification.

use std::path::PathBuf;
use crate::constants::APP_DIR_NAME;
use crate::error::{ShError, ShResult};

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Application data directory (snapshots, logs).
    ///
    /// - Linux: `~/.local/share/ServiceHub`
    /// - macOS: `~/Library/Application Support/ServiceHub`
    pub fn data_dir() -> ShResult<PathBuf> {
        dirs::data_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or_else(|| ShError::Config("could not determine data directory".into()))
    }

    /// Application configuration directory (`config.toml`).
    pub fn config_dir() -> ShResult<PathBuf> {
        dirs::config_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or_else(|| ShError::Config("could not determine config directory".into()))
    }

    /// Label recorded on migration export runs so snapshots can be traced
    /// back to the machine that produced them.
    pub fn host_label() -> String {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        format!("{host} ({})", Self::current().name())
    }

    /// Get a human-readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_name() {
        assert_eq!(Platform::MacOs.name(), "macOS");
        assert_eq!(Platform::Linux.to_string(), "Linux");
    }

    #[test]
    fn test_host_label_mentions_platform() {
        let label = Platform::host_label();
        assert!(label.ends_with(&format!("({})", Platform::current().name())));
    }
}
