//! Host detection
//!
//! Decides which speech backends are worth trying and whether the
//! event loop may use epoll on the controlling terminal.

use std::fs;

/// Kind of host the narrator runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// Linux under Windows Subsystem for Linux
    Wsl,
    /// Any other Linux
    Linux,
    /// macOS, Windows, BSDs
    Other,
}

impl Host {
    /// Detect the current host
    pub fn detect() -> Self {
        if std::env::consts::OS != "linux" {
            Host::Other
        } else if is_wsl() {
            Host::Wsl
        } else {
            Host::Linux
        }
    }
}

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// WSL kernels mention Microsoft in /proc/version, and WSL sessions
/// export WSL_DISTRO_NAME.
pub fn is_wsl() -> bool {
    let kernel_says_wsl = fs::read_to_string("/proc/version")
        .map(|contents| {
            let lower = contents.to_lowercase();
            lower.contains("microsoft") || lower.contains("wsl")
        })
        .unwrap_or(false);

    kernel_says_wsl || std::env::var("WSL_DISTRO_NAME").is_ok()
}
