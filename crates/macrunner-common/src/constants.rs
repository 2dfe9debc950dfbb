// Constants: platform detection, well-known directories and files,
// environment variable names and process exit codes.

use std::fmt;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Well-known directories under the macrunner base directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownDirectory {
    /// The per-user base directory (`~/.macrunner`).
    Root,
    /// Cached runner archives, one sub-directory per release version.
    Runners,
    /// One sub-directory per workspace.
    Workspaces,
}

impl fmt::Display for WellKnownDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsPlatform {
    Linux,
    MacOS,
    Windows,
}

impl fmt::Display for OsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsPlatform::Linux => write!(f, "Linux"),
            OsPlatform::MacOS => write!(f, "OSX"),
            OsPlatform::Windows => write!(f, "Windows"),
        }
    }
}

impl OsPlatform {
    /// The `os` value GitHub uses in the runner downloads listing.
    pub fn download_os(&self) -> &'static str {
        match self {
            OsPlatform::Linux => "linux",
            OsPlatform::MacOS => "osx",
            OsPlatform::Windows => "win",
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::X86 => write!(f, "X86"),
            Architecture::X64 => write!(f, "X64"),
            Architecture::Arm => write!(f, "ARM"),
            Architecture::Arm64 => write!(f, "ARM64"),
        }
    }
}

impl Architecture {
    /// The `architecture` value GitHub uses in the runner downloads listing.
    pub fn download_architecture(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm => "arm",
            Architecture::Arm64 => "arm64",
        }
    }
}

// ---------------------------------------------------------------------------
// Platform detection (compile-time)
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Linux;
#[cfg(target_os = "macos")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::MacOS;
#[cfg(target_os = "windows")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Windows;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::MacOS;

#[cfg(target_arch = "x86")]
pub const CURRENT_ARCHITECTURE: Architecture = Architecture::X86;
#[cfg(target_arch = "x86_64")]
pub const CURRENT_ARCHITECTURE: Architecture = Architecture::X64;
#[cfg(target_arch = "arm")]
pub const CURRENT_ARCHITECTURE: Architecture = Architecture::Arm;
#[cfg(target_arch = "aarch64")]
pub const CURRENT_ARCHITECTURE: Architecture = Architecture::Arm64;
#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "arm",
    target_arch = "aarch64"
)))]
pub const CURRENT_ARCHITECTURE: Architecture = Architecture::X64;

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

pub mod path {
    /// Name of the base directory under the user's home.
    pub const BASE_DIRECTORY: &str = ".macrunner";
    pub const RUNNERS_DIRECTORY: &str = "runners";
    pub const WORKSPACES_DIRECTORY: &str = "workspaces";
    /// Fixed file name of a cached runner archive inside its version directory.
    pub const RUNNER_ARCHIVE_FILE: &str = "runner.tar.gz";
    /// Suffix of an in-flight download, renamed away once complete.
    pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".partial";
    /// Workspace record file inside the workspace directory.
    pub const WORKSPACE_CONFIG_FILE: &str = "config.json";
    /// Prefix of a per-runner install directory (`runner1`, `runner2`, ...).
    pub const RUNNER_DIRECTORY_PREFIX: &str = "runner";
    pub const CONFIG_SCRIPT: &str = "config.sh";
    pub const SERVICE_SCRIPT: &str = "svc.sh";
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

pub mod github {
    pub const API_URL: &str = "https://api.github.com";
    pub const HTML_URL: &str = "https://github.com";
    /// The scope a token needs to manage self-hosted runners of a repository.
    pub const REQUIRED_SCOPE: &str = "repo";
    /// Response header carrying the scopes granted to a classic token.
    pub const OAUTH_SCOPES_HEADER: &str = "x-oauth-scopes";
    pub const TOKEN_SETTINGS_URL: &str = "https://github.com/settings/tokens";
}

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

pub mod variables {
    /// Token picked up automatically on the first token prompt.
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    /// Overrides the base directory.
    pub const HOME: &str = "MACRUNNER_HOME";
    /// Overrides the GitHub REST API base URL.
    pub const GITHUB_API_URL: &str = "MACRUNNER_GITHUB_API_URL";
    /// Mirror every trace line to stdout.
    pub const PRINT_LOG_TO_STDOUT: &str = "MACRUNNER_PRINT_LOG_TO_STDOUT";
}

// ---------------------------------------------------------------------------
// ReturnCode
// ---------------------------------------------------------------------------

pub mod return_code {
    pub const SUCCESS: i32 = 0;
    pub const TERMINATED_ERROR: i32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_labels() {
        assert_eq!(OsPlatform::MacOS.to_string(), "OSX");
        assert_eq!(OsPlatform::MacOS.download_os(), "osx");
        assert_eq!(OsPlatform::Linux.download_os(), "linux");
        assert_eq!(Architecture::X64.to_string(), "X64");
        assert_eq!(Architecture::Arm64.download_architecture(), "arm64");
    }
}
