/// Build constants for the macrunner package.
/// Values come from compile-time environment variables with defaults.

/// Source control information.
pub struct Source;

impl Source {
    /// The commit hash from which this binary was built.
    /// Set via the `MACRUNNER_COMMIT_HASH` env var at compile time, or "N/A".
    pub const COMMIT_HASH: &'static str = match option_env!("MACRUNNER_COMMIT_HASH") {
        Some(h) => h,
        None => "N/A",
    };
}

/// Package metadata.
#[derive(Debug, Clone)]
pub struct MacrunnerPackage;

impl MacrunnerPackage {
    /// Binary name, also used as the tool tag in runner names and labels.
    pub const NAME: &'static str = "macrunner";

    /// Human readable label shown in `--help`.
    pub const LABEL: &'static str = "Github Runner Management Tool for Mac";

    /// The semantic version, from `Cargo.toml`.
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
}
