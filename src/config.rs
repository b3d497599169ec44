//! Configuration for typst-bridge.
//!
//! Use [`ConfigBuilder`] at application startup to choose the typst
//! executable and how diagnostics are displayed. Unconfigured processes get
//! [`Config::default`].

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::diagnostic::DiagnosticOptions;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Executable name of the typst CLI on the build target.
#[cfg(windows)]
const DEFAULT_EXECUTABLE: &str = "typst.exe";

#[cfg(not(windows))]
const DEFAULT_EXECUTABLE: &str = "typst";

/// Runtime configuration for typst-bridge.
#[derive(Debug, Clone)]
pub struct Config {
    /// The typst CLI, as a path or a name looked up in `PATH`.
    pub executable: PathBuf,
    /// Options used when a [`Report`](crate::diagnostic::Report) is displayed
    /// with `{}`.
    pub diagnostics: DiagnosticOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            diagnostics: DiagnosticOptions::default(),
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    executable: Option<PathBuf>,
    diagnostics: Option<DiagnosticOptions>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the typst executable.
    ///
    /// Default: `typst.exe` on Windows, `typst` elsewhere.
    ///
    /// # Example
    ///
    /// ```
    /// use typst_bridge::config::ConfigBuilder;
    ///
    /// ConfigBuilder::new()
    ///     .executable("/opt/typst/bin/typst")
    ///     .init();
    /// ```
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Set the options used to display diagnostics.
    pub fn diagnostics(mut self, options: DiagnosticOptions) -> Self {
        self.diagnostics = Some(options);
        self
    }

    /// Build the configuration without installing it.
    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            executable: self.executable.unwrap_or(default.executable),
            diagnostics: self.diagnostics.unwrap_or(default.diagnostics),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        let installed = CONFIG.set(self.build()).is_ok();
        if !installed {
            tracing::debug!("configuration already initialized, ignoring");
        }
        installed
    }
}

/// Initialize typst-bridge with default configuration.
///
/// This is equivalent to `ConfigBuilder::new().init()`.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}
