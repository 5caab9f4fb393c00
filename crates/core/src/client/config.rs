use std::sync::Arc;

use crate::callbacks::{
    BarcodeScanHost, PageScriptRunner, SecurePersistentStore, WebViewCookieJar,
};

#[derive(uniffi::Enum, Debug, Clone, Default, Copy)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Which host set the origin policy trusts. Development additionally trusts
/// the simulator and emulator loopback hosts.
#[derive(uniffi::Enum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProfile {
    Production,
    Development,
}

impl Default for BuildProfile {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            BuildProfile::Development
        } else {
            BuildProfile::Production
        }
    }
}

/// How long cookie seeding may hold up the first page load.
pub const DEFAULT_COOKIE_SEED_TIMEOUT_MS: u64 = 5_000;

#[derive(Clone)]
pub struct ShellClientConfiguration {
    /// Secure key-value storage for the session credentials and the local
    /// storage mirror.
    pub persistence_provider: Option<Arc<dyn SecurePersistentStore>>,
    /// The web view's cookie store, used by the session bootstrap.
    pub cookie_jar: Option<Arc<dyn WebViewCookieJar>>,
    /// Evaluates JavaScript in the hosted page; carries the result events.
    pub script_runner: Option<Arc<dyn PageScriptRunner>>,
    /// Drives the native scanner UI.
    pub scan_host: Option<Arc<dyn BarcodeScanHost>>,
    /// Initial log level - defaults to [LogLevel::Info]
    pub log_level: LogLevel,
    /// Host trust profile - defaults to the compile profile.
    pub build_profile: BuildProfile,
    /// Upper bound on pre-load cookie seeding, in milliseconds.
    pub cookie_seed_timeout: u64,
}

impl Default for ShellClientConfiguration {
    fn default() -> Self {
        Self {
            persistence_provider: None,
            cookie_jar: None,
            script_runner: None,
            scan_host: None,
            log_level: LogLevel::default(),
            build_profile: BuildProfile::default(),
            cookie_seed_timeout: DEFAULT_COOKIE_SEED_TIMEOUT_MS,
        }
    }
}

impl std::fmt::Debug for ShellClientConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellClientConfiguration")
            .field(
                "persistence_provider",
                &self.persistence_provider.is_some().then_some("..."),
            )
            .field("cookie_jar", &self.cookie_jar.is_some().then_some("..."))
            .field(
                "script_runner",
                &self.script_runner.is_some().then_some("..."),
            )
            .field("scan_host", &self.scan_host.is_some().then_some("..."))
            .field("log_level", &self.log_level)
            .field("build_profile", &self.build_profile)
            .field("cookie_seed_timeout", &self.cookie_seed_timeout)
            .finish()
    }
}
