mod config;
pub(crate) mod inner;

#[cfg(test)]
mod tests;

use std::sync::Mutex;

pub use config::*;
use inner::ShellClientState;

use crate::{callbacks::*, error::ShellError, origin::NavigationDirective};

/// A configuration interface for building a [ShellClient].
/// Options on this object apply to every page load and bridge message for
/// the lifetime of the client.
///
/// Additionally provides the [ShellClient] with callbacks and essential
/// functionality, without proper configuration your client may not function
/// properly. See [ShellClientBuilder::set_persistence_provider]
#[derive(uniffi::Object, Default)]
pub struct ShellClientBuilder {
    config: Mutex<ShellClientConfiguration>,
}

#[uniffi::export]
impl ShellClientBuilder {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self {
            config: Default::default(),
        }
    }

    /// Provides the [ShellClient] with secure storage for the session
    /// credentials and the localStorage mirror. Without it the client still
    /// works, but nothing survives an app restart.
    pub fn set_persistence_provider(&self, provider: Box<dyn SecurePersistentStore>) {
        let mut config = self.config.lock().unwrap();
        config.persistence_provider = Some(provider.into());
    }

    /// Provides access to the web view's cookie store, used to seed the
    /// session before the first load and to harvest identifiers afterwards.
    pub fn set_cookie_jar(&self, jar: Box<dyn WebViewCookieJar>) {
        let mut config = self.config.lock().unwrap();
        config.cookie_jar = Some(jar.into());
    }

    /// Provides the evaluator used to dispatch scan result events into the
    /// page.
    pub fn set_script_runner(&self, runner: Box<dyn PageScriptRunner>) {
        let mut config = self.config.lock().unwrap();
        config.script_runner = Some(runner.into());
    }

    /// Provides the native scanner UI driver.
    pub fn set_scan_host(&self, host: Box<dyn BarcodeScanHost>) {
        let mut config = self.config.lock().unwrap();
        config.scan_host = Some(host.into());
    }

    /// Set the log filter level.
    ///
    /// By Default the log filter is set to [LogLevel::Info]
    pub fn set_log_level(&self, level: LogLevel) {
        let mut config = self.config.lock().unwrap();
        config.log_level = level;
    }

    /// Set the build profile deciding whether the development hosts pass the
    /// origin policy.
    ///
    /// By default this follows the profile the library was compiled with.
    pub fn set_build_profile(&self, profile: BuildProfile) {
        let mut config = self.config.lock().unwrap();
        config.build_profile = profile;
    }

    /// Set the upper bound on waiting for cookie seeding, in milliseconds.
    ///
    /// By default the timeout is 5 seconds.
    pub fn set_cookie_seed_timeout_ms(&self, timeout: u64) {
        let mut config = self.config.lock().unwrap();
        config.cookie_seed_timeout = timeout;
    }

    /// Returns the current log level setting.
    pub fn log_level(&self) -> LogLevel {
        let config = self.config.lock().unwrap();
        config.log_level
    }

    /// Returns the current build profile setting.
    pub fn build_profile(&self) -> BuildProfile {
        let config = self.config.lock().unwrap();
        config.build_profile
    }

    /// Returns the current cookie seed timeout in milliseconds.
    pub fn cookie_seed_timeout(&self) -> u64 {
        let config = self.config.lock().unwrap();
        config.cookie_seed_timeout
    }

    /// Attempt to construct a [ShellClient] for `base_url` with the params
    /// set above. Fails if `base_url` is not a valid http(s) URL with a host.
    pub fn build(&self, base_url: String) -> Result<ShellClient, ShellError> {
        let config = self.config.lock().unwrap().clone();
        let state = ShellClientState::new(config, base_url)?;

        Ok(ShellClient { state })
    }
}

/// One bridge instance per hosted web view: owns the origin policy, the
/// session bootstrap, the localStorage mirror and the single-flight scan
/// guard. The shell forwards script messages and scanner callbacks here and
/// executes whatever this client asks of it.
#[derive(uniffi::Object)]
pub struct ShellClient {
    state: ShellClientState,
}

#[uniffi::export(async_runtime = "tokio")]
impl ShellClient {
    /// Seeds the web view's cookie store from the persisted session. Must
    /// complete before the initial page load is kicked off. Returns false
    /// when the bounded wait elapsed first; the shell should proceed with
    /// the load regardless.
    pub async fn bootstrap_session(&self) -> bool {
        self.state.bootstrap_session().await
    }

    /// Report a finished page load. Harvests newly observed session
    /// identifiers until both are persisted, then becomes a no-op.
    pub async fn page_finished(&self, url: String) {
        self.state.page_finished(url).await
    }
}

// The inbound bridge surface, fed by the shells' script message handlers.
#[uniffi::export]
impl ShellClient {
    /// Source for an at-document-start user script restoring the mirrored
    /// localStorage entries. `None` when there is nothing to restore.
    pub fn storage_injection_script(&self) -> Option<String> {
        self.state.storage_injection_script()
    }

    /// The page asked for a barcode scan. `frame_url` is the URL of the
    /// calling frame as the shell observed it; untrusted frames receive an
    /// error event, as does any request while another scan is outstanding.
    pub fn scan_barcode(&self, request_id: String, frame_url: String) {
        self.state.scan_barcode(request_id, frame_url)
    }

    /// The page reported a localStorage change. Ignored unless the frame is
    /// trusted and the key is allow-listed; a null value deletes the entry.
    pub fn local_storage_changed(&self, key: String, value: Option<String>, frame_url: String) {
        self.state.local_storage_changed(key, value, frame_url)
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.state.set_log_level(level)
    }
}

// Scanner lifecycle reports, pushed by the shell from its own platform
// callbacks. All of these are cheap and safe to call with no scan
// outstanding.
#[uniffi::export]
impl ShellClient {
    /// The camera permission prompt was answered.
    pub fn camera_permission_resolved(&self, granted: bool) {
        self.state.camera_permission_resolved(granted)
    }

    /// The scanner modal finished its presentation animation.
    pub fn scanner_presented(&self) {
        self.state.scanner_presented()
    }

    /// The scanner decoded a barcode.
    pub fn scanner_decoded(&self, value: String) {
        self.state.scanner_decoded(value)
    }

    /// The user closed the scanner without a decode.
    pub fn scanner_close_requested(&self) {
        self.state.scanner_close_requested()
    }

    /// Camera or capture-session setup failed.
    pub fn scanner_setup_failed(&self, message: String) {
        self.state.scanner_setup_failed(message)
    }
}

// Decision helpers for the shells' web view delegates.
#[uniffi::export]
impl ShellClient {
    /// Whether `url` belongs inside the shell per the origin policy.
    pub fn should_render_in_shell(&self, url: String) -> bool {
        self.state.should_render_in_shell(&url)
    }

    /// Three-way disposition for a navigation request: render it, hand it
    /// to the system browser, or ignore it.
    pub fn decide_navigation(
        &self,
        url: String,
        is_main_frame: bool,
        is_user_initiated: bool,
        is_redirect: bool,
    ) -> NavigationDirective {
        self.state
            .decide_navigation(&url, is_main_frame, is_user_initiated, is_redirect)
    }

    /// Whether the page at (`scheme`, `host`) may capture camera/microphone
    /// media through getUserMedia.
    pub fn media_capture_allowed(&self, scheme: String, host: String) -> bool {
        self.state.media_capture_allowed(&scheme, &host)
    }
}

/// The User-Agent suffix both shells append to the web view's default agent,
/// so the page can detect the app and its version.
#[uniffi::export]
pub fn user_agent_suffix(version: String, build: String) -> String {
    format!("JelPoskupiloApp/{version} JelPoskupiloBuild/{build}")
}
