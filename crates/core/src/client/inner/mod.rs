mod bootstrap;
mod credentials;
mod logging;
mod mirror;
mod scan;

use std::sync::{Arc, Mutex};

use credentials::CredentialStore;
use log::{debug, warn};
use logging::*;
use mirror::LocalStorageMirror;
use scan::{ScanCommand, ScanEvent, ScanFlow};
use url::Url;

use super::{LogLevel, ShellClientConfiguration};
use crate::{
    callbacks::{BarcodeScanHost, PageScriptRunner, WebViewCookieJar},
    error::ShellError,
    origin::{NavigationDirective, OriginPolicy},
    protocol::{ScanResultEvent, MSG_SCAN_FAILED, MSG_SCAN_IN_PROGRESS, MSG_UNTRUSTED_ORIGIN},
};

pub(crate) struct ShellClientState {
    /// Trust decisions for navigation, bridge calls and media capture.
    policy: OriginPolicy,
    /// The page the shell loads first; session seeding targets its origin.
    base_url: Url,
    /// Write-once sid/hsid persistence.
    credentials: CredentialStore,
    /// Native copy of the allow-listed localStorage entries.
    mirror: LocalStorageMirror,
    /// The sole outstanding scan. `None` is the idle scanner.
    scan: Mutex<Option<ScanFlow>>,
    cookie_jar: Option<Arc<dyn WebViewCookieJar>>,
    script_runner: Option<Arc<dyn PageScriptRunner>>,
    scan_host: Option<Arc<dyn BarcodeScanHost>>,
    cookie_seed_timeout: u64,
}

impl ShellClientState {
    pub fn new(config: ShellClientConfiguration, base_url: String) -> Result<Self, ShellError> {
        init_log(config.log_level);
        debug!("Initializing ShellClient.");
        debug!("Configuration: {config:?}");

        let base_url = Url::parse(&base_url)?;
        let scheme = base_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ShellError::SchemeNotSupported {
                scheme: scheme.to_owned(),
            });
        }
        if base_url.host_str().unwrap_or_default().is_empty() {
            return Err(ShellError::NoHostInUrl);
        }

        let credentials = CredentialStore::new(config.persistence_provider.clone());
        let mirror = LocalStorageMirror::new(config.persistence_provider);

        Ok(Self {
            policy: OriginPolicy::standard(config.build_profile),
            base_url,
            credentials,
            mirror,
            scan: Mutex::new(None),
            cookie_jar: config.cookie_jar,
            script_runner: config.script_runner,
            scan_host: config.scan_host,
            cookie_seed_timeout: config.cookie_seed_timeout,
        })
    }

    /// Seeds the web view's cookie store from the persisted session. Returns
    /// false when the seed timed out; the shell loads the page either way,
    /// it just may see a fresh session.
    pub async fn bootstrap_session(&self) -> bool {
        let Some(jar) = &self.cookie_jar else {
            debug!("No cookie jar provided - skipping session seeding");
            return true;
        };

        let plan = bootstrap::seed_plan(&self.base_url, &self.policy, &self.credentials.read());
        if plan.is_empty() {
            debug!("No persisted session to seed");
            return true;
        }

        bootstrap::apply_seed_plan(jar, plan, self.cookie_seed_timeout).await
    }

    /// Post-load harvest: picks newly observed session identifiers out of
    /// the page's cookies until both are persisted.
    pub async fn page_finished(&self, url: String) {
        let Some(jar) = &self.cookie_jar else {
            return;
        };
        let Ok(page_url) = Url::parse(&url) else {
            warn!("Ignoring a page finish report with an unparsable URL");
            return;
        };
        if !self.policy.is_allowed(&page_url) {
            debug!("Skipping the cookie harvest on an untrusted page");
            return;
        }

        bootstrap::harvest_session_cookies(jar, &self.credentials, &page_url, &self.policy).await;
    }

    pub fn storage_injection_script(&self) -> Option<String> {
        self.mirror.injection_script()
    }

    pub fn scan_barcode(&self, request_id: String, frame_url: String) {
        if request_id.is_empty() {
            warn!("Dropping a scan request without a request id");
            return;
        }

        if !self.policy.is_allowed_str(&frame_url) {
            warn!("Rejecting a scan request from an untrusted frame");
            self.dispatch_result(ScanResultEvent::error(
                request_id,
                MSG_UNTRUSTED_ORIGIN.into(),
            ));
            return;
        }

        let Some(host) = self.scan_host.clone() else {
            warn!("No barcode scan host provided - failing the scan");
            self.dispatch_result(ScanResultEvent::error(request_id, MSG_SCAN_FAILED.into()));
            return;
        };

        let commands = {
            let mut outstanding = self.scan.lock().expect("lock poisoned!");

            if outstanding.as_ref().is_some_and(ScanFlow::outcome_pending) {
                drop(outstanding);
                self.dispatch_result(ScanResultEvent::error(
                    request_id,
                    MSG_SCAN_IN_PROGRESS.into(),
                ));
                return;
            }

            // Queries only; the host contract keeps them re-entrance free.
            let (flow, commands) = ScanFlow::start(
                request_id,
                host.camera_available(),
                host.authorization_status(),
            );

            *outstanding = flow.outcome_pending().then_some(flow);
            commands
        };

        self.run_scan_commands(&host, commands);
    }

    pub fn local_storage_changed(&self, key: String, value: Option<String>, frame_url: String) {
        if !self.policy.is_allowed_str(&frame_url) {
            warn!("Dropping a localStorage change from an untrusted frame");
            return;
        }

        if !self.mirror.apply_change(&key, value) {
            debug!("Ignoring a localStorage change for unrecognized key {key}");
        }
    }

    pub fn camera_permission_resolved(&self, granted: bool) {
        self.apply_scan_event(ScanEvent::PermissionResolved { granted });
    }

    pub fn scanner_presented(&self) {
        self.apply_scan_event(ScanEvent::Presented);
    }

    pub fn scanner_decoded(&self, value: String) {
        self.apply_scan_event(ScanEvent::Decoded { value });
    }

    pub fn scanner_close_requested(&self) {
        self.apply_scan_event(ScanEvent::CloseRequested);
    }

    pub fn scanner_setup_failed(&self, message: String) {
        self.apply_scan_event(ScanEvent::SetupFailed { message });
    }

    pub fn should_render_in_shell(&self, url: &str) -> bool {
        self.policy.is_allowed_str(url)
    }

    pub fn decide_navigation(
        &self,
        url: &str,
        is_main_frame: bool,
        is_user_initiated: bool,
        is_redirect: bool,
    ) -> NavigationDirective {
        self.policy
            .decide_navigation(url, is_main_frame, is_user_initiated, is_redirect)
    }

    pub fn media_capture_allowed(&self, scheme: &str, host: &str) -> bool {
        self.policy.media_capture_allowed(scheme, host)
    }

    pub fn set_log_level(&self, level: LogLevel) {
        set_log_level(level)
    }

    fn apply_scan_event(&self, event: ScanEvent) {
        let Some(host) = self.scan_host.clone() else {
            return;
        };

        let commands = {
            let mut outstanding = self.scan.lock().expect("lock poisoned!");
            let Some(flow) = outstanding.as_mut() else {
                debug!("Ignoring a scanner event with no scan outstanding: {event:?}");
                return;
            };

            let commands = flow.on_event(event);
            if !flow.outcome_pending() {
                *outstanding = None;
            }
            commands
        };

        self.run_scan_commands(&host, commands);
    }

    // Runs with the scan slot unlocked: present/dismiss may synchronously
    // feed the next scanner event back into the client.
    fn run_scan_commands(&self, host: &Arc<dyn BarcodeScanHost>, commands: Vec<ScanCommand>) {
        for command in commands {
            match command {
                ScanCommand::RequestPermission => host.request_camera_access(),
                ScanCommand::Present => host.present_scanner(),
                ScanCommand::Dismiss => host.dismiss_scanner(),
                ScanCommand::Finish(result) => self.dispatch_result(result),
            }
        }
    }

    fn dispatch_result(&self, result: ScanResultEvent) {
        let Some(runner) = &self.script_runner else {
            warn!("No script runner provided - dropping a scan result");
            return;
        };

        match result.dispatch_script() {
            Ok(script) => runner.run_script(script),
            Err(e) => warn!("Failed to serialize a scan result: {e}"),
        }
    }
}
