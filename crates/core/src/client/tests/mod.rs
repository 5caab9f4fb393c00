
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    callbacks::*,
    client::{BuildProfile, ShellClientBuilder},
    error::ShellError,
    ShellClient,
};

pub(crate) const BASE_URL: &str = "https://jelposkupilo.eu/pocetna";
pub(crate) const TRUSTED_FRAME: &str = "https://jelposkupilo.eu/pocetna";
pub(crate) const UNTRUSTED_FRAME: &str = "https://evil.example/pocetna";

/// Secure-store fake shared between the test and the client under test.
#[derive(Default, Clone)]
pub(crate) struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStore {
    pub fn put_str(&self, key: &str, value: &str) {
        self.set(key.to_owned(), value.as_bytes().to_vec());
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key.to_owned())
            .map(|bytes| String::from_utf8(bytes).expect("stored value was not UTF-8"))
    }
}

impl SecurePersistentStore for InMemoryStore {
    fn remove_entry(&self, key: String) {
        self.entries.lock().expect("Lock poisoned!").remove(&key);
    }

    fn get(&self, key: String) -> Option<Vec<u8>> {
        self.entries.lock().expect("Lock poisoned!").get(&key).cloned()
    }

    fn set(&self, key: String, value: Vec<u8>) {
        self.entries.lock().expect("Lock poisoned!").insert(key, value);
    }
}

/// Cookie-jar fake recording every write and serving canned cookies.
#[derive(Default, Clone)]
pub(crate) struct RecordingJar {
    pub written: Arc<Mutex<Vec<SeedCookie>>>,
    pub served: Arc<Mutex<Vec<BrowserCookie>>>,
    pub lookups: Arc<Mutex<u32>>,
}

#[async_trait::async_trait]
impl WebViewCookieJar for RecordingJar {
    async fn set_cookie(&self, cookie: SeedCookie) -> bool {
        self.written.lock().expect("Lock poisoned!").push(cookie);
        true
    }

    async fn cookies_for_url(&self, _url: String) -> Vec<BrowserCookie> {
        *self.lookups.lock().expect("Lock poisoned!") += 1;
        self.served.lock().expect("Lock poisoned!").clone()
    }
}

/// Script-runner fake capturing everything the client dispatches at the page.
#[derive(Default, Clone)]
pub(crate) struct ScriptSink {
    pub scripts: Arc<Mutex<Vec<String>>>,
}

impl ScriptSink {
    pub fn all(&self) -> Vec<String> {
        self.scripts.lock().expect("Lock poisoned!").clone()
    }

    pub fn last(&self) -> String {
        self.scripts
            .lock()
            .expect("Lock poisoned!")
            .last()
            .cloned()
            .expect("no script was dispatched")
    }

    pub fn count(&self) -> usize {
        self.scripts.lock().expect("Lock poisoned!").len()
    }
}

impl PageScriptRunner for ScriptSink {
    fn run_script(&self, script: String) {
        self.scripts.lock().expect("Lock poisoned!").push(script);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostCommand {
    RequestPermission,
    Present,
    Dismiss,
}

/// Scanner-host fake with fixed camera facts and a command log.
#[derive(Clone)]
pub(crate) struct FakeScanHost {
    pub camera_available: bool,
    pub authorization: CameraAuthorization,
    pub commands: Arc<Mutex<Vec<HostCommand>>>,
}

impl FakeScanHost {
    pub fn new(camera_available: bool, authorization: CameraAuthorization) -> Self {
        Self {
            camera_available,
            authorization,
            commands: Default::default(),
        }
    }

    pub fn commands(&self) -> Vec<HostCommand> {
        self.commands.lock().expect("Lock poisoned!").clone()
    }
}

impl BarcodeScanHost for FakeScanHost {
    fn camera_available(&self) -> bool {
        self.camera_available
    }

    fn authorization_status(&self) -> CameraAuthorization {
        self.authorization
    }

    fn request_camera_access(&self) {
        self.commands
            .lock()
            .expect("Lock poisoned!")
            .push(HostCommand::RequestPermission);
    }

    fn present_scanner(&self) {
        self.commands
            .lock()
            .expect("Lock poisoned!")
            .push(HostCommand::Present);
    }

    fn dismiss_scanner(&self) {
        self.commands
            .lock()
            .expect("Lock poisoned!")
            .push(HostCommand::Dismiss);
    }
}

/// A production-profile client with a script sink and scan host attached.
pub(crate) fn scan_client(host: &FakeScanHost) -> (ShellClient, ScriptSink) {
    let sink = ScriptSink::default();

    let builder = ShellClientBuilder::new();
    builder.set_build_profile(BuildProfile::Production);
    builder.set_script_runner(Box::new(sink.clone()));
    builder.set_scan_host(Box::new(host.clone()));

    let client = builder
        .build(BASE_URL.into())
        .expect("Failed to create client");

    (client, sink)
}

#[test]
fn building_rejects_urls_the_shell_cannot_host() {
    let builder = ShellClientBuilder::new();

    assert!(matches!(
        builder.build("not a url at all".into()),
        Err(ShellError::InvalidUrl { .. })
    ));
    assert!(matches!(
        builder.build("ftp://jelposkupilo.eu".into()),
        Err(ShellError::SchemeNotSupported { .. })
    ));
}

#[test]
fn building_without_providers_still_works() {
    let builder = ShellClientBuilder::new();
    builder.set_build_profile(BuildProfile::Production);

    let client = builder
        .build(BASE_URL.into())
        .expect("Failed to create client");

    // no providers: nothing to inject, and a scan degrades quietly
    assert_eq!(client.storage_injection_script(), None);
    client.scan_barcode("req-1".into(), TRUSTED_FRAME.into());
    client.scanner_decoded("4006381333931".into());
}

#[test]
fn user_agent_suffix_matches_the_shells() {
    assert_eq!(
        crate::client::user_agent_suffix("2.4.1".into(), "57".into()),
        "JelPoskupiloApp/2.4.1 JelPoskupiloBuild/57"
    );
}
