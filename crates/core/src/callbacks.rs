/// Provides secure persistent storage for session data like the analytics
/// credentials and the local storage mirror. Implementations should handle
/// platform-specific storage (Keychain on iOS, EncryptedSharedPreferences on
/// Android) and ensure data is stored securely as some of it may be session
/// tokens.
#[uniffi::export(callback_interface)]
pub trait SecurePersistentStore: Send + Sync {
    /// Removes the entry for the given key
    fn remove_entry(&self, key: String);

    /// Gets the value for the given key, or None if not found
    fn get(&self, key: String) -> Option<Vec<u8>>;

    /// Sets the value for the given key
    fn set(&self, key: String, value: Vec<u8>);
}

/// A cookie the session bootstrap wants placed into the web view's store
/// before the first page load.
///
/// Carries both discrete fields and the equivalent `Set-Cookie` attribute
/// string so either platform cookie API can be fed without re-deriving
/// attributes: CookieManager on Android takes `url` plus `set_cookie_header`,
/// WKHTTPCookieStore on iOS maps the fields onto HTTPCookie properties.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct SeedCookie {
    /// Target URL the cookie is scoped to.
    pub url: String,
    pub name: String,
    pub value: String,
    /// Host-only domain, no leading dot. Header-based stores derive this
    /// from `url` instead.
    pub domain: String,
    pub path: String,
    pub max_age_seconds: i64,
    /// SameSite policy name as the platforms spell it ("Lax").
    pub same_site: String,
    pub secure: bool,
    /// Full attribute string for header-based cookie APIs.
    pub set_cookie_header: String,
}

/// A cookie read back out of the web view's store after a page load.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// The web view's cookie store. Both platform stores complete writes through
/// callbacks, so this interface is async; implementations bridge to
/// WKHTTPCookieStore / CookieManager.
#[uniffi::export(callback_interface)]
#[async_trait::async_trait]
pub trait WebViewCookieJar: Send + Sync {
    /// Writes one cookie, resolving once the store has accepted it.
    /// Returns false if the store rejected the cookie.
    async fn set_cookie(&self, cookie: SeedCookie) -> bool;

    /// Cookies visible to `url`. Implementations may over-approximate and
    /// return the store's full contents; the caller filters by name and
    /// domain.
    async fn cookies_for_url(&self, url: String) -> Vec<BrowserCookie>;
}

/// Evaluates JavaScript in the hosted page. Implementations must marshal
/// onto the thread that owns the web view before evaluating.
#[uniffi::export(callback_interface)]
pub trait PageScriptRunner: Send + Sync {
    fn run_script(&self, script: String);
}

/// Camera permission state as the platform reports it.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraAuthorization {
    Authorized,
    /// The user has not been asked yet; prompting is allowed.
    Undetermined,
    Denied,
    Restricted,
}

/// Drives the native barcode scanner UI on behalf of the scan flow.
///
/// Methods are cheap queries or fire-and-forget commands; outcomes travel
/// back through the `ShellClient` scanner event methods from the platform's
/// own callbacks. Queries must return without calling back into the client.
#[uniffi::export(callback_interface)]
pub trait BarcodeScanHost: Send + Sync {
    /// Whether the device has a usable capture device at all.
    fn camera_available(&self) -> bool;

    /// Current camera permission state.
    fn authorization_status(&self) -> CameraAuthorization;

    /// Ask the system for camera access. The answer is reported through
    /// `ShellClient::camera_permission_resolved`.
    fn request_camera_access(&self);

    /// Present the scanner modal, capturing EAN-13 only. Completed
    /// presentation is reported through `ShellClient::scanner_presented`.
    fn present_scanner(&self);

    /// Tear the scanner modal down. Must be safe to call when the modal is
    /// already gone.
    fn dismiss_scanner(&self);
}
