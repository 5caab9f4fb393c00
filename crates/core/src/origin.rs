use url::Url;

use crate::client::BuildProfile;

/// Production host the shells are built around.
pub const PRIMARY_HOST: &str = "jelposkupilo.eu";

/// Loopback hosts reachable from development builds (simulator, emulator).
const DEV_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "10.0.2.2"];

/// What the shell should do with a navigation request.
#[derive(uniffi::Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationDirective {
    /// Load the URL in the embedded web view.
    RenderInShell,
    /// Hand the URL to the system (external browser, tel:, mailto:, ...).
    OpenExternally,
    /// Drop the request.
    Ignore,
}

/// Host allow-list deciding which URLs belong to the product surface.
///
/// Trust is origin-scoped: the scheme must be http or https and the host must
/// equal the primary host, its www counterpart, or (development builds only)
/// a loopback host. Subdomains and suffix lookalikes stay untrusted.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    hosts: Vec<String>,
    profile: BuildProfile,
}

impl OriginPolicy {
    /// Policy over the product hosts for the given build profile.
    pub fn standard(profile: BuildProfile) -> Self {
        Self::new(PRIMARY_HOST, profile)
    }

    pub fn new(primary_host: &str, profile: BuildProfile) -> Self {
        let primary = primary_host.trim().to_ascii_lowercase();
        let counterpart = match primary.strip_prefix("www.") {
            Some(apex) => apex.to_owned(),
            None => format!("www.{primary}"),
        };

        let mut hosts = vec![primary];
        if !hosts.contains(&counterpart) {
            hosts.push(counterpart);
        }

        Self { hosts, profile }
    }

    /// True if `url` is inside the trusted origin set.
    pub fn is_allowed(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };

        self.host_allowed(host)
    }

    /// Parses and checks in one step; unparsable input is untrusted.
    pub fn is_allowed_str(&self, url: &str) -> bool {
        Url::parse(url).map(|url| self.is_allowed(&url)).unwrap_or(false)
    }

    fn host_allowed(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let host = host.to_ascii_lowercase();
        if self.hosts.iter().any(|allowed| *allowed == host) {
            return true;
        }

        self.profile == BuildProfile::Development && DEV_HOSTS.contains(&host.as_str())
    }

    /// The static allow-list the session bootstrap seeds cookies onto.
    pub fn seed_hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Three-way routing decision for a navigation request. Untrusted URLs
    /// open externally only when they target the main frame and are either
    /// user-initiated or not a server redirect.
    pub fn decide_navigation(
        &self,
        url: &str,
        is_main_frame: bool,
        is_user_initiated: bool,
        is_redirect: bool,
    ) -> NavigationDirective {
        let Ok(parsed) = Url::parse(url) else {
            return NavigationDirective::Ignore;
        };

        if self.is_allowed(&parsed) {
            return NavigationDirective::RenderInShell;
        }

        if is_main_frame && (is_user_initiated || !is_redirect) {
            NavigationDirective::OpenExternally
        } else {
            NavigationDirective::Ignore
        }
    }

    /// Whether the page at (`scheme`, `host`) may use getUserMedia.
    pub fn media_capture_allowed(&self, scheme: &str, host: &str) -> bool {
        matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https")
            && self.host_allowed(host)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn production() -> OriginPolicy {
        OriginPolicy::standard(BuildProfile::Production)
    }

    fn development() -> OriginPolicy {
        OriginPolicy::standard(BuildProfile::Development)
    }

    #[test]
    fn production_allows_exactly_the_product_hosts() {
        let policy = production();
        assert!(policy.is_allowed_str("https://jelposkupilo.eu/"));
        assert!(policy.is_allowed_str("https://www.jelposkupilo.eu/cijene"));
        assert!(policy.is_allowed_str("http://jelposkupilo.eu/"));

        assert!(!policy.is_allowed_str("https://shop.jelposkupilo.eu/"));
        assert!(!policy.is_allowed_str("https://jelposkupilo.eu.evil.example/"));
        assert!(!policy.is_allowed_str("https://example.com/"));
    }

    #[test]
    fn host_comparison_is_case_insensitive() {
        let policy = production();
        assert!(policy.is_allowed_str("https://WWW.JelPoskupilo.EU/"));
    }

    #[test]
    fn non_http_schemes_are_untrusted() {
        let policy = production();
        assert!(!policy.is_allowed_str("ftp://jelposkupilo.eu/"));
        assert!(!policy.is_allowed_str("file:///etc/passwd"));
        assert!(!policy.is_allowed_str("javascript:alert(1)"));
        assert!(!policy.is_allowed_str("tel:+385991234567"));
    }

    #[test]
    fn garbage_urls_are_untrusted() {
        let policy = production();
        assert!(!policy.is_allowed_str(""));
        assert!(!policy.is_allowed_str("not a url"));
        assert!(!policy.is_allowed_str("https://"));
    }

    #[test]
    fn loopback_hosts_require_a_development_build() {
        let dev = development();
        assert!(dev.is_allowed_str("http://localhost:4000/"));
        assert!(dev.is_allowed_str("http://127.0.0.1/"));
        assert!(dev.is_allowed_str("http://10.0.2.2:8080/"));

        let prod = production();
        assert!(!prod.is_allowed_str("http://localhost:4000/"));
        assert!(!prod.is_allowed_str("http://127.0.0.1/"));
        assert!(!prod.is_allowed_str("http://10.0.2.2:8080/"));
    }

    #[test]
    fn www_primary_collapses_to_the_same_pair() {
        let policy = OriginPolicy::new("www.jelposkupilo.eu", BuildProfile::Production);
        assert!(policy.is_allowed_str("https://jelposkupilo.eu/"));
        assert!(policy.is_allowed_str("https://www.jelposkupilo.eu/"));
        assert_eq!(policy.seed_hosts().len(), 2);
    }

    #[test]
    fn allowed_urls_render_in_shell() {
        let directive = production().decide_navigation("https://jelposkupilo.eu/popust", true, true, false);
        assert_eq!(directive, NavigationDirective::RenderInShell);
    }

    #[test]
    fn user_initiated_external_links_open_externally() {
        let policy = production();
        assert_eq!(
            policy.decide_navigation("https://example.com/", true, true, false),
            NavigationDirective::OpenExternally
        );
        assert_eq!(
            policy.decide_navigation("tel:+385991234567", true, true, false),
            NavigationDirective::OpenExternally
        );
    }

    #[test]
    fn server_redirects_to_foreign_hosts_are_dropped() {
        let policy = production();
        assert_eq!(
            policy.decide_navigation("https://tracker.example/pixel", true, false, true),
            NavigationDirective::Ignore
        );
        assert_eq!(
            policy.decide_navigation("https://example.com/frame", false, true, false),
            NavigationDirective::Ignore
        );
    }

    #[test]
    fn media_capture_follows_the_allow_list() {
        let policy = production();
        assert!(policy.media_capture_allowed("https", "jelposkupilo.eu"));
        assert!(!policy.media_capture_allowed("https", "example.com"));
        assert!(!policy.media_capture_allowed("file", "jelposkupilo.eu"));
        assert!(!policy.media_capture_allowed("https", ""));
    }
}
