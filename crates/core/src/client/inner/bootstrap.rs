use std::{sync::Arc, time::Duration};

use cookie::{Cookie, SameSite};
use futures::future::join_all;
use log::{debug, warn};
use tokio::time::timeout;
use url::Url;

use super::credentials::{CredentialStore, SessionCredentials, HSID_COOKIE, SID_COOKIE};
use crate::{
    callbacks::{SeedCookie, WebViewCookieJar},
    origin::OriginPolicy,
};

/// Ten years, the lifetime the analytics cookies are written with.
pub const COOKIE_MAX_AGE_SECONDS: i64 = 315_360_000;

/// The cookie writes needed so the first page load already carries the
/// persisted session. Empty when the base URL is not a web origin or no
/// sid has ever been stored; an hsid missing on its own is papered over
/// with the sid.
pub fn seed_plan(
    base_url: &Url,
    policy: &OriginPolicy,
    credentials: &SessionCredentials,
) -> Vec<SeedCookie> {
    let Some(sid) = credentials.sid.as_deref() else {
        return Vec::new();
    };
    let hsid = credentials.hsid.as_deref().unwrap_or(sid);

    seed_targets(base_url, policy)
        .iter()
        .flat_map(|target| {
            [
                build_seed_cookie(target, SID_COOKIE, sid),
                build_seed_cookie(target, HSID_COOKIE, hsid),
            ]
        })
        .collect()
}

/// The base URL itself plus the bare origin of every host the session spans.
/// Duplicates collapse, so a base URL that already is a bare origin appears
/// once.
fn seed_targets(base_url: &Url, policy: &OriginPolicy) -> Vec<Url> {
    let scheme = base_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Vec::new();
    }
    let Some(base_host) = base_url.host_str() else {
        return Vec::new();
    };
    let base_host = base_host.to_ascii_lowercase();

    let mut hosts: Vec<&str> = vec![&base_host];
    for host in policy.seed_hosts() {
        if !hosts.contains(&host.as_str()) {
            hosts.push(host);
        }
    }

    let mut targets = vec![base_url.clone()];
    for host in hosts {
        let Ok(origin) = Url::parse(&format!("{scheme}://{host}/")) else {
            continue;
        };
        if !targets.iter().any(|known| known.as_str() == origin.as_str()) {
            targets.push(origin);
        }
    }

    targets
}

fn build_seed_cookie(target: &Url, name: &str, value: &str) -> SeedCookie {
    let secure = target.scheme() == "https";
    let rendered = Cookie::build((name, value))
        .path("/")
        .max_age(cookie::time::Duration::seconds(COOKIE_MAX_AGE_SECONDS))
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();

    SeedCookie {
        url: target.to_string(),
        name: name.to_owned(),
        value: value.to_owned(),
        domain: target.host_str().unwrap_or_default().to_ascii_lowercase(),
        path: "/".to_owned(),
        max_age_seconds: COOKIE_MAX_AGE_SECONDS,
        same_site: "Lax".to_owned(),
        secure,
        set_cookie_header: rendered.to_string(),
    }
}

/// Pushes the plan into the web view's cookie store and waits until every
/// write has been acknowledged, up to `timeout_ms`. Returns false when the
/// window elapsed first; the caller proceeds with the page load either way.
pub async fn apply_seed_plan(
    jar: &Arc<dyn WebViewCookieJar>,
    plan: Vec<SeedCookie>,
    timeout_ms: u64,
) -> bool {
    if plan.is_empty() {
        return true;
    }

    let total = plan.len();
    let writes = join_all(plan.into_iter().map(|cookie| jar.set_cookie(cookie)));

    match timeout(Duration::from_millis(timeout_ms), writes).await {
        Ok(results) => {
            let rejected = results.iter().filter(|accepted| !**accepted).count();
            if rejected > 0 {
                warn!("{rejected} of {total} session cookies were rejected by the cookie store");
            } else {
                debug!("Seeded {total} session cookies");
            }
            true
        }
        Err(_) => {
            warn!("Cookie seeding did not finish within {timeout_ms}ms, loading the page anyway");
            false
        }
    }
}

/// Pulls newly observed session identifiers out of the page's cookies.
/// Does nothing once both identifiers are persisted.
pub async fn harvest_session_cookies(
    jar: &Arc<dyn WebViewCookieJar>,
    credentials: &CredentialStore,
    page_url: &Url,
    policy: &OriginPolicy,
) {
    if credentials.read().is_complete() {
        return;
    }

    let Some(page_host) = page_url.host_str() else {
        return;
    };
    let page_host = page_host.to_ascii_lowercase();

    for cookie in jar.cookies_for_url(page_url.to_string()).await {
        if cookie.value.is_empty() || !cookie_domain_matches(&cookie.domain, &page_host, policy) {
            continue;
        }

        match cookie.name.as_str() {
            SID_COOKIE => {
                if credentials.store_sid_once(&cookie.value) {
                    debug!("Persisted the sid observed on {page_host}");
                }
            }
            HSID_COOKIE => {
                if credentials.store_hsid_once(&cookie.value) {
                    debug!("Persisted the hsid observed on {page_host}");
                }
            }
            _ => {}
        }
    }
}

// Cookie domains may carry leading or trailing dots; the bare form has to be
// the page's own host or one of the session hosts.
fn cookie_domain_matches(domain: &str, page_host: &str, policy: &OriginPolicy) -> bool {
    let trimmed = domain.trim_matches('.').to_ascii_lowercase();
    trimmed == page_host || policy.seed_hosts().iter().any(|host| *host == trimmed)
}
