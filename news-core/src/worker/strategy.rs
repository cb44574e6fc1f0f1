use reqwest::Method;

use super::http::Request;
use crate::config::WorkerConfig;

/// Caching policy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Live result first, cache only when the network fails.
    NetworkFirst,
    /// Serve the cached copy immediately and refresh it in the background.
    StaleWhileRevalidate,
}

/// Picks the strategy for `request`, or `None` when the worker should not
/// intercept it at all (non-GET, non-http(s)).
pub fn classify(request: &Request, config: &WorkerConfig) -> Option<Strategy> {
    if request.method != Method::GET {
        return None;
    }
    if !matches!(request.url.scheme(), "http" | "https") {
        return None;
    }
    if is_api_request(request, config) {
        Some(Strategy::NetworkFirst)
    } else {
        Some(Strategy::StaleWhileRevalidate)
    }
}

pub fn is_api_request(request: &Request, config: &WorkerConfig) -> bool {
    let path_hit =
        !config.api_path_marker.is_empty() && request.url.path().contains(&config.api_path_marker);
    let host_hit = !config.api_host_marker.is_empty()
        && request
            .url
            .host_str()
            .is_some_and(|host| host.contains(&config.api_host_marker));
    path_hit || host_hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn req(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn api_paths_and_provider_hosts_are_network_first() {
        let config = WorkerConfig::default();
        assert_eq!(
            classify(&req("https://app.example/api/news?page=2"), &config),
            Some(Strategy::NetworkFirst)
        );
        assert_eq!(
            classify(&req("https://newsapi.org/v2/top-headlines"), &config),
            Some(Strategy::NetworkFirst)
        );
    }

    #[test]
    fn everything_else_is_stale_while_revalidate() {
        let config = WorkerConfig::default();
        assert_eq!(
            classify(&req("https://app.example/index.html"), &config),
            Some(Strategy::StaleWhileRevalidate)
        );
        assert_eq!(
            classify(&req("https://app.example/apis.js"), &config),
            Some(Strategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn non_get_and_foreign_schemes_are_not_intercepted() {
        let config = WorkerConfig::default();
        let post = req("https://app.example/api/news").with_method(Method::POST);
        assert_eq!(classify(&post, &config), None);
        assert_eq!(classify(&req("chrome-extension://abc/page.html"), &config), None);
        assert_eq!(classify(&req("file:///tmp/index.html"), &config), None);
    }
}
