//! Lenient URL decomposition.
//!
//! Phishing URLs are frequently malformed on purpose, so nothing here fails:
//! a component that cannot be identified is left as an empty string.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use tldextract::{TldExtractor, TldOption};

/// Schemes whose last path segment may carry `;params`.
const SCHEMES_WITH_PARAMS: &[&str] = &[
    "", "ftp", "hdl", "prospero", "http", "imap", "https", "shttp", "rtsp", "rtsps", "rtspu",
    "sip", "sips", "mms", "sftp", "tel",
];

/// Generic components of a URL string.
///
/// `netloc` is the raw authority: userinfo and port are kept, case is
/// preserved. It is only populated when the text after the scheme starts
/// with `//`, so `example.com/login` has an empty netloc and a path of
/// `example.com/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

impl UrlParts {
    /// Split a URL into its components.
    pub fn parse(url: &str) -> Self {
        let cleaned: String = url
            .trim_start_matches(|c: char| c <= ' ')
            .chars()
            .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
            .collect();
        let mut rest = cleaned.as_str();

        let mut scheme = String::new();
        if let Some(colon) = rest.find(':') {
            if is_scheme(&rest[..colon]) {
                scheme = rest[..colon].to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        let mut netloc = "";
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            netloc = &after[..end];
            rest = &after[end..];
            if netloc.contains('[') != netloc.contains(']') {
                tracing::debug!("unbalanced brackets in authority, treating URL as opaque");
                return Self::default();
            }
        }

        let (rest, fragment) = rest.split_once('#').unwrap_or((rest, ""));
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));

        let (path, params) = if SCHEMES_WITH_PARAMS.contains(&scheme.as_str()) {
            split_params(rest)
        } else {
            (rest, "")
        };

        Self {
            scheme,
            netloc: netloc.to_string(),
            path: path.to_string(),
            params: params.to_string(),
            query: query.to_string(),
            fragment: fragment.to_string(),
        }
    }

    /// Lower-cased host name: the netloc without userinfo, port, or IPv6
    /// brackets.
    pub fn host(&self) -> String {
        let hostinfo = self
            .netloc
            .rsplit_once('@')
            .map_or(self.netloc.as_str(), |(_, h)| h);
        let host = match hostinfo.split_once('[') {
            Some((_, bracketed)) => bracketed.split(']').next().unwrap_or(""),
            None => hostinfo.split(':').next().unwrap_or(""),
        };
        host.to_lowercase()
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Split `;params` off the last path segment.
fn split_params(path: &str) -> (&str, &str) {
    let split_at = match path.rfind('/') {
        Some(slash) => path[slash..].find(';').map(|i| slash + i),
        None => path.find(';'),
    };
    match split_at {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => (path, ""),
    }
}

/// Registry-aware split of a host name.
///
/// For `https://login.secure.example.co.uk/` this yields subdomain
/// `login.secure`, domain `example` and suffix `co.uk`. Labels keep their
/// original ASCII form: `xn--` labels are not decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainParts {
    pub subdomain: String,
    pub domain: String,
    pub suffix: String,
}

impl DomainParts {
    /// Split the host of `url` against the public suffix list.
    pub fn extract(url: &str) -> Self {
        Self::from_host(registry_host(url))
    }

    /// Split a bare host name. IP addresses become the domain with no
    /// subdomain or suffix.
    pub fn from_host(host: &str) -> Self {
        let host = host.trim_end_matches('.');
        if host.parse::<Ipv4Addr>().is_ok() || host.parse::<Ipv6Addr>().is_ok() {
            return Self {
                domain: host.to_string(),
                ..Self::default()
            };
        }
        if host.contains(':') {
            tracing::debug!("unparseable host {host:?}, no domain split");
            return Self::default();
        }

        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        let suffix_len = suffix_label_count(host, labels.len());
        let (rest, suffix) = labels.split_at(labels.len() - suffix_len);
        let (domain, subdomain) = match rest.split_last() {
            Some((domain, subdomain)) => (domain.to_string(), subdomain.join(".")),
            None => (String::new(), String::new()),
        };

        Self {
            subdomain,
            domain,
            suffix: suffix.join("."),
        }
    }
}

/// Host as seen by the public suffix split.
///
/// Strips a leading `scheme://` or `//`, cuts at the first `/`, `?` or `#`,
/// drops userinfo and port. Unlike [`UrlParts::parse`], a URL without `//`
/// still yields its leading host, so `example.com/login` gives
/// `example.com`. Bracketed IPv6 hosts come back without the brackets.
pub fn registry_host(url: &str) -> &str {
    let rest = strip_scheme(url.trim());
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let netloc = &rest[..end];
    let hostinfo = netloc.rsplit_once('@').map_or(netloc, |(_, h)| h);
    match hostinfo.strip_prefix('[') {
        Some(bracketed) => bracketed.split(']').next().unwrap_or(""),
        None => hostinfo.split(':').next().unwrap_or(""),
    }
}

fn strip_scheme(url: &str) -> &str {
    if let Some(rest) = url.strip_prefix("//") {
        return rest;
    }
    match url.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            rest
        }
        _ => url,
    }
}

/// Number of trailing labels of `host` that form its public suffix.
///
/// Only the label count is taken from the extractor, since it returns
/// punycode labels decoded. `host` must not contain `:`, which would send
/// the extractor down its URL-parsing path.
fn suffix_label_count(host: &str, label_count: usize) -> usize {
    match suffix_extractor().extract(&host.to_lowercase()) {
        Ok(result) => result
            .suffix
            .map_or(0, |suffix| suffix.split('.').count())
            .min(label_count),
        Err(e) => {
            tracing::debug!("public suffix lookup failed for {host:?}: {e}");
            0
        }
    }
}

/// Shared public suffix extractor, built from the bundled suffix snapshot.
fn suffix_extractor() -> &'static TldExtractor {
    static EXTRACTOR: OnceLock<TldExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(|| TldExtractor::new(TldOption::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let parts = UrlParts::parse("HTTPS://user@Example.com:8080/a/b;p=1?q=2#frag");
        assert_eq!(parts.scheme, "https");
        assert_eq!(parts.netloc, "user@Example.com:8080");
        assert_eq!(parts.path, "/a/b");
        assert_eq!(parts.params, "p=1");
        assert_eq!(parts.query, "q=2");
        assert_eq!(parts.fragment, "frag");
        assert_eq!(parts.host(), "example.com");
    }

    #[test]
    fn test_parse_without_scheme() {
        let parts = UrlParts::parse("example.com/login");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.netloc, "");
        assert_eq!(parts.path, "example.com/login");
    }

    #[test]
    fn test_parse_scheme_relative() {
        let parts = UrlParts::parse("//cdn.example.com/x.js");
        assert_eq!(parts.scheme, "");
        assert_eq!(parts.netloc, "cdn.example.com");
        assert_eq!(parts.path, "/x.js");
    }

    #[test]
    fn test_parse_host_only() {
        let parts = UrlParts::parse("https://example.com");
        assert_eq!(parts.netloc, "example.com");
        assert_eq!(parts.path, "");
    }

    #[test]
    fn test_unbalanced_brackets_yield_empty_parts() {
        let parts = UrlParts::parse("http://[::1/path");
        assert_eq!(parts, UrlParts::default());
    }

    #[test]
    fn test_ipv6_host() {
        let parts = UrlParts::parse("http://[2001:db8::1]:443/");
        assert_eq!(parts.netloc, "[2001:db8::1]:443");
        assert_eq!(parts.host(), "2001:db8::1");
    }

    #[test]
    fn test_leading_whitespace_and_tabs_ignored() {
        let parts = UrlParts::parse("  http://exa\tmple.com/");
        assert_eq!(parts.netloc, "example.com");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(UrlParts::parse(""), UrlParts::default());
    }

    #[test]
    fn test_params_only_in_last_segment() {
        let parts = UrlParts::parse("http://h/a;x/b");
        assert_eq!(parts.path, "/a;x/b");
        assert_eq!(parts.params, "");
    }

    #[test]
    fn test_domain_parts() {
        let parts = DomainParts::extract("https://login.secure.example.com/path");
        assert_eq!(parts.subdomain, "login.secure");
        assert_eq!(parts.domain, "example");
        assert_eq!(parts.suffix, "com");
    }

    #[test]
    fn test_registry_host() {
        assert_eq!(registry_host("www.secure-paypal.com/login"), "www.secure-paypal.com");
        assert_eq!(registry_host("HTTP://user:pw@Example.COM:8080/x?y#z"), "Example.COM");
        assert_eq!(registry_host("//cdn.example.com/x.js"), "cdn.example.com");
        assert_eq!(registry_host("http://[2001:db8::1]:443/"), "2001:db8::1");
        assert_eq!(registry_host("  example.com?q=1"), "example.com");
        assert_eq!(registry_host(""), "");
    }

    #[test]
    fn test_domain_parts_without_scheme() {
        let parts = DomainParts::extract("www.secure-paypal.com/login");
        assert_eq!(parts.subdomain, "www");
        assert_eq!(parts.domain, "secure-paypal");
        assert_eq!(parts.suffix, "com");
    }

    #[test]
    fn test_domain_parts_keep_punycode_labels() {
        let parts = DomainParts::extract("http://xn--pple-43d.com/login");
        assert_eq!(parts.domain, "xn--pple-43d");
        assert_eq!(parts.suffix, "com");
    }

    #[test]
    fn test_domain_parts_host_with_space() {
        let parts = DomainParts::extract("http://exa mple.com/");
        assert_eq!(parts.subdomain, "");
        assert_eq!(parts.domain, "exa mple");
        assert_eq!(parts.suffix, "com");
    }

    #[test]
    fn test_domain_parts_multi_label_suffix_and_case() {
        let parts = DomainParts::extract("https://user@Login.Example.CO.UK:8443/");
        assert_eq!(parts.subdomain, "Login");
        assert_eq!(parts.domain, "Example");
        assert_eq!(parts.suffix, "CO.UK");
    }

    #[test]
    fn test_domain_parts_ip_hosts() {
        let parts = DomainParts::extract("http://192.168.1.1:8080/login");
        assert_eq!(parts.domain, "192.168.1.1");
        assert_eq!(parts.subdomain, "");
        assert_eq!(parts.suffix, "");

        let parts = DomainParts::extract("http://[::1]/");
        assert_eq!(parts.domain, "::1");
    }

    #[test]
    fn test_domain_parts_unknown_suffix() {
        let parts = DomainParts::from_host("a.b.notatld");
        assert_eq!(parts.subdomain, "a.b");
        assert_eq!(parts.domain, "notatld");
        assert_eq!(parts.suffix, "");
    }

    #[test]
    fn test_domain_parts_empty_host() {
        assert_eq!(DomainParts::extract(""), DomainParts::default());
        assert_eq!(DomainParts::extract("http:///path"), DomainParts::default());
        assert_eq!(DomainParts::from_host("[fe80::zz]"), DomainParts::default());
    }
}
