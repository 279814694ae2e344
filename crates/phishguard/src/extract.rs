//! Derive a [`FeatureVector`] from a URL string.
//!
//! Extraction is a pure function over the text of the URL. No request is
//! made to the site, its DNS, or any registry, which is why everything in
//! [`UNAVAILABLE_WITHOUT_PAGE_FETCH`](crate::features::UNAVAILABLE_WITHOUT_PAGE_FETCH)
//! stays at zero.

use std::sync::OnceLock;

use regex::Regex;

use crate::features::*;
use crate::url_parts::{DomainParts, UrlParts};

/// Link-shortener domains recognised by `shortening_service`.
pub const SHORTENING_SERVICES: &[&str] = &["bit.ly", "goo.gl", "shorte.st", "tinyurl.com", "ow.ly"];

/// Characters counted individually over the full URL.
const CHAR_COUNTS: [(usize, char); 16] = [
    (FEAT_NB_DOTS, '.'),
    (FEAT_NB_HYPHENS, '-'),
    (FEAT_NB_AT, '@'),
    (FEAT_NB_QM, '?'),
    (FEAT_NB_AND, '&'),
    (FEAT_NB_EQ, '='),
    (FEAT_NB_UNDERSCORE, '_'),
    (FEAT_NB_TILDE, '~'),
    (FEAT_NB_PERCENT, '%'),
    (FEAT_NB_SLASH, '/'),
    (FEAT_NB_STAR, '*'),
    (FEAT_NB_COLON, ':'),
    (FEAT_NB_COMMA, ','),
    (FEAT_NB_SEMICOLUMN, ';'),
    (FEAT_NB_DOLLAR, '$'),
    (FEAT_NB_SPACE, ' '),
];

/// Extract the model's feature vector from a URL.
///
/// Never fails. Malformed URLs produce empty components, and every feature
/// computed from an empty component is `0`.
pub fn extract_features(url: &str) -> FeatureVector {
    let parts = UrlParts::parse(url);
    let domain = DomainParts::extract(url);
    let lower = url.to_lowercase();
    let hostname = parts.netloc.as_str();

    let mut feats = FeatureVector::zeroed();

    // ── Size ──
    feats[FEAT_LENGTH_URL] = char_len(url) as f64;
    feats[FEAT_LENGTH_HOSTNAME] = char_len(hostname) as f64;

    // ── Character counts ──
    for (idx, ch) in CHAR_COUNTS {
        feats[idx] = url.matches(ch).count() as f64;
    }

    // ── Lexical tokens ──
    feats[FEAT_NB_OR] = lower.matches("or").count() as f64;
    feats[FEAT_NB_WWW] = lower.matches("www").count() as f64;
    feats[FEAT_NB_COM] = lower.matches(".com").count() as f64;
    feats[FEAT_NB_DSLASH] = url.matches("//").count() as f64;

    // ── Structural flags ──
    feats[FEAT_IP] = flag(ipv4_pattern().is_match(hostname));
    feats[FEAT_HTTP_IN_PATH] = flag(parts.path.contains("http"));
    feats[FEAT_HTTPS_TOKEN] = flag(lower.contains("https"));
    feats[FEAT_PUNYCODE] = flag(url.contains("xn--"));
    feats[FEAT_PORT] = flag(has_numeric_port(hostname));
    feats[FEAT_TLD_IN_PATH] = flag(parts.path.contains(domain.suffix.as_str()));
    feats[FEAT_TLD_IN_SUBDOMAIN] = flag(domain.subdomain.contains(domain.suffix.as_str()));
    feats[FEAT_PREFIX_SUFFIX] = flag(domain.domain.contains('-'));
    feats[FEAT_SHORTENING_SERVICE] = flag(is_shortening_service(&parts.host()));

    // ── Ratios ──
    feats[FEAT_RATIO_DIGITS_URL] = digit_ratio(url);
    feats[FEAT_RATIO_DIGITS_HOST] = digit_ratio(hostname);

    feats[FEAT_NB_SUBDOMAINS] = if domain.subdomain.is_empty() {
        0.0
    } else {
        domain.subdomain.split('.').count() as f64
    };

    tracing::debug!(
        url,
        host = hostname,
        suffix = domain.suffix.as_str(),
        "extracted URL features"
    );

    feats
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Share of numeric characters in `s`; `0.0` for an empty string.
///
/// Counts any Unicode digit (`٣`, `²` as well as `3`). `char::is_numeric`
/// is slightly wider than a pure digit test: fractions such as `½` and
/// letter numerals such as `Ⅻ` count too.
fn digit_ratio(s: &str) -> f64 {
    let digits = s.chars().filter(|c| c.is_numeric()).count();
    digits as f64 / char_len(s).max(1) as f64
}

/// Dotted-quad shape only: octet ranges are not checked.
fn ipv4_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("ipv4 regex is valid")
    })
}

fn has_numeric_port(hostname: &str) -> bool {
    match hostname.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn is_shortening_service(host: &str) -> bool {
    SHORTENING_SERVICES.iter().any(|service| {
        host == *service
            || host
                .strip_suffix(service)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
