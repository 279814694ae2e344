//! Canonical feature layout and the [`FeatureVector`] container.
//!
//! ## Ordering contract
//!
//! [`FEATURE_NAMES`] is the column order the scaler and classifier were
//! fitted on. Everything that produces or validates feature rows goes through
//! this list: URL extraction writes by `FEAT_*` index, scaler artifacts are
//! checked against it at load time, and uploaded CSV tables are projected
//! onto it column by column.
//!
//! ## Missing data
//!
//! Features that need the live page, WHOIS/DNS lookups, or ranking services
//! are listed in [`UNAVAILABLE_WITHOUT_PAGE_FETCH`] and always hold `0.0`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{PhishError, PhishResult};

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 87;

/// Canonical feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "length_url",
    "length_hostname",
    "ip",
    "nb_dots",
    "nb_hyphens",
    "nb_at",
    "nb_qm",
    "nb_and",
    "nb_or",
    "nb_eq",
    "nb_underscore",
    "nb_tilde",
    "nb_percent",
    "nb_slash",
    "nb_star",
    "nb_colon",
    "nb_comma",
    "nb_semicolumn",
    "nb_dollar",
    "nb_space",
    "nb_www",
    "nb_com",
    "nb_dslash",
    "http_in_path",
    "https_token",
    "ratio_digits_url",
    "ratio_digits_host",
    "punycode",
    "port",
    "tld_in_path",
    "tld_in_subdomain",
    "abnormal_subdomain",
    "nb_subdomains",
    "prefix_suffix",
    "random_domain",
    "shortening_service",
    "path_extension",
    "nb_redirection",
    "nb_external_redirection",
    "length_words_raw",
    "char_repeat",
    "shortest_words_raw",
    "shortest_word_host",
    "shortest_word_path",
    "longest_words_raw",
    "longest_word_host",
    "longest_word_path",
    "avg_words_raw",
    "avg_word_host",
    "avg_word_path",
    "phish_hints",
    "domain_in_brand",
    "brand_in_subdomain",
    "brand_in_path",
    "suspecious_tld",
    "statistical_report",
    "nb_hyperlinks",
    "ratio_intHyperlinks",
    "ratio_extHyperlinks",
    "ratio_nullHyperlinks",
    "nb_extCSS",
    "ratio_intRedirection",
    "ratio_extRedirection",
    "ratio_intErrors",
    "ratio_extErrors",
    "login_form",
    "external_favicon",
    "links_in_tags",
    "submit_email",
    "ratio_intMedia",
    "ratio_extMedia",
    "sfh",
    "iframe",
    "popup_window",
    "safe_anchor",
    "onmouseover",
    "right_clic",
    "empty_title",
    "domain_in_title",
    "domain_with_copyright",
    "whois_registered_domain",
    "domain_registration_length",
    "domain_age",
    "web_traffic",
    "dns_record",
    "google_index",
    "page_rank",
];

// ── Size (0-1) ──
pub const FEAT_LENGTH_URL: usize = 0;
pub const FEAT_LENGTH_HOSTNAME: usize = 1;

// ── Host shape (2) ──
pub const FEAT_IP: usize = 2;

// ── Character counts (3-19) ──
pub const FEAT_NB_DOTS: usize = 3;
pub const FEAT_NB_HYPHENS: usize = 4;
pub const FEAT_NB_AT: usize = 5;
pub const FEAT_NB_QM: usize = 6;
pub const FEAT_NB_AND: usize = 7;
pub const FEAT_NB_OR: usize = 8;
pub const FEAT_NB_EQ: usize = 9;
pub const FEAT_NB_UNDERSCORE: usize = 10;
pub const FEAT_NB_TILDE: usize = 11;
pub const FEAT_NB_PERCENT: usize = 12;
pub const FEAT_NB_SLASH: usize = 13;
pub const FEAT_NB_STAR: usize = 14;
pub const FEAT_NB_COLON: usize = 15;
pub const FEAT_NB_COMMA: usize = 16;
pub const FEAT_NB_SEMICOLUMN: usize = 17;
pub const FEAT_NB_DOLLAR: usize = 18;
pub const FEAT_NB_SPACE: usize = 19;

// ── Lexical tokens (20-22) ──
pub const FEAT_NB_WWW: usize = 20;
pub const FEAT_NB_COM: usize = 21;
pub const FEAT_NB_DSLASH: usize = 22;

// ── Structural flags and ratios (23-35) ──
pub const FEAT_HTTP_IN_PATH: usize = 23;
pub const FEAT_HTTPS_TOKEN: usize = 24;
pub const FEAT_RATIO_DIGITS_URL: usize = 25;
pub const FEAT_RATIO_DIGITS_HOST: usize = 26;
pub const FEAT_PUNYCODE: usize = 27;
pub const FEAT_PORT: usize = 28;
pub const FEAT_TLD_IN_PATH: usize = 29;
pub const FEAT_TLD_IN_SUBDOMAIN: usize = 30;
pub const FEAT_NB_SUBDOMAINS: usize = 32;
pub const FEAT_PREFIX_SUFFIX: usize = 33;
pub const FEAT_SHORTENING_SERVICE: usize = 35;

/// Features derived from the URL string.
pub const URL_DERIVED_FEATURES: [usize; 34] = [
    FEAT_LENGTH_URL,
    FEAT_LENGTH_HOSTNAME,
    FEAT_IP,
    FEAT_NB_DOTS,
    FEAT_NB_HYPHENS,
    FEAT_NB_AT,
    FEAT_NB_QM,
    FEAT_NB_AND,
    FEAT_NB_OR,
    FEAT_NB_EQ,
    FEAT_NB_UNDERSCORE,
    FEAT_NB_TILDE,
    FEAT_NB_PERCENT,
    FEAT_NB_SLASH,
    FEAT_NB_STAR,
    FEAT_NB_COLON,
    FEAT_NB_COMMA,
    FEAT_NB_SEMICOLUMN,
    FEAT_NB_DOLLAR,
    FEAT_NB_SPACE,
    FEAT_NB_WWW,
    FEAT_NB_COM,
    FEAT_NB_DSLASH,
    FEAT_HTTP_IN_PATH,
    FEAT_HTTPS_TOKEN,
    FEAT_RATIO_DIGITS_URL,
    FEAT_RATIO_DIGITS_HOST,
    FEAT_PUNYCODE,
    FEAT_PORT,
    FEAT_TLD_IN_PATH,
    FEAT_TLD_IN_SUBDOMAIN,
    FEAT_NB_SUBDOMAINS,
    FEAT_PREFIX_SUFFIX,
    FEAT_SHORTENING_SERVICE,
];

/// Features that cannot be computed from a bare URL string.
///
/// They need the rendered page (hyperlinks, forms, media, title), external
/// registries (WHOIS, DNS), ranking services, or the word/brand dictionaries
/// of the training pipeline. Extraction leaves them at `0.0`.
pub const UNAVAILABLE_WITHOUT_PAGE_FETCH: [&str; 53] = [
    "abnormal_subdomain",
    "random_domain",
    "path_extension",
    "nb_redirection",
    "nb_external_redirection",
    "length_words_raw",
    "char_repeat",
    "shortest_words_raw",
    "shortest_word_host",
    "shortest_word_path",
    "longest_words_raw",
    "longest_word_host",
    "longest_word_path",
    "avg_words_raw",
    "avg_word_host",
    "avg_word_path",
    "phish_hints",
    "domain_in_brand",
    "brand_in_subdomain",
    "brand_in_path",
    "suspecious_tld",
    "statistical_report",
    "nb_hyperlinks",
    "ratio_intHyperlinks",
    "ratio_extHyperlinks",
    "ratio_nullHyperlinks",
    "nb_extCSS",
    "ratio_intRedirection",
    "ratio_extRedirection",
    "ratio_intErrors",
    "ratio_extErrors",
    "login_form",
    "external_favicon",
    "links_in_tags",
    "submit_email",
    "ratio_intMedia",
    "ratio_extMedia",
    "sfh",
    "iframe",
    "popup_window",
    "safe_anchor",
    "onmouseover",
    "right_clic",
    "empty_title",
    "domain_in_title",
    "domain_with_copyright",
    "whois_registered_domain",
    "domain_registration_length",
    "domain_age",
    "web_traffic",
    "dns_record",
    "google_index",
    "page_rank",
];

/// Position of a feature name in the canonical order.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// One row of model input: a value for every canonical feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FeatureVector {
    /// A vector with every feature set to `0.0`.
    pub fn zeroed() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Build a vector from named values.
    ///
    /// Names outside the canonical set are ignored. Every canonical name must
    /// be supplied; the missing ones are reported in canonical order.
    pub fn from_named<'a, I>(pairs: I) -> PhishResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = [0.0; FEATURE_COUNT];
        let mut seen = [false; FEATURE_COUNT];
        for (name, value) in pairs {
            if let Some(idx) = feature_index(name) {
                values[idx] = value;
                seen[idx] = true;
            }
        }

        let missing: Vec<String> = FEATURE_NAMES
            .iter()
            .zip(seen.iter())
            .filter(|(_, present)| !**present)
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PhishError::MissingColumns(missing));
        }

        Ok(Self { values })
    }

    /// Value of a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.values[idx])
    }

    /// Set a feature by name. Returns `false` for names outside the canonical set.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match feature_index(name) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Values in canonical order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

impl std::ops::Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, idx: usize) -> &f64 {
        &self.values[idx]
    }
}

impl std::ops::IndexMut<usize> for FeatureVector {
    fn index_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.values[idx]
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let set: HashSet<_> = FEATURE_NAMES.iter().collect();
        assert_eq!(set.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_index_constants_match_names() {
        assert_eq!(FEATURE_NAMES[FEAT_LENGTH_URL], "length_url");
        assert_eq!(FEATURE_NAMES[FEAT_IP], "ip");
        assert_eq!(FEATURE_NAMES[FEAT_NB_OR], "nb_or");
        assert_eq!(FEATURE_NAMES[FEAT_NB_SEMICOLUMN], "nb_semicolumn");
        assert_eq!(FEATURE_NAMES[FEAT_NB_DSLASH], "nb_dslash");
        assert_eq!(FEATURE_NAMES[FEAT_RATIO_DIGITS_HOST], "ratio_digits_host");
        assert_eq!(FEATURE_NAMES[FEAT_TLD_IN_SUBDOMAIN], "tld_in_subdomain");
        assert_eq!(FEATURE_NAMES[FEAT_NB_SUBDOMAINS], "nb_subdomains");
        assert_eq!(FEATURE_NAMES[FEAT_PREFIX_SUFFIX], "prefix_suffix");
        assert_eq!(FEATURE_NAMES[FEAT_SHORTENING_SERVICE], "shortening_service");
        assert_eq!(FEATURE_NAMES[FEATURE_COUNT - 1], "page_rank");
    }

    #[test]
    fn test_derived_and_unavailable_partition_canonical_set() {
        let derived: HashSet<&str> = URL_DERIVED_FEATURES
            .iter()
            .map(|&idx| FEATURE_NAMES[idx])
            .collect();
        let unavailable: HashSet<&str> = UNAVAILABLE_WITHOUT_PAGE_FETCH.iter().copied().collect();

        assert_eq!(derived.len(), URL_DERIVED_FEATURES.len());
        assert_eq!(unavailable.len(), UNAVAILABLE_WITHOUT_PAGE_FETCH.len());
        assert!(derived.is_disjoint(&unavailable));

        let all: HashSet<&str> = FEATURE_NAMES.iter().copied().collect();
        let union: HashSet<&str> = derived.union(&unavailable).copied().collect();
        assert_eq!(union, all);
    }

    #[test]
    fn test_set_and_get() {
        let mut fv = FeatureVector::zeroed();
        assert!(fv.set("nb_dots", 3.0));
        assert!(!fv.set("not_a_feature", 1.0));
        assert_eq!(fv.get("nb_dots"), Some(3.0));
        assert_eq!(fv[FEAT_NB_DOTS], 3.0);
        assert_eq!(fv.get("not_a_feature"), None);
    }

    #[test]
    fn test_from_named_reports_missing_in_order() {
        let pairs: Vec<(&str, f64)> = FEATURE_NAMES
            .iter()
            .filter(|n| **n != "ip" && **n != "page_rank")
            .map(|n| (*n, 1.0))
            .collect();
        match FeatureVector::from_named(pairs) {
            Err(PhishError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["ip".to_string(), "page_rank".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_from_named_ignores_extras() {
        let mut pairs: Vec<(&str, f64)> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, i as f64))
            .collect();
        pairs.insert(0, ("status", 99.0));
        let fv = FeatureVector::from_named(pairs).unwrap();
        assert_eq!(fv[0], 0.0);
        assert_eq!(fv[86], 86.0);
    }

    #[test]
    fn test_serialize_in_canonical_order() {
        let fv = FeatureVector::zeroed();
        let json = serde_json::to_string(&fv).unwrap();
        let first = json.find("\"length_url\"").unwrap();
        let second = json.find("\"length_hostname\"").unwrap();
        let last = json.find("\"page_rank\"").unwrap();
        assert!(first < second && second < last);
    }
}
