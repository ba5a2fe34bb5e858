//! Operation parameter digests.
//!
//! The digest of a start's parameters is stored with its history record;
//! a later cycle recomputes it from the current definition and restarts
//! the resource when they differ. Only parameters that describe the
//! resource's configuration take part.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use corral_core::{TIMING_FEATURE_SET, at_least, keys::META_PREFIX, meta_name};

/// Parameters that never affect the digest.
const IRRELEVANT: &[&str] = &[
    "id",
    "crm_feature_set",
    "op-digest",
    "on_node",
    "on_node_uuid",
    "pcmk_external_ip",
];

fn is_meta(name: &str) -> bool {
    name.len() >= META_PREFIX.len()
        && name.as_bytes()[..META_PREFIX.len()].eq_ignore_ascii_case(META_PREFIX.as_bytes())
}

/// Drop the parameters that do not describe the resource configuration.
///
/// Meta parameters are dropped, except that a recurring operation keeps
/// its timeout on feature sets that understand it.
pub fn filter_parameters(
    params: &HashMap<String, String>,
    feature_set: &str,
) -> BTreeMap<String, String> {
    let interval = params.get(&meta_name("interval")).map(String::as_str);
    let timeout_name = meta_name("timeout");
    let keep_timeout = interval.is_some_and(|i| i != "0") && at_least(feature_set, TIMING_FEATURE_SET);

    params
        .iter()
        .filter(|(name, _)| {
            if IRRELEVANT.contains(&name.as_str()) {
                return false;
            }
            !is_meta(name) || (keep_timeout && **name == timeout_name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Order-independent text form: `name="value"` pairs sorted by name.
///
/// `"` and `\` are backslash-escaped in both names and values, so distinct
/// parameter maps never share a form.
pub fn canonical_form(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", escape(name), escape(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 (hex) of the filtered, canonicalized parameters.
pub fn operation_digest(params: &HashMap<String, String>, feature_set: &str) -> String {
    let canonical = canonical_form(&filter_parameters(params, feature_set));
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn digest_ignores_insertion_order() {
        let forward = params(&[("ip", "10.0.0.5"), ("cidr", "24"), ("nic", "eth0")]);
        let mut backward = HashMap::new();
        for (k, v) in [("nic", "eth0"), ("cidr", "24"), ("ip", "10.0.0.5")] {
            backward.insert(k.to_string(), v.to_string());
        }
        assert_eq!(operation_digest(&forward, "3.2.0"), operation_digest(&backward, "3.2.0"));
    }

    #[test]
    fn changed_value_changes_digest() {
        let a = params(&[("ip", "10.0.0.5"), ("cidr", "24")]);
        let b = params(&[("ip", "10.0.0.6"), ("cidr", "24")]);
        assert_ne!(operation_digest(&a, "3.2.0"), operation_digest(&b, "3.2.0"));
        assert_eq!(operation_digest(&a, "3.2.0").len(), 64);
    }

    #[test]
    fn bookkeeping_parameters_are_filtered() {
        let base = params(&[("ip", "10.0.0.5")]);
        let noisy = params(&[
            ("ip", "10.0.0.5"),
            ("crm_feature_set", "3.2.0"),
            ("on_node", "alpha"),
            ("CRM_meta_timeout", "20000"),
            ("crm_meta_name", "start"),
        ]);
        assert_eq!(operation_digest(&base, "3.2.0"), operation_digest(&noisy, "3.2.0"));
    }

    #[test]
    fn recurring_timeout_is_kept_on_new_feature_sets() {
        let recurring = params(&[
            ("ip", "10.0.0.5"),
            ("CRM_meta_interval", "10000"),
            ("CRM_meta_timeout", "20000"),
        ]);
        let kept = filter_parameters(&recurring, "3.2.0");
        assert_eq!(kept.get("CRM_meta_timeout").map(String::as_str), Some("20000"));
        assert!(!kept.contains_key("CRM_meta_interval"));

        let old = filter_parameters(&recurring, "2.0");
        assert!(!old.contains_key("CRM_meta_timeout"));

        let one_shot = params(&[("CRM_meta_interval", "0"), ("CRM_meta_timeout", "20000")]);
        assert!(filter_parameters(&one_shot, "3.2.0").is_empty());
    }

    #[test]
    fn canonical_form_is_sorted() {
        let filtered = filter_parameters(&params(&[("b", "2"), ("a", "1")]), "3.2.0");
        assert_eq!(canonical_form(&filtered), "a=\"1\" b=\"2\"");
    }

    #[test]
    fn quotes_in_values_cannot_forge_another_map() {
        let a = params(&[("a", "1\" b=\"2"), ("b", "3")]);
        let b = params(&[("a", "1"), ("b", "2\" b=\"3")]);
        assert_ne!(operation_digest(&a, "3.2.0"), operation_digest(&b, "3.2.0"));

        let filtered = filter_parameters(&params(&[("path", "C:\\\"x\"")]), "3.2.0");
        assert_eq!(canonical_form(&filtered), "path=\"C:\\\\\\\"x\\\"\"");
    }
}
