use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Suffix of derived files, replacing the source's `.json` extension.
pub const GENERATED_SUFFIX: &str = "_generated.json";

/// Configuration for one hashring a receive node knows about.
///
/// Field order is the serialization order, which keeps encoded bytes stable
/// for identical content.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HashringConfig {
    /// Name of the hashring. Absent for the default hashring.
    #[serde(default, skip_serializing_if = "is_unnamed")]
    pub hashring: Option<String>,

    /// Tenants routed to this hashring.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tenants: Vec<String>,

    /// Member addresses in `host:port` form. An explicit `null` reads as no
    /// members.
    #[serde(deserialize_with = "null_as_empty")]
    pub endpoints: Vec<String>,
}

// An empty name routes like an absent one and is dropped on output.
#[allow(clippy::ref_option)]
fn is_unnamed(name: &Option<String>) -> bool {
    name.as_deref().is_none_or(str::is_empty)
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes the hashrings held in one definition file.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array of hashrings.
pub fn decode(path: &Path, bytes: &[u8]) -> Result<Vec<HashringConfig>> {
    serde_json::from_slice(bytes).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Encodes hashrings as compact JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(hashrings: &[HashringConfig]) -> Result<Vec<u8>> {
    serde_json::to_vec(hashrings).map_err(Error::Encode)
}

/// Path of the derived file generated from `source`.
///
/// `hashrings.json` becomes `hashrings_generated.json` in the same
/// directory. Sources without a `.json` extension keep their full name.
#[must_use]
pub fn derived_path(source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .and_then(OsStr::to_str)
        .and_then(|name| name.strip_suffix(".json"))
        .map_or_else(
            || source.file_name().map(OsStr::to_os_string).unwrap_or_default(),
            OsString::from,
        );
    name.push(GENERATED_SUFFIX);

    source.with_file_name(name)
}

/// Whether `path` is a derived file rather than a trusted source.
#[must_use]
pub fn is_derived(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.ends_with(GENERATED_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_optional_fields() {
        let hashrings = decode(
            Path::new("hashrings.json"),
            br#"[
                {"hashring": "tenant-a", "tenants": ["a", "b"], "endpoints": ["r-0:10901"]},
                {"endpoints": ["r-1:10901", "r-2:10901"], "unknown": 1}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            hashrings,
            vec![
                HashringConfig {
                    hashring: Some("tenant-a".to_string()),
                    tenants: vec!["a".to_string(), "b".to_string()],
                    endpoints: vec!["r-0:10901".to_string()],
                },
                HashringConfig {
                    hashring: None,
                    tenants: vec![],
                    endpoints: vec!["r-1:10901".to_string(), "r-2:10901".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_decode_requires_endpoints() {
        let result = decode(Path::new("bad.json"), br#"[{"hashring": "x"}]"#);

        assert!(matches!(result, Err(Error::Decode { path, .. }) if path == Path::new("bad.json")));
    }

    #[test]
    fn test_decode_null_lists_as_empty() {
        let hashrings = decode(
            Path::new("x.json"),
            br#"[{"hashring":"a","tenants":null,"endpoints":["a:1"]},{"endpoints":null}]"#,
        )
        .unwrap();

        assert_eq!(
            hashrings,
            vec![
                HashringConfig {
                    hashring: Some("a".to_string()),
                    tenants: vec![],
                    endpoints: vec!["a:1".to_string()],
                },
                HashringConfig::default(),
            ]
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode(Path::new("bad.json"), b"{not json").is_err());
        assert!(decode(Path::new("bad.json"), br#"{"endpoints": []}"#).is_err());
    }

    #[test]
    fn test_encode_is_compact_and_ordered() {
        let hashrings = vec![
            HashringConfig {
                hashring: Some("ring".to_string()),
                tenants: vec!["t".to_string()],
                endpoints: vec!["a:1".to_string()],
            },
            HashringConfig::default(),
        ];

        assert_eq!(
            encode(&hashrings).unwrap(),
            br#"[{"hashring":"ring","tenants":["t"],"endpoints":["a:1"]},{"endpoints":[]}]"#
        );
    }

    #[test]
    fn test_encode_drops_empty_name() {
        let hashrings = vec![HashringConfig {
            hashring: Some(String::new()),
            tenants: vec![],
            endpoints: vec![],
        }];

        assert_eq!(encode(&hashrings).unwrap(), br#"[{"endpoints":[]}]"#);
    }

    #[test]
    fn test_encode_decode_preserves_value() {
        let hashrings = vec![
            HashringConfig {
                hashring: Some("ring".to_string()),
                tenants: vec!["z".to_string(), "a".to_string()],
                endpoints: vec!["a:1".to_string(), "b:1".to_string()],
            },
            HashringConfig {
                hashring: None,
                tenants: vec![],
                endpoints: vec![],
            },
        ];

        let bytes = encode(&hashrings).unwrap();

        assert_eq!(decode(Path::new("x.json"), &bytes).unwrap(), hashrings);
    }

    #[test]
    fn test_derived_path() {
        assert_eq!(
            derived_path(Path::new("/etc/thanos/hashrings.json")),
            PathBuf::from("/etc/thanos/hashrings_generated.json")
        );
        assert_eq!(
            derived_path(Path::new("rings")),
            PathBuf::from("rings_generated.json")
        );
        assert_eq!(
            derived_path(Path::new("dir.json/rings.json")),
            PathBuf::from("dir.json/rings_generated.json")
        );
    }

    #[test]
    fn test_is_derived() {
        assert!(is_derived(Path::new("/a/hashrings_generated.json")));
        assert!(!is_derived(Path::new("/a/hashrings.json")));
        assert!(!is_derived(Path::new("/a_generated.json/hashrings.json")));
    }
}
