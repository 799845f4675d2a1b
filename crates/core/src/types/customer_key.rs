//! Normalized customer identifier.

use core::convert::Infallible;
use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Key used when a request carries no usable customer identifier.
pub const GUEST_KEY: &str = "guest_profile";

/// Device names that cannot be used as a path segment on Windows.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// A filesystem-safe customer key.
///
/// Every key is derived from a raw, untrusted identifier through
/// [`CustomerKey::normalize`], so holding a `CustomerKey` means holding a
/// string that is safe to use as a single directory name.
///
/// ## Constraints
///
/// - Characters: `A-Z`, `a-z`, `0-9`, `_`, `.`, `-`
/// - Never empty (falls back to [`GUEST_KEY`])
/// - Never starts or ends with `.`; never ends with `_`
/// - Starts with `_` only when guarding a reserved device name (`_CON`)
/// - Length: 1-255 bytes
///
/// Two raw identifiers that normalize to the same key address the same
/// customer. That collision is accepted.
///
/// ## Examples
///
/// ```
/// use customer_vault_core::{CustomerKey, GUEST_KEY};
///
/// assert_eq!(CustomerKey::normalize(Some("Alice Smith!")).as_str(), "Alice_Smith");
/// assert_eq!(CustomerKey::normalize(Some("../../etc/passwd")).as_str(), "etc_passwd");
/// assert_eq!(CustomerKey::normalize(None).as_str(), GUEST_KEY);
/// assert_eq!(CustomerKey::normalize(Some("")).as_str(), GUEST_KEY);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CustomerKey(String);

impl CustomerKey {
    /// Maximum length of a key in bytes.
    pub const MAX_LENGTH: usize = 255;

    /// Normalize a raw identifier into a key.
    ///
    /// Absent or empty input, and input with no safe characters left after
    /// sanitizing, yields the guest key. Never fails.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Self::guest();
        };

        let key = sanitize(raw);
        if key.is_empty() {
            Self::guest()
        } else {
            Self(key)
        }
    }

    /// The fixed guest key.
    #[must_use]
    pub fn guest() -> Self {
        Self(GUEST_KEY.to_owned())
    }

    /// Whether this is the guest key.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_KEY
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Reduce a raw identifier to the safe character set.
fn sanitize(raw: &str) -> String {
    // Compatibility decomposition splits accents off their base letters, so
    // dropping non-ASCII keeps `e` from `é`. Path separators split words.
    let ascii: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut key = kept.trim_matches(['.', '_']).to_owned();
    truncate(&mut key, CustomerKey::MAX_LENGTH);

    if is_reserved(&key) {
        key.insert(0, '_');
        truncate(&mut key, CustomerKey::MAX_LENGTH);
    }

    key
}

/// Truncate an ASCII key and drop any trailing `.`/`_` the cut exposed.
fn truncate(key: &mut String, max: usize) {
    key.truncate(max);
    let len = key.trim_end_matches(['.', '_']).len();
    key.truncate(len);
}

fn is_reserved(key: &str) -> bool {
    let stem = key.split('.').next().unwrap_or(key);
    RESERVED_STEMS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CustomerKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(Some(s)))
    }
}

impl AsRef<str> for CustomerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CustomerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::normalize(Some(&raw)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(raw: &str) -> String {
        CustomerKey::normalize(Some(raw)).into_inner()
    }

    #[test]
    fn test_absent_and_empty_are_guest() {
        assert_eq!(CustomerKey::normalize(None).as_str(), GUEST_KEY);
        assert_eq!(CustomerKey::normalize(Some("")).as_str(), GUEST_KEY);
        assert!(CustomerKey::normalize(None).is_guest());
    }

    #[test]
    fn test_safe_input_is_unchanged() {
        assert_eq!(key("alice"), "alice");
        assert_eq!(key("customer-42"), "customer-42");
        assert_eq!(key("first.last_1"), "first.last_1");
    }

    #[test]
    fn test_whitespace_and_punctuation() {
        assert_eq!(key("Alice Smith!"), "Alice_Smith");
        assert_eq!(key("  leading and   trailing  "), "leading_and_trailing");
        assert_eq!(key("a\tb\nc"), "a_b_c");
    }

    #[test]
    fn test_path_traversal_is_flattened() {
        assert_eq!(key("../../etc/passwd"), "etc_passwd");
        assert_eq!(key("..\\..\\windows\\system32"), "windows_system32");
        assert_eq!(key("/absolute/path"), "absolute_path");
        assert_eq!(key(".."), GUEST_KEY);
        assert_eq!(key("."), GUEST_KEY);
    }

    #[test]
    fn test_hidden_and_drive_prefixes() {
        assert_eq!(key(".hidden"), "hidden");
        assert_eq!(key("C:\\Users\\bob"), "C_Users_bob");
        assert_eq!(key("__dunder__"), "dunder");
    }

    #[test]
    fn test_null_bytes_removed() {
        assert_eq!(key("evil\0name"), "evilname");
        assert_eq!(key("\0"), GUEST_KEY);
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(key("héllo wörld"), "hello_world");
        assert_eq!(key("日本語"), GUEST_KEY);
    }

    #[test]
    fn test_accents_keep_base_letter() {
        assert_eq!(key("José García"), "Jose_Garcia");
        assert_eq!(key("Zoë Ångström"), "Zoe_Angstrom");
        // Compatibility forms fold to plain ASCII.
        assert_eq!(key("ﬁle"), "file");
        assert_eq!(key("Ｆｕｌｌ"), "Full");
    }

    #[test]
    fn test_nothing_safe_falls_back_to_guest() {
        assert_eq!(key("!!!"), GUEST_KEY);
        assert_eq!(key("   "), GUEST_KEY);
        assert_eq!(key("/"), GUEST_KEY);
    }

    #[test]
    fn test_reserved_device_names_are_prefixed() {
        assert_eq!(key("CON"), "_CON");
        assert_eq!(key("con.txt"), "_con.txt");
        assert_eq!(key("lpt9"), "_lpt9");
        assert_eq!(key("console"), "console");
        assert_eq!(key("COM10"), "COM10");
    }

    #[test]
    fn test_length_is_capped() {
        let long = "a".repeat(1000);
        assert_eq!(key(&long).len(), CustomerKey::MAX_LENGTH);

        let mut dotted = "b".repeat(254);
        dotted.push_str("._tail");
        let k = key(&dotted);
        assert!(k.len() <= CustomerKey::MAX_LENGTH);
        assert!(!k.ends_with('.'));
        assert!(!k.ends_with('_'));
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let inputs = [
            "Alice Smith!",
            "../x/../y",
            "CON",
            "_CON",
            "a b c",
            "",
            "日本",
            "x.y.z",
            "  -dash-  ",
        ];
        for raw in inputs {
            let first = CustomerKey::normalize(Some(raw));
            let second = CustomerKey::normalize(Some(raw));
            assert_eq!(first, second, "not deterministic for {raw:?}");

            let again = CustomerKey::normalize(Some(first.as_str()));
            assert_eq!(first, again, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_output_is_always_safe() {
        let inputs = ["a/b", "..", "\\\\server\\share", "x\0y", "?*<>|\"", "ok"];
        for raw in inputs {
            let k = key(raw);
            assert!(!k.is_empty());
            assert!(!k.contains('/'));
            assert!(!k.contains('\\'));
            assert!(!k.starts_with('.'));
            assert!(k
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
        }
    }

    #[test]
    fn test_display_and_from_str() {
        let k: CustomerKey = "Bob Jones".parse().unwrap();
        assert_eq!(format!("{k}"), "Bob_Jones");
        let s: &str = k.as_ref();
        assert_eq!(s, "Bob_Jones");
    }

    #[test]
    fn test_serde_normalizes_on_deserialize() {
        let k = CustomerKey::normalize(Some("Alice Smith!"));
        let json = serde_json::to_string(&k).unwrap();
        assert_eq!(json, "\"Alice_Smith\"");

        let parsed: CustomerKey = serde_json::from_str("\"Alice Smith!\"").unwrap();
        assert_eq!(parsed, k);
    }
}
