use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Denylist predicate: does a category match any denylist entry?
// ---------------------------------------------------------------------------

/// How a denylist entry is compared against a category.
///
/// * `Substring` – the entry occurs anywhere in the category. Low precision:
///   `tycc.cn` also matches `mytycc.cn.example.org`. This is the historical
///   behaviour and the default.
/// * `Suffix` – the category equals the entry, or ends with it at a label
///   boundary (`.com.cn` matches `foo.com.cn`, `qq.com` matches `mail.qq.com`
///   but not `myqq.com`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenylistMatch {
    #[default]
    Substring,
    Suffix,
}

impl DenylistMatch {
    /// Whether a single `entry` matches `category`. Both are expected lowercase.
    pub fn matches(self, category: &str, entry: &str) -> bool {
        if entry.is_empty() {
            return false;
        }
        match self {
            DenylistMatch::Substring => category.contains(entry),
            DenylistMatch::Suffix => {
                if category == entry {
                    return true;
                }
                match category.strip_suffix(entry) {
                    Some(head) => entry.starts_with('.') || head.ends_with('.'),
                    None => false,
                }
            }
        }
    }
}

/// Return `true` when `category` is matched by any entry of `denylist`.
pub fn is_denylisted(category: &str, denylist: &BTreeSet<String>, mode: DenylistMatch) -> bool {
    denylist.iter().any(|entry| mode.matches(category, entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(entries: &[&str]) -> BTreeSet<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn substring_matches_anywhere() {
        let deny = list(&["tycc.cn", ".edu.cn"]);
        assert!(is_denylisted("tycc.cn", &deny, DenylistMatch::Substring));
        assert!(is_denylisted("mytycc.cn", &deny, DenylistMatch::Substring));
        assert!(is_denylisted("cs.example.edu.cn", &deny, DenylistMatch::Substring));
        assert!(!is_denylisted("example.com", &deny, DenylistMatch::Substring));
    }

    #[test]
    fn suffix_respects_label_boundary() {
        let deny = list(&["qq.com", ".com.cn"]);
        assert!(is_denylisted("qq.com", &deny, DenylistMatch::Suffix));
        assert!(is_denylisted("mail.qq.com", &deny, DenylistMatch::Suffix));
        assert!(!is_denylisted("myqq.com", &deny, DenylistMatch::Suffix));
        assert!(is_denylisted("example.com.cn", &deny, DenylistMatch::Suffix));
        assert!(!is_denylisted("qq.com.au", &deny, DenylistMatch::Suffix));
    }

    #[test]
    fn empty_entry_never_matches() {
        let deny = list(&[""]);
        assert!(!is_denylisted("x.com", &deny, DenylistMatch::Substring));
    }
}
