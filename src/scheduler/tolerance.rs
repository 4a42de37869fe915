use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{ScheduleError, ScheduleResult};
use crate::data::model::CategoryMapping;

/// Key of the fallback entry in the serialized table.
pub const DEFAULT_KEY: &str = "default";

/// Per-category cap on items inside one batch.
///
/// Serialized as a flat object, `{"default": 1, "gmail.com": 3}`; the
/// `default` key is required. Override keys are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, usize>",
    into = "BTreeMap<String, usize>"
)]
pub struct ToleranceTable {
    default: usize,
    overrides: BTreeMap<String, usize>,
}

impl ToleranceTable {
    pub fn new(default: usize) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, category: &str, cap: usize) -> Self {
        self.overrides.insert(category.to_lowercase(), cap);
        self
    }

    /// Cap for `category`, falling back to the default entry.
    pub fn get(&self, category: &str) -> usize {
        self.overrides
            .get(&category.to_lowercase())
            .copied()
            .unwrap_or(self.default)
    }

    /// Reject any zero cap, whether or not a category uses it.
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.default == 0 {
            return Err(ScheduleError::ZeroTolerance {
                category: DEFAULT_KEY.to_string(),
            });
        }
        match self.overrides.iter().find(|(_, cap)| **cap == 0) {
            Some((category, _)) => Err(ScheduleError::ZeroTolerance {
                category: category.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Reject a zero cap for any category that still has items to allocate.
    pub fn check_pending(&self, mapping: &CategoryMapping) -> ScheduleResult<()> {
        for (category, items) in mapping.iter() {
            if !items.is_empty() && self.get(category) == 0 {
                return Err(ScheduleError::ZeroTolerance {
                    category: category.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for ToleranceTable {
    fn default() -> Self {
        ToleranceTable::new(1).with_override("gmail.com", 3)
    }
}

impl TryFrom<BTreeMap<String, usize>> for ToleranceTable {
    type Error = ScheduleError;

    fn try_from(mut raw: BTreeMap<String, usize>) -> Result<Self, Self::Error> {
        let default = raw
            .remove(DEFAULT_KEY)
            .ok_or(ScheduleError::MissingDefaultTolerance)?;
        let table = raw
            .into_iter()
            .fold(ToleranceTable::new(default), |t, (cat, cap)| {
                t.with_override(&cat, cap)
            });
        table.validate()?;
        Ok(table)
    }
}

impl From<ToleranceTable> for BTreeMap<String, usize> {
    fn from(table: ToleranceTable) -> Self {
        let mut raw = table.overrides;
        raw.insert(DEFAULT_KEY.to_string(), table.default);
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_default() {
        let t = ToleranceTable::new(1).with_override("Gmail.com", 3);
        assert_eq!(t.get("gmail.com"), 3);
        assert_eq!(t.get("GMAIL.COM"), 3);
        assert_eq!(t.get("example.com"), 1);
    }

    #[test]
    fn parses_flat_json_object() {
        let t: ToleranceTable = serde_json::from_str(r#"{"default": 2, "x.com": 5}"#).unwrap();
        assert_eq!(t.get("other.com"), 2);
        assert_eq!(t.get("x.com"), 5);
    }

    #[test]
    fn missing_default_is_rejected() {
        let err = serde_json::from_str::<ToleranceTable>(r#"{"x.com": 5}"#).unwrap_err();
        assert!(err.to_string().contains("default"));
    }

    #[test]
    fn zero_and_negative_caps_are_rejected() {
        assert!(serde_json::from_str::<ToleranceTable>(r#"{"default": 0}"#).is_err());
        assert!(serde_json::from_str::<ToleranceTable>(r#"{"default": 1, "x.com": 0}"#).is_err());
        assert!(serde_json::from_str::<ToleranceTable>(r#"{"default": -1}"#).is_err());
    }

    #[test]
    fn zero_cap_only_matters_for_pending_categories() {
        let t = ToleranceTable::new(1).with_override("idle.com", 0);
        let mut m = CategoryMapping::new();
        m.push("busy.com".into(), "a@busy.com".into());
        assert!(t.check_pending(&m).is_ok());

        m.push("idle.com".into(), "b@idle.com".into());
        assert_eq!(
            t.check_pending(&m),
            Err(ScheduleError::ZeroTolerance {
                category: "idle.com".into()
            })
        );
    }
}
