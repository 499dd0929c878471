//! Check result types for the prerequisite matrix.
//!
//! Each prerequisite produces a [`CheckResult`] describing whether it is
//! mandatory for a healthy deployment and whether it is currently met.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Whether a failing check blocks a healthy rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementLevel {
    /// Failure means the deployment is not healthy.
    Required,
    /// Failure is informational only.
    Optional,
}

impl RequirementLevel {
    /// `Required` when the condition holds, `Optional` otherwise.
    pub fn required_if(condition: bool) -> Self {
        if condition {
            RequirementLevel::Required
        } else {
            RequirementLevel::Optional
        }
    }

    /// Lowercase name as used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            RequirementLevel::Required => "required",
            RequirementLevel::Optional => "optional",
        }
    }
}

/// The outcome of one prerequisite check.
///
/// The level is fixed when the result is created; there is no way to change
/// it once the result is part of a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    required: RequirementLevel,
    descr: Message,
    enabled: bool,
}

impl CheckResult {
    /// Create a check result.
    pub fn new(required: RequirementLevel, descr: impl Into<Message>, enabled: bool) -> Self {
        Self {
            required,
            descr: descr.into(),
            enabled,
        }
    }

    /// A required check.
    pub fn required(descr: impl Into<Message>, enabled: bool) -> Self {
        Self::new(RequirementLevel::Required, descr, enabled)
    }

    /// An optional check.
    pub fn optional(descr: impl Into<Message>, enabled: bool) -> Self {
        Self::new(RequirementLevel::Optional, descr, enabled)
    }

    /// Requirement level of the check.
    pub fn level(&self) -> RequirementLevel {
        self.required
    }

    /// Description of the prerequisite.
    pub fn description(&self) -> &Message {
        &self.descr
    }

    /// Whether the prerequisite is met.
    pub fn is_satisfied(&self) -> bool {
        self.enabled
    }

    /// Whether this check prevents a healthy rating.
    pub fn is_blocking(&self) -> bool {
        self.required == RequirementLevel::Required && !self.enabled
    }
}

/// Ordered list of check results, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrerequisiteMatrix {
    checks: Vec<CheckResult>,
}

impl PrerequisiteMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check result.
    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// All checks in insertion order.
    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    /// Number of checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether the matrix holds no checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Find a check by its untranslated description key.
    pub fn find(&self, key: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.descr.key() == key)
    }

    /// Required checks that are not satisfied.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.is_blocking())
    }

    /// Whether every required check is satisfied.
    pub fn is_healthy(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl<'a> IntoIterator for &'a PrerequisiteMatrix {
    type Item = &'a CheckResult;
    type IntoIter = std::slice::Iter<'a, CheckResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.checks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_if_switches_level() {
        assert_eq!(RequirementLevel::required_if(true), RequirementLevel::Required);
        assert_eq!(RequirementLevel::required_if(false), RequirementLevel::Optional);
    }

    #[test]
    fn unsatisfied_required_is_blocking() {
        let check = CheckResult::required("ZLib", false);
        assert!(check.is_blocking());
        assert!(!check.is_satisfied());
        assert_eq!(check.level(), RequirementLevel::Required);
    }

    #[test]
    fn unsatisfied_optional_is_not_blocking() {
        let check = CheckResult::optional("cURL (might be required by some modules)", false);
        assert!(!check.is_blocking());
    }

    #[test]
    fn matrix_health_follows_required_checks() {
        let mut matrix = PrerequisiteMatrix::new();
        matrix.push(CheckResult::required("JSON support", true));
        matrix.push(CheckResult::optional("LDAP extension", false));
        assert!(matrix.is_healthy());

        matrix.push(CheckResult::required("XML DOM", false));
        assert!(!matrix.is_healthy());
        let failures: Vec<_> = matrix.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].description().key(), "XML DOM");
    }

    #[test]
    fn matrix_keeps_insertion_order() {
        let mut matrix = PrerequisiteMatrix::new();
        matrix.push(CheckResult::required("first", true));
        matrix.push(CheckResult::required("second", true));
        let keys: Vec<_> = matrix.checks().iter().map(|c| c.description().key()).collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn check_serializes_with_report_field_names() {
        let json = serde_json::to_value(CheckResult::optional("PDO extension", true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"required": "optional", "descr": "PDO extension", "enabled": true})
        );
    }
}
