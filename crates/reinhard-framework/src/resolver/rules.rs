//! Declarative classification of lookup failures.

use reinhard_core::RestErrorKind;

/// What went wrong in one lookup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The remote call failed.
    Rest(RestErrorKind),
    /// The call succeeded but nothing matched.
    EmptyResult,
}

impl From<RestErrorKind> for FailureKind {
    fn from(kind: RestErrorKind) -> Self {
        Self::Rest(kind)
    }
}

/// The outcome a rule assigns to a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    /// Stop and fail with this user-facing message.
    Raise(String),
    /// Stop without producing any user-facing error.
    AbortSilent,
}

/// Ordered failure rules; the first rule naming a failure kind wins.
///
/// Failures no rule names are transient and retried.
///
/// ```rust,ignore
/// let rules = ErrorRuleTable::new()
///     .with_rule(
///         [FailureKind::Rest(RestErrorKind::NotFound), FailureKind::EmptyResult],
///         RuleAction::Raise("Couldn't find role.".into()),
///     )
///     .with_rule([FailureKind::Rest(RestErrorKind::Forbidden)], RuleAction::AbortSilent);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorRuleTable {
    rules: Vec<(Vec<FailureKind>, RuleAction)>,
}

impl ErrorRuleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    pub fn with_rule(
        mut self,
        kinds: impl IntoIterator<Item = FailureKind>,
        action: RuleAction,
    ) -> Self {
        self.rules.push((kinds.into_iter().collect(), action));
        self
    }

    /// Returns the action of the first rule naming `kind`.
    pub fn classify(&self, kind: FailureKind) -> Option<&RuleAction> {
        self.rules
            .iter()
            .find(|(kinds, _)| kinds.contains(&kind))
            .map(|(_, action)| action)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = ErrorRuleTable::new()
            .with_rule(
                [FailureKind::Rest(RestErrorKind::Forbidden)],
                RuleAction::AbortSilent,
            )
            .with_rule(
                [
                    FailureKind::Rest(RestErrorKind::Forbidden),
                    FailureKind::Rest(RestErrorKind::NotFound),
                ],
                RuleAction::Raise("gone".into()),
            );

        assert_eq!(
            rules.classify(RestErrorKind::Forbidden.into()),
            Some(&RuleAction::AbortSilent)
        );
        assert_eq!(
            rules.classify(RestErrorKind::NotFound.into()),
            Some(&RuleAction::Raise("gone".into()))
        );
    }

    #[test]
    fn test_unmatched_is_transient() {
        let rules = ErrorRuleTable::new().with_rule(
            [FailureKind::EmptyResult],
            RuleAction::Raise("none".into()),
        );
        assert_eq!(rules.classify(RestErrorKind::Server.into()), None);
        assert_eq!(rules.classify(RestErrorKind::RateLimited.into()), None);
    }
}
