// src/services/access.rs

use crate::error::AppError;
use crate::utils::jwt::Claims;

/// Actions the authorization policy knows about. Handlers name the action
/// they are about to perform; the policy decides per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageUsers,
    ManageSubjects,
    ManageChapters,
    ManageQuizzes,
    ManageQuestions,
    AttemptQuiz,
    ViewOwnScores,
}

/// Pure authorization check against a user's role set. Implementations
/// must never mutate state.
pub trait AuthorizationChecker: Send + Sync {
    fn allows(&self, roles: &[String], action: Action) -> bool;
}

/// Static (role, action) allow table. Anything not listed is denied.
pub struct PolicyTable {
    rules: &'static [(&'static str, Action)],
}

const DEFAULT_RULES: &[(&str, Action)] = &[
    ("admin", Action::ManageUsers),
    ("admin", Action::ManageSubjects),
    ("admin", Action::ManageChapters),
    ("admin", Action::ManageQuizzes),
    ("admin", Action::ManageQuestions),
    ("admin", Action::AttemptQuiz),
    ("admin", Action::ViewOwnScores),
    ("user", Action::AttemptQuiz),
    ("user", Action::ViewOwnScores),
];

impl PolicyTable {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationChecker for PolicyTable {
    fn allows(&self, roles: &[String], action: Action) -> bool {
        self.rules
            .iter()
            .any(|(role, act)| *act == action && roles.iter().any(|r| r == role))
    }
}

/// Returns `Forbidden` unless the claims' role set is allowed the action.
pub fn require(
    checker: &dyn AuthorizationChecker,
    claims: &Claims,
    action: Action,
) -> Result<(), AppError> {
    if checker.allows(&claims.roles, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
