use std::collections::HashMap;
use std::fmt;

use secrecy::SecretString;
use serde::Deserialize;

/// Portal credentials for one account.
///
/// The password and security answers are held as [`SecretString`] so they
/// stay out of debug output and logs. Security questions are matched
/// verbatim against the portal's challenge text, including punctuation
/// and casing.
///
/// ```rust,ignore
/// use iitkgp_erp_login::ErpCreds;
///
/// let creds = ErpCreds::new("21XX12345", "hunter2")
///     .with_answer("What is your pet's name?", "Tofu");
/// ```
#[derive(Clone, Deserialize)]
pub struct ErpCreds {
    roll_number: String,
    password: SecretString,
    #[serde(default)]
    security_answers: HashMap<String, SecretString>,
}

impl ErpCreds {
    /// Create credentials with no security answers registered yet.
    pub fn new(roll_number: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            password: SecretString::from(password.into()),
            security_answers: HashMap::new(),
        }
    }

    /// Register the answer for one security question.
    #[must_use]
    pub fn with_answer(
        mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        self.security_answers
            .insert(question.into(), SecretString::from(answer.into()));
        self
    }

    /// Roll number used as the portal login id.
    #[must_use]
    pub fn roll_number(&self) -> &str {
        &self.roll_number
    }

    /// Account password.
    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub(crate) fn answer_for(&self, question: &str) -> Option<&SecretString> {
        self.security_answers.get(question)
    }
}

impl fmt::Debug for ErpCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErpCreds")
            .field("roll_number", &self.roll_number)
            .field("password", &"[REDACTED]")
            .field(
                "security_answers",
                &format_args!("[{} registered]", self.security_answers.len()),
            )
            .finish()
    }
}
