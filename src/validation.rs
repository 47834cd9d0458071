// Validators for the contact form

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{Draft, Field, NewSubmission};

const REQUIRED: [Field; 5] = [
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::Telegram,
    Field::Phone,
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    Missing(Field),
    #[error("Enter a valid email address")]
    InvalidEmail,
    #[error("Telegram handle must start with @")]
    InvalidTelegram,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::InvalidEmail => Field::Email,
            ValidationError::InvalidTelegram => Field::Telegram,
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

pub fn is_valid_email(v: &str) -> bool {
    email_pattern().is_match(v)
}

pub fn is_valid_telegram(v: &str) -> bool {
    v.starts_with('@')
}

impl Draft {
    /// Checks required fields in form order, then email shape, then telegram.
    /// Stops at the first failure.
    pub fn validate(&self) -> Result<NewSubmission, ValidationError> {
        if let Some(field) = REQUIRED.into_iter().find(|f| self.get(*f).trim().is_empty()) {
            return Err(ValidationError::Missing(field));
        }

        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
        let telegram = self.telegram.trim();
        if !is_valid_telegram(telegram) {
            return Err(ValidationError::InvalidTelegram);
        }

        let feedback = self.feedback.trim();
        Ok(NewSubmission {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_lowercase(),
            telegram: telegram.to_string(),
            phone: self.phone.trim().to_string(),
            feedback: (!feedback.is_empty()).then(|| feedback.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Draft {
        Draft {
            first_name: "  Anna ".into(),
            last_name: "Petrova".into(),
            email: " Anna.Petrova@Example.COM ".into(),
            telegram: "@anna_p".into(),
            phone: " +7 900 000-00-00 ".into(),
            feedback: "   ".into(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("foo@bar.com"));
        assert!(!is_valid_email("foo@bar"));
        assert!(!is_valid_email("foobar.com"));
        assert!(!is_valid_email("@bar.com"));
        assert!(!is_valid_email("foo bar@baz.com"));
    }

    #[test]
    fn telegram_needs_at_sign() {
        assert!(is_valid_telegram("@user"));
        assert!(!is_valid_telegram("user"));
    }

    #[test]
    fn missing_fields_reported_in_form_order() {
        let mut d = filled();
        d.last_name = " ".into();
        d.phone = String::new();
        assert_eq!(d.validate(), Err(ValidationError::Missing(Field::LastName)));

        d.last_name = "Petrova".into();
        assert_eq!(d.validate(), Err(ValidationError::Missing(Field::Phone)));
    }

    #[test]
    fn required_check_runs_before_format_checks() {
        let mut d = filled();
        d.email = "not-an-email".into();
        d.first_name = String::new();
        assert_eq!(d.validate(), Err(ValidationError::Missing(Field::FirstName)));
    }

    #[test]
    fn email_checked_before_telegram() {
        let mut d = filled();
        d.email = "foo@bar".into();
        d.telegram = "user".into();
        let err = d.validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidEmail);
        assert_eq!(err.field(), Field::Email);

        d.email = "foo@bar.com".into();
        assert_eq!(d.validate(), Err(ValidationError::InvalidTelegram));
    }

    #[test]
    fn valid_draft_is_normalized() {
        let new = filled().validate().unwrap();
        assert_eq!(new.first_name, "Anna");
        assert_eq!(new.email, "anna.petrova@example.com");
        assert_eq!(new.phone, "+7 900 000-00-00");
        assert_eq!(new.feedback, None);

        let mut d = filled();
        d.feedback = " great course ".into();
        assert_eq!(d.validate().unwrap().feedback.as_deref(), Some("great course"));
    }

    #[test]
    fn missing_message_names_the_field() {
        assert_eq!(ValidationError::Missing(Field::Telegram).to_string(), "Telegram is required");
    }
}
