use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram: String,
    pub phone: String,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Raw form input, exactly as typed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Draft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram: String,
    pub phone: String,
    pub feedback: String,
}

/// Normalized insert payload, as `Draft::validate` returns it.
/// Fields are open, so stores must not assume it was validated; the
/// server re-validates every insert it receives.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub telegram: String,
    pub phone: String,
    pub feedback: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Telegram,
    Phone,
    Feedback,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Email => "Email",
            Field::Telegram => "Telegram",
            Field::Phone => "Phone",
            Field::Feedback => "Feedback",
        }
    }
}

impl Draft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::Telegram => &self.telegram,
            Field::Phone => &self.phone,
            Field::Feedback => &self.feedback,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::Telegram => &mut self.telegram,
            Field::Phone => &mut self.phone,
            Field::Feedback => &mut self.feedback,
        };
        *slot = value.into();
    }
}

impl From<&NewSubmission> for Draft {
    fn from(new: &NewSubmission) -> Self {
        Draft {
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            telegram: new.telegram.clone(),
            phone: new.phone.clone(),
            feedback: new.feedback.clone().unwrap_or_default(),
        }
    }
}
