use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Users own stores; they never trade directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub registered_at: DateTime<Utc>,
}

/// What a caller supplies to register.
#[derive(Debug, Clone)]
pub struct UserRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
}

/// Payload for creating a new user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub registration: UserRegistration,
    pub registered_at: DateTime<Utc>,
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
}

impl UserRegistration {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            phone: String::new(),
            country: String::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}

impl User {
    /// Emails compare case-insensitively.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}
