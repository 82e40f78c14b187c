use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            first_name,
            last_name,
            password_hash,
            is_staff: false,
            date_joined: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// The part of a user that other people get to see.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewAccount {
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.len() < 3 || username.len() > 150 {
            return Err("username must be between 3 and 150 characters".into());
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err("username may contain only letters, digits and @/./+/-/_".into());
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err("invalid email".into()),
        }
        if self.first_name.trim().is_empty() || self.first_name.chars().count() > 30 {
            return Err("first name is required and must be at most 30 characters".into());
        }
        if self.last_name.trim().is_empty() || self.last_name.chars().count() > 30 {
            return Err("last name is required and must be at most 30 characters".into());
        }
        if self.password.len() < 8 {
            return Err("password must be at least 8 characters".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> NewAccount {
        NewAccount {
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Walker".into(),
            password: "correct-horse".into(),
        }
    }

    #[test]
    fn test_valid_account() {
        assert!(account().validate().is_ok());
    }

    #[test]
    fn test_rejects_short_username() {
        let mut acc = account();
        acc.username = "ab".into();
        assert!(acc.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut acc = account();
        acc.email = "not-an-email".into();
        assert!(acc.validate().is_err());
        acc.email = "@example.com".into();
        assert!(acc.validate().is_err());
    }

    #[test]
    fn test_rejects_short_password() {
        let mut acc = account();
        acc.password = "short".into();
        assert!(acc.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_names() {
        let mut acc = account();
        acc.last_name = "  ".into();
        assert!(acc.validate().is_err());
    }

    #[test]
    fn test_full_name() {
        let user = User::new(
            "alice".into(),
            "alice@example.com".into(),
            "Alice".into(),
            "".into(),
            "hash".into(),
        );
        assert_eq!(user.full_name(), "Alice");
    }
}
