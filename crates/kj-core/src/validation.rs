//! Input checks shared by every front end that writes to the store.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::NewUser;

pub const MIN_USERNAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_CHAIN_TEXT_LEN: usize = 300;

/// A sign-up form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Registration {
    /// Checks the form and turns it into the record the store accepts.
    /// A blank display name falls back to the username.
    pub fn validate(self) -> Result<NewUser> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        if username.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(invalid("username, email and password are required"));
        }
        username_shape(&username)?;
        email_shape(&email)?;
        if self.password != self.confirm_password {
            return Err(invalid("passwords do not match"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let display_name = self
            .display_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| username.clone());

        Ok(NewUser {
            username,
            email,
            password: self.password,
            display_name,
            bio: non_blank(self.bio),
            avatar: None,
        })
    }
}

/// Usernames shorter than the minimum are never checked against the store.
pub fn username_shape(username: &str) -> Result<()> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(invalid(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Loose shape check: an '@' and a '.' somewhere in the address.
pub fn email_shape(email: &str) -> Result<()> {
    if !(email.contains('@') && email.contains('.')) {
        return Err(invalid("email address is not valid"));
    }
    Ok(())
}

pub fn question_title(raw: &str) -> Result<String> {
    bounded_text(raw, "question title", MAX_TITLE_LEN)
}

pub fn chain_text(raw: &str) -> Result<String> {
    bounded_text(raw, "chain text", MAX_CHAIN_TEXT_LEN)
}

pub fn display_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("display name is required"));
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, mapping blank input to `None`.
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn bounded_text(raw: &str, what: &str, max: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{what} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(invalid(format!("{what} exceeds {max} characters")));
    }
    Ok(trimmed.to_string())
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::ValidationError(msg.into())
}
