//! Users mirrored from the external identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{DomainError, DomainResult, Entity, UserId};

use crate::text::normalize_name;

/// Profile data as reported by the identity provider on a given sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// A user known to the system.
///
/// `email` is fixed on first sight and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Account-level tag shown next to the profile (e.g. "user").
    pub role_tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First sighting.
    pub fn from_profile(profile: &UserProfile) -> DomainResult<Self> {
        let email = normalize_email(&profile.email)?;
        Ok(Self {
            id: profile.user_id.clone(),
            display_name: display_name_for(profile, &email)?,
            email,
            avatar_url: normalize_avatar(profile.avatar_url.as_deref()),
            role_tag: "user".to_string(),
            created_at: profile.occurred_at,
            updated_at: profile.occurred_at,
        })
    }

    /// Later sighting: refresh mutable profile fields. Returns whether anything changed.
    pub fn refresh(&mut self, profile: &UserProfile) -> DomainResult<bool> {
        if profile.user_id != self.id {
            return Err(DomainError::invariant("profile belongs to a different user"));
        }
        let display_name = display_name_for(profile, &self.email)?;
        let avatar_url = normalize_avatar(profile.avatar_url.as_deref());
        if display_name == self.display_name && avatar_url == self.avatar_url {
            return Ok(false);
        }
        self.display_name = display_name;
        self.avatar_url = avatar_url;
        self.updated_at = profile.occurred_at;
        Ok(true)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace) => {
            Ok(email.to_string())
        }
        _ => Err(DomainError::validation(format!("invalid email address '{email}'"))),
    }
}

fn normalize_avatar(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Falls back to the email's local part when the provider sends no name.
fn display_name_for(profile: &UserProfile, email: &str) -> DomainResult<String> {
    match profile.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => normalize_name("display name", name),
        _ => {
            let local = email.split('@').next().unwrap_or(email);
            normalize_name("display name", local)
        }
    }
}
