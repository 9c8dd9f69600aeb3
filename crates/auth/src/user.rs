//! User accounts, profiles, and the forms that create and edit them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{DomainResult, Entity, FieldErrors, UserId};

use crate::Role;

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const BIO_MAX_LEN: usize = 500;
pub const LOCATION_MAX_LEN: usize = 30;
pub const WEBSITE_MAX_LEN: usize = 200;
pub const DEFAULT_PROFILE_PICTURE: &str = "profile_pics/default.jpg";

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Per-user profile, created together with the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub role: Role,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub website: String,
    pub profile_picture: String,
}

impl Profile {
    /// The profile every new account starts with.
    pub fn default_for(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Member,
            bio: String::new(),
            location: String::new(),
            birth_date: None,
            website: String::new(),
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
        }
    }
}

impl Entity for Profile {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.user_id
    }
}

/// A validated account ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self, id: UserId, date_joined: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            is_active: true,
            date_joined,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forms
// ─────────────────────────────────────────────────────────────────────────────

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Validate every field; on success the cleaned values are written back.
    pub fn clean(&mut self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();

        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();

        check_username(&self.username, &mut errors);
        check_email(&self.email, &mut errors);
        check_name("first_name", &self.first_name, &mut errors);
        check_name("last_name", &self.last_name, &mut errors);

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if !self.password1.is_empty() && self.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }
        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result()
    }
}

/// Account fields a user may change about themselves.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserUpdate {
    pub fn clean(&mut self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();

        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();

        check_username(&self.username, &mut errors);
        check_email(&self.email, &mut errors);
        check_name("first_name", &self.first_name, &mut errors);
        check_name("last_name", &self.last_name, &mut errors);

        errors.into_result()
    }

    pub fn apply_to(self, user: &mut User) {
        user.username = self.username;
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.email = self.email;
    }
}

/// Editable profile fields. The role is not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub website: String,
}

impl ProfileUpdate {
    pub fn clean(&mut self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();

        self.location = self.location.trim().to_string();
        self.website = self.website.trim().to_string();

        if self.bio.chars().count() > BIO_MAX_LEN {
            errors.add("bio", max_len_message(BIO_MAX_LEN, self.bio.chars().count()));
        }
        if self.location.chars().count() > LOCATION_MAX_LEN {
            errors.add("location", max_len_message(LOCATION_MAX_LEN, self.location.chars().count()));
        }
        if self.website.chars().count() > WEBSITE_MAX_LEN {
            errors.add("website", max_len_message(WEBSITE_MAX_LEN, self.website.chars().count()));
        }
        if !self.website.is_empty() && !is_http_url(&self.website) {
            errors.add("website", "Enter a valid URL.");
        }

        errors.into_result()
    }

    pub fn apply_to(self, profile: &mut Profile) {
        profile.bio = self.bio;
        profile.location = self.location;
        profile.birth_date = self.birth_date;
        profile.website = self.website;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field checks
// ─────────────────────────────────────────────────────────────────────────────

fn max_len_message(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

fn check_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", "This field is required.");
        return;
    }
    let len = username.chars().count();
    if len > USERNAME_MAX_LEN {
        errors.add("username", max_len_message(USERNAME_MAX_LEN, len));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.add("email", "This field is required.");
    } else if !is_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_name(field: &'static str, value: &str, errors: &mut FieldErrors) {
    let len = value.chars().count();
    if len > NAME_MAX_LEN {
        errors.add(field, max_len_message(NAME_MAX_LEN, len));
    }
}

fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !url.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use folio_core::DomainError;

    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password1: "analytical-engine".to_string(),
            password2: "analytical-engine".to_string(),
        }
    }

    fn field_errors(result: DomainResult<()>) -> FieldErrors {
        match result {
            Err(DomainError::Fields(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn valid_registration_is_cleaned() {
        let mut f = form();
        f.username = "  ada ".to_string();
        f.clean().unwrap();
        assert_eq!(f.username, "ada");
    }

    #[test]
    fn registration_requires_email() {
        let mut f = form();
        f.email = String::new();
        let errors = field_errors(f.clean());
        assert_eq!(errors.get("email").unwrap(), ["This field is required.".to_string()]);
    }

    #[test]
    fn registration_requires_both_passwords() {
        let mut f = form();
        f.password1 = String::new();
        f.password2 = String::new();
        let errors = field_errors(f.clean());
        assert_eq!(errors.get("password1").unwrap(), ["This field is required.".to_string()]);
        assert_eq!(errors.get("password2").unwrap(), ["This field is required.".to_string()]);
    }

    #[test]
    fn registration_rejects_mismatched_passwords() {
        let mut f = form();
        f.password2 = "different-password".to_string();
        let errors = field_errors(f.clean());
        assert!(errors.get("password2").is_some());
    }

    #[test]
    fn registration_rejects_short_and_numeric_passwords() {
        let mut f = form();
        f.password1 = "1234".to_string();
        f.password2 = "1234".to_string();
        let errors = field_errors(f.clean());
        assert_eq!(errors.get("password1").unwrap().len(), 2);
    }

    #[test]
    fn registration_rejects_odd_username_characters() {
        let mut f = form();
        f.username = "ada lovelace!".to_string();
        let errors = field_errors(f.clean());
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn long_first_name_is_rejected() {
        let mut f = form();
        f.first_name = "x".repeat(31);
        let errors = field_errors(f.clean());
        assert!(errors.get("first_name").is_some());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a b@c.co"));
        assert!(!is_email("a@.co"));
    }

    #[test]
    fn profile_update_limits() {
        let mut update = ProfileUpdate {
            bio: "b".repeat(501),
            location: "l".repeat(31),
            birth_date: None,
            website: "ftp://example.com".to_string(),
        };
        let errors = field_errors(update.clean());
        assert!(errors.get("bio").is_some());
        assert!(errors.get("location").is_some());
        assert_eq!(errors.get("website").unwrap(), ["Enter a valid URL.".to_string()]);
    }

    #[test]
    fn profile_update_accepts_http_urls() {
        let mut update = ProfileUpdate {
            website: " https://ada.dev/about ".to_string(),
            ..Default::default()
        };
        update.clean().unwrap();
        assert_eq!(update.website, "https://ada.dev/about");
    }

    #[test]
    fn new_profiles_are_members_with_default_picture() {
        let profile = Profile::default_for(UserId::new());
        assert_eq!(profile.role, Role::Member);
        assert_eq!(profile.profile_picture, DEFAULT_PROFILE_PICTURE);
    }
}
