//! User account aggregate.
//!
//! A [`UserAccount`] composes [`EntityMetadata`] with validated profile
//! fields. Credentials are owned by the upstream identity provider and are not
//! stored here.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{Auditable, EntityMetadata, impl_entity_identity};

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 50;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;
/// Maximum allowed length for a first or last name.
pub const PERSON_NAME_MAX: usize = 100;

/// Validation errors raised while building user account fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAccountValidationError {
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    EmptyUsername,
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyFirstName,
    FirstNameTooLong { max: usize },
    EmptyLastName,
    LastNameTooLong { max: usize },
}

impl UserAccountValidationError {
    /// Request field the error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
            Self::EmptyUsername
            | Self::UsernameTooShort { .. }
            | Self::UsernameTooLong { .. }
            | Self::UsernameInvalidCharacters => "username",
            Self::EmptyFirstName | Self::FirstNameTooLong { .. } => "firstName",
            Self::EmptyLastName | Self::LastNameTooLong { .. } => "lastName",
        }
    }

    /// Stable machine-readable reason.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::EmptyUsername | Self::EmptyFirstName | Self::EmptyLastName => {
                "empty"
            }
            Self::UsernameTooShort { .. } => "too_short",
            Self::EmailTooLong { .. }
            | Self::UsernameTooLong { .. }
            | Self::FirstNameTooLong { .. }
            | Self::LastNameTooLong { .. } => "too_long",
            Self::InvalidEmail => "invalid_format",
            Self::UsernameInvalidCharacters => "invalid_characters",
        }
    }
}

impl fmt::Display for UserAccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like name@example.com"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, hyphens, or underscores",
            ),
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::FirstNameTooLong { max } => {
                write!(f, "first name must be at most {max} characters")
            }
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::LastNameTooLong { max } => {
                write!(f, "last name must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for UserAccountValidationError {}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately.
        Regex::new("^[A-Za-z0-9_.-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Contact email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserAccountValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(UserAccountValidationError::EmptyEmail);
        }
        if email.chars().count() > EMAIL_MAX {
            return Err(UserAccountValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&email) {
            return Err(UserAccountValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

/// Unique login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, UserAccountValidationError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(UserAccountValidationError::EmptyUsername);
        }
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserAccountValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserAccountValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserAccountValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

/// First or last name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct PersonName(String);

impl PersonName {
    /// Validate a first name.
    pub fn first(name: impl Into<String>) -> Result<Self, UserAccountValidationError> {
        Self::validated(
            name.into(),
            UserAccountValidationError::EmptyFirstName,
            UserAccountValidationError::FirstNameTooLong {
                max: PERSON_NAME_MAX,
            },
        )
    }

    /// Validate a last name.
    pub fn last(name: impl Into<String>) -> Result<Self, UserAccountValidationError> {
        Self::validated(
            name.into(),
            UserAccountValidationError::EmptyLastName,
            UserAccountValidationError::LastNameTooLong {
                max: PERSON_NAME_MAX,
            },
        )
    }

    fn validated(
        name: String,
        empty: UserAccountValidationError,
        too_long: UserAccountValidationError,
    ) -> Result<Self, UserAccountValidationError> {
        if name.trim().is_empty() {
            return Err(empty);
        }
        if name.chars().count() > PERSON_NAME_MAX {
            return Err(too_long);
        }
        Ok(Self(name))
    }
}

macro_rules! string_newtype_views {
    ($($ty:ident),* $(,)?) => {
        $(
            impl AsRef<str> for $ty {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_ref())
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }
        )*
    };
}

string_newtype_views!(Email, Username, PersonName);

impl TryFrom<String> for Email {
    type Error = UserAccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Username {
    type Error = UserAccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// Fields supplied when registering an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccountDraft {
    pub email: Email,
    pub username: Username,
    pub role: UserRole,
    pub first_name: PersonName,
    pub last_name: PersonName,
}

impl UserAccountDraft {
    /// Validate raw registration input. The role defaults to
    /// [`UserRole::User`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{UserAccountDraft, UserRole};
    ///
    /// let draft = UserAccountDraft::try_new("ada@example.com", "ada", "Ada", "Lovelace")
    ///     .expect("valid draft");
    /// assert_eq!(draft.role, UserRole::User);
    /// assert!(UserAccountDraft::try_new("", "ada", "Ada", "Lovelace").is_err());
    /// ```
    pub fn try_new(
        email: impl Into<String>,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, UserAccountValidationError> {
        Ok(Self {
            email: Email::new(email)?,
            username: Username::new(username)?,
            role: UserRole::default(),
            first_name: PersonName::first(first_name)?,
            last_name: PersonName::last(last_name)?,
        })
    }

    /// Replace the role.
    #[must_use]
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }
}

/// Persisted user account.
///
/// ## Invariants
/// - `username` is unique among accounts, including soft-deleted ones.
/// - Equality and hashing use the record id only.
#[derive(Debug, Clone)]
pub struct UserAccount {
    metadata: EntityMetadata,
    email: Email,
    username: Username,
    role: UserRole,
    first_name: PersonName,
    last_name: PersonName,
    enabled: bool,
}

impl UserAccount {
    /// Contact email.
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Unique login name.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Assigned role.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    /// Given name.
    #[must_use]
    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    /// Family name.
    #[must_use]
    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }

    /// Whether the account may sign in.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Replace the contact email.
    pub fn set_email(&mut self, email: Email) {
        self.email = email;
    }

    /// Replace the given name.
    pub fn set_first_name(&mut self, first_name: PersonName) {
        self.first_name = first_name;
    }

    /// Replace the family name.
    pub fn set_last_name(&mut self, last_name: PersonName) {
        self.last_name = last_name;
    }

    /// Enable or disable the account.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Auditable for UserAccount {
    type Draft = UserAccountDraft;
    const ENTITY_NAME: &'static str = "UserAccount";

    fn from_draft(draft: Self::Draft, metadata: EntityMetadata) -> Self {
        let UserAccountDraft {
            email,
            username,
            role,
            first_name,
            last_name,
        } = draft;
        Self {
            metadata,
            email,
            username,
            role,
            first_name,
            last_name,
            enabled: true,
        }
    }

    fn unique_key(&self) -> Option<&str> {
        Some(self.username.as_ref())
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }
}

impl_entity_identity!(UserAccount);

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{Auditor, EntityId};
    use crate::test_support::fixture_timestamp;
    use rstest::{fixture, rstest};

    #[fixture]
    fn draft() -> UserAccountDraft {
        UserAccountDraft::try_new("ada@example.com", "ada.l", "Ada", "Lovelace")
            .expect("valid draft")
    }

    #[rstest]
    fn new_accounts_are_enabled_users(draft: UserAccountDraft) {
        let metadata =
            EntityMetadata::created(EntityId::random(), &Auditor::system(), fixture_timestamp());
        let account = UserAccount::from_draft(draft, metadata);

        assert!(account.is_enabled());
        assert_eq!(account.role(), UserRole::User);
        assert_eq!(account.username().as_ref(), "ada.l");
        assert!(!account.is_soft_deleted());
    }

    #[rstest]
    fn draft_role_can_be_raised(draft: UserAccountDraft) {
        assert_eq!(draft.with_role(UserRole::Admin).role, UserRole::Admin);
    }

    #[rstest]
    #[case("", UserAccountValidationError::EmptyEmail)]
    #[case("   ", UserAccountValidationError::EmptyEmail)]
    #[case("ada.example.com", UserAccountValidationError::InvalidEmail)]
    #[case("ada@localhost", UserAccountValidationError::InvalidEmail)]
    #[case("a da@example.com", UserAccountValidationError::InvalidEmail)]
    fn invalid_emails_are_rejected(#[case] raw: &str, #[case] expected: UserAccountValidationError) {
        assert_eq!(Email::new(raw), Err(expected));
    }

    #[rstest]
    #[case("", UserAccountValidationError::EmptyUsername)]
    #[case("ab", UserAccountValidationError::UsernameTooShort { min: USERNAME_MIN })]
    #[case("ada lovelace", UserAccountValidationError::UsernameInvalidCharacters)]
    #[case("ada!", UserAccountValidationError::UsernameInvalidCharacters)]
    fn invalid_usernames_are_rejected(
        #[case] raw: &str,
        #[case] expected: UserAccountValidationError,
    ) {
        assert_eq!(Username::new(raw), Err(expected));
    }

    #[rstest]
    fn overlong_usernames_are_rejected() {
        let raw = "a".repeat(USERNAME_MAX + 1);
        assert_eq!(
            Username::new(raw),
            Err(UserAccountValidationError::UsernameTooLong { max: USERNAME_MAX })
        );
    }

    #[rstest]
    fn blank_names_report_their_field() {
        let first = PersonName::first(" ").expect_err("blank first name");
        let last = PersonName::last("").expect_err("blank last name");

        assert_eq!((first.field(), first.code()), ("firstName", "empty"));
        assert_eq!((last.field(), last.code()), ("lastName", "empty"));
    }

    #[rstest]
    fn overlong_names_are_rejected() {
        let err = PersonName::last("x".repeat(PERSON_NAME_MAX + 1)).expect_err("too long");
        assert_eq!(err.field(), "lastName");
        assert_eq!(err.code(), "too_long");
    }

    #[rstest]
    fn roles_use_upper_case_wire_names() {
        let value = serde_json::to_value(UserRole::Admin).expect("role serialises");
        assert_eq!(value, serde_json::json!("ADMIN"));
        let parsed: UserRole = serde_json::from_value(serde_json::json!("USER")).expect("role");
        assert_eq!(parsed, UserRole::User);
    }

    #[rstest]
    fn deserialising_validates_usernames() {
        let result = serde_json::from_value::<Username>(serde_json::json!("x"));
        assert!(result.is_err());
    }
}
