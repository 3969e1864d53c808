//! Authentication data models.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// User ID type
pub type UserId = i64;

/// Role of an authenticated principal.
///
/// Role strings coming from the service are mapped here once; nothing else
/// in the client compares role names.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    /// A role this client does not know. Never satisfies a role requirement.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::User => write!(f, "USER"),
            Role::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// The authenticated user as returned by the service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
}

impl Principal {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Snapshot of the persisted session. Token and principal always come as a
/// pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub principal: Principal,
}

impl Session {
    #[must_use]
    pub fn role(&self) -> Role {
        self.principal.role
    }
}

/// Sign-in request body
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Sign-up request body; also used by admins creating users.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

/// Response of both sign-in and sign-up.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: Principal,
}

/// Per-field validation messages, keyed by form field name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Registration form as typed by the user, before validation.
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

const PASSWORD_SPECIALS: &str = "!@#$%^&*()";

impl RegistrationForm {
    /// Validate every field and build the sign-up request.
    ///
    /// # Errors
    ///
    /// Returns all failing fields at once.
    pub fn validate(&self) -> Result<SignUpRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.name.trim().is_empty() {
            errors.insert("name", "The name is required");
        } else if !is_letters(&self.name) {
            errors.insert("name", "The name can only contain letters");
        }

        if self.last_name.trim().is_empty() {
            errors.insert("lastName", "The last name is required");
        } else if !is_letters(&self.last_name) {
            errors.insert("lastName", "The last name can only contain letters");
        }

        if self.phone.trim().is_empty() {
            errors.insert("phone", "The phone number is required");
        } else if self.phone.len() != 10 || !self.phone.bytes().all(|b| b.is_ascii_digit()) {
            errors.insert("phone", "The phone number must be 10 digits long");
        }

        if self.email.trim().is_empty() {
            errors.insert("email", "The email is required");
        } else if !is_email(&self.email) {
            errors.insert("email", "The email is not valid");
        }

        if self.password.is_empty() {
            errors.insert("password", "The password is required");
        } else if self.password.chars().count() < 8 {
            errors.insert("password", "The password must be at least 8 characters long");
        } else if !is_strong(&self.password) {
            errors.insert(
                "password",
                "The password must contain at least one uppercase letter, one number, and one special character",
            );
        }

        if self.password != self.confirm_password {
            errors.insert("confirmPassword", "The passwords do not match");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SignUpRequest {
            name: self.name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

fn is_letters(value: &str) -> bool {
    value.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn is_strong(password: &str) -> bool {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    has_upper && has_digit && has_special
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "Ana María".to_string(),
            last_name: "Gómez".to_string(),
            phone: "3001234567".to_string(),
            email: "ana@example.com".to_string(),
            password: "Secret123!".to_string(),
            confirm_password: "Secret123!".to_string(),
        }
    }

    #[test]
    fn valid_form_builds_request() {
        let request = valid_form().validate().unwrap();
        assert_eq!(request.email, "ana@example.com");
        assert_eq!(request.last_name, "Gómez");
    }

    #[test]
    fn reports_every_failing_field() {
        let form = RegistrationForm {
            name: "R2D2".to_string(),
            phone: "12345".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            confirm_password: "other".to_string(),
            ..RegistrationForm::default()
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("name"), Some("The name can only contain letters"));
        assert_eq!(errors.get("lastName"), Some("The last name is required"));
        assert_eq!(errors.get("phone"), Some("The phone number must be 10 digits long"));
        assert_eq!(errors.get("email"), Some("The email is not valid"));
        assert_eq!(
            errors.get("password"),
            Some("The password must be at least 8 characters long")
        );
        assert_eq!(errors.get("confirmPassword"), Some("The passwords do not match"));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn password_needs_upper_digit_and_special() {
        for weak in ["lowercase1!", "NoDigits!!", "NoSpecial12"] {
            let form = RegistrationForm {
                password: weak.to_string(),
                confirm_password: weak.to_string(),
                ..valid_form()
            };
            let errors = form.validate().unwrap_err();
            assert!(errors.get("password").is_some(), "{weak} should be rejected");
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b."));
        assert!(!is_email("a@.b"));
        assert!(!is_email("@b.co"));
        assert!(!is_email("a b@c.de"));
        assert!(!is_email("a@b@c.de"));
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
        let unknown: Role = serde_json::from_str("\"SUPERVISOR\"").unwrap();
        assert_eq!(unknown, Role::Unknown);
    }

    #[test]
    fn principal_uses_camel_case() {
        let json = r#"{"id":7,"name":"Ana","lastName":"Gómez","phone":"3001234567",
            "email":"ana@example.com","role":"ADMIN","enabled":false}"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(principal.last_name, "Gómez");
        assert_eq!(principal.role, Role::Admin);
        assert!(!principal.enabled);
        assert_eq!(principal.full_name(), "Ana Gómez");
    }
}
