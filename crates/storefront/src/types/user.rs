//! Member accounts and authentication payloads.

use blossom_core::{Email, MemberId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::validate::{self, Validate, ValidationError};

/// A signed-in member.
///
/// The session token is kept as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "UserRecord", into = "UserRecord")]
pub struct User {
    pub id: MemberId,
    pub login_id: String,
    pub name: String,
    pub role: UserRole,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub token: Option<SecretString>,
}

impl User {
    /// Whether the member holds one of the back-office roles.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login_id", &self.login_id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("loginId", &self.login_id)?;
        if let Some(token) = &self.token {
            validate::non_blank("token", token.expose_secret())?;
        }
        Ok(())
    }
}

/// Wire form of [`User`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: MemberId,
    login_id: String,
    name: String,
    role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            login_id: record.login_id,
            name: record.name,
            role: record.role,
            email: record.email,
            phone: record.phone,
            token: record.token.map(SecretString::from),
        }
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login_id: user.login_id,
            name: user.name,
            role: user.role,
            email: user.email,
            phone: user.phone,
            token: user.token.map(|t| t.expose_secret().to_string()),
        }
    }
}

/// Credentials for `POST /members/login`.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: SecretString,
}

impl LoginRequest {
    #[must_use]
    pub fn new(login_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl Serialize for LoginRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            login_id: &'a str,
            password: &'a str,
        }

        Wire {
            login_id: &self.login_id,
            password: self.password.expose_secret(),
        }
        .serialize(serializer)
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("loginId", &self.login_id)?;
        if self.password.expose_secret().is_empty() {
            return Err(ValidationError::new("password", "must not be empty"));
        }
        Ok(())
    }
}

/// New member registration for `POST /members/register`.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub login_id: String,
    pub password: SecretString,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Serialize for RegisterRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            login_id: &'a str,
            password: &'a str,
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            phone: Option<&'a str>,
        }

        Wire {
            login_id: &self.login_id,
            password: self.password.expose_secret(),
            name: &self.name,
            email: self.email.as_deref(),
            phone: self.phone.as_deref(),
        }
        .serialize(serializer)
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::min_chars("loginId", &self.login_id, 4)?;
        validate::min_chars("password", self.password.expose_secret(), 6)?;
        validate::non_blank("name", &self.name)?;
        if let Some(email) = &self.email {
            Email::parse(email).map_err(|e| ValidationError::new("email", e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_decodes_with_token() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "loginId": "florist",
            "name": "Park",
            "role": "PRODUCT_ADMIN",
            "email": "park@example.com",
            "token": "jwt-token"
        }))
        .unwrap();

        assert!(user.is_admin());
        assert_eq!(user.email.as_ref().unwrap().as_str(), "park@example.com");
        assert_eq!(user.token.as_ref().unwrap().expose_secret(), "jwt-token");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "loginId": "florist", "name": "Park", "role": "USER", "token": "jwt-token"
        }))
        .unwrap();

        let debug = format!("{user:?}");
        assert!(!debug.contains("jwt-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_user_round_trips_through_json() {
        let user: User = serde_json::from_value(json!({
            "id": 3, "loginId": "buyer", "name": "Lee", "role": "USER", "token": "t"
        }))
        .unwrap();

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["token"], "t");
        assert_eq!(value["role"], "USER");
        assert!(value.get("email").is_none());
    }

    #[test]
    fn test_bad_email_or_role_is_rejected() {
        let result = serde_json::from_value::<User>(json!({
            "id": 1, "loginId": "x", "name": "y", "role": "USER", "email": "invalid-email"
        }));
        assert!(result.is_err());

        let result = serde_json::from_value::<User>(json!({
            "id": 1, "loginId": "x", "name": "y", "role": "SUPERUSER"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_login_request() {
        let request = LoginRequest::new("florist", "secret1");
        assert!(request.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"loginId": "florist", "password": "secret1"})
        );
        assert!(!format!("{request:?}").contains("secret1"));

        assert!(LoginRequest::new("florist", "").validate().is_err());
        assert!(LoginRequest::new(" ", "pw").validate().is_err());
    }

    #[test]
    fn test_register_request_rules() {
        let valid = RegisterRequest {
            login_id: "rose".to_string(),
            password: SecretString::from("123456".to_string()),
            name: "Choi".to_string(),
            email: Some("test@example.com".to_string()),
            phone: None,
        };
        assert!(valid.validate().is_ok());

        let short_id = RegisterRequest { login_id: "abc".to_string(), ..valid.clone() };
        assert_eq!(short_id.validate().unwrap_err().field, "loginId");

        let short_pw = RegisterRequest {
            password: SecretString::from("12345".to_string()),
            ..valid.clone()
        };
        assert_eq!(short_pw.validate().unwrap_err().field, "password");

        let bad_email = RegisterRequest { email: Some("invalid-email".to_string()), ..valid };
        assert_eq!(bad_email.validate().unwrap_err().field, "email");
    }
}
