//! Request authentication.
//!
//! The platform accepts either a personal access token (sent as a bearer
//! token) or a username/password pair (sent as HTTP basic auth). The choice is
//! made once, when the credentials are built.

use std::fmt;

use thiserror::Error;

/// Credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Personal access token, sent as `Authorization: Bearer <token>`.
    Token(String),
    /// Username and password, sent as HTTP basic auth.
    Basic {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
}

/// Reasons a set of credential parts cannot be turned into [`Credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// Neither a token nor a username was supplied.
    #[error("neither token nor username supplied")]
    Missing,

    /// A username was supplied without a password.
    #[error("password not supplied for username {0:?}")]
    MissingPassword(String),
}

impl Credentials {
    /// Build credentials from optional parts.
    ///
    /// A token takes priority over a username/password pair when both are set.
    /// Empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Missing` if neither a token nor a username is
    /// supplied, and `CredentialsError::MissingPassword` if a username comes
    /// without a password.
    pub fn from_parts(
        token: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, CredentialsError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.is_empty())
        }

        if let Some(token) = present(token) {
            return Ok(Self::Token(token.to_string()));
        }

        match (present(username), present(password)) {
            (Some(username), Some(password)) => Ok(Self::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }),
            (Some(username), None) => Err(CredentialsError::MissingPassword(username.to_string())),
            (None, _) => Err(CredentialsError::Missing),
        }
    }

    /// Attach these credentials to a request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Token(token) => request.bearer_auth(token),
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(<redacted>)"),
            Self::Basic { username, .. } => {
                write!(f, "Credentials::Basic({username}, <redacted>)")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_takes_priority() {
        let creds = Credentials::from_parts(Some("dapi123"), Some("me"), Some("pw")).unwrap();
        assert_eq!(creds, Credentials::Token("dapi123".to_string()));
    }

    #[test]
    fn basic_pair() {
        let creds = Credentials::from_parts(None, Some("me"), Some("pw")).unwrap();
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "me".to_string(),
                password: "pw".to_string()
            }
        );
    }

    #[test]
    fn nothing_supplied() {
        assert_eq!(
            Credentials::from_parts(None, None, None),
            Err(CredentialsError::Missing)
        );
        assert_eq!(
            Credentials::from_parts(Some(""), None, Some("pw")),
            Err(CredentialsError::Missing)
        );
    }

    #[test]
    fn username_without_password() {
        assert_eq!(
            Credentials::from_parts(None, Some("me"), None),
            Err(CredentialsError::MissingPassword("me".to_string()))
        );
        assert_eq!(
            Credentials::from_parts(None, Some("me"), Some("")),
            Err(CredentialsError::MissingPassword("me".to_string()))
        );
    }

    #[test]
    fn empty_token_falls_back_to_basic() {
        let creds = Credentials::from_parts(Some(""), Some("me"), Some("pw")).unwrap();
        assert!(matches!(creds, Credentials::Basic { .. }));
    }

    #[test]
    fn debug_redacts_secrets() {
        let token = format!("{:?}", Credentials::Token("dapi-secret".into()));
        assert!(!token.contains("dapi-secret"));

        let basic = format!(
            "{:?}",
            Credentials::Basic {
                username: "me".into(),
                password: "hunter2".into()
            }
        );
        assert!(basic.contains("me"));
        assert!(!basic.contains("hunter2"));
    }
}
