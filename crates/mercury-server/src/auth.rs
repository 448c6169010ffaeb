use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug)]
pub struct Identity {
    pub name: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".into(),
            is_admin: false,
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_admin: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Extract bearer credentials from an `Authorization` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| Self::Bearer(token.trim().to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// What a request wants to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Balances, per-user history, the stipend amount.
    Read,
    /// Transfers and stipend claims.
    Transact,
    /// Minting, burning, and the global history.
    Admin,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Transact => write!(f, "transact"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
    async fn authorize(&self, identity: &Identity, action: Action) -> ServerResult<bool>;
}

/// Single shared admin token.
///
/// With no token configured every caller is treated as an admin, which is
/// how a local development server runs.
pub struct AdminTokenAuth {
    token: Option<String>,
}

impl AdminTokenAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthProvider for AdminTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match (&self.token, credentials) {
            (None, _) => Ok(Identity::admin("local")),
            (Some(expected), Credentials::Bearer(given)) => {
                if tokens_match(expected, given) {
                    Ok(Identity::admin("admin"))
                } else {
                    Err(ServerError::Unauthorized("invalid bearer token".into()))
                }
            }
            (Some(_), Credentials::Anonymous) => Ok(Identity::anonymous()),
        }
    }

    async fn authorize(&self, identity: &Identity, action: Action) -> ServerResult<bool> {
        Ok(match action {
            Action::Read | Action::Transact => true,
            Action::Admin => identity.is_admin,
        })
    }
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn credentials_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Credentials::from_headers(&headers), Credentials::Anonymous);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(
            Credentials::from_headers(&headers),
            Credentials::Bearer("abc123".into())
        );

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(Credentials::from_headers(&headers), Credentials::Anonymous);
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Admin.to_string(), "admin");
        assert_eq!(Action::Transact.to_string(), "transact");
    }

    #[tokio::test]
    async fn open_server_treats_everyone_as_admin() {
        let auth = AdminTokenAuth::new(None);
        let id = auth.authenticate(&Credentials::Anonymous).await.unwrap();
        assert!(auth.authorize(&id, Action::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn token_gates_admin_actions() {
        let auth = AdminTokenAuth::new(Some("s3cret".into()));

        let anon = auth.authenticate(&Credentials::Anonymous).await.unwrap();
        assert!(!anon.is_admin);
        assert!(auth.authorize(&anon, Action::Transact).await.unwrap());
        assert!(!auth.authorize(&anon, Action::Admin).await.unwrap());

        let admin = auth
            .authenticate(&Credentials::Bearer("s3cret".into()))
            .await
            .unwrap();
        assert!(auth.authorize(&admin, Action::Admin).await.unwrap());

        let err = auth
            .authenticate(&Credentials::Bearer("guess".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Unauthorized(_)));
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }
}
