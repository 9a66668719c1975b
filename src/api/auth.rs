//! Login, registration and logout against `/api/auth`.

use super::dispatcher::{RequestDispatcher, RequestOptions};
use super::error::ApiError;
use crate::auth::{AuthPayload, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Account as returned by registration. The backend omits empty fields.
#[derive(Debug, Clone, Deserialize)]
struct RegisteredUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
}

impl From<RegisteredUser> for UserProfile {
    fn from(user: RegisteredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Authentication endpoints bound to a dispatcher and its session.
pub struct AuthApi<'a> {
    dispatcher: &'a RequestDispatcher,
}

impl<'a> AuthApi<'a> {
    pub fn new(dispatcher: &'a RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Sign in and replace the current session on success.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let options = RequestOptions::post()
            .json(&LoginRequest { email, password })?
            .without_auth();
        let payload: AuthPayload = self.dispatcher.request("/api/auth/login", options).await?;
        if payload.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "login succeeded without an access token".into(),
            ));
        }

        let user = self.dispatcher.session().set(payload);
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Create an account. Does not sign in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ApiError> {
        let options = RequestOptions::post()
            .json(&RegisterRequest {
                name,
                email,
                password,
            })?
            .without_auth();
        let user: RegisteredUser = self
            .dispatcher
            .request("/api/auth/register", options)
            .await?;
        Ok(user.into())
    }

    /// Forget the local session. The backend keeps no logout state.
    pub fn logout(&self) {
        self.dispatcher.session().clear();
        tracing::info!("Signed out");
    }

    /// Profile of the signed-in user, hydrating from storage first.
    pub fn current_user(&self) -> Option<UserProfile> {
        let session = self.dispatcher.session();
        session.init();
        session.user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStorage, SessionStore, SESSION_RECORD_KEY};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup(server: &MockServer) -> (MemoryStorage, RequestDispatcher) {
        let storage = MemoryStorage::new();
        let session = Arc::new(SessionStore::new(storage.clone()));
        let dispatcher = RequestDispatcher::new(server.uri(), session).unwrap();
        (storage, dispatcher)
    }

    #[tokio::test]
    async fn login_sets_and_persists_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "ayu@example.com", "password": "secret123"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "User logged in successfully",
                "data": {
                    "id": "5b0e",
                    "name": "Ayu",
                    "email": "ayu@example.com",
                    "role": "manager",
                    "access_token": "jwt-abc"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (storage, dispatcher) = setup(&server);
        let api = AuthApi::new(&dispatcher);
        let user = api.login("ayu@example.com", "secret123").await.unwrap();

        assert_eq!(user.role, "manager");
        assert_eq!(dispatcher.session().token().as_deref(), Some("jwt-abc"));
        assert!(storage.get(SESSION_RECORD_KEY).unwrap().contains("jwt-abc"));
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_state() {
        let server = MockServer::start().await;
        Mock::given(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"errors": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let (storage, dispatcher) = setup(&server);
        let err = AuthApi::new(&dispatcher)
            .login("ayu@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(err.is_unauthorized());
        assert!(!dispatcher.session().is_authenticated());
        assert!(storage.get(SESSION_RECORD_KEY).is_none());
    }

    #[tokio::test]
    async fn login_without_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "5b0e", "name": "Ayu", "access_token": ""}
            })))
            .mount(&server)
            .await;

        let (storage, dispatcher) = setup(&server);
        let err = AuthApi::new(&dispatcher)
            .login("ayu@example.com", "secret123")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(!dispatcher.session().is_authenticated());
        assert!(storage.get(SESSION_RECORD_KEY).is_none());
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let server = MockServer::start().await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "User registered successfully",
                "data": {"id": "77aa", "name": "Budi", "email": "budi@example.com"}
            })))
            .mount(&server)
            .await;

        let (_storage, dispatcher) = setup(&server);
        let user = AuthApi::new(&dispatcher)
            .register("Budi", "budi@example.com", "password123")
            .await
            .unwrap();

        assert_eq!(user.id, "77aa");
        assert_eq!(user.role, "");
        assert!(!dispatcher.session().is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let server = MockServer::start().await;
        let (storage, dispatcher) = setup(&server);
        dispatcher.session().set(AuthPayload {
            access_token: "t".into(),
            id: "1".into(),
            name: "n".into(),
            email: "e".into(),
            role: "r".into(),
        });

        let api = AuthApi::new(&dispatcher);
        assert_eq!(api.current_user().map(|u| u.id).as_deref(), Some("1"));

        api.logout();
        assert!(api.current_user().is_none());
        assert!(storage.get(SESSION_RECORD_KEY).is_none());
    }
}
