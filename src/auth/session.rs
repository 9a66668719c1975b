//! In-memory session with best-effort durable mirroring.
//!
//! The in-memory value is the source of truth. Storage is a cache: read
//! once on hydration, written on `set`, removed on `clear`. Storage
//! failures are swallowed so a broken disk never breaks the client.

use super::storage::{SessionStorage, SESSION_RECORD_KEY};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Profile of the signed-in user. Replaced wholesale on re-authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Token and profile of the current user. Both exist or neither does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Payload returned by a successful login.
///
/// The backend omits empty profile fields, so only the token and id are
/// mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub access_token: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl From<AuthPayload> for Session {
    fn from(payload: AuthPayload) -> Self {
        Self {
            token: payload.access_token,
            user: UserProfile {
                id: payload.id,
                name: payload.name,
                email: payload.email,
                role: payload.role,
            },
        }
    }
}

/// Owner of the single logical session of a running client.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: Mutex<Option<Session>>,
}

impl SessionStore {
    /// Create an anonymous store backed by `storage`. Nothing is read until
    /// [`init`](Self::init).
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            state: Mutex::new(None),
        }
    }

    /// Hydrate from durable storage.
    ///
    /// No-op in non-interactive contexts and when a session is already held.
    /// A record that fails to parse is deleted and the store stays anonymous.
    pub fn init(&self) {
        if !self.storage.is_durable() {
            return;
        }

        let mut state = self.state.lock();
        if state.is_some() {
            return;
        }

        let raw = match self.storage.load(SESSION_RECORD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!("Session record unreadable: {e:#}");
                return;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if !session.token.is_empty() => {
                tracing::debug!(user_id = %session.user.id, "Session restored from storage");
                *state = Some(session);
            }
            Ok(_) => self.discard_record("empty token"),
            Err(e) => self.discard_record(&e.to_string()),
        }
    }

    /// Replace the session with the one carried by a login payload and
    /// persist it. Returns the new profile.
    ///
    /// A payload with an empty token leaves the store anonymous, exactly as
    /// [`init`](Self::init) would treat the same record.
    pub fn set(&self, payload: AuthPayload) -> UserProfile {
        let session = Session::from(payload);
        let user = session.user.clone();

        if session.token.is_empty() {
            tracing::warn!(user_id = %user.id, "Refusing session with empty token");
            self.clear();
            return user;
        }

        let mut state = self.state.lock();
        if self.storage.is_durable() {
            match serde_json::to_string(&session) {
                Ok(record) => {
                    if let Err(e) = self.storage.save(SESSION_RECORD_KEY, &record) {
                        tracing::debug!("Failed to persist session: {e:#}");
                    }
                }
                Err(e) => tracing::debug!("Failed to encode session: {e}"),
            }
        }
        *state = Some(session);

        user
    }

    /// Drop the session and its persisted record.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        *state = None;
        if self.storage.is_durable() {
            if let Err(e) = self.storage.remove(SESSION_RECORD_KEY) {
                tracing::debug!("Failed to remove session record: {e:#}");
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Snapshot of the current token.
    pub fn token(&self) -> Option<String> {
        self.state.lock().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.lock().as_ref().map(|s| s.user.clone())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.lock().clone()
    }

    /// Whether the backing storage is durable, i.e. this is an interactive
    /// context.
    pub fn is_interactive(&self) -> bool {
        self.storage.is_durable()
    }

    fn discard_record(&self, reason: &str) {
        tracing::warn!(reason, "Discarding corrupt session record");
        if let Err(e) = self.storage.remove(SESSION_RECORD_KEY) {
            tracing::debug!("Failed to remove corrupt session record: {e:#}");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
