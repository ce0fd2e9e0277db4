//! Signed-in user state, persisted under `authUser`.

use std::sync::Arc;

use skycast_core::KeyValueStore;
use tokio::sync::watch;

use crate::error::AuthError;
use crate::identity::{decode_id_token, UserProfile};

pub const AUTH_USER_KEY: &str = "authUser";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Observable sign-in state.
pub struct AuthSession {
    state: watch::Sender<AuthState>,
    storage: Arc<dyn KeyValueStore>,
}

impl AuthSession {
    /// Rehydrate from storage. A missing or unreadable entry means signed out.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let user = match storage.get(AUTH_USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Failed to parse persisted user: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read persisted user: {}", e);
                None
            }
        };

        let (state, _) = watch::channel(AuthState {
            user,
            ..AuthState::default()
        });

        Self { state, storage }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    /// Complete a sign-in with the identity token returned by the provider.
    pub fn sign_in_with_credential(&self, credential: &str) -> Result<UserProfile, AuthError> {
        self.set_loading(true);

        match decode_id_token(credential) {
            Ok(profile) => {
                tracing::info!("Signed in as {}", profile.email);
                self.set_user(Some(profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!("Rejected identity token: {}", e.detail());
                self.set_error(Some(e.user_message().to_string()));
                Err(e)
            }
        }
    }

    /// Replace the current user, clearing loading and error. `None` signs out.
    pub fn set_user(&self, user: Option<UserProfile>) {
        self.persist(user.as_ref());
        self.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
            state.error = None;
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    /// Record an error; also ends any pending sign-in.
    pub fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|state| {
            state.error = error;
            state.loading = false;
        });
    }

    pub fn logout(&self) {
        self.persist(None);
        self.state.send_modify(|state| {
            state.user = None;
            state.error = None;
            state.loading = false;
        });
        tracing::info!("Signed out");
    }

    fn persist(&self, user: Option<&UserProfile>) {
        let result = match user {
            Some(user) => match serde_json::to_string(user) {
                Ok(json) => self.storage.set(AUTH_USER_KEY, &json),
                Err(e) => {
                    tracing::warn!("Failed to serialize user: {}", e);
                    return;
                }
            },
            None => self.storage.remove(AUTH_USER_KEY),
        };

        if let Err(e) = result {
            tracing::warn!("Failed to persist user: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::identity::encode_test_token;
    use skycast_core::MemoryStore;

    fn ada() -> UserProfile {
        UserProfile {
            email: "ada@example.com".into(),
            name: "Ada".into(),
            picture: "https://example.com/ada.png".into(),
        }
    }

    #[test]
    fn test_starts_signed_out() {
        let session = AuthSession::load(Arc::new(MemoryStore::new()));
        assert_eq!(session.snapshot(), AuthState::default());
        assert!(!session.is_signed_in());
    }

    #[test]
    fn test_rehydrates_persisted_user() {
        let json = serde_json::to_string(&ada()).unwrap();
        let store = Arc::new(MemoryStore::with_entries([(AUTH_USER_KEY, json)]));
        let session = AuthSession::load(store);
        assert_eq!(session.user(), Some(ada()));
    }

    #[test]
    fn test_corrupt_persisted_user_is_signed_out() {
        let store = Arc::new(MemoryStore::with_entries([(AUTH_USER_KEY, "{not json")]));
        let session = AuthSession::load(store);
        assert!(session.user().is_none());
    }

    #[test]
    fn test_sign_in_persists_profile() {
        let store = Arc::new(MemoryStore::new());
        let session = AuthSession::load(store.clone());

        let token = encode_test_token(&serde_json::json!({
            "email": "ada@example.com",
            "name": "Ada",
            "picture": "https://example.com/ada.png"
        }));
        let profile = session.sign_in_with_credential(&token).unwrap();

        assert_eq!(profile, ada());
        let state = session.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_none());

        let stored = store.get(AUTH_USER_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<UserProfile>(&stored).unwrap(), ada());
    }

    #[test]
    fn test_bad_credential_sets_error() {
        let session = AuthSession::load(Arc::new(MemoryStore::new()));
        assert!(session.sign_in_with_credential("garbage").is_err());

        let state = session.snapshot();
        assert!(state.user.is_none());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to decode user information"));
    }

    #[test]
    fn test_logout_removes_persisted_user() {
        let store = Arc::new(MemoryStore::new());
        let session = AuthSession::load(store.clone());
        session.set_user(Some(ada()));
        session.set_error(Some("stale".into()));

        session.logout();

        assert_eq!(session.snapshot(), AuthState::default());
        assert_eq!(store.get(AUTH_USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_user_none_removes_key() {
        let store = Arc::new(MemoryStore::new());
        let session = AuthSession::load(store.clone());
        session.set_user(Some(ada()));
        session.set_user(None);
        assert_eq!(store.get(AUTH_USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_loading_and_error_transitions() {
        let session = AuthSession::load(Arc::new(MemoryStore::new()));
        let mut rx = session.subscribe();

        session.set_loading(true);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().loading);

        session.set_error(Some("Popup closed".into()));
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Popup closed"));
    }
}
