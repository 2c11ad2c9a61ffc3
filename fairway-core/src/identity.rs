use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The signed-in visitor, as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

/// Observable current-user handle over the external auth provider.
///
/// `current` is the synchronous read used for per-write backend selection;
/// `watch` gives push notification of sign-in/sign-out for callers that
/// need to react to session changes.
pub trait AuthSession: Send + Sync {
    fn current(&self) -> Option<UserIdentity>;

    fn watch(&self) -> watch::Receiver<Option<UserIdentity>>;
}

/// Settable auth session for tests and local development.
pub struct StaticAuthSession {
    tx: watch::Sender<Option<UserIdentity>>,
}

impl StaticAuthSession {
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn signed_in(user: UserIdentity) -> Self {
        Self::new(Some(user))
    }

    pub fn new(initial: Option<UserIdentity>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, user: UserIdentity) {
        tracing::debug!(uid = %user.uid, "auth session signed in");
        let _ = self.tx.send(Some(user));
    }

    pub fn sign_out(&self) {
        tracing::debug!("auth session signed out");
        let _ = self.tx.send(None);
    }
}

impl AuthSession for StaticAuthSession {
    fn current(&self) -> Option<UserIdentity> {
        self.tx.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.tx.subscribe()
    }
}
