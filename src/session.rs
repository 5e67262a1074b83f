//! Session context and role resolution.
//!
//! A [`SessionContext`] is handed explicitly to the components that need it
//! instead of living in process-wide ambient state: it is created when an
//! identity signs in (or per request at the API boundary) and dropped on
//! sign-out. The [`RoleResolver`] owns one live context per client session
//! and guards against out-of-order lookup completions: every identity
//! change gets a fresh sequence tag, and a completion whose tag has been
//! superseded is discarded rather than overwriting newer state.

use crate::models::{Identity, Role};
use crate::storage::Storage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// Snapshot of who the caller is and what they may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: Option<Identity>,
    /// `None` means unauthenticated, or no role document exists.
    pub role: Option<Role>,
    /// True while a role lookup for the current identity is in flight.
    pub resolving: bool,
}

impl SessionContext {
    pub fn signed_out() -> Self {
        Self {
            identity: None,
            role: None,
            resolving: false,
        }
    }

    /// Gate for every admin surface: a resolved, signed-in admin.
    pub fn is_admin(&self) -> bool {
        !self.resolving && self.identity.is_some() && self.role == Some(Role::Admin)
    }
}

pub struct RoleResolver {
    storage: Storage,
    seq: AtomicU64,
    current: Mutex<(u64, SessionContext)>,
}

impl RoleResolver {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            seq: AtomicU64::new(0),
            current: Mutex::new((0, SessionContext::signed_out())),
        }
    }

    /// Resolve the role for an identity change: one document read, with the
    /// context reporting `resolving` until it lands. A read failure is
    /// non-fatal and degrades to no role.
    pub fn resolve(&self, identity: Option<Identity>) -> SessionContext {
        let tag = self.begin(identity.clone());
        let role = match &identity {
            Some(identity) => match self.storage.user_role(&identity.id) {
                Ok(role) => role,
                Err(err) => {
                    warn!(user = %identity.id, error = %err, "role lookup failed, treating as unassigned");
                    None
                }
            },
            None => None,
        };
        self.complete(tag, role)
    }

    /// Register an identity change and return the tag its lookup must
    /// complete with. Any lookup still in flight is superseded.
    pub fn begin(&self, identity: Option<Identity>) -> u64 {
        let tag = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut current = self.current.lock().expect("session lock poisoned");
        *current = (
            tag,
            SessionContext {
                identity,
                role: None,
                resolving: true,
            },
        );
        tag
    }

    /// Apply a finished lookup. A completion carrying a superseded tag is
    /// dropped: stale results must not overwrite a newer identity's state.
    pub fn complete(&self, tag: u64, role: Option<Role>) -> SessionContext {
        let mut current = self.current.lock().expect("session lock poisoned");
        if current.0 == tag {
            current.1.role = role;
            current.1.resolving = false;
        }
        current.1.clone()
    }

    pub fn session(&self) -> SessionContext {
        self.current
            .lock()
            .expect("session lock poisoned")
            .1
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use std::fs;

    fn temp_storage(name: &str) -> (Storage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        let storage = Storage::open(dir.to_str().unwrap()).expect("open storage");
        (storage, dir)
    }

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn test_missing_role_document_resolves_to_none() {
        let (storage, dir) = temp_storage("tradeflow_test_session_none");
        let resolver = RoleResolver::new(storage);

        let session = resolver.resolve(Some(identity("ghost")));
        assert_eq!(session.role, None);
        assert!(!session.resolving);
        assert!(!session.is_admin());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_signed_out_never_admin() {
        let (storage, dir) = temp_storage("tradeflow_test_session_out");
        let resolver = RoleResolver::new(storage);

        let session = resolver.resolve(None);
        assert_eq!(session, SessionContext::signed_out());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_admin_role_resolution() {
        let (storage, dir) = temp_storage("tradeflow_test_session_admin");
        let admin = storage
            .create_user("admin@example.com", "hash", Role::Admin)
            .unwrap();
        let resolver = RoleResolver::new(storage);

        let session = resolver.resolve(Some(Identity {
            id: admin.id.clone(),
            email: admin.email.clone(),
        }));
        assert_eq!(session.role, Some(Role::Admin));
        assert!(session.is_admin());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let (storage, dir) = temp_storage("tradeflow_test_session_stale");
        let resolver = RoleResolver::new(storage);

        // First lookup starts, then the identity changes underneath it.
        let stale_tag = resolver.begin(Some(identity("first")));
        let fresh_tag = resolver.begin(Some(identity("second")));

        // The slow first lookup lands out of order and must not win.
        let session = resolver.complete(stale_tag, Some(Role::Admin));
        assert!(session.resolving);
        assert_eq!(session.role, None);
        assert_eq!(session.identity, Some(identity("second")));

        let session = resolver.complete(fresh_tag, Some(Role::User));
        assert!(!session.resolving);
        assert_eq!(session.role, Some(Role::User));
        assert!(!session.is_admin());

        let _ = fs::remove_dir_all(dir);
    }
}
