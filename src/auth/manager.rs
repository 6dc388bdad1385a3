// Pass Protector - Session Manager
//
// Holds the single tracked session and a registry of observers. Every
// observer hears the current state once on registration, then exactly once
// per transition. State changes and their notifications are serialized by a
// delivery lock, so concurrent callers cannot reorder what observers see.
// Callbacks run after the registry lock is released: an observer may read
// `current()`, but must not sign in, sign out or resync from the callback.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::keychain::{KeychainError, SessionVault};

use super::{AuthError, IdentityProvider, Session};

type Observer = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    current: Option<Session>,
    observers: Vec<(u64, Observer)>,
    next_id: u64,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A panicking observer must not wedge every later sign-in.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn deliver(delivery: &Mutex<()>) -> MutexGuard<'_, ()> {
    delivery.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deregistration handle returned by [`SessionManager::observe`].
/// Notifications stop when it is dropped or `unsubscribe` is called.
#[must_use = "dropping the subscription stops notifications immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).observers.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct SessionManager {
    vault: Arc<dyn SessionVault + Send + Sync>,
    registry: Arc<Mutex<Registry>>,
    delivery: Mutex<()>,
}

impl SessionManager {
    /// Create a manager with no tracked session. Call [`resync`](Self::resync)
    /// to pick up a persisted one.
    pub fn new(vault: Arc<dyn SessionVault + Send + Sync>) -> Self {
        Self {
            vault,
            registry: Arc::new(Mutex::new(Registry::default())),
            delivery: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.registry).current.clone()
    }

    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let callback: Observer = Arc::new(callback);
        let _delivery = deliver(&self.delivery);
        let (id, snapshot) = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.observers.push((id, Arc::clone(&callback)));
            (id, registry.current.clone())
        };

        callback(snapshot.as_ref());

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Run `provider` and, on success, persist and track the new session.
    /// Any failure leaves the tracked session exactly as it was.
    pub fn sign_in(&self, provider: &dyn IdentityProvider) -> Result<Session, AuthError> {
        let session = provider.sign_in().map_err(|e| {
            tracing::warn!(provider = %provider.kind(), error = %e, "Sign-in failed");
            e
        })?;

        let _delivery = deliver(&self.delivery);
        self.vault.save_session(&session)?;

        tracing::info!(uid = %session.uid, provider = %session.provider, "Signed in");
        self.transition(Some(session.clone()));
        Ok(session)
    }

    /// Clear the tracked and persisted session. A no-op when already absent.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let _delivery = deliver(&self.delivery);
        if self.current().is_none() {
            tracing::debug!("Sign-out with no session, nothing to do");
            return Ok(());
        }

        self.vault.clear_session()?;

        tracing::info!("Signed out");
        self.transition(None);
        Ok(())
    }

    /// Re-read the persisted session and adopt it if it differs from the
    /// tracked one. Covers start-up restoration as well as sign-in/out
    /// performed by another process. An unreadable stored session is
    /// discarded and counts as absence.
    pub fn resync(&self) -> Result<(), AuthError> {
        let _delivery = deliver(&self.delivery);
        let stored = match self.vault.load_session() {
            Ok(stored) => stored,
            Err(KeychainError::CorruptSession(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                self.vault.clear_session()?;
                None
            }
            Err(e) => return Err(e.into()),
        };
        if stored == self.current() {
            return Ok(());
        }

        match stored {
            Some(ref session) => tracing::info!(uid = %session.uid, "Session restored"),
            None => tracing::info!("Session expired externally"),
        }
        self.transition(stored);
        Ok(())
    }

    fn transition(&self, next: Option<Session>) {
        let observers: Vec<Observer> = {
            let mut registry = lock(&self.registry);
            registry.current = next.clone();
            registry.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };

        for observer in observers {
            observer(next.as_ref());
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AnonymousProvider, EmailProvider, ProviderKind};
    use crate::keychain::mock::MockKeychain;

    /// Records every notification as the uid it carried (None for absence).
    fn recorder() -> (Arc<Mutex<Vec<Option<String>>>>, impl Fn(Option<&Session>) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |s: Option<&Session>| {
            sink.lock().unwrap().push(s.map(|s| s.uid.clone()));
        };
        (seen, callback)
    }

    fn manager() -> (SessionManager, Arc<MockKeychain>) {
        let keychain = Arc::new(MockKeychain::new());
        (SessionManager::new(keychain.clone()), keychain)
    }

    struct FailingProvider;

    impl IdentityProvider for FailingProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Email
        }

        fn sign_in(&self) -> Result<Session, AuthError> {
            Err(AuthError::Rejected("popup closed by provider".into()))
        }
    }

    #[test]
    fn test_observe_delivers_current_state_immediately() {
        let (manager, _) = manager();
        let (seen, callback) = recorder();

        let _sub = manager.observe(callback);
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_sign_in_and_out_notify_once_each() {
        let (manager, _) = manager();
        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        let session = manager.sign_in(&AnonymousProvider).unwrap();
        manager.sign_out().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some(session.uid.clone()), None]
        );
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_sign_out_when_absent_is_silent() {
        let (manager, _) = manager();
        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        manager.sign_out().unwrap();
        manager.sign_out().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![None]);
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_failed_sign_in_keeps_prior_session() {
        let (manager, _) = manager();
        let original = manager.sign_in(&EmailProvider::new("a@example.com")).unwrap();

        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        let err = manager.sign_in(&FailingProvider).unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        assert_eq!(manager.current(), Some(original.clone()));
        assert_eq!(*seen.lock().unwrap(), vec![Some(original.uid)]);
    }

    #[test]
    fn test_sign_in_persistence_failure_changes_nothing() {
        let (manager, keychain) = manager();
        keychain.fail_writes(true);

        let err = manager.sign_in(&AnonymousProvider).unwrap_err();
        assert!(matches!(err, AuthError::Persistence(_)));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_sign_in_persists_session() {
        let (manager, keychain) = manager();
        let session = manager.sign_in(&AnonymousProvider).unwrap();
        assert_eq!(keychain.load_session().unwrap(), Some(session));

        manager.sign_out().unwrap();
        assert!(keychain.load_session().unwrap().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (manager, _) = manager();
        let (seen, callback) = recorder();
        let sub = manager.observe(callback);

        sub.unsubscribe();
        manager.sign_in(&AnonymousProvider).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_other_observers_survive_one_unsubscribe() {
        let (manager, _) = manager();
        let (seen_a, callback_a) = recorder();
        let (seen_b, callback_b) = recorder();
        let sub_a = manager.observe(callback_a);
        let _sub_b = manager.observe(callback_b);

        drop(sub_a);
        let session = manager.sign_in(&AnonymousProvider).unwrap();

        assert_eq!(seen_a.lock().unwrap().len(), 1);
        assert_eq!(*seen_b.lock().unwrap(), vec![None, Some(session.uid)]);
    }

    #[test]
    fn test_resync_restores_persisted_session_once() {
        let keychain = Arc::new(MockKeychain::new());
        let persisted = Session::new("restored-uid", ProviderKind::Email, None);
        keychain.save_session(&persisted).unwrap();

        let manager = SessionManager::new(keychain.clone());
        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        manager.resync().unwrap();
        manager.resync().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("restored-uid".to_string())]
        );
        assert_eq!(manager.current(), Some(persisted));
    }

    #[test]
    fn test_resync_notices_external_expiry() {
        let (manager, keychain) = manager();
        manager.sign_in(&AnonymousProvider).unwrap();

        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        // Another process signed out.
        keychain.clear_session().unwrap();
        manager.resync().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], None);
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_unreadable_stored_session_is_discarded() {
        let keychain = Arc::new(MockKeychain::new());
        keychain.put_raw_session(r#"{"uid":"u"}"#);

        let manager = SessionManager::new(keychain.clone());
        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        manager.resync().unwrap();
        assert!(manager.current().is_none());
        assert!(keychain.load_session().unwrap().is_none());
        assert_eq!(*seen.lock().unwrap(), vec![None]);

        let session = manager.sign_in(&AnonymousProvider).unwrap();
        assert_eq!(manager.current(), Some(session));
    }

    #[test]
    fn test_corrupted_entry_ends_tracked_session() {
        let (manager, keychain) = manager();
        manager.sign_in(&AnonymousProvider).unwrap();

        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        keychain.put_raw_session("not json");
        manager.resync().unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], None);
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_concurrent_transitions_end_on_current_state() {
        let (manager, _) = manager();
        let manager = Arc::new(manager);
        let (seen, callback) = recorder();
        let _sub = manager.observe(callback);

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        if i % 2 == 0 {
                            manager.sign_in(&AnonymousProvider).unwrap();
                        } else {
                            manager.sign_out().unwrap();
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let last = seen.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last, manager.current().map(|s| s.uid));
    }

    #[test]
    fn test_observer_may_read_current_state() {
        let (manager, _) = manager();
        let manager = Arc::new(manager);
        let observed = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&manager);
        let sink = Arc::clone(&observed);
        let _sub = manager.observe(move |_| {
            sink.lock().unwrap().push(inner.current().is_some());
        });

        manager.sign_in(&AnonymousProvider).unwrap();
        assert_eq!(*observed.lock().unwrap(), vec![false, true]);
    }
}
