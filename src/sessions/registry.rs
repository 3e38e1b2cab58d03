//! In-memory session registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::UserId;
use crate::config::TransitionPolicy;
use crate::dialogue::{DialogueController, State};

/// One user's conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub controller: DialogueController,
    created_at: DateTime<Utc>,
    last_active: Instant,
}

impl Session {
    fn new(policy: TransitionPolicy) -> Self {
        Self {
            controller: DialogueController::new(policy),
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.idle_for() >= ttl
    }

    fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

/// Sessions by user id.
///
/// The map lock is held only for lookups and inserts. Each session has its own
/// mutex, so users never wait on each other.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
    ttl: Duration,
    policy: TransitionPolicy,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(ttl: Duration, policy: TransitionPolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            policy,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the session for `user`, creating it on first contact.
    async fn session(&self, user: UserId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&user) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user).or_insert_with(|| {
            debug!("Creating session for user {}", user);
            Arc::new(Mutex::new(Session::new(self.policy)))
        });
        Arc::clone(session)
    }

    /// Runs `f` on the session of `user` under its lock.
    ///
    /// A session found idle past the TTL in the middle of a dialogue is moved
    /// to `Timeout` first.
    pub async fn with_session<T>(&self, user: UserId, f: impl FnOnce(&mut Session) -> T) -> T {
        let session = self.session(user).await;
        let mut session = session.lock().await;

        let state = session.controller.current_state();
        if session.is_expired(self.ttl)
            && !matches!(state, State::Idle | State::Generating)
            && !state.is_terminal()
        {
            info!("Session for user {} timed out in {}", user, state);
            session.controller.expire();
        }
        session.touch();
        f(&mut *session)
    }

    /// Clears the dialogue of `user` back to `Idle`.
    pub async fn reset(&self, user: UserId) {
        self.with_session(user, |session| session.controller.reset())
            .await;
    }

    /// A copy of the controller of `user`, if a session exists.
    pub async fn snapshot(&self, user: UserId) -> Option<DialogueController> {
        let session = self.sessions.read().await.get(&user).map(Arc::clone)?;
        let session = session.lock().await;
        Some(session.controller.clone())
    }

    /// Drops sessions idle past the TTL and returns how many were removed.
    ///
    /// Sessions that are generating, locked, or held by an in-flight lookup
    /// are kept.
    pub async fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|user, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }
            match session.try_lock() {
                Ok(session) => {
                    let keep = session.controller.current_state() == State::Generating
                        || !session.is_expired(self.ttl);
                    if !keep {
                        debug!("Evicting idle session for user {}", user);
                    }
                    keep
                }
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(ttl: Duration) -> SessionRegistry {
        SessionRegistry::new(ttl, TransitionPolicy::Strict)
    }

    #[tokio::test]
    async fn test_sessions_created_lazily() {
        let registry = registry(Duration::from_secs(60));
        assert!(registry.snapshot(1).await.is_none());

        let state = registry
            .with_session(1, |s| s.controller.current_state())
            .await;
        assert_eq!(state, State::Idle);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_contact_creates_one_session() {
        let registry = Arc::new(registry(Duration::from_secs(60)));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .with_session(7, |s| {
                            if s.controller.current_state() == State::Idle {
                                s.controller.transition_to(State::AwaitingTemplate).unwrap();
                            }
                        })
                        .await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.len().await, 1);
        assert_eq!(
            registry.snapshot(7).await.unwrap().current_state(),
            State::AwaitingTemplate
        );
    }

    #[tokio::test]
    async fn test_idle_session_times_out_on_lookup() {
        let registry = registry(Duration::from_millis(20));
        registry
            .with_session(1, |s| s.controller.transition_to(State::AwaitingTemplate))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let state = registry
            .with_session(1, |s| s.controller.current_state())
            .await;
        assert_eq!(state, State::Timeout);
    }

    #[tokio::test]
    async fn test_evict_skips_generating_sessions() {
        let registry = registry(Duration::from_millis(20));
        registry.with_session(1, |_| ()).await;
        registry
            .with_session(2, |s| s.controller.begin_generation("abc").map(|_| ()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(registry.evict_expired().await, 1);
        assert!(registry.snapshot(1).await.is_none());
        assert!(registry.snapshot(2).await.is_some());
    }

    #[tokio::test]
    async fn test_evict_keeps_session_held_by_lookup() {
        let registry = registry(Duration::from_millis(20));
        registry
            .with_session(1, |s| s.controller.transition_to(State::AwaitingTemplate))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let held = registry.session(1).await;
        assert_eq!(registry.evict_expired().await, 0);
        drop(held);

        let state = registry
            .with_session(1, |s| s.controller.current_state())
            .await;
        assert_eq!(state, State::Timeout);
        assert!(registry.snapshot(1).await.is_some());
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let registry = registry(Duration::from_secs(60));
        registry
            .with_session(3, |s| s.controller.transition_to(State::AwaitingTemplate))
            .await
            .unwrap();
        registry.reset(3).await;
        assert_eq!(registry.snapshot(3).await.unwrap().current_state(), State::Idle);
    }
}
