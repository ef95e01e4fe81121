//! The per-service token registry

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gatepass::{ServiceName, ServiceNameRef, Token, SRV};
use thiserror::Error;

/// A token has already been issued for this service name
///
/// Duplicate issuance is a usage error on the caller's part, reported
/// as a hard failure. This is deliberately unlike the decode path, which
/// never fails.
#[derive(Clone, Debug, Error)]
#[error("a token has already been issued for service '{service}'")]
pub struct AlreadyIssued {
    service: ServiceName,
}

impl AlreadyIssued {
    /// The service name that already holds a token.
    pub fn service(&self) -> &ServiceNameRef {
        &self.service
    }
}

/// Maps service names to their issued tokens
///
/// Issue and remove operations for the same service name are serialized
/// by the map lock, so concurrent registrations cannot race their way
/// into duplicate tokens.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<ServiceName, Arc<Token>>>,
}

// TODO: expired tokens are never discarded; the host needs a periodic
// sweep that drops entries whose expiry has passed.

impl TokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token for `service`, with the `Srv` property set.
    ///
    /// Fails if a token for this service name is already outstanding;
    /// remove it first to re-issue.
    pub fn issue(&self, service: &ServiceNameRef) -> Result<Arc<Token>, AlreadyIssued> {
        let mut tokens = self.write();
        if tokens.contains_key(service) {
            tracing::warn!(service = %service, "duplicate token issuance refused");
            return Err(AlreadyIssued {
                service: service.to_owned(),
            });
        }

        let token = Token::new();
        token.set(SRV, service.as_str());
        let token = Arc::new(token);
        tokens.insert(service.to_owned(), Arc::clone(&token));
        tracing::debug!(service = %service, expiry = %token.expiry_string(), "token issued");
        Ok(token)
    }

    /// The token currently issued for `service`, if any.
    pub fn token_for(&self, service: &ServiceNameRef) -> Option<Arc<Token>> {
        self.read().get(service).cloned()
    }

    /// Removes and returns the token issued for `service`.
    pub fn remove(&self, service: &ServiceNameRef) -> Option<Arc<Token>> {
        let removed = self.write().remove(service);
        if removed.is_some() {
            tracing::debug!(service = %service, "token removed");
        }
        removed
    }

    /// How many services currently hold a token.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no tokens are outstanding.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ServiceName, Arc<Token>>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ServiceName, Arc<Token>>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str) -> ServiceName {
        ServiceName::new(name.to_string())
    }

    #[test]
    fn issue_then_lookup() -> color_eyre::Result<()> {
        let store = TokenStore::new();
        let avatar = service("avatar");

        let issued = store.issue(&avatar)?;
        assert_eq!(issued.get(SRV).as_deref(), Some("avatar"));
        assert_eq!(store.len(), 1);

        let held = store.token_for(&avatar).unwrap();
        assert!(Arc::ptr_eq(&issued, &held));
        Ok(())
    }

    #[test]
    fn duplicate_issuance_is_a_hard_failure() {
        let store = TokenStore::new();
        let avatar = service("avatar");

        store.issue(&avatar).unwrap();
        let err = store.issue(&avatar).unwrap_err();
        assert_eq!(err.service().as_str(), "avatar");
        assert_eq!(
            err.to_string(),
            "a token has already been issued for service 'avatar'"
        );
    }

    #[test]
    fn remove_allows_reissue() {
        let store = TokenStore::new();
        let avatar = service("avatar");

        let first = store.issue(&avatar).unwrap();
        let removed = store.remove(&avatar).unwrap();
        assert!(Arc::ptr_eq(&first, &removed));
        assert!(store.is_empty());

        let second = store.issue(&avatar).unwrap();
        assert!(!first.matches(&second));
    }

    #[test]
    fn missing_services_yield_nothing() {
        let store = TokenStore::new();
        assert!(store.token_for(&service("ghost")).is_none());
        assert!(store.remove(&service("ghost")).is_none());
    }
}
