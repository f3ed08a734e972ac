//! Role resolution against the registry.
//!
//! A role is derived from two reads and never cached. If either read fails
//! the error is surfaced; the resolver never falls back to a guess.

use std::sync::Arc;

use certi_core::{Identity, Role};

use crate::error::LedgerError;
use crate::ledger::RegistryLedger;

/// Derives an identity's [`Role`] from the ledger.
#[derive(Clone)]
pub struct IdentityResolver {
    ledger: Arc<dyn RegistryLedger>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver").finish_non_exhaustive()
    }
}

impl IdentityResolver {
    /// Resolve roles against `ledger`.
    pub fn new(ledger: Arc<dyn RegistryLedger>) -> Self {
        Self { ledger }
    }

    /// Owner first, then issuer membership, else plain.
    pub async fn resolve_role(&self, identity: &Identity) -> Result<Role, LedgerError> {
        let owner = self.ledger.owner_of().await?;
        if &owner == identity {
            return Ok(Role::Owner);
        }
        let is_issuer = self.ledger.is_issuer(identity).await?;
        Ok(Role::classify(identity, &owner, is_issuer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RegistryCall;
    use crate::memory::InMemoryLedger;

    fn id(last: u8) -> Identity {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Identity::from_bytes(bytes)
    }

    #[tokio::test]
    async fn resolves_each_role() {
        let owner = id(1);
        let ledger = InMemoryLedger::genesis(owner.clone());
        let handle = ledger
            .submit(&owner, RegistryCall::RegisterIssuer { identity: id(2) })
            .await
            .unwrap();
        ledger.status(&handle).await.unwrap();

        let resolver = IdentityResolver::new(Arc::new(ledger));
        assert_eq!(resolver.resolve_role(&owner).await.unwrap(), Role::Owner);
        assert_eq!(resolver.resolve_role(&id(2)).await.unwrap(), Role::Issuer);
        assert_eq!(resolver.resolve_role(&id(3)).await.unwrap(), Role::Plain);
    }

    #[tokio::test]
    async fn owner_registered_as_issuer_is_still_owner() {
        let owner = id(1);
        let ledger = InMemoryLedger::genesis(owner.clone());
        let handle = ledger
            .submit(&owner, RegistryCall::RegisterIssuer { identity: owner.clone() })
            .await
            .unwrap();
        ledger.status(&handle).await.unwrap();

        let resolver = IdentityResolver::new(Arc::new(ledger));
        assert_eq!(resolver.resolve_role(&owner).await.unwrap(), Role::Owner);
    }

    #[tokio::test]
    async fn read_failure_is_surfaced_not_guessed() {
        let ledger = InMemoryLedger::genesis(id(1));
        ledger.set_online(false);
        let resolver = IdentityResolver::new(Arc::new(ledger));
        assert!(matches!(
            resolver.resolve_role(&id(1)).await,
            Err(LedgerError::Unavailable(_))
        ));
    }
}
