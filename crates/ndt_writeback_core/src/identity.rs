use async_trait::async_trait;

use crate::error::Result;
use crate::ports::{Actor, ForwardedHeaders, IdentityProvider};

/// Returns the same actor for every request. Used in development mode, where
/// there is no identity service to call.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    actor: Actor,
}

impl FixedIdentity {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn development() -> Self {
        Self::new(Actor {
            username: "Test User1".into(),
            user_id: "1234-5678-99ab-cdef".into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn resolve(&self, _headers: &ForwardedHeaders) -> Result<Actor> {
        Ok(self.actor.clone())
    }
}
