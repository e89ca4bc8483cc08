//! Process-wide write settings: the default security label and the URI stub.
//!
//! Both are read by every request and replaced only by admin calls. Each value
//! is an `Arc` swapped whole under a write lock. Last writer wins and readers
//! never observe a partial value. Requests take a [`WriteContext`] snapshot once
//! and use it throughout, so an admin change mid-request cannot mix old and new.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::security_label::SecurityLabel;
use crate::statement::Iri;

#[derive(Debug)]
pub struct RuntimeSettings {
    default_label: RwLock<Arc<SecurityLabel>>,
    uri_stub: RwLock<Arc<str>>,
}

impl RuntimeSettings {
    pub fn new(default_label: SecurityLabel, uri_stub: impl Into<String>) -> Self {
        Self {
            default_label: RwLock::new(Arc::new(default_label)),
            uri_stub: RwLock::new(Arc::from(uri_stub.into())),
        }
    }

    pub async fn default_label(&self) -> Arc<SecurityLabel> {
        Arc::clone(&*self.default_label.read().await)
    }

    pub async fn set_default_label(&self, label: SecurityLabel) {
        *self.default_label.write().await = Arc::new(label);
    }

    pub async fn uri_stub(&self) -> Arc<str> {
        Arc::clone(&*self.uri_stub.read().await)
    }

    /// The stub must itself be a valid IRI prefix; minted URIs append a UUID.
    pub async fn set_uri_stub(&self, stub: &str) -> Result<()> {
        Iri::parse(stub)?;
        *self.uri_stub.write().await = Arc::from(stub);
        Ok(())
    }

    pub async fn snapshot(&self) -> WriteContext {
        WriteContext {
            default_label: self.default_label().await,
            uri_stub: self.uri_stub().await,
        }
    }
}

/// Request-scoped view of the settings.
#[derive(Debug, Clone)]
pub struct WriteContext {
    pub default_label: Arc<SecurityLabel>,
    pub uri_stub: Arc<str>,
}

impl WriteContext {
    /// Fresh `stub + uuid` URI.
    pub fn mint(&self) -> Result<Iri> {
        Iri::parse(format!("{}{}", self.uri_stub, Uuid::new_v4()))
    }

    /// Stable URI for an actor: `stub + user_id`.
    pub fn person_uri(&self, user_id: &str) -> Result<Iri> {
        Iri::parse(format!("{}{}", self.uri_stub, user_id))
    }

    /// Caller label if given, else the process default. Never absent.
    pub fn label(&self, supplied: Option<SecurityLabel>) -> SecurityLabel {
        supplied.unwrap_or_else(|| (*self.default_label).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security_label::Classification;

    const STUB: &str = "http://nationaldigitaltwin.gov.uk/data#";

    #[tokio::test]
    async fn mint_appends_uuid_to_stub() {
        let ctx = RuntimeSettings::new(SecurityLabel::official(), STUB)
            .snapshot()
            .await;
        let a = ctx.mint().unwrap();
        let b = ctx.mint().unwrap();
        assert!(a.as_str().starts_with(STUB));
        assert!(Uuid::parse_str(&a.as_str()[STUB.len()..]).is_ok());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn label_falls_back_to_default() {
        let settings = RuntimeSettings::new(SecurityLabel::official(), STUB);
        settings
            .set_default_label(
                SecurityLabel::official().with_classification(Classification::Secret),
            )
            .await;
        let ctx = settings.snapshot().await;
        assert_eq!(ctx.label(None).classification, Classification::Secret);
        let own = SecurityLabel::official().permit_nationality("GBR");
        assert_eq!(ctx.label(Some(own.clone())), own);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_changes() {
        let settings = RuntimeSettings::new(SecurityLabel::official(), STUB);
        let before = settings.snapshot().await;
        settings.set_uri_stub("http://example.org/data/").await.unwrap();
        assert_eq!(&*before.uri_stub, STUB);
        assert_eq!(&*settings.uri_stub().await, "http://example.org/data/");
    }

    #[tokio::test]
    async fn invalid_stub_is_rejected() {
        let settings = RuntimeSettings::new(SecurityLabel::official(), STUB);
        assert!(settings.set_uri_stub("not a stub").await.is_err());
        assert_eq!(&*settings.uri_stub().await, STUB);
    }
}
