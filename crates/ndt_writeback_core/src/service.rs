//! Write-back orchestration.
//!
//! Every write follows the same sequence:
//!
//! 1. resolve the caller's identity from the forwarded headers,
//! 2. check required fields and validate any declared or override type,
//! 3. take a [`WriteContext`] snapshot, resolve the label and mint URIs,
//! 4. build the statement,
//! 5. dispatch it.
//!
//! Steps 1 to 4 have no side effects on the store. A failure anywhere before
//! step 5 leaves nothing written; step 5 is the point of no return.

use std::sync::Arc;

use chrono::Utc;

use crate::builders::{
    assessment_statement, flag_invalidation_statement, flag_statement, person_statement,
    state_statement, Assessment, EntityState, Flag, FlagKind, Person,
};
use crate::error::{Result, WriteBackError};
use crate::ontology::{Hierarchy, OntologyClass};
use crate::ports::{Actor, ForwardedHeaders, IdentityProvider, UpdateDispatcher};
use crate::prefixes::PrefixRegistry;
use crate::requests::{
    FlagTarget, InvalidateFlag, NewAssessment, NewBuildingState, NewPerson, WriteRequest,
};
use crate::security_label::SecurityLabel;
use crate::settings::{RuntimeSettings, WriteContext};
use crate::statement::{Iri, Statement};
use crate::subtypes::SubtypeResolver;

pub struct WriteBackService {
    identity: Arc<dyn IdentityProvider>,
    subtypes: Arc<SubtypeResolver>,
    dispatcher: Arc<dyn UpdateDispatcher>,
    settings: Arc<RuntimeSettings>,
    prefixes: Arc<PrefixRegistry>,
}

/// A built statement waiting for dispatch, with the URI handed back to the caller.
struct Prepared {
    uri: Iri,
    statement: Statement,
    label: SecurityLabel,
}

impl WriteBackService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        subtypes: Arc<SubtypeResolver>,
        dispatcher: Arc<dyn UpdateDispatcher>,
        settings: Arc<RuntimeSettings>,
        prefixes: Arc<PrefixRegistry>,
    ) -> Self {
        Self {
            identity,
            subtypes,
            dispatcher,
            settings,
            prefixes,
        }
    }

    pub fn settings(&self) -> &Arc<RuntimeSettings> {
        &self.settings
    }

    pub fn prefixes(&self) -> &Arc<PrefixRegistry> {
        &self.prefixes
    }

    /// Refresh the hierarchy from the store and list its classes.
    pub async fn classes(
        &self,
        hierarchy: &Hierarchy,
        headers: &ForwardedHeaders,
    ) -> Result<Vec<OntologyClass>> {
        Ok(self.subtypes.resolve(hierarchy, headers).await?.list())
    }

    /// Run one write end to end and return the URI of the primary entity.
    pub async fn write(&self, request: WriteRequest, headers: &ForwardedHeaders) -> Result<Iri> {
        let kind = request.kind();
        let actor = self.identity.resolve(headers).await.inspect_err(|e| {
            tracing::warn!(kind, error = %e, "identity resolution failed");
        })?;

        let prepared = match request {
            WriteRequest::Person(req) => self.prepare_person(req).await?,
            WriteRequest::BuildingState(req) => self.prepare_state(req, headers).await?,
            WriteRequest::Assessment(req) => self.prepare_assessment(req, &actor, headers).await?,
            WriteRequest::Flag(flag_kind, req) => self.prepare_flag(flag_kind, req, &actor).await?,
            WriteRequest::InvalidateFlag(req) => {
                self.prepare_invalidation(req, &actor, headers).await?
            }
        };

        self.dispatcher
            .dispatch(&prepared.statement, &prepared.label, headers)
            .await
            .inspect_err(|e| tracing::error!(kind, error = %e, "dispatch failed"))?;

        tracing::info!(
            kind,
            uri = %prepared.uri,
            triples = prepared.statement.len(),
            mode = ?self.dispatcher.mode(),
            user = %actor.user_id,
            "write dispatched"
        );
        Ok(prepared.uri)
    }

    // ── Per-variant preparation ───────────────────────────────

    async fn prepare_person(&self, req: NewPerson) -> Result<Prepared> {
        let given_name = required(req.given_name, "givenName")?;
        let ctx = self.settings.snapshot().await;
        let uri = self.uri_or_mint(&ctx, req.uri.as_deref())?;
        let person = Person {
            uri: uri.clone(),
            given_name,
            surname: req.surname.filter(|s| !s.trim().is_empty()),
        };
        Ok(Prepared {
            statement: person_statement(&person),
            label: ctx.label(req.security_label),
            uri,
        })
    }

    async fn prepare_state(
        &self,
        req: NewBuildingState,
        headers: &ForwardedHeaders,
    ) -> Result<Prepared> {
        let state_of = self.caller_iri(required(req.state_of, "stateOf")?)?;
        let declared = required(req.state_type, "stateType")?;
        let class = self
            .subtypes
            .validate_type(&Hierarchy::building_state(), &declared, headers)
            .await?;

        let ctx = self.settings.snapshot().await;
        let uri = self.uri_or_mint(&ctx, req.uri.as_deref())?;
        let state = EntityState {
            uri: uri.clone(),
            state_of,
            state_type: Iri::parse(class.uri)?,
            start: req.start_date_time,
            end: req.end_date_time,
        };
        Ok(Prepared {
            statement: state_statement(&state),
            label: ctx.label(req.security_label),
            uri,
        })
    }

    async fn prepare_assessment(
        &self,
        req: NewAssessment,
        actor: &Actor,
        headers: &ForwardedHeaders,
    ) -> Result<Prepared> {
        let assessed_item = self.caller_iri(required(req.assessed_item, "assessedItem")?)?;
        let declared = required(req.assessment_type, "assessmentType")?;
        let class = self
            .subtypes
            .validate_type(&Hierarchy::assessment(), &declared, headers)
            .await?;

        let ctx = self.settings.snapshot().await;
        let assessor = actor_person(&ctx, actor)?;
        let uri = self.uri_or_mint(&ctx, req.uri.as_deref())?;
        let assessment = Assessment {
            uri: uri.clone(),
            assessed_item,
            types: vec![Iri::parse(class.uri)?],
            at: Utc::now(),
        };
        Ok(Prepared {
            statement: assessment_statement(&assessment, &assessor),
            label: ctx.label(req.security_label),
            uri,
        })
    }

    /// The target URI is required; the flag's own URI is always minted.
    async fn prepare_flag(
        &self,
        kind: FlagKind,
        req: FlagTarget,
        actor: &Actor,
    ) -> Result<Prepared> {
        let interested_in = self.caller_iri(required(req.uri, "uri")?)?;
        let ctx = self.settings.snapshot().await;
        let flagger = actor_person(&ctx, actor)?;
        let flag = Flag {
            uri: ctx.mint()?,
            interested_in,
            kind,
            at: Utc::now(),
        };
        Ok(Prepared {
            statement: flag_statement(&flag, &flagger),
            label: ctx.label(req.security_label),
            uri: flag.uri,
        })
    }

    async fn prepare_invalidation(
        &self,
        req: InvalidateFlag,
        actor: &Actor,
        headers: &ForwardedHeaders,
    ) -> Result<Prepared> {
        let flag = self.caller_iri(required(req.flag_uri, "flagUri")?)?;
        let hierarchy = Hierarchy::negative_assessment();
        let invalidation_type = match req.assessment_type_override.as_deref() {
            Some(t) if !t.trim().is_empty() => {
                self.subtypes
                    .validate_override(&hierarchy, t.trim(), headers)
                    .await?
            }
            _ => hierarchy.base.clone(),
        };

        let ctx = self.settings.snapshot().await;
        let assessor = actor_person(&ctx, actor)?;
        let uri = ctx.mint()?;
        Ok(Prepared {
            statement: flag_invalidation_statement(
                &uri,
                &flag,
                &invalidation_type,
                &assessor,
                Utc::now(),
            ),
            label: ctx.label(req.security_label),
            uri,
        })
    }

    // ── Helpers ───────────────────────────────────────────────

    /// Caller URIs may use registered prefixes.
    fn caller_iri(&self, supplied: String) -> Result<Iri> {
        Iri::parse(self.prefixes.lengthen(supplied.trim()))
    }

    fn uri_or_mint(&self, ctx: &WriteContext, supplied: Option<&str>) -> Result<Iri> {
        match supplied.map(str::trim) {
            Some(uri) if !uri.is_empty() => self.caller_iri(uri.to_string()),
            _ => ctx.mint(),
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(WriteBackError::missing(field)),
    }
}

fn actor_person(ctx: &WriteContext, actor: &Actor) -> Result<Person> {
    Person::from_display_name(ctx.person_uri(&actor.user_id)?, &actor.username)
}
