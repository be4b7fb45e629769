//! Workflow coordinator
//!
//! Every externally triggered action runs through [`WorkflowCoordinator`]:
//!
//! 1. Authorize the caller's role against the action ([`AccessPolicy`])
//! 2. Take the per-problem lock (bounded by `lock_timeout`)
//! 3. Read the current snapshot from the store
//! 4. Ask the [`ConsensusEngine`] for the next state
//! 5. Check caller cancellation, then commit the snapshot in one `put`
//! 6. Emit an audit event
//!
//! Rejected actions and failed commits leave the stored problem untouched.

mod locks;
mod types;

pub use types::{ErrorCategory, WorkflowError};

use crate::config::WorkflowParams;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::clock::Clock;
use crate::ports::problem_store::{ProblemStore, StoreError};
use crate::use_cases::shared::{bounded_store_call, check_cancelled};
use locks::ProblemLocks;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeladoria_domain::{
    AccessPolicy, ActionKind, ActorId, Caller, ConsensusEngine, Effect, NewProblem, Problem,
    ProblemId, Rejection, Transition,
};

/// Serializes and commits every action on a problem.
pub struct WorkflowCoordinator {
    store: Arc<dyn ProblemStore>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLogger>,
    policy: AccessPolicy,
    engine: ConsensusEngine,
    params: WorkflowParams,
    locks: ProblemLocks,
}

impl WorkflowCoordinator {
    pub fn new(store: Arc<dyn ProblemStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            audit: Arc::new(NoAuditLogger),
            policy: AccessPolicy,
            engine: ConsensusEngine,
            params: WorkflowParams::default(),
            locks: ProblemLocks::default(),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_params(mut self, params: WorkflowParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    // ==================== Creation / Deletion ====================

    /// Report a new problem. The reporter's own confirmation is counted.
    pub async fn create(
        &self,
        caller: &Caller,
        report: NewProblem,
    ) -> Result<Problem, WorkflowError> {
        self.create_with_cancel(caller, report, None).await
    }

    pub async fn create_with_cancel(
        &self,
        caller: &Caller,
        report: NewProblem,
        cancel: Option<&CancellationToken>,
    ) -> Result<Problem, WorkflowError> {
        self.authorize(caller, ActionKind::Create, None)?;

        let store = &self.store;
        let id =
            bounded_store_call(&self.params, "allocate_id", move || store.allocate_id()).await?;
        let problem = Problem::report(id, report, caller.actor.clone(), self.clock.now());

        check_cancelled(cancel)?;
        self.commit(&problem).await?;

        info!(
            "Problem {} reported by {} ({})",
            id,
            caller.actor,
            problem.type_key()
        );
        self.audit.log(AuditEvent::new(
            "problem_created",
            json!({
                "problem_id": id.value(),
                "actor": caller.actor.as_str(),
                "role": caller.role.as_str(),
                "type_key": problem.type_key().as_str(),
                "lat": problem.location().lat,
                "lng": problem.location().lng,
            }),
        ));
        Ok(problem)
    }

    /// Remove a problem regardless of status. Deleting a missing id is a no-op.
    ///
    /// Returns whether the problem existed.
    pub async fn delete(&self, caller: &Caller, id: ProblemId) -> Result<bool, WorkflowError> {
        self.authorize(caller, ActionKind::Delete, Some(id))?;

        let guard = self.lock(id).await?;
        let store = &self.store;
        let existed = bounded_store_call(&self.params, "delete", move || store.delete(id)).await?;
        drop(guard);
        self.locks.forget(id);

        if existed {
            info!("Problem {} deleted by {}", id, caller.actor);
        } else {
            debug!("Delete of missing problem {} by {}", id, caller.actor);
        }
        self.audit.log(AuditEvent::new(
            "problem_deleted",
            json!({
                "problem_id": id.value(),
                "actor": caller.actor.as_str(),
                "existed": existed,
            }),
        ));
        Ok(existed)
    }

    // ==================== Reads ====================

    pub async fn get(&self, id: ProblemId) -> Result<Problem, WorkflowError> {
        let store = &self.store;
        bounded_store_call(&self.params, "get", move || store.get(id))
            .await?
            .ok_or(WorkflowError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Problem>, WorkflowError> {
        let store = &self.store;
        Ok(bounded_store_call(&self.params, "list", move || store.list()).await?)
    }

    // ==================== Transitions ====================

    pub async fn confirm(&self, caller: &Caller, id: ProblemId) -> Result<Problem, WorkflowError> {
        self.submit(caller, id, Transition::Confirm).await
    }

    pub async fn validate(&self, caller: &Caller, id: ProblemId) -> Result<Problem, WorkflowError> {
        self.submit(caller, id, Transition::Validate).await
    }

    /// Triage an open problem, or contest a resolution that has not reached quorum.
    pub async fn mark_in_review(
        &self,
        caller: &Caller,
        id: ProblemId,
    ) -> Result<Problem, WorkflowError> {
        self.submit(caller, id, Transition::MarkInReview).await
    }

    pub async fn attach_note(
        &self,
        caller: &Caller,
        id: ProblemId,
        text: impl Into<String>,
    ) -> Result<Problem, WorkflowError> {
        self.submit(caller, id, Transition::attach_note(text)).await
    }

    pub async fn mark_resolved(
        &self,
        caller: &Caller,
        id: ProblemId,
    ) -> Result<Problem, WorkflowError> {
        self.submit(caller, id, Transition::MarkResolved).await
    }

    pub async fn submit(
        &self,
        caller: &Caller,
        id: ProblemId,
        transition: Transition,
    ) -> Result<Problem, WorkflowError> {
        self.submit_with_cancel(caller, id, transition, None).await
    }

    /// Submit a transition; if `cancel` fires before the commit, nothing is written.
    pub async fn submit_with_cancel(
        &self,
        caller: &Caller,
        id: ProblemId,
        transition: Transition,
        cancel: Option<&CancellationToken>,
    ) -> Result<Problem, WorkflowError> {
        self.authorize(caller, transition.kind(), Some(id))?;
        self.transition_locked(&caller.actor, id, transition, cancel)
            .await
    }

    /// Apply a transition on behalf of an automated policy.
    ///
    /// Skips role authorization; the consensus engine still decides.
    /// `applies` is evaluated on the snapshot read under the problem lock;
    /// when it no longer holds nothing is written and `Ok(None)` is returned.
    pub(crate) async fn apply_policy<P>(
        &self,
        policy: &str,
        id: ProblemId,
        transition: Transition,
        applies: P,
    ) -> Result<Option<Problem>, WorkflowError>
    where
        P: FnOnce(&Problem) -> bool + Send,
    {
        let actor = ActorId::system(policy);
        let _guard = self.lock(id).await?;

        let current = self.get(id).await?;
        if !applies(&current) {
            debug!("{} no longer applies to {}", actor, id);
            return Ok(None);
        }
        self.apply_and_commit(&actor, &current, transition, None)
            .await
            .map(Some)
    }

    // ==================== Internals ====================

    fn authorize(
        &self,
        caller: &Caller,
        action: ActionKind,
        id: Option<ProblemId>,
    ) -> Result<(), WorkflowError> {
        self.policy.check(caller, action).map_err(|denied| {
            warn!("{} denied: {}", caller.actor, denied);
            self.audit.log(AuditEvent::new(
                "action_rejected",
                json!({
                    "problem_id": id.map(|id| id.value()),
                    "actor": caller.actor.as_str(),
                    "role": caller.role.as_str(),
                    "action": action.as_str(),
                    "reason": "unauthorized",
                }),
            ));
            WorkflowError::from(denied)
        })
    }

    async fn lock(&self, id: ProblemId) -> Result<OwnedMutexGuard<()>, WorkflowError> {
        self.locks
            .acquire(id, self.params.lock_timeout)
            .await
            .ok_or_else(|| {
                warn!(
                    "Problem {} still busy after {:?}",
                    id, self.params.lock_timeout
                );
                WorkflowError::StoreUnavailable(StoreError::Unavailable(format!(
                    "problem {} is busy",
                    id
                )))
            })
    }

    async fn commit(&self, problem: &Problem) -> Result<(), WorkflowError> {
        let store = &self.store;
        bounded_store_call(&self.params, "put", move || store.put(problem)).await?;
        Ok(())
    }

    async fn transition_locked(
        &self,
        actor: &ActorId,
        id: ProblemId,
        transition: Transition,
        cancel: Option<&CancellationToken>,
    ) -> Result<Problem, WorkflowError> {
        let _guard = self.lock(id).await?;

        let current = self.get(id).await?;
        self.apply_and_commit(actor, &current, transition, cancel)
            .await
    }

    /// Caller must hold the problem lock.
    async fn apply_and_commit(
        &self,
        actor: &ActorId,
        current: &Problem,
        transition: Transition,
        cancel: Option<&CancellationToken>,
    ) -> Result<Problem, WorkflowError> {
        let applied = match self
            .engine
            .apply(current, &transition, actor, self.clock.now())
        {
            Ok(applied) => applied,
            Err(rejection) => {
                self.log_rejection(actor, current, &transition, &rejection);
                return Err(rejection.into());
            }
        };

        check_cancelled(cancel)?;
        self.commit(&applied.problem).await?;

        self.log_effect(actor, &applied.problem, applied.effect);
        Ok(applied.problem)
    }

    fn log_rejection(
        &self,
        actor: &ActorId,
        problem: &Problem,
        transition: &Transition,
        rejection: &Rejection,
    ) {
        debug!(
            "{} on {} by {} rejected: {}",
            transition.kind(),
            problem.id(),
            actor,
            rejection
        );
        self.audit.log(AuditEvent::new(
            "action_rejected",
            json!({
                "problem_id": problem.id().value(),
                "actor": actor.as_str(),
                "action": transition.kind().as_str(),
                "status": problem.status().as_str(),
                "reason": rejection.to_string(),
            }),
        ));
    }

    fn log_effect(&self, actor: &ActorId, problem: &Problem, effect: Effect) {
        info!(
            "Problem {} now {} ({} by {})",
            problem.id(),
            problem.status(),
            effect.event_type(),
            actor
        );
        let mut payload = json!({
            "problem_id": problem.id().value(),
            "actor": actor.as_str(),
            "status": problem.status().as_str(),
            "confirmations": problem.confirmation_count(),
            "validations": problem.validation_count(),
        });
        if let (Some(map), Ok(serde_json::Value::Object(extra))) =
            (payload.as_object_mut(), serde_json::to_value(effect))
        {
            map.extend(extra);
        }
        self.audit.log(AuditEvent::new(effect.event_type(), payload));
    }
}
