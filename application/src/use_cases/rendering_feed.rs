//! Rendering feed use case
//!
//! Produces display-ready markers for a map view. Style, type display and
//! available actions are derived from the latest stored snapshot on every
//! call; nothing here is persisted.

use crate::catalog_cache::CatalogCache;
use crate::config::WorkflowParams;
use crate::ports::problem_store::ProblemStore;
use crate::use_cases::shared::bounded_store_call;
use crate::use_cases::workflow::WorkflowError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use zeladoria_domain::{
    ActionKind, ConsensusEngine, Location, MarkerStyle, Problem, ProblemId, ProblemStatus, Role,
    TypeDisplay, VALIDATION_QUORUM, allowed_actions,
};

/// Flat, serializable view of a problem snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemSummary {
    pub id: ProblemId,
    pub type_key: String,
    pub description: String,
    pub location: Location,
    pub status: ProblemStatus,
    pub confirmation_count: u32,
    pub validation_count: u32,
    pub validation_quorum: u32,
    pub official_note: Option<String>,
    pub reported_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<&Problem> for ProblemSummary {
    fn from(problem: &Problem) -> Self {
        Self {
            id: problem.id(),
            type_key: problem.type_key().as_str().to_string(),
            description: problem.description().to_string(),
            location: problem.location(),
            status: problem.status(),
            confirmation_count: problem.confirmation_count(),
            validation_count: problem.validation_count(),
            validation_quorum: VALIDATION_QUORUM,
            official_note: problem.official_note().map(str::to_string),
            reported_by: problem.reported_by().as_str().to_string(),
            created_at: problem.created_at(),
            updated_at: problem.updated_at(),
            resolved_at: problem.resolved_at(),
        }
    }
}

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    #[serde(flatten)]
    pub problem: ProblemSummary,
    pub style: MarkerStyle,
    pub display: TypeDisplay,
    /// Actions the viewer's role may take on this problem right now.
    pub actions: Vec<ActionKind>,
}

/// Actions that are both permitted for `role` and legal in the problem's state.
pub fn available_actions(
    engine: &ConsensusEngine,
    problem: &Problem,
    role: Role,
) -> Vec<ActionKind> {
    let legal = engine.legal_actions(problem);
    allowed_actions(role).intersection(&legal).copied().collect()
}

pub struct RenderingFeedUseCase {
    store: Arc<dyn ProblemStore>,
    catalog: Arc<CatalogCache>,
    engine: ConsensusEngine,
    params: WorkflowParams,
}

impl RenderingFeedUseCase {
    pub fn new(store: Arc<dyn ProblemStore>, catalog: Arc<CatalogCache>) -> Self {
        Self {
            store,
            catalog,
            engine: ConsensusEngine,
            params: WorkflowParams::default(),
        }
    }

    pub fn with_params(mut self, params: WorkflowParams) -> Self {
        self.params = params;
        self
    }

    /// Markers for every problem, ordered by id.
    pub async fn markers(&self, viewer: Role) -> Result<Vec<MarkerView>, WorkflowError> {
        let store = &self.store;
        let problems = bounded_store_call(&self.params, "list", move || store.list()).await?;
        debug!("Rendering {} markers for {}", problems.len(), viewer);
        Ok(join_all(problems.iter().map(|p| self.view(p, viewer))).await)
    }

    pub async fn marker(&self, id: ProblemId, viewer: Role) -> Result<MarkerView, WorkflowError> {
        let store = &self.store;
        let problem = bounded_store_call(&self.params, "get", move || store.get(id))
            .await?
            .ok_or(WorkflowError::NotFound(id))?;
        Ok(self.view(&problem, viewer).await)
    }

    pub async fn view(&self, problem: &Problem, viewer: Role) -> MarkerView {
        MarkerView {
            problem: ProblemSummary::from(problem),
            style: MarkerStyle::for_problem(problem),
            display: self.catalog.lookup(problem.type_key()).await,
            actions: available_actions(&self.engine, problem, viewer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::type_catalog::{CatalogError, TypeCatalog};
    use crate::use_cases::workflow::WorkflowCoordinator;
    use crate::use_cases::workflow::test_support::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use zeladoria_domain::{CatalogVersion, ColorToken, NewProblem, ProblemType, TypeKey};

    struct StaticCatalog(Vec<ProblemType>);

    #[async_trait]
    impl TypeCatalog for StaticCatalog {
        async fn version(&self) -> Result<CatalogVersion, CatalogError> {
            Ok(1)
        }

        async fn entries(&self) -> Result<Vec<ProblemType>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    fn setup() -> (WorkflowCoordinator, RenderingFeedUseCase) {
        let store = Arc::new(MemoryStore::default());
        let catalog = StaticCatalog(vec![ProblemType::new(
            TypeKey::new("buraco").unwrap(),
            "Buraco na via",
            "Vias",
            "🕳️",
        )]);
        let cache = Arc::new(CatalogCache::new(
            Arc::new(catalog),
            Duration::from_secs(300),
        ));
        let wf = WorkflowCoordinator::new(store.clone(), Arc::new(FixedClock::epoch()));
        (wf, RenderingFeedUseCase::new(store, cache))
    }

    #[tokio::test]
    async fn test_marker_for_new_problem() {
        let (wf, feed) = setup();
        let id = wf.create(&citizen("maria"), pothole()).await.unwrap().id();

        let view = feed.marker(id, Role::Citizen).await.unwrap();
        assert_eq!(view.style.size, 35);
        assert_eq!(view.style.color, ColorToken::Alert);
        assert_eq!(view.display.title, "Buraco na via");
        assert_eq!(view.actions, vec![ActionKind::Confirm]);
        assert_eq!(view.problem.confirmation_count, 1);
    }

    #[tokio::test]
    async fn test_actions_per_role() {
        let (wf, feed) = setup();
        let id = wf.create(&citizen("maria"), pothole()).await.unwrap().id();
        wf.mark_in_review(&authority(), id).await.unwrap();

        let authority_view = feed.marker(id, Role::Authority).await.unwrap();
        assert_eq!(
            authority_view.actions,
            vec![ActionKind::AttachNote, ActionKind::MarkResolved]
        );
        assert_eq!(authority_view.style.color, ColorToken::Warning);

        let citizen_view = feed.marker(id, Role::Citizen).await.unwrap();
        assert!(citizen_view.actions.is_empty());

        let admin_view = feed.marker(id, Role::Admin).await.unwrap();
        assert_eq!(admin_view.actions, vec![ActionKind::Delete]);
    }

    #[tokio::test]
    async fn test_confirmed_resolution_offers_no_status_actions() {
        let (wf, feed) = setup();
        let id = wf.create(&citizen("maria"), pothole()).await.unwrap().id();
        wf.mark_in_review(&authority(), id).await.unwrap();
        wf.mark_resolved(&authority(), id).await.unwrap();

        let open_for_votes = feed.marker(id, Role::Citizen).await.unwrap();
        assert_eq!(open_for_votes.actions, vec![ActionKind::Validate]);
        let contestable = feed.marker(id, Role::Authority).await.unwrap();
        assert_eq!(contestable.actions, vec![ActionKind::MarkInReview]);

        for name in ["ana", "bia", "caio"] {
            wf.validate(&citizen(name), id).await.unwrap();
        }
        assert!(feed.marker(id, Role::Citizen).await.unwrap().actions.is_empty());
        assert!(feed.marker(id, Role::Authority).await.unwrap().actions.is_empty());
        assert_eq!(
            feed.marker(id, Role::Admin).await.unwrap().style.color,
            ColorToken::Success
        );
    }

    #[tokio::test]
    async fn test_unknown_type_renders_generic() {
        let (wf, feed) = setup();
        let report = NewProblem::new("arvore_caida", "Árvore na calçada", -23.56, -46.64).unwrap();
        let id = wf.create(&citizen("maria"), report).await.unwrap().id();

        let view = feed.marker(id, Role::Citizen).await.unwrap();
        assert_eq!(view.display.icon, "📍");
        assert_eq!(view.display.title, "arvore_caida");
    }

    #[tokio::test]
    async fn test_markers_grow_with_confirmations() {
        let (wf, feed) = setup();
        let first = wf.create(&citizen("maria"), pothole()).await.unwrap().id();
        wf.create(&citizen("joao"), pothole()).await.unwrap();
        for i in 0..3 {
            wf.confirm(&citizen(&format!("vizinho{}", i)), first)
                .await
                .unwrap();
        }

        let markers = feed.markers(Role::Citizen).await.unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].style.size, 47);
        assert_eq!(markers[1].style.size, 35);
    }

    #[tokio::test]
    async fn test_missing_marker() {
        let (_wf, feed) = setup();
        let err = feed.marker(ProblemId::new(5), Role::Citizen).await.unwrap_err();
        assert_eq!(err, WorkflowError::NotFound(ProblemId::new(5)));
    }

    #[tokio::test]
    async fn test_marker_serializes_flat() {
        let (wf, feed) = setup();
        let id = wf.create(&citizen("maria"), pothole()).await.unwrap().id();
        let view = feed.marker(id, Role::Citizen).await.unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "open");
        assert_eq!(json["style"]["color"], "alert");
        assert_eq!(json["actions"][0], "confirm");
    }
}
