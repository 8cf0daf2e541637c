//! HTTP API for the rule builder.
//!
//! This module exposes the rule editing model as a small JSON API using
//! the [`axum`](https://crates.io/crates/axum) framework.  Rule edits
//! are stateless: the client posts its current rule together with one
//! edit and gets the next rule back.  The template catalog is the only
//! state held by the server and is shared across requests.

use crate::catalog::{ActionType, Fact, FactValueKind, Operator, RuleKind};
use crate::config::ServerConfig;
use crate::editor::{self, duplicate_id_errors, validation_errors, ValidationError};
use crate::labels::{parameter_label, Label};
use crate::models::{Rule, Template};
use crate::render::describe;
use crate::session::{EditError, RuleEdit, RuleEditor};
use crate::sink::{LoggingSink, RuleSink};
use crate::templates::{load_templates_from_dir, TemplateCatalog, TemplateError};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Application state shared across requests.
pub struct AppState {
    pub templates: RwLock<TemplateCatalog>,
    pub sink: Arc<dyn RuleSink>,
}

impl AppState {
    pub fn new(templates: TemplateCatalog, sink: Arc<dyn RuleSink>) -> Self {
        Self {
            templates: RwLock::new(templates),
            sink,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    InvalidRule(ValidationError),
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error(transparent)]
    Save(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Edit(_) | ApiError::Template(_) | ApiError::InvalidRule(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Save(err) if err.downcast_ref::<ValidationError>().is_some() => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Save(err) => {
                error!(%err, "rule sink failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub kind: RuleKind,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub kind: RuleKind,
    pub rule: Rule,
    pub edit: RuleEdit,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub rule: Rule,
    pub name: String,
    pub kind: RuleKind,
}

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: Option<RuleKind>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FactEntry {
    path: Fact,
    label: &'static str,
    value_kind: FactValueKind,
}

#[derive(Debug, Serialize)]
struct OperatorEntry {
    value: Operator,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct ParameterEntry {
    key: &'static str,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct ActionEntry {
    #[serde(rename = "type")]
    action_type: ActionType,
    label: &'static str,
    kind: RuleKind,
    parameters: Vec<ParameterEntry>,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    facts: Vec<FactEntry>,
    operators: Vec<OperatorEntry>,
    actions: Vec<ActionEntry>,
}

/// Build the API router and seed the template catalog from the given
/// directory.  Returns the router and a handle to the state.
pub async fn build_router(template_dir: PathBuf) -> Result<(Router, Arc<AppState>)> {
    let seeds = load_templates_from_dir(&template_dir)?;
    let state = Arc::new(AppState::new(
        TemplateCatalog::from_templates(seeds),
        Arc::new(LoggingSink),
    ));
    Ok((router(state.clone()), state))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/catalog", get(catalog_handler))
        .route("/api/rules/draft", post(draft_handler))
        .route("/api/rules/edit", post(edit_handler))
        .route("/api/rules/validate", post(validate_handler))
        .route("/api/rules/describe", post(describe_handler))
        .route("/api/rules/save", post(save_handler))
        .route(
            "/api/templates",
            get(list_templates_handler).post(save_template_handler),
        )
        .route("/api/templates/:id", delete(delete_template_handler))
        .route("/api/templates/:id/rule", get(template_rule_handler))
        .with_state(state)
}

/// Handler for GET /api/catalog
async fn catalog_handler(Query(query): Query<KindQuery>) -> impl IntoResponse {
    let facts = Fact::ALL
        .iter()
        .map(|&fact| FactEntry {
            path: fact,
            label: fact.label(),
            value_kind: fact.value_kind(),
        })
        .collect();
    let operators = Operator::ALL
        .iter()
        .map(|&op| OperatorEntry {
            value: op,
            label: op.label(),
        })
        .collect();
    let action_types = match query.kind {
        Some(kind) => kind.action_types(),
        None => ActionType::ALL,
    };
    let actions = action_types
        .iter()
        .map(|&action_type| ActionEntry {
            action_type,
            label: action_type.label(),
            kind: action_type.kind(),
            parameters: action_type
                .parameter_keys()
                .iter()
                .map(|&key| ParameterEntry {
                    key,
                    label: parameter_label(key),
                })
                .collect(),
        })
        .collect();
    Json(CatalogResponse {
        facts,
        operators,
        actions,
    })
}

/// Handler for POST /api/rules/draft
async fn draft_handler(Json(request): Json<DraftRequest>) -> Json<Rule> {
    Json(editor::create_draft(request.kind))
}

/// Handler for POST /api/rules/edit
async fn edit_handler(Json(request): Json<EditRequest>) -> Result<Json<Rule>, ApiError> {
    if let Some(err) = duplicate_id_errors(&request.rule).into_iter().next() {
        return Err(ApiError::InvalidRule(err));
    }
    let mut session = RuleEditor::resume(request.kind, request.rule);
    session.apply(request.edit)?;
    Ok(Json(session.into_rule()))
}

/// Handler for POST /api/rules/validate
async fn validate_handler(Json(rule): Json<Rule>) -> Json<ValidationResponse> {
    let errors: Vec<String> = validation_errors(&rule).iter().map(ToString::to_string).collect();
    Json(ValidationResponse {
        valid: errors.is_empty(),
        errors,
    })
}

/// Handler for POST /api/rules/describe
async fn describe_handler(Json(rule): Json<Rule>) -> impl IntoResponse {
    Json(json!({"text": describe(&rule)}))
}

/// Handler for POST /api/rules/save
async fn save_handler(
    State(app_state): State<Arc<AppState>>,
    Json(rule): Json<Rule>,
) -> Result<Json<Rule>, ApiError> {
    let saved = app_state.sink.save(rule).map_err(ApiError::Save)?;
    Ok(Json(saved))
}

/// Handler for GET /api/templates
async fn list_templates_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<KindQuery>,
) -> Json<Vec<Template>> {
    let catalog = app_state.templates.read().await;
    let templates = match query.kind {
        Some(kind) => catalog.for_kind(kind).cloned().collect(),
        None => RuleKind::ALL
            .iter()
            .flat_map(|&kind| catalog.for_kind(kind).cloned().collect::<Vec<_>>())
            .collect(),
    };
    Json(templates)
}

/// Handler for POST /api/templates
async fn save_template_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut catalog = app_state.templates.write().await;
    let template = catalog.save_as_template(&request.rule, &request.name, request.kind)?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Handler for GET /api/templates/:id/rule
async fn template_rule_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Rule>, ApiError> {
    let catalog = app_state.templates.read().await;
    let template = catalog.get(&id).ok_or(ApiError::TemplateNotFound(id.clone()))?;
    Ok(Json(editor::load_from_template(template)))
}

/// Handler for DELETE /api/templates/:id
async fn delete_template_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut catalog = app_state.templates.write().await;
    match catalog.remove(&id) {
        Some(_) => {
            info!(template = %id, "deleted rule template");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::TemplateNotFound(id)),
    }
}

/// Launch the API server.  Seeds templates from the configured
/// directory, binds to the configured address and runs until the
/// server terminates.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let (router, _state) = build_router(config.template_dir.clone()).await?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "rule authoring server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<AppState>) {
        let state = Arc::new(AppState::new(TemplateCatalog::new(), Arc::new(LoggingSink)));
        (router(state.clone()), state)
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_draft_then_edit() {
        let (router, _) = test_router();
        let (status, draft) = send(&router, "POST", "/api/rules/draft", Some(json!({"kind": "tariff"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(draft["conditionGroups"][0]["logic"], "AND");
        assert_eq!(draft["action"], json!({"type": "", "parameters": {}}));

        let (status, rule) = send(
            &router,
            "POST",
            "/api/rules/edit",
            Some(json!({"kind": "tariff", "rule": draft, "edit": {"op": "set_action_type", "actionType": "create_ukt_bill"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, rule) = send(
            &router,
            "POST",
            "/api/rules/edit",
            Some(json!({"kind": "tariff", "rule": rule, "edit": {"op": "set_action_parameter", "key": "amount", "value": 5000000}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            rule["action"],
            json!({"type": "create_ukt_bill", "parameters": {"amount": 5000000}})
        );
    }

    #[tokio::test]
    async fn test_edit_rejects_foreign_action_type() {
        let (router, _) = test_router();
        let draft = serde_json::to_value(editor::create_draft(RuleKind::Dispensation)).unwrap();
        let (status, body) = send(
            &router,
            "POST",
            "/api/rules/edit",
            Some(json!({"kind": "dispensation", "rule": draft, "edit": {"op": "set_action_type", "actionType": "create_sks_bill"}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("create_sks_bill"));
    }

    #[tokio::test]
    async fn test_edit_rejects_duplicate_group_ids() {
        let (router, _) = test_router();
        let group = json!({"id": 1, "logic": "AND", "conditions": [{"id": 1, "fact": "", "operator": "", "value": ""}]});
        let rule = json!({"name": "UKT", "conditionGroups": [group, group], "action": {"type": "", "parameters": {}}});
        let (status, body) = send(
            &router,
            "POST",
            "/api/rules/edit",
            Some(json!({"kind": "tariff", "rule": rule, "edit": {"op": "remove_condition", "groupId": 1, "conditionId": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "condition group id 1 is used more than once");

        let (_, body) = send(&router, "POST", "/api/rules/validate", Some(rule)).await;
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn test_validate_and_save() {
        let (router, _) = test_router();
        let draft = serde_json::to_value(editor::create_draft(RuleKind::Tariff)).unwrap();
        let (status, body) = send(&router, "POST", "/api/rules/validate", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"], json!(["rule name is required"]));

        let (status, _) = send(&router, "POST", "/api/rules/save", Some(draft.clone())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let mut named = draft;
        named["name"] = json!("UKT 2025");
        let (status, body) = send(&router, "POST", "/api/rules/save", Some(named)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "UKT 2025");
    }

    #[tokio::test]
    async fn test_template_lifecycle() {
        let (router, state) = test_router();
        let rule = serde_json::to_value(editor::rename(&editor::create_draft(RuleKind::Tariff), "UKT")).unwrap();

        let (status, _) = send(
            &router,
            "POST",
            "/api/templates",
            Some(json!({"rule": rule, "name": "", "kind": "tariff"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.templates.read().await.is_empty());

        let (status, template) = send(
            &router,
            "POST",
            "/api/templates",
            Some(json!({"rule": rule, "name": "UKT template", "kind": "tariff"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = template["id"].as_str().unwrap().to_string();

        let (_, tariff) = send(&router, "GET", "/api/templates?kind=tariff", None).await;
        assert_eq!(tariff.as_array().unwrap().len(), 1);
        let (_, dispensation) = send(&router, "GET", "/api/templates?kind=dispensation", None).await;
        assert!(dispensation.as_array().unwrap().is_empty());

        let (status, loaded) = send(&router, "GET", &format!("/api/templates/{id}/rule"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded, rule);

        let (status, _) = send(&router, "DELETE", &format!("/api/templates/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&router, "DELETE", &format!("/api/templates/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_catalog_and_describe() {
        let (router, _) = test_router();
        let (status, catalog) = send(&router, "GET", "/api/catalog?kind=dispensation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog["facts"].as_array().unwrap().len(), 9);
        assert_eq!(catalog["actions"].as_array().unwrap().len(), 4);
        assert_eq!(catalog["actions"][0]["type"], "extend_due_date");
        assert_eq!(catalog["actions"][0]["parameters"][1]["key"], "extensionUnit");

        let draft = serde_json::to_value(editor::create_draft(RuleKind::Tariff)).unwrap();
        let (_, body) = send(&router, "POST", "/api/rules/describe", Some(draft)).await;
        assert_eq!(body["text"], "IF (? ?) THEN (no action)");
    }
}
