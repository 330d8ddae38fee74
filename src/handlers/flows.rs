// src/handlers/flows.rs

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::flow::{
        AddNodePayload, ConnectNodesPayload, CreateFlowPayload, FlowEdge, FlowListQuery, FlowNode,
        FlowRow, SendFlowRequest, SendFlowResponse, UpdateFlowPayload,
    },
};

// Id malformado é tratado como flow inexistente
fn parse_flow_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::FlowNotFound)
}

// =============================================================================
//  ÁREA 1: RASCUNHOS
// =============================================================================

// GET /api/flows
#[utoipa::path(
    get,
    path = "/api/flows",
    tag = "Flows",
    params(FlowListQuery),
    responses(
        (status = 200, description = "Rascunhos de Flow, mais recentes primeiro", body = Vec<FlowRow>)
    )
)]
pub async fn list_flows(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<FlowListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let flows = app_state.flow_service
        .list(&app_state.db_pool, query.search.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(flows)))
}

// POST /api/flows
#[utoipa::path(
    post,
    path = "/api/flows",
    tag = "Flows",
    request_body = CreateFlowPayload,
    responses(
        (status = 201, description = "Rascunho criado com mapa vazio", body = FlowRow),
        (status = 400, description = "Nome inválido")
    )
)]
pub async fn create_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<CreateFlowPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let flow = app_state.flow_service
        .create(&app_state.db_pool, &payload.name)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(flow)))
}

// GET /api/flows/{id}
#[utoipa::path(
    get,
    path = "/api/flows/{id}",
    tag = "Flows",
    params(("id" = Uuid, Path, description = "ID do flow")),
    responses(
        (status = 200, description = "Rascunho com o mapa normalizado", body = FlowRow),
        (status = 404, description = "Flow não encontrado")
    )
)]
pub async fn get_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let flow = app_state.flow_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(flow)))
}

// PATCH /api/flows/{id}
#[utoipa::path(
    patch,
    path = "/api/flows/{id}",
    tag = "Flows",
    request_body = UpdateFlowPayload,
    params(("id" = Uuid, Path, description = "ID do flow")),
    responses(
        (status = 200, description = "Rascunho atualizado", body = FlowRow),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Flow não encontrado")
    )
)]
pub async fn update_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
    payload: Result<Json<UpdateFlowPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let flow = app_state.flow_service
        .update(&app_state.db_pool, id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(flow)))
}

// DELETE /api/flows/{id}
#[utoipa::path(
    delete,
    path = "/api/flows/{id}",
    tag = "Flows",
    params(("id" = Uuid, Path, description = "ID do flow")),
    responses(
        (status = 204, description = "Rascunho removido"),
        (status = 404, description = "Flow não encontrado")
    )
)]
pub async fn delete_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    app_state.flow_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: EDITOR (NÓS E CONEXÕES)
// =============================================================================

// POST /api/flows/{id}/nodes
#[utoipa::path(
    post,
    path = "/api/flows/{id}/nodes",
    tag = "Flows",
    request_body = AddNodePayload,
    params(("id" = Uuid, Path, description = "ID do flow")),
    responses(
        (status = 201, description = "Nó adicionado na posição padrão", body = FlowNode),
        (status = 404, description = "Flow não encontrado")
    )
)]
pub async fn add_node(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
    payload: Result<Json<AddNodePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    let node = app_state.flow_service
        .add_node(&app_state.db_pool, id, payload.kind)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(node)))
}

// PATCH /api/flows/{id}/nodes/{node_id}
#[utoipa::path(
    patch,
    path = "/api/flows/{id}/nodes/{node_id}",
    tag = "Flows",
    request_body(content = Object, description = "Campos mesclados em `data` (ex: label, text)"),
    params(
        ("id" = Uuid, Path, description = "ID do flow"),
        ("node_id" = String, Path, description = "ID do nó")
    ),
    responses(
        (status = 200, description = "Nó atualizado", body = FlowNode),
        (status = 404, description = "Flow ou nó não encontrado")
    )
)]
pub async fn update_node(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((id, node_id)): Path<(String, String)>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    let Json(patch) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    let node = app_state.flow_service
        .update_node(&app_state.db_pool, id, &node_id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(node)))
}

// POST /api/flows/{id}/edges
#[utoipa::path(
    post,
    path = "/api/flows/{id}/edges",
    tag = "Flows",
    request_body = ConnectNodesPayload,
    params(("id" = Uuid, Path, description = "ID do flow")),
    responses(
        (status = 201, description = "Conexão criada", body = FlowEdge),
        (status = 204, description = "Conexão já existia"),
        (status = 400, description = "Nó de origem ou destino inexistente"),
        (status = 404, description = "Flow não encontrado")
    )
)]
pub async fn connect_nodes(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<String>,
    payload: Result<Json<ConnectNodesPayload>, JsonRejection>,
) -> Result<axum::response::Response, ApiError> {
    let id = parse_flow_id(&id)
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    let Json(payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    let edge = app_state.flow_service
        .connect(&app_state.db_pool, id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(match edge {
        Some(edge) => (StatusCode::CREATED, Json(edge)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

// =============================================================================
//  ÁREA 3: ENVIO
// =============================================================================

// POST /api/flows/send
#[utoipa::path(
    post,
    path = "/api/flows/send",
    tag = "Flows",
    request_body = SendFlowRequest,
    responses(
        (status = 200, description = "Mensagem interactive.flow enviada", body = SendFlowResponse),
        (status = 400, description = "to, flowId e flowToken são obrigatórios"),
        (status = 500, description = "Credenciais do WhatsApp não configuradas"),
        (status = 502, description = "Envio rejeitado pela API do WhatsApp")
    )
)]
pub async fn send_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    payload: Result<Json<SendFlowRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut payload) = payload
        .map_err(|rejection| AppError::from(rejection).to_api_error(&locale, &app_state.i18n_store))?;

    // Só espaços conta como vazio
    for field in [&mut payload.to, &mut payload.flow_id, &mut payload.flow_token] {
        *field = field.trim().to_string();
    }
    payload.validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state.flow_service
        .send(&app_state.db_pool, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}
