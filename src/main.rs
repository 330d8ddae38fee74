//src/main.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

/// Todas as rotas da API, já com o estado aplicado.
fn build_router(app_state: AppState) -> Router {
    let audience_routes = Router::new()
        .route("/preview", post(handlers::audience::preview))
        .route("/wizard", post(handlers::audience::wizard));

    let campaign_routes = Router::new()
        .route("/", get(handlers::campaigns::list_campaigns))
        .route("/folders", get(handlers::campaigns::list_folders))
        .nest("/audience", audience_routes);

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/recent-campaigns", get(handlers::dashboard::get_recent_campaigns));

    let ai_agent_routes = Router::new()
        .route("/{id}/test", post(handlers::ai_agents::test_agent));

    let flow_routes = Router::new()
        .route("/"
               ,get(handlers::flows::list_flows)
               .post(handlers::flows::create_flow)
        )
        .route("/send", post(handlers::flows::send_flow))
        .route("/{id}"
               ,get(handlers::flows::get_flow)
               .patch(handlers::flows::update_flow)
               .delete(handlers::flows::delete_flow)
        )
        .route("/{id}/nodes", post(handlers::flows::add_node))
        .route("/{id}/nodes/{node_id}", patch(handlers::flows::update_node))
        .route("/{id}/edges", post(handlers::flows::connect_nodes));

    let installer_routes = Router::new()
        .route("/github/oauth/callback", get(handlers::installer::github_oauth_callback));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/campaigns", campaign_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/ai-agents", ai_agent_routes)
        .nest("/api/flows", flow_routes)
        .nest("/api/installer", installer_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma rota testada aqui chega ao banco
    fn app() -> Router {
        let config = AppConfig::for_tests();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::from_parts(config, pool).unwrap())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn oauth_callback_without_code_posts_error() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/installer/github/oauth/callback?state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("github-oauth-error"));
        assert!(html.contains("Código de autorização não recebido"));
        assert!(html.contains("window.close()"));
    }

    #[tokio::test]
    async fn oauth_callback_failure_is_still_200() {
        // GitHub inacessível (porta 1): erro vira página, não status
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/installer/github/oauth/callback?code=abc")
                    .header(header::ACCEPT_LANGUAGE, "en-US")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("github-oauth-error"));
        assert!(html.contains("Error during authentication"));
    }

    #[tokio::test]
    async fn agent_test_rejects_empty_message() {
        let response = app()
            .oneshot(post_json(
                "/api/ai-agents/6f1c1a52-3f57-4e7e-9a43-5b0f6a1d2c11/test",
                r#"{"message": ""}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Dados inválidos");
        assert!(body["details"]["message"].is_array());
    }

    #[tokio::test]
    async fn agent_test_rejects_malformed_json_with_400() {
        let response = app()
            .oneshot(post_json("/api/ai-agents/whatever/test", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn agent_test_with_malformed_id_is_404() {
        let response = app()
            .oneshot(post_json("/api/ai-agents/not-a-uuid/test", r#"{"message": "Oi"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Agente não encontrado");
    }

    #[tokio::test]
    async fn send_flow_requires_token() {
        let response = app()
            .oneshot(post_json(
                "/api/flows/send",
                r#"{"to": "+5511999998888", "flowId": "123", "flowToken": "   "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["details"]["flow_token"][0], "Campo obrigatório");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let doc: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(doc["paths"]["/api/ai-agents/{id}/test"].is_object());
    }
}
