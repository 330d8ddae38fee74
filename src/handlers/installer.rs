// src/handlers/installer.rs

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    config::AppState,
    middleware::i18n::Locale,
    services::github_oauth::{render_error, render_success, OAuthError},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    // Repassado pelo GitHub; o popup valida do lado do cliente
    pub state: Option<String>,
}

// GET /api/installer/github/oauth/callback
// Sempre 200: o resultado vai para a janela que abriu o popup.
#[utoipa::path(
    get,
    path = "/api/installer/github/oauth/callback",
    tag = "Installer",
    params(OAuthCallbackQuery),
    responses(
        (status = 200, description = "Página que envia o resultado via postMessage", content_type = "text/html", body = String)
    )
)]
pub async fn github_oauth_callback(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<OAuthCallbackQuery>,
) -> Html<String> {
    let store = &app_state.i18n_store;
    let lang = locale.0.as_str();
    tracing::debug!(state = ?query.state, has_code = query.code.is_some(), "[GitHub OAuth] callback recebido");

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Html(render_error(&store.translate(lang, "oauth_missing_code")));
    };

    match app_state.github_oauth.authenticate(&code).await {
        Ok(identity) => Html(render_success(
            &identity,
            &store.translate(lang, "oauth_success_title"),
            &store.translate(lang, "oauth_success_hint"),
        )),
        Err(OAuthError::TokenMissing(_)) => Html(render_error(&store.translate(lang, "oauth_token_failed"))),
        Err(e) => {
            tracing::error!("[GitHub OAuth] Erro no callback: {}", e);
            Html(render_error(&store.translate(lang, "oauth_failed")))
        }
    }
}
