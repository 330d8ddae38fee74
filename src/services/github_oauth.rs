// src/services/github_oauth.rs
//
// Troca do `code` do GitHub OAuth por um token e página de retorno do popup.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    /// GitHub respondeu sem `access_token` (code expirado, client inválido...).
    #[error("token de acesso não retornado: {0}")]
    TokenMissing(String),

    #[error("falha HTTP: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubIdentity {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: Option<String>,
}

#[derive(Clone)]
pub struct GithubOAuthClient {
    http: Client,
    oauth_base_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: String,
}

impl GithubOAuthClient {
    pub fn new(
        http: Client,
        oauth_base_url: impl Into<String>,
        api_base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            oauth_base_url: oauth_base_url.into().trim_end_matches('/').to_string(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// code -> token -> login do usuário.
    pub async fn authenticate(&self, code: &str) -> Result<GithubIdentity, OAuthError> {
        let token = self.exchange_code(code).await?;
        let username = self.fetch_username(&token).await?;
        tracing::info!(username = %username, "GitHub OAuth concluído");
        Ok(GithubIdentity { token, username })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response: TokenResponse = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_base_url))
            .header("Accept", "application/json")
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
            }))
            .send()
            .await?
            .json()
            .await?;

        match response.access_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                let reason = response
                    .error_description
                    .or(response.error)
                    .unwrap_or_else(|| "resposta sem access_token".to_string());
                tracing::warn!("GitHub recusou o code: {}", reason);
                Err(OAuthError::TokenMissing(reason))
            }
        }
    }

    async fn fetch_username(&self, token: &str) -> Result<String, OAuthError> {
        let user: GithubUser = self
            .http
            .get(format!("{}/user", self.api_base_url))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github.v3+json")
            // A API do GitHub exige User-Agent
            .header("User-Agent", "smartzap-installer")
            .send()
            .await?
            .json()
            .await?;

        Ok(user.login.unwrap_or_default())
    }
}

// =============================================================================
//  PÁGINA DO POPUP
// =============================================================================

#[derive(Serialize)]
#[serde(tag = "type")]
enum PopupMessage<'a> {
    #[serde(rename = "github-oauth-success")]
    Success { token: &'a str, username: &'a str },
    #[serde(rename = "github-oauth-error")]
    Error { error: &'a str },
}

// JSON dentro de <script>: `</` não pode aparecer literalmente
fn script_json(message: &PopupMessage<'_>) -> String {
    serde_json::to_string(message)
        .unwrap_or_else(|_| r#"{"type":"github-oauth-error"}"#.to_string())
        .replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_success(identity: &GithubIdentity, title: &str, hint: &str) -> String {
    let payload = script_json(&PopupMessage::Success {
        token: &identity.token,
        username: &identity.username,
    });
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>GitHub OAuth Success</title></head>
  <body>
    <h2>{title}</h2>
    <p>{hint}</p>
    <script>
      window.opener.postMessage({payload}, window.location.origin);
      setTimeout(() => window.close(), 1000);
    </script>
  </body>
</html>
"#,
        title = escape_html(title),
        hint = escape_html(hint),
        payload = payload,
    )
}

pub fn render_error(message: &str) -> String {
    let payload = script_json(&PopupMessage::Error { error: message });
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>GitHub OAuth Error</title></head>
  <body>
    <script>
      window.opener.postMessage({payload}, window.location.origin);
      window.close();
    </script>
  </body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubOAuthClient {
        GithubOAuthClient::new(Client::new(), server.uri(), server.uri(), "cid", "secret")
    }

    #[tokio::test]
    async fn exchanges_code_and_fetches_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(header("Accept", "application/json"))
            .and(body_json(json!({"client_id": "cid", "client_secret": "secret", "code": "abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "gho_123", "token_type": "bearer"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("Authorization", "Bearer gho_123"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
            .expect(1)
            .mount(&server)
            .await;

        let identity = client(&server).authenticate("abc").await.unwrap();
        assert_eq!(identity, GithubIdentity { token: "gho_123".into(), username: "octocat".into() });
    }

    #[tokio::test]
    async fn missing_access_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let err = client(&server).authenticate("expired").await.unwrap_err();
        assert!(matches!(err, OAuthError::TokenMissing(reason) if reason.contains("expired")));
    }

    #[test]
    fn success_page_posts_token_and_closes_later() {
        let html = render_success(
            &GithubIdentity { token: "gho_123".into(), username: "octocat".into() },
            "Autenticação bem-sucedida!",
            "Você pode fechar esta janela.",
        );
        assert!(html.contains(r#"{"type":"github-oauth-success","token":"gho_123","username":"octocat"}"#));
        assert!(html.contains("setTimeout(() => window.close(), 1000)"));
    }

    #[test]
    fn error_page_escapes_script_breakouts() {
        let html = render_error("</script><script>alert(1)</script>");
        assert!(html.contains("github-oauth-error"));
        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains("window.close();"));
    }
}
