// src/services/whatsapp.rs
//
// Cliente mínimo da WhatsApp Cloud API (Graph) para envio de mensagens `interactive.flow`.

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::flow::{FlowAction, SendFlowRequest};

pub const DEFAULT_FLOW_BODY: &str = "Vamos começar?";
pub const DEFAULT_FLOW_CTA: &str = "Abrir";
pub const DEFAULT_FLOW_MESSAGE_VERSION: &str = "3";

#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// A Graph API respondeu com erro (token expirado, número inválido...).
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("falha HTTP: {0}")]
    Http(#[from] reqwest::Error),
}

/// Credenciais do número remetente (vêm da tabela settings).
#[derive(Debug, Clone)]
pub struct WhatsAppCredentials {
    pub phone_number_id: String,
    pub access_token: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Corpo da mensagem `interactive` do tipo `flow`.
pub fn build_flow_message(req: &SendFlowRequest) -> Value {
    let to: String = req.to.chars().filter(|c| c.is_ascii_digit()).collect();
    let action = req.action.unwrap_or_default();

    let mut parameters = json!({
        "flow_message_version": non_blank(req.flow_message_version.as_deref()).unwrap_or(DEFAULT_FLOW_MESSAGE_VERSION),
        "flow_token": req.flow_token.trim(),
        "flow_id": req.flow_id.trim(),
        "flow_cta": non_blank(req.cta_text.as_deref()).unwrap_or(DEFAULT_FLOW_CTA),
        "flow_action": match action {
            FlowAction::Navigate => "navigate",
            FlowAction::DataExchange => "data_exchange",
        },
    });
    if let Some(payload) = req.action_payload.as_ref().filter(|p| p.is_object()) {
        parameters["flow_action_payload"] = payload.clone();
    }

    let mut interactive = json!({
        "type": "flow",
        "body": { "text": non_blank(req.body.as_deref()).unwrap_or(DEFAULT_FLOW_BODY) },
        "action": { "name": "flow", "parameters": parameters },
    });
    if let Some(footer) = non_blank(req.footer.as_deref()) {
        interactive["footer"] = json!({ "text": footer });
    }

    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "interactive",
        "interactive": interactive,
    })
}

#[derive(Clone)]
pub struct WhatsAppClient {
    http: Client,
    base_url: String,
    api_version: String,
}

impl WhatsAppClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        }
    }

    /// Envia a mensagem e devolve o `wamid` quando a Graph API informa.
    pub async fn send_message(
        &self,
        credentials: &WhatsAppCredentials,
        message: &Value,
    ) -> Result<Option<String>, WhatsAppError> {
        let url = format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, credentials.phone_number_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("erro desconhecido")
                .to_string();
            return Err(WhatsAppError::Rejected { status: status.as_u16(), message });
        }

        let message_id = body
            .pointer("/messages/0/id")
            .and_then(Value::as_str)
            .map(String::from);

        tracing::info!(message_id = ?message_id, "Flow enviado pelo WhatsApp");
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SendFlowRequest {
        SendFlowRequest {
            to: "+55 (11) 99999-8888".into(),
            flow_id: "123456".into(),
            flow_token: "tok".into(),
            body: None,
            cta_text: Some("  ".into()),
            footer: None,
            action: None,
            action_payload: None,
            flow_message_version: None,
        }
    }

    fn credentials() -> WhatsAppCredentials {
        WhatsAppCredentials { phone_number_id: "999".into(), access_token: "EAAG".into() }
    }

    #[test]
    fn message_uses_defaults() {
        let msg = build_flow_message(&request());
        assert_eq!(msg["to"], "5511999998888");
        assert_eq!(msg["interactive"]["body"]["text"], "Vamos começar?");
        let params = &msg["interactive"]["action"]["parameters"];
        assert_eq!(params["flow_cta"], "Abrir");
        assert_eq!(params["flow_action"], "navigate");
        assert_eq!(params["flow_message_version"], "3");
        assert!(msg["interactive"].get("footer").is_none());
        assert!(params.get("flow_action_payload").is_none());
    }

    #[test]
    fn message_carries_optional_fields() {
        let mut req = request();
        req.footer = Some("SmartZap".into());
        req.action = Some(FlowAction::DataExchange);
        req.action_payload = Some(json!({"screen": "WELCOME"}));
        let msg = build_flow_message(&req);
        assert_eq!(msg["interactive"]["footer"]["text"], "SmartZap");
        let params = &msg["interactive"]["action"]["parameters"];
        assert_eq!(params["flow_action"], "data_exchange");
        assert_eq!(params["flow_action_payload"]["screen"], "WELCOME");
    }

    #[tokio::test]
    async fn send_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/999/messages"))
            .and(header("Authorization", "Bearer EAAG"))
            .and(body_partial_json(json!({"type": "interactive", "to": "5511999998888"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messaging_product": "whatsapp",
                "messages": [{"id": "wamid.ABC"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(Client::new(), server.uri(), "v21.0");
        let id = client
            .send_message(&credentials(), &build_flow_message(&request()))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("wamid.ABC"));
    }

    #[tokio::test]
    async fn graph_error_is_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v21.0/999/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid flow_id", "code": 100}
            })))
            .mount(&server)
            .await;

        let client = WhatsAppClient::new(Client::new(), server.uri(), "v21.0");
        let err = client
            .send_message(&credentials(), &build_flow_message(&request()))
            .await
            .unwrap_err();
        assert!(matches!(err, WhatsAppError::Rejected { status: 400, ref message } if message == "Invalid flow_id"));
    }
}
