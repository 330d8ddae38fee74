// src/services/gemini.rs
//
// Provedor Gemini (REST v1beta generateContent) com a ferramenta File Search.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    models::ai_agent::{SourceRef, TokenUsage},
    services::generative::{GenerationRequest, GenerationResult, GenerativeProvider, ProviderError},
};

#[derive(Clone)]
pub struct GeminiProvider {
    http: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn request_body(request: &GenerationRequest, contents: &[Value]) -> Value {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": request.system }] },
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
            },
        });
        if let Some(tool) = &request.file_search {
            body["tools"] = json!([{
                "fileSearch": {
                    "fileSearchStoreNames": [tool.store_name],
                    "topK": tool.top_k,
                }
            }]);
        }
        body
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ProviderError> {
        let url = self.generate_url(&request.model);
        let mut contents = vec![json!({ "role": "user", "parts": [{ "text": request.prompt }] })];
        let mut result = GenerationResult::default();
        let max_steps = request.max_steps.max(1);

        for step in 1..=max_steps {
            debug!(model = %request.model, step, file_search = request.file_search.is_some(), "chamando generateContent");

            let response = self
                .http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&Self::request_body(request, &contents))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_error(status.as_u16(), &body));
            }

            let payload: Value = response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse(format!("falha ao ler resposta: {e}")))?;

            result.steps_count = step;
            if let Some(usage) = parse_usage(&payload) {
                result.usage = Some(usage);
            }

            let candidate = payload
                .get("candidates")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .ok_or_else(|| ProviderError::InvalidResponse("resposta sem candidates".into()))?;

            if let Some(metadata) = candidate.get("groundingMetadata").filter(|m| !m.is_null()) {
                result.sources.extend(parse_sources(metadata));
                result.grounding_metadata = Some(metadata.clone());
            }

            let parts = candidate
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let text: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            let calls: Vec<&Value> = parts.iter().filter_map(|p| p.get("functionCall")).collect();
            result.tool_calls_count += calls.len();

            if !text.is_empty() || calls.is_empty() {
                result.text = text;
                break;
            }

            // Nenhuma função local é exposta ao modelo: devolvemos o erro e seguimos
            contents.push(json!({ "role": "model", "parts": parts }));
            let responses: Vec<Value> = calls
                .iter()
                .map(|call| {
                    json!({
                        "functionResponse": {
                            "name": call.get("name").cloned().unwrap_or(Value::Null),
                            "response": { "error": "ferramenta indisponível" }
                        }
                    })
                })
                .collect();
            contents.push(json!({ "role": "user", "parts": responses }));

            if step == max_steps {
                warn!(model = %request.model, max_steps, "limite de passos atingido sem resposta em texto");
            }
        }

        dedup_sources(&mut result.sources);
        Ok(result)
    }
}

/// Mapeia a resposta de erro para as categorias que o handler sabe traduzir.
fn classify_error(status: u16, body: &str) -> ProviderError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    let upper = body.to_uppercase();

    match status {
        401 | 403 => ProviderError::AuthFailed(message),
        400 if body.contains("API key") || upper.contains("API_KEY_INVALID") => {
            ProviderError::AuthFailed(message)
        }
        429 if upper.contains("RESOURCE_EXHAUSTED") || upper.contains("QUOTA") => {
            ProviderError::QuotaExceeded(message)
        }
        429 => ProviderError::RateLimited(message),
        _ => ProviderError::RequestFailed(format!("HTTP {status}: {message}")),
    }
}

// {"error": {"code": 400, "message": "...", "status": "INVALID_ARGUMENT"}}
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(String::from)
}

fn parse_sources(metadata: &Value) -> Vec<SourceRef> {
    metadata
        .get("groundingChunks")
        .and_then(Value::as_array)
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| chunk.get("retrievedContext").or_else(|| chunk.get("web")))
                .map(|ctx| SourceRef {
                    title: ctx.get("title").and_then(Value::as_str).map(String::from),
                    uri: ctx.get("uri").and_then(Value::as_str).map(String::from),
                })
                .filter(|s| s.title.is_some() || s.uri.is_some())
                .collect()
        })
        .unwrap_or_default()
}

fn dedup_sources(sources: &mut Vec<SourceRef>) {
    let mut seen: Vec<SourceRef> = Vec::with_capacity(sources.len());
    sources.retain(|s| {
        if seen.contains(s) {
            false
        } else {
            seen.push(s.clone());
            true
        }
    });
}

fn parse_usage(payload: &Value) -> Option<TokenUsage> {
    let usage = payload.get("usageMetadata")?;
    Some(TokenUsage {
        prompt_tokens: usage.get("promptTokenCount").and_then(Value::as_u64),
        completion_tokens: usage.get("candidatesTokenCount").and_then(Value::as_u64),
        total_tokens: usage.get("totalTokenCount").and_then(Value::as_u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generative::FileSearchTool;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn request(file_search: bool) -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.0-flash".into(),
            system: "Você é um atendente.".into(),
            prompt: "Qual o horário?".into(),
            temperature: 0.7,
            max_output_tokens: 1024,
            file_search: file_search.then(|| FileSearchTool {
                store_name: "fileSearchStores/loja".into(),
                top_k: 5,
            }),
            max_steps: 5,
        }
    }

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(Client::new(), server.uri())
    }

    #[tokio::test]
    async fn text_response_with_grounding() {
        let server = MockServer::start().await;
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Das 8h " }, { "text": "às 18h." }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "retrievedContext": { "title": "horarios.pdf", "uri": "files/1" } },
                        { "retrievedContext": { "title": "horarios.pdf", "uri": "files/1" } }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17 }
        });

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "tools": [{ "fileSearch": { "fileSearchStoreNames": ["fileSearchStores/loja"], "topK": 5 } }],
                "generationConfig": { "maxOutputTokens": 1024 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server).generate("test-key", &request(true)).await.unwrap();

        assert_eq!(result.text, "Das 8h às 18h.");
        assert_eq!(result.steps_count, 1);
        assert_eq!(result.tool_calls_count, 0);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].title.as_deref(), Some("horarios.pdf"));
        assert!(result.grounding_metadata.is_some());
        assert_eq!(result.usage.unwrap().total_tokens, Some(17));
    }

    #[tokio::test]
    async fn function_calls_take_extra_steps() {
        let server = MockServer::start().await;
        let call = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "functionCall": { "name": "lookup", "args": {} } }] } }]
        });
        let answer = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Pronto." }] } }]
        });

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&call))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&answer))
            .mount(&server)
            .await;

        let result = provider(&server).generate("k", &request(false)).await.unwrap();
        assert_eq!(result.text, "Pronto.");
        assert_eq!(result.steps_count, 2);
        assert_eq!(result.tool_calls_count, 1);
    }

    #[tokio::test]
    async fn invalid_key_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).generate("bad", &request(false)).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthFailed(msg) if msg.starts_with("API key not valid")));
    }

    #[tokio::test]
    async fn quota_and_rate_limit_are_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let p = provider(&server);
        assert!(matches!(p.generate("k", &request(false)).await, Err(ProviderError::QuotaExceeded(_))));
        assert!(matches!(p.generate("k", &request(false)).await, Err(ProviderError::RateLimited(_))));
    }

    #[tokio::test]
    async fn server_error_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider(&server).generate("k", &request(false)).await.unwrap_err();
        assert!(matches!(err, ProviderError::RequestFailed(msg) if msg.contains("500")));
    }

    #[test]
    fn classify_forbidden_as_auth() {
        assert!(matches!(classify_error(403, "{}"), ProviderError::AuthFailed(_)));
        assert!(matches!(classify_error(400, "bad request"), ProviderError::RequestFailed(_)));
    }
}
