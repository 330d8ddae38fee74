// src/services/flow_builder.rs
//
// Edição do mapa do Flow (nós e conexões). Não valida ciclos nem conectividade:
// é um rascunho visual. As telas do Flow continuam na Meta.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::flow::{
        FlowEdge, FlowNode, FlowNodeKind, FlowSpec, Position, Viewport, FLOW_SPEC_VERSION,
    },
};

const MESSAGE_X: f64 = 320.0;
const END_X: f64 = 560.0;
const BASE_Y: f64 = 120.0;
const STEP_Y: f64 = 40.0;

/// Aceita qualquer JSON salvo e devolve um documento utilizável.
/// Entradas de nó/aresta que não têm o formato mínimo são descartadas.
pub fn normalize_spec(raw: &Value) -> FlowSpec {
    let version = raw.get("version").and_then(Value::as_i64).unwrap_or(FLOW_SPEC_VERSION);

    let viewport = raw
        .get("viewport")
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<Viewport>(v.clone()).ok())
        .unwrap_or_default();

    let nodes = parse_items::<FlowNode>(raw.get("nodes"), "node");
    let edges = parse_items::<FlowEdge>(raw.get("edges"), "edge");

    FlowSpec { version, viewport: Some(viewport), nodes, edges }
}

fn parse_items<T: serde::de::DeserializeOwned>(raw: Option<&Value>, what: &str) -> Vec<T> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Descartando {} inválido do flow: {}", what, e);
                None
            }
        })
        .collect()
}

fn short_id(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}

/// Editor em memória sobre uma cópia do documento.
#[derive(Debug, Clone)]
pub struct FlowEditor {
    spec: FlowSpec,
    selected: Option<String>,
}

impl FlowEditor {
    pub fn new(spec: FlowSpec) -> Self {
        Self { spec, selected: None }
    }

    pub fn from_raw(raw: &Value) -> Self {
        Self::new(normalize_spec(raw))
    }

    pub fn spec(&self) -> &FlowSpec {
        &self.spec
    }

    pub fn selected_node(&self) -> Option<&FlowNode> {
        let id = self.selected.as_deref()?;
        self.spec.nodes.iter().find(|n| n.id == id)
    }

    pub fn select(&mut self, node_id: &str) -> Result<(), AppError> {
        if !self.spec.nodes.iter().any(|n| n.id == node_id) {
            return Err(AppError::FlowNodeNotFound(node_id.to_string()));
        }
        self.selected = Some(node_id.to_string());
        Ok(())
    }

    /// Adiciona um nó na posição padrão e o seleciona.
    pub fn add_node(&mut self, kind: FlowNodeKind) -> &FlowNode {
        let id = format!("{}_{}", kind.as_str(), short_id(6));
        let position = Position {
            x: match kind {
                FlowNodeKind::End => END_X,
                FlowNodeKind::Message => MESSAGE_X,
            },
            y: BASE_Y + self.spec.nodes.len() as f64 * STEP_Y,
        };
        let data = match kind {
            FlowNodeKind::Message => json!({ "label": "Mensagem", "text": "" }),
            FlowNodeKind::End => json!({ "label": "Fim" }),
        };

        self.spec.nodes.push(FlowNode {
            id: id.clone(),
            node_type: Some(kind.as_str().to_string()),
            position,
            data,
            extra: Map::new(),
        });
        self.selected = Some(id);
        &self.spec.nodes[self.spec.nodes.len() - 1]
    }

    /// Merge raso do patch no `data` do nó selecionado.
    pub fn update_selected_data(&mut self, patch: Map<String, Value>) -> Result<&FlowNode, AppError> {
        let id = self
            .selected
            .clone()
            .ok_or_else(|| AppError::FlowNodeNotFound("(nenhum nó selecionado)".to_string()))?;
        let node = self
            .spec
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::FlowNodeNotFound(id.clone()))?;

        if !node.data.is_object() {
            node.data = Value::Object(Map::new());
        }
        if let Some(data) = node.data.as_object_mut() {
            for (key, value) in patch {
                data.insert(key, value);
            }
        }
        Ok(node)
    }

    /// Liga dois nós existentes. Conexões repetidas são ignoradas.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        source_handle: Option<String>,
        target_handle: Option<String>,
    ) -> Result<Option<&FlowEdge>, AppError> {
        for endpoint in [source, target] {
            if !self.spec.nodes.iter().any(|n| n.id == endpoint) {
                return Err(AppError::InvalidFlowEdge(format!("nó '{}' não existe", endpoint)));
            }
        }

        let duplicate = self.spec.edges.iter().any(|e| {
            e.source == source
                && e.target == target
                && e.source_handle == source_handle
                && e.target_handle == target_handle
        });
        if duplicate {
            return Ok(None);
        }

        self.spec.edges.push(FlowEdge {
            id: format!("e_{}", short_id(8)),
            source: source.to_string(),
            target: target.to_string(),
            source_handle,
            target_handle,
            extra: Map::new(),
        });
        Ok(self.spec.edges.last())
    }

    /// O que vai para o banco: `{version, nodes, edges}` (+ viewport, quando houver).
    pub fn to_saved_spec(&self) -> Value {
        let saved = FlowSpec {
            version: FLOW_SPEC_VERSION,
            viewport: self.spec.viewport,
            nodes: self.spec.nodes.clone(),
            edges: self.spec.edges.clone(),
        };
        serde_json::to_value(saved).unwrap_or_else(|_| json!({ "version": FLOW_SPEC_VERSION, "nodes": [], "edges": [] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_defaults_for_garbage() {
        let spec = normalize_spec(&json!({ "nodes": "oops" }));
        assert_eq!(spec.version, 1);
        assert!(spec.nodes.is_empty());
        assert!(spec.edges.is_empty());
        assert_eq!(spec.viewport, Some(Viewport { x: 0.0, y: 0.0, zoom: 1.0 }));

        let spec = normalize_spec(&Value::Null);
        assert_eq!(spec.version, 1);
    }

    #[test]
    fn normalize_keeps_unknown_node_fields() {
        let raw = json!({
            "version": 3,
            "viewport": {"x": 10.0, "y": 5.0, "zoom": 0.5},
            "nodes": [
                {"id": "message_a", "type": "message", "position": {"x": 1, "y": 2}, "data": {"label": "Oi"}, "width": 180},
                {"type": "message"}
            ],
            "edges": []
        });
        let spec = normalize_spec(&raw);
        assert_eq!(spec.version, 3);
        assert_eq!(spec.nodes.len(), 1);
        assert_eq!(spec.nodes[0].extra.get("width"), Some(&json!(180)));
    }

    #[test]
    fn add_node_uses_default_position_and_data() {
        let mut editor = FlowEditor::new(FlowSpec::default());
        let first = editor.add_node(FlowNodeKind::Message).clone();
        assert!(first.id.starts_with("message_"));
        assert_eq!(first.id.len(), "message_".len() + 6);
        assert_eq!(first.position, Position { x: 320.0, y: 120.0 });
        assert_eq!(first.data, json!({"label": "Mensagem", "text": ""}));

        let end = editor.add_node(FlowNodeKind::End).clone();
        assert_eq!(end.position, Position { x: 560.0, y: 160.0 });
        assert_eq!(end.data, json!({"label": "Fim"}));
        assert_eq!(editor.selected_node().map(|n| n.id.clone()), Some(end.id));
    }

    #[test]
    fn update_merges_into_selected_node() {
        let mut editor = FlowEditor::new(FlowSpec::default());
        let id = editor.add_node(FlowNodeKind::Message).id.clone();

        let mut patch = Map::new();
        patch.insert("text".into(), json!("Olá!"));
        editor.update_selected_data(patch).unwrap();

        let node = editor.spec().nodes.iter().find(|n| n.id == id).unwrap();
        assert_eq!(node.data, json!({"label": "Mensagem", "text": "Olá!"}));
    }

    #[test]
    fn update_without_selection_fails() {
        let mut editor = FlowEditor::new(FlowSpec::default());
        assert!(matches!(
            editor.update_selected_data(Map::new()),
            Err(AppError::FlowNodeNotFound(_))
        ));
    }

    #[test]
    fn connect_ignores_duplicates_and_unknown_nodes() {
        let mut editor = FlowEditor::new(FlowSpec::default());
        let a = editor.add_node(FlowNodeKind::Message).id.clone();
        let b = editor.add_node(FlowNodeKind::End).id.clone();

        let edge = editor.connect(&a, &b, None, None).unwrap().cloned().unwrap();
        assert!(edge.id.starts_with("e_"));
        assert!(editor.connect(&a, &b, None, None).unwrap().is_none());
        assert_eq!(editor.spec().edges.len(), 1);

        assert!(matches!(
            editor.connect(&a, "ghost", None, None),
            Err(AppError::InvalidFlowEdge(_))
        ));
    }

    #[test]
    fn saved_spec_has_version_nodes_and_edges() {
        let mut editor = FlowEditor::from_raw(&json!({ "version": 7 }));
        editor.add_node(FlowNodeKind::Message);
        let saved = editor.to_saved_spec();
        assert_eq!(saved["version"], 1);
        assert_eq!(saved["nodes"].as_array().map(Vec::len), Some(1));
        assert_eq!(saved["edges"], json!([]));
        assert_eq!(saved["nodes"][0]["type"], "message");
    }
}
