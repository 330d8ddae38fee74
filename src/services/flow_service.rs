// src/services/flow_service.rs

use serde_json::{Map, Value};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{settings_repo, FlowRepository, SettingsRepository},
    models::flow::{
        ConnectNodesPayload, FlowEdge, FlowNode, FlowNodeKind, FlowRow, FlowSpec, SendFlowRequest,
        SendFlowResponse, UpdateFlowPayload,
    },
    services::{
        flow_builder::{normalize_spec, FlowEditor},
        whatsapp::{build_flow_message, WhatsAppClient, WhatsAppCredentials},
    },
};

#[derive(Clone)]
pub struct FlowService {
    repo: FlowRepository,
    settings_repo: SettingsRepository,
    whatsapp: WhatsAppClient,
}

impl FlowService {
    pub fn new(repo: FlowRepository, settings_repo: SettingsRepository, whatsapp: WhatsAppClient) -> Self {
        Self { repo, settings_repo, whatsapp }
    }

    // --- RASCUNHOS ---

    pub async fn list<'e, E>(&self, executor: E, search: Option<&str>) -> Result<Vec<FlowRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = self.repo.list(executor, search).await?;
        Ok(rows.into_iter().map(with_normalized_spec).collect())
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<FlowRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, id)
            .await?
            .map(with_normalized_spec)
            .ok_or(AppError::FlowNotFound)
    }

    pub async fn create<'e, E>(&self, executor: E, name: &str) -> Result<FlowRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let spec = spec_to_value(&FlowSpec::default())?;
        let row = self.repo.create(executor, name.trim(), &spec).await?;
        tracing::info!(flow_id = %row.id, "Flow criado");
        Ok(row)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: UpdateFlowPayload,
    ) -> Result<FlowRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let spec = match &payload.spec {
            Some(raw) => Some(spec_to_value(&normalize_spec(raw))?),
            None => None,
        };
        let name = payload.name.as_deref().map(str::trim);
        let meta_flow_id = payload.meta_flow_id.as_deref().map(str::trim);

        self.repo
            .update(executor, id, name, meta_flow_id, spec.as_ref())
            .await?
            .map(with_normalized_spec)
            .ok_or(AppError::FlowNotFound)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if self.repo.delete(executor, id).await? {
            Ok(())
        } else {
            Err(AppError::FlowNotFound)
        }
    }

    // --- EDIÇÃO DO MAPA ---
    // Carregar, editar e salvar acontecem na mesma transação, com a linha travada:
    // duas edições simultâneas no mesmo flow são serializadas.

    pub async fn add_node<'e, E>(&self, executor: E, id: Uuid, kind: FlowNodeKind) -> Result<FlowNode, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut editor = self.locked_editor(&mut *tx, id).await?;
        let node = editor.add_node(kind).clone();
        self.save(&mut *tx, id, &editor).await?;

        tx.commit().await?;
        Ok(node)
    }

    pub async fn update_node<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        node_id: &str,
        patch: Map<String, Value>,
    ) -> Result<FlowNode, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut editor = self.locked_editor(&mut *tx, id).await?;
        editor.select(node_id)?;
        let node = editor.update_selected_data(patch)?.clone();
        self.save(&mut *tx, id, &editor).await?;

        tx.commit().await?;
        Ok(node)
    }

    /// Devolve `None` quando a conexão já existia.
    pub async fn connect<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: ConnectNodesPayload,
    ) -> Result<Option<FlowEdge>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut editor = self.locked_editor(&mut *tx, id).await?;
        let edge = editor
            .connect(&payload.source, &payload.target, payload.source_handle, payload.target_handle)?
            .cloned();
        if edge.is_some() {
            self.save(&mut *tx, id, &editor).await?;
        }

        tx.commit().await?;
        Ok(edge)
    }

    async fn locked_editor<'e, E>(&self, executor: E, id: Uuid) -> Result<FlowEditor, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = self
            .repo
            .find_by_id_for_update(executor, id)
            .await?
            .ok_or(AppError::FlowNotFound)?;
        Ok(FlowEditor::from_raw(&row.spec))
    }

    async fn save<'e, E>(&self, executor: E, id: Uuid, editor: &FlowEditor) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let spec = editor.to_saved_spec();
        self.repo
            .update(executor, id, None, None, Some(&spec))
            .await?
            .ok_or(AppError::FlowNotFound)?;
        Ok(())
    }

    // --- ENVIO ---

    pub async fn send<'e, E>(&self, executor: E, req: &SendFlowRequest) -> Result<SendFlowResponse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let phone_number_id = self
            .settings_repo
            .get_value(executor, settings_repo::WHATSAPP_PHONE_NUMBER_ID)
            .await?;
        let access_token = self
            .settings_repo
            .get_value(executor, settings_repo::WHATSAPP_ACCESS_TOKEN)
            .await?;

        let credentials = match (phone_number_id, access_token) {
            (Some(phone_number_id), Some(access_token)) => {
                WhatsAppCredentials { phone_number_id, access_token }
            }
            _ => return Err(AppError::WhatsAppNotConfigured),
        };

        let message = build_flow_message(req);
        let message_id = self.whatsapp.send_message(&credentials, &message).await?;

        Ok(SendFlowResponse { success: true, message_id })
    }
}

fn spec_to_value(spec: &FlowSpec) -> Result<Value, AppError> {
    serde_json::to_value(spec).map_err(|e| AppError::InternalServerError(e.into()))
}

fn with_normalized_spec(mut row: FlowRow) -> FlowRow {
    row.spec = serde_json::to_value(normalize_spec(&row.spec)).unwrap_or(row.spec);
    row
}
