// src/services/audience_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{settings_repo, ContactRepository, SettingsRepository},
    models::{
        audience::{
            AudienceCriteria, AudiencePreset, AudiencePreview, AudiencePreviewRequest, AudienceStats,
            CustomFieldCount, CustomFieldPredicate, DdiCount, Refinement, StatusFilter, TagCount,
            UfCount,
        },
        contact::{Contact, ContactStatus, CustomFieldDefinition},
    },
    services::{
        audience_wizard::{self, WizardRequest, WizardResponse},
        phone,
    },
};

// =============================================================================
//  1. FILTRO DE ELEGIBILIDADE (puro)
// =============================================================================

/// Contatos que podem receber o envio. Opt-out nunca passa.
/// Todos os predicados ativos são combinados com AND e a ordem de entrada é mantida.
pub fn filter(contacts: &[Contact], criteria: &AudienceCriteria, now: DateTime<Utc>) -> Vec<Contact> {
    let criteria = criteria.normalized();
    contacts
        .iter()
        .filter(|c| is_eligible(c, &criteria, now))
        .cloned()
        .collect()
}

fn is_eligible(contact: &Contact, criteria: &AudienceCriteria, now: DateTime<Utc>) -> bool {
    if contact.is_opted_out() {
        return false;
    }

    let status_ok = match criteria.status {
        StatusFilter::All => true,
        StatusFilter::OptIn => contact.status == ContactStatus::OptIn,
        StatusFilter::Unknown => contact.status == ContactStatus::Unknown,
        // Opt-out já foi descartado acima
        StatusFilter::OptOut => false,
    };
    if !status_ok {
        return false;
    }

    if criteria.no_tags && !tag_keys(contact).is_empty() {
        return false;
    }

    if let Some(days) = criteria.created_within_days {
        // Limite inclusivo: criado exatamente há N dias ainda entra.
        // Janela maior que o calendário representável = sem limite.
        let cutoff = Duration::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window));
        if let Some(cutoff) = cutoff {
            if contact.created_at < cutoff {
                return false;
            }
        }
    }

    match &criteria.refinement {
        Refinement::None => true,
        Refinement::Tag { tag } => {
            let wanted = tag.to_lowercase();
            tag_keys(contact).iter().any(|t| *t == wanted)
        }
        Refinement::Country { ddi } => phone::has_dial_code(&contact.phone, ddi),
        Refinement::State { uf } => phone::br_state(&contact.phone) == Some(uf.as_str()),
        Refinement::CustomField { key, predicate } => {
            let value = contact.custom_field(key);
            match predicate {
                CustomFieldPredicate::Exists => value.is_some_and(has_value),
                CustomFieldPredicate::Equals { value: expected } => {
                    value.and_then(value_as_text).is_some_and(|v| v == *expected)
                }
            }
        }
    }
}

/// Tags normalizadas (trim + minúsculas), sem vazias e sem repetidas.
fn tag_keys(contact: &Contact) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for tag in &contact.tags {
        let key = tag.trim().to_lowercase();
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
//  2. AGREGADOR DE ESTATÍSTICAS (puro)
// =============================================================================

/// Contagens por dimensão sobre os contatos já elegíveis.
/// Ordem: contagem decrescente, empate pelo valor crescente.
pub fn aggregate(eligible: &[Contact]) -> AudienceStats {
    // chave normalizada -> (grafia exibida, contagem)
    let mut tags: HashMap<String, (String, usize)> = HashMap::new();
    let mut ddis: HashMap<String, usize> = HashMap::new();
    let mut ufs: HashMap<String, usize> = HashMap::new();
    let mut fields: HashMap<String, usize> = HashMap::new();

    let mut opt_in_eligible = 0;
    let mut no_tags_eligible = 0;

    for contact in eligible {
        if contact.status == ContactStatus::OptIn {
            opt_in_eligible += 1;
        }

        let mut seen: Vec<String> = Vec::new();
        for tag in &contact.tags {
            let display = tag.trim();
            let key = display.to_lowercase();
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            tags.entry(key.clone())
                .or_insert_with(|| (display.to_string(), 0))
                .1 += 1;
            seen.push(key);
        }
        if seen.is_empty() {
            no_tags_eligible += 1;
        }

        if let Some(ddi) = phone::dial_code(&contact.phone) {
            *ddis.entry(ddi.to_string()).or_default() += 1;
        }
        if let Some(uf) = phone::br_state(&contact.phone) {
            *ufs.entry(uf.to_string()).or_default() += 1;
        }
        if let Some(obj) = contact.custom_fields.as_object() {
            for (key, value) in obj {
                if has_value(value) {
                    *fields.entry(key.clone()).or_default() += 1;
                }
            }
        }
    }

    // Empate resolvido pela chave normalizada, não pela grafia
    let mut tag_entries: Vec<(String, (String, usize))> = tags.into_iter().collect();
    tag_entries.sort_by(|a, b| b.1.1.cmp(&a.1.1).then_with(|| a.0.cmp(&b.0)));
    let tag_counts: Vec<TagCount> = tag_entries
        .into_iter()
        .map(|(_, (tag, count))| TagCount { tag, count })
        .collect();
    let ddi_counts = sorted(ddis.into_iter().collect())
        .into_iter()
        .map(|(ddi, count)| DdiCount { ddi, count })
        .collect();
    let uf_counts = sorted(ufs.into_iter().collect())
        .into_iter()
        .map(|(uf, count)| UfCount { uf, count })
        .collect();
    let custom_field_counts = sorted(fields.into_iter().collect())
        .into_iter()
        .map(|(key, count)| CustomFieldCount { key, count })
        .collect();

    let top_tag = tag_counts.first().map(|t| t.tag.clone());
    let top_tag_eligible = tag_counts.first().map_or(0, |t| t.count);

    AudienceStats {
        eligible: eligible.len(),
        opt_in_eligible,
        no_tags_eligible,
        top_tag,
        top_tag_eligible,
        tag_counts,
        ddi_counts,
        uf_counts,
        custom_field_counts,
    }
}

fn sorted(mut entries: Vec<(String, usize)>) -> Vec<(String, usize)> {
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

// =============================================================================
//  3. PRESETS E RÓTULOS
// =============================================================================

/// Critérios de cada atalho do assistente. `manual` e `test` não usam critérios.
pub fn preset_criteria(preset: AudiencePreset, top_tag: Option<&str>) -> Option<AudienceCriteria> {
    match preset {
        AudiencePreset::All => Some(AudienceCriteria::all()),
        AudiencePreset::OptIn => Some(AudienceCriteria {
            status: StatusFilter::OptIn,
            ..AudienceCriteria::default()
        }),
        AudiencePreset::New7d => Some(AudienceCriteria {
            created_within_days: Some(7),
            ..AudienceCriteria::default()
        }),
        AudiencePreset::NoTags => Some(AudienceCriteria {
            no_tags: true,
            ..AudienceCriteria::default()
        }),
        AudiencePreset::TagTop => Some(
            AudienceCriteria::all().with_refinement(top_tag.map(Refinement::tag).unwrap_or_default()),
        ),
        AudiencePreset::Manual | AudiencePreset::Test => None,
    }
}

/// Subtítulo do cartão "Segmentos".
pub fn segment_label(
    criteria: &AudienceCriteria,
    stats: &AudienceStats,
    definitions: &[CustomFieldDefinition],
) -> String {
    let criteria = criteria.normalized();

    if criteria.no_tags {
        return format!("Sem tags • {} contatos", stats.no_tags_eligible);
    }

    match &criteria.refinement {
        Refinement::State { uf } => {
            let count = stats.uf_counts.iter().find(|x| x.uf == *uf).map_or(0, |x| x.count);
            format!("UF: {} • {} contatos", uf, count)
        }
        Refinement::Country { ddi } => {
            let count = stats.ddi_counts.iter().find(|x| x.ddi == *ddi).map_or(0, |x| x.count);
            format!("DDI +{} • {} contatos", ddi, count)
        }
        Refinement::CustomField { key, .. } => {
            let label = definitions
                .iter()
                .find(|d| d.key == *key)
                .map_or(key.as_str(), |d| d.label.as_str());
            let count = stats
                .custom_field_counts
                .iter()
                .find(|x| x.key == *key)
                .map_or(0, |x| x.count);
            format!("{} • {} contatos", label, count)
        }
        Refinement::Tag { tag } => {
            let wanted = tag.to_lowercase();
            let count = stats
                .tag_counts
                .iter()
                .find(|x| x.tag.trim().to_lowercase() == wanted)
                .map_or(0, |x| x.count);
            format!("Tag: {} • {} contatos", tag, count)
        }
        Refinement::None => {
            if stats.tag_counts.is_empty() {
                "Escolha uma tag".to_string()
            } else {
                format!("{} tags disponíveis", stats.tag_counts.len())
            }
        }
    }
}

/// Filtro + agregação + contagem de suprimidos, tudo de uma vez.
pub fn preview(
    contacts: &[Contact],
    criteria: &AudienceCriteria,
    definitions: &[CustomFieldDefinition],
    now: DateTime<Utc>,
) -> (Vec<Contact>, AudiencePreview) {
    let eligible = filter(contacts, criteria, now);
    let stats = aggregate(&eligible);
    let preview = AudiencePreview {
        total_contacts: contacts.len(),
        suppressed: contacts.iter().filter(|c| c.is_opted_out()).count(),
        segment_label: segment_label(criteria, &stats, definitions),
        is_all_criteria: criteria.is_all(),
        stats,
    };
    (eligible, preview)
}

// =============================================================================
//  4. SERVIÇO (carrega do banco e delega para as funções puras)
// =============================================================================

#[derive(Clone)]
pub struct AudienceService {
    repo: ContactRepository,
    settings_repo: SettingsRepository,
    default_exchange_rate: Decimal,
}

impl AudienceService {
    pub fn new(
        repo: ContactRepository,
        settings_repo: SettingsRepository,
        default_exchange_rate: Decimal,
    ) -> Self {
        Self { repo, settings_repo, default_exchange_rate }
    }

    /// Lista completa de contatos + definições de campos personalizados.
    pub async fn load_audience<'e, E>(
        &self,
        executor: E,
    ) -> Result<(Vec<Contact>, Vec<CustomFieldDefinition>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let contacts = self.repo.list_contacts(executor).await?;
        let definitions = self.repo.list_custom_field_definitions(executor).await?;
        Ok((contacts, definitions))
    }

    pub async fn preview_for<'e, E>(
        &self,
        executor: E,
        request: AudiencePreviewRequest,
    ) -> Result<AudiencePreview, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let (contacts, definitions) = self.load_audience(executor).await?;
        let now = Utc::now();
        let criteria = resolve_criteria(&contacts, request, now);
        let (_, preview) = preview(&contacts, &criteria, &definitions, now);
        Ok(preview)
    }

    pub async fn wizard_step<'e, E>(
        &self,
        executor: E,
        request: WizardRequest,
    ) -> Result<WizardResponse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        let (contacts, definitions) = self.load_audience(executor).await?;
        let test_phone = self
            .settings_repo
            .get_value(executor, settings_repo::TEST_CONTACT_PHONE)
            .await?;
        let test_contact = test_phone.map(|phone| test_contact_for(&contacts, &phone));

        Ok(audience_wizard::evaluate(
            request,
            &contacts,
            &definitions,
            test_contact.as_ref(),
            self.default_exchange_rate,
            Utc::now(),
        ))
    }
}

/// Critérios efetivos de uma prévia: preset > critérios explícitos > todos.
pub fn resolve_criteria(
    contacts: &[Contact],
    request: AudiencePreviewRequest,
    now: DateTime<Utc>,
) -> AudienceCriteria {
    let explicit = request.criteria.unwrap_or_default();
    let Some(preset) = request.preset else {
        return explicit;
    };
    let top_tag = aggregate(&filter(contacts, &AudienceCriteria::all(), now)).top_tag;
    preset_criteria(preset, top_tag.as_deref()).unwrap_or(explicit)
}

/// O contato de teste configurado: o da base (mesmos dígitos) ou um avulso.
fn test_contact_for(contacts: &[Contact], phone_number: &str) -> Contact {
    let wanted = phone::digits(phone_number);
    contacts
        .iter()
        .find(|c| phone::digits(&c.phone) == wanted)
        .cloned()
        .unwrap_or_else(|| Contact {
            id: Uuid::nil(),
            name: Some("Contato de teste".to_string()),
            phone: phone_number.to_string(),
            email: None,
            status: ContactStatus::Unknown,
            tags: Vec::new(),
            custom_fields: Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        })
}
