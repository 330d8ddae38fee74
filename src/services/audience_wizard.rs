// src/services/audience_wizard.rs
//
// Estado do passo "Público" do assistente de campanha.
// O estado é explícito e serializável; as transições são puras.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{
        audience::{AudienceCriteria, AudiencePreset, AudiencePreview},
        contact::{Contact, CustomFieldDefinition},
    },
    services::{
        audience_service,
        pricing::{check_limit, pricing_breakdown, LimitCheck, MessageCategory, PricingBreakdown},
    },
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecipientSource {
    All,
    Specific,
    Test,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    #[serde(default)]
    pub recipient_source: Option<RecipientSource>,
    #[serde(default)]
    pub preset: Option<AudiencePreset>,
    #[serde(default)]
    pub criteria: AudienceCriteria,
    #[serde(default)]
    pub selected_contact_ids: Vec<Uuid>,
    #[serde(default)]
    pub contact_search: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WizardAction {
    SelectPreset {
        preset: AudiencePreset,
    },
    #[serde(rename_all = "camelCase")]
    ApplyCriteria {
        criteria: AudienceCriteria,
        #[serde(default)]
        preset: Option<AudiencePreset>,
    },
    #[serde(rename_all = "camelCase")]
    ToggleContact {
        contact_id: Uuid,
    },
    SetSearch {
        term: String,
    },
    #[serde(rename_all = "camelCase")]
    PickOneContact {
        contact_id: Uuid,
        #[serde(default)]
        prefill_search: Option<String>,
    },
    SetRecipientSource {
        source: Option<RecipientSource>,
    },
}

/// Dados derivados que algumas transições precisam (ex: a tag mais frequente).
#[derive(Debug, Clone, Default)]
pub struct WizardContext {
    pub top_tag: Option<String>,
}

pub fn reduce(state: WizardState, action: WizardAction, ctx: &WizardContext) -> WizardState {
    match action {
        WizardAction::SelectPreset { preset } => select_preset(state, preset, ctx),

        WizardAction::ApplyCriteria { criteria, preset } => {
            let criteria = criteria.normalized();
            let preset = preset.or(if criteria.is_all() { Some(AudiencePreset::All) } else { None });
            WizardState {
                recipient_source: Some(RecipientSource::Specific),
                preset,
                criteria,
                selected_contact_ids: Vec::new(),
                ..state
            }
        }

        WizardAction::ToggleContact { contact_id } => {
            if state.recipient_source == Some(RecipientSource::Test) {
                return state;
            }
            let mut selected = state.selected_contact_ids;
            if let Some(pos) = selected.iter().position(|id| *id == contact_id) {
                selected.remove(pos);
            } else {
                selected.push(contact_id);
            }
            WizardState {
                recipient_source: Some(RecipientSource::Specific),
                preset: Some(AudiencePreset::Manual),
                selected_contact_ids: selected,
                ..state
            }
        }

        WizardAction::SetSearch { term } => WizardState { contact_search: term, ..state },

        WizardAction::PickOneContact { contact_id, prefill_search } => {
            if state.recipient_source == Some(RecipientSource::Test) {
                return state;
            }
            let mut next = select_preset(state, AudiencePreset::Manual, ctx);
            if let Some(term) = prefill_search {
                next.contact_search = term;
            }
            if !next.selected_contact_ids.contains(&contact_id) {
                next.selected_contact_ids.push(contact_id);
            }
            next
        }

        WizardAction::SetRecipientSource { source } => {
            WizardState { recipient_source: source, ..state }
        }
    }
}

fn select_preset(state: WizardState, preset: AudiencePreset, ctx: &WizardContext) -> WizardState {
    match preset {
        AudiencePreset::Test => WizardState {
            recipient_source: Some(RecipientSource::Test),
            preset: Some(preset),
            ..state
        },
        AudiencePreset::Manual => WizardState {
            recipient_source: Some(RecipientSource::Specific),
            preset: Some(preset),
            ..state
        },
        AudiencePreset::All => WizardState {
            recipient_source: Some(RecipientSource::All),
            preset: Some(preset),
            criteria: AudienceCriteria::all(),
            selected_contact_ids: Vec::new(),
            ..state
        },
        _ => {
            let criteria = audience_service::preset_criteria(preset, ctx.top_tag.as_deref())
                .unwrap_or_default();
            WizardState {
                recipient_source: Some(RecipientSource::Specific),
                preset: Some(preset),
                criteria,
                selected_contact_ids: Vec::new(),
                ..state
            }
        }
    }
}

/// Quem de fato recebe, conforme a origem escolhida.
/// Em `test` só o contato de teste configurado recebe.
pub fn recipients(
    state: &WizardState,
    contacts: &[Contact],
    test_contact: Option<&Contact>,
    now: DateTime<Utc>,
) -> Vec<Contact> {
    match state.recipient_source {
        None => Vec::new(),
        Some(RecipientSource::Test) => test_contact.cloned().into_iter().collect(),
        Some(RecipientSource::All) => audience_service::filter(contacts, &AudienceCriteria::all(), now),
        Some(RecipientSource::Specific) if state.preset == Some(AudiencePreset::Manual) => contacts
            .iter()
            .filter(|c| state.selected_contact_ids.contains(&c.id) && !c.is_opted_out())
            .cloned()
            .collect(),
        Some(RecipientSource::Specific) => audience_service::filter(contacts, &state.criteria, now),
    }
}

// =============================================================================
//  PASSO DO ASSISTENTE (estado + ação -> novo estado + números)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardRequest {
    #[serde(default)]
    pub state: WizardState,
    #[serde(default)]
    pub action: Option<WizardAction>,
    #[serde(default)]
    pub template_category: Option<MessageCategory>,
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 5.0)]
    pub exchange_rate: Option<Decimal>,
    // Limite diário de mensagens do número (tier da Meta)
    #[serde(default)]
    #[schema(example = 1000)]
    pub current_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WizardResponse {
    pub state: WizardState,
    pub preview: AudiencePreview,
    pub recipient_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingBreakdown>,
    pub limit: LimitCheck,
    // Resultado da busca da seleção manual (ids)
    pub matching_contact_ids: Vec<Uuid>,
}

pub const DEFAULT_DAILY_LIMIT: usize = 250;

/// Aplica a ação (se houver) e recalcula prévia, destinatários, custo e limite.
pub fn evaluate(
    request: WizardRequest,
    contacts: &[Contact],
    definitions: &[CustomFieldDefinition],
    test_contact: Option<&Contact>,
    default_exchange_rate: Decimal,
    now: DateTime<Utc>,
) -> WizardResponse {
    // A tag mais frequente é sempre calculada sobre "todos"
    let all_eligible = audience_service::filter(contacts, &AudienceCriteria::all(), now);
    let ctx = WizardContext { top_tag: audience_service::aggregate(&all_eligible).top_tag };

    let state = match request.action {
        Some(action) => reduce(request.state, action, &ctx),
        None => request.state,
    };

    let (_, preview) = audience_service::preview(contacts, &state.criteria, definitions, now);
    let recipient_count = recipients(&state, contacts, test_contact, now).len();
    let pricing = request.template_category.map(|category| {
        pricing_breakdown(category, recipient_count, request.exchange_rate.or(Some(default_exchange_rate)))
    });
    let limit = check_limit(recipient_count, request.current_limit.unwrap_or(DEFAULT_DAILY_LIMIT));
    let matching_contact_ids = search_contacts(contacts, &state.contact_search)
        .into_iter()
        .map(|c| c.id)
        .collect();

    WizardResponse { state, preview, recipient_count, pricing, limit, matching_contact_ids }
}

/// Busca simples por nome, telefone ou e-mail (lista de seleção manual).
pub fn search_contacts<'a>(contacts: &'a [Contact], term: &str) -> Vec<&'a Contact> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return contacts.iter().collect();
    }
    contacts
        .iter()
        .filter(|c| {
            c.name.as_deref().is_some_and(|n| n.to_lowercase().contains(&term))
                || c.phone.contains(&term)
                || c.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&term))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audience::Refinement;
    use crate::models::contact::ContactStatus;
    use chrono::Duration;
    use serde_json::json;

    fn contact(name: &str, status: ContactStatus, tags: &[&str]) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            name: Some(name.to_string()),
            phone: "+5511999990000".into(),
            email: None,
            status,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            custom_fields: json!({}),
            created_at: Utc::now() - Duration::days(1),
        }
    }

    #[test]
    fn tag_top_preset_uses_context_tag() {
        let ctx = WizardContext { top_tag: Some("vip".into()) };
        let state = reduce(
            WizardState::default(),
            WizardAction::SelectPreset { preset: AudiencePreset::TagTop },
            &ctx,
        );
        assert_eq!(state.recipient_source, Some(RecipientSource::Specific));
        assert_eq!(state.criteria.refinement, Refinement::Tag { tag: "vip".into() });
    }

    #[test]
    fn toggling_a_contact_switches_to_manual() {
        let id = Uuid::new_v4();
        let ctx = WizardContext::default();
        let state = reduce(WizardState::default(), WizardAction::ToggleContact { contact_id: id }, &ctx);
        assert_eq!(state.preset, Some(AudiencePreset::Manual));
        assert_eq!(state.selected_contact_ids, vec![id]);

        let state = reduce(state, WizardAction::ToggleContact { contact_id: id }, &ctx);
        assert!(state.selected_contact_ids.is_empty());
    }

    #[test]
    fn test_source_ignores_contact_picks() {
        let ctx = WizardContext::default();
        let state = reduce(
            WizardState::default(),
            WizardAction::SelectPreset { preset: AudiencePreset::Test },
            &ctx,
        );
        let after = reduce(
            state.clone(),
            WizardAction::PickOneContact { contact_id: Uuid::new_v4(), prefill_search: Some("ana".into()) },
            &ctx,
        );
        assert_eq!(after, state);

        let tester = contact("Teste", ContactStatus::Unknown, &[]);
        let chosen = recipients(&state, &[contact("Ana", ContactStatus::OptIn, &[])], Some(&tester), Utc::now());
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id, tester.id);
        assert!(recipients(&state, &[], None, Utc::now()).is_empty());
    }

    #[test]
    fn applying_all_criteria_marks_all_preset() {
        let ctx = WizardContext::default();
        let state = reduce(
            WizardState::default(),
            WizardAction::ApplyCriteria { criteria: AudienceCriteria::all(), preset: None },
            &ctx,
        );
        assert_eq!(state.preset, Some(AudiencePreset::All));
    }

    #[test]
    fn manual_recipients_still_exclude_opt_out() {
        let ana = contact("Ana", ContactStatus::OptIn, &[]);
        let bia = contact("Bia", ContactStatus::OptOut, &[]);
        let contacts = vec![ana.clone(), bia.clone()];
        let ctx = WizardContext::default();

        let mut state = WizardState::default();
        for id in [ana.id, bia.id] {
            state = reduce(state, WizardAction::ToggleContact { contact_id: id }, &ctx);
        }

        let chosen = recipients(&state, &contacts, None, Utc::now());
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].id, ana.id);
    }

    #[test]
    fn segment_recipients_follow_criteria() {
        let contacts = vec![
            contact("Ana", ContactStatus::OptIn, &["vip"]),
            contact("Bia", ContactStatus::OptIn, &[]),
        ];
        let ctx = WizardContext::default();
        let state = reduce(
            WizardState::default(),
            WizardAction::SelectPreset { preset: AudiencePreset::NoTags },
            &ctx,
        );
        let chosen = recipients(&state, &contacts, None, Utc::now());
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].name.as_deref(), Some("Bia"));
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let contacts = vec![contact("Ana Souza", ContactStatus::OptIn, &[]), contact("Bia", ContactStatus::OptIn, &[])];
        let found = search_contacts(&contacts, "souza");
        assert_eq!(found.len(), 1);
        assert_eq!(search_contacts(&contacts, "  ").len(), 2);
    }

    #[test]
    fn evaluate_applies_action_and_prices_recipients() {
        let contacts = vec![
            contact("Ana", ContactStatus::OptIn, &["vip"]),
            contact("Bia", ContactStatus::OptIn, &["vip"]),
            contact("Caio", ContactStatus::OptOut, &["vip"]),
            contact("Duda", ContactStatus::Unknown, &[]),
        ];
        let request = WizardRequest {
            action: Some(WizardAction::SelectPreset { preset: AudiencePreset::TagTop }),
            template_category: Some(MessageCategory::Marketing),
            current_limit: Some(1),
            ..WizardRequest::default()
        };

        let response = evaluate(request, &contacts, &[], None, Decimal::new(500, 2), Utc::now());

        assert_eq!(response.state.criteria.refinement, Refinement::Tag { tag: "vip".into() });
        assert_eq!(response.recipient_count, 2);
        assert_eq!(response.preview.suppressed, 1);
        assert_eq!(response.preview.segment_label, "Tag: vip • 2 contatos");
        assert_eq!(response.pricing.map(|p| p.total_brl_formatted), Some("R$ 0,63".to_string()));
        assert!(response.limit.over_limit);
        assert_eq!(response.limit.suggested_batches, 2);
        assert_eq!(response.matching_contact_ids.len(), 4);
    }

    #[test]
    fn evaluate_survives_extreme_request_numbers() {
        let contacts = vec![
            contact("Ana", ContactStatus::OptIn, &[]),
            contact("Caio", ContactStatus::OptOut, &[]),
        ];
        let request = WizardRequest {
            state: WizardState {
                recipient_source: Some(RecipientSource::Specific),
                criteria: AudienceCriteria { created_within_days: Some(u32::MAX), ..AudienceCriteria::default() },
                ..WizardState::default()
            },
            template_category: Some(MessageCategory::Marketing),
            exchange_rate: Some(Decimal::MAX),
            current_limit: Some(usize::MAX),
            ..WizardRequest::default()
        };

        let response = evaluate(request, &contacts, &[], None, Decimal::new(500, 2), Utc::now());

        assert_eq!(response.recipient_count, 1);
        let pricing = response.pricing.unwrap();
        assert_eq!(pricing.exchange_rate, Decimal::new(500, 2));
        assert_eq!(pricing.total_brl_formatted, "R$ 0,31");
        assert!(!response.limit.over_limit);
        assert_eq!(response.limit.suggested_batches, 1);
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: WizardAction = serde_json::from_value(json!({
            "type": "selectPreset",
            "preset": "new_7d"
        }))
        .unwrap();
        assert_eq!(action, WizardAction::SelectPreset { preset: AudiencePreset::New7d });
    }
}
