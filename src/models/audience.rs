// src/models/audience.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
//  CRITÉRIOS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    OptIn,
    OptOut,
    Unknown,
    #[default]
    All,
}

/// Predicado sobre um campo personalizado do contato.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CustomFieldPredicate {
    /// Valor presente e não vazio.
    Exists,
    /// Igualdade exata (case-sensitive).
    Equals { value: String },
}

/// O refinamento "ativo" do segmento. Só pode existir um por vez.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Refinement {
    #[default]
    None,
    Tag {
        #[schema(example = "vip")]
        tag: String,
    },
    Country {
        #[schema(example = "55")]
        ddi: String,
    },
    State {
        #[schema(example = "SP")]
        uf: String,
    },
    CustomField {
        #[schema(example = "plano")]
        key: String,
        predicate: CustomFieldPredicate,
    },
}

impl Refinement {
    pub fn tag(tag: &str) -> Self {
        Refinement::Tag { tag: tag.to_string() }.normalized()
    }

    pub fn country(ddi: &str) -> Self {
        Refinement::Country { ddi: ddi.to_string() }.normalized()
    }

    pub fn state(uf: &str) -> Self {
        Refinement::State { uf: uf.to_string() }.normalized()
    }

    pub fn custom_field(key: &str, predicate: CustomFieldPredicate) -> Self {
        Refinement::CustomField { key: key.to_string(), predicate }.normalized()
    }

    /// Limpa espaços, o '+' do DDI e a caixa da UF. Valores vazios viram `None`.
    pub fn normalized(self) -> Self {
        match self {
            Refinement::Tag { tag } => {
                let tag = tag.trim();
                if tag.is_empty() {
                    Refinement::None
                } else {
                    Refinement::Tag { tag: tag.to_string() }
                }
            }
            Refinement::Country { ddi } => {
                let ddi: String = ddi.trim().trim_start_matches('+').chars().filter(|c| c.is_ascii_digit()).collect();
                if ddi.is_empty() {
                    Refinement::None
                } else {
                    Refinement::Country { ddi }
                }
            }
            Refinement::State { uf } => {
                let uf = uf.trim().to_uppercase();
                if uf.is_empty() {
                    Refinement::None
                } else {
                    Refinement::State { uf }
                }
            }
            Refinement::CustomField { key, predicate } => {
                let key = key.trim();
                if key.is_empty() {
                    Refinement::None
                } else {
                    Refinement::CustomField { key: key.to_string(), predicate }
                }
            }
            Refinement::None => Refinement::None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudienceCriteria {
    #[serde(default)]
    pub status: StatusFilter,

    #[serde(default)]
    pub no_tags: bool,

    // Janela de recência em dias (inclusiva)
    #[serde(default)]
    #[schema(example = 7)]
    pub created_within_days: Option<u32>,

    #[serde(default)]
    pub refinement: Refinement,
}

impl AudienceCriteria {
    /// Todos os contatos elegíveis (exclui apenas opt-out).
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement.normalized();
        self
    }

    pub fn normalized(&self) -> Self {
        Self {
            status: self.status,
            no_tags: self.no_tags,
            created_within_days: self.created_within_days.filter(|d| *d > 0),
            refinement: self.refinement.clone().normalized(),
        }
    }

    /// Nenhum refinamento além de "todos".
    pub fn is_all(&self) -> bool {
        let c = self.normalized();
        c.status == StatusFilter::All
            && !c.no_tags
            && c.created_within_days.is_none()
            && c.refinement == Refinement::None
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum AudiencePreset {
    #[serde(rename = "opt_in")]
    OptIn,
    #[serde(rename = "new_7d")]
    New7d,
    #[serde(rename = "tag_top")]
    TagTop,
    #[serde(rename = "no_tags")]
    NoTags,
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "test")]
    Test,
}

// =============================================================================
//  ESTATÍSTICAS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DdiCount {
    pub ddi: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UfCount {
    pub uf: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CustomFieldCount {
    pub key: String,
    pub count: usize,
}

// Derivado: recalculado a cada chamada, nunca persistido
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudienceStats {
    pub eligible: usize,
    pub opt_in_eligible: usize,
    pub no_tags_eligible: usize,
    pub top_tag: Option<String>,
    pub top_tag_eligible: usize,
    pub tag_counts: Vec<TagCount>,
    pub ddi_counts: Vec<DdiCount>,
    pub uf_counts: Vec<UfCount>,
    pub custom_field_counts: Vec<CustomFieldCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudiencePreview {
    pub total_contacts: usize,
    // Contatos opt-out da lista (nunca recebem)
    pub suppressed: usize,
    pub stats: AudienceStats,
    #[schema(example = "Tag: vip • 3 contatos")]
    pub segment_label: String,
    pub is_all_criteria: bool,
}

// =============================================================================
//  PAYLOADS
// =============================================================================

/// `preset` tem prioridade; sem nenhum dos dois, vale "todos".
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudiencePreviewRequest {
    #[serde(default)]
    pub criteria: Option<AudienceCriteria>,
    #[serde(default)]
    pub preset: Option<AudiencePreset>,
}
