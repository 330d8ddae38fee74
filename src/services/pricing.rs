// src/services/pricing.rs
//
// Estimativa de custo de envio (tabela da Meta para o Brasil, em USD por mensagem)
// e checagem do limite diário do número.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(500, 0, 0, false, 2); // 5.00

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCategory {
    Marketing,
    Utility,
    Authentication,
}

impl MessageCategory {
    pub fn unit_price_usd(&self) -> Decimal {
        match self {
            MessageCategory::Marketing => Decimal::new(625, 4),
            MessageCategory::Utility => Decimal::new(68, 4),
            MessageCategory::Authentication => Decimal::new(315, 4),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub category: MessageCategory,
    pub recipients: usize,
    pub unit_usd: Decimal,
    pub total_usd: Decimal,
    pub exchange_rate: Decimal,
    pub total_brl: Decimal,
    #[schema(example = "R$ 31,25")]
    pub total_brl_formatted: String,
}

pub fn pricing_breakdown(
    category: MessageCategory,
    recipients: usize,
    exchange_rate: Option<Decimal>,
) -> PricingBreakdown {
    let unit_usd = category.unit_price_usd();
    // usize::MAX * 0.0625 cabe com folga em Decimal
    let total_usd = unit_usd * Decimal::from(recipients);

    let requested = exchange_rate.filter(|r| *r > Decimal::ZERO);
    let (exchange_rate, total_brl) = match requested.and_then(|r| total_usd.checked_mul(r).map(|brl| (r, brl))) {
        Some(converted) => converted,
        None => {
            if let Some(rate) = requested {
                tracing::warn!(%rate, recipients, "Câmbio fora da faixa; usando o padrão");
            }
            (DEFAULT_EXCHANGE_RATE, total_usd * DEFAULT_EXCHANGE_RATE)
        }
    };
    let total_brl = total_brl.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    PricingBreakdown {
        category,
        recipients,
        unit_usd,
        total_usd,
        exchange_rate,
        total_brl,
        total_brl_formatted: format_brl(total_brl),
    }
}

/// "R$ 1.234,56"
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    format!(
        "{}R$ {},{}",
        if negative { "-" } else { "" },
        group_thousands(int_part),
        frac_part
    )
}

/// "12480" -> "12.480"
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
//  LIMITE DIÁRIO
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    pub current_limit: usize,
    pub recipients: usize,
    pub over_limit: bool,
    pub excess: usize,
    // Quantas campanhas menores seriam necessárias
    pub suggested_batches: usize,
}

pub fn check_limit(recipients: usize, current_limit: usize) -> LimitCheck {
    let over_limit = current_limit > 0 && recipients > current_limit;
    LimitCheck {
        current_limit,
        recipients,
        over_limit,
        excess: recipients.saturating_sub(current_limit),
        suggested_batches: if current_limit == 0 { 0 } else { recipients.div_ceil(current_limit) },
    }
}
