// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

pub const DEFAULT_LANG: &str = "pt";

// Catálogos embutidos no binário
const CATALOGS: &[(&str, &str)] = &[
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Mensagens traduzidas, indexadas por idioma e depois por chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de idioma '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs: Arc::new(catalogs) })
    }

    /// Idioma pedido -> idioma padrão -> a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, detail: &str) -> String {
        self.translate(lang, key).replace("{detail}", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_in_requested_language() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("en", "agent_not_found"), "Agent not found");
        assert_eq!(store.translate("pt", "agent_not_found"), "Agente não encontrado");
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("de", "agent_not_found"), "Agente não encontrado");
    }

    #[test]
    fn unknown_key_returns_the_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("pt", "no_such_key"), "no_such_key");
    }

    #[test]
    fn substitutes_detail_placeholder() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate_with("pt", "ai_agent_test_failed", "timeout"),
            "Erro ao testar agente: timeout"
        );
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let pt = &store.catalogs["pt"];
        let en = &store.catalogs["en"];
        let mut missing: Vec<_> = pt.keys().filter(|k| !en.contains_key(*k)).collect();
        missing.extend(en.keys().filter(|k| !pt.contains_key(*k)));
        assert!(missing.is_empty(), "chaves sem tradução: {:?}", missing);
    }
}
