//! Text lookup by language.

use parking_lot::RwLock;

use hearth_core::Value;
use hearth_store::Store;

/// Language keys held in a store shaped `{ lang: { key: text } }`.
///
/// Lookups read the store's current data, so keys loaded after the
/// `Languages` was created are picked up.
pub struct Languages {
    store: Store,
    lang: RwLock<String>,
}

impl Languages {
    pub fn new(store: Store, lang: impl Into<String>) -> Self {
        Self {
            store,
            lang: RwLock::new(lang.into()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Text for `key` in the current language.
    ///
    /// Keys are matched lowercased. An unknown key is returned as given.
    pub fn text(&self, key: &str) -> String {
        let lang = self.lang.read().clone();
        self.store
            .to_plain()
            .get(&lang)
            .and_then(|keys| keys.get(&key.to_lowercase()))
            .and_then(Value::as_str)
            .map_or_else(|| key.to_string(), str::to_string)
    }

    pub fn set_lang(&self, lang: impl Into<String>) {
        *self.lang.write() = lang.into();
    }

    pub fn lang(&self) -> String {
        self.lang.read().clone()
    }

    /// Languages present in the keys.
    pub fn all_languages(&self) -> Vec<String> {
        self.store
            .to_plain()
            .as_map()
            .map(|langs| langs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use hearth_core::ClassRegistry;
    use hearth_store::{store_base_definition, StoreConfig};

    fn keys() -> Value {
        Value::from(btree! {
            "en".to_string() => Value::from(btree! {
                "welcome".to_string() => Value::from("Welcome"),
            }),
            "de".to_string() => Value::from(btree! {
                "welcome".to_string() => Value::from("Willkommen"),
            }),
        })
    }

    fn languages() -> Languages {
        let registry = ClassRegistry::new();
        registry.replace(store_base_definition());
        let store = Store::new(&registry, StoreConfig::with_data(keys()), None).unwrap();
        Languages::new(store, "en")
    }

    #[test]
    fn keys_are_matched_lowercased() {
        let languages = languages();
        assert_eq!(languages.text("Welcome"), "Welcome");
        assert_eq!(languages.text("WELCOME"), "Welcome");
    }

    #[test]
    fn unknown_key_falls_back_to_itself() {
        let languages = languages();
        assert_eq!(languages.text("Goodbye"), "Goodbye");
        languages.set_lang("fr");
        assert_eq!(languages.text("welcome"), "welcome");
    }

    #[test]
    fn switching_language() {
        let languages = languages();
        languages.set_lang("de");
        assert_eq!(languages.lang(), "de");
        assert_eq!(languages.text("welcome"), "Willkommen");
        assert_eq!(languages.all_languages(), vec!["de", "en"]);
    }
}
