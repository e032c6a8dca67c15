//! User-facing strings.
//!
//! A [`Language`] is an opaque dictionary from message key to
//! [`Translation`]. Some entries are plain text, others are templates that
//! format a [`TranslationArgs`] record (for example the selection limit).
//!
//! The locale is never detected here: callers pass an explicit tag to
//! [`Language::for_locale`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use horizon_select_core::logging::targets;

/// Arguments available to template translations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslationArgs {
    /// Configured maximum (selection limit or input length).
    pub maximum: usize,
    /// Configured minimum input length.
    pub minimum: usize,
    /// Current input text.
    pub input: String,
}

impl TranslationArgs {
    /// Arguments carrying only a maximum.
    pub fn maximum(maximum: usize) -> Self {
        Self {
            maximum,
            ..Self::default()
        }
    }

    /// Arguments carrying a minimum and the current input.
    pub fn minimum(minimum: usize, input: impl Into<String>) -> Self {
        Self {
            minimum,
            input: input.into(),
            ..Self::default()
        }
    }
}

/// Template function for a translation.
pub type TemplateFn = Arc<dyn Fn(&TranslationArgs) -> String + Send + Sync>;

/// A single entry in a language table.
#[derive(Clone)]
pub enum Translation {
    /// Fixed text.
    Text(String),
    /// Text computed from arguments.
    Template(TemplateFn),
}

impl Translation {
    /// Create a template translation from a closure.
    pub fn template<F>(f: F) -> Self
    where
        F: Fn(&TranslationArgs) -> String + Send + Sync + 'static,
    {
        Self::Template(Arc::new(f))
    }

    fn render(&self, args: &TranslationArgs) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Template(f) => f(args),
        }
    }
}

impl fmt::Debug for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Template(_) => f.write_str("Template(..)"),
        }
    }
}

impl From<&str> for Translation {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Message keys used by the engine.
pub mod keys {
    pub const ERROR_LOADING: &str = "errorLoading";
    pub const INPUT_TOO_LONG: &str = "inputTooLong";
    pub const INPUT_TOO_SHORT: &str = "inputTooShort";
    pub const LOADING_MORE: &str = "loadingMore";
    pub const MAXIMUM_SELECTED: &str = "maximumSelected";
    pub const NO_RESULTS: &str = "noResults";
    pub const SEARCHING: &str = "searching";
    pub const REMOVE_ALL_ITEMS: &str = "removeAllItems";
    pub const REMOVE_ITEM: &str = "removeItem";
    pub const SEARCH: &str = "search";
}

/// A dictionary of user-facing strings.
#[derive(Clone, Debug, Default)]
pub struct Language {
    entries: HashMap<String, Translation>,
}

impl Language {
    /// Create an empty table. Every lookup falls back to the key itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set or replace an entry.
    pub fn set(&mut self, key: impl Into<String>, translation: impl Into<Translation>) {
        self.entries.insert(key.into(), translation.into());
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, translation: impl Into<Translation>) -> Self {
        self.set(key, translation);
        self
    }

    /// Whether the table has an entry for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Render `key` with `args`, or return the key if the table has no entry.
    pub fn translate(&self, key: &str, args: &TranslationArgs) -> String {
        match self.entries.get(key) {
            Some(translation) => translation.render(args),
            None => {
                tracing::debug!(target: targets::SELECT, key, "missing translation");
                key.to_string()
            }
        }
    }

    /// Pick a built-in table for a BCP-47 style tag such as `"de-AT"`.
    ///
    /// Unknown languages fall back to English.
    pub fn for_locale(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" => Self::german(),
            "fr" => Self::french(),
            "es" => Self::spanish(),
            _ => Self::english(),
        }
    }

    /// English strings.
    pub fn english() -> Self {
        Self::empty()
            .with(keys::ERROR_LOADING, "The results could not be loaded.")
            .with(
                keys::INPUT_TOO_LONG,
                Translation::template(|args| {
                    let over = args.input.chars().count().saturating_sub(args.maximum);
                    let plural = if over == 1 { "" } else { "s" };
                    format!("Please delete {over} character{plural}")
                }),
            )
            .with(
                keys::INPUT_TOO_SHORT,
                Translation::template(|args| {
                    let remaining = args.minimum.saturating_sub(args.input.chars().count());
                    format!("Please enter {remaining} or more characters")
                }),
            )
            .with(keys::LOADING_MORE, "Loading more results…")
            .with(
                keys::MAXIMUM_SELECTED,
                Translation::template(|args| {
                    let plural = if args.maximum == 1 { "" } else { "s" };
                    format!("You can only select {} item{plural}", args.maximum)
                }),
            )
            .with(keys::NO_RESULTS, "No results found")
            .with(keys::SEARCHING, "Searching…")
            .with(keys::REMOVE_ALL_ITEMS, "Remove all items")
            .with(keys::REMOVE_ITEM, "Remove item")
            .with(keys::SEARCH, "Search")
    }

    /// German strings.
    pub fn german() -> Self {
        Self::empty()
            .with(keys::ERROR_LOADING, "Die Ergebnisse konnten nicht geladen werden.")
            .with(
                keys::INPUT_TOO_LONG,
                Translation::template(|args| {
                    let over = args.input.chars().count().saturating_sub(args.maximum);
                    format!("Bitte {over} Zeichen weniger eingeben")
                }),
            )
            .with(
                keys::INPUT_TOO_SHORT,
                Translation::template(|args| {
                    let remaining = args.minimum.saturating_sub(args.input.chars().count());
                    format!("Bitte {remaining} Zeichen mehr eingeben")
                }),
            )
            .with(keys::LOADING_MORE, "Lade mehr Ergebnisse…")
            .with(
                keys::MAXIMUM_SELECTED,
                Translation::template(|args| {
                    let noun = if args.maximum == 1 { "Eintrag" } else { "Einträge" };
                    format!("Sie können nur {} {noun} auswählen", args.maximum)
                }),
            )
            .with(keys::NO_RESULTS, "Keine Übereinstimmungen gefunden")
            .with(keys::SEARCHING, "Suche…")
            .with(keys::REMOVE_ALL_ITEMS, "Entferne alle Elemente")
            .with(keys::REMOVE_ITEM, "Element entfernen")
            .with(keys::SEARCH, "Suchen")
    }

    /// French strings.
    pub fn french() -> Self {
        Self::empty()
            .with(keys::ERROR_LOADING, "Les résultats ne peuvent pas être chargés.")
            .with(
                keys::INPUT_TOO_LONG,
                Translation::template(|args| {
                    let over = args.input.chars().count().saturating_sub(args.maximum);
                    let plural = if over > 1 { "s" } else { "" };
                    format!("Supprimez {over} caractère{plural}")
                }),
            )
            .with(
                keys::INPUT_TOO_SHORT,
                Translation::template(|args| {
                    let remaining = args.minimum.saturating_sub(args.input.chars().count());
                    let plural = if remaining > 1 { "s" } else { "" };
                    format!("Saisissez au moins {remaining} caractère{plural}")
                }),
            )
            .with(keys::LOADING_MORE, "Chargement de résultats supplémentaires…")
            .with(
                keys::MAXIMUM_SELECTED,
                Translation::template(|args| {
                    let plural = if args.maximum > 1 { "s" } else { "" };
                    format!(
                        "Vous pouvez seulement sélectionner {} élément{plural}",
                        args.maximum
                    )
                }),
            )
            .with(keys::NO_RESULTS, "Aucun résultat trouvé")
            .with(keys::SEARCHING, "Recherche en cours…")
            .with(keys::REMOVE_ALL_ITEMS, "Supprimer tous les éléments")
            .with(keys::REMOVE_ITEM, "Supprimer l'élément")
            .with(keys::SEARCH, "Rechercher")
    }

    /// Spanish strings.
    pub fn spanish() -> Self {
        Self::empty()
            .with(keys::ERROR_LOADING, "No se pudieron cargar los resultados")
            .with(
                keys::INPUT_TOO_LONG,
                Translation::template(|args| {
                    let over = args.input.chars().count().saturating_sub(args.maximum);
                    let noun = if over == 1 { "carácter" } else { "caracteres" };
                    format!("Por favor, elimine {over} {noun}")
                }),
            )
            .with(
                keys::INPUT_TOO_SHORT,
                Translation::template(|args| {
                    let remaining = args.minimum.saturating_sub(args.input.chars().count());
                    let noun = if remaining == 1 { "carácter" } else { "caracteres" };
                    format!("Por favor, introduzca {remaining} {noun}")
                }),
            )
            .with(keys::LOADING_MORE, "Cargando más resultados…")
            .with(
                keys::MAXIMUM_SELECTED,
                Translation::template(|args| {
                    let noun = if args.maximum == 1 { "elemento" } else { "elementos" };
                    format!("Sólo puede seleccionar {} {noun}", args.maximum)
                }),
            )
            .with(keys::NO_RESULTS, "No se encontraron resultados")
            .with(keys::SEARCHING, "Buscando…")
            .with(keys::REMOVE_ALL_ITEMS, "Eliminar todos los elementos")
            .with(keys::REMOVE_ITEM, "Eliminar elemento")
            .with(keys::SEARCH, "Buscar")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximum_selected_pluralises() {
        let lang = Language::english();
        assert_eq!(
            lang.translate(keys::MAXIMUM_SELECTED, &TranslationArgs::maximum(1)),
            "You can only select 1 item"
        );
        assert_eq!(
            lang.translate(keys::MAXIMUM_SELECTED, &TranslationArgs::maximum(2)),
            "You can only select 2 items"
        );
    }

    #[test]
    fn test_input_too_short_counts_remaining() {
        let lang = Language::english();
        let args = TranslationArgs::minimum(3, "a");
        assert_eq!(
            lang.translate(keys::INPUT_TOO_SHORT, &args),
            "Please enter 2 or more characters"
        );
    }

    #[test]
    fn test_missing_key_returns_key() {
        let lang = Language::empty();
        assert_eq!(lang.translate("noResults", &TranslationArgs::default()), "noResults");
    }

    #[test]
    fn test_for_locale() {
        let args = TranslationArgs::default();
        assert_eq!(
            Language::for_locale("de-AT").translate(keys::SEARCH, &args),
            "Suchen"
        );
        assert_eq!(
            Language::for_locale("fr_CA").translate(keys::SEARCH, &args),
            "Rechercher"
        );
        assert_eq!(
            Language::for_locale("ja").translate(keys::SEARCH, &args),
            "Search"
        );
    }

    #[test]
    fn test_override_entry() {
        let lang = Language::english().with(keys::NO_RESULTS, "Nothing here");
        assert_eq!(
            lang.translate(keys::NO_RESULTS, &TranslationArgs::default()),
            "Nothing here"
        );
    }

    #[test]
    fn test_builtin_tables_cover_every_key() {
        let all = [
            keys::ERROR_LOADING,
            keys::INPUT_TOO_LONG,
            keys::INPUT_TOO_SHORT,
            keys::LOADING_MORE,
            keys::MAXIMUM_SELECTED,
            keys::NO_RESULTS,
            keys::SEARCHING,
            keys::REMOVE_ALL_ITEMS,
            keys::REMOVE_ITEM,
            keys::SEARCH,
        ];
        for lang in [
            Language::english(),
            Language::german(),
            Language::french(),
            Language::spanish(),
        ] {
            for key in all {
                assert!(lang.contains(key), "missing {key}");
            }
        }
    }
}
