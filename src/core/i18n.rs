//! # Localization
//!
//! Every string the UI shows comes from a static translation dictionary:
//!
//! ```json
//! {
//!   "languages": [{ "code": "en", "name": "English" }, { "code": "fr", "name": "Français" }],
//!   "translations": { "signin.title": ["Sign In", "Connexion"] }
//! }
//! ```
//!
//! Each key maps to one text per language, in the order of `languages`.
//! Lookups fall back to the first language, then to the key itself.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, error, info, warn};
use serde::Deserialize;

const BUILTIN_TRANSLATIONS: &str = include_str!("../../assets/translations.json");

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[derive(Deserialize, Debug)]
struct Dictionary {
    languages: Vec<Language>,
    #[serde(default)]
    translations: HashMap<String, Vec<String>>,
}

#[derive(Debug)]
pub enum TranslationError {
    Io(io::Error),
    Parse(serde_json::Error),
    NoLanguages,
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::Io(e) => write!(f, "translation file I/O error: {e}"),
            TranslationError::Parse(e) => write!(f, "translation file parse error: {e}"),
            TranslationError::NoLanguages => write!(f, "translation file lists no languages"),
        }
    }
}

impl std::error::Error for TranslationError {}

#[derive(Debug, Clone)]
pub struct Localizer {
    languages: Vec<Language>,
    translations: HashMap<String, Vec<String>>,
    active: usize,
}

impl Localizer {
    pub fn from_json(json: &str) -> Result<Self, TranslationError> {
        let dictionary: Dictionary = serde_json::from_str(json).map_err(TranslationError::Parse)?;
        if dictionary.languages.is_empty() {
            return Err(TranslationError::NoLanguages);
        }
        for (key, texts) in &dictionary.translations {
            if texts.len() != dictionary.languages.len() {
                debug!(
                    "Translation '{}' has {} entries for {} languages",
                    key,
                    texts.len(),
                    dictionary.languages.len()
                );
            }
        }
        Ok(Self {
            languages: dictionary.languages,
            translations: dictionary.translations,
            active: 0,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, TranslationError> {
        let json = fs::read_to_string(path).map_err(TranslationError::Io)?;
        let localizer = Self::from_json(&json)?;
        info!(
            "Loaded {} translations from {}",
            localizer.translations.len(),
            path.display()
        );
        Ok(localizer)
    }

    /// The dictionary compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_TRANSLATIONS).unwrap_or_else(|e| {
            error!("Built-in translations are invalid: {}", e);
            Self {
                languages: vec![Language {
                    code: "en".to_string(),
                    name: "English".to_string(),
                }],
                translations: HashMap::new(),
                active: 0,
            }
        })
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn active(&self) -> &Language {
        &self.languages[self.active]
    }

    /// Switches language. Unknown codes leave the active language unchanged.
    pub fn set_active(&mut self, code: &str) -> bool {
        match self.languages.iter().position(|lang| lang.code == code) {
            Some(index) => {
                self.active = index;
                true
            }
            None => {
                warn!("Unknown language '{}', keeping {}", code, self.active().code);
                false
            }
        }
    }

    /// Moves to the next language, wrapping around.
    pub fn cycle(&mut self) -> &Language {
        self.active = (self.active + 1) % self.languages.len();
        self.active()
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        let Some(texts) = self.translations.get(key) else {
            return key;
        };
        texts
            .get(self.active)
            .filter(|text| !text.is_empty())
            .or_else(|| texts.first())
            .map_or(key, String::as_str)
    }

    /// Like [`t`](Self::t), replacing `{name}` placeholders with the given values.
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.t(key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}
