use anyhow::{anyhow, Context, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Locales shipped with the bot
pub const SUPPORTED_LOCALES: &[&str] = &["en", "ru"];

const EMBEDDED_RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("ru", include_str!("../locales/ru/main.ftl")),
];

/// Localization manager for the gatekeeper texts
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
    default_language: String,
}

impl std::fmt::Debug for LocalizationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut languages: Vec<&String> = self.bundles.keys().collect();
        languages.sort();
        f.debug_struct("LocalizationManager")
            .field("languages", &languages)
            .field("default_language", &self.default_language)
            .finish()
    }
}

impl LocalizationManager {
    /// Create a manager from the resources compiled into the binary
    pub fn with_default_language(default_language: &str) -> Result<Self> {
        let mut bundles = HashMap::new();
        for (locale_str, source) in EMBEDDED_RESOURCES {
            bundles.insert(
                locale_str.to_string(),
                Self::create_bundle(locale_str, source.to_string())?,
            );
        }
        Self::from_bundles(bundles, default_language)
    }

    /// Load `<dir>/<locale>/main.ftl` for every supported locale.
    ///
    /// Locales without a file are skipped; the default locale must be present.
    pub fn from_dir(dir: &Path, default_language: &str) -> Result<Self> {
        let mut bundles = HashMap::new();
        for locale_str in SUPPORTED_LOCALES {
            let resource_path = dir.join(locale_str).join("main.ftl");
            let content = match fs::read_to_string(&resource_path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(
                        path = %resource_path.display(),
                        error = %e,
                        "Skipping locale without resource file"
                    );
                    continue;
                }
            };
            bundles.insert(
                locale_str.to_string(),
                Self::create_bundle(locale_str, content)
                    .with_context(|| format!("Failed to load {}", resource_path.display()))?,
            );
        }
        Self::from_bundles(bundles, default_language)
    }

    fn from_bundles(
        bundles: HashMap<String, FluentBundle<FluentResource>>,
        default_language: &str,
    ) -> Result<Self> {
        if !bundles.contains_key(default_language) {
            return Err(anyhow!(
                "Default language '{}' has no translations",
                default_language
            ));
        }
        Ok(Self {
            bundles,
            default_language: default_language.to_string(),
        })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale_str: &str, source: String) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = locale_str.parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Links and names are interpolated into plain Telegram text
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source)
            .map_err(|(_, errors)| anyhow!("Invalid FTL for '{}': {:?}", locale_str, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate FTL entries for '{}': {:?}", locale_str, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        // A locale missing the key falls back to the default locale
        let preferred = self.bundles.get(language);
        let fallback = self.bundles.get(&self.default_language);
        let Some((bundle, msg)) = preferred
            .into_iter()
            .chain(fallback)
            .find_map(|bundle| bundle.get_message(key).map(|msg| (bundle, msg)))
        else {
            return format!("Missing translation: {}", key);
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Pick a supported language from a Telegram language code ("ru-RU" -> "ru")
    pub fn detect_language(&self, language_code: Option<&str>) -> String {
        if let Some(code) = language_code {
            let lang = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
            if self.is_language_supported(&lang) {
                return lang;
            }
        }

        self.default_language.clone()
    }
}

/// Create the shared localization manager with `default_language` as fallback.
///
/// `LOCALES_DIR` points at an alternate set of `.ftl` files; without it the
/// compiled-in texts are used.
pub fn create_localization_manager_with_default(
    default_language: &str,
) -> Result<Arc<LocalizationManager>> {
    let manager = match std::env::var("LOCALES_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            LocalizationManager::from_dir(Path::new(&dir), default_language)?
        }
        _ => LocalizationManager::with_default_language(default_language)?,
    };
    Ok(Arc::new(manager))
}

/// Convenience function to get a localized message in the user's language
pub fn t_lang(manager: &LocalizationManager, key: &str, language_code: Option<&str>) -> String {
    let language = manager.detect_language(language_code);
    manager.get_message_in_language(key, &language, None)
}

/// Convenience function to get a localized message with arguments in the user's language
pub fn t_args_lang(
    manager: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language_code: Option<&str>,
) -> String {
    let language = manager.detect_language(language_code);
    manager.get_message_with_args_in_language(key, &language, args)
}
