//! Provider → model catalog.
//!
//! The set of providers and the models each one permits is configuration
//! data, kept as a table here so growing it never touches orchestration
//! code. The settings dialog and the assistant client both validate
//! against this table.

pub struct ProviderModels {
    pub provider: &'static str,
    pub models: &'static [&'static str],
}

pub const PROVIDERS: &[ProviderModels] = &[
    ProviderModels {
        provider: "openai",
        models: &["gpt-3.5-turbo", "gpt-4-0125-preview", "gpt-4-turbo-preview"],
    },
    ProviderModels {
        provider: "anthropic",
        models: &["claude-v1", "claude-3-5-sonnet-20240620"],
    },
    ProviderModels {
        provider: "azure",
        models: &["gpt-35-turbo"],
    },
];

/// All known provider names, in display order.
pub fn provider_names() -> impl Iterator<Item = &'static str> {
    PROVIDERS.iter().map(|p| p.provider)
}

/// Models the given provider permits, or `None` for an unknown provider.
pub fn models_for(provider: &str) -> Option<&'static [&'static str]> {
    PROVIDERS
        .iter()
        .find(|p| p.provider == provider)
        .map(|p| p.models)
}

/// First listed model for a provider, used when the user switches provider
/// and the previous model no longer applies.
pub fn default_model_for(provider: &str) -> Option<&'static str> {
    models_for(provider).and_then(|m| m.first().copied())
}

pub fn is_allowed(provider: &str, model: &str) -> bool {
    models_for(provider).is_some_and(|models| models.contains(&model))
}
