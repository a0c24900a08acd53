//! LLM router from the `[llm]` config section.

use pharmadock_config::{Config, LlmProviderConfig};
use pharmadock_llm::router::{build_router, BackendConfig, BackendKind, LlmRouter, RoutingPolicy};

/// Key from the config, else from `PHARMADOCK_<PROVIDER>_API_KEY`.
fn api_key(provider: &LlmProviderConfig, env_var: &str) -> Option<String> {
    if !provider.api_key.is_empty() {
        return Some(provider.api_key.clone());
    }
    std::env::var(env_var).ok().filter(|k| !k.is_empty())
}

pub fn build_llm_backends(config: &Config) -> LlmRouter {
    let policy = RoutingPolicy {
        default_backend:  config.llm.default_backend.clone(),
        fallback_backend: config.llm.fallback_backend.clone(),
    };

    let mut backends: Vec<BackendConfig> = Vec::new();

    if let Some(ref ollama) = config.llm.ollama {
        backends.push(BackendConfig {
            name:     "ollama".to_string(),
            kind:     BackendKind::Ollama,
            model:    ollama.model.clone(),
            api_key:  None,
            base_url: ollama.base_url.clone(),
        });
    }

    for (name, kind, provider, env_var) in [
        ("openai", BackendKind::OpenAi, &config.llm.openai, "PHARMADOCK_OPENAI_API_KEY"),
        ("anthropic", BackendKind::Anthropic, &config.llm.anthropic, "PHARMADOCK_ANTHROPIC_API_KEY"),
    ] {
        let Some(provider) = provider else { continue };
        match api_key(provider, env_var) {
            Some(key) => backends.push(BackendConfig {
                name:     name.to_string(),
                kind,
                model:    provider.model.clone(),
                api_key:  Some(key),
                base_url: None,
            }),
            None => tracing::warn!("{} configured but no API key found (set llm.{}.api_key or {})", name, name, env_var),
        }
    }

    if let Some(ref compat) = config.llm.openai_compatible {
        backends.push(BackendConfig {
            name:     "openai_compatible".to_string(),
            kind:     BackendKind::OpenAiCompatible,
            model:    compat.model.clone(),
            api_key:  api_key(compat, "PHARMADOCK_COMPAT_API_KEY"),
            base_url: compat.base_url.clone(),
        });
    }

    if backends.is_empty() {
        tracing::warn!("No LLM backends configured! Add a provider to pharmadock.toml; every chat turn will fail.");
    }

    build_router(backends, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_without_keys_are_skipped() {
        let config = Config::from_toml(
            r#"
            [llm]
            default_backend = "ollama"
            [llm.ollama]
            model = "llama3:8b"
            [llm.anthropic]
            model = "claude"
            api_key = "k"
            [llm.openai]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        std::env::remove_var("PHARMADOCK_OPENAI_API_KEY");
        let router = build_llm_backends(&config);
        assert_eq!(router.registered_backends(), vec!["anthropic", "ollama"]);
    }
}
