//! LLM router: holds the configured backends and sends each request to the
//! default backend, retrying once on the fallback when the failure is
//! transient.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{
    AnthropicBackend, ChatCompletionsBackend, LlmBackend, LlmError, LlmRequest, LlmResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ollama,
    OpenAi,
    OpenAiCompatible,
    Anthropic,
}

/// Everything needed to construct one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub name: String,
    pub kind: BackendKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    pub default_backend: String,
    pub fallback_backend: Option<String>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self { default_backend: "openai".to_string(), fallback_backend: None }
    }
}

pub struct LlmRouter {
    backends: HashMap<String, Arc<dyn LlmBackend>>,
    policy: RoutingPolicy,
}

impl LlmRouter {
    pub fn new(policy: RoutingPolicy) -> Self {
        Self { backends: HashMap::new(), policy }
    }

    pub fn register_backend(&mut self, name: impl Into<String>, backend: Arc<dyn LlmBackend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn registered_backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn backend(&self, name: &str) -> Result<&Arc<dyn LlmBackend>, LlmError> {
        self.backends
            .get(name)
            .ok_or_else(|| LlmError::Unavailable(format!("backend '{}' not configured", name)))
    }

    /// Send to the default backend; on a retryable failure try the fallback.
    pub async fn route(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let primary = self.backend(&self.policy.default_backend);
        let err = match primary {
            Ok(backend) => {
                tracing::debug!(model = backend.model_id(), is_local = backend.is_local(), "LLM request routed");
                match backend.complete(req.clone()).await {
                    Ok(resp) => return Ok(resp),
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        let Some(fallback_name) = self.policy.fallback_backend.as_deref() else {
            return Err(err);
        };
        if !err.is_retryable() || fallback_name == self.policy.default_backend {
            return Err(err);
        }

        tracing::warn!(error = %err, fallback = fallback_name, "primary LLM backend failed, using fallback");
        let fallback = self.backend(fallback_name)?;
        fallback.complete(req).await
    }
}

#[async_trait]
impl LlmBackend for LlmRouter {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.route(req).await
    }

    fn model_id(&self) -> &str {
        self.backends
            .get(&self.policy.default_backend)
            .map(|b| b.model_id())
            .unwrap_or("unconfigured")
    }

    fn is_local(&self) -> bool {
        self.backends
            .get(&self.policy.default_backend)
            .map(|b| b.is_local())
            .unwrap_or(false)
    }
}

/// Build a router from backend descriptions.
pub fn build_router(configs: Vec<BackendConfig>, policy: RoutingPolicy) -> LlmRouter {
    let mut router = LlmRouter::new(policy);
    for cfg in configs {
        let backend: Arc<dyn LlmBackend> = match cfg.kind {
            BackendKind::Ollama => Arc::new(ChatCompletionsBackend::ollama(
                cfg.base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
                cfg.model,
            )),
            BackendKind::OpenAi => Arc::new(ChatCompletionsBackend::openai(
                cfg.api_key.unwrap_or_default(),
                cfg.model,
            )),
            BackendKind::OpenAiCompatible => Arc::new(ChatCompletionsBackend::compatible(
                cfg.base_url.unwrap_or_else(|| "http://localhost:1234".to_string()),
                cfg.model,
                cfg.api_key,
            )),
            BackendKind::Anthropic => Arc::new(AnthropicBackend::new(
                cfg.api_key.unwrap_or_default(),
                cfg.model,
            )),
        };
        router.register_backend(cfg.name, backend);
    }
    router
}
