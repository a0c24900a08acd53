//! Shared application state for the web server.

use std::path::PathBuf;
use std::sync::Arc;

use minijinja::Environment;
use pharmadock_chat::SessionRegistry;
use pharmadock_config::Config;

use crate::templates;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub templates: Environment<'static>,
    /// Docking file and log paths are resolved under this directory.
    pub file_root: PathBuf,
    /// Relative to `file_root`; only paths inside it are served.
    pub docking_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Typed out on the landing page.
    pub landing_messages: Vec<String>,
}

impl AppState {
    /// State for the `[server]`, `[docking]` and `[landing]` sections of `config`.
    pub fn from_config(config: &Config, registry: Arc<SessionRegistry>) -> anyhow::Result<Self> {
        let templates = templates::environment(Some(&config.server.template_dir))?;
        let landing_messages = config.landing.messages.clone().unwrap_or_else(|| {
            tracing::warn!("landing.messages not set, the landing banner stays empty");
            Vec::new()
        });
        Ok(Self {
            registry,
            templates,
            file_root: config.server.file_root.clone(),
            docking_dir: config.docking.output_dir.clone(),
            static_dir: config.server.static_dir.clone(),
            landing_messages,
        })
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;
    use pharmadock_chat::{ChatServices, ConversationSettings};
    use std::time::Duration;

    #[test]
    fn test_from_config_uses_server_section() {
        let config = Config::from_toml(
            r#"
            [server]
            file_root = "/srv/pharmadock"
            template_dir = "/nonexistent/templates"

            [docking]
            output_dir = "results"

            [landing]
            messages = ["a", "b", "c", "d"]
            "#,
        )
        .unwrap();
        let services = Arc::new(ChatServices {
            llm: Arc::new(pharmadock_llm::LlmRouter::new(Default::default())),
            docking: Arc::new(pharmadock_molecules::VinaDockingService::new(
                pharmadock_molecules::pdb::StructureFetcher::new("in"),
                pharmadock_molecules::ligand::LigandBuilder::new("in"),
                pharmadock_molecules::docking::VinaRunner::new("in", "out"),
                pharmadock_molecules::results::ResultStore::new("out"),
            )),
            catalogs: Arc::new(Default::default()),
        });
        let registry = Arc::new(SessionRegistry::new(services, ConversationSettings::default(), Duration::from_secs(5)));

        let state = AppState::from_config(&config, registry).unwrap();
        assert_eq!(state.file_root, PathBuf::from("/srv/pharmadock"));
        assert_eq!(state.docking_dir, PathBuf::from("results"));
        assert_eq!(state.landing_messages.len(), 4);
        assert!(state.templates.get_template("home.html").is_ok());
    }
}
