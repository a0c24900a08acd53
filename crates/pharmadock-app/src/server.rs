//! Server wiring: docking pipeline, catalogs, conversations, web state.

use std::sync::Arc;
use std::time::Duration;

use pharmadock_chat::{ChatServices, ConversationSettings, SessionRegistry};
use pharmadock_config::Config;
use pharmadock_molecules::catalog::Catalogs;
use pharmadock_molecules::docking::VinaRunner;
use pharmadock_molecules::ligand::LigandBuilder;
use pharmadock_molecules::pdb::StructureFetcher;
use pharmadock_molecules::results::ResultStore;
use pharmadock_molecules::VinaDockingService;
use pharmadock_web::state::AppState;
use tracing::{info, warn};

use crate::backends::build_llm_backends;

pub fn docking_service(config: &Config) -> VinaDockingService {
    let d = &config.docking;
    if d.output_dir.is_absolute() {
        warn!(
            output_dir = %d.output_dir.display(),
            "docking.output_dir is absolute; the file endpoints only serve paths relative to server.file_root"
        );
    }
    VinaDockingService::new(
        StructureFetcher::with_base_url(&d.input_dir, d.rcsb_base_url.clone()),
        LigandBuilder::with_converter(&d.input_dir, config.ligand.program.clone(), config.ligand.args.clone()),
        VinaRunner::new(&d.input_dir, &d.output_dir)
            .with_docker_binary(d.docker_binary.clone())
            .with_image(d.vina_image.clone()),
        ResultStore::new(&d.output_dir),
    )
}

pub fn conversation_settings(config: &Config) -> ConversationSettings {
    ConversationSettings {
        extraction_timeout: Duration::from_secs(config.chat.extraction_timeout_secs),
        idle_timeout: Duration::from_secs(config.chat.idle_timeout_secs),
        temperature: config.llm.temperature,
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let llm = build_llm_backends(config);
    info!("LLM router ready: {} backends registered.", llm.registered_backends().len());

    let catalogs = match Catalogs::load(&config.catalog.drug_db, &config.catalog.genes_db).await {
        Ok(c) => {
            info!(drugs = c.drugs.len(), genes = c.genes.len(), "Catalogs loaded");
            c
        }
        Err(e) => {
            warn!("Could not load catalogs: {e:#}");
            warn!("The assistant will run without drug and gene context.");
            Catalogs::default()
        }
    };

    let services = Arc::new(ChatServices {
        llm: Arc::new(llm),
        docking: Arc::new(docking_service(config)),
        catalogs: Arc::new(catalogs),
    });
    let registry = SessionRegistry::new(
        services,
        conversation_settings(config),
        Duration::from_secs(config.chat.reply_timeout_secs),
    );
    AppState::from_config(config, Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_settings_follow_config() {
        let config = Config::from_toml(
            r#"
            [chat]
            idle_timeout_secs = 30
            extraction_timeout_secs = 7
            [llm]
            temperature = 0.5
            "#,
        )
        .unwrap();
        let settings = conversation_settings(&config);
        assert_eq!(settings.idle_timeout, Duration::from_secs(30));
        assert_eq!(settings.extraction_timeout, Duration::from_secs(7));
        assert_eq!(settings.temperature, 0.5);
    }

    #[tokio::test]
    async fn test_missing_catalogs_still_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.catalog.drug_db = dir.path().join("missing_drugs.csv");
        config.catalog.genes_db = dir.path().join("missing_genes.csv");
        config.server.template_dir = dir.path().join("templates");
        let state = build_state(&config).await.unwrap();
        assert!(state.templates.get_template("chat.html").is_ok());
    }
}
