//! One user's docking conversation.

use std::sync::Arc;
use std::time::Duration;

use pharmadock_common::{AssistantContent, ChatReply};
use pharmadock_llm::{extract, prompts, LlmBackend, LlmRequest, Message};
use pharmadock_molecules::catalog::{render_drugs, render_genes, Catalogs};
use pharmadock_molecules::{DockingArtifacts, DockingRequest, DockingService};
use tracing::{debug, error, info, warn};

use crate::options;
use crate::replies;
use crate::stage::{DockingContext, Stage};

/// Collaborators shared by every conversation.
pub struct ChatServices {
    pub llm: Arc<dyn LlmBackend>,
    pub docking: Arc<dyn DockingService>,
    pub catalogs: Arc<Catalogs>,
}

#[derive(Debug, Clone, Copy)]
pub struct ConversationSettings {
    pub extraction_timeout: Duration,
    pub idle_timeout: Duration,
    pub temperature: f32,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
            temperature: 0.2,
        }
    }
}

pub struct Conversation {
    services: Arc<ChatServices>,
    settings: ConversationSettings,
    stage: Stage,
    context: DockingContext,
}

impl Conversation {
    pub fn new(services: Arc<ChatServices>, settings: ConversationSettings) -> Self {
        Self { services, settings, stage: Stage::GeneDrug, context: DockingContext::default() }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn context(&self) -> &DockingContext {
        &self.context
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Process one user message and produce the reply for it.
    pub async fn handle_turn(&mut self, prompt: &str) -> ChatReply {
        debug!(stage = %self.stage, "processing user message");
        match self.stage {
            Stage::GeneDrug => self.gene_drug(prompt).await,
            Stage::PdbSelection => self.pdb_selection(prompt).await,
            Stage::Options => self.options(prompt).await,
            Stage::Docking => {
                self.context.history.push(Message::user(prompt));
                self.dock().await
            }
        }
    }

    fn transition(&mut self, stage: Stage) {
        debug!("Transition to {}", stage);
        self.stage = stage;
    }

    /// Run an extraction prompt on the user text alone.
    async fn extract(&self, system_prompt: String, prompt: &str) -> Result<String, ChatReply> {
        let req = LlmRequest::new(vec![Message::system(system_prompt), Message::user(prompt)])
            .with_temperature(self.settings.temperature);

        match tokio::time::timeout(self.settings.extraction_timeout, self.services.llm.complete(req)).await {
            Ok(Ok(resp)) => Ok(resp.content),
            Ok(Err(e)) => {
                error!("Error receiving the extraction: {}", e);
                Err(ChatReply::error(replies::PROCESSING_ERROR))
            }
            Err(_) => {
                error!("Extraction timeout");
                Err(ChatReply::error(replies::EXTRACTION_TIMEOUT))
            }
        }
    }

    /// Ask the assistant over the whole history and record its answer.
    async fn assistant_reply(&mut self) -> Result<String, ChatReply> {
        let req = LlmRequest::new(self.context.history.clone()).with_temperature(self.settings.temperature);
        match self.services.llm.complete(req).await {
            Ok(resp) => {
                self.context.history.push(Message::assistant(resp.content.clone()));
                Ok(resp.content)
            }
            Err(e) => {
                error!("Error generating the assistant response: {}", e);
                Err(ChatReply::error(replies::PROCESSING_ERROR))
            }
        }
    }

    async fn gene_drug(&mut self, prompt: &str) -> ChatReply {
        let extraction = match self.extract(prompts::gene_drug_extraction(), prompt).await {
            Ok(text) => text,
            Err(reply) => return reply,
        };
        let found = extract::gene_and_drug(&extraction);
        self.context.merge_gene_drug(found.protein, found.drug);
        debug!(gene = ?self.context.gene, drug = ?self.context.drug, "extracted gene and drug");

        let catalogs = Arc::clone(&self.services.catalogs);
        let drugs = self.context.drug.as_deref().map(|d| catalogs.drugs.lookup(d)).unwrap_or_default();
        let genes = self.context.gene.as_deref().map(|g| catalogs.genes.lookup(g)).unwrap_or_default();

        self.context.history.push(Message::system(prompts::user_interaction(
            &render_drugs(&drugs),
            &render_genes(&genes),
        )));
        self.context.history.push(Message::user(prompt));

        let summary = match self.assistant_reply().await {
            Ok(text) => text,
            Err(reply) => return reply,
        };

        if !drugs.is_empty() && !genes.is_empty() {
            let gene = self.context.gene.clone().unwrap_or_default();
            let pdbs = catalogs.genes.pdbs_for(&gene);
            match pdbs.as_slice() {
                [] => debug!("No PDBs for gene {}", gene),
                [only] => {
                    self.context.pdb = Some(only.clone());
                    self.transition(Stage::Options);
                }
                _ => self.transition(Stage::PdbSelection),
            }
        }

        ChatReply::content(summary)
    }

    async fn pdb_selection(&mut self, prompt: &str) -> ChatReply {
        self.context.history.push(Message::user(prompt));
        let extraction = match self.extract(prompts::pdb_extraction(), prompt).await {
            Ok(text) => text,
            Err(reply) => return reply,
        };
        let pdb = extract::pdb_id(&extraction);
        debug!(pdb = ?pdb, "extracted pdb");

        let reply = match self.assistant_reply().await {
            Ok(text) => text,
            Err(reply) => return reply,
        };

        match pdb {
            Some(pdb) => {
                self.context.pdb = Some(pdb);
                self.transition(Stage::Options);
            }
            None => warn!("No PDB identifier in the user's selection, asking again"),
        }
        ChatReply::content(reply)
    }

    async fn options(&mut self, prompt: &str) -> ChatReply {
        self.context.history.push(Message::user(prompt));
        let extraction = match self.extract(prompts::options_extraction(), prompt).await {
            Ok(text) => text,
            Err(reply) => return reply,
        };
        let Some(options) = options::from_reply(&extraction) else {
            error!("Could not read docking options from the extraction");
            return ChatReply::error(replies::PROCESSING_ERROR);
        };
        debug!(options = %options, "extracted options");

        self.context.options = Some(options);
        self.transition(Stage::Docking);
        self.dock().await
    }

    fn docking_request(&self) -> Option<DockingRequest> {
        let pdb = self.context.pdb.clone()?;
        let drug = self.context.drug.clone()?;
        let smiles = self.services.catalogs.drugs.smiles_for(&drug);
        Some(DockingRequest {
            pdb,
            drug,
            smiles,
            options: self.context.options.clone().unwrap_or_default(),
        })
    }

    async fn dock(&mut self) -> ChatReply {
        let Some(request) = self.docking_request() else {
            error!("Docking requested without a PDB structure and drug");
            return ChatReply::error(replies::DOCKING_ERROR);
        };

        info!(pdb = %request.pdb, drug = %request.drug, options = %request.options, "starting docking");
        let artifacts = match self.services.docking.dock(&request).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                error!("Docking failed: {:#}", e);
                return ChatReply::error(replies::DOCKING_ERROR);
            }
        };

        let content = match self.assistant_reply().await {
            Ok(text) => text,
            Err(reply) => return reply,
        };

        self.transition(Stage::GeneDrug);
        ChatReply::Content(with_artifacts(content, artifacts))
    }
}

fn with_artifacts(content: String, artifacts: DockingArtifacts) -> AssistantContent {
    AssistantContent {
        content,
        docking_result_log: Some(artifacts.log_file),
        receptor_file: Some(artifacts.receptor_file),
        ligand_file: Some(artifacts.ligand_file),
        pos_file: Some(artifacts.pos_file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalogs, FakeDocking, FakeLlm};
    use pretty_assertions::assert_eq;

    fn conversation(llm: impl Into<Arc<FakeLlm>>, docking: Arc<FakeDocking>) -> Conversation {
        let services = Arc::new(ChatServices { llm: llm.into(), docking, catalogs: Arc::new(catalogs()) });
        Conversation::new(services, ConversationSettings::default())
    }

    #[test]
    fn test_new_conversation_starts_at_gene_drug() {
        let conv = conversation(FakeLlm::new(), FakeDocking::ok());
        assert_eq!(conv.stage(), Stage::GeneDrug);
        assert_eq!(conv.context().pdb, None);
    }

    #[tokio::test]
    async fn test_single_pdb_goes_straight_to_options() {
        let llm = FakeLlm::new().gene_drug("EGFR", "Aspirin");
        let mut conv = conversation(llm, FakeDocking::ok());

        let reply = conv.handle_turn("Dock aspirin against EGFR").await;
        assert_eq!(reply, ChatReply::content("assistant says hi"));
        assert_eq!(conv.stage(), Stage::Options);
        assert_eq!(conv.context().pdb.as_deref(), Some("1M17"));
    }

    #[tokio::test]
    async fn test_several_pdbs_ask_for_selection() {
        let llm = FakeLlm::new().gene_drug("ptgs1", "aspirin").pdb("1EQG");
        let mut conv = conversation(llm, FakeDocking::ok());

        conv.handle_turn("aspirin with PTGS1").await;
        assert_eq!(conv.stage(), Stage::PdbSelection);
        assert_eq!(conv.context().pdb, None);

        conv.handle_turn("the second one").await;
        assert_eq!(conv.stage(), Stage::Options);
        assert_eq!(conv.context().pdb.as_deref(), Some("1EQG"));
    }

    #[tokio::test]
    async fn test_unknown_gene_stays_in_gene_drug() {
        let llm = FakeLlm::new().gene_drug("BRCA9", "Aspirin");
        let mut conv = conversation(llm, FakeDocking::ok());
        let reply = conv.handle_turn("BRCA9 + aspirin").await;
        assert!(!reply.is_error());
        assert_eq!(conv.stage(), Stage::GeneDrug);
    }

    #[tokio::test]
    async fn test_gene_without_structures_stays_in_gene_drug() {
        let llm = FakeLlm::new().gene_drug("TP53", "Aspirin");
        let mut conv = conversation(llm, FakeDocking::ok());
        conv.handle_turn("TP53 + aspirin").await;
        assert_eq!(conv.stage(), Stage::GeneDrug);
    }

    #[tokio::test]
    async fn test_options_run_docking_in_the_same_turn() {
        let llm = FakeLlm::new()
            .gene_drug("EGFR", "Aspirin")
            .options(r#"{"box_enveloping": "False", "padding": "4.0"}"#);
        let docking = FakeDocking::ok();
        let mut conv = conversation(llm, docking.clone());

        conv.handle_turn("EGFR and aspirin").await;
        let reply = conv.handle_turn("padding 4 please").await;

        let ChatReply::Content(content) = reply else { panic!("expected content") };
        assert_eq!(
            content.receptor_file.as_ref().map(|f| f.as_str()),
            Some("out/docking_result/1M17_Aspirin_receptor.pdbqt")
        );
        assert!(content.docking_result_log.is_some());
        assert_eq!(conv.stage(), Stage::GeneDrug);

        let requests = docking.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].options.as_command_string(), "--padding 4.0 --box_enveloping");
        assert_eq!(requests[0].smiles, vec!["CC(=O)OC1=CC=CC=C1C(=O)O".to_string()]);
    }

    #[tokio::test]
    async fn test_docking_failure_replies_error_and_retries_next_turn() {
        let llm = FakeLlm::new()
            .gene_drug("EGFR", "Aspirin")
            .options(r#"{"box_enveloping": true}"#);
        let docking = FakeDocking::failing();
        let mut conv = conversation(llm, docking.clone());

        conv.handle_turn("EGFR and aspirin").await;
        let reply = conv.handle_turn("defaults").await;
        assert_eq!(reply, ChatReply::error(replies::DOCKING_ERROR));
        assert_eq!(conv.stage(), Stage::Docking);

        conv.handle_turn("try again").await;
        assert_eq!(docking.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_llm_failure_replies_processing_error() {
        let mut conv = conversation(FakeLlm::broken(), FakeDocking::ok());
        let reply = conv.handle_turn("hello").await;
        assert_eq!(reply, ChatReply::error(replies::PROCESSING_ERROR));
        assert_eq!(conv.stage(), Stage::GeneDrug);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_extraction_times_out() {
        let llm = FakeLlm::new().gene_drug("EGFR", "Aspirin").extraction_delay(Duration::from_secs(120));
        let mut conv = conversation(llm, FakeDocking::ok());
        let reply = conv.handle_turn("EGFR and aspirin").await;
        assert_eq!(reply, ChatReply::error(replies::EXTRACTION_TIMEOUT));
    }

    #[tokio::test]
    async fn test_history_records_interaction_prompt() {
        let llm = FakeLlm::new().gene_drug("EGFR", "Aspirin");
        let mut conv = conversation(llm, FakeDocking::ok());
        conv.handle_turn("EGFR and aspirin").await;

        let roles: Vec<&str> = conv.context().history.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert!(conv.context().history[0].content.contains("1M17"));
    }
}
