//! Fakes for the conversation's collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pharmadock_common::FileReference;
use pharmadock_llm::{prompts, LlmBackend, LlmError, LlmRequest, LlmResponse};
use pharmadock_molecules::catalog::{Catalogs, DrugCatalog, GeneCatalog};
use pharmadock_molecules::{DockingArtifacts, DockingRequest, DockingService};

const DRUGS: &str = "\
Name,Description,SMILES
Aspirin,COX inhibitor,CC(=O)OC1=CC=CC=C1C(=O)O
";

const GENES: &str = "\
hgnc_symbol,gene_name,gene_description,pdb
PTGS1,prostaglandin-endoperoxide synthase 1,COX-1,1PTH;1EQG
EGFR,epidermal growth factor receptor,Receptor tyrosine kinase,1M17
TP53,tumor protein p53,Tumour suppressor,
";

pub fn catalogs() -> Catalogs {
    Catalogs {
        drugs: DrugCatalog::from_reader(DRUGS.as_bytes()).unwrap(),
        genes: GeneCatalog::from_reader(GENES.as_bytes()).unwrap(),
    }
}

/// Answers extraction prompts with scripted JSON and everything else with a
/// fixed assistant line.
#[derive(Default)]
pub struct FakeLlm {
    gene_drug: String,
    pdb: String,
    options: String,
    extraction_delay: Option<Duration>,
    broken: bool,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self { gene_drug: "{}".into(), pdb: "{}".into(), options: "{}".into(), ..Default::default() }
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self { broken: true, ..Self::new() })
    }

    pub fn gene_drug(self, gene: &str, drug: &str) -> Self {
        Self { gene_drug: format!(r#"{{"protein": "{gene}", "drug": "{drug}"}}"#), ..self }
    }

    pub fn pdb(self, pdb: &str) -> Arc<Self> {
        Arc::new(Self { pdb: format!(r#"{{"pdb": "{pdb}"}}"#), ..self })
    }

    pub fn options(self, json: &str) -> Arc<Self> {
        Arc::new(Self { options: json.to_string(), ..self })
    }

    pub fn extraction_delay(self, delay: Duration) -> Arc<Self> {
        Arc::new(Self { extraction_delay: Some(delay), ..self })
    }
}

#[async_trait]
impl LlmBackend for FakeLlm {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        if self.broken {
            return Err(LlmError::ApiError { status: 500, message: "down".to_string() });
        }

        let system = req.messages.first().map(|m| m.content.clone()).unwrap_or_default();
        let scripted = if system == prompts::gene_drug_extraction() {
            Some(&self.gene_drug)
        } else if system == prompts::pdb_extraction() {
            Some(&self.pdb)
        } else if system == prompts::options_extraction() {
            Some(&self.options)
        } else {
            None
        };

        let content = match scripted {
            Some(json) => {
                if let Some(delay) = self.extraction_delay {
                    tokio::time::sleep(delay).await;
                }
                json.clone()
            }
            None => "assistant says hi".to_string(),
        };

        Ok(LlmResponse { content, model: "fake".to_string(), prompt_tokens: 0, completion_tokens: 0 })
    }

    fn model_id(&self) -> &str {
        "fake"
    }

    fn is_local(&self) -> bool {
        true
    }
}

pub struct FakeDocking {
    fail: bool,
    requests: Mutex<Vec<DockingRequest>>,
}

impl FakeDocking {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self { fail: false, requests: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, requests: Mutex::new(Vec::new()) })
    }

    pub fn requests(&self) -> Vec<DockingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DockingService for FakeDocking {
    async fn dock(&self, request: &DockingRequest) -> anyhow::Result<DockingArtifacts> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            anyhow::bail!("vina exploded");
        }
        let base = format!("out/docking_result/{}_{}", request.pdb, request.drug);
        Ok(DockingArtifacts {
            receptor_file: FileReference::new(format!("{base}_receptor.pdbqt")),
            pos_file: FileReference::new(format!("{base}_pos.pdbqt")),
            ligand_file: FileReference::new(format!("{base}_ligand.pdbqt.sdf")),
            log_file: FileReference::new(format!("{base}_vina.log")),
        })
    }
}
