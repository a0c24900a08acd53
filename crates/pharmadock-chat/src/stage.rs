//! Conversation stages and the facts gathered along the way.

use pharmadock_llm::Message;
use pharmadock_molecules::DockingOptions;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for the gene and drug to dock.
    GeneDrug,
    /// The gene has several structures; waiting for the user's pick.
    PdbSelection,
    /// Waiting for docking options (or acceptance of the defaults).
    Options,
    /// Options are known; the next step runs Vina.
    Docking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::GeneDrug => "gene_drug",
            Stage::PdbSelection => "pdb_selection",
            Stage::Options => "options",
            Stage::Docking => "docking",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DockingContext {
    pub gene: Option<String>,
    pub drug: Option<String>,
    pub pdb: Option<String>,
    pub options: Option<DockingOptions>,
    /// Messages sent to the assistant, oldest first.
    pub history: Vec<Message>,
}

impl DockingContext {
    /// Overwrite gene and drug with whatever was newly extracted.
    pub fn merge_gene_drug(&mut self, gene: Option<String>, drug: Option<String>) {
        if gene.is_some() {
            self.gene = gene;
        }
        if drug.is_some() {
            self.drug = drug;
        }
    }
}
