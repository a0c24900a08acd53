//! Drug and gene catalogs backing the assistant.
//!
//! drug_db.csv:  Name, Description, SMILES
//! genes_db.csv: hgnc_symbol, gene_name, gene_description, pdb (`;`-separated ids)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "SMILES")]
    pub smiles: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub hgnc_symbol: String,
    #[serde(default)]
    pub gene_name: String,
    #[serde(default)]
    pub gene_description: String,
    #[serde(default)]
    pub pdb: String,
}

fn read_records<T, R>(reader: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

async fn read_file_records<T>(path: &Path) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading catalog {}", path.display()))?;
    read_records(content.as_bytes())
}

// ── Drugs ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DrugCatalog {
    records: Vec<DrugRecord>,
}

impl DrugCatalog {
    pub fn new(records: Vec<DrugRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(read_records(reader)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let records = read_file_records(path.as_ref()).await?;
        info!("Loaded {} drugs from {}", records.len(), path.as_ref().display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive match on the drug name.
    pub fn lookup(&self, name: &str) -> Vec<&DrugRecord> {
        let name = name.trim();
        self.records
            .iter()
            .filter(|r| r.name.eq_ignore_ascii_case(name))
            .collect()
    }

    /// Every SMILES string recorded for the drug.
    pub fn smiles_for(&self, name: &str) -> Vec<String> {
        self.lookup(name).into_iter().map(|r| r.smiles.clone()).collect()
    }
}

// ── Genes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GeneCatalog {
    records: Vec<GeneRecord>,
}

impl GeneCatalog {
    pub fn new(records: Vec<GeneRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::new(read_records(reader)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let records = read_file_records(path.as_ref()).await?;
        info!("Loaded {} genes from {}", records.len(), path.as_ref().display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive match on either the HGNC symbol or the gene name.
    pub fn lookup(&self, gene: &str) -> Vec<&GeneRecord> {
        let gene = gene.trim();
        self.records
            .iter()
            .filter(|r| r.hgnc_symbol.eq_ignore_ascii_case(gene) || r.gene_name.eq_ignore_ascii_case(gene))
            .collect()
    }

    /// PDB ids of the gene, matched on HGNC symbol only, in catalog order
    /// without duplicates.
    pub fn pdbs_for(&self, gene: &str) -> Vec<String> {
        let gene = gene.trim();
        let mut pdbs: Vec<String> = Vec::new();
        for record in self.records.iter().filter(|r| r.hgnc_symbol.eq_ignore_ascii_case(gene)) {
            for id in record.pdb.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                if !pdbs.iter().any(|p| p == id) {
                    pdbs.push(id.to_string());
                }
            }
        }
        debug!("Found {} PDBs for gene {}: {:?}", pdbs.len(), gene, pdbs);
        pdbs
    }
}

// ── Prompt rendering ──────────────────────────────────────────────────────────

pub fn render_drugs(records: &[&DrugRecord]) -> String {
    records
        .iter()
        .map(|r| format!("Name: {} | Description: {} | SMILES: {}", r.name, r.description, r.smiles))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_genes(records: &[&GeneRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "Symbol: {} | Name: {} | Description: {} | PDB: {}",
                r.hgnc_symbol, r.gene_name, r.gene_description, r.pdb
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Both catalogs, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub drugs: DrugCatalog,
    pub genes: GeneCatalog,
}

impl Catalogs {
    pub async fn load(drug_db: impl AsRef<Path>, genes_db: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            drugs: DrugCatalog::load(drug_db).await?,
            genes: GeneCatalog::load(genes_db).await?,
        })
    }
}
