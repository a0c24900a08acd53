//! The docking pipeline behind the chat's docking stage.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pharmadock_common::FileReference;
use std::path::Path;
use tracing::{error, info};

use crate::docking::VinaRunner;
use crate::ligand::LigandBuilder;
use crate::options::DockingOptions;
use crate::pdb::StructureFetcher;
use crate::results::{base_name, ResultFiles, ResultStore};

#[derive(Debug, Clone, PartialEq)]
pub struct DockingRequest {
    pub pdb: String,
    pub drug: String,
    /// Catalog SMILES of the drug, used when its SDF has to be built.
    pub smiles: Vec<String>,
    pub options: DockingOptions,
}

/// Server-relative paths of the four result files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockingArtifacts {
    pub receptor_file: FileReference,
    pub pos_file: FileReference,
    pub ligand_file: FileReference,
    pub log_file: FileReference,
}

#[async_trait]
pub trait DockingService: Send + Sync {
    async fn dock(&self, request: &DockingRequest) -> Result<DockingArtifacts>;
}

pub struct VinaDockingService {
    fetcher: StructureFetcher,
    ligands: LigandBuilder,
    runner: VinaRunner,
    results: ResultStore,
    served_prefix: String,
}

impl VinaDockingService {
    pub fn new(fetcher: StructureFetcher, ligands: LigandBuilder, runner: VinaRunner, results: ResultStore) -> Self {
        let served_prefix = results
            .output_dir()
            .to_string_lossy()
            .replace('\\', "/")
            .trim_end_matches('/')
            .to_string();
        Self { fetcher, ligands, runner, results, served_prefix }
    }

    fn served(&self, file: &str) -> FileReference {
        if self.served_prefix.is_empty() {
            FileReference::new(file)
        } else {
            FileReference::new(format!("{}/{}", self.served_prefix, file))
        }
    }

    fn artifacts(&self, files: &ResultFiles) -> DockingArtifacts {
        DockingArtifacts {
            receptor_file: self.served(&files.receptor),
            pos_file: self.served(&files.pose),
            ligand_file: self.served(&files.ligand),
            log_file: self.served(&files.log),
        }
    }
}

#[async_trait]
impl DockingService for VinaDockingService {
    async fn dock(&self, request: &DockingRequest) -> Result<DockingArtifacts> {
        let base = base_name(&request.pdb, &request.drug, &request.options);
        if let Some(files) = self.results.lookup(&base).await? {
            return Ok(self.artifacts(&files));
        }

        let receptor_file = self.fetcher.fetch_pdb(&request.pdb).await?;
        let ligand_file = self.ligands.build(&request.drug, &request.smiles).await?;
        self.runner.run(&receptor_file, &ligand_file, &request.options).await?;

        let receptor_stem = file_stem(&receptor_file);
        let ligand_stem = file_stem(&ligand_file);
        self.results.adopt_raw_outputs(&receptor_stem, &ligand_stem, &base).await;

        match self.results.lookup(&base).await? {
            Some(files) => {
                info!("Docking {} finished", base);
                Ok(self.artifacts(&files))
            }
            None => {
                error!("Docking failed. Unable to find results for {}", base);
                Err(anyhow!("docking produced no results for {}", base))
            }
        }
    }
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tokio::fs;

    fn service(root: &Path, docker: &str) -> VinaDockingService {
        let input = root.join("in");
        let output = root.join("out");
        VinaDockingService::new(
            StructureFetcher::with_base_url(&input, "http://127.0.0.1:9"),
            LigandBuilder::with_converter(&input, "false", vec![]),
            VinaRunner::new(&input, &output).with_docker_binary(docker),
            ResultStore::new(&output),
        )
    }

    fn request() -> DockingRequest {
        DockingRequest {
            pdb: "1PTH".to_string(),
            drug: "Aspirin".to_string(),
            smiles: vec!["CC(=O)OC1=CC=CC=C1C(=O)O".to_string()],
            options: DockingOptions::enveloping(),
        }
    }

    #[tokio::test]
    async fn test_existing_results_skip_docking() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("out")).await.unwrap();
        let expected = ResultFiles::expected("1PTH_Aspirin_box_enveloping");
        for f in [&expected.receptor, &expected.pose, &expected.ligand, &expected.log] {
            fs::write(dir.path().join("out").join(f), "x").await.unwrap();
        }

        // "false" as docker would fail if docking ran.
        let svc = service(dir.path(), "false");
        let artifacts = svc.dock(&request()).await.unwrap();
        let prefix = dir.path().join("out").to_string_lossy().replace('\\', "/");
        assert_eq!(
            artifacts.log_file.as_str(),
            format!("{}/1PTH_Aspirin_box_enveloping_vina.log", prefix)
        );
    }

    #[tokio::test]
    async fn test_fresh_docking_renames_outputs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::create_dir_all(&input).await.unwrap();
        fs::create_dir_all(&output).await.unwrap();
        fs::write(input.join("1PTH.pdb"), "ATOM").await.unwrap();
        fs::write(input.join("Aspirin.sdf"), "M  END").await.unwrap();
        // What the container would leave behind.
        for raw in ["1PTH.pdbqt", "1PTH_Aspirin_out.pdbqt", "1PTH_Aspirin_vina.log", "1PTH_Aspirin_out.pdbqt.sdf"] {
            fs::write(output.join(raw), raw).await.unwrap();
        }

        let svc = service(dir.path(), "true");
        let artifacts = svc.dock(&request()).await.unwrap();
        assert_eq!(artifacts.receptor_file.file_name(), "1PTH_Aspirin_box_enveloping_receptor.pdbqt");
        assert_eq!(artifacts.ligand_file.file_name(), "1PTH_Aspirin_box_enveloping_ligand.pdbqt.sdf");
    }

    #[tokio::test]
    async fn test_missing_outputs_fail() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(&input).await.unwrap();
        fs::write(input.join("1PTH.pdb"), "ATOM").await.unwrap();
        fs::write(input.join("Aspirin.sdf"), "M  END").await.unwrap();

        let svc = service(dir.path(), "true");
        assert!(svc.dock(&request()).await.is_err());
    }
}
