//! Naming, discovery and caching of docking result files.

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::options::DockingOptions;
use crate::pdb::find_file;

pub const RECEPTOR_SUFFIX: &str = "_receptor.pdbqt";
pub const POSE_SUFFIX: &str = "_pos.pdbqt";
pub const LIGAND_SUFFIX: &str = "_ligand.pdbqt.sdf";
pub const LOG_SUFFIX: &str = "_vina.log";

/// `{pdb}_{drug}{suffix}`, the stem shared by every file of one docking.
pub fn base_name(pdb: &str, drug: &str, options: &DockingOptions) -> String {
    format!("{}_{}{}", pdb, drug, options.result_suffix())
}

/// File names (relative to the output dir) of a finished docking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFiles {
    pub receptor: String,
    pub pose: String,
    pub ligand: String,
    pub log: String,
}

impl ResultFiles {
    pub fn expected(base: &str) -> Self {
        Self {
            receptor: format!("{base}{RECEPTOR_SUFFIX}"),
            pose: format!("{base}{POSE_SUFFIX}"),
            ligand: format!("{base}{LIGAND_SUFFIX}"),
            log: format!("{base}{LOG_SUFFIX}"),
        }
    }
}

pub struct ResultStore {
    output_dir: PathBuf,
    found: Mutex<HashMap<String, ResultFiles>>,
}

impl ResultStore {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self { output_dir: output_dir.as_ref().to_path_buf(), found: Mutex::new(HashMap::new()) }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The result set for `base` if all four files exist.
    pub async fn lookup(&self, base: &str) -> Result<Option<ResultFiles>> {
        let mut found = self.found.lock().await;
        if let Some(files) = found.get(base) {
            debug!("Docking results for {} already known, skipping docking", base);
            return Ok(Some(files.clone()));
        }

        let expected = ResultFiles::expected(base);
        let (Some(receptor), Some(pose), Some(ligand), Some(log)) = (
            find_file(&self.output_dir, &expected.receptor).await?,
            find_file(&self.output_dir, &expected.pose).await?,
            find_file(&self.output_dir, &expected.ligand).await?,
            find_file(&self.output_dir, &expected.log).await?,
        ) else {
            return Ok(None);
        };

        debug!("Docking results for {} found on disk, skipping docking", base);
        let files = ResultFiles { receptor, pose, ligand, log };
        found.insert(base.to_string(), files.clone());
        Ok(Some(files))
    }

    /// Rename the raw Vina outputs for `pdb` + `ligand_stem` to the names
    /// derived from `base`. Missing raw files are left alone.
    pub async fn adopt_raw_outputs(&self, pdb: &str, ligand_stem: &str, base: &str) {
        let target = ResultFiles::expected(base);
        let mapping = [
            (format!("{pdb}.pdbqt"), target.receptor),
            (format!("{pdb}_{ligand_stem}_out.pdbqt"), target.pose),
            (format!("{pdb}_{ligand_stem}_vina.log"), target.log),
            (format!("{pdb}_{ligand_stem}_out.pdbqt.sdf"), target.ligand),
        ];

        for (raw, renamed) in mapping {
            let from = self.output_dir.join(&raw);
            if !fs::try_exists(&from).await.unwrap_or(false) {
                continue;
            }
            match fs::rename(&from, self.output_dir.join(&renamed)).await {
                Ok(()) => debug!("Renamed {} to {}", raw, renamed),
                Err(e) => error!("Error handling result file {}: {}", raw, e),
            }
        }
    }
}
