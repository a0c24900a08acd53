//! Ligand preparation: 3D SDF files built from catalog SMILES.
//!
//! Conversion is delegated to an external program (Open Babel by default).
//! `{smiles}` and `{output}` in the configured arguments are substituted per
//! SMILES string; the per-molecule outputs are concatenated into `<drug>.sdf`.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::pdb::find_file;

pub const DEFAULT_CONVERTER: &str = "obabel";

pub fn default_converter_args() -> Vec<String> {
    ["-:{smiles}", "-osdf", "--gen3d", "-h", "-O", "{output}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// File-system friendly drug file stem.
pub fn drug_file_name(drug: &str) -> String {
    let stem: String = drug
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}.sdf", stem)
}

pub struct LigandBuilder {
    program: String,
    args: Vec<String>,
    input_dir: PathBuf,
    built: Mutex<HashMap<String, String>>,
}

impl LigandBuilder {
    pub fn new(input_dir: impl AsRef<Path>) -> Self {
        Self::with_converter(input_dir, DEFAULT_CONVERTER, default_converter_args())
    }

    pub fn with_converter(
        input_dir: impl AsRef<Path>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            input_dir: input_dir.as_ref().to_path_buf(),
            built: Mutex::new(HashMap::new()),
        }
    }

    fn command_args(&self, smiles: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{smiles}", smiles).replace("{output}", &output))
            .collect()
    }

    async fn convert(&self, smiles: &str, output: &Path) -> Result<String> {
        let out = Command::new(&self.program)
            .args(self.command_args(smiles, output))
            .output()
            .await?;
        if !out.status.success() {
            bail!("{} failed: {}", self.program, String::from_utf8_lossy(&out.stderr).trim());
        }
        let block = fs::read_to_string(output).await?;
        let _ = fs::remove_file(output).await;
        if block.trim().is_empty() {
            bail!("{} produced no molecule", self.program);
        }
        Ok(block)
    }

    /// Return the SDF file name for `drug`, converting `smiles` when the file
    /// is neither memoized nor already present in the input directory.
    pub async fn build(&self, drug: &str, smiles: &[String]) -> Result<String> {
        let mut built = self.built.lock().await;
        if let Some(file) = built.get(drug) {
            debug!("Drug file for {} already built, skipping", drug);
            return Ok(file.clone());
        }

        let file_name = drug_file_name(drug);
        if let Some(existing) = find_file(&self.input_dir, &file_name).await? {
            debug!("Drug file {} already exists, skipping", existing);
            built.insert(drug.to_string(), existing.clone());
            return Ok(existing);
        }

        fs::create_dir_all(&self.input_dir).await?;
        let mut sdf = String::new();
        for (idx, smi) in smiles.iter().enumerate() {
            let scratch = self.input_dir.join(format!(".{}.{}.sdf", file_name, idx));
            match self.convert(smi, &scratch).await {
                Ok(block) => {
                    sdf.push_str(block.trim_end());
                    sdf.push('\n');
                }
                Err(e) => warn!("The SMILES cannot be processed at index {}: {} ({})", idx, smi, e),
            }
        }

        if sdf.is_empty() {
            bail!("no usable SMILES for drug {}", drug);
        }

        fs::write(self.input_dir.join(&file_name), sdf).await?;
        info!("Drug file {} created", file_name);
        built.insert(drug.to_string(), file_name.clone());
        Ok(file_name)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn fake_converter(dir: &Path) -> LigandBuilder {
        let script = "test '{smiles}' != bad && printf 'mol {smiles}\\nM  END\\n$$$$\\n' > '{output}'";
        LigandBuilder::with_converter(dir, "sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_drug_file_name_sanitizes_separators() {
        assert_eq!(drug_file_name("Aspirin"), "Aspirin.sdf");
        assert_eq!(drug_file_name("a/b\\c"), "a_b_c.sdf");
    }

    #[test]
    fn test_default_args_substitution() {
        let builder = LigandBuilder::new("in");
        let args = builder.command_args("CCO", Path::new("in/x.sdf"));
        assert_eq!(args, vec!["-:CCO", "-osdf", "--gen3d", "-h", "-O", "in/x.sdf"]);
    }

    #[tokio::test]
    async fn test_build_concatenates_and_skips_bad_smiles() {
        let dir = tempdir().unwrap();
        let builder = fake_converter(dir.path());
        let smiles = vec!["CCO".to_string(), "bad".to_string(), "CCN".to_string()];

        let file = builder.build("Ethanol", &smiles).await.unwrap();
        assert_eq!(file, "Ethanol.sdf");

        let content = fs::read_to_string(dir.path().join(&file)).await.unwrap();
        assert!(content.contains("mol CCO"));
        assert!(content.contains("mol CCN"));
        assert!(!content.contains("mol bad"));
        assert_eq!(content.matches("$$$$").count(), 2);
    }

    #[tokio::test]
    async fn test_build_fails_when_nothing_converts() {
        let dir = tempdir().unwrap();
        let builder = fake_converter(dir.path());
        assert!(builder.build("Nothing", &["bad".to_string()]).await.is_err());
        assert!(builder.build("Empty", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_existing_file_is_reused() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ASPIRIN.sdf"), "cached").await.unwrap();
        let builder = LigandBuilder::with_converter(dir.path(), "false", vec![]);
        assert_eq!(builder.build("Aspirin", &[]).await.unwrap(), "ASPIRIN.sdf");
    }
}
