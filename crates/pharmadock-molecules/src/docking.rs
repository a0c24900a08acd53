//! Molecular docking using AutoDock Vina inside a Docker container.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::options::DockingOptions;

pub const DEFAULT_DOCKER_BINARY: &str = "docker";
pub const DEFAULT_VINA_IMAGE: &str = "cafernandezlo/dock-tools:v1.0";

/// Wrapper for `docker run ... vina`.
///
/// The input directory is mounted at `/input` and the output directory at
/// `/output`; the image's `vina` entry point reads the receptor and ligand
/// from the former and writes poses, logs and the prepared receptor to the
/// latter.
#[derive(Debug, Clone)]
pub struct VinaRunner {
    docker_binary: String,
    image: String,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

impl VinaRunner {
    pub fn new(input_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
            image: DEFAULT_VINA_IMAGE.to_string(),
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn with_docker_binary(mut self, binary: impl Into<String>) -> Self {
        self.docker_binary = binary.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn command_args(
        &self,
        receptor_file: &str,
        ligand_file: &str,
        options: &DockingOptions,
    ) -> Result<Vec<String>> {
        let input = absolute(&self.input_dir)?;
        let output = absolute(&self.output_dir)?;
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:/input", input.display()),
            "-v".to_string(),
            format!("{}:/output", output.display()),
            self.image.clone(),
            "vina".to_string(),
            receptor_file.to_string(),
            ligand_file.to_string(),
        ];
        args.extend(options.to_args());
        Ok(args)
    }

    /// Run Vina on files already present in the input directory.
    pub async fn run(&self, receptor_file: &str, ligand_file: &str, options: &DockingOptions) -> Result<()> {
        tokio::fs::create_dir_all(&self.input_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let args = self.command_args(receptor_file, ligand_file, options)?;
        info!("Running AutoDock Vina on {} / {}", receptor_file, ligand_file);
        debug!("Executing docking command: {} {}", self.docker_binary, args.join(" "));

        let output = Command::new(&self.docker_binary).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Error executing docking: {}", stderr.trim());
            bail!("AutoDock Vina failed: {}", stderr.trim());
        }

        debug!("Docking completed: {}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}
