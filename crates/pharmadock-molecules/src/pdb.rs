//! RCSB structure fetching into the docking input directory.

use anyhow::{Context, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const RCSB_DOWNLOAD_URL: &str = "https://files.rcsb.org/download";

/// Case-insensitive existence check for `file_name` inside `dir`.
pub(crate) async fn find_file(dir: &Path, file_name: &str) -> Result<Option<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.eq_ignore_ascii_case(file_name) {
            return Ok(Some(name.into_owned()));
        }
    }
    Ok(None)
}

/// Downloads `<ID>.pdb` files once and remembers them.
pub struct StructureFetcher {
    client: Client,
    base_url: String,
    input_dir: PathBuf,
    fetched: Mutex<HashMap<String, String>>,
}

impl StructureFetcher {
    pub fn new(input_dir: impl AsRef<Path>) -> Self {
        Self::with_base_url(input_dir, RCSB_DOWNLOAD_URL)
    }

    pub fn with_base_url(input_dir: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            input_dir: input_dir.as_ref().to_path_buf(),
            fetched: Mutex::new(HashMap::new()),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Return the file name (relative to the input dir) of the structure,
    /// downloading it when neither the memo nor the directory has it.
    pub async fn fetch_pdb(&self, pdb_id: &str) -> Result<String> {
        let mut fetched = self.fetched.lock().await;
        if let Some(file) = fetched.get(pdb_id) {
            debug!("PDB {} already fetched, skipping download", pdb_id);
            return Ok(file.clone());
        }

        let file_name = format!("{}.pdb", pdb_id);
        if let Some(existing) = find_file(&self.input_dir, &file_name).await? {
            debug!("PDB {} found in {:?}, skipping download", pdb_id, self.input_dir);
            fetched.insert(pdb_id.to_string(), existing.clone());
            return Ok(existing);
        }

        info!("Fetching PDB {} from {}", pdb_id, self.base_url);
        let url = format!("{}/{}", self.base_url, file_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("downloading PDB file {}", file_name))?;
        let content = response.bytes().await?;

        fs::create_dir_all(&self.input_dir).await?;
        fs::write(self.input_dir.join(&file_name), content).await?;
        debug!("File {} downloaded", file_name);

        fetched.insert(pdb_id.to_string(), file_name.clone());
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_existing_file_is_reused_case_insensitively() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1pth.pdb"), "ATOM").await.unwrap();

        // Unroutable base URL: any download attempt would fail.
        let fetcher = StructureFetcher::with_base_url(dir.path(), "http://127.0.0.1:9");
        let file = fetcher.fetch_pdb("1PTH").await.unwrap();
        assert_eq!(file, "1pth.pdb");

        // Second call hits the memo even after the file is gone.
        fs::remove_file(dir.path().join("1pth.pdb")).await.unwrap();
        assert_eq!(fetcher.fetch_pdb("1PTH").await.unwrap(), "1pth.pdb");
    }

    #[tokio::test]
    async fn test_download_failure_is_an_error() {
        let dir = tempdir().unwrap();
        let fetcher = StructureFetcher::with_base_url(dir.path(), "http://127.0.0.1:9");
        assert!(fetcher.fetch_pdb("9XYZ").await.is_err());
    }

    #[tokio::test]
    async fn test_find_file_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(find_file(&missing, "a.pdb").await.unwrap(), None);
    }
}
