//! Fetches a docking result trio and shows it in a viewer container.
//!
//! A load never returns an error: failures end up as an inline message in
//! the container and a [`LoadOutcome::Failed`]. Each container keeps a
//! generation counter so a load that was overtaken by a newer one on the
//! same container finishes as [`LoadOutcome::Superseded`] and leaves the
//! container alone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pharmadock_common::{DockingFiles, FileReference};
use pharmadock_molecules::StructureFormat;
use tracing::{debug, error, warn};

use super::style::{apply_styles, TaggedModel};
use super::{MoleculeViewer, TextSource, ViewerContainer, ViewerFactory};
use crate::error::{ClientError, Result};

/// Payloads this short (or blank) are treated as missing.
pub const MIN_PAYLOAD_LEN: usize = 10;
pub const RENDER_SETTLE: Duration = Duration::from_millis(500);
pub const OVERLAY_FADE: Duration = Duration::from_millis(300);
pub const FALLBACK_SIZE: (u32, u32) = (800, 600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub models: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadSummary),
    Failed(String),
    Superseded,
    MissingContainer,
}

struct Payloads {
    receptor: String,
    ligand: String,
    pose: String,
}

fn check_payload(file: &FileReference, text: String) -> Result<String> {
    if text.trim().is_empty() || text.len() <= MIN_PAYLOAD_LEN {
        return Err(ClientError::InvalidPayload { file: file.to_string(), len: text.len() });
    }
    Ok(text)
}

fn effective_size((width, height): (u32, u32)) -> (u32, u32) {
    if width == 0 || height == 0 {
        FALLBACK_SIZE
    } else {
        (width, height)
    }
}

/// Receptor as model 0, ligand as model 1 with the poses as extra frames.
fn populate(viewer: &mut dyn MoleculeViewer, payloads: &Payloads) -> Result<LoadSummary> {
    let receptor = viewer.add_model(&payloads.receptor, StructureFormat::Pdbqt)?;
    let ligand = viewer.add_model(&payloads.ligand, StructureFormat::Sdf)?;
    viewer.add_frames(ligand, &payloads.pose, StructureFormat::Pdbqt)?;

    apply_styles(viewer, &[TaggedModel::receptor(receptor), TaggedModel::ligand(ligand)]);
    viewer.zoom_to();
    viewer.render();
    Ok(LoadSummary { models: viewer.model_count() })
}

pub struct ViewerLoader {
    factory: Arc<dyn ViewerFactory>,
    source: Arc<dyn TextSource>,
    render_settle: Duration,
    overlay_fade: Duration,
    generations: Mutex<HashMap<String, u64>>,
}

impl ViewerLoader {
    pub fn new(factory: Arc<dyn ViewerFactory>, source: Arc<dyn TextSource>) -> Self {
        Self {
            factory,
            source,
            render_settle: RENDER_SETTLE,
            overlay_fade: OVERLAY_FADE,
            generations: Mutex::new(HashMap::new()),
        }
    }

    fn begin(&self, host: &str) -> u64 {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        let generation = generations.entry(host.to_string()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_current(&self, host: &str, ticket: u64) -> bool {
        let generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        generations.get(host) == Some(&ticket)
    }

    async fn fetch_all(&self, files: &DockingFiles) -> Result<Payloads> {
        let (receptor, ligand, pose) = tokio::try_join!(
            self.source.fetch(&files.receptor),
            self.source.fetch(&files.ligand),
            self.source.fetch(&files.pose),
        )?;
        Ok(Payloads {
            receptor: check_payload(&files.receptor, receptor)?,
            ligand: check_payload(&files.ligand, ligand)?,
            pose: check_payload(&files.pose, pose)?,
        })
    }

    fn fail(&self, container: &dyn ViewerContainer, ticket: u64, err: ClientError) -> LoadOutcome {
        if !self.is_current(container.host_id(), ticket) {
            return LoadOutcome::Superseded;
        }
        error!(container = %container.host_id(), "Error loading molecules: {}", err);
        container.clear();
        container.show_error(&format!("Error loading molecules: {}", err));
        LoadOutcome::Failed(err.to_string())
    }

    /// Show `files` in `container` behind a loading overlay.
    pub async fn load(&self, container: &dyn ViewerContainer, files: &DockingFiles) -> LoadOutcome {
        if !container.exists() {
            error!(container = %container.host_id(), "Viewer container not found");
            return LoadOutcome::MissingContainer;
        }
        let host = container.host_id().to_string();
        let ticket = self.begin(&host);
        debug!(container = %host, ticket, "loading docking result");

        container.clear();
        container.reset_visual_state();
        let (width, height) = effective_size(container.rendered_size());
        let mut viewer = match self.factory.create(container, width, height) {
            Ok(viewer) => viewer,
            Err(e) => return self.fail(container, ticket, e),
        };
        container.show_overlay();

        let fetched = self.fetch_all(files).await;
        if !self.is_current(&host, ticket) {
            debug!(container = %host, ticket, "load superseded");
            return LoadOutcome::Superseded;
        }
        let summary = match fetched.and_then(|payloads| populate(viewer.as_mut(), &payloads)) {
            Ok(summary) => summary,
            Err(e) => return self.fail(container, ticket, e),
        };

        tokio::time::sleep(self.render_settle).await;
        if !self.is_current(&host, ticket) {
            return LoadOutcome::Superseded;
        }
        container.fade_out_overlay();

        tokio::time::sleep(self.overlay_fade).await;
        if !self.is_current(&host, ticket) {
            return LoadOutcome::Superseded;
        }
        container.remove_overlay();
        container.set_active();
        viewer.resize();
        viewer.render();
        LoadOutcome::Loaded(summary)
    }

    /// Straight load with no overlay; the error goes back to the caller and
    /// nothing is shown in the container.
    pub async fn load_plain(&self, container: &dyn ViewerContainer, files: &DockingFiles) -> Result<LoadSummary> {
        if !container.exists() {
            return Err(ClientError::Viewer(format!("container {} not found", container.host_id())));
        }
        let ticket = self.begin(container.host_id());
        container.clear();
        let (width, height) = effective_size(container.rendered_size());
        let mut viewer = self.factory.create(container, width, height)?;
        let payloads = self.fetch_all(files).await?;
        if !self.is_current(container.host_id(), ticket) {
            warn!(container = %container.host_id(), "plain load superseded, dropping it");
            return Err(ClientError::Viewer("superseded".to_string()));
        }
        populate(viewer.as_mut(), &payloads)
    }
}
