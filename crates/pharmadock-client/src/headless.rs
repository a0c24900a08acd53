//! In-memory hosts for the client components.
//!
//! [`HeadlessDocument`] stands in for the page: it owns named containers,
//! each with an optional viewer scene, loading overlay and inline errors.
//! Viewers built by its factory parse the structure text for real and keep
//! per-model style layers, so callers can inspect what a browser would draw.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use pharmadock_common::FileReference;
use pharmadock_molecules::{Structure, StructureFormat};

use crate::conversation::{Bubble, BubbleId, ConversationView};
use crate::error::{ClientError, Result};
use crate::landing::TypingSurface;
use crate::viewer::style::spectrum_position;
use crate::viewer::{
    ModelHandle, MoleculeViewer, Representation, Selection, TextSource, ViewerContainer, ViewerFactory,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Scene ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub selection: Selection,
    pub representation: Representation,
}

#[derive(Debug, Clone)]
pub struct SceneModel {
    pub structure: Structure,
    pub styles: Vec<StyleLayer>,
}

impl SceneModel {
    /// Atoms of the first frame drawn by at least one matching layer.
    pub fn styled_atoms(&self, wanted: impl Fn(&Representation) -> bool) -> usize {
        self.structure
            .atoms()
            .iter()
            .filter(|atom| {
                self.styles.iter().any(|layer| {
                    wanted(&layer.representation)
                        && match layer.selection {
                            Selection::All => true,
                            Selection::NonHydrogen => !atom.is_hydrogen(),
                        }
                })
            })
            .count()
    }

    /// Per-atom spectrum position when the model is drawn as a cartoon.
    pub fn spectrum(&self) -> Option<Vec<f32>> {
        let cartoon = self
            .styles
            .iter()
            .any(|l| matches!(l.representation, Representation::Cartoon { .. }));
        if !cartoon {
            return None;
        }
        let span = self.structure.residue_span();
        Some(self.structure.atoms().iter().map(|a| spectrum_position(a.residue_seq, span)).collect())
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    id: u64,
    pub size: (u32, u32),
    pub models: Vec<SceneModel>,
    pub zoomed: bool,
    pub renders: usize,
    pub resizes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Visible,
    Fading,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerState {
    pub size: (u32, u32),
    pub scene: Option<Scene>,
    pub overlay: Option<Overlay>,
    pub errors: Vec<String>,
    pub active: bool,
    pub visual_resets: usize,
    pub overlays_shown: usize,
}

// ── Document ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct DocumentState {
    containers: HashMap<String, ContainerState>,
    next_scene: u64,
    fail_viewers: bool,
}

#[derive(Clone, Default)]
pub struct HeadlessDocument {
    inner: Arc<Mutex<DocumentState>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_container(&self, id: &str, size: (u32, u32)) -> HeadlessContainer {
        lock(&self.inner)
            .containers
            .insert(id.to_string(), ContainerState { size, ..Default::default() });
        self.container(id)
    }

    /// Handle to `id`, whether or not such a container exists.
    pub fn container(&self, id: &str) -> HeadlessContainer {
        HeadlessContainer { doc: self.clone(), id: id.to_string() }
    }

    pub fn remove_container(&self, id: &str) {
        lock(&self.inner).containers.remove(id);
    }

    pub fn factory(&self) -> HeadlessFactory {
        HeadlessFactory { doc: self.clone() }
    }

    /// Make viewer construction fail, as a browser without WebGL would.
    pub fn fail_viewer_creation(&self, fail: bool) {
        lock(&self.inner).fail_viewers = fail;
    }

    fn with_container<R>(&self, id: &str, f: impl FnOnce(&mut ContainerState) -> R) -> Option<R> {
        lock(&self.inner).containers.get_mut(id).map(f)
    }

    fn with_scene<R>(&self, id: &str, scene_id: u64, f: impl FnOnce(&mut Scene) -> R) -> Option<R> {
        let mut doc = lock(&self.inner);
        let scene = doc.containers.get_mut(id)?.scene.as_mut().filter(|s| s.id == scene_id)?;
        Some(f(scene))
    }
}

#[derive(Clone)]
pub struct HeadlessContainer {
    doc: HeadlessDocument,
    id: String,
}

impl HeadlessContainer {
    pub fn snapshot(&self) -> ContainerState {
        self.doc.with_container(&self.id, |c| c.clone()).unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut ContainerState)) {
        self.doc.with_container(&self.id, f);
    }
}

impl ViewerContainer for HeadlessContainer {
    fn host_id(&self) -> &str {
        &self.id
    }

    fn exists(&self) -> bool {
        self.doc.with_container(&self.id, |_| ()).is_some()
    }

    fn rendered_size(&self) -> (u32, u32) {
        self.doc.with_container(&self.id, |c| c.size).unwrap_or((0, 0))
    }

    fn clear(&self) {
        self.update(|c| {
            c.scene = None;
            c.overlay = None;
            c.errors.clear();
        });
    }

    fn reset_visual_state(&self) {
        self.update(|c| {
            c.active = false;
            c.visual_resets += 1;
        });
    }

    fn show_overlay(&self) {
        self.update(|c| {
            c.overlay = Some(Overlay::Visible);
            c.overlays_shown += 1;
        });
    }

    fn fade_out_overlay(&self) {
        self.update(|c| {
            if c.overlay.is_some() {
                c.overlay = Some(Overlay::Fading);
            }
        });
    }

    fn remove_overlay(&self) {
        self.update(|c| c.overlay = None);
    }

    fn show_error(&self, message: &str) {
        self.update(|c| c.errors.push(message.to_string()));
    }

    fn set_active(&self) {
        self.update(|c| c.active = true);
    }
}

// ── Viewer ────────────────────────────────────────────────────────────────────

pub struct HeadlessFactory {
    doc: HeadlessDocument,
}

impl ViewerFactory for HeadlessFactory {
    fn create(&self, container: &dyn ViewerContainer, width: u32, height: u32) -> Result<Box<dyn MoleculeViewer>> {
        let host = container.host_id().to_string();
        let mut doc = lock(&self.doc.inner);
        if doc.fail_viewers {
            return Err(ClientError::Viewer("3D context unavailable".to_string()));
        }
        doc.next_scene += 1;
        let id = doc.next_scene;
        let state = doc
            .containers
            .get_mut(&host)
            .ok_or_else(|| ClientError::Viewer(format!("container {} not found", host)))?;
        state.scene = Some(Scene {
            id,
            size: (width, height),
            models: Vec::new(),
            zoomed: false,
            renders: 0,
            resizes: 0,
        });
        Ok(Box::new(HeadlessViewer { doc: self.doc.clone(), host, scene: id }))
    }
}

/// Draws into the scene it created; once the container is cleared its
/// calls go nowhere.
pub struct HeadlessViewer {
    doc: HeadlessDocument,
    host: String,
    scene: u64,
}

impl HeadlessViewer {
    fn detached(&self) -> ClientError {
        ClientError::Viewer(format!("viewer in {} was removed", self.host))
    }
}

fn parse(data: &str, format: StructureFormat) -> Result<Structure> {
    Structure::parse(data, format).map_err(|e| ClientError::Viewer(e.to_string()))
}

impl MoleculeViewer for HeadlessViewer {
    fn add_model(&mut self, data: &str, format: StructureFormat) -> Result<ModelHandle> {
        let structure = parse(data, format)?;
        self.doc
            .with_scene(&self.host, self.scene, |s| {
                s.models.push(SceneModel { structure, styles: Vec::new() });
                ModelHandle(s.models.len() - 1)
            })
            .ok_or_else(|| self.detached())
    }

    fn add_frames(&mut self, model: ModelHandle, data: &str, format: StructureFormat) -> Result<()> {
        let frames = parse(data, format)?.frames;
        self.doc
            .with_scene(&self.host, self.scene, |s| {
                s.models.get_mut(model.0).map(|m| m.structure.frames.extend(frames))
            })
            .flatten()
            .ok_or_else(|| self.detached())
    }

    fn set_style(&mut self, model: ModelHandle, selection: Selection, representation: Representation) {
        self.doc.with_scene(&self.host, self.scene, |s| {
            if let Some(m) = s.models.get_mut(model.0) {
                m.styles = vec![StyleLayer { selection, representation }];
            }
        });
    }

    fn add_style(&mut self, model: ModelHandle, selection: Selection, representation: Representation) {
        self.doc.with_scene(&self.host, self.scene, |s| {
            if let Some(m) = s.models.get_mut(model.0) {
                m.styles.push(StyleLayer { selection, representation });
            }
        });
    }

    fn zoom_to(&mut self) {
        self.doc.with_scene(&self.host, self.scene, |s| s.zoomed = true);
    }

    fn render(&mut self) {
        self.doc.with_scene(&self.host, self.scene, |s| s.renders += 1);
    }

    fn resize(&mut self) {
        self.doc.with_scene(&self.host, self.scene, |s| s.resizes += 1);
    }

    fn model_count(&self) -> usize {
        self.doc.with_scene(&self.host, self.scene, |s| s.models.len()).unwrap_or(0)
    }
}

// ── Conversation view ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub bubbles: Vec<(BubbleId, Bubble)>,
    pub removed: Vec<BubbleId>,
    pub input_clears: usize,
    pub scrolls: usize,
    next: u64,
}

impl ViewState {
    pub fn placeholders(&self) -> Vec<&BubbleId> {
        self.bubbles
            .iter()
            .filter(|(_, b)| matches!(b, Bubble::Placeholder { .. }))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Message list kept in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    inner: Arc<Mutex<ViewState>>,
}

impl HeadlessView {
    pub fn snapshot(&self) -> ViewState {
        lock(&self.inner).clone()
    }
}

impl ConversationView for HeadlessView {
    fn append(&mut self, bubble: Bubble) -> BubbleId {
        let mut state = lock(&self.inner);
        let id = match &bubble {
            Bubble::Placeholder { id } => BubbleId(id.clone()),
            _ => {
                state.next += 1;
                BubbleId(format!("bubble-{}", state.next))
            }
        };
        state.bubbles.push((id.clone(), bubble));
        id
    }

    fn remove(&mut self, id: &BubbleId) {
        let mut state = lock(&self.inner);
        state.bubbles.retain(|(b, _)| b != id);
        state.removed.push(id.clone());
    }

    fn clear_input(&mut self) {
        lock(&self.inner).input_clears += 1;
    }

    fn scroll_to_latest(&mut self) {
        lock(&self.inner).scrolls += 1;
    }
}

/// Keeps every frame the typewriter shows.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub frames: Vec<String>,
}

impl TypingSurface for RecordingSurface {
    fn show(&mut self, text: &str) {
        self.frames.push(text.to_string());
    }
}

// ── Text source ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    Status(u16),
}

/// Structure text served from memory, with optional latency and failing
/// entries.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    entries: HashMap<String, Entry>,
    delay: Duration,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.entries.insert(path.to_string(), Entry::Text(text.to_string()));
        self
    }

    /// Answer `path` with an HTTP error status.
    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.entries.insert(path.to_string(), Entry::Status(status));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl TextSource for MapSource {
    async fn fetch(&self, file: &FileReference) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.entries.get(file.as_str()) {
            Some(Entry::Text(text)) => Ok(text.clone()),
            Some(Entry::Status(status)) => Err(ClientError::Status { status: *status, url: file.to_string() }),
            None => Err(ClientError::Status { status: 404, url: file.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::ColorScheme;
    use pretty_assertions::assert_eq;

    const PDBQT: &str = "\
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  0.00  0.00    -0.079 N
ATOM      2  HA  ALA A   1      11.200   6.900  -4.600  0.00  0.00    +0.050 HD
ATOM      3  CA  GLY A   3      13.100   5.500  -5.000  0.00  0.00    +0.100 C
";

    #[test]
    fn test_viewer_detaches_when_container_cleared() {
        let doc = HeadlessDocument::new();
        let container = doc.add_container("v", (10, 10));
        let mut viewer = doc.factory().create(&container, 10, 10).unwrap();
        viewer.add_model(PDBQT, StructureFormat::Pdbqt).unwrap();
        assert_eq!(viewer.model_count(), 1);

        container.clear();
        assert_eq!(viewer.model_count(), 0);
        assert!(viewer.add_model(PDBQT, StructureFormat::Pdbqt).is_err());
    }

    #[test]
    fn test_unparseable_model_is_an_error() {
        let doc = HeadlessDocument::new();
        let container = doc.add_container("v", (10, 10));
        let mut viewer = doc.factory().create(&container, 10, 10).unwrap();
        assert!(viewer.add_model("REMARK nothing here", StructureFormat::Pdbqt).is_err());
    }

    #[test]
    fn test_spectrum_follows_residue_number() {
        let doc = HeadlessDocument::new();
        let container = doc.add_container("v", (10, 10));
        let mut viewer = doc.factory().create(&container, 10, 10).unwrap();
        let m = viewer.add_model(PDBQT, StructureFormat::Pdbqt).unwrap();
        viewer.set_style(m, Selection::All, Representation::Cartoon { color: ColorScheme::Spectrum });

        let scene = container.snapshot().scene.unwrap();
        assert_eq!(scene.models[0].spectrum(), Some(vec![0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_set_style_replaces_layers() {
        let doc = HeadlessDocument::new();
        let container = doc.add_container("v", (10, 10));
        let mut viewer = doc.factory().create(&container, 10, 10).unwrap();
        let m = viewer.add_model(PDBQT, StructureFormat::Pdbqt).unwrap();
        viewer.add_style(m, Selection::All, Representation::Sphere { scale: 1.0 });
        viewer.set_style(m, Selection::NonHydrogen, Representation::Stick { radius: 0.1 });

        let scene = container.snapshot().scene.unwrap();
        assert_eq!(scene.models[0].styles.len(), 1);
        assert_eq!(scene.models[0].styled_atoms(|_| true), 2);
    }

    #[test]
    fn test_view_assigns_ids() {
        let mut view = HeadlessView::default();
        let a = view.append(Bubble::User("hi".into()));
        let p = view.append(Bubble::Placeholder { id: "loading-1-1".into() });
        assert_ne!(a, p);
        assert_eq!(p, BubbleId("loading-1-1".into()));
        view.remove(&p);
        assert_eq!(view.snapshot().bubbles.len(), 1);
    }
}
