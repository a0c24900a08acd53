//! 3D viewer seams: the host element, the viewer widget and the sources
//! structure text is fetched from.

pub mod loader;
pub mod style;

use async_trait::async_trait;
use pharmadock_common::FileReference;
use pharmadock_molecules::StructureFormat;

use crate::error::Result;

/// Index of a model inside one viewer, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub usize);

/// Which atoms of a model a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    NonHydrogen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Rainbow by residue position along the sequence.
    Spectrum,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Representation {
    Cartoon { color: ColorScheme },
    Stick { radius: f32 },
    Sphere { scale: f32 },
}

/// The element a viewer lives in, plus its loading overlay and inline
/// error slot.
pub trait ViewerContainer: Send + Sync {
    /// Stable identifier of the host element.
    fn host_id(&self) -> &str;
    fn exists(&self) -> bool;
    /// Width and height as laid out; zero when not yet laid out.
    fn rendered_size(&self) -> (u32, u32);
    /// Remove every child: viewer, overlay and error.
    fn clear(&self);
    fn reset_visual_state(&self);
    fn show_overlay(&self);
    fn fade_out_overlay(&self);
    fn remove_overlay(&self);
    fn show_error(&self, message: &str);
    fn set_active(&self);
}

/// A live viewer session bound to one container.
pub trait MoleculeViewer: Send {
    fn add_model(&mut self, data: &str, format: StructureFormat) -> Result<ModelHandle>;
    /// Append the models in `data` to `model` as animation frames.
    fn add_frames(&mut self, model: ModelHandle, data: &str, format: StructureFormat) -> Result<()>;
    fn set_style(&mut self, model: ModelHandle, selection: Selection, style: Representation);
    fn add_style(&mut self, model: ModelHandle, selection: Selection, style: Representation);
    fn zoom_to(&mut self);
    fn render(&mut self);
    fn resize(&mut self);
    fn model_count(&self) -> usize;
}

pub trait ViewerFactory: Send + Sync {
    fn create(&self, container: &dyn ViewerContainer, width: u32, height: u32) -> Result<Box<dyn MoleculeViewer>>;
}

/// Where structure text comes from.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, file: &FileReference) -> Result<String>;
}
