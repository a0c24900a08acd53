//! Receptor and ligand styling.

use super::{ColorScheme, ModelHandle, MoleculeViewer, Representation, Selection};

pub const RECEPTOR_STICK_RADIUS: f32 = 0.1;
pub const LIGAND_STICK_RADIUS: f32 = 0.3;
pub const LIGAND_SPHERE_SCALE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Receptor,
    Ligand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedModel {
    pub role: Role,
    pub handle: ModelHandle,
}

impl TaggedModel {
    pub fn receptor(handle: ModelHandle) -> Self {
        Self { role: Role::Receptor, handle }
    }

    pub fn ligand(handle: ModelHandle) -> Self {
        Self { role: Role::Ligand, handle }
    }
}

fn with_role(models: &[TaggedModel], role: Role) -> impl Iterator<Item = ModelHandle> + '_ {
    models.iter().filter(move |m| m.role == role).map(|m| m.handle)
}

/// Cartoon plus thin heavy-atom sticks on receptors, thick sticks plus
/// spheres on ligands. Roles with no model are skipped.
pub fn apply_styles<'v>(viewer: &'v mut dyn MoleculeViewer, models: &[TaggedModel]) -> &'v mut dyn MoleculeViewer {
    for m in with_role(models, Role::Receptor) {
        viewer.set_style(m, Selection::All, Representation::Cartoon { color: ColorScheme::Spectrum });
    }
    for m in with_role(models, Role::Receptor) {
        viewer.add_style(m, Selection::NonHydrogen, Representation::Stick { radius: RECEPTOR_STICK_RADIUS });
    }
    for m in with_role(models, Role::Ligand) {
        viewer.set_style(m, Selection::All, Representation::Stick { radius: LIGAND_STICK_RADIUS });
    }
    for m in with_role(models, Role::Ligand) {
        viewer.add_style(m, Selection::All, Representation::Sphere { scale: LIGAND_SPHERE_SCALE });
    }
    viewer
}

/// Position of residue `seq` on a 0..=1 spectrum spanning `span`.
pub fn spectrum_position(seq: i32, span: (i32, i32)) -> f32 {
    let (lo, hi) = span;
    if hi <= lo {
        return 0.0;
    }
    ((seq.clamp(lo, hi) - lo) as f32) / ((hi - lo) as f32)
}
