//! PharmaDock Molecules - structures, catalogs and the docking pipeline.
//!
//! 1. Parsing receptor/ligand structures (PDB, PDBQT, SDF)
//! 2. Drug and gene catalogs
//! 3. Fetching receptor structures from RCSB
//! 4. Building ligand SDF files from SMILES
//! 5. Molecular docking (AutoDock Vina in Docker)
//! 6. Naming, caching and serving docking results

pub mod structure;
pub mod catalog;
pub mod pdb;
pub mod ligand;
pub mod options;
pub mod docking;
pub mod results;
pub mod service;

pub type Result<T> = anyhow::Result<T>;

pub use options::DockingOptions;
pub use service::{DockingArtifacts, DockingRequest, DockingService, VinaDockingService};
pub use structure::{Atom, Frame, Structure, StructureFormat};
