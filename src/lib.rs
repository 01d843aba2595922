//! DockInspect: summaries and visualization of protein-ligand docking results
//!
//! This library joins docked poses from AutoDock Vina, binding pockets
//! predicted by P2Rank and ligand descriptors computed from SMILES into
//! per-pose records, and hands selected poses to PyMOL.

pub mod atom;
pub mod commands;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod grid;
pub mod hbonds;
pub mod io;
pub mod ligand;
pub mod molecule;
pub mod pockets;
pub mod poses;
pub mod render;
pub mod report;
pub mod sasa;
pub mod session;
pub mod shell;

// Re-export commonly used types and functions
pub use atom::Atom;
pub use config::Config;
pub use error::{DockError, Result};
pub use molecule::Molecule;
pub use session::{Session, SessionInputs};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
