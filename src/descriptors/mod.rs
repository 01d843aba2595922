//! Chemistry descriptor providers

use crate::config::Config;
use crate::ligand::{Ligand, LigandCalculator, LigandError};
use crate::molecule::Molecule;
use crate::sasa::{SurfaceComputer, SurfaceParams};

/// Source of ligand and receptor surface descriptors
pub trait DescriptorProvider {
    /// Get the name of the provider
    fn name(&self) -> &'static str;

    /// Descriptors of a ligand given as SMILES
    fn ligand(&self, smiles: &str) -> Result<Ligand, LigandError>;

    /// Per-atom solvent-accessible surface of a receptor, indexed like its atoms
    fn atom_sasa(&self, molecule: &Molecule) -> Vec<f64>;
}

/// Descriptors computed in-process
#[derive(Debug, Clone)]
pub struct BuiltinDescriptors {
    ligand: LigandCalculator,
    receptor: SurfaceComputer,
}

impl BuiltinDescriptors {
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Surface sampling follows the configured probe radius and point count
    pub fn from_config(config: &Config) -> Self {
        let mut ligand = LigandCalculator::new();
        ligand.params.surface.probe_radius = config.probe_radius;
        ligand.params.surface.samples = config.sasa_points;

        let receptor = SurfaceComputer::with_params(SurfaceParams {
            probe_radius: config.probe_radius,
            samples: config.sasa_points,
            include_hydrogens: false,
            include_hetero: false,
        });

        Self { ligand, receptor }
    }
}

impl DescriptorProvider for BuiltinDescriptors {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn ligand(&self, smiles: &str) -> Result<Ligand, LigandError> {
        self.ligand.compute(smiles)
    }

    fn atom_sasa(&self, molecule: &Molecule) -> Vec<f64> {
        self.receptor.atom_areas(molecule)
    }
}
