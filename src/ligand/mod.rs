//! Ligand descriptors computed from a SMILES string

pub mod crippen;
pub mod embed;
pub mod smiles;
pub mod tpsa;

use log::debug;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::grid::{union_volume, GridError};
use crate::sasa::{SurfaceComputer, SurfaceParams};
pub use embed::{EmbedParams, Embedder};
pub use smiles::{parse_smiles, MolGraph, SmilesError};

/// Errors raised while computing ligand descriptors
#[derive(Error, Debug)]
pub enum LigandError {
    #[error(transparent)]
    Smiles(#[from] SmilesError),

    #[error("volume could not be measured: {0}")]
    Volume(#[from] GridError),
}

/// Descriptors of one ligand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ligand {
    pub smiles: String,
    pub logp: f64,
    pub sasa: f64,
    pub tpsa: f64,
    pub volume: f64,
    pub charge: i32,
}

impl fmt::Display for Ligand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ligand Properties for SMILES: {}", self.smiles)?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "{:<12} {:.2}", "logP:", self.logp)?;
        writeln!(f, "{:<12} {:.2}", "SASA (A^2):", self.sasa)?;
        writeln!(f, "{:<12} {:.2}", "TPSA (A^2):", self.tpsa)?;
        writeln!(f, "{:<12} {:.2}", "Volume (A^3):", self.volume)?;
        writeln!(f, "{:<12} {}", "Charge:", self.charge)
    }
}

/// Parameters for the ligand descriptor pipeline
#[derive(Debug, Clone)]
pub struct LigandParams {
    pub embed: EmbedParams,

    /// Surface sampling; hydrogens are part of a ligand surface
    pub surface: SurfaceParams,

    /// Grid spacing for the van der Waals volume, in Angstroms
    pub volume_spacing: f64,
}

impl Default for LigandParams {
    fn default() -> Self {
        Self {
            embed: EmbedParams::default(),
            surface: SurfaceParams {
                include_hydrogens: true,
                ..SurfaceParams::default()
            },
            volume_spacing: 0.25,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LigandCalculator {
    pub params: LigandParams,
}

impl LigandCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: LigandParams) -> Self {
        Self { params }
    }

    pub fn compute(&self, smiles: &str) -> Result<Ligand, LigandError> {
        let graph = parse_smiles(smiles)?;
        let molecule = Embedder::with_params(self.params.embed.clone()).embed(&graph, smiles);

        let sasa = SurfaceComputer::with_params(self.params.surface.clone()).total_area(&molecule);
        let centers: Vec<_> = molecule.atoms.iter().map(|a| a.coordinates).collect();
        let radii: Vec<f64> = molecule.atoms.iter().map(|a| a.atom_type.vdw_radius()).collect();
        let volume = union_volume(&centers, &radii, self.params.volume_spacing)?;

        debug!(
            "Embedded {} with {} atoms (SASA {:.2}, volume {:.2})",
            smiles,
            molecule.atoms.len(),
            sasa,
            volume
        );

        Ok(Ligand {
            smiles: smiles.trim().to_string(),
            logp: crippen::crippen_logp(&graph),
            sasa,
            tpsa: tpsa::tpsa(&graph),
            volume,
            charge: graph.formal_charge(),
        })
    }
}

/// Descriptors for a SMILES string with default parameters
pub fn ligand_summary(smiles: &str) -> Result<Ligand, LigandError> {
    LigandCalculator::new().compute(smiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_urea_summary() {
        let urea = ligand_summary("NC(=O)N").unwrap();
        assert_approx_eq!(urea.logp, -0.98, 0.01);
        assert_approx_eq!(urea.tpsa, 69.11, 1e-9);
        assert_eq!(urea.charge, 0);
        assert!(urea.sasa > 100.0 && urea.sasa < 250.0, "SASA {}", urea.sasa);
        assert!(urea.volume > 30.0 && urea.volume < 90.0, "volume {}", urea.volume);
    }

    #[test]
    fn test_summary_is_deterministic() {
        let a = ligand_summary("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let b = ligand_summary("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_charge_is_sum_of_formal_charges() {
        let glycine = ligand_summary("[NH3+]CC(=O)[O-]").unwrap();
        assert_eq!(glycine.charge, 0);
        let acetate = ligand_summary("CC(=O)[O-]").unwrap();
        assert_eq!(acetate.charge, -1);
    }

    #[test]
    fn test_larger_ligand_has_larger_surface() {
        let methane = ligand_summary("C").unwrap();
        let octane = ligand_summary("CCCCCCCC").unwrap();
        assert!(octane.sasa > methane.sasa);
        assert!(octane.volume > methane.volume);
    }

    #[test]
    fn test_invalid_notation() {
        assert!(matches!(
            ligand_summary("C1CC"),
            Err(LigandError::Smiles(SmilesError::UnclosedRing(1)))
        ));
        assert!(matches!(ligand_summary(""), Err(LigandError::Smiles(SmilesError::Empty))));
        assert!(matches!(ligand_summary("C[CH255]"), Err(LigandError::Smiles(_))));
    }

    #[test]
    fn test_unmeasurable_volume_is_an_error() {
        let calculator = LigandCalculator::with_params(LigandParams {
            volume_spacing: 0.0,
            ..LigandParams::default()
        });
        assert!(matches!(
            calculator.compute("NC(=O)N"),
            Err(LigandError::Volume(GridError::InvalidSpacing(_)))
        ));
    }

    #[test]
    fn test_display_layout() {
        let urea = ligand_summary("NC(=O)N").unwrap();
        let text = urea.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ligand Properties for SMILES: NC(=O)N");
        assert_eq!(lines[1], "-".repeat(40));
        assert_eq!(lines[2], "logP:        -0.98");
        assert_eq!(lines[6], "Charge:      0");
    }
}
