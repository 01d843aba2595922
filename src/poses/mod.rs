//! Docked poses, pocket assignment and per-pose records

use nalgebra::Vector3;
use serde::Serialize;
use std::collections::HashMap;

use crate::molecule::{Molecule, MoleculeError, ResidueId};
use crate::pockets::{Pocket, PocketSet};

/// Receptor heavy atoms this close to a pose heavy atom count as contacts
pub const CONTACT_DISTANCE: f64 = 4.0;

/// Pocket centers closer than this to each other are tied
const TIE_TOLERANCE: f64 = 1e-6;

/// One docked ligand conformation
#[derive(Debug, Clone)]
pub struct Pose {
    /// 1-based position in the poses file
    pub id: usize,

    /// Vina affinity in kcal/mol
    pub score: f64,

    pub molecule: Molecule,
}

impl Pose {
    pub fn new(id: usize, score: f64, molecule: Molecule) -> Self {
        Self { id, score, molecule }
    }

    pub fn centroid(&self) -> Result<Vector3<f64>, MoleculeError> {
        self.molecule.center()
    }
}

/// Assigns poses to the pocket whose predicted center is nearest
pub struct PocketAssigner<'a> {
    pockets: &'a PocketSet,
    structure: &'a Molecule,
    residue_index: HashMap<ResidueId, Vec<usize>>,
    max_distance: Option<f64>,
}

impl<'a> PocketAssigner<'a> {
    pub fn new(pockets: &'a PocketSet, structure: &'a Molecule, max_distance: Option<f64>) -> Self {
        Self {
            pockets,
            structure,
            residue_index: structure.residue_index(),
            max_distance,
        }
    }

    /// Pocket residues with a heavy atom within contact distance of the pose
    fn contacts(&self, pocket: &Pocket, pose: &Pose) -> usize {
        let limit = CONTACT_DISTANCE * CONTACT_DISTANCE;
        let ligand: Vec<&Vector3<f64>> = pose
            .molecule
            .heavy_atoms()
            .map(|i| &pose.molecule.atoms[i].coordinates)
            .collect();

        pocket
            .residues
            .iter()
            .filter(|residue| {
                self.residue_index
                    .get(&residue.id)
                    .into_iter()
                    .flatten()
                    .map(|&i| &self.structure.atoms[i])
                    .filter(|a| !a.is_hydrogen())
                    .any(|a| ligand.iter().any(|l| (a.coordinates - *l).norm_squared() <= limit))
            })
            .count()
    }

    /// Nearest pocket; equidistant centers are separated by residue contacts,
    /// then by file order
    pub fn assign(&self, pose: &Pose) -> Option<&'a Pocket> {
        let centroid = pose.centroid().ok()?;
        let distances: Vec<f64> = self
            .pockets
            .iter()
            .map(|p| (p.center - centroid).norm())
            .collect();
        let nearest = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        if !nearest.is_finite() {
            return None;
        }
        if let Some(max) = self.max_distance {
            if nearest > max {
                return None;
            }
        }

        let tied: Vec<&'a Pocket> = self
            .pockets
            .iter()
            .zip(&distances)
            .filter(|(_, &d)| d - nearest <= TIE_TOLERANCE)
            .map(|(p, _)| p)
            .collect();
        if tied.len() == 1 {
            return tied.first().copied();
        }

        let mut best: Option<(&'a Pocket, usize)> = None;
        for pocket in tied {
            let contacts = self.contacts(pocket, pose);
            if best.map_or(true, |(_, c)| contacts > c) {
                best = Some((pocket, contacts));
            }
        }
        best.map(|(p, _)| p)
    }
}

/// Per-pose summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseRecord {
    pub pose_id: usize,
    pub score: f64,
    pub pocket: Option<String>,
    pub hbond_count: usize,
    pub pocket_gravy: Option<f64>,
    pub ligand_logp: f64,
    pub pocket_sasa: Option<f64>,
    pub ligand_sasa: f64,
    /// Ligand SASA divided by pocket SASA, 0 when the pocket has no surface
    pub sasa_ratio: Option<f64>,
    /// Receptor SASA of the residues hydrogen-bonded to this pose
    pub residue_sasa: f64,
    pub pocket_charge: Option<i32>,
    pub ligand_charge: i32,
}

pub fn sasa_ratio(ligand_sasa: f64, pocket_sasa: f64) -> f64 {
    if pocket_sasa == 0.0 {
        0.0
    } else {
        ligand_sasa / pocket_sasa
    }
}
