//! The docking result aggregator
//!
//! A [`Session`] joins three independent inputs: a ligand given as SMILES,
//! the docked poses of that ligand, and the pockets predicted on the
//! receptor. Everything is computed once at load time and then served to
//! the reporting commands and the interactive shell.

use log::{debug, info};
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::descriptors::DescriptorProvider;
use crate::error::{DockError, Result};
use crate::hbonds::{bonded_residues, HBond, HBondDetector, HBondParams};
use crate::io::{parse_structure, parse_vina_poses, resolve_structure};
pub use crate::ligand::ligand_summary;
use crate::ligand::Ligand;
use crate::molecule::{Molecule, Residue, ResidueId};
use crate::pockets::{read_predictions, read_residue_names, Pocket, PocketSet};
use crate::poses::{sasa_ratio, PocketAssigner, Pose, PoseRecord};

/// Files and identifiers a session is built from
#[derive(Debug, Clone)]
pub struct SessionInputs {
    pub smiles: String,

    /// PDB code or path of the receptor the poses were docked against
    pub pdb_code: String,

    pub poses_file: PathBuf,

    /// Receptor structure the pockets were predicted on
    pub structure_file: PathBuf,

    pub predictions_file: PathBuf,
    pub residues_file: PathBuf,
}

/// Locate a structure code, searching the configured directory
pub fn locate_structure(code: &str, config: &Config) -> Result<PathBuf> {
    resolve_structure(code, config.structure_dir.as_deref())
        .ok_or_else(|| DockError::NotFound(format!("structure '{}'", code)))
}

pub(crate) fn open_csv(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DockError::NotFound(format!("file {}", path.display())),
        _ => DockError::Io(e),
    })
}

/// All entities of one docking run, held in memory
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub ligand: Ligand,

    /// Resolved receptor used for hydrogen bonds and rendering
    pub receptor_path: PathBuf,
    pub receptor: Molecule,

    pub poses_path: PathBuf,
    pub poses: Vec<Pose>,

    pub structure: Molecule,
    pub pockets: PocketSet,

    /// Pocket index per pose
    assignments: Vec<Option<usize>>,

    /// Hydrogen bonds per pose
    hbonds: Vec<Vec<HBond>>,

    /// Per-atom SASA of `structure`
    structure_sasa: Vec<f64>,
}

impl Session {
    /// Parse every input, compute pocket descriptors, assign poses to
    /// pockets and detect hydrogen bonds per pose
    pub fn load(
        inputs: &SessionInputs,
        config: &Config,
        provider: &dyn DescriptorProvider,
    ) -> Result<Self> {
        let ligand = provider.ligand(&inputs.smiles)?;

        let receptor_path = locate_structure(&inputs.pdb_code, config)?;
        info!("Loading receptor: {}", receptor_path.display());
        let receptor =
            parse_structure(&receptor_path).map_err(|e| DockError::from_file(&receptor_path, e))?;

        info!("Loading poses: {}", inputs.poses_file.display());
        let poses = parse_vina_poses(&inputs.poses_file)
            .map_err(|e| DockError::from_file(&inputs.poses_file, e))?;

        info!("Loading structure: {}", inputs.structure_file.display());
        let structure = parse_structure(&inputs.structure_file)
            .map_err(|e| DockError::from_file(&inputs.structure_file, e))?;

        let rows = read_predictions(open_csv(&inputs.predictions_file)?, &inputs.predictions_file)?;
        let names = read_residue_names(open_csv(&inputs.residues_file)?, &inputs.residues_file)?;
        let structure_sasa = provider.atom_sasa(&structure);
        debug!(
            "Computed structure surface for {} atoms with the {} provider",
            structure_sasa.len(),
            provider.name()
        );
        let pockets = PocketSet::build(
            rows,
            &names,
            &structure,
            &structure_sasa,
            &inputs.predictions_file,
            &inputs.residues_file,
        )?;
        info!("Loaded {} pockets", pockets.len());

        let assignments: Vec<Option<usize>> = {
            let assigner = PocketAssigner::new(&pockets, &structure, config.max_pocket_distance);
            poses
                .iter()
                .map(|pose| {
                    assigner
                        .assign(pose)
                        .and_then(|p| pockets.iter().position(|q| q.id == p.id))
                })
                .collect()
        };

        let detector = HBondDetector::with_params(HBondParams {
            distance: config.hbond_distance,
            angle: config.hbond_angle,
        });
        let hbonds: Vec<Vec<HBond>> = poses
            .iter()
            .map(|pose| detector.detect(&receptor, &pose.molecule))
            .collect();
        info!(
            "Analysed {} poses ({} unassigned)",
            poses.len(),
            assignments.iter().filter(|a| a.is_none()).count()
        );

        Ok(Self {
            config: config.clone(),
            ligand,
            receptor_path,
            receptor,
            poses_path: inputs.poses_file.clone(),
            poses,
            structure,
            pockets,
            assignments,
            hbonds,
            structure_sasa,
        })
    }

    /// Pockets in predictions-file order
    pub fn pocket_summary(&self) -> &[Pocket] {
        self.pockets.as_slice()
    }

    pub fn ligand_summary(&self) -> &Ligand {
        &self.ligand
    }

    /// Position of a 1-based pose id in the poses list
    fn pose_index(&self, pose_id: usize) -> Result<usize> {
        if pose_id == 0 || pose_id > self.poses.len() {
            return Err(DockError::NotFound(format!(
                "pose {} (the poses file has {} poses)",
                pose_id,
                self.poses.len()
            )));
        }
        Ok(pose_id - 1)
    }

    pub fn pose(&self, pose_id: usize) -> Result<&Pose> {
        Ok(&self.poses[self.pose_index(pose_id)?])
    }

    pub fn pocket_for_pose(&self, pose_id: usize) -> Result<Option<&Pocket>> {
        let index = self.pose_index(pose_id)?;
        Ok(self.assignments[index].and_then(|p| self.pockets.as_slice().get(p)))
    }

    pub fn hbonds_for_pose(&self, pose_id: usize) -> Result<&[HBond]> {
        Ok(&self.hbonds[self.pose_index(pose_id)?])
    }

    /// Receptor residues hydrogen-bonded to the pose
    pub fn residues_for_pose(&self, pose_id: usize) -> Result<BTreeSet<Residue>> {
        Ok(bonded_residues(self.hbonds_for_pose(pose_id)?))
    }

    /// Structure SASA summed over the given residues
    fn residues_sasa(&self, residues: &BTreeSet<Residue>) -> f64 {
        let ids: HashSet<&ResidueId> = residues.iter().map(|r| &r.id).collect();
        self.structure
            .atoms
            .iter()
            .zip(&self.structure_sasa)
            .filter(|(atom, _)| ids.contains(&ResidueId::of(atom)))
            .map(|(_, area)| area)
            .sum()
    }

    fn record(&self, index: usize) -> PoseRecord {
        let pose = &self.poses[index];
        let pocket = self.assignments[index].and_then(|p| self.pockets.as_slice().get(p));
        let residues = bonded_residues(&self.hbonds[index]);

        PoseRecord {
            pose_id: pose.id,
            score: pose.score,
            pocket: pocket.map(|p| p.id.clone()),
            hbond_count: self.hbonds[index].len(),
            pocket_gravy: pocket.map(|p| p.descriptors.gravy),
            ligand_logp: self.ligand.logp,
            pocket_sasa: pocket.map(|p| p.descriptors.sasa),
            ligand_sasa: self.ligand.sasa,
            sasa_ratio: pocket.map(|p| sasa_ratio(self.ligand.sasa, p.descriptors.sasa)),
            residue_sasa: self.residues_sasa(&residues),
            pocket_charge: pocket.map(|p| p.descriptors.charge),
            ligand_charge: self.ligand.charge,
        }
    }

    /// One record per pose in file order, or the single requested pose
    pub fn pose_summary(&self, pose_id: Option<usize>) -> Result<Vec<PoseRecord>> {
        match pose_id {
            Some(id) => Ok(vec![self.record(self.pose_index(id)?)]),
            None => Ok((0..self.poses.len()).map(|i| self.record(i)).collect()),
        }
    }
}
