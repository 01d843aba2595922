//! Command handlers shared by the one-shot CLI and the shell
//!
//! Every handler validates its arguments before writing anything, so a
//! failing command leaves no partial table behind.

use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{DockError, Result};
use crate::hbonds::{HBondDetector, HBondParams};
use crate::io::{parse_structure, parse_vina_poses};
use crate::ligand::Ligand;
use crate::pockets::{read_predictions, read_residue_names, PocketSet};
use crate::poses::PocketAssigner;
use crate::render::{Renderer, Scene, ScriptWriter, VisualizationMode};
use crate::report::{self, PoseResidues};
use crate::session::{locate_structure, open_csv, Session};

pub fn ligand_info(
    out: &mut dyn Write,
    ligand: &Ligand,
    csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    if json {
        report::write_json(out, ligand)?;
    } else {
        report::write_ligand(out, ligand)?;
    }

    if let Some(path) = csv {
        report::export_ligand_csv(path, ligand)?;
        saved(out, json, format!("Ligand info saved to {}", path.display()))?;
    }
    Ok(())
}

pub fn pocket_info(
    out: &mut dyn Write,
    pockets: &PocketSet,
    pocket_id: Option<&str>,
    csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let shown = match pocket_id {
        Some(id) => vec![pockets
            .get(id)
            .ok_or_else(|| DockError::NotFound(format!("pocket '{}'", id)))?],
        None => pockets.iter().collect(),
    };

    if json {
        report::write_json(out, &shown)?;
    } else {
        report::write_pockets(out, shown)?;
    }

    if let Some(path) = csv {
        report::export_pockets_csv(path, pockets.as_slice())?;
        saved(out, json, format!("\nPocket info saved to {}", path.display()))?;
    }
    Ok(())
}

/// Flags of `poses_info`
#[derive(Debug, Clone, Default)]
pub struct PosesOptions {
    pub pose_id: Option<usize>,
    pub csv: Option<PathBuf>,

    /// Show hydrogen-bonded residues instead of the table
    pub residues: bool,

    pub csv_hbonds: Option<PathBuf>,
    pub json: bool,
}

fn pose_residues(session: &Session, ids: impl Iterator<Item = usize>) -> Result<Vec<PoseResidues>> {
    ids.map(|id| session.residues_for_pose(id).map(|residues| (id, residues)))
        .collect()
}

pub fn poses_info(out: &mut dyn Write, session: &Session, options: &PosesOptions) -> Result<()> {
    let records = session.pose_summary(options.pose_id)?;

    if options.residues {
        let bonded = pose_residues(session, records.iter().map(|r| r.pose_id))?;
        if options.json {
            report::write_json(out, &bonded)?;
        } else {
            report::write_pose_residues(out, &bonded)?;
        }
    } else if options.json {
        report::write_json(out, &records)?;
    } else {
        report::write_poses(out, &records)?;
    }

    if let Some(path) = &options.csv {
        report::export_poses_csv(path, &session.pose_summary(None)?)?;
        saved(out, options.json, format!("Poses info saved to {}", path.display()))?;
    }
    if let Some(path) = &options.csv_hbonds {
        let bonded = pose_residues(session, 1..=session.poses.len())?;
        report::export_hbond_residues_csv(path, &bonded)?;
        saved(
            out,
            options.json,
            format!("Hydrogen bond residue data saved to {}", path.display()),
        )?;
    }
    Ok(())
}

/// Export confirmations stay out of JSON output
fn saved(out: &mut dyn Write, json: bool, message: String) -> Result<()> {
    if json {
        info!("{}", message.trim_start());
    } else {
        writeln!(out, "{}", message)?;
    }
    Ok(())
}

/// Scene for a pose of a loaded session
pub fn session_scene(session: &Session, pose_id: usize, mode: VisualizationMode) -> Result<Scene> {
    let pocket_selection = session.pocket_for_pose(pose_id)?.map(|p| p.selection());
    let hbonds = session
        .hbonds_for_pose(pose_id)?
        .iter()
        .map(|b| (b.receptor_serial, b.ligand_serial))
        .collect();

    Ok(Scene {
        structure: session.receptor_path.clone(),
        poses: session.poses_path.clone(),
        pose_id,
        mode,
        pocket_selection,
        hbonds,
    })
}

/// Scene built straight from files, without pocket descriptors
///
/// With a residues file the pockets are built and checked against the
/// receptor as a session does, so both select the same residues.
pub fn file_scene(
    pdb_code: &str,
    poses_file: &Path,
    predictions_file: Option<&Path>,
    residues_file: Option<&Path>,
    pose_id: usize,
    mode: VisualizationMode,
    config: &Config,
) -> Result<Scene> {
    let structure = locate_structure(pdb_code, config)?;
    let receptor = parse_structure(&structure).map_err(|e| DockError::from_file(&structure, e))?;
    let poses = parse_vina_poses(poses_file).map_err(|e| DockError::from_file(poses_file, e))?;

    let pose = pose_id
        .checked_sub(1)
        .and_then(|i| poses.get(i))
        .ok_or_else(|| {
            DockError::NotFound(format!("pose {} (the poses file has {} poses)", pose_id, poses.len()))
        })?;

    let pocket_selection = match predictions_file {
        Some(path) => {
            let rows = read_predictions(open_csv(path)?, path)?;
            let pockets = match residues_file {
                Some(residues) => {
                    let names = read_residue_names(open_csv(residues)?, residues)?;
                    // selection only, descriptors stay unmeasured
                    PocketSet::build(rows, &names, &receptor, &[], path, residues)?
                }
                None => PocketSet::from_predictions(rows, path)?,
            };
            PocketAssigner::new(&pockets, &receptor, config.max_pocket_distance)
                .assign(pose)
                .map(|p| p.selection())
        }
        None => {
            if let Some(residues) = residues_file {
                warn!("Ignoring {}: no predictions file given", residues.display());
            }
            None
        }
    };

    let hbonds = HBondDetector::with_params(HBondParams {
        distance: config.hbond_distance,
        angle: config.hbond_angle,
    })
    .detect(&receptor, &pose.molecule)
    .iter()
    .map(|b| (b.receptor_serial, b.ligand_serial))
    .collect();

    Ok(Scene {
        structure,
        poses: poses_file.to_path_buf(),
        pose_id,
        mode,
        pocket_selection,
        hbonds,
    })
}

/// Save the scene as a script, or hand it to `launcher`
pub fn visualize(
    out: &mut dyn Write,
    scene: &Scene,
    save: Option<&Path>,
    launcher: &dyn Renderer,
) -> Result<()> {
    match save {
        Some(path) => {
            writeln!(out, "Saving PyMOL script...")?;
            ScriptWriter::new(path).render(scene)?;
            writeln!(out, "PML script saved to {}.", path.display())?;
        }
        None => {
            writeln!(out, "Launching PyMOL with mode '{}'...", scene.mode)?;
            info!("Rendering pose {} with {}", scene.pose_id, launcher.name());
            launcher.render(scene)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Remembers the scenes it was asked to render
    #[derive(Default)]
    struct Recorder {
        scenes: RefCell<Vec<Scene>>,
    }

    impl Renderer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn render(&self, scene: &Scene) -> std::result::Result<(), RenderError> {
            self.scenes.borrow_mut().push(scene.clone());
            Ok(())
        }
    }

    fn ligand() -> Ligand {
        Ligand {
            smiles: "NC(=O)N".to_string(),
            logp: -0.98,
            sasa: 150.0,
            tpsa: 69.11,
            volume: 60.0,
            charge: 0,
        }
    }

    fn scene() -> Scene {
        Scene {
            structure: PathBuf::from("rec.pdb"),
            poses: PathBuf::from("out_vina.pdbqt"),
            pose_id: 1,
            mode: VisualizationMode::Polar,
            pocket_selection: None,
            hbonds: vec![],
        }
    }

    #[test]
    fn test_ligand_info_with_export() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("ligand.csv");
        let mut out = Vec::new();
        ligand_info(&mut out, &ligand(), Some(&csv), false).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Ligand Properties for SMILES: NC(=O)N\n"));
        assert!(text.ends_with(&format!("Ligand info saved to {}\n", csv.display())));
        assert!(csv.exists());
    }

    #[test]
    fn test_ligand_info_json() {
        let mut out = Vec::new();
        ligand_info(&mut out, &ligand(), None, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["tpsa"], 69.11);
    }

    #[test]
    fn test_unknown_pocket_writes_nothing() {
        let mut out = Vec::new();
        let err = pocket_info(&mut out, &PocketSet::default(), Some("pocket9"), None, false).unwrap_err();
        assert!(matches!(err, DockError::NotFound(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_visualize_save_and_launch() {
        let dir = TempDir::new().unwrap();
        let pml = dir.path().join("view.pml");
        let recorder = Recorder::default();

        let mut out = Vec::new();
        visualize(&mut out, &scene(), Some(&pml), &recorder).unwrap();
        assert!(pml.exists());
        assert!(recorder.scenes.borrow().is_empty());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PML script saved to"));

        let mut out = Vec::new();
        visualize(&mut out, &scene(), None, &recorder).unwrap();
        assert_eq!(recorder.scenes.borrow().len(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Launching PyMOL with mode 'polar'...\n"
        );
    }
}
