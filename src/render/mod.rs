//! Visualization hand-off to PyMOL

use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Residues within this distance of the ligand form the pocket when none is assigned
pub const POCKET_CUTOFF: f64 = 3.6;

const HYDROPHOBIC: &str = "ALA+VAL+LEU+ILE+MET+PHE+TRP+PRO+GLY";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },
}

/// How the pose and its pocket are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    /// Pocket and ligand sticks with hydrogen-bond distances
    #[default]
    Hbonds,

    /// Pocket, protein and ligand surfaces
    Surface,

    /// Pocket surface coloured hydrophobic/hydrophilic
    Polar,

    /// Pocket surface coloured by residue charge class
    Charge,
}

impl VisualizationMode {
    pub fn name(&self) -> &'static str {
        match self {
            VisualizationMode::Hbonds => "hbonds",
            VisualizationMode::Surface => "surface",
            VisualizationMode::Polar => "polar",
            VisualizationMode::Charge => "charge",
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a renderer needs to show one pose
#[derive(Debug, Clone)]
pub struct Scene {
    pub structure: PathBuf,
    pub poses: PathBuf,

    /// 1-based pose, i.e. the state of the poses object
    pub pose_id: usize,

    pub mode: VisualizationMode,

    /// Explicit pocket residue selection; the ligand neighbourhood otherwise
    pub pocket_selection: Option<String>,

    /// Receptor and ligand serial numbers of each hydrogen bond
    pub hbonds: Vec<(u32, u32)>,
}

/// Drawing settings derived from a mode
#[derive(Debug, Default)]
struct Style {
    pocket_surface: bool,
    other_surface: bool,
    ligand_surface: bool,
    pocket_sticks: bool,
    ligand_sticks: bool,
    other_transparency: f64,
}

impl Style {
    fn of(mode: VisualizationMode) -> Self {
        match mode {
            VisualizationMode::Hbonds => Style {
                pocket_sticks: true,
                ligand_sticks: true,
                ..Style::default()
            },
            VisualizationMode::Surface => Style {
                pocket_surface: true,
                other_surface: true,
                ligand_surface: true,
                other_transparency: 0.8,
                ..Style::default()
            },
            VisualizationMode::Polar | VisualizationMode::Charge => Style {
                pocket_surface: true,
                other_surface: true,
                ligand_sticks: true,
                other_transparency: 0.8,
                ..Style::default()
            },
        }
    }
}

/// A PyMOL command script, one command per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PmlScript {
    lines: Vec<String>,
}

impl PmlScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn color_regions(&mut self, regions: &[(&str, &str, &str)]) {
        for (name, residues, color) in regions {
            self.command(format!("select {}, pocket and resn {}", name, residues));
            self.command(format!("color {}, {}", color, name));
        }
    }

    /// Script that loads the scene's files and draws the pose in its mode
    pub fn for_scene(scene: &Scene) -> Self {
        let mut script = Self::new();
        script
            .command("reinitialize")
            .command(format!("load {}, structure", scene.structure.display()))
            .command(format!("load {}, out_vina", scene.poses.display()))
            .command(format!("frame {}", scene.pose_id))
            .command("h_add")
            .command("hide everything, all");

        match &scene.pocket_selection {
            Some(selection) => script.command(format!("select pocket, structure and ({})", selection)),
            None => script.command(format!(
                "select pocket, br. (structure within {} of out_vina)",
                POCKET_CUTOFF
            )),
        };
        script.command("select not_pocket, not (pocket or out_vina)");

        match scene.mode {
            VisualizationMode::Surface => {
                script
                    .command("color hotpink, out_vina")
                    .command("color white, pocket")
                    .command("color grey, not_pocket");
            }
            VisualizationMode::Polar | VisualizationMode::Charge => {
                script.command("color grey, not_pocket");
            }
            VisualizationMode::Hbonds => {}
        }

        let style = Style::of(scene.mode);
        script
            .command("set transparency, 0, pocket")
            .command(format!("set transparency, {}, not_pocket", style.other_transparency));
        if style.pocket_surface {
            script.command("show surface, pocket");
        }
        if style.other_surface {
            script.command("show surface, not_pocket");
        }
        if style.ligand_surface {
            script.command("show surface, out_vina");
        }
        if style.pocket_sticks {
            script.command("show sticks, pocket");
        }
        if style.ligand_sticks {
            script.command("show sticks, out_vina");
        }

        if scene.mode == VisualizationMode::Hbonds {
            for (idx, (receptor, ligand)) in scene.hbonds.iter().enumerate() {
                script
                    .command(format!(
                        "distance hb_{}, structure and id {}, out_vina and id {}",
                        idx, receptor, ligand
                    ))
                    .command(format!("select hb_res_{}_1, byres (structure and id {})", idx, receptor))
                    .command(format!("select hb_res_{}_2, byres (out_vina and id {})", idx, ligand))
                    .command(format!("show sticks, hb_res_{0}_1 or hb_res_{0}_2", idx));
            }
        }

        match scene.mode {
            VisualizationMode::Polar => script.color_regions(&[
                ("hydrophobic", HYDROPHOBIC, "yellow"),
                ("hydrophilic", "SER+THR+ASN+GLN+TYR+CYS+HIS+ARG+LYS+ASP+GLU", "blue"),
            ]),
            VisualizationMode::Charge => script.color_regions(&[
                ("hydrophobic", HYDROPHOBIC, "yellow"),
                ("acidic", "ASP+GLU", "red"),
                ("basic", "LYS+ARG+HIS", "blue"),
                ("neutral", "SER+THR+ASN+GLN+TYR+CYS", "white"),
            ]),
            _ => {}
        }

        script.command("select none").command("zoom all");
        script
    }
}

impl fmt::Display for PmlScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Trait for anything that can present a scene
pub trait Renderer {
    /// Get the name of the renderer
    fn name(&self) -> &'static str;

    fn render(&self, scene: &Scene) -> Result<(), RenderError>;
}

/// Writes the script to a file instead of launching anything
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    pub path: PathBuf,
}

impl ScriptWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Renderer for ScriptWriter {
    fn name(&self) -> &'static str {
        "script"
    }

    fn render(&self, scene: &Scene) -> Result<(), RenderError> {
        fs::write(&self.path, PmlScript::for_scene(scene).to_string())?;
        info!("Wrote PyMOL script to {}", self.path.display());
        Ok(())
    }
}

/// Launches PyMOL on a temporary script
#[derive(Debug, Clone)]
pub struct PymolRenderer {
    pub executable: String,

    /// Block until PyMOL exits; otherwise detach and keep the script
    pub wait: bool,
}

impl PymolRenderer {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            wait: true,
        }
    }

    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(&self.executable);
        command.arg(script);
        command
    }

    fn launch_error(&self, source: std::io::Error) -> RenderError {
        RenderError::Launch {
            program: self.executable.clone(),
            source,
        }
    }
}

impl Renderer for PymolRenderer {
    fn name(&self) -> &'static str {
        "pymol"
    }

    fn render(&self, scene: &Scene) -> Result<(), RenderError> {
        let mut file = tempfile::Builder::new()
            .prefix("dockinspect_")
            .suffix(".pml")
            .tempfile()?;
        file.write_all(PmlScript::for_scene(scene).to_string().as_bytes())?;
        file.flush()?;

        if self.wait {
            debug!("Running {} {}", self.executable, file.path().display());
            let status = self
                .command(file.path())
                .status()
                .map_err(|e| self.launch_error(e))?;
            if !status.success() {
                return Err(RenderError::Exit {
                    program: self.executable.clone(),
                    status,
                });
            }
            return Ok(());
        }

        let (_, path) = file.keep().map_err(|e| RenderError::Io(e.error))?;
        debug!("Spawning {} {}", self.executable, path.display());
        self.command(&path).spawn().map_err(|e| self.launch_error(e))?;
        info!("PyMOL started on {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scene(mode: VisualizationMode) -> Scene {
        Scene {
            structure: PathBuf::from("2src.pdb"),
            poses: PathBuf::from("out_vina.pdbqt"),
            pose_id: 3,
            mode,
            pocket_selection: Some("chain A and resi 10+11".to_string()),
            hbonds: vec![(120, 4)],
        }
    }

    #[test]
    fn test_script_preamble_and_ending() {
        let script = PmlScript::for_scene(&scene(VisualizationMode::Hbonds));
        let lines = script.lines();
        assert_eq!(
            &lines[..7],
            &[
                "reinitialize",
                "load 2src.pdb, structure",
                "load out_vina.pdbqt, out_vina",
                "frame 3",
                "h_add",
                "hide everything, all",
                "select pocket, structure and (chain A and resi 10+11)",
            ]
        );
        assert_eq!(&lines[lines.len() - 2..], &["select none", "zoom all"]);
    }

    #[test]
    fn test_hbonds_mode() {
        let script = PmlScript::for_scene(&scene(VisualizationMode::Hbonds));
        let lines = script.lines();
        assert!(lines.contains(&"distance hb_0, structure and id 120, out_vina and id 4".to_string()));
        assert!(lines.contains(&"show sticks, hb_res_0_1 or hb_res_0_2".to_string()));
        assert!(lines.contains(&"set transparency, 0, not_pocket".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("show surface")));
    }

    #[test]
    fn test_surface_modes() {
        let surface = PmlScript::for_scene(&scene(VisualizationMode::Surface));
        assert!(surface.lines().contains(&"color hotpink, out_vina".to_string()));
        assert!(surface.lines().contains(&"show surface, out_vina".to_string()));
        assert!(surface.lines().contains(&"set transparency, 0.8, not_pocket".to_string()));
        assert!(!surface.lines().iter().any(|l| l.starts_with("distance")));

        let polar = PmlScript::for_scene(&scene(VisualizationMode::Polar));
        assert!(polar.lines().contains(&"color blue, hydrophilic".to_string()));
        assert!(!polar.lines().iter().any(|l| l.contains("acidic")));

        let charge = PmlScript::for_scene(&scene(VisualizationMode::Charge));
        assert!(charge.lines().contains(&"select acidic, pocket and resn ASP+GLU".to_string()));
        assert!(charge.lines().contains(&"color white, neutral".to_string()));
    }

    #[test]
    fn test_unassigned_pose_uses_neighbourhood() {
        let mut unassigned = scene(VisualizationMode::Hbonds);
        unassigned.pocket_selection = None;
        let script = PmlScript::for_scene(&unassigned);
        assert!(script
            .lines()
            .contains(&"select pocket, br. (structure within 3.6 of out_vina)".to_string()));
    }

    #[test]
    fn test_script_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("view.pml");
        let writer = ScriptWriter::new(&path);
        writer.render(&scene(VisualizationMode::Charge)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("reinitialize\n"));
        assert!(written.ends_with("zoom all\n"));
    }

    #[test]
    fn test_missing_executable() {
        let renderer = PymolRenderer::new("/nonexistent/bin/pymol");
        let err = renderer.render(&scene(VisualizationMode::Hbonds)).unwrap_err();
        assert!(matches!(err, RenderError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_checked() {
        assert!(PymolRenderer::new("true").render(&scene(VisualizationMode::Hbonds)).is_ok());
        let err = PymolRenderer::new("false")
            .render(&scene(VisualizationMode::Hbonds))
            .unwrap_err();
        assert!(matches!(err, RenderError::Exit { .. }));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(VisualizationMode::default(), VisualizationMode::Hbonds);
        assert_eq!(VisualizationMode::Charge.to_string(), "charge");
    }
}
