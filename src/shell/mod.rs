//! Interactive shell over a loaded session

use clap::{CommandFactory, Parser, Subcommand};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::commands::{self, PosesOptions};
use crate::error::{DockError, Result};
use crate::render::{Renderer, VisualizationMode};
use crate::session::Session;

pub const PROMPT: &str = "> ";

/// One line typed at the prompt
#[derive(Parser, Debug)]
#[clap(
    name = "dockinspect",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "Commands:\n{subcommands}"
)]
struct ShellLine {
    #[clap(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Show ligand properties
    #[clap(name = "ligand_info")]
    LigandInfo {
        /// Export the properties to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,
    },

    /// Show pocket descriptors, for one pocket or all
    #[clap(name = "pocket_info")]
    PocketInfo {
        pocket_id: Option<String>,

        /// Export all pockets to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,
    },

    /// Show per-pose records, for one pose or all
    #[clap(name = "poses_info")]
    PosesInfo {
        pose_id: Option<usize>,

        /// Export all poses to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,

        /// Show hydrogen-bonding residues per pose
        #[clap(long)]
        res: bool,

        /// Export hydrogen-bonding residues to a CSV file
        #[clap(long = "csv_hbonds", value_parser)]
        csv_hbonds: Option<PathBuf>,
    },

    /// Render a pose in PyMOL or save the script
    Visualize {
        #[clap(long, default_value_t = 1)]
        pose: usize,

        #[clap(long, value_enum, default_value_t = VisualizationMode::Hbonds)]
        mode: VisualizationMode,

        /// Write the PyMOL script here instead of launching PyMOL
        #[clap(long, value_parser)]
        save: Option<PathBuf>,
    },

    /// Leave the shell
    #[clap(alias = "quit")]
    Exit,
}

/// Whether the loop keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    session: Session,
    launcher: Box<dyn Renderer>,
}

impl Shell {
    pub fn new(session: Session, launcher: Box<dyn Renderer>) -> Self {
        Self { session, launcher }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one line; usage errors are printed, command errors returned
    pub fn execute(&self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if line == "help" || line == "?" {
            write!(out, "{}", ShellLine::command().render_help())?;
            return Ok(Flow::Continue);
        }

        let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => parsed,
            Err(e) => {
                write!(out, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };
        debug!("Shell command: {:?}", parsed.command);

        match parsed.command {
            ShellCommand::LigandInfo { csv } => {
                commands::ligand_info(out, &self.session.ligand, csv.as_deref(), false)?
            }
            ShellCommand::PocketInfo { pocket_id, csv } => commands::pocket_info(
                out,
                &self.session.pockets,
                pocket_id.as_deref(),
                csv.as_deref(),
                false,
            )?,
            ShellCommand::PosesInfo {
                pose_id,
                csv,
                res,
                csv_hbonds,
            } => {
                let options = PosesOptions {
                    pose_id,
                    csv,
                    residues: res,
                    csv_hbonds,
                    json: false,
                };
                commands::poses_info(out, &self.session, &options)?
            }
            ShellCommand::Visualize { pose, mode, save } => {
                let scene = commands::session_scene(&self.session, pose, mode)?;
                commands::visualize(out, &scene, save.as_deref(), self.launcher.as_ref())?
            }
            ShellCommand::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Read-eval-print until `exit`, Ctrl-C or Ctrl-D
    pub fn run(&self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| DockError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        let stdout = io::stdout();
        println!("Type 'help' or '?' to list commands.");

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if let Err(e) = editor.add_history_entry(line.as_str()) {
                        debug!("History not recorded: {}", e);
                    }
                    match self.execute(&line, &mut stdout.lock()) {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(DockError::Io(io::Error::new(
                        io::ErrorKind::Other,
                        e.to_string(),
                    )))
                }
            }
        }

        println!("Exiting DockInspect shell.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::descriptors::BuiltinDescriptors;
    use crate::render::{RenderError, Scene};
    use crate::session::SessionInputs;
    use std::path::Path;
    use tempfile::TempDir;

    struct NoLaunch;

    impl Renderer for NoLaunch {
        fn name(&self) -> &'static str {
            "none"
        }

        fn render(&self, _scene: &Scene) -> std::result::Result<(), RenderError> {
            Ok(())
        }
    }

    fn shell() -> Shell {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/test_data");
        let inputs = SessionInputs {
            smiles: "NC(=O)N".to_string(),
            pdb_code: data.join("2src.pdb").display().to_string(),
            poses_file: data.join("out_vina.pdbqt"),
            structure_file: data.join("2src.pdb"),
            predictions_file: data.join("2src.pdb_predictions.csv"),
            residues_file: data.join("2src.pdb_residues.csv"),
        };
        let config = Config::default();
        let session = Session::load(&inputs, &config, &BuiltinDescriptors::from_config(&config)).unwrap();
        Shell::new(session, Box::new(NoLaunch))
    }

    fn run(shell: &Shell, line: &str) -> (Result<Flow>, String) {
        let mut out = Vec::new();
        let flow = shell.execute(line, &mut out);
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_commands() {
        let shell = shell();
        assert_eq!(run(&shell, "exit").0.unwrap(), Flow::Exit);
        assert_eq!(run(&shell, "quit").0.unwrap(), Flow::Exit);
        assert_eq!(run(&shell, "   ").0.unwrap(), Flow::Continue);
    }

    #[test]
    fn test_help_lists_commands() {
        let shell = shell();
        let (flow, text) = run(&shell, "?");
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(text.contains("pocket_info"));
        assert!(text.contains("visualize"));
    }

    #[test]
    fn test_usage_error_keeps_shell_alive() {
        let shell = shell();
        let (flow, text) = run(&shell, "poses_info --bogus");
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(!text.is_empty());
    }

    #[test]
    fn test_command_errors_are_returned() {
        let shell = shell();
        let (flow, text) = run(&shell, "poses_info 99");
        assert!(matches!(flow, Err(DockError::NotFound(_))));
        assert!(text.is_empty());

        let (flow, _) = run(&shell, "pocket_info pocket42");
        assert!(matches!(flow, Err(DockError::NotFound(_))));
    }

    #[test]
    fn test_tables_and_exports() {
        let shell = shell();
        let (_, text) = run(&shell, "pocket_info");
        assert_eq!(text.lines().count(), 2 + shell.session().pockets.len());

        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("hb.csv");
        let line = format!("poses_info --res --csv_hbonds {}", csv.display());
        let (flow, text) = run(&shell, &line);
        assert_eq!(flow.unwrap(), Flow::Continue);
        assert!(text.contains("Hydrogen-bonding residues per pose:"));
        assert!(text.contains("Pose  1:"));
        assert!(csv.exists());
    }

    #[test]
    fn test_visualize_save() {
        let shell = shell();
        let dir = TempDir::new().unwrap();
        let pml = dir.path().join("pose2.pml");
        let line = format!("visualize --pose 2 --mode surface --save {}", pml.display());
        let (_, text) = run(&shell, &line);
        assert!(text.contains("PML script saved to"));
        let script = std::fs::read_to_string(&pml).unwrap();
        assert!(script.contains("frame 2"));
        assert!(script.contains("color hotpink, out_vina"));
    }
}
