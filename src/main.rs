//! Main executable for dockinspect

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io;
use std::path::PathBuf;

use dockinspect::commands::{self, PosesOptions};
use dockinspect::descriptors::{BuiltinDescriptors, DescriptorProvider};
use dockinspect::io::parse_structure;
use dockinspect::pockets::PocketSet;
use dockinspect::render::{PymolRenderer, VisualizationMode};
use dockinspect::shell::Shell;
use dockinspect::{Config, DockError, Session, SessionInputs};

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "dockinspect",
    version = dockinspect::VERSION,
    about = "Summarize and visualize protein-ligand docking results"
)]
struct Cli {
    /// Configuration file (key = value)
    #[clap(long, global = true, value_parser)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

/// Inputs shared by every command that loads a full session
#[derive(Args, Debug)]
struct SessionArgs {
    /// Ligand SMILES
    smiles: String,

    /// PDB code or path of the receptor the poses were docked against
    pdb_code: String,

    /// Vina output with the docked poses
    #[clap(value_parser)]
    poses_file: PathBuf,

    /// Receptor structure the pockets were predicted on
    #[clap(value_parser)]
    structure: PathBuf,

    /// P2Rank pocket predictions CSV
    #[clap(value_parser)]
    predictions_csv: PathBuf,

    /// P2Rank pocket residues CSV
    #[clap(value_parser)]
    residues_csv: PathBuf,
}

impl SessionArgs {
    fn inputs(self) -> SessionInputs {
        SessionInputs {
            smiles: self.smiles,
            pdb_code: self.pdb_code,
            poses_file: self.poses_file,
            structure_file: self.structure,
            predictions_file: self.predictions_csv,
            residues_file: self.residues_csv,
        }
    }
}

/// Hydrogen-bond cutoffs overriding the configuration
#[derive(Args, Debug)]
struct CutoffArgs {
    /// Donor-acceptor distance cutoff in Angstroms
    #[clap(long, value_parser)]
    distance: Option<f64>,

    /// Maximum deviation from a linear D-H...A angle in degrees
    #[clap(long, value_parser)]
    angle: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show descriptors of a ligand
    #[clap(name = "ligand_info")]
    LigandInfo {
        /// Ligand SMILES
        smiles: String,

        /// Export the properties to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table
        #[clap(long)]
        json: bool,
    },

    /// Show descriptors of the predicted pockets
    #[clap(name = "pocket_info")]
    PocketInfo {
        /// Receptor structure the pockets were predicted on
        #[clap(value_parser)]
        structure: PathBuf,

        /// P2Rank pocket predictions CSV
        #[clap(value_parser)]
        predictions_csv: PathBuf,

        /// P2Rank pocket residues CSV
        #[clap(value_parser)]
        residues_csv: PathBuf,

        /// Show a single pocket
        #[clap(long = "pocket_id")]
        pocket_id: Option<String>,

        /// Export all pockets to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,

        /// Print JSON instead of a table
        #[clap(long)]
        json: bool,
    },

    /// Show per-pose records
    #[clap(name = "poses_info")]
    PosesInfo {
        #[clap(flatten)]
        session: SessionArgs,

        /// Show a single pose (1-based)
        pose_id: Option<usize>,

        /// Same as the positional pose id
        #[clap(long = "pose_index", conflicts_with = "pose_id")]
        pose_index: Option<usize>,

        /// Export all poses to a CSV file
        #[clap(long, value_parser)]
        csv: Option<PathBuf>,

        /// Show hydrogen-bonding residues per pose
        #[clap(long)]
        res: bool,

        /// Export hydrogen-bonding residues to a CSV file
        #[clap(long = "csv_hbonds", value_parser)]
        csv_hbonds: Option<PathBuf>,

        #[clap(flatten)]
        cutoffs: CutoffArgs,

        /// Print JSON instead of a table
        #[clap(long)]
        json: bool,
    },

    /// Load a session and start the interactive shell
    Shell {
        #[clap(flatten)]
        session: SessionArgs,

        #[clap(flatten)]
        cutoffs: CutoffArgs,
    },

    /// Render a pose in PyMOL or save the PyMOL script
    Visualize {
        /// PDB code or path of the receptor
        pdb_code: String,

        /// Vina output with the docked poses
        #[clap(value_parser)]
        poses_file: PathBuf,

        /// Pose to show (1-based)
        #[clap(long, default_value_t = 1)]
        pose: usize,

        #[clap(long, value_enum, default_value_t = VisualizationMode::Hbonds)]
        mode: VisualizationMode,

        /// P2Rank predictions used to highlight the pose's pocket
        #[clap(long = "predictions_file", value_parser)]
        predictions_file: Option<PathBuf>,

        /// P2Rank residues table naming the pocket residues
        #[clap(long = "residues_file", value_parser, requires = "predictions_file")]
        residues_file: Option<PathBuf>,

        /// Write the PyMOL script here instead of launching PyMOL
        #[clap(long, value_parser)]
        save: Option<PathBuf>,

        /// Do not wait for PyMOL to exit
        #[clap(long = "no-wait")]
        no_wait: bool,

        #[clap(flatten)]
        cutoffs: CutoffArgs,
    },
}

fn load_session(args: SessionArgs, config: &Config) -> Result<Session> {
    let inputs = args.inputs();
    let provider = BuiltinDescriptors::from_config(config);
    info!("Using {} descriptors", provider.name());
    Session::load(&inputs, config, &provider).with_context(|| {
        format!(
            "Failed to load docking results from {}",
            inputs.poses_file.display()
        )
    })
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to read configuration")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::LigandInfo { smiles, csv, json } => {
            let provider = BuiltinDescriptors::from_config(&config);
            let ligand = provider
                .ligand(&smiles)
                .map_err(DockError::from)
                .with_context(|| format!("Failed to compute descriptors for {}", smiles))?;
            commands::ligand_info(&mut out, &ligand, csv.as_deref(), json)?;
        }

        Commands::PocketInfo {
            structure,
            predictions_csv,
            residues_csv,
            pocket_id,
            csv,
            json,
        } => {
            info!("Loading structure: {}", structure.display());
            let molecule = parse_structure(&structure)
                .map_err(|e| DockError::from_file(&structure, e))
                .with_context(|| format!("Failed to parse structure file: {}", structure.display()))?;
            let provider = BuiltinDescriptors::from_config(&config);
            let pockets = PocketSet::load(&predictions_csv, &residues_csv, &molecule, &provider)
                .with_context(|| format!("Failed to load pockets from {}", predictions_csv.display()))?;
            commands::pocket_info(&mut out, &pockets, pocket_id.as_deref(), csv.as_deref(), json)?;
        }

        Commands::PosesInfo {
            session,
            pose_id,
            pose_index,
            csv,
            res,
            csv_hbonds,
            cutoffs,
            json,
        } => {
            let config = config.with_hbond_cutoffs(cutoffs.distance, cutoffs.angle);
            let session = load_session(session, &config)?;
            let options = PosesOptions {
                pose_id: pose_id.or(pose_index),
                csv,
                residues: res,
                csv_hbonds,
                json,
            };
            commands::poses_info(&mut out, &session, &options)?;
        }

        Commands::Shell { session, cutoffs } => {
            let config = config.with_hbond_cutoffs(cutoffs.distance, cutoffs.angle);
            let session = load_session(session, &config)?;
            let launcher = PymolRenderer::new(config.pymol.clone());
            drop(out);
            println!("Session initialized. Starting interactive mode...");
            Shell::new(session, Box::new(launcher)).run()?;
        }

        Commands::Visualize {
            pdb_code,
            poses_file,
            pose,
            mode,
            predictions_file,
            residues_file,
            save,
            no_wait,
            cutoffs,
        } => {
            let config = config.with_hbond_cutoffs(cutoffs.distance, cutoffs.angle);
            let scene = commands::file_scene(
                &pdb_code,
                &poses_file,
                predictions_file.as_deref(),
                residues_file.as_deref(),
                pose,
                mode,
                &config,
            )
            .with_context(|| format!("Failed to prepare pose {} of {}", pose, poses_file.display()))?;

            let mut launcher = PymolRenderer::new(config.pymol.clone());
            if no_wait {
                launcher = launcher.no_wait();
            }
            commands::visualize(&mut out, &scene, save.as_deref(), &launcher)?;
        }
    }

    Ok(())
}
