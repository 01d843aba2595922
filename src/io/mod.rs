//! Readers for PDB, PDBQT and AutoDock Vina output files

use log::debug;
use nalgebra::Vector3;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::atom::{Atom, AtomType};
use crate::molecule::Molecule;
use crate::poses::Pose;

/// Errors that can occur during file I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

/// Coordinate file flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Pdb,
    Pdbqt,
}

impl StructureFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdbqt") => StructureFormat::Pdbqt,
            _ => StructureFormat::Pdb,
        }
    }
}

/// Parse a PDB or PDBQT file into a Molecule
pub fn parse_structure<P: AsRef<Path>>(path: P) -> Result<Molecule, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    parse_structure_str(&content, name, StructureFormat::from_path(path))
}

/// Parse structure records from an in-memory string
pub fn parse_structure_str(
    content: &str,
    name: &str,
    format: StructureFormat,
) -> Result<Molecule, IoError> {
    let mut molecule = Molecule::new(name);
    molecule.autodock_typed = format == StructureFormat::Pdbqt;

    for (i, line) in content.lines().enumerate() {
        let line_number = i + 1;
        if line.starts_with("ENDMDL") {
            debug!("{}: reading first model only", name);
            break;
        }
        if is_atom_record(line) {
            if let Some(atom) = parse_atom_line(line, line_number, format)? {
                molecule.add_atom(atom);
            }
        }
    }

    if molecule.atoms.is_empty() {
        return Err(IoError::InvalidFormat(format!(
            "no ATOM or HETATM records in {}",
            name
        )));
    }

    debug!("Parsed {} atoms from {}", molecule.atoms.len(), name);
    Ok(molecule)
}

/// Parse every docked model of a Vina output file
pub fn parse_vina_poses<P: AsRef<Path>>(path: P) -> Result<Vec<Pose>, IoError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("poses");
    parse_vina_poses_str(&content, name)
}

/// Parse Vina models from an in-memory string
pub fn parse_vina_poses_str(content: &str, name: &str) -> Result<Vec<Pose>, IoError> {
    let mut poses = Vec::new();
    let mut current: Option<PoseBuilder> = None;
    let mut in_flex_residue = false;
    let mut saw_model = false;

    for (i, line) in content.lines().enumerate() {
        let line_number = i + 1;

        if line.starts_with("MODEL") {
            if let Some(builder) = current.take() {
                poses.push(builder.finish(poses.len() + 1, name)?);
            }
            saw_model = true;
            current = Some(PoseBuilder::new(line_number));
        } else if line.starts_with("ENDMDL") {
            let builder = current.take().ok_or_else(|| IoError::Parse {
                line: line_number,
                message: "ENDMDL without MODEL".to_string(),
            })?;
            poses.push(builder.finish(poses.len() + 1, name)?);
        } else if line.starts_with("BEGIN_RES") {
            in_flex_residue = true;
        } else if line.starts_with("END_RES") {
            in_flex_residue = false;
        } else if let Some(rest) = line.strip_prefix("REMARK VINA RESULT:") {
            let builder = current.get_or_insert_with(|| PoseBuilder::new(line_number));
            let value = rest.split_whitespace().next().unwrap_or_default();
            let score = value.parse::<f64>().map_err(|_| IoError::Parse {
                line: line_number,
                message: format!("Invalid Vina score: {}", value),
            })?;
            builder.score = Some(score);
        } else if is_atom_record(line) && !in_flex_residue {
            let builder = current.get_or_insert_with(|| PoseBuilder::new(line_number));
            if let Some(atom) = parse_atom_line(line, line_number, StructureFormat::Pdbqt)? {
                builder.atoms.push(atom);
            }
        }
    }

    if let Some(builder) = current.take() {
        if saw_model {
            return Err(IoError::Parse {
                line: builder.start_line,
                message: "MODEL without ENDMDL".to_string(),
            });
        }
        poses.push(builder.finish(1, name)?);
    }

    if poses.is_empty() {
        return Err(IoError::InvalidFormat(format!("no docked poses in {}", name)));
    }

    debug!("Parsed {} poses from {}", poses.len(), name);
    Ok(poses)
}

struct PoseBuilder {
    start_line: usize,
    score: Option<f64>,
    atoms: Vec<Atom>,
}

impl PoseBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            score: None,
            atoms: Vec::new(),
        }
    }

    fn finish(self, id: usize, name: &str) -> Result<Pose, IoError> {
        let score = self.score.ok_or_else(|| IoError::Parse {
            line: self.start_line,
            message: format!("model {} has no REMARK VINA RESULT line", id),
        })?;
        if self.atoms.is_empty() {
            return Err(IoError::Parse {
                line: self.start_line,
                message: format!("model {} has no atoms", id),
            });
        }

        let mut molecule = Molecule::new(&format!("{}_{}", name, id));
        molecule.autodock_typed = true;
        molecule.atoms = self.atoms;
        Ok(Pose::new(id, score, molecule))
    }
}

fn is_atom_record(line: &str) -> bool {
    line.starts_with("ATOM") || line.starts_with("HETATM")
}

fn field<'a>(line: &'a str, start: usize, end: usize) -> &'a str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

/// Parse one ATOM/HETATM record. Alternate locations other than the first are skipped.
fn parse_atom_line(
    line: &str,
    line_number: usize,
    format: StructureFormat,
) -> Result<Option<Atom>, IoError> {
    if !line.is_ascii() {
        return Err(IoError::Parse {
            line: line_number,
            message: "Non-ASCII characters in atom record".to_string(),
        });
    }
    if line.len() < 54 {
        return Err(IoError::Parse {
            line: line_number,
            message: format!("Line too short for atom record: {}", line),
        });
    }

    let alt_loc = line.as_bytes()[16] as char;
    if !matches!(alt_loc, ' ' | 'A' | '1') {
        return Ok(None);
    }

    // Parse atom serial number
    let serial = field(line, 6, 11)
        .parse::<u32>()
        .map_err(|_| IoError::Parse {
            line: line_number,
            message: format!("Invalid atom serial number: {}", &line[6..11]),
        })?;

    let name = field(line, 12, 16).to_string();
    let residue_name = field(line, 17, 20).to_string();
    let chain_id = line[21..22].chars().next().unwrap_or(' ');

    let residue_num = field(line, 22, 26)
        .parse::<i32>()
        .map_err(|_| IoError::Parse {
            line: line_number,
            message: format!("Invalid residue number: {}", &line[22..26]),
        })?;
    let insertion_code = line[26..27].chars().next().filter(|c| *c != ' ');

    let coordinate = |start: usize, end: usize, axis: &str| {
        field(line, start, end)
            .parse::<f64>()
            .map_err(|_| IoError::Parse {
                line: line_number,
                message: format!("Invalid {} coordinate: {}", axis, &line[start..end]),
            })
    };
    let x = coordinate(30, 38, "x")?;
    let y = coordinate(38, 46, "y")?;
    let z = coordinate(46, 54, "z")?;

    let (charge, type_field) = match format {
        StructureFormat::Pdbqt => (
            field(line, 68, 76).parse::<f64>().unwrap_or(0.0),
            field(line, 77, 79),
        ),
        StructureFormat::Pdb => (0.0, field(line, 76, 78)),
    };

    let type_token: String = type_field.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let atom_type = if type_token.is_empty() {
        infer_type_from_name(&name)
    } else {
        match format {
            StructureFormat::Pdbqt => AtomType::from_pdbqt_string(&type_token),
            StructureFormat::Pdb => AtomType::from_element(&type_token),
        }
    };

    let mut atom = Atom::new(
        atom_type,
        Vector3::new(x, y, z),
        name,
        serial,
        residue_name,
        residue_num,
        chain_id,
        charge,
    );
    atom.insertion_code = insertion_code;
    atom.hetero = line.starts_with("HETATM");

    Ok(Some(atom))
}

/// Element from the atom name when the element column is blank
fn infer_type_from_name(name: &str) -> AtomType {
    let letter: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(1)
        .collect();
    AtomType::from_element(&letter)
}

/// Locate a structure given either a path or a PDB code.
///
/// Candidates are `<code>`, `<code>.pdb` and `<code>.pdbqt` in the given
/// directory and then the working directory, trying the code as written and
/// in lower and upper case.
pub fn resolve_structure(code_or_path: &str, structure_dir: Option<&Path>) -> Option<PathBuf> {
    let direct = PathBuf::from(code_or_path);
    if direct.is_file() {
        return Some(direct);
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(dir) = structure_dir {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(PathBuf::from("."));

    let spellings = [
        code_or_path.to_string(),
        code_or_path.to_lowercase(),
        code_or_path.to_uppercase(),
    ];

    for dir in &dirs {
        for spelling in &spellings {
            for suffix in ["", ".pdb", ".pdbqt"] {
                let candidate = dir.join(format!("{}{}", spelling, suffix));
                if candidate.is_file() {
                    debug!("Resolved {} to {}", code_or_path, candidate.display());
                    return Some(candidate);
                }
            }
        }
    }

    None
}
