//! Error taxonomy shared by every command

use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::io::IoError;
use crate::ligand::{LigandError, SmilesError};
use crate::molecule::MoleculeError;
use crate::render::RenderError;

/// Errors surfaced to the invoking command or shell turn
#[derive(Error, Debug)]
pub enum DockError {
    /// Malformed input file, missing column or dangling reference
    #[error("Parse error in {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Unresolvable structure code, pose id or pocket id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Chemical notation that does not describe a valid molecular graph
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// The visualization engine could not be launched or failed
    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DockError {
    pub fn parse(origin: impl fmt::Display, message: impl fmt::Display) -> Self {
        DockError::Parse {
            origin: origin.to_string(),
            message: message.to_string(),
        }
    }

    /// Attach the offending file to a low-level reader error
    pub fn from_file(path: &Path, err: IoError) -> Self {
        match err {
            IoError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                DockError::NotFound(format!("file {}", path.display()))
            }
            IoError::Io(e) => DockError::Io(e),
            IoError::Parse { line, message } => {
                DockError::parse(path.display(), format!("line {}: {}", line, message))
            }
            IoError::InvalidFormat(message) => DockError::parse(path.display(), message),
        }
    }

    pub fn from_csv(path: &Path, err: csv::Error) -> Self {
        if let csv::ErrorKind::Io(e) = err.kind() {
            if e.kind() == std::io::ErrorKind::NotFound {
                return DockError::NotFound(format!("file {}", path.display()));
            }
        }
        let message = match err.position() {
            Some(pos) => format!("record {}: {}", pos.line(), err),
            None => err.to_string(),
        };
        DockError::parse(path.display(), message)
    }
}

impl From<SmilesError> for DockError {
    fn from(err: SmilesError) -> Self {
        DockError::InvalidStructure(err.to_string())
    }
}

impl From<LigandError> for DockError {
    fn from(err: LigandError) -> Self {
        match err {
            LigandError::Smiles(e) => e.into(),
            other => DockError::InvalidStructure(other.to_string()),
        }
    }
}

impl From<MoleculeError> for DockError {
    fn from(err: MoleculeError) -> Self {
        DockError::InvalidStructure(err.to_string())
    }
}

impl From<RenderError> for DockError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Io(e) => DockError::Io(e),
            other => DockError::ExternalTool(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DockError {
    fn from(err: serde_json::Error) -> Self {
        DockError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DockError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridError;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = IoError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let mapped = DockError::from_file(&PathBuf::from("out_vina.pdbqt"), err);
        assert!(matches!(mapped, DockError::NotFound(_)));
    }

    #[test]
    fn test_line_error_keeps_position() {
        let err = IoError::Parse {
            line: 7,
            message: "Invalid x coordinate".to_string(),
        };
        let mapped = DockError::from_file(&PathBuf::from("rec.pdb"), err);
        assert_eq!(
            mapped.to_string(),
            "Parse error in rec.pdb: line 7: Invalid x coordinate"
        );
    }

    #[test]
    fn test_smiles_error_is_invalid_structure() {
        let mapped: DockError = SmilesError::Empty.into();
        assert!(matches!(mapped, DockError::InvalidStructure(_)));

        let mapped: DockError = LigandError::Volume(GridError::InvalidSpacing(0.0)).into();
        assert!(matches!(mapped, DockError::InvalidStructure(_)));
    }
}
