//! Molecule representation and residue bookkeeping

use crate::atom::Atom;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Covalent X-H bonds are shorter than this
const HYDROGEN_BOND_LENGTH: f64 = 1.3;

/// Errors that can occur when working with molecules
#[derive(Error, Debug)]
pub enum MoleculeError {
    #[error("No atoms in molecule")]
    EmptyMolecule,

    #[error("Invalid residue id '{0}', expected CHAIN_NUMBER")]
    InvalidResidueId(String),
}

/// Chain plus sequence label, written `A_123` in pocket tables
///
/// Ids order by chain, then sequence number, then insertion code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResidueId {
    pub chain: String,
    pub label: String,
}

impl ResidueId {
    pub fn new(chain: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            label: label.into(),
        }
    }

    /// The residue an atom belongs to
    pub fn of(atom: &Atom) -> Self {
        Self::new(atom.chain_id.to_string().trim(), atom.residue_label())
    }

    /// Sequence number and insertion code; labels without a number sort last
    fn sequence(&self) -> (i64, &str) {
        let label = self.label.as_str();
        let digits = label
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map_or(label.len(), |(i, _)| i);
        match label[..digits].parse() {
            Ok(number) => (number, &label[digits..]),
            Err(_) => (i64::MAX, label),
        }
    }
}

impl Ord for ResidueId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chain
            .cmp(&other.chain)
            .then_with(|| self.sequence().cmp(&other.sequence()))
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for ResidueId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chain, self.label)
    }
}

impl FromStr for ResidueId {
    type Err = MoleculeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('_') {
            Some((chain, label)) if !label.is_empty() => Ok(Self::new(chain, label)),
            _ => Err(MoleculeError::InvalidResidueId(s.to_string())),
        }
    }
}

/// A residue that takes part in an interaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Residue {
    pub id: ResidueId,
    pub name: String,
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.name, self.id.chain, self.id.label)
    }
}

/// Represents a molecule (ligand pose or receptor)
#[derive(Debug, Clone)]
pub struct Molecule {
    /// Name of the molecule
    pub name: String,

    /// List of atoms in the molecule
    pub atoms: Vec<Atom>,

    /// Atom types follow the AutoDock convention (read from PDBQT)
    pub autodock_typed: bool,
}

impl Molecule {
    /// Create a new empty molecule
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            atoms: Vec::new(),
            autodock_typed: false,
        }
    }

    /// Add an atom to the molecule
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        idx
    }

    /// Get the center of the molecule
    pub fn center(&self) -> Result<Vector3<f64>, MoleculeError> {
        if self.atoms.is_empty() {
            return Err(MoleculeError::EmptyMolecule);
        }

        let sum = self.atoms.iter().fold(Vector3::zeros(), |acc, atom| {
            acc + atom.coordinates
        });

        Ok(sum / self.atoms.len() as f64)
    }

    /// Indices of all non-hydrogen atoms
    pub fn heavy_atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_hydrogen())
            .map(|(i, _)| i)
    }

    /// Hydrogens covalently attached to the atom at `idx`
    pub fn attached_hydrogens(&self, idx: usize) -> Vec<usize> {
        let Some(center) = self.atoms.get(idx) else {
            return Vec::new();
        };
        if center.is_hydrogen() {
            return Vec::new();
        }

        self.atoms
            .iter()
            .enumerate()
            .filter(|(i, a)| {
                *i != idx
                    && a.is_hydrogen()
                    && a.chain_id == center.chain_id
                    && a.residue_num == center.residue_num
                    && center.distance(a) < HYDROGEN_BOND_LENGTH
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Atom indices grouped by residue
    pub fn residue_index(&self) -> HashMap<ResidueId, Vec<usize>> {
        let mut index: HashMap<ResidueId, Vec<usize>> = HashMap::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            index.entry(ResidueId::of(atom)).or_default().push(i);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomType;

    fn atom(atom_type: AtomType, name: &str, residue_num: i32, position: Vector3<f64>) -> Atom {
        Atom::new(
            atom_type,
            position,
            name.to_string(),
            1,
            "SER".to_string(),
            residue_num,
            'A',
            0.0,
        )
    }

    fn serine() -> Molecule {
        let mut molecule = Molecule::new("ser");
        molecule.add_atom(atom(AtomType::Carbon, "CB", 5, Vector3::new(0.0, 0.0, 0.0)));
        molecule.add_atom(atom(AtomType::OxygenAcceptor, "OG", 5, Vector3::new(1.4, 0.0, 0.0)));
        molecule.add_atom(atom(AtomType::HydrogenD, "HG", 5, Vector3::new(1.7, 0.9, 0.0)));
        molecule.add_atom(atom(AtomType::Oxygen, "O", 6, Vector3::new(2.0, 0.0, 2.0)));
        molecule
    }

    #[test]
    fn test_residue_id_parse() {
        let id: ResidueId = "A_123".parse().unwrap();
        assert_eq!(id.chain, "A");
        assert_eq!(id.label, "123");
        assert_eq!(id.to_string(), "A_123");

        let inserted: ResidueId = " B_52A ".parse().unwrap();
        assert_eq!(inserted, ResidueId::new("B", "52A"));
    }

    #[test]
    fn test_residue_ids_sort_by_sequence() {
        let mut ids: Vec<ResidueId> = ["B_2", "A_104A", "A_104", "A_15", "A_-3", "A_HOH", "A_104B"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        ids.sort();
        let sorted: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(sorted, ["A_-3", "A_15", "A_104", "A_104A", "A_104B", "A_HOH", "B_2"]);

        let residues: std::collections::BTreeSet<Residue> = [("ASP", "104"), ("ARG", "15")]
            .iter()
            .map(|&(name, label)| Residue {
                id: ResidueId::new("A", label),
                name: name.to_string(),
            })
            .collect();
        let labels: Vec<String> = residues.iter().map(|r| r.to_string()).collect();
        assert_eq!(labels, ["ARG-A15", "ASP-A104"]);
    }

    #[test]
    fn test_residue_id_rejects_missing_label() {
        assert!("A123".parse::<ResidueId>().is_err());
        assert!("A_".parse::<ResidueId>().is_err());
    }

    #[test]
    fn test_center() {
        let molecule = serine();
        let center = molecule.center().unwrap();
        assert!((center.x - 5.1 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_molecule_has_no_center() {
        let molecule = Molecule::new("empty");
        assert!(matches!(molecule.center(), Err(MoleculeError::EmptyMolecule)));
    }

    #[test]
    fn test_attached_hydrogens() {
        let molecule = serine();
        assert_eq!(molecule.attached_hydrogens(1), vec![2]);
        assert!(molecule.attached_hydrogens(0).is_empty());
        assert!(molecule.attached_hydrogens(3).is_empty());
    }

    #[test]
    fn test_residue_index_groups_atoms() {
        let molecule = serine();
        let index = molecule.residue_index();
        assert_eq!(index[&ResidueId::new("A", "5")], vec![0, 1, 2]);
        assert_eq!(index[&ResidueId::new("A", "6")], vec![3]);
        assert_eq!(molecule.heavy_atoms().count(), 3);
    }

    #[test]
    fn test_residue_display() {
        let residue = Residue {
            id: ResidueId::new("A", "15"),
            name: "ARG".to_string(),
        };
        assert_eq!(residue.to_string(), "ARG-A15");
    }
}
