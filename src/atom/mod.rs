//! Atom representation for PDB and PDBQT structures

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Atom types found in PDBQT files, plus the plain elements PDB files carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    // Non-hydrogen types
    Carbon,            // C
    AromaticCarbon,    // A
    Nitrogen,          // N
    NitrogenAcceptor,  // NA
    Oxygen,            // O
    OxygenAcceptor,    // OA
    Sulfur,            // S
    SulfurAcceptor,    // SA
    Phosphorus,        // P
    Fluorine,          // F
    Chlorine,          // Cl
    Bromine,           // Br
    Iodine,            // I

    // Hydrogen types
    Hydrogen,     // H
    HydrogenD,    // HD (hydrogen bond donor)

    // Metal types
    Zinc,         // Zn
    Calcium,      // Ca
    Manganese,    // Mn
    Magnesium,    // Mg
    Iron,         // Fe

    // For atoms that don't match any of the above
    Unknown,
}

/// Plain element symbols shared by PDB and PDBQT columns
const ELEMENTS: [(&str, AtomType); 14] = [
    ("C", AtomType::Carbon),
    ("N", AtomType::Nitrogen),
    ("O", AtomType::Oxygen),
    ("S", AtomType::Sulfur),
    ("P", AtomType::Phosphorus),
    ("F", AtomType::Fluorine),
    ("Cl", AtomType::Chlorine),
    ("Br", AtomType::Bromine),
    ("I", AtomType::Iodine),
    ("Zn", AtomType::Zinc),
    ("Ca", AtomType::Calcium),
    ("Mn", AtomType::Manganese),
    ("Mg", AtomType::Magnesium),
    ("Fe", AtomType::Iron),
];

impl AtomType {
    /// Van der Waals radius in Angstroms used for surface and volume calculations
    pub fn vdw_radius(&self) -> f64 {
        match self {
            AtomType::Carbon | AtomType::AromaticCarbon => 1.70,
            AtomType::Nitrogen | AtomType::NitrogenAcceptor => 1.55,
            AtomType::Oxygen | AtomType::OxygenAcceptor => 1.52,
            AtomType::Sulfur | AtomType::SulfurAcceptor => 1.80,
            AtomType::Phosphorus => 1.80,
            AtomType::Fluorine => 1.47,
            AtomType::Chlorine => 1.75,
            AtomType::Bromine => 1.85,
            AtomType::Iodine => 1.98,
            AtomType::Hydrogen | AtomType::HydrogenD => 1.10,
            AtomType::Zinc => 1.39,
            AtomType::Calcium => 2.31,
            AtomType::Manganese => 1.97,
            AtomType::Magnesium => 1.73,
            AtomType::Iron => 1.94,
            AtomType::Unknown => 1.80,
        }
    }

    /// AutoDock type column of a PDBQT record; plain element symbols otherwise
    pub fn from_pdbqt_string(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "A" => AtomType::AromaticCarbon,
            "NA" => AtomType::NitrogenAcceptor,
            "OA" => AtomType::OxygenAcceptor,
            "SA" => AtomType::SulfurAcceptor,
            "HD" => AtomType::HydrogenD,
            other => Self::from_element(other),
        }
    }

    /// Element symbol of a PDB record (columns 77-78)
    pub fn from_element(s: &str) -> Self {
        let symbol = s.trim().to_uppercase();
        let found = match symbol.as_str() {
            "H" | "D" => Some(AtomType::Hydrogen),
            _ => ELEMENTS.iter().find(|(sym, _)| sym.eq_ignore_ascii_case(&symbol)).map(|&(_, t)| t),
        };
        found.unwrap_or(AtomType::Unknown)
    }

    /// Chemical element symbol behind the type
    pub fn element(&self) -> &'static str {
        match self {
            AtomType::AromaticCarbon => "C",
            AtomType::NitrogenAcceptor => "N",
            AtomType::OxygenAcceptor => "O",
            AtomType::SulfurAcceptor => "S",
            AtomType::Hydrogen | AtomType::HydrogenD => "H",
            other => ELEMENTS
                .iter()
                .find(|(_, t)| t == other)
                .map_or("X", |&(sym, _)| sym),
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self, AtomType::Hydrogen | AtomType::HydrogenD)
    }

    /// Nitrogen or oxygen, the only elements considered for hydrogen bonds
    pub fn is_polar(&self) -> bool {
        matches!(
            self,
            AtomType::Nitrogen
                | AtomType::NitrogenAcceptor
                | AtomType::Oxygen
                | AtomType::OxygenAcceptor
        )
    }
}

/// Represents an atom in 3D space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// Atom type
    pub atom_type: AtomType,

    /// 3D coordinates (in Angstroms)
    pub coordinates: Vector3<f64>,

    /// Atom name from PDB format (e.g., "CA", "N", "O")
    pub name: String,

    /// Atom serial number from PDB
    pub serial: u32,

    /// Residue name this atom belongs to
    pub residue_name: String,

    /// Residue sequence number
    pub residue_num: i32,

    /// Insertion code following the residue number
    pub insertion_code: Option<char>,

    /// Chain identifier
    pub chain_id: char,

    /// Partial charge
    pub charge: f64,

    /// Read from a HETATM record
    pub hetero: bool,
}

impl Atom {
    /// Create a new atom
    pub fn new(
        atom_type: AtomType,
        coordinates: Vector3<f64>,
        name: String,
        serial: u32,
        residue_name: String,
        residue_num: i32,
        chain_id: char,
        charge: f64,
    ) -> Self {
        Self {
            atom_type,
            coordinates,
            name,
            serial,
            residue_name,
            residue_num,
            insertion_code: None,
            chain_id,
            charge,
            hetero: false,
        }
    }

    /// Calculate distance to another atom
    pub fn distance(&self, other: &Atom) -> f64 {
        (self.coordinates - other.coordinates).norm()
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atom_type.is_hydrogen()
    }

    /// AutoDock acceptor type (NA, OA, SA)
    pub fn is_typed_acceptor(&self) -> bool {
        matches!(
            self.atom_type,
            AtomType::NitrogenAcceptor | AtomType::OxygenAcceptor | AtomType::SulfurAcceptor
        )
    }

    /// Residue sequence label, the number followed by any insertion code
    pub fn residue_label(&self) -> String {
        match self.insertion_code {
            Some(code) => format!("{}{}", self.residue_num, code),
            None => self.residue_num.to_string(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}:{} ({:.3}, {:.3}, {:.3})",
            self.residue_name,
            self.chain_id,
            self.residue_label(),
            self.name,
            self.coordinates.x,
            self.coordinates.y,
            self.coordinates.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn atom(atom_type: AtomType, name: &str, position: Vector3<f64>) -> Atom {
        Atom::new(atom_type, position, name.to_string(), 1, "ARG".to_string(), 15, 'A', 0.0)
    }

    #[test]
    fn test_atom_type_from_pdbqt_string() {
        assert_eq!(AtomType::from_pdbqt_string("C"), AtomType::Carbon);
        assert_eq!(AtomType::from_pdbqt_string("A"), AtomType::AromaticCarbon);
        assert_eq!(AtomType::from_pdbqt_string("NA"), AtomType::NitrogenAcceptor);
        assert_eq!(AtomType::from_pdbqt_string("OA"), AtomType::OxygenAcceptor);
        assert_eq!(AtomType::from_pdbqt_string("HD"), AtomType::HydrogenD);
        assert_eq!(AtomType::from_pdbqt_string("Cl"), AtomType::Chlorine);
        assert_eq!(AtomType::from_pdbqt_string("UNKNOWN"), AtomType::Unknown);
    }

    #[test]
    fn test_pdb_element_is_not_autodock_type() {
        // "NA" in a PDB element column is sodium, not an acceptor nitrogen
        assert_eq!(AtomType::from_element("NA"), AtomType::Unknown);
        assert_eq!(AtomType::from_element(" N"), AtomType::Nitrogen);
        assert_eq!(AtomType::from_element("D"), AtomType::Hydrogen);
    }

    #[test]
    fn test_element_symbols() {
        assert_eq!(AtomType::AromaticCarbon.element(), "C");
        assert_eq!(AtomType::OxygenAcceptor.element(), "O");
        assert_eq!(AtomType::HydrogenD.element(), "H");
        assert_eq!(AtomType::Chlorine.element(), "Cl");
    }

    #[test]
    fn test_polar_types() {
        assert!(AtomType::NitrogenAcceptor.is_polar());
        assert!(AtomType::Oxygen.is_polar());
        assert!(!AtomType::SulfurAcceptor.is_polar());
        assert!(!AtomType::Carbon.is_polar());
    }

    #[test]
    fn test_atom_distance() {
        let atom1 = atom(AtomType::Carbon, "CA", Vector3::new(0.0, 0.0, 0.0));
        let atom2 = atom(AtomType::Carbon, "CB", Vector3::new(1.0, 1.0, 1.0));

        // Distance should be sqrt(3)
        assert!((atom1.distance(&atom2) - 1.732).abs() < 0.001);
    }

    #[test]
    fn test_typed_acceptor() {
        let oa = atom(AtomType::OxygenAcceptor, "O", Vector3::zeros());
        let n = atom(AtomType::Nitrogen, "N", Vector3::zeros());

        assert!(oa.is_typed_acceptor());
        assert!(!n.is_typed_acceptor());
    }

    #[test]
    fn test_residue_label_with_insertion_code() {
        let mut a = atom(AtomType::Nitrogen, "NH1", Vector3::zeros());
        assert_eq!(a.residue_label(), "15");
        a.insertion_code = Some('B');
        assert_eq!(a.residue_label(), "15B");
    }

    #[test]
    fn test_atom_display() {
        let a = atom(AtomType::Nitrogen, "NH1", Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(format!("{}", a), "ARG A15:NH1 (1.000, 2.000, 3.000)");
    }
}
