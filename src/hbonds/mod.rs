//! Protein-ligand hydrogen-bond detection

use nalgebra::Vector3;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::atom::Atom;
use crate::molecule::{Molecule, Residue, ResidueId};

/// Standard amino acids, whose donors and acceptors follow residue chemistry
const AMINO_ACIDS: [&str; 20] = [
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU", "LYS", "MET",
    "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
];

/// Parameters for hydrogen-bond detection
#[derive(Debug, Clone)]
pub struct HBondParams {
    /// Maximum donor-acceptor distance in Angstroms
    pub distance: f64,

    /// Maximum deviation of D-H...A from linear, in degrees
    pub angle: f64,
}

impl Default for HBondParams {
    fn default() -> Self {
        Self {
            distance: 3.2,
            angle: 25.0,
        }
    }
}

/// A donor-acceptor pair between receptor and ligand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HBond {
    /// Atom indices into the receptor and ligand molecules
    pub receptor_atom: usize,
    pub ligand_atom: usize,

    /// Serial numbers from the input files
    pub receptor_serial: u32,
    pub ligand_serial: u32,

    pub distance: f64,
    pub residue: Residue,

    /// True when the ligand atom is the donor
    pub ligand_donor: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Roles {
    donor: bool,
    acceptor: bool,
}

/// Donor and acceptor roles of one atom
fn roles(molecule: &Molecule, idx: usize) -> Roles {
    let atom = &molecule.atoms[idx];
    if !atom.atom_type.is_polar() {
        return Roles::default();
    }
    let has_hydrogen = !molecule.attached_hydrogens(idx).is_empty();

    if molecule.autodock_typed {
        return Roles {
            donor: has_hydrogen,
            acceptor: atom.is_typed_acceptor(),
        };
    }

    let residue = atom.residue_name.trim().to_ascii_uppercase();
    let name = atom.name.trim();
    let oxygen = atom.atom_type.element() == "O";

    if matches!(residue.as_str(), "HOH" | "WAT" | "DOD") {
        return Roles {
            donor: oxygen,
            acceptor: oxygen,
        };
    }
    if !AMINO_ACIDS.contains(&residue.as_str()) {
        return Roles {
            donor: true,
            acceptor: true,
        };
    }

    let side_chain_donor = matches!(
        (residue.as_str(), name),
        ("SER", "OG")
            | ("THR", "OG1")
            | ("TYR", "OH")
            | ("ARG", "NE" | "NH1" | "NH2")
            | ("ASN", "ND2")
            | ("GLN", "NE2")
            | ("HIS", "ND1" | "NE2")
            | ("LYS", "NZ")
            | ("TRP", "NE1")
    );
    let backbone_donor = name == "N" && residue != "PRO";
    let ring_acceptor = residue == "HIS" && matches!(name, "ND1" | "NE2");

    Roles {
        donor: has_hydrogen || side_chain_donor || backbone_donor,
        acceptor: oxygen || ring_acceptor,
    }
}

/// Angle at the hydrogen between the donor and the acceptor, in degrees
fn dha_angle(donor: &Vector3<f64>, hydrogen: &Vector3<f64>, acceptor: &Vector3<f64>) -> f64 {
    let to_donor = donor - hydrogen;
    let to_acceptor = acceptor - hydrogen;
    let cos = to_donor.dot(&to_acceptor) / (to_donor.norm() * to_acceptor.norm());
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Finds hydrogen bonds between a receptor and a ligand pose
#[derive(Debug, Clone, Default)]
pub struct HBondDetector {
    pub params: HBondParams,
}

impl HBondDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: HBondParams) -> Self {
        Self { params }
    }

    /// Donor geometry is acceptable: no explicit hydrogens, or one of them
    /// points at the acceptor within the angle cutoff
    fn donor_geometry(&self, molecule: &Molecule, donor: usize, acceptor: &Atom) -> bool {
        let hydrogens = molecule.attached_hydrogens(donor);
        if hydrogens.is_empty() {
            return true;
        }
        let min_angle = 180.0 - self.params.angle;
        let d = &molecule.atoms[donor].coordinates;
        hydrogens.iter().any(|&h| {
            dha_angle(d, &molecule.atoms[h].coordinates, &acceptor.coordinates) >= min_angle
        })
    }

    /// All donor-acceptor pairs within the distance cutoff, receptor order first
    pub fn detect(&self, receptor: &Molecule, ligand: &Molecule) -> Vec<HBond> {
        let ligand_polar: Vec<(usize, Roles)> = ligand
            .atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.atom_type.is_polar())
            .map(|(i, _)| (i, roles(ligand, i)))
            .collect();
        if ligand_polar.is_empty() {
            return Vec::new();
        }

        let cutoff2 = self.params.distance * self.params.distance;
        let mut bonds = Vec::new();

        for (r, receptor_atom) in receptor.atoms.iter().enumerate() {
            if !receptor_atom.atom_type.is_polar() {
                continue;
            }
            let mut receptor_roles = None;

            for &(l, ligand_roles) in &ligand_polar {
                let ligand_atom = &ligand.atoms[l];
                let d2 = (receptor_atom.coordinates - ligand_atom.coordinates).norm_squared();
                if d2 > cutoff2 {
                    continue;
                }
                let rr = *receptor_roles.get_or_insert_with(|| roles(receptor, r));

                let receptor_donates = rr.donor
                    && ligand_roles.acceptor
                    && self.donor_geometry(receptor, r, ligand_atom);
                let ligand_donates = ligand_roles.donor
                    && rr.acceptor
                    && self.donor_geometry(ligand, l, receptor_atom);
                if !(receptor_donates || ligand_donates) {
                    continue;
                }

                bonds.push(HBond {
                    receptor_atom: r,
                    ligand_atom: l,
                    receptor_serial: receptor_atom.serial,
                    ligand_serial: ligand_atom.serial,
                    distance: d2.sqrt(),
                    residue: Residue {
                        id: ResidueId::of(receptor_atom),
                        name: receptor_atom.residue_name.trim().to_string(),
                    },
                    ligand_donor: ligand_donates && !receptor_donates,
                });
            }
        }
        bonds
    }
}

/// Distinct receptor residues taking part in the given bonds
pub fn bonded_residues(bonds: &[HBond]) -> BTreeSet<Residue> {
    bonds.iter().map(|b| b.residue.clone()).collect()
}
