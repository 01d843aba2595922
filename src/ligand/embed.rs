//! Deterministic 3D coordinates for a ligand graph
//!
//! Hydrogens are made explicit, then a seeded random build-up places each
//! atom next to its parent and a relaxation pass enforces bond lengths,
//! bond angles and non-bonded contact limits.

use nalgebra::Vector3;
use rand::prelude::*;
use std::collections::VecDeque;

use super::smiles::{element, BondOrder, ElementInfo, MolGraph};
use crate::atom::{Atom, AtomType};
use crate::molecule::Molecule;

/// Parameters for coordinate generation
#[derive(Debug, Clone)]
pub struct EmbedParams {
    /// Seed for the initial placement
    pub seed: u64,

    /// Number of relaxation sweeps over all restraints
    pub iterations: usize,

    /// Lower bound on 1-4 contacts, as a fraction of the summed vdW radii
    pub contact_scale_14: f64,

    /// Lower bound on longer-range contacts, as a fraction of the summed vdW radii
    pub contact_scale: f64,
}

impl Default for EmbedParams {
    fn default() -> Self {
        Self {
            seed: 0xD0C5,
            iterations: 300,
            contact_scale_14: 0.75,
            contact_scale: 0.85,
        }
    }
}

/// Distance restraint between two atoms
#[derive(Debug, Clone, Copy)]
struct Restraint {
    i: usize,
    j: usize,
    target: f64,
    /// Only enforced when the pair is closer than `target`
    lower_bound: bool,
}

/// Generates conformers for molecular graphs
#[derive(Debug, Clone, Default)]
pub struct Embedder {
    pub params: EmbedParams,
}

impl Embedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: EmbedParams) -> Self {
        Self { params }
    }

    /// Build a hydrogen-complete molecule with 3D coordinates
    pub fn embed(&self, graph: &MolGraph, name: &str) -> Molecule {
        let (elements, charges, bonds) = with_explicit_hydrogens(graph);
        let n = elements.len();

        let mut adjacency: Vec<Vec<(usize, BondOrder)>> = vec![Vec::new(); n];
        for &(a, b, order) in &bonds {
            adjacency[a].push((b, order));
            adjacency[b].push((a, order));
        }

        let restraints = self.restraints(&elements, &bonds, &adjacency);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut coords = initial_coordinates(&elements, &adjacency, &mut rng);

        for _ in 0..self.params.iterations {
            for r in &restraints {
                relax(&mut coords, r, &mut rng);
            }
        }

        let mut molecule = Molecule::new(name);
        for (idx, (info, position)) in elements.iter().zip(coords).enumerate() {
            let mut atom = Atom::new(
                AtomType::from_element(info.symbol),
                position,
                format!("{}{}", info.symbol, idx + 1),
                idx as u32 + 1,
                "UNL".to_string(),
                1,
                'A',
                charges[idx] as f64,
            );
            atom.hetero = true;
            molecule.add_atom(atom);
        }
        molecule
    }

    fn restraints(
        &self,
        elements: &[&'static ElementInfo],
        bonds: &[(usize, usize, BondOrder)],
        adjacency: &[Vec<(usize, BondOrder)>],
    ) -> Vec<Restraint> {
        let n = elements.len();
        let mut restraints = Vec::new();

        let mut bonded_length = vec![Vec::new(); n];
        for &(a, b, order) in bonds {
            let target = bond_length(elements[a], elements[b], order);
            bonded_length[a].push((b, target));
            bonded_length[b].push((a, target));
            restraints.push(Restraint { i: a, j: b, target, lower_bound: false });
        }

        // 1-3 distances from the ideal angle at the shared atom
        for center in 0..n {
            let angle = ideal_angle(&adjacency[center]);
            let arms = &bonded_length[center];
            for (x, &(i, a)) in arms.iter().enumerate() {
                for &(k, b) in &arms[x + 1..] {
                    let target = (a * a + b * b - 2.0 * a * b * angle.cos()).sqrt();
                    restraints.push(Restraint { i, j: k, target, lower_bound: false });
                }
            }
        }

        let radii: Vec<f64> = elements
            .iter()
            .map(|e| AtomType::from_element(e.symbol).vdw_radius())
            .collect();
        for i in 0..n {
            let separation = topological_distances(adjacency, i);
            for j in i + 1..n {
                let scale = match separation[j] {
                    Some(d) if d < 3 => continue,
                    Some(3) => self.params.contact_scale_14,
                    _ => self.params.contact_scale,
                };
                restraints.push(Restraint {
                    i,
                    j,
                    target: scale * (radii[i] + radii[j]),
                    lower_bound: true,
                });
            }
        }
        restraints
    }
}

/// Element, formal charge and bond lists with every hydrogen as an atom
fn with_explicit_hydrogens(
    graph: &MolGraph,
) -> (Vec<&'static ElementInfo>, Vec<i8>, Vec<(usize, usize, BondOrder)>) {
    let mut elements: Vec<&'static ElementInfo> = graph.atoms.iter().map(|a| a.element).collect();
    let mut charges: Vec<i8> = graph.atoms.iter().map(|a| a.charge).collect();
    let mut bonds: Vec<(usize, usize, BondOrder)> = graph
        .bonds
        .iter()
        .map(|b| (b.begin, b.end, b.order))
        .collect();

    if let Some(hydrogen) = element("H") {
        for (idx, atom) in graph.atoms.iter().enumerate() {
            for _ in 0..atom.hydrogens {
                bonds.push((idx, elements.len(), BondOrder::Single));
                elements.push(hydrogen);
                charges.push(0);
            }
        }
    }
    (elements, charges, bonds)
}

fn bond_length(a: &ElementInfo, b: &ElementInfo, order: BondOrder) -> f64 {
    let factor = match order {
        BondOrder::Single => 1.0,
        BondOrder::Aromatic => 0.91,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
    };
    (a.covalent_radius + b.covalent_radius) * factor
}

/// Bond angle at an atom, from its hybridization
fn ideal_angle(bonds: &[(usize, BondOrder)]) -> f64 {
    let doubles = bonds.iter().filter(|(_, o)| *o == BondOrder::Double).count();
    let triple = bonds.iter().any(|(_, o)| *o == BondOrder::Triple);
    let aromatic = bonds.iter().any(|(_, o)| *o == BondOrder::Aromatic);

    let degrees = if triple || doubles >= 2 {
        180.0
    } else if doubles == 1 || aromatic {
        120.0
    } else {
        109.47
    };
    f64::to_radians(degrees)
}

/// Bond counts from `start` to every atom, None when disconnected
fn topological_distances(adjacency: &[Vec<(usize, BondOrder)>], start: usize) -> Vec<Option<usize>> {
    let mut distance = vec![None; adjacency.len()];
    distance[start] = Some(0);
    let mut queue = VecDeque::from([start]);
    while let Some(v) = queue.pop_front() {
        let next = distance[v].map_or(0, |d| d + 1);
        for &(w, _) in &adjacency[v] {
            if distance[w].is_none() {
                distance[w] = Some(next);
                queue.push_back(w);
            }
        }
    }
    distance
}

fn random_direction(rng: &mut StdRng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
            rng.gen::<f64>() * 2.0 - 1.0,
        );
        let norm = v.norm();
        if norm > 1e-3 && norm <= 1.0 {
            return v / norm;
        }
    }
}

/// Breadth-first build-up; each disconnected fragment starts 8 A further along x
fn initial_coordinates(
    elements: &[&'static ElementInfo],
    adjacency: &[Vec<(usize, BondOrder)>],
    rng: &mut StdRng,
) -> Vec<Vector3<f64>> {
    let n = elements.len();
    let mut coords = vec![Vector3::zeros(); n];
    let mut placed = vec![false; n];
    let mut fragment = 0;

    for root in 0..n {
        if placed[root] {
            continue;
        }
        coords[root] = Vector3::new(8.0 * fragment as f64, 0.0, 0.0);
        placed[root] = true;
        fragment += 1;

        let mut queue = VecDeque::from([root]);
        while let Some(parent) = queue.pop_front() {
            for &(child, order) in &adjacency[parent] {
                if placed[child] {
                    continue;
                }
                let length = bond_length(elements[parent], elements[child], order);
                coords[child] = coords[parent] + random_direction(rng) * length;
                placed[child] = true;
                queue.push_back(child);
            }
        }
    }
    coords
}

fn relax(coords: &mut [Vector3<f64>], r: &Restraint, rng: &mut StdRng) {
    let delta = coords[r.j] - coords[r.i];
    let length = delta.norm();
    if length < 1e-6 {
        // Coincident atoms: separate along a random axis
        let push = random_direction(rng) * (0.5 * r.target);
        coords[r.i] -= push;
        coords[r.j] += push;
        return;
    }
    if r.lower_bound && length >= r.target {
        return;
    }
    let shift = delta * (0.5 * (length - r.target) / length);
    coords[r.i] += shift;
    coords[r.j] -= shift;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ligand::smiles::parse_smiles;

    fn embed(smiles: &str) -> Molecule {
        Embedder::new().embed(&parse_smiles(smiles).unwrap(), smiles)
    }

    #[test]
    fn test_hydrogens_are_added() {
        let urea = embed("NC(=O)N");
        assert_eq!(urea.atoms.len(), 8);
        assert_eq!(urea.atoms.iter().filter(|a| a.is_hydrogen()).count(), 4);
    }

    #[test]
    fn test_bond_lengths_are_close_to_targets() {
        let ethane = embed("CC");
        let cc = ethane.atoms[0].distance(&ethane.atoms[1]);
        assert!((cc - 1.52).abs() < 0.1, "C-C distance {}", cc);
        for h in 2..8 {
            let parent = if h < 5 { 0 } else { 1 };
            let ch = ethane.atoms[parent].distance(&ethane.atoms[h]);
            assert!((ch - 1.07).abs() < 0.15, "C-H distance {}", ch);
        }
    }

    #[test]
    fn test_no_clashes() {
        let molecule = embed("CC(C)Cc1ccc(cc1)C(C)C(=O)O");
        for (i, a) in molecule.atoms.iter().enumerate() {
            for b in &molecule.atoms[i + 1..] {
                assert!(a.distance(b) > 0.8);
            }
        }
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let a = embed("c1ccccc1O");
        let b = embed("c1ccccc1O");
        for (x, y) in a.atoms.iter().zip(&b.atoms) {
            assert_eq!(x.coordinates, y.coordinates);
        }
    }

    #[test]
    fn test_fragments_are_separated() {
        let salt = embed("[Na+].[Cl-]");
        assert!(salt.atoms[0].distance(&salt.atoms[1]) > 2.5);
        assert_eq!(salt.atoms[0].charge, 1.0);
    }
}
