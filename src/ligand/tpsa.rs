//! Topological polar surface area from nitrogen and oxygen fragment contributions

use super::smiles::{BondOrder, MolGraph};

/// Bond environment of one polar atom
struct Environment {
    neighbors: usize,
    hydrogens: u8,
    charge: i8,
    single: usize,
    double: usize,
    triple: usize,
    aromatic: usize,
    three_ring: bool,
}

impl Environment {
    fn of(graph: &MolGraph, idx: usize) -> Self {
        let nbrs = graph.heavy_neighbors(idx);
        let count = |order: BondOrder| nbrs.iter().filter(|(_, o)| *o == order).count();
        Self {
            neighbors: nbrs.len(),
            hydrogens: graph.total_hydrogens(idx),
            charge: graph.atoms[idx].charge,
            single: count(BondOrder::Single),
            double: count(BondOrder::Double),
            triple: count(BondOrder::Triple),
            aromatic: count(BondOrder::Aromatic),
            three_ring: graph.in_three_ring(idx),
        }
    }

    /// (single, double, triple, aromatic)
    fn bonds(&self) -> (usize, usize, usize, usize) {
        (self.single, self.double, self.triple, self.aromatic)
    }
}

/// Polar surface area in square Angstroms
pub fn tpsa(graph: &MolGraph) -> f64 {
    (0..graph.atoms.len())
        .map(|idx| match graph.atoms[idx].element.symbol {
            "N" => nitrogen(&Environment::of(graph, idx)),
            "O" => oxygen(&Environment::of(graph, idx)),
            _ => 0.0,
        })
        .sum()
}

fn nitrogen(env: &Environment) -> f64 {
    let value = match (env.neighbors, env.hydrogens, env.charge, env.bonds()) {
        (1, 0, 0, (_, _, 1, _)) => Some(23.79),
        (1, 1, 0, (_, 1, _, _)) => Some(23.85),
        (1, 2, 0, (1, _, _, _)) => Some(26.02),
        (1, 2, 1, (_, 1, _, _)) => Some(25.59),
        (1, 3, 1, (1, _, _, _)) => Some(27.64),

        (2, 0, 0, (1, 1, _, _)) => Some(12.36),
        (2, 0, 0, (_, 1, 1, _)) => Some(13.60),
        (2, 1, 0, (2, _, _, _)) => Some(if env.three_ring { 21.94 } else { 12.03 }),
        (2, 0, 1, (1, _, 1, _)) => Some(4.36),
        (2, 1, 1, (1, 1, _, _)) => Some(13.97),
        (2, 2, 1, (2, _, _, _)) => Some(16.61),
        (2, 0, 0, (_, _, _, 2)) => Some(12.89),
        (2, 1, 0, (_, _, _, 2)) => Some(15.79),
        (2, 1, 1, (_, _, _, 2)) => Some(14.14),

        (3, 0, 0, (3, _, _, _)) => Some(if env.three_ring { 3.01 } else { 3.24 }),
        (3, 0, 0, (1, 2, _, _)) => Some(11.68),
        (3, 0, 1, (2, 1, _, _)) => Some(3.01),
        (3, 1, 1, (3, _, _, _)) => Some(4.44),
        (3, 0, 0, (_, _, _, 3)) => Some(4.41),
        (3, 0, 0, (1, _, _, 2)) => Some(4.93),
        (3, 0, 0, (_, 1, _, 2)) => Some(8.39),
        (3, 0, 1, (_, _, _, 3)) => Some(4.10),
        (3, 0, 1, (1, _, _, 2)) => Some(3.88),

        (4, 0, 1, (4, _, _, _)) => Some(0.00),
        _ => None,
    };
    value.unwrap_or_else(|| {
        (30.5 - env.neighbors as f64 * 8.2 + env.hydrogens as f64 * 1.5).max(0.0)
    })
}

fn oxygen(env: &Environment) -> f64 {
    let value = match (env.neighbors, env.hydrogens, env.charge, env.bonds()) {
        (1, 0, 0, (_, 1, _, _)) => Some(17.07),
        (1, 1, 0, (1, _, _, _)) => Some(20.23),
        (1, 0, -1, (1, _, _, _)) => Some(23.06),
        (2, 0, 0, (2, _, _, _)) => Some(if env.three_ring { 12.53 } else { 9.23 }),
        (2, 0, 0, (_, _, _, 2)) => Some(13.14),
        _ => None,
    };
    value.unwrap_or_else(|| {
        (28.5 - env.neighbors as f64 * 8.6 + env.hydrogens as f64 * 1.5).max(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ligand::smiles::parse_smiles;
    use assert_approx_eq::assert_approx_eq;

    fn psa(smiles: &str) -> f64 {
        tpsa(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_urea() {
        assert_approx_eq!(psa("NC(=O)N"), 69.11, 1e-9);
    }

    #[test]
    fn test_common_groups() {
        assert_approx_eq!(psa("CCO"), 20.23, 1e-9);
        assert_approx_eq!(psa("CC(=O)O"), 37.30, 1e-9);
        assert_approx_eq!(psa("c1ccncc1"), 12.89, 1e-9);
        assert_approx_eq!(psa("CC#N"), 23.79, 1e-9);
        assert_approx_eq!(psa("CC(=O)[O-]"), 40.13, 1e-9);
    }

    #[test]
    fn test_three_ring_ether() {
        assert_approx_eq!(psa("C1CO1"), 12.53, 1e-9);
        assert_approx_eq!(psa("COC"), 9.23, 1e-9);
    }

    #[test]
    fn test_hydrocarbons_are_nonpolar() {
        assert_eq!(psa("c1ccccc1"), 0.0);
        assert_eq!(psa("CCCC"), 0.0);
    }

    #[test]
    fn test_unlisted_environment_uses_fallback() {
        // water: no heavy neighbours, two hydrogens
        assert_approx_eq!(psa("O"), 31.5, 1e-9);
    }
}
