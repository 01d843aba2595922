//! Wildman-Crippen atom-type contributions to logP

use super::smiles::{BondOrder, GraphAtom, MolGraph};

const HETERO: [&str; 8] = ["N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Elements covered by their own carbon, nitrogen, oxygen, sulfur or halogen types
const TYPED: [&str; 9] = ["C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Octanol/water partition coefficient as a sum of atomic contributions
pub fn crippen_logp(graph: &MolGraph) -> f64 {
    (0..graph.atoms.len())
        .map(|idx| {
            let atom = &graph.atoms[idx];
            if atom.is_hydrogen() {
                // Bracket hydrogens take the type of their parent atom
                return match graph.neighbors(idx).first() {
                    Some(&(parent, _)) => hydrogen(graph, parent),
                    None => 0.1125,
                };
            }
            heavy_atom(graph, idx) + atom.hydrogens as f64 * hydrogen(graph, idx)
        })
        .sum()
}

fn heavy_atom(graph: &MolGraph, idx: usize) -> f64 {
    let atom = &graph.atoms[idx];
    match atom.element.symbol {
        "C" if atom.aromatic => aromatic_carbon(graph, idx),
        "C" => aliphatic_carbon(graph, idx),
        "N" => nitrogen(graph, idx),
        "O" => oxygen(graph, idx),
        "S" if atom.aromatic => 0.6237,
        "S" if atom.charge != 0 => -0.0024,
        "S" => 0.6482,
        "P" => 0.8612,
        "F" | "Cl" | "Br" | "I" if atom.charge != 0 => -2.996,
        "F" => 0.4202,
        "Cl" => 0.6895,
        "Br" => 0.8456,
        "I" => 0.8857,
        "Li" | "Na" | "K" => -0.3808,
        _ => -0.0025,
    }
}

/// Heavy plus hydrogen connections
fn connectivity(graph: &MolGraph, idx: usize) -> usize {
    graph.heavy_degree(idx) + graph.total_hydrogens(idx) as usize
}

fn is_aliphatic(atom: &GraphAtom, symbol: &str) -> bool {
    atom.is(symbol) && !atom.aromatic
}

fn hetero(atom: &GraphAtom) -> bool {
    !atom.aromatic && HETERO.contains(&atom.element.symbol)
}

fn aliphatic_carbon(graph: &MolGraph, idx: usize) -> f64 {
    let h = graph.total_hydrogens(idx) as usize;
    let nbrs = graph.heavy_neighbors(idx);
    let deg = nbrs.len();
    let atom = |n: usize| &graph.atoms[n];

    let sp3 = deg + h == 4 && nbrs.iter().all(|(_, o)| *o == BondOrder::Single);
    let all_aliphatic = nbrs.iter().all(|(n, _)| !atom(*n).aromatic);
    let any_aromatic = !all_aliphatic;
    let all_carbon = nbrs.iter().all(|(n, _)| is_aliphatic(atom(*n), "C"));
    let any_hetero = nbrs.iter().any(|(n, _)| hetero(atom(*n)));
    let double_to = |pred: &dyn Fn(&GraphAtom) -> bool| {
        nbrs.iter()
            .filter(|(n, o)| *o == BondOrder::Double && pred(atom(*n)))
            .count()
    };

    if sp3 && all_carbon && matches!((h, deg), (4, 0) | (3, 1) | (2, 2)) {
        return 0.1441;
    }
    if sp3 && all_carbon && matches!((h, deg), (1, 3) | (0, 4)) {
        return 0.0;
    }
    if sp3 && ((h == 3 && any_hetero) || (h == 2 && any_hetero && all_aliphatic)) {
        return -0.2035;
    }
    if sp3 && h <= 1 && any_hetero && all_aliphatic {
        return -0.2051;
    }
    if double_to(&|a| !a.aromatic && !a.is("C")) > 0 {
        return -0.2783;
    }

    let double_c = double_to(&|a| is_aliphatic(a, "C"));
    if double_c > 0
        && all_aliphatic
        && (matches!((h, deg), (2, 1) | (1, 2) | (0, 3)) || (h == 0 && double_c == 2))
    {
        return 0.1551;
    }
    if deg + h == 2
        && nbrs
            .iter()
            .any(|(n, o)| *o == BondOrder::Triple && !atom(*n).aromatic)
    {
        return 0.0017;
    }
    if h == 3 && deg == 1 {
        let nb = atom(nbrs[0].0);
        if nb.aromatic {
            return if nb.is("C") { 0.08452 } else { -0.1444 };
        }
    }
    if sp3 && any_aromatic {
        return match h {
            2 => -0.0516,
            1 => 0.1193,
            _ => -0.0967,
        };
    }
    if (double_c > 0 && any_aromatic && matches!((h, deg), (1, 2) | (0, 3)))
        || double_to(&|a| a.aromatic && a.is("C")) > 0
    {
        return 0.2640;
    }
    if sp3
        && nbrs
            .iter()
            .any(|(n, _)| !atom(*n).aromatic && !TYPED.contains(&atom(*n).element.symbol))
    {
        return 0.2148;
    }
    0.08129
}

fn aromatic_carbon(graph: &MolGraph, idx: usize) -> f64 {
    let h = graph.total_hydrogens(idx);
    let nbrs = graph.heavy_neighbors(idx);
    let atom = |n: usize| &graph.atoms[n];

    if h == 0
        && nbrs.iter().any(|(n, o)| {
            *o == BondOrder::Single
                && !atom(*n).aromatic
                && !matches!(atom(*n).element.symbol, "C" | "N" | "O" | "S" | "F" | "Cl" | "Br" | "I")
        })
    {
        return -0.5443;
    }
    for (symbol, value) in [("F", 0.0), ("Cl", 0.2450), ("Br", 0.1980), ("I", 0.0)] {
        if nbrs.iter().any(|(n, _)| atom(*n).is(symbol)) {
            return value;
        }
    }
    if h > 0 {
        return 0.1581;
    }

    let aromatic_bonds = nbrs.iter().filter(|(_, o)| *o == BondOrder::Aromatic).count();
    if aromatic_bonds >= 3 {
        return 0.2955;
    }
    if aromatic_bonds == 2 {
        let substituents: Vec<(&GraphAtom, BondOrder)> = nbrs
            .iter()
            .filter(|(_, o)| *o != BondOrder::Aromatic)
            .map(|(n, o)| (atom(*n), *o))
            .collect();
        let single = |pred: &dyn Fn(&GraphAtom) -> bool| {
            substituents
                .iter()
                .any(|(a, o)| *o == BondOrder::Single && pred(a))
        };
        if single(&|a| a.aromatic) {
            return 0.2713;
        }
        for (symbol, value) in [("C", 0.1360), ("N", 0.4619), ("O", 0.5437), ("S", 0.1893)] {
            if single(&|a| is_aliphatic(a, symbol)) {
                return value;
            }
        }
        if substituents.iter().any(|(a, o)| {
            *o == BondOrder::Double && !a.aromatic && matches!(a.element.symbol, "C" | "N" | "O")
        }) {
            return -0.8186;
        }
    }
    0.08129
}

fn nitrogen(graph: &MolGraph, idx: usize) -> f64 {
    const FALLBACK: f64 = -0.4806;

    let n = &graph.atoms[idx];
    let h = graph.total_hydrogens(idx);
    let nbrs = graph.heavy_neighbors(idx);
    let deg = nbrs.len();
    let count = |order: BondOrder| nbrs.iter().filter(|(_, o)| *o == order).count();
    let (singles, doubles, triples) = (
        count(BondOrder::Single),
        count(BondOrder::Double),
        count(BondOrder::Triple),
    );
    let any_aromatic = nbrs.iter().any(|(a, _)| graph.atoms[*a].aromatic);

    if n.aromatic {
        return match n.charge {
            0 => -0.3239,
            c if c > 0 => -1.119,
            _ => FALLBACK,
        };
    }

    match n.charge {
        0 => match (h, deg) {
            (2, 1) if singles == 1 => {
                if any_aromatic {
                    -1.027
                } else {
                    -1.019
                }
            }
            (1, 2) if singles == 2 => {
                if any_aromatic {
                    -0.5188
                } else {
                    -0.7096
                }
            }
            (1, 1) if doubles == 1 => 0.08387,
            (0, 2) if doubles == 1 => 0.1836,
            (0, 3) if singles == 3 => {
                if any_aromatic {
                    -0.4458
                } else {
                    -0.3187
                }
            }
            (0, 1) if triples == 1 => 0.01508,
            _ => FALLBACK,
        },
        c if c > 0 => {
            let to_carbon = nbrs.iter().any(|(a, _)| graph.atoms[*a].is("C"));
            if h > 0 {
                -1.95
            } else if singles == 4 || (doubles == 1 && singles == 2) || (doubles == 2 && to_carbon) {
                -0.3396
            } else if triples == 1 || doubles == 2 {
                0.2887
            } else {
                FALLBACK
            }
        }
        _ => 0.2887,
    }
}

fn oxygen(graph: &MolGraph, idx: usize) -> f64 {
    const FALLBACK: f64 = -0.1188;

    let o = &graph.atoms[idx];
    if o.aromatic {
        return 0.1552;
    }
    if graph.total_hydrogens(idx) > 0 {
        return -0.2893;
    }

    let nbrs = graph.heavy_neighbors(idx);
    if nbrs.len() == 2 && nbrs.iter().all(|(_, b)| *b == BondOrder::Single) {
        return if nbrs.iter().all(|(n, _)| !graph.atoms[*n].aromatic) {
            -0.0684
        } else {
            -0.4195
        };
    }
    if nbrs.len() != 1 {
        return FALLBACK;
    }

    let (n, order) = nbrs[0];
    let nb = &graph.atoms[n];
    match order {
        BondOrder::Double if nb.is("N") || nb.is("O") => 0.0335,
        BondOrder::Single if o.charge < 0 => {
            if nb.is("N") {
                0.0335
            } else if nb.is("S") {
                -0.3339
            } else if nb.is("C")
                && graph
                    .heavy_neighbors(n)
                    .iter()
                    .any(|(m, b)| *m != idx && *b == BondOrder::Double && graph.atoms[*m].is("O"))
            {
                -1.326
            } else {
                -1.189
            }
        }
        BondOrder::Double if nb.aromatic => 0.1788,
        BondOrder::Double if nb.is("C") => carbonyl_oxygen(graph, n, idx),
        _ => FALLBACK,
    }
}

/// Carbonyl oxygen, typed by the substituents of its carbon
fn carbonyl_oxygen(graph: &MolGraph, carbon: usize, oxygen: usize) -> f64 {
    let h = graph.total_hydrogens(carbon);
    let others: Vec<(&GraphAtom, BondOrder)> = graph
        .heavy_neighbors(carbon)
        .into_iter()
        .filter(|(n, _)| *n != oxygen)
        .map(|(n, o)| (&graph.atoms[n], o))
        .collect();

    let aliphatic_c = |a: &GraphAtom| is_aliphatic(a, "C");
    let aromatic_c = |a: &GraphAtom| a.aromatic && a.is("C");

    let ketone_like = match (h, others.as_slice()) {
        (1, [(a, _)]) => aliphatic_c(a) || is_aliphatic(a, "N") || is_aliphatic(a, "O"),
        (0, [(a, _), (b, _)]) => {
            (aliphatic_c(a) && !b.aromatic) || (aliphatic_c(b) && !a.aromatic)
        }
        (2, []) => true,
        (0, [(a, BondOrder::Double)]) => a.is("O"),
        _ => false,
    };
    if ketone_like {
        return -0.1526;
    }

    let aryl_like = match (h, others.as_slice()) {
        (1, [(a, _)]) => aromatic_c(a),
        (0, [(a, _), (b, _)]) => {
            (a.is("C") && b.aromatic)
                || (b.is("C") && a.aromatic)
                || (aromatic_c(a) && !b.aromatic)
                || (aromatic_c(b) && !a.aromatic)
        }
        _ => false,
    };
    if aryl_like {
        return 0.1129;
    }

    if others.len() == 2 && others.iter().all(|(a, _)| !a.is("C")) {
        return 0.4833;
    }
    -0.1188
}

/// Contribution of one hydrogen attached to `parent`
fn hydrogen(graph: &MolGraph, parent: usize) -> f64 {
    let p = &graph.atoms[parent];
    match p.element.symbol {
        "C" | "H" => 0.1230,
        "N" => 0.2142,
        "O" => {
            let nbrs = graph.heavy_neighbors(parent);
            let other_hydrogens = graph.total_hydrogens(parent).saturating_sub(1);
            let alcohol_like = other_hydrogens > 0
                || nbrs.iter().any(|(n, _)| {
                    let a = &graph.atoms[*n];
                    (is_aliphatic(a, "C") && connectivity(graph, *n) == 4)
                        || (a.aromatic && a.is("C"))
                        || !matches!(a.element.symbol, "C" | "N" | "O" | "S")
                });
            if alcohol_like {
                return -0.2677;
            }
            if nbrs.iter().any(|(n, _)| graph.atoms[*n].is("N")) {
                return 0.2142;
            }
            let acid_like = nbrs.iter().any(|(n, _)| {
                let a = &graph.atoms[*n];
                a.is("O")
                    || a.is("S")
                    || (a.is("C")
                        && graph.heavy_neighbors(*n).iter().any(|(m, b)| {
                            *b == BondOrder::Double
                                && matches!(graph.atoms[*m].element.symbol, "C" | "N" | "O" | "S")
                        }))
            });
            if acid_like {
                0.2980
            } else {
                0.1125
            }
        }
        _ => -0.2677,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ligand::smiles::parse_smiles;
    use assert_approx_eq::assert_approx_eq;

    fn logp(smiles: &str) -> f64 {
        crippen_logp(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn test_small_aliphatics() {
        assert_approx_eq!(logp("C"), 0.6361, 1e-4);
        assert_approx_eq!(logp("CCO"), -0.0014, 1e-4);
        assert_approx_eq!(logp("CC(=O)O"), 0.0909, 1e-4);
        assert_approx_eq!(logp("CC#N"), 0.52988, 1e-4);
    }

    #[test]
    fn test_urea() {
        assert_approx_eq!(logp("NC(=O)N"), -0.9762, 1e-4);
    }

    #[test]
    fn test_aromatics() {
        assert_approx_eq!(logp("c1ccccc1"), 1.6866, 1e-4);
        assert_approx_eq!(logp("c1ccncc1"), 1.0816, 1e-4);
        assert_approx_eq!(logp("Nc1ccccc1"), 1.2688, 1e-4);
    }

    #[test]
    fn test_explicit_hydrogens_match_implicit() {
        assert_approx_eq!(logp("[H]C([H])([H])[H]"), logp("C"), 1e-9);
    }

    #[test]
    fn test_halogens_raise_logp() {
        assert!(logp("CCl") > logp("C"));
        assert!(logp("[Cl-]") < 0.0);
    }
}
