//! SMILES parsing into a molecular graph

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while reading a SMILES string
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { pos: usize, ch: char },

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("unmatched ')' at position {0}")]
    UnmatchedParenthesis(usize),

    #[error("unclosed branch")]
    UnclosedBranch,

    #[error("unclosed ring bond {0}")]
    UnclosedRing(u32),

    #[error("ring bond {0} is invalid")]
    InvalidRingBond(u32),

    #[error("bond at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("invalid bracket atom at position {0}")]
    InvalidBracketAtom(usize),

    #[error("atom {index} ({element}) exceeds its allowed valence")]
    Valence { index: usize, element: String },

    #[error("non-ring atom {0} marked aromatic")]
    NonRingAromatic(usize),
}

/// Static data for the elements a ligand may contain
#[derive(Debug, PartialEq)]
pub struct ElementInfo {
    pub symbol: &'static str,
    pub number: u8,
    /// Allowed neutral valences, smallest first. Empty means unchecked.
    pub valences: &'static [u8],
    pub covalent_radius: f64,
}

const ELEMENTS: &[ElementInfo] = &[
    ElementInfo { symbol: "H", number: 1, valences: &[1], covalent_radius: 0.31 },
    ElementInfo { symbol: "Li", number: 3, valences: &[], covalent_radius: 1.28 },
    ElementInfo { symbol: "B", number: 5, valences: &[3], covalent_radius: 0.84 },
    ElementInfo { symbol: "C", number: 6, valences: &[4], covalent_radius: 0.76 },
    ElementInfo { symbol: "N", number: 7, valences: &[3, 5], covalent_radius: 0.71 },
    ElementInfo { symbol: "O", number: 8, valences: &[2], covalent_radius: 0.66 },
    ElementInfo { symbol: "F", number: 9, valences: &[1], covalent_radius: 0.57 },
    ElementInfo { symbol: "Na", number: 11, valences: &[], covalent_radius: 1.66 },
    ElementInfo { symbol: "Mg", number: 12, valences: &[], covalent_radius: 1.41 },
    ElementInfo { symbol: "Si", number: 14, valences: &[4], covalent_radius: 1.11 },
    ElementInfo { symbol: "P", number: 15, valences: &[3, 5], covalent_radius: 1.07 },
    ElementInfo { symbol: "S", number: 16, valences: &[2, 4, 6], covalent_radius: 1.05 },
    ElementInfo { symbol: "Cl", number: 17, valences: &[1], covalent_radius: 1.02 },
    ElementInfo { symbol: "K", number: 19, valences: &[], covalent_radius: 2.03 },
    ElementInfo { symbol: "Ca", number: 20, valences: &[], covalent_radius: 1.76 },
    ElementInfo { symbol: "Fe", number: 26, valences: &[], covalent_radius: 1.32 },
    ElementInfo { symbol: "Zn", number: 30, valences: &[], covalent_radius: 1.22 },
    ElementInfo { symbol: "Se", number: 34, valences: &[2, 4, 6], covalent_radius: 1.20 },
    ElementInfo { symbol: "Br", number: 35, valences: &[1], covalent_radius: 1.20 },
    ElementInfo { symbol: "I", number: 53, valences: &[1, 3, 5], covalent_radius: 1.39 },
];

/// Look up an element by its symbol (case-sensitive)
pub fn element(symbol: &str) -> Option<&'static ElementInfo> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the valence of each end. Aromatic bonds count one
    /// here; the extra pi electron is added once per aromatic atom.
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphAtom {
    pub element: &'static ElementInfo,
    pub aromatic: bool,
    pub charge: i8,
    /// Implicit or bracket-specified hydrogens
    pub hydrogens: u8,
    pub isotope: Option<u16>,
    pub bracket: bool,
}

impl GraphAtom {
    pub fn is(&self, symbol: &str) -> bool {
        self.element.symbol == symbol
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.number == 1
    }
}

#[derive(Debug, Clone)]
pub struct GraphBond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl GraphBond {
    pub fn other(&self, idx: usize) -> usize {
        if self.begin == idx {
            self.end
        } else {
            self.begin
        }
    }
}

/// Heavy atoms (and any bracket hydrogens) with their bonds
#[derive(Debug, Clone)]
pub struct MolGraph {
    pub atoms: Vec<GraphAtom>,
    pub bonds: Vec<GraphBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    ring_bonds: Vec<bool>,
}

impl MolGraph {
    fn build(atoms: Vec<GraphAtom>, bonds: Vec<GraphBond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (b, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, b));
            adjacency[bond.end].push((bond.begin, b));
        }
        let ring_bonds = find_ring_bonds(atoms.len(), &bonds, &adjacency);
        Self {
            atoms,
            bonds,
            adjacency,
            ring_bonds,
        }
    }

    /// (neighbor, bond index) pairs
    pub fn neighbors(&self, idx: usize) -> &[(usize, usize)] {
        &self.adjacency[idx]
    }

    /// Neighbors other than hydrogen, with the connecting bond order
    pub fn heavy_neighbors(&self, idx: usize) -> Vec<(usize, BondOrder)> {
        self.adjacency[idx]
            .iter()
            .filter(|(n, _)| !self.atoms[*n].is_hydrogen())
            .map(|(n, b)| (*n, self.bonds[*b].order))
            .collect()
    }

    pub fn heavy_degree(&self, idx: usize) -> usize {
        self.heavy_neighbors(idx).len()
    }

    /// Implicit plus explicit hydrogen count
    pub fn total_hydrogens(&self, idx: usize) -> u8 {
        let explicit = self.adjacency[idx]
            .iter()
            .filter(|(n, _)| self.atoms[*n].is_hydrogen())
            .count();
        let explicit = u8::try_from(explicit).unwrap_or(u8::MAX);
        self.atoms[idx].hydrogens.saturating_add(explicit)
    }

    pub fn bond_in_ring(&self, bond: usize) -> bool {
        self.ring_bonds[bond]
    }

    pub fn in_ring(&self, idx: usize) -> bool {
        self.adjacency[idx].iter().any(|(_, b)| self.ring_bonds[*b])
    }

    /// Member of a three-membered ring
    pub fn in_three_ring(&self, idx: usize) -> bool {
        let nbrs: Vec<usize> = self.adjacency[idx].iter().map(|(n, _)| *n).collect();
        nbrs.iter().enumerate().any(|(i, &a)| {
            nbrs[i + 1..]
                .iter()
                .any(|&b| self.adjacency[a].iter().any(|(n, _)| *n == b))
        })
    }

    pub fn formal_charge(&self) -> i32 {
        self.atoms.iter().map(|a| a.charge as i32).sum()
    }

    /// Valence used by explicit bonds plus one for an aromatic atom
    fn bonded_valence(&self, idx: usize) -> usize {
        let bonds: usize = self.adjacency[idx]
            .iter()
            .map(|(_, b)| usize::from(self.bonds[*b].order.valence()))
            .sum();
        bonds + usize::from(self.atoms[idx].aromatic)
    }
}

/// Bonds that lie on a cycle, i.e. every bond that is not a bridge
fn find_ring_bonds(n: usize, bonds: &[GraphBond], adjacency: &[Vec<(usize, usize)>]) -> Vec<bool> {
    let mut order = vec![0usize; n];
    let mut low = vec![0usize; n];
    let mut bridges = vec![false; bonds.len()];
    let mut counter = 0;

    // (vertex, bond it was entered through, next neighbour to look at)
    let mut stack: Vec<(usize, Option<usize>, usize)> = Vec::new();
    for root in 0..n {
        if order[root] != 0 {
            continue;
        }
        counter += 1;
        order[root] = counter;
        low[root] = counter;
        stack.push((root, None, 0));

        while let Some(top) = stack.last_mut() {
            let (v, parent_bond, next) = *top;
            if let Some(&(w, b)) = adjacency[v].get(next) {
                top.2 += 1;
                if Some(b) == parent_bond {
                    continue;
                }
                if order[w] == 0 {
                    counter += 1;
                    order[w] = counter;
                    low[w] = counter;
                    stack.push((w, Some(b), 0));
                } else {
                    low[v] = low[v].min(order[w]);
                }
                continue;
            }

            stack.pop();
            if let (Some(b), Some(&(parent, _, _))) = (parent_bond, stack.last()) {
                low[parent] = low[parent].min(low[v]);
                if low[v] > order[parent] {
                    bridges[b] = true;
                }
            }
        }
    }
    bridges.iter().map(|&bridge| !bridge).collect()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    atoms: Vec<GraphAtom>,
    /// Bonds with an explicit order, or None for the default
    bonds: Vec<(usize, usize, Option<BondOrder>)>,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending_bond: Option<(BondOrder, usize)>,
    rings: BTreeMap<u32, (usize, Option<BondOrder>)>,
}

/// Parse a SMILES string into a hydrogen-suppressed molecular graph
pub fn parse_smiles(input: &str) -> Result<MolGraph, SmilesError> {
    // Anything after the first whitespace is a title
    let smiles = input.split_whitespace().next().unwrap_or("");
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut parser = Parser {
        chars: smiles.chars().collect(),
        pos: 0,
        atoms: Vec::new(),
        bonds: Vec::new(),
        prev: None,
        branches: Vec::new(),
        pending_bond: None,
        rings: BTreeMap::new(),
    };
    parser.run()?;
    parser.finish()
}

impl Parser {
    fn run(&mut self) -> Result<(), SmilesError> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match c {
                '(' => {
                    if self.prev.is_none() || self.pending_bond.is_some() {
                        return Err(SmilesError::UnexpectedCharacter { pos: self.pos, ch: c });
                    }
                    if self.chars.get(self.pos + 1) == Some(&')') {
                        return Err(SmilesError::UnexpectedCharacter { pos: self.pos + 1, ch: ')' });
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                ')' => {
                    if let Some((_, at)) = self.pending_bond {
                        return Err(SmilesError::DanglingBond(at));
                    }
                    let restored = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnmatchedParenthesis(self.pos))?;
                    self.prev = restored;
                    self.pos += 1;
                }
                '-' | '/' | '\\' => self.bond_symbol(BondOrder::Single)?,
                '=' => self.bond_symbol(BondOrder::Double)?,
                '#' => self.bond_symbol(BondOrder::Triple)?,
                ':' => self.bond_symbol(BondOrder::Aromatic)?,
                '.' => {
                    if let Some((_, at)) = self.pending_bond {
                        return Err(SmilesError::DanglingBond(at));
                    }
                    if self.prev.is_none() {
                        return Err(SmilesError::UnexpectedCharacter { pos: self.pos, ch: c });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '%' | '0'..='9' => self.ring_closure()?,
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom);
                }
                _ if c.is_ascii_alphabetic() => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom);
                }
                _ => return Err(SmilesError::UnexpectedCharacter { pos: self.pos, ch: c }),
            }
        }
        Ok(())
    }

    fn bond_symbol(&mut self, order: BondOrder) -> Result<(), SmilesError> {
        if self.prev.is_none() || self.pending_bond.is_some() {
            return Err(SmilesError::UnexpectedCharacter {
                pos: self.pos,
                ch: self.chars[self.pos],
            });
        }
        self.pending_bond = Some((order, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn push_atom(&mut self, atom: GraphAtom) {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev {
            let order = self.pending_bond.take().map(|(o, _)| o);
            self.bonds.push((prev, idx, order));
        }
        self.prev = Some(idx);
    }

    fn ring_closure(&mut self) -> Result<(), SmilesError> {
        let start = self.pos;
        let number = if self.chars[self.pos] == '%' {
            let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
            if digits.len() != 2 || !digits.chars().all(|d| d.is_ascii_digit()) {
                return Err(SmilesError::UnexpectedCharacter { pos: start, ch: '%' });
            }
            self.pos += 3;
            digits.parse::<u32>().unwrap_or_default()
        } else {
            self.pos += 1;
            self.chars[start].to_digit(10).unwrap_or_default()
        };

        let current = self
            .prev
            .ok_or(SmilesError::UnexpectedCharacter { pos: start, ch: self.chars[start] })?;
        let order = self.pending_bond.take().map(|(o, _)| o);

        match self.rings.remove(&number) {
            Some((opener, opener_order)) => {
                let order = match (opener_order, order) {
                    (Some(a), Some(b)) if a != b => return Err(SmilesError::InvalidRingBond(number)),
                    (a, b) => a.or(b),
                };
                let duplicate = self.bonds.iter().any(|(x, y, _)| {
                    (*x == opener && *y == current) || (*x == current && *y == opener)
                });
                if opener == current || duplicate {
                    return Err(SmilesError::InvalidRingBond(number));
                }
                self.bonds.push((opener, current, order));
            }
            None => {
                self.rings.insert(number, (current, order));
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<GraphAtom, SmilesError> {
        let c = self.chars[self.pos];
        let next = self.chars.get(self.pos + 1).copied();

        let (symbol, aromatic, len) = match (c, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            _ => return Err(SmilesError::UnknownElement(c.to_string())),
        };
        self.pos += len;

        let element = element(symbol).ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))?;
        Ok(GraphAtom {
            element,
            aromatic,
            charge: 0,
            hydrogens: 0,
            isotope: None,
            bracket: false,
        })
    }

    fn bracket_atom(&mut self) -> Result<GraphAtom, SmilesError> {
        let start = self.pos;
        let close = self.chars[start..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| start + offset)
            .ok_or(SmilesError::InvalidBracketAtom(start))?;
        let body: Vec<char> = self.chars[start + 1..close].to_vec();
        self.pos = close + 1;

        let mut i = 0;
        let invalid = || SmilesError::InvalidBracketAtom(start);

        let digits = |i: &mut usize| -> String {
            let mut s = String::new();
            while *i < body.len() && body[*i].is_ascii_digit() {
                s.push(body[*i]);
                *i += 1;
            }
            s
        };

        let isotope = match digits(&mut i) {
            s if s.is_empty() => None,
            s => Some(s.parse::<u16>().map_err(|_| invalid())?),
        };

        // Element symbol, aromatic when lowercase
        let first = *body.get(i).ok_or_else(invalid)?;
        let second = body.get(i + 1).copied();
        let (symbol, aromatic) = if first.is_ascii_lowercase() {
            match (first, second) {
                ('s', Some('e')) => {
                    i += 2;
                    ("Se".to_string(), true)
                }
                ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => {
                    i += 1;
                    (first.to_ascii_uppercase().to_string(), true)
                }
                _ => return Err(SmilesError::UnknownElement(first.to_string())),
            }
        } else if first.is_ascii_uppercase() {
            let two = second
                .filter(|c| c.is_ascii_lowercase())
                .map(|c| format!("{}{}", first, c));
            match two {
                Some(s) if element(&s).is_some() => {
                    i += 2;
                    (s, false)
                }
                _ => {
                    i += 1;
                    (first.to_string(), false)
                }
            }
        } else {
            return Err(invalid());
        };
        let element = element(&symbol).ok_or(SmilesError::UnknownElement(symbol))?;

        // Chirality marks are accepted and ignored
        while i < body.len() && body[i] == '@' {
            i += 1;
        }
        if i + 1 < body.len() && matches!(&body[i..i + 2], ['T', 'H'] | ['A', 'L'] | ['S', 'P'] | ['T', 'B'] | ['O', 'H']) {
            i += 2;
            digits(&mut i);
        }

        let mut hydrogens = 0u8;
        if i < body.len() && body[i] == 'H' {
            i += 1;
            hydrogens = match digits(&mut i) {
                s if s.is_empty() => 1,
                s => s.parse::<u8>().map_err(|_| invalid())?,
            };
        }

        let mut charge: i8 = 0;
        if i < body.len() && (body[i] == '+' || body[i] == '-') {
            let sign: i8 = if body[i] == '+' { 1 } else { -1 };
            let symbol = body[i];
            i += 1;
            let magnitude = match digits(&mut i) {
                s if !s.is_empty() => s.parse::<i8>().map_err(|_| invalid())?,
                _ => {
                    let mut count: i8 = 1;
                    while i < body.len() && body[i] == symbol {
                        count = count.checked_add(1).ok_or_else(invalid)?;
                        i += 1;
                    }
                    count
                }
            };
            charge = sign * magnitude;
        }

        // Atom class
        if i < body.len() && body[i] == ':' {
            i += 1;
            if digits(&mut i).is_empty() {
                return Err(invalid());
            }
        }

        if i != body.len() {
            return Err(invalid());
        }

        Ok(GraphAtom {
            element,
            aromatic,
            charge,
            hydrogens,
            isotope,
            bracket: true,
        })
    }

    fn finish(self) -> Result<MolGraph, SmilesError> {
        if let Some((_, at)) = self.pending_bond {
            return Err(SmilesError::DanglingBond(at));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnclosedBranch);
        }
        if let Some((&number, _)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing(number));
        }

        // Provisional orders give the ring perception its topology
        let provisional: Vec<GraphBond> = self
            .bonds
            .iter()
            .map(|&(begin, end, order)| GraphBond {
                begin,
                end,
                order: order.unwrap_or(BondOrder::Single),
            })
            .collect();
        let topology = MolGraph::build(self.atoms.clone(), provisional);

        let bonds: Vec<GraphBond> = self
            .bonds
            .iter()
            .enumerate()
            .map(|(b, &(begin, end, order))| {
                let order = order.unwrap_or_else(|| {
                    let aromatic_pair = self.atoms[begin].aromatic && self.atoms[end].aromatic;
                    if aromatic_pair && topology.bond_in_ring(b) {
                        BondOrder::Aromatic
                    } else {
                        BondOrder::Single
                    }
                });
                GraphBond { begin, end, order }
            })
            .collect();

        let mut graph = MolGraph::build(self.atoms, bonds);
        assign_hydrogens(&mut graph)?;
        Ok(graph)
    }
}

/// Fill implicit hydrogens and validate valences
fn assign_hydrogens(graph: &mut MolGraph) -> Result<(), SmilesError> {
    for idx in 0..graph.atoms.len() {
        let atom = &graph.atoms[idx];
        if atom.aromatic && !graph.in_ring(idx) {
            return Err(SmilesError::NonRingAromatic(idx));
        }

        let used = graph.bonded_valence(idx);
        let valences = atom.element.valences;
        let invalid = || SmilesError::Valence {
            index: idx,
            element: atom.element.symbol.to_string(),
        };

        if atom.bracket {
            if let Some(&max) = valences.last() {
                let allowed = usize::from(max) + usize::from(atom.charge.unsigned_abs());
                if used + usize::from(atom.hydrogens) > allowed {
                    return Err(invalid());
                }
            }
            continue;
        }

        let hydrogens = if atom.aromatic {
            let sigma = used - 1;
            if valences.last().map_or(false, |&max| sigma > usize::from(max)) {
                return Err(invalid());
            }
            valences
                .first()
                .map_or(0, |&v| usize::from(v).saturating_sub(used))
        } else {
            let target = valences
                .iter()
                .map(|&v| usize::from(v))
                .find(|&v| v >= used)
                .ok_or_else(invalid)?;
            target - used
        };
        let hydrogens = u8::try_from(hydrogens).map_err(|_| invalid())?;
        graph.atoms[idx].hydrogens = hydrogens;
    }
    Ok(())
}
