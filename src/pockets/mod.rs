//! Predicted binding pockets and their residue-level descriptors

pub mod residues;

use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::descriptors::DescriptorProvider;
use crate::error::{DockError, Result};
use crate::molecule::{Molecule, Residue, ResidueId};

/// One row of a P2Rank `*_predictions.csv` file
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub name: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
    pub center_x: f64,
    pub center_y: f64,
    pub center_z: f64,
    pub residue_ids: String,
}

/// One row of a P2Rank `*_residues.csv` file
#[derive(Debug, Deserialize)]
struct ResidueRow {
    chain: String,
    residue_label: String,
    residue_name: String,
}

/// Descriptors computed from the receptor restricted to a pocket
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PocketDescriptors {
    pub sasa: f64,
    pub gravy: f64,
    pub charge: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pocket {
    pub id: String,
    pub rank: Option<u32>,
    pub score: Option<f64>,
    pub probability: Option<f64>,
    pub center: Vector3<f64>,
    pub residues: Vec<Residue>,
    #[serde(flatten)]
    pub descriptors: PocketDescriptors,
}

impl Pocket {
    pub fn contains(&self, id: &ResidueId) -> bool {
        self.residues.iter().any(|r| &r.id == id)
    }

    /// PyMOL selection for the pocket residues, grouped by chain
    pub fn selection(&self) -> String {
        let mut chains: Vec<(&str, Vec<&str>)> = Vec::new();
        for residue in &self.residues {
            let chain = residue.id.chain.as_str();
            let label = residue.id.label.as_str();
            match chains.iter_mut().find(|(c, _)| *c == chain) {
                Some((_, labels)) => labels.push(label),
                None => chains.push((chain, vec![label])),
            }
        }

        match chains.as_slice() {
            [(chain, labels)] => chain_clause(chain, labels),
            _ => chains
                .iter()
                .map(|(chain, labels)| format!("({})", chain_clause(chain, labels)))
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

fn chain_clause(chain: &str, labels: &[&str]) -> String {
    if chain.is_empty() {
        format!("resi {}", labels.join("+"))
    } else {
        format!("chain {} and resi {}", chain, labels.join("+"))
    }
}

/// Pockets of one receptor, in predictions-file order
#[derive(Debug, Clone, Default, Serialize)]
pub struct PocketSet {
    pockets: Vec<Pocket>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DockError::NotFound(format!("file {}", path.display())),
        _ => DockError::Io(e),
    })
}

/// Read pocket predictions; names must be unique
pub fn read_predictions<R: Read>(reader: R, origin: &Path) -> Result<Vec<Prediction>> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows: Vec<Prediction> = Vec::new();
    let mut seen = HashSet::new();

    for record in csv.deserialize() {
        let row: Prediction = record.map_err(|e| DockError::from_csv(origin, e))?;
        if !seen.insert(row.name.clone()) {
            return Err(DockError::parse(
                origin.display(),
                format!("duplicate pocket id '{}'", row.name),
            ));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Read the residue table as residue id -> residue name
pub fn read_residue_names<R: Read>(reader: R, origin: &Path) -> Result<HashMap<ResidueId, String>> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut names = HashMap::new();
    for record in csv.deserialize() {
        let row: ResidueRow = record.map_err(|e| DockError::from_csv(origin, e))?;
        names.insert(ResidueId::new(row.chain, row.residue_label), row.residue_name);
    }
    Ok(names)
}

/// Mean Kyte-Doolittle hydropathy, rounded to two decimals
pub fn gravy(residue_names: &[&str]) -> f64 {
    if residue_names.is_empty() {
        return 0.0;
    }
    let total: f64 = residue_names
        .iter()
        .map(|name| {
            residues::hydropathy(name).unwrap_or_else(|| {
                warn!("No hydropathy value for residue '{}', counting 0", name);
                0.0
            })
        })
        .sum();
    (total / residue_names.len() as f64 * 100.0).round() / 100.0
}

impl PocketSet {
    /// Read both P2Rank tables and compute descriptors against `structure`
    pub fn load(
        predictions: &Path,
        residues: &Path,
        structure: &Molecule,
        provider: &dyn DescriptorProvider,
    ) -> Result<Self> {
        let rows = read_predictions(open(predictions)?, predictions)?;
        let names = read_residue_names(open(residues)?, residues)?;
        let atom_sasa = provider.atom_sasa(structure);
        debug!(
            "Computed receptor surface for {} atoms with the {} provider",
            atom_sasa.len(),
            provider.name()
        );
        Self::build(rows, &names, structure, &atom_sasa, predictions, residues)
    }

    /// Cross-check the tables against each other and the structure, then
    /// compute each pocket's descriptors once from per-atom `atom_sasa`
    pub fn build(
        rows: Vec<Prediction>,
        residue_names: &HashMap<ResidueId, String>,
        structure: &Molecule,
        atom_sasa: &[f64],
        predictions_origin: &Path,
        residues_origin: &Path,
    ) -> Result<Self> {
        let index = structure.residue_index();

        let mut pockets = Vec::with_capacity(rows.len());
        for row in rows {
            let mut members: Vec<Residue> = Vec::new();
            for token in row.residue_ids.split_whitespace() {
                let id: ResidueId = token.parse().map_err(|e| {
                    DockError::parse(predictions_origin.display(), format!("pocket {}: {}", row.name, e))
                })?;
                let name = residue_names.get(&id).ok_or_else(|| {
                    DockError::parse(
                        residues_origin.display(),
                        format!("residue {} of {} is not listed", id, row.name),
                    )
                })?;
                if !index.contains_key(&id) {
                    return Err(DockError::parse(
                        &structure.name,
                        format!("residue {} of {} is not in the structure", id, row.name),
                    ));
                }
                if members.iter().any(|r| r.id == id) {
                    continue;
                }
                members.push(Residue {
                    id,
                    name: name.clone(),
                });
            }

            let sasa: f64 = members
                .iter()
                .flat_map(|r| index[&r.id].iter())
                .filter_map(|&atom| atom_sasa.get(atom))
                .sum();
            let names: Vec<&str> = members.iter().map(|r| r.name.as_str()).collect();
            let descriptors = PocketDescriptors {
                sasa,
                gravy: gravy(&names),
                charge: names.iter().map(|n| residues::charge(n)).sum(),
            };

            pockets.push(Pocket {
                id: row.name,
                rank: row.rank,
                score: row.score,
                probability: row.probability,
                center: Vector3::new(row.center_x, row.center_y, row.center_z),
                residues: members,
                descriptors,
            });
        }

        Ok(Self { pockets })
    }

    /// Pockets known only from the predictions table: residue names are
    /// unknown and descriptors are left at zero
    pub fn from_predictions(rows: Vec<Prediction>, origin: &Path) -> Result<Self> {
        let mut pockets = Vec::with_capacity(rows.len());
        for row in rows {
            let residues = row
                .residue_ids
                .split_whitespace()
                .map(|token| {
                    token
                        .parse()
                        .map(|id| Residue {
                            id,
                            name: "UNK".to_string(),
                        })
                        .map_err(|e| DockError::parse(origin.display(), format!("pocket {}: {}", row.name, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            pockets.push(Pocket {
                id: row.name,
                rank: row.rank,
                score: row.score,
                probability: row.probability,
                center: Vector3::new(row.center_x, row.center_y, row.center_z),
                residues,
                descriptors: PocketDescriptors::default(),
            });
        }
        Ok(Self { pockets })
    }

    pub fn get(&self, id: &str) -> Option<&Pocket> {
        self.pockets.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pocket> {
        self.pockets.iter()
    }

    pub fn as_slice(&self) -> &[Pocket] {
        &self.pockets
    }

    pub fn len(&self) -> usize {
        self.pockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pockets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, AtomType};
    use crate::descriptors::BuiltinDescriptors;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn structure() -> Molecule {
        let mut molecule = Molecule::new("rec");
        let residues = [("ARG", 10, 3), ("ASP", 11, 2), ("LEU", 12, 4), ("LYS", 20, 5)];
        let mut serial = 1;
        for (name, num, atoms) in residues {
            for k in 0..atoms {
                molecule.add_atom(Atom::new(
                    AtomType::Carbon,
                    Vector3::new(num as f64, k as f64, 0.0),
                    format!("C{}", k),
                    serial,
                    name.to_string(),
                    num,
                    'A',
                    0.0,
                ));
                serial += 1;
            }
        }
        molecule
    }

    const PREDICTIONS: &str = "\
name     ,rank, score,probability, center_x, center_y, center_z, residue_ids
pocket1  ,   1, 12.5,      0.71,    1.0,    2.0,    3.0, A_10 A_11 A_12
pocket2  ,   2,  4.0,      0.20,   20.0,    0.0,    0.0, A_20
";

    const RESIDUES: &str = "\
chain, residue_label, residue_name, score, pocket
A, 10, ARG, 0.5, 1
A, 11, ASP, 0.5, 1
A, 12, LEU, 0.5, 1
A, 20, LYS, 0.1, 2
";

    fn load(predictions: &str, residues: &str) -> Result<PocketSet> {
        let origin = Path::new("test.csv");
        let rows = read_predictions(predictions.as_bytes(), origin)?;
        let names = read_residue_names(residues.as_bytes(), origin)?;
        let structure = structure();
        // Every atom gets 1 A^2
        let areas = vec![1.0; structure.atoms.len()];
        PocketSet::build(rows, &names, &structure, &areas, origin, origin)
    }

    #[test]
    fn test_pocket_descriptors() {
        let set = load(PREDICTIONS, RESIDUES).unwrap();
        assert_eq!(set.len(), 2);

        let p1 = set.get("pocket1").unwrap();
        assert_eq!(p1.rank, Some(1));
        assert_eq!(p1.center, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(p1.descriptors.sasa, 9.0);
        assert_eq!(p1.descriptors.charge, 0);
        // (-4.5 - 3.5 + 3.8) / 3
        assert_eq!(p1.descriptors.gravy, -1.4);

        let p2 = set.get("pocket2").unwrap();
        assert_eq!(p2.descriptors.charge, 1);
        assert_eq!(p2.descriptors.sasa, 5.0);
    }

    #[test]
    fn test_file_order_is_kept() {
        let set = load(PREDICTIONS, RESIDUES).unwrap();
        let ids: Vec<&str> = set.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pocket1", "pocket2"]);
    }

    #[test]
    fn test_duplicate_pocket_id() {
        let duplicated = format!("{}pocket1, 3, 1.0, 0.1, 0.0, 0.0, 0.0, A_20\n", PREDICTIONS);
        let err = load(&duplicated, RESIDUES).unwrap_err();
        assert!(matches!(err, DockError::Parse { .. }));
        assert!(err.to_string().contains("duplicate pocket id"));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let broken = "name,center_x,center_y,residue_ids\npocket1,0,0,A_10\n";
        assert!(matches!(load(broken, RESIDUES), Err(DockError::Parse { .. })));
    }

    #[test]
    fn test_dangling_residue_references() {
        let unlisted = PREDICTIONS.replace("A_20", "A_21");
        let err = load(&unlisted, RESIDUES).unwrap_err();
        assert!(err.to_string().contains("not listed"));

        let residues = format!("{}A, 99, GLY, 0.0, 3\n", RESIDUES);
        let absent = PREDICTIONS.replace("A_20", "A_99");
        let err = load(&absent, &residues).unwrap_err();
        assert!(err.to_string().contains("not in the structure"));
    }

    #[test]
    fn test_optional_metadata_columns() {
        let minimal = "name,center_x,center_y,center_z,residue_ids\npocket1,0,0,0,A_10\n";
        let set = load(minimal, RESIDUES).unwrap();
        let pocket = set.get("pocket1").unwrap();
        assert_eq!(pocket.rank, None);
        assert_eq!(pocket.probability, None);
    }

    #[test]
    fn test_selection_string() {
        let set = load(PREDICTIONS, RESIDUES).unwrap();
        assert_eq!(set.get("pocket1").unwrap().selection(), "chain A and resi 10+11+12");

        let mut pocket = set.get("pocket1").unwrap().clone();
        pocket.residues.push(Residue {
            id: ResidueId::new("B", "7"),
            name: "GLY".to_string(),
        });
        assert_eq!(
            pocket.selection(),
            "(chain A and resi 10+11+12) or (chain B and resi 7)"
        );
    }

    #[test]
    fn test_load_from_files() {
        let mut predictions = NamedTempFile::new().unwrap();
        predictions.write_all(PREDICTIONS.as_bytes()).unwrap();
        let mut residues = NamedTempFile::new().unwrap();
        residues.write_all(RESIDUES.as_bytes()).unwrap();

        let set = PocketSet::load(
            predictions.path(),
            residues.path(),
            &structure(),
            &BuiltinDescriptors::new(),
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("pocket1").unwrap().descriptors.sasa > 0.0);

        let missing = PocketSet::load(
            Path::new("/nonexistent/predictions.csv"),
            residues.path(),
            &structure(),
            &BuiltinDescriptors::new(),
        );
        assert!(matches!(missing, Err(DockError::NotFound(_))));
    }

    #[test]
    fn test_centers_only_pockets() {
        let rows = read_predictions(PREDICTIONS.as_bytes(), Path::new("p.csv")).unwrap();
        let set = PocketSet::from_predictions(rows, Path::new("p.csv")).unwrap();
        let pocket = set.get("pocket1").unwrap();
        assert_eq!(pocket.residues.len(), 3);
        assert_eq!(pocket.descriptors, PocketDescriptors::default());
        assert_eq!(pocket.selection(), "chain A and resi 10+11+12");
    }

    #[test]
    fn test_gravy_rounding_and_unknowns() {
        assert_eq!(gravy(&["ALA", "GLY", "SER"]), 0.2);
        assert_eq!(gravy(&["ILE", "HOH"]), 2.25);
        assert_eq!(gravy(&[]), 0.0);
    }
}
