//! Solvent-accessible surface area (Shrake-Rupley)

use nalgebra::Vector3;
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::molecule::Molecule;

/// Parameters for the surface sampler
#[derive(Debug, Clone)]
pub struct SurfaceParams {
    /// Probe radius in Angstroms (default: 1.4)
    pub probe_radius: f64,

    /// Number of sample points on each atom sphere
    pub samples: usize,

    /// Count hydrogens as atoms of the surface
    pub include_hydrogens: bool,

    /// Count HETATM records (waters, cofactors) as atoms of the surface
    pub include_hetero: bool,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            samples: 100,
            include_hydrogens: false,
            include_hetero: true,
        }
    }
}

/// Computes per-atom solvent-accessible surface areas
#[derive(Debug, Clone, Default)]
pub struct SurfaceComputer {
    pub params: SurfaceParams,
}

impl SurfaceComputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: SurfaceParams) -> Self {
        Self { params }
    }

    /// Per-atom SASA in square Angstroms, indexed like `molecule.atoms`.
    /// Excluded atoms get 0.
    pub fn atom_areas(&self, molecule: &Molecule) -> Vec<f64> {
        let included: Vec<usize> = molecule
            .atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| self.params.include_hydrogens || !a.is_hydrogen())
            .filter(|(_, a)| self.params.include_hetero || !a.hetero)
            .map(|(i, _)| i)
            .collect();

        let coords: Vec<Vector3<f64>> = included
            .iter()
            .map(|&i| molecule.atoms[i].coordinates)
            .collect();
        let radii: Vec<f64> = included
            .iter()
            .map(|&i| molecule.atoms[i].atom_type.vdw_radius() + self.params.probe_radius)
            .collect();

        let areas = self.sphere_areas(&coords, &radii);

        let mut result = vec![0.0; molecule.atoms.len()];
        for (k, &i) in included.iter().enumerate() {
            result[i] = areas[k];
        }
        result
    }

    /// Total SASA of a molecule
    pub fn total_area(&self, molecule: &Molecule) -> f64 {
        self.atom_areas(molecule).iter().sum()
    }

    /// Exposed area of each sphere, given centers and probe-expanded radii
    pub fn sphere_areas(&self, coords: &[Vector3<f64>], radii: &[f64]) -> Vec<f64> {
        if coords.is_empty() {
            return Vec::new();
        }

        let points = fibonacci_sphere(self.params.samples);
        let neighbors = neighbor_lists(coords, radii);

        coords
            .iter()
            .enumerate()
            .map(|(idx, center)| {
                let radius = radii[idx];
                let exposed = points
                    .iter()
                    .filter(|p| {
                        let sample = center + *p * radius;
                        !neighbors[idx].iter().any(|&n| {
                            (sample - coords[n]).norm_squared() < radii[n] * radii[n]
                        })
                    })
                    .count();

                4.0 * PI * radius * radius * exposed as f64 / points.len() as f64
            })
            .collect()
    }
}

/// Overlapping spheres for every sphere, bucketed on a cubic cell list
fn neighbor_lists(coords: &[Vector3<f64>], radii: &[f64]) -> Vec<Vec<usize>> {
    let max_radius = radii.iter().cloned().fold(0.0_f64, f64::max);
    let cell = (2.0 * max_radius).max(1e-3);
    let key = |p: &Vector3<f64>| {
        (
            (p.x / cell).floor() as i64,
            (p.y / cell).floor() as i64,
            (p.z / cell).floor() as i64,
        )
    };

    let mut cells: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in coords.iter().enumerate() {
        cells.entry(key(p)).or_default().push(i);
    }

    let mut neighbors = vec![Vec::new(); coords.len()];
    for (i, p) in coords.iter().enumerate() {
        let (cx, cy, cz) = key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        if j == i {
                            continue;
                        }
                        let cutoff = radii[i] + radii[j];
                        if (coords[j] - p).norm_squared() < cutoff * cutoff {
                            neighbors[i].push(j);
                        }
                    }
                }
            }
        }
    }
    neighbors
}

fn fibonacci_sphere(samples: usize) -> Vec<Vector3<f64>> {
    let samples = samples.max(1);
    let golden_angle = PI * (3.0 - (5.0_f64).sqrt());

    (0..samples)
        .map(|i| {
            let y = 1.0 - (2.0 * i as f64 + 1.0) / samples as f64;
            let radius = (1.0 - y * y).sqrt();
            let theta = golden_angle * i as f64;
            Vector3::new(theta.cos() * radius, y, theta.sin() * radius)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{Atom, AtomType};
    use assert_approx_eq::assert_approx_eq;

    fn molecule(positions: &[(AtomType, [f64; 3])]) -> Molecule {
        let mut m = Molecule::new("test");
        for (i, (t, p)) in positions.iter().enumerate() {
            m.add_atom(Atom::new(
                *t,
                Vector3::new(p[0], p[1], p[2]),
                "X".to_string(),
                i as u32 + 1,
                "UNL".to_string(),
                1,
                'A',
                0.0,
            ));
        }
        m
    }

    #[test]
    fn test_isolated_atom_is_full_sphere() {
        let m = molecule(&[(AtomType::Carbon, [0.0, 0.0, 0.0])]);
        let area = SurfaceComputer::new().total_area(&m);
        let r = 1.70 + 1.4;
        assert_approx_eq!(area, 4.0 * PI * r * r, 1e-9);
    }

    #[test]
    fn test_overlap_hides_surface() {
        let pair = molecule(&[
            (AtomType::Carbon, [0.0, 0.0, 0.0]),
            (AtomType::Carbon, [1.5, 0.0, 0.0]),
        ]);
        let computer = SurfaceComputer::new();
        let areas = computer.atom_areas(&pair);
        let full = 4.0 * PI * 3.1 * 3.1;

        assert!(areas[0] < full && areas[0] > 0.4 * full);
        // Symmetric pair
        assert_approx_eq!(areas[0], areas[1], 0.05 * full);
    }

    #[test]
    fn test_overlap_matches_spherical_cap() {
        // Equal spheres of radius 3 at distance 4 each lose a cap of height 1
        let computer = SurfaceComputer::with_params(SurfaceParams {
            samples: 4000,
            ..SurfaceParams::default()
        });
        let coords = [Vector3::zeros(), Vector3::new(4.0, 0.0, 0.0)];
        let areas = computer.sphere_areas(&coords, &[3.0, 3.0]);
        let exposed = 4.0 * PI * 9.0 - 2.0 * PI * 3.0 * 1.0;
        for area in areas {
            assert_approx_eq!(area, exposed, 0.01 * exposed);
        }
    }

    #[test]
    fn test_hydrogens_excluded_by_default() {
        let m = molecule(&[
            (AtomType::Oxygen, [0.0, 0.0, 0.0]),
            (AtomType::HydrogenD, [0.96, 0.0, 0.0]),
        ]);
        let areas = SurfaceComputer::new().atom_areas(&m);
        assert_eq!(areas[1], 0.0);
        let r = 1.52 + 1.4;
        assert_approx_eq!(areas[0], 4.0 * PI * r * r, 1e-9);

        let with_h = SurfaceComputer::with_params(SurfaceParams {
            include_hydrogens: true,
            ..SurfaceParams::default()
        })
        .atom_areas(&m);
        assert!(with_h[1] > 0.0);
        assert!(with_h[0] < areas[0]);
    }

    #[test]
    fn test_hetero_atoms_can_be_excluded() {
        let mut m = molecule(&[
            (AtomType::Carbon, [0.0, 0.0, 0.0]),
            (AtomType::Oxygen, [2.0, 0.0, 0.0]),
        ]);
        m.atoms[1].hetero = true;

        let protein_only = SurfaceComputer::with_params(SurfaceParams {
            include_hetero: false,
            ..SurfaceParams::default()
        });
        let areas = protein_only.atom_areas(&m);
        assert_eq!(areas[1], 0.0);
        let r = 1.70 + 1.4;
        assert_approx_eq!(areas[0], 4.0 * PI * r * r, 1e-9);
    }

    #[test]
    fn test_buried_atom_has_no_area() {
        let mut layout = vec![(AtomType::Carbon, [0.0, 0.0, 0.0])];
        for d in [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ] {
            layout.push((AtomType::Carbon, [d[0] * 1.5, d[1] * 1.5, d[2] * 1.5]));
        }
        let areas = SurfaceComputer::new().atom_areas(&molecule(&layout));
        assert!(areas[0] < 1.0);
    }

    #[test]
    fn test_fibonacci_points_are_unit_vectors() {
        for p in fibonacci_sphere(50) {
            assert_approx_eq!(p.norm(), 1.0, 1e-12);
        }
    }
}
