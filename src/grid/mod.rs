//! Occupancy grid used to measure van der Waals volumes

use nalgebra::Vector3;
use thiserror::Error;

/// Errors that can occur when working with grids
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid grid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid grid spacing: {0}")]
    InvalidSpacing(f64),
}

/// A 3D grid of occupied cells
#[derive(Debug, Clone)]
pub struct Grid {
    /// Origin of the grid (minimum corner) in Angstroms
    pub origin: Vector3<f64>,

    /// Grid point spacing in Angstroms
    pub spacing: f64,

    /// Number of grid points in each dimension
    pub dimensions: Vector3<usize>,

    /// Occupancy flags, stored as a flattened 3D array
    pub data: Vec<bool>,
}

impl Grid {
    /// Create an empty grid with the specified dimensions
    pub fn new(
        origin: Vector3<f64>,
        spacing: f64,
        dimensions: Vector3<usize>,
    ) -> Result<Self, GridError> {
        if dimensions.x == 0 || dimensions.y == 0 || dimensions.z == 0 {
            return Err(GridError::InvalidDimension(format!("{:?}", dimensions)));
        }
        if !(spacing > 0.0) {
            return Err(GridError::InvalidSpacing(spacing));
        }

        let total_points = dimensions.x * dimensions.y * dimensions.z;

        Ok(Self {
            origin,
            spacing,
            dimensions,
            data: vec![false; total_points],
        })
    }

    /// Smallest grid covering every sphere
    pub fn enclosing(
        centers: &[Vector3<f64>],
        radii: &[f64],
        spacing: f64,
    ) -> Result<Self, GridError> {
        if centers.is_empty() {
            return Err(GridError::InvalidDimension("no spheres".to_string()));
        }
        if !(spacing > 0.0) {
            return Err(GridError::InvalidSpacing(spacing));
        }

        let mut min = Vector3::repeat(f64::MAX);
        let mut max = Vector3::repeat(f64::MIN);
        for (c, r) in centers.iter().zip(radii) {
            min = min.inf(&c.add_scalar(-r));
            max = max.sup(&c.add_scalar(*r));
        }

        let extent = (max - min) / spacing;
        let dimensions = Vector3::new(
            extent.x.ceil() as usize + 1,
            extent.y.ceil() as usize + 1,
            extent.z.ceil() as usize + 1,
        );
        Self::new(min, spacing, dimensions)
    }

    /// Row-major order: (x * ny * nz) + (y * nz) + z
    fn get_index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.dimensions.y * self.dimensions.z) + (y * self.dimensions.z) + z
    }

    /// Center of the cell at integer coordinates
    fn cell_center(&self, x: usize, y: usize, z: usize) -> Vector3<f64> {
        self.origin + Vector3::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5) * self.spacing
    }

    /// Index range of cells a sphere can touch along one axis
    fn axis_range(&self, axis: usize, center: f64, radius: f64) -> std::ops::Range<usize> {
        let lo = ((center - radius - self.origin[axis]) / self.spacing).floor().max(0.0) as usize;
        let hi = ((center + radius - self.origin[axis]) / self.spacing).ceil().max(0.0) as usize;
        lo.min(self.dimensions[axis])..hi.min(self.dimensions[axis])
    }

    /// Mark every cell whose center lies inside the sphere
    pub fn fill_sphere(&mut self, center: &Vector3<f64>, radius: f64) {
        let r2 = radius * radius;
        for x in self.axis_range(0, center.x, radius) {
            for y in self.axis_range(1, center.y, radius) {
                for z in self.axis_range(2, center.z, radius) {
                    if (self.cell_center(x, y, z) - center).norm_squared() <= r2 {
                        let idx = self.get_index(x, y, z);
                        self.data[idx] = true;
                    }
                }
            }
        }
    }

    pub fn occupied_cells(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Occupied volume in cubic Angstroms
    pub fn occupied_volume(&self) -> f64 {
        self.occupied_cells() as f64 * self.spacing.powi(3)
    }
}

/// Volume of a union of spheres
pub fn union_volume(centers: &[Vector3<f64>], radii: &[f64], spacing: f64) -> Result<f64, GridError> {
    let mut grid = Grid::enclosing(centers, radii, spacing)?;
    for (c, r) in centers.iter().zip(radii) {
        grid.fill_sphere(c, *r);
    }
    Ok(grid.occupied_volume())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(Vector3::zeros(), 0.5, Vector3::new(4, 4, 4)).unwrap();
        assert_eq!(grid.data.len(), 64);
        assert_eq!(grid.occupied_cells(), 0);
    }

    #[test]
    fn test_invalid_grid() {
        assert!(Grid::new(Vector3::zeros(), 0.5, Vector3::new(0, 4, 4)).is_err());
        assert!(Grid::new(Vector3::zeros(), 0.0, Vector3::new(4, 4, 4)).is_err());
        assert!(Grid::enclosing(&[], &[], 0.5).is_err());
        assert!(matches!(
            union_volume(&[Vector3::zeros()], &[1.5], 0.0),
            Err(GridError::InvalidSpacing(_))
        ));
    }

    #[test]
    fn test_single_sphere_volume() {
        let volume = union_volume(&[Vector3::new(1.0, -2.0, 0.5)], &[1.7], 0.1).unwrap();
        let exact = 4.0 / 3.0 * PI * 1.7_f64.powi(3);
        assert!((volume - exact).abs() / exact < 0.02);
    }

    #[test]
    fn test_overlap_counted_once() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let single = union_volume(&[a], &[1.5], 0.1).unwrap();
        let doubled = union_volume(&[a, a], &[1.5, 1.5], 0.1).unwrap();
        assert_eq!(single, doubled);

        let apart = union_volume(&[a, Vector3::new(10.0, 0.0, 0.0)], &[1.5, 1.5], 0.1).unwrap();
        assert!((apart - 2.0 * single).abs() / single < 0.02);
    }
}
