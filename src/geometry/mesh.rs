//! Tympanic membrane surface mesh generation.
//!
//! Generates a triangulated shallow cone: the umbo sits at the apex, pulled
//! medially by the malleus, and the annulus forms the outer ring.

use glam::Vec3;

use crate::config::MembraneParameters;

/// Triangle mesh of the membrane in membrane-local space (mm).
///
/// +Z points laterally, out toward the ear canal. The umbo is at the origin
/// in x/y and depressed along -Z.
#[derive(Debug, Clone)]
pub struct MembraneMesh {
    /// Rest positions of the vertices
    pub rest_positions: Vec<Vec3>,
    /// Triangle indices (3 per triangle)
    pub indices: Vec<u32>,
    /// Outer radius (mm)
    pub radius_mm: f32,
    /// Number of concentric rings around the umbo
    pub ring_count: usize,
    /// Vertices per ring
    pub angular_divisions: usize,
}

impl MembraneMesh {
    /// Generate the membrane mesh from parameters
    pub fn generate_conical(params: &MembraneParameters) -> Self {
        let ring_count = params.ring_count.max(1);
        let angular_divisions = params.angular_divisions.max(3);
        let radius = if params.radius_mm.is_finite() && params.radius_mm > 0.0 {
            params.radius_mm
        } else {
            MembraneParameters::default().radius_mm
        };
        let depth = if params.cone_depth_mm.is_finite() {
            params.cone_depth_mm.max(0.0)
        } else {
            0.0
        };

        let mut rest_positions = Vec::with_capacity(1 + ring_count * angular_divisions);
        let mut indices = Vec::new();

        // Umbo
        rest_positions.push(Vec3::new(0.0, 0.0, -depth));

        for i in 1..=ring_count {
            let r = (i as f32 / ring_count as f32) * radius;
            let z = -depth * (1.0 - r / radius);

            for j in 0..angular_divisions {
                let theta = (j as f32 / angular_divisions as f32) * 2.0 * std::f32::consts::PI;
                rest_positions.push(Vec3::new(r * theta.cos(), r * theta.sin(), z));
            }
        }

        let angular = angular_divisions as u32;

        // Fan from the umbo to the first ring
        for j in 0..angular {
            let curr = 1 + j;
            let next = 1 + (j + 1) % angular;
            indices.extend_from_slice(&[0, curr, next]);
        }

        // Quads between consecutive rings
        for i in 1..ring_count as u32 {
            let ring_start = 1 + (i - 1) * angular;
            let next_ring_start = 1 + i * angular;

            for j in 0..angular {
                let curr = ring_start + j;
                let next = ring_start + (j + 1) % angular;
                let curr_outer = next_ring_start + j;
                let next_outer = next_ring_start + (j + 1) % angular;

                indices.extend_from_slice(&[curr, curr_outer, next]);
                indices.extend_from_slice(&[next, curr_outer, next_outer]);
            }
        }

        Self {
            rest_positions,
            indices,
            radius_mm: radius,
            ring_count,
            angular_divisions,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.rest_positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Membrane normal direction in local space
    pub fn normal(&self) -> Vec3 {
        Vec3::Z
    }

    /// Distance from the umbo axis as a fraction of the radius, in [0, 1]
    pub fn radial_fraction(&self, vertex_idx: usize) -> f32 {
        self.rest_positions
            .get(vertex_idx)
            .map(|p| (p.truncate().length() / self.radius_mm).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    /// Indices of vertices whose in-plane distance to `center` is within `radius`
    pub fn vertices_within(&self, center: Vec3, radius: f32) -> Vec<usize> {
        if !radius.is_finite() || radius <= 0.0 || !center.is_finite() {
            return Vec::new();
        }
        self.rest_positions
            .iter()
            .enumerate()
            .filter(|(_, p)| (p.truncate() - center.truncate()).length() <= radius)
            .map(|(i, _)| i)
            .collect()
    }

    /// Calculate the surface area of the mesh (mm²)
    pub fn calculate_surface_area(&self) -> f32 {
        let mut area = 0.0;

        for chunk in self.indices.chunks(3) {
            let v1 = self.rest_positions[chunk[0] as usize];
            let v2 = self.rest_positions[chunk[1] as usize];
            let v3 = self.rest_positions[chunk[2] as usize];

            // Area = 0.5 * ||(v2 - v1) × (v3 - v1)||
            let cross = (v2 - v1).cross(v3 - v1);
            area += cross.length() / 2.0;
        }

        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_generation() {
        let params = MembraneParameters::default();
        let mesh = MembraneMesh::generate_conical(&params);

        assert_eq!(
            mesh.vertex_count(),
            1 + params.ring_count * params.angular_divisions
        );
        assert_eq!(mesh.indices.len() % 3, 0, "Indices should be multiple of 3");
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_surface_area_reasonable() {
        let params = MembraneParameters::default();
        let mesh = MembraneMesh::generate_conical(&params);
        let area = mesh.calculate_surface_area();

        // Flat disc of radius 4.5 mm is ~63.6 mm²; the cone is slightly larger
        // and the polygonal rim slightly smaller.
        assert!(area > 55.0 && area < 75.0, "Surface area {} out of expected range", area);
    }

    #[test]
    fn test_umbo_is_depressed() {
        let mesh = MembraneMesh::generate_conical(&MembraneParameters::default());
        let rim_z = mesh.rest_positions.last().unwrap().z;
        assert!(mesh.rest_positions[0].z < rim_z);
        assert_eq!(mesh.radial_fraction(0), 0.0);
    }

    #[test]
    fn test_vertices_within_grows_with_radius() {
        let mesh = MembraneMesh::generate_conical(&MembraneParameters::default());
        let small = mesh.vertices_within(Vec3::ZERO, 1.0).len();
        let large = mesh.vertices_within(Vec3::ZERO, 2.5).len();
        assert!(small >= 1);
        assert!(large > small);
        assert!(mesh.vertices_within(Vec3::ZERO, -1.0).is_empty());
    }

    #[test]
    fn test_degenerate_parameters_are_clamped() {
        let params = MembraneParameters {
            ring_count: 0,
            angular_divisions: 1,
            radius_mm: f32::NAN,
            ..Default::default()
        };
        let mesh = MembraneMesh::generate_conical(&params);
        assert_eq!(mesh.vertex_count(), 1 + 3);
        assert!(mesh.radius_mm > 0.0);
    }
}
