//! This module contains functions to generate various shapes.

use cgmath::{Point3, Vector2};

use crate::mesh::{Mesh, Triangle, Vertex};

/// Half the side of the quad the field is shown on, in clip space.
pub const QUAD_HALF_EXTENT: f32 = 0.8;

/// Vertices of an axis-aligned quad centered on the origin. Texture row 0
/// maps to the bottom edge.
pub fn quad_vertices(half_extent: f32) -> [Vertex; 4] {
    let h = half_extent;
    [
        Vertex::new(Point3::new(h, h, 0.0), Vector2::new(1.0, 1.0)), // top right
        Vertex::new(Point3::new(h, -h, 0.0), Vector2::new(1.0, 0.0)), // bottom right
        Vertex::new(Point3::new(-h, -h, 0.0), Vector2::new(0.0, 0.0)), // bottom left
        Vertex::new(Point3::new(-h, h, 0.0), Vector2::new(0.0, 1.0)), // top left
    ]
}

/// Two triangles covering [`quad_vertices`].
pub const QUAD_TRIANGLES: [Triangle; 2] = [Triangle(0, 1, 3), Triangle(1, 2, 3)];

pub fn quad(device: &wgpu::Device, half_extent: f32) -> Mesh {
    Mesh::new(device, &quad_vertices(half_extent), &QUAD_TRIANGLES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_two_triangles_over_four_corners() {
        let indices: Vec<u16> = QUAD_TRIANGLES
            .iter()
            .flat_map(|t| [t.0, t.1, t.2])
            .collect();
        assert_eq!(indices, vec![0, 1, 3, 1, 2, 3]);
        assert!(indices.iter().all(|&i| (i as usize) < quad_vertices(1.0).len()));
    }

    #[test]
    fn quad_corners_span_the_whole_texture() {
        let vertices = quad_vertices(QUAD_HALF_EXTENT);
        let expected = [
            Vertex::new(Point3::new(0.8, 0.8, 0.0), Vector2::new(1.0, 1.0)),
            Vertex::new(Point3::new(0.8, -0.8, 0.0), Vector2::new(1.0, 0.0)),
            Vertex::new(Point3::new(-0.8, -0.8, 0.0), Vector2::new(0.0, 0.0)),
            Vertex::new(Point3::new(-0.8, 0.8, 0.0), Vector2::new(0.0, 1.0)),
        ];
        assert_eq!(vertices, expected);
    }
}
