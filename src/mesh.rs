use cgmath::{Point3, Vector2};
use wgpu::util::DeviceExt;

pub mod shapes;

/// Indexed geometry living in GPU buffers.
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], triangles: &[Triangle]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(triangles),
            usage: wgpu::BufferUsages::INDEX,
        });

        let index_count = 3 * triangles.len() as u32;

        Self {
            vertex_buffer,
            index_buffer,
            index_count,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Releases the GPU buffers. The mesh must not be drawn afterwards.
    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in clip space. It is an array so that Bytemuck::Pod works.
    position: [f32; 3],
    /// Texture coordinates. It is an array so that Bytemuck::Pod works.
    tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: Point3<f32>, tex_coords: Vector2<f32>) -> Self {
        let position: [f32; 3] = position.into();
        let tex_coords: [f32; 2] = tex_coords.into();
        Self {
            position,
            tex_coords,
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Triangle(pub u16, pub u16, pub u16);

pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
}

impl<'a, 'b> DrawMesh<'a> for wgpu::RenderPass<'b>
where
    'a: 'b,
{
    fn draw_mesh(&mut self, mesh: &'a Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
