//! Shared mesh resources.
//!
//! A [`Mesh`] is immutable geometry plus an optional material reference. Meshes
//! are shared through `Rc<Mesh>`: every node that points at a mesh holds one
//! strong reference, so the mesh lives exactly as long as its last user.
//! Geometry is uploaded to the GPU at most once per device via [`Mesh::upload`].

use std::{cell::RefCell, rc::Rc};

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::material::Material;

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// GPU side copy of a mesh's geometry.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

#[derive(Debug)]
pub struct Mesh {
    name: String,
    default_transform: Matrix4<f32>,
    material: Option<Rc<Material>>,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
    // buffers belong to the device they were created on
    gpu: RefCell<Option<(wgpu::Device, Rc<GpuMesh>)>>,
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            default_transform: Matrix4::identity(),
            material: None,
            vertices,
            indices,
            gpu: RefCell::new(None),
        }
    }

    /// A square in the XY plane facing +Z, wound clockwise.
    pub fn quad(name: &str, size: f32) -> Self {
        let h = size / 2.0;
        let normal = [0.0, 0.0, 1.0];
        let vertices = vec![
            MeshVertex { position: [-h, h, 0.0], normal, tex_coords: [0.0, 0.0] },
            MeshVertex { position: [h, h, 0.0], normal, tex_coords: [1.0, 0.0] },
            MeshVertex { position: [h, -h, 0.0], normal, tex_coords: [1.0, 1.0] },
            MeshVertex { position: [-h, -h, 0.0], normal, tex_coords: [0.0, 1.0] },
        ];
        Self::new(name, vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn with_material(mut self, material: Rc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Sets the transform a node receives when it is created for this mesh by
    /// [`Node::add_children`](crate::data_structures::node::Node::add_children).
    pub fn with_default_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.default_transform = transform;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_transform(&self) -> Matrix4<f32> {
        self.default_transform
    }

    pub fn material(&self) -> Option<&Rc<Material>> {
        self.material.as_ref()
    }

    /// A mesh without a material is drawn with the default material, which is
    /// always treated as opaque.
    pub fn is_opaque(&self) -> bool {
        self.material.as_ref().is_none_or(|material| material.is_opaque())
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the vertex and index buffers for `device`, creating them on the
    /// first call.
    ///
    /// Buffers are cached per device. Uploading to another device (e.g. one
    /// recreated after a device loss) replaces the cached buffers.
    pub fn upload(&self, device: &wgpu::Device) -> Rc<GpuMesh> {
        let mut cached = self.gpu.borrow_mut();
        if let Some((owner, buffers)) = cached.as_ref() {
            if owner == device {
                return Rc::clone(buffers);
            }
            log::debug!("mesh '{}' moved to a new device, re-uploading", self.name);
        }
        let buffers = Rc::new(self.create_buffers(device));
        *cached = Some((device.clone(), Rc::clone(&buffers)));
        buffers
    }

    fn create_buffers(&self, device: &wgpu::Device) -> GpuMesh {
        log::debug!("uploading mesh '{}' ({} vertices)", self.name, self.vertices.len());
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        log::trace!("releasing mesh '{}'", self.name);
    }
}
