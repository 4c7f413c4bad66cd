use std::fmt;

use crate::context::{BufferTarget, BufferUsage, GraphicsContext};
use crate::error::GraphicsError;

/// A device buffer holding one tightly packed `f32` attribute stream.
pub struct VertexBuffer<G: GraphicsContext> {
    handle: G::Buffer,
    components: u32,
    vertex_count: usize,
    usage: BufferUsage,
}

impl<G: GraphicsContext> VertexBuffer<G> {
    pub fn handle(&self) -> G::Buffer {
        self.handle
    }

    pub fn components(&self) -> u32 {
        self.components
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl<G: GraphicsContext> fmt::Debug for VertexBuffer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexBuffer")
            .field("handle", &self.handle)
            .field("components", &self.components)
            .field("vertex_count", &self.vertex_count)
            .field("usage", &self.usage)
            .finish()
    }
}

/// A device buffer of `u16` triangle indices.
pub struct IndexBuffer<G: GraphicsContext> {
    handle: G::Buffer,
    count: usize,
    usage: BufferUsage,
}

impl<G: GraphicsContext> IndexBuffer<G> {
    pub fn handle(&self) -> G::Buffer {
        self.handle
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl<G: GraphicsContext> fmt::Debug for IndexBuffer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuffer")
            .field("handle", &self.handle)
            .field("count", &self.count)
            .field("usage", &self.usage)
            .finish()
    }
}

/// Uploads one attribute stream in a single write.
///
/// The data is validated before any device call, so a rejected upload leaves
/// no buffer object behind.
pub fn upload_vertex_attribute<G: GraphicsContext>(
    gl: &mut G,
    components_per_vertex: u32,
    values: &[f32],
    usage: BufferUsage,
) -> Result<VertexBuffer<G>, GraphicsError> {
    if !(1..=4).contains(&components_per_vertex) {
        return Err(GraphicsError::upload("components per vertex must be 1..=4"));
    }
    if values.is_empty() {
        return Err(GraphicsError::upload("no vertex data"));
    }
    if values.len() % components_per_vertex as usize != 0 {
        return Err(GraphicsError::upload("length not divisible by stride"));
    }

    let handle = write_buffer(gl, BufferTarget::Array, bytemuck::cast_slice(values), usage)?;
    gl.bind_buffer(BufferTarget::Array, None);

    let vertex_count = values.len() / components_per_vertex as usize;
    tracing::debug!(components_per_vertex, vertex_count, ?usage, "uploaded vertex attribute");
    Ok(VertexBuffer {
        handle,
        components: components_per_vertex,
        vertex_count,
        usage,
    })
}

/// Uploads a triangle index list in a single write.
pub fn upload_indices<G: GraphicsContext>(
    gl: &mut G,
    values: &[u16],
    usage: BufferUsage,
) -> Result<IndexBuffer<G>, GraphicsError> {
    if values.is_empty() {
        return Err(GraphicsError::upload("no index data"));
    }
    if values.len() % 3 != 0 {
        return Err(GraphicsError::upload("index count not divisible by 3"));
    }

    let handle = write_buffer(
        gl,
        BufferTarget::ElementArray,
        bytemuck::cast_slice(values),
        usage,
    )?;

    tracing::debug!(count = values.len(), ?usage, "uploaded index buffer");
    Ok(IndexBuffer {
        handle,
        count: values.len(),
        usage,
    })
}

fn write_buffer<G: GraphicsContext>(
    gl: &mut G,
    target: BufferTarget,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<G::Buffer, GraphicsError> {
    let buffer = gl.create_buffer().map_err(|reason| {
        tracing::error!(%reason, "unable to create buffer");
        GraphicsError::upload(format!("unable to create buffer: {reason}"))
    })?;
    gl.bind_buffer(target, Some(buffer));
    gl.buffer_data(target, bytes, usage);
    Ok(buffer)
}

/// The primitive submission a geometry set needs each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// `drawElements(TRIANGLES, count, UNSIGNED_SHORT, 0)`.
    Indexed { count: usize },
    /// `drawArrays(TRIANGLE_STRIP, 0, count)`.
    Strip { count: usize },
}

/// CPU-side vertex data for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<f32>,
    pub position_components: u32,
    pub colors: Option<Vec<f32>>,
    pub indices: Option<Vec<u16>>,
}

/// RGBA colour per cube face: front, back, top, bottom, right, left.
pub const CUBE_FACE_COLORS: [[f32; 4]; 6] = [
    [1.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

#[rustfmt::skip]
const CUBE_POSITIONS: [f32; 72] = [
    // front
    -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,
    // back
    -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,
    // top
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,   1.0,  1.0, -1.0,
    // bottom
    -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,
    // right
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
    // left
    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,
];

impl Mesh {
    /// Unit square as a four-vertex triangle strip, two components per vertex.
    pub fn quad() -> Self {
        Self {
            positions: vec![1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0],
            position_components: 2,
            colors: None,
            indices: None,
        }
    }

    /// Cube with four vertices per face so each face gets a flat colour.
    pub fn cube() -> Self {
        let colors = CUBE_FACE_COLORS
            .iter()
            .flat_map(|color| std::iter::repeat(color).take(4))
            .flatten()
            .copied()
            .collect();

        let indices = (0..6u16)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect();

        Self {
            positions: CUBE_POSITIONS.to_vec(),
            position_components: 3,
            colors: Some(colors),
            indices: Some(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        if self.position_components == 0 {
            return 0;
        }
        self.positions.len() / self.position_components as usize
    }

    /// Cross-stream checks that single-buffer uploads cannot see.
    fn validate(&self) -> Result<(), GraphicsError> {
        let vertices = self.vertex_count();
        if let Some(colors) = &self.colors {
            if colors.len() % 4 != 0 {
                return Err(GraphicsError::upload("length not divisible by stride"));
            }
            if colors.len() / 4 != vertices {
                return Err(GraphicsError::upload(format!(
                    "{} colours supplied for {vertices} vertices",
                    colors.len() / 4
                )));
            }
        }
        if let Some(indices) = &self.indices {
            if let Some(index) = indices.iter().find(|index| **index as usize >= vertices) {
                return Err(GraphicsError::upload(format!(
                    "index {index} out of range for {vertices} vertices"
                )));
            }
        }
        Ok(())
    }
}

/// Device-resident streams for one model.
pub struct GeometryBufferSet<G: GraphicsContext> {
    position: VertexBuffer<G>,
    color: Option<VertexBuffer<G>>,
    indices: Option<IndexBuffer<G>>,
}

impl<G: GraphicsContext> GeometryBufferSet<G> {
    pub fn new(
        position: VertexBuffer<G>,
        color: Option<VertexBuffer<G>>,
        indices: Option<IndexBuffer<G>>,
    ) -> Self {
        Self {
            position,
            color,
            indices,
        }
    }

    /// Uploads every stream of `mesh`. If any upload fails, buffers created
    /// so far are deleted before the error is returned.
    pub fn upload(gl: &mut G, mesh: &Mesh, usage: BufferUsage) -> Result<Self, GraphicsError> {
        mesh.validate()?;

        let position =
            upload_vertex_attribute(gl, mesh.position_components, &mesh.positions, usage)?;

        let color = match &mesh.colors {
            Some(colors) => match upload_vertex_attribute(gl, 4, colors, usage) {
                Ok(buffer) => Some(buffer),
                Err(err) => {
                    gl.delete_buffer(position.handle);
                    return Err(err);
                }
            },
            None => None,
        };

        let indices = match &mesh.indices {
            Some(indices) => match upload_indices(gl, indices, usage) {
                Ok(buffer) => Some(buffer),
                Err(err) => {
                    gl.delete_buffer(position.handle);
                    if let Some(color) = &color {
                        gl.delete_buffer(color.handle);
                    }
                    return Err(err);
                }
            },
            None => None,
        };

        Ok(Self::new(position, color, indices))
    }

    pub fn position(&self) -> &VertexBuffer<G> {
        &self.position
    }

    pub fn color(&self) -> Option<&VertexBuffer<G>> {
        self.color.as_ref()
    }

    pub fn indices(&self) -> Option<&IndexBuffer<G>> {
        self.indices.as_ref()
    }

    pub fn draw_call(&self) -> DrawCall {
        match &self.indices {
            Some(indices) => DrawCall::Indexed {
                count: indices.count,
            },
            None => DrawCall::Strip {
                count: self.position.vertex_count,
            },
        }
    }

    pub fn release(self, gl: &mut G) {
        gl.delete_buffer(self.position.handle);
        if let Some(color) = self.color {
            gl.delete_buffer(color.handle);
        }
        if let Some(indices) = self.indices {
            gl.delete_buffer(indices.handle);
        }
    }
}

impl<G: GraphicsContext> fmt::Debug for GeometryBufferSet<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryBufferSet")
            .field("position", &self.position)
            .field("color", &self.color)
            .field("indices", &self.indices)
            .finish()
    }
}
