//! The immediate-mode graphics boundary.
//!
//! [`GraphicsContext`] mirrors the subset of the WebGL 1 / GLES 2 call surface
//! the renderer consumes. Calls are synchronous and return-coded: allocation
//! can fail with a driver message, lookups return `None` for names the linked
//! program does not expose, and everything else is fire-and-forget.

use std::fmt;

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding point for a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data (`ARRAY_BUFFER`).
    Array,
    /// Index data (`ELEMENT_ARRAY_BUFFER`).
    ElementArray,
}

/// Hint describing how often buffer contents change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    Less,
    LessOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
}

/// Which framebuffer planes a `clear` call resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearBuffers {
    pub color: bool,
    pub depth: bool,
}

impl ClearBuffers {
    pub const COLOR_AND_DEPTH: Self = Self {
        color: true,
        depth: true,
    };
}

/// Layout of one vertex attribute stream inside its bound buffer.
///
/// Components are always 32-bit floats. A stride of zero means tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribLayout {
    pub components: i32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

impl AttribLayout {
    pub fn packed(components: i32) -> Self {
        Self {
            components,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

pub trait GraphicsContext {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&mut self, program: Self::Program);

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<Self::Buffer>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: AttribLayout);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn use_program(&mut self, program: Option<Self::Program>);
    fn uniform_matrix_4(&mut self, location: &Self::UniformLocation, columns: &[f32; 16]);

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32);
    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: i32);

    fn clear_color(&mut self, rgba: [f32; 4]);
    fn clear_depth(&mut self, depth: f32);
    fn clear(&mut self, buffers: ClearBuffers);
    fn enable(&mut self, capability: Capability);
    fn depth_func(&mut self, func: DepthFunc);

    /// Current size of the drawable surface in physical pixels.
    fn drawable_size(&self) -> (u32, u32);
}
