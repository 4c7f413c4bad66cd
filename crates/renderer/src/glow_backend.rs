//! [`GraphicsContext`] over a live OpenGL (ES) context via `glow`.

use glow::HasContext;

use crate::context::{
    AttribLayout, BufferTarget, BufferUsage, Capability, ClearBuffers, DepthFunc,
    GraphicsContext, IndexType, Primitive, ShaderStage,
};

/// Forwards every call to a `glow` context.
///
/// Every method assumes the wrapped context is current on the calling thread,
/// which [`GlowContext::new`] makes the caller promise.
pub struct GlowContext<C: HasContext> {
    gl: C,
}

impl<C: HasContext> GlowContext<C> {
    /// # Safety
    ///
    /// `gl` must stay current on the thread that uses this wrapper for as long
    /// as the wrapper lives, and must not be made current elsewhere.
    pub unsafe fn new(gl: C) -> Self {
        Self { gl }
    }

    pub fn inner(&self) -> &C {
        &self.gl
    }

    pub fn into_inner(self) -> C {
        self.gl
    }
}

fn stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

fn primitive(mode: Primitive) -> u32 {
    match mode {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

fn depth_func(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Less => glow::LESS,
        DepthFunc::LessOrEqual => glow::LEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

impl<C: HasContext> GraphicsContext for GlowContext<C> {
    type Shader = C::Shader;
    type Program = C::Program;
    type Buffer = C::Buffer;
    type UniformLocation = C::UniformLocation;

    fn create_shader(&mut self, kind: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage(kind)) }
    }

    fn shader_source(&mut self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn link_program(&mut self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&mut self, kind: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(target(kind), buffer) }
    }

    fn buffer_data(&mut self, kind: BufferTarget, data: &[u8], hint: BufferUsage) {
        unsafe { self.gl.buffer_data_u8_slice(target(kind), data, usage(hint)) }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn vertex_attrib_pointer_f32(&mut self, index: u32, layout: AttribLayout) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                layout.components,
                glow::FLOAT,
                layout.normalized,
                layout.stride,
                layout.offset,
            )
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_matrix_4(&mut self, location: &Self::UniformLocation, columns: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, columns)
        }
    }

    fn draw_arrays(&mut self, mode: Primitive, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive(mode), first, count) }
    }

    fn draw_elements(&mut self, mode: Primitive, count: i32, index_type: IndexType, offset: i32) {
        let element_type = match index_type {
            IndexType::U16 => glow::UNSIGNED_SHORT,
        };
        unsafe {
            self.gl
                .draw_elements(primitive(mode), count, element_type, offset)
        }
    }

    fn clear_color(&mut self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) }
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        let mut mask = 0;
        if buffers.color {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if buffers.depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) }
    }

    fn enable(&mut self, capability: Capability) {
        let cap = match capability {
            Capability::DepthTest => glow::DEPTH_TEST,
        };
        unsafe { self.gl.enable(cap) }
    }

    fn depth_func(&mut self, func: DepthFunc) {
        unsafe { self.gl.depth_func(depth_func(func)) }
    }

    fn drawable_size(&self) -> (u32, u32) {
        let mut viewport = [0i32; 4];
        unsafe {
            self.gl
                .get_parameter_i32_slice(glow::VIEWPORT, &mut viewport)
        };
        (viewport[2].max(0) as u32, viewport[3].max(0) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_map_to_gl_constants() {
        assert_eq!(stage(ShaderStage::Fragment), glow::FRAGMENT_SHADER);
        assert_eq!(target(BufferTarget::ElementArray), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(usage(BufferUsage::Dynamic), glow::DYNAMIC_DRAW);
        assert_eq!(primitive(Primitive::TriangleStrip), glow::TRIANGLE_STRIP);
        assert_eq!(depth_func(DepthFunc::LessOrEqual), glow::LEQUAL);
    }
}
