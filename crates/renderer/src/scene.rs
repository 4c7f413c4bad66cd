//! Built-in scenes: the flat quad and the vertex-coloured cube.

use crate::compile::{ShaderProgramBuilder, ShaderSource};
use crate::context::{BufferUsage, GraphicsContext};
use crate::error::GraphicsError;
use crate::frame::{FrameOptions, FrameRenderer};
use crate::geometry::{GeometryBufferSet, Mesh};
use crate::transform::AxisRates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Quad,
    Cube,
}

/// Everything needed to stand up one scene on a context.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePreset {
    pub kind: SceneKind,
    pub mesh: Mesh,
    pub shaders: ShaderSource,
    pub axis_rates: AxisRates,
}

impl ScenePreset {
    pub fn quad() -> Self {
        Self {
            kind: SceneKind::Quad,
            mesh: Mesh::quad(),
            shaders: ShaderSource::quad(),
            axis_rates: AxisRates::SPIN,
        }
    }

    pub fn cube() -> Self {
        Self {
            kind: SceneKind::Cube,
            mesh: Mesh::cube(),
            shaders: ShaderSource::cube(),
            axis_rates: AxisRates::TUMBLE,
        }
    }

    pub fn for_kind(kind: SceneKind) -> Self {
        match kind {
            SceneKind::Quad => Self::quad(),
            SceneKind::Cube => Self::cube(),
        }
    }

    pub fn with_shaders(mut self, shaders: ShaderSource) -> Self {
        self.shaders = shaders;
        self
    }

    /// Compiles, uploads, and attaches the scene, returning a `Ready` renderer.
    ///
    /// `options.axis_rates` is overwritten by the preset's rates. Anything
    /// created before a failure is released again.
    pub fn into_renderer<G: GraphicsContext>(
        self,
        gl: G,
        mut options: FrameOptions,
    ) -> Result<FrameRenderer<G>, GraphicsError> {
        options.axis_rates = self.axis_rates;
        let mut renderer = FrameRenderer::new(gl, options);
        self.attach_to(&mut renderer)?;
        Ok(renderer)
    }

    fn attach_to<G: GraphicsContext>(
        &self,
        renderer: &mut FrameRenderer<G>,
    ) -> Result<(), GraphicsError> {
        let gl = renderer.context_mut();
        let program = ShaderProgramBuilder::new(gl).build(&self.shaders)?;
        let geometry = match GeometryBufferSet::upload(gl, &self.mesh, BufferUsage::Static) {
            Ok(geometry) => geometry,
            Err(err) => {
                program.release(gl);
                return Err(err);
            }
        };
        renderer.attach(program, geometry)
    }
}
