use std::fmt;
use std::path::Path;

use crate::context::{GraphicsContext, ShaderStage};
use crate::error::GraphicsError;

pub const ATTRIB_VERTEX_POSITION: &str = "aVertexPosition";
pub const ATTRIB_VERTEX_COLOR: &str = "aVertexColor";
pub const UNIFORM_PROJECTION_MATRIX: &str = "uProjectionMatrix";
pub const UNIFORM_MODEL_VIEW_MATRIX: &str = "uModelViewMatrix";

/// Vertex and fragment stage source text. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    vertex: String,
    fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Flat white shading for the position-only quad.
    pub fn quad() -> Self {
        Self::new(QUAD_VERTEX_GLSL, QUAD_FRAGMENT_GLSL)
    }

    /// Per-vertex colour interpolation for the cube.
    pub fn cube() -> Self {
        Self::new(CUBE_VERTEX_GLSL, CUBE_FRAGMENT_GLSL)
    }

    pub fn from_files(vertex: &Path, fragment: &Path) -> Result<Self, GraphicsError> {
        Ok(Self::new(read_source(vertex)?, read_source(fragment)?))
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

fn read_source(path: &Path) -> Result<String, GraphicsError> {
    std::fs::read_to_string(path).map_err(|err| GraphicsError::ResourceCreation {
        resource: "shader source",
        reason: format!("failed to read {}: {err}", path.display()),
    })
}

/// A shader object that compiled successfully.
///
/// Only [`ShaderProgramBuilder::compile`] produces these, so holding one proves
/// the compile status was checked.
pub struct CompiledShader<G: GraphicsContext> {
    handle: G::Shader,
    stage: ShaderStage,
}

impl<G: GraphicsContext> CompiledShader<G> {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> G::Shader {
        self.handle
    }
}

impl<G: GraphicsContext> fmt::Debug for CompiledShader<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("handle", &self.handle)
            .field("stage", &self.stage)
            .finish()
    }
}

/// Attribute and uniform locations resolved once at link time.
///
/// `None` means the program does not expose the name (never declared or
/// optimized out); binding to it is skipped.
pub struct ProgramLocations<G: GraphicsContext> {
    pub vertex_position: Option<u32>,
    pub vertex_color: Option<u32>,
    pub projection_matrix: Option<G::UniformLocation>,
    pub model_view_matrix: Option<G::UniformLocation>,
}

impl<G: GraphicsContext> fmt::Debug for ProgramLocations<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramLocations")
            .field("vertex_position", &self.vertex_position)
            .field("vertex_color", &self.vertex_color)
            .field("projection_matrix", &self.projection_matrix)
            .field("model_view_matrix", &self.model_view_matrix)
            .finish()
    }
}

/// A program whose stages compiled and whose link step succeeded.
pub struct LinkedProgram<G: GraphicsContext> {
    handle: G::Program,
    vertex: CompiledShader<G>,
    fragment: CompiledShader<G>,
    locations: ProgramLocations<G>,
}

impl<G: GraphicsContext> LinkedProgram<G> {
    pub fn handle(&self) -> G::Program {
        self.handle
    }

    pub fn locations(&self) -> &ProgramLocations<G> {
        &self.locations
    }

    pub fn shaders(&self) -> (&CompiledShader<G>, &CompiledShader<G>) {
        (&self.vertex, &self.fragment)
    }

    /// Deletes the program and both stage objects.
    pub fn release(self, gl: &mut G) {
        gl.delete_program(self.handle);
        gl.delete_shader(self.vertex.handle);
        gl.delete_shader(self.fragment.handle);
    }
}

impl<G: GraphicsContext> fmt::Debug for LinkedProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("handle", &self.handle)
            .field("vertex", &self.vertex)
            .field("fragment", &self.fragment)
            .field("locations", &self.locations)
            .finish()
    }
}

/// Compiles shader stages and links them into a [`LinkedProgram`].
pub struct ShaderProgramBuilder<'a, G: GraphicsContext> {
    gl: &'a mut G,
}

impl<'a, G: GraphicsContext> ShaderProgramBuilder<'a, G> {
    pub fn new(gl: &'a mut G) -> Self {
        Self { gl }
    }

    /// Compiles one stage. On failure the shader object is deleted and the
    /// compiler log is returned untouched.
    pub fn compile(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<CompiledShader<G>, GraphicsError> {
        let shader = self.gl.create_shader(stage).map_err(|reason| {
            tracing::error!(%stage, %reason, "unable to create shader");
            GraphicsError::ResourceCreation {
                resource: "shader",
                reason,
            }
        })?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);

        if !self.gl.shader_compile_status(shader) {
            let log = self.gl.shader_info_log(shader);
            tracing::error!(%stage, log = %log, "an error occurred compiling the shaders");
            self.gl.delete_shader(shader);
            return Err(GraphicsError::Compile { stage, log });
        }

        tracing::debug!(%stage, "compiled shader");
        Ok(CompiledShader {
            handle: shader,
            stage,
        })
    }

    /// Links a vertex and a fragment stage and resolves the renderer's
    /// attribute and uniform locations.
    ///
    /// Any failure deletes the program object and both shaders, so nothing
    /// partially usable stays alive.
    pub fn link(
        &mut self,
        vertex: CompiledShader<G>,
        fragment: CompiledShader<G>,
    ) -> Result<LinkedProgram<G>, GraphicsError> {
        if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
            let log = format!(
                "expected a vertex and a fragment shader, got {} and {}",
                vertex.stage, fragment.stage
            );
            tracing::error!(log = %log, "unable to initialize the shader program");
            self.discard(&vertex, &fragment);
            return Err(GraphicsError::Link { log });
        }

        let program = match self.gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                tracing::error!(%reason, "unable to create shader program");
                self.discard(&vertex, &fragment);
                return Err(GraphicsError::ResourceCreation {
                    resource: "shader program",
                    reason,
                });
            }
        };

        self.gl.attach_shader(program, vertex.handle);
        self.gl.attach_shader(program, fragment.handle);
        self.gl.link_program(program);

        if !self.gl.program_link_status(program) {
            let log = self.gl.program_info_log(program);
            tracing::error!(log = %log, "unable to initialize the shader program");
            self.gl.delete_program(program);
            self.discard(&vertex, &fragment);
            return Err(GraphicsError::Link { log });
        }

        let locations = self.resolve_locations(program);
        tracing::info!(?locations, "linked shader program");
        Ok(LinkedProgram {
            handle: program,
            vertex,
            fragment,
            locations,
        })
    }

    /// Compiles both stages from `source` and links them.
    pub fn build(&mut self, source: &ShaderSource) -> Result<LinkedProgram<G>, GraphicsError> {
        let vertex = self.compile(ShaderStage::Vertex, source.vertex())?;
        let fragment = match self.compile(ShaderStage::Fragment, source.fragment()) {
            Ok(fragment) => fragment,
            Err(err) => {
                self.gl.delete_shader(vertex.handle);
                return Err(err);
            }
        };
        self.link(vertex, fragment)
    }

    fn discard(&mut self, vertex: &CompiledShader<G>, fragment: &CompiledShader<G>) {
        self.gl.delete_shader(vertex.handle);
        self.gl.delete_shader(fragment.handle);
    }

    fn resolve_locations(&self, program: G::Program) -> ProgramLocations<G> {
        let locations = ProgramLocations {
            vertex_position: self.gl.attrib_location(program, ATTRIB_VERTEX_POSITION),
            vertex_color: self.gl.attrib_location(program, ATTRIB_VERTEX_COLOR),
            projection_matrix: self.gl.uniform_location(program, UNIFORM_PROJECTION_MATRIX),
            model_view_matrix: self.gl.uniform_location(program, UNIFORM_MODEL_VIEW_MATRIX),
        };

        let missing = [
            (ATTRIB_VERTEX_POSITION, locations.vertex_position.is_none()),
            (ATTRIB_VERTEX_COLOR, locations.vertex_color.is_none()),
            (UNIFORM_PROJECTION_MATRIX, locations.projection_matrix.is_none()),
            (UNIFORM_MODEL_VIEW_MATRIX, locations.model_view_matrix.is_none()),
        ];
        for (name, absent) in missing {
            if absent {
                tracing::debug!(name, "program does not expose variable; binding will be skipped");
            }
        }

        locations
    }
}

const QUAD_VERTEX_GLSL: &str = r"attribute vec4 aVertexPosition;
uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;

void main() {
    gl_Position = uProjectionMatrix * uModelViewMatrix * aVertexPosition;
}
";

const QUAD_FRAGMENT_GLSL: &str = r"void main() {
    gl_FragColor = vec4(1.0, 1.0, 1.0, 1.0);
}
";

const CUBE_VERTEX_GLSL: &str = r"attribute vec4 aVertexPosition;
attribute vec4 aVertexColor;

uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;

varying lowp vec4 vColor;

void main(void) {
    gl_Position = uProjectionMatrix * uModelViewMatrix * aVertexPosition;
    vColor = aVertexColor;
}
";

const CUBE_FRAGMENT_GLSL: &str = r"varying lowp vec4 vColor;

void main(void) {
    gl_FragColor = vColor;
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Fault, GlCall, HeadlessContext};

    #[test]
    fn builds_cube_program_with_all_locations() {
        let mut gl = HeadlessContext::new(800, 600);
        let program = ShaderProgramBuilder::new(&mut gl)
            .build(&ShaderSource::cube())
            .expect("cube program links");
        let locations = program.locations();
        assert!(locations.vertex_position.is_some());
        assert!(locations.vertex_color.is_some());
        assert!(locations.projection_matrix.is_some());
        assert!(locations.model_view_matrix.is_some());
    }

    #[test]
    fn quad_program_has_no_color_attribute() {
        let mut gl = HeadlessContext::new(800, 600);
        let program = ShaderProgramBuilder::new(&mut gl)
            .build(&ShaderSource::quad())
            .expect("quad program links");
        assert!(program.locations().vertex_position.is_some());
        assert!(program.locations().vertex_color.is_none());
    }

    #[test]
    fn compile_error_carries_driver_log_and_deletes_shader() {
        let mut gl = HeadlessContext::new(800, 600);
        let err = ShaderProgramBuilder::new(&mut gl)
            .compile(ShaderStage::Vertex, "void main() { gl_Position = vec4(1.0);")
            .unwrap_err();
        match err {
            GraphicsError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(log.starts_with("ERROR: 0:"), "unexpected log: {log}");
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn failed_fragment_compile_releases_vertex_stage() {
        let mut gl = HeadlessContext::new(800, 600);
        let source = ShaderSource::new(QUAD_VERTEX_GLSL, "void main() {");
        let err = ShaderProgramBuilder::new(&mut gl).build(&source).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn swapped_stages_fail_to_link() {
        let mut gl = HeadlessContext::new(800, 600);
        let mut builder = ShaderProgramBuilder::new(&mut gl);
        let vertex = builder
            .compile(ShaderStage::Vertex, QUAD_VERTEX_GLSL)
            .unwrap();
        let fragment = builder
            .compile(ShaderStage::Fragment, QUAD_FRAGMENT_GLSL)
            .unwrap();
        let err = builder.link(fragment, vertex).unwrap_err();
        assert!(matches!(err, GraphicsError::Link { .. }));
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn link_failure_deletes_program_object() {
        let mut gl = HeadlessContext::new(800, 600);
        let source = ShaderSource::new(QUAD_VERTEX_GLSL, CUBE_FRAGMENT_GLSL);
        let err = ShaderProgramBuilder::new(&mut gl).build(&source).unwrap_err();
        match err {
            GraphicsError::Link { log } => assert!(log.contains("vColor"), "log: {log}"),
            other => panic!("expected link error, got {other:?}"),
        }
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_shaders(), 0);
        assert!(gl
            .calls()
            .iter()
            .any(|call| matches!(call, GlCall::DeleteProgram(_))));
    }

    #[test]
    fn program_allocation_failure_is_resource_error() {
        let mut gl = HeadlessContext::new(800, 600);
        gl.inject_fault(Fault::ProgramAllocation);
        let err = ShaderProgramBuilder::new(&mut gl)
            .build(&ShaderSource::quad())
            .unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ResourceCreation {
                resource: "shader program",
                ..
            }
        ));
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn release_deletes_program_and_stages() {
        let mut gl = HeadlessContext::new(800, 600);
        let program = ShaderProgramBuilder::new(&mut gl)
            .build(&ShaderSource::cube())
            .unwrap();
        assert_eq!(gl.live_programs(), 1);
        program.release(&mut gl);
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn reads_sources_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = dir.path().join("cube.vert");
        let fragment = dir.path().join("cube.frag");
        std::fs::write(&vertex, CUBE_VERTEX_GLSL).unwrap();
        std::fs::write(&fragment, CUBE_FRAGMENT_GLSL).unwrap();
        let source = ShaderSource::from_files(&vertex, &fragment).unwrap();
        assert_eq!(source, ShaderSource::cube());

        let missing = dir.path().join("missing.frag");
        let err = ShaderSource::from_files(&vertex, &missing).unwrap_err();
        assert!(matches!(err, GraphicsError::ResourceCreation { .. }));
    }
}
