use std::fmt;

use crate::compile::LinkedProgram;
use crate::context::{
    AttribLayout, BufferTarget, Capability, ClearBuffers, DepthFunc, GraphicsContext, IndexType,
    Primitive,
};
use crate::error::GraphicsError;
use crate::geometry::{DrawCall, GeometryBufferSet, VertexBuffer};
use crate::transform::{AxisRates, Camera, TransformPair};

/// Per-renderer animation clock.
///
/// `previous_timestamp` starts at zero, so the first frame's delta is the
/// whole first timestamp unless the renderer anchors the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameState {
    pub elapsed_angle: f64,
    pub previous_timestamp: f64,
    pub frames: u64,
}

impl FrameState {
    /// Advances the clock and returns the delta that was applied.
    pub fn advance(&mut self, timestamp: f64) -> f64 {
        let delta = timestamp - self.previous_timestamp;
        self.previous_timestamp = timestamp;
        self.elapsed_angle += delta;
        self.frames += 1;
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Ready,
    Rendering,
    Stopped,
}

/// Static per-renderer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub camera: Camera,
    pub axis_rates: AxisRates,
    pub clear_color: [f32; 4],
    /// Seed the clock with the first timestamp so the first delta is zero.
    pub anchor_first_frame: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            axis_rates: AxisRates::default(),
            clear_color: [1.0, 0.0, 0.0, 1.0],
            anchor_first_frame: false,
        }
    }
}

/// What one `draw` call produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub timestamp: f64,
    pub delta: f64,
    pub elapsed_angle: f64,
    pub drawable: (u32, u32),
    pub transforms: TransformPair,
    pub draw: DrawCall,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Drawn(FrameReport),
    /// The renderer was stopped; nothing was submitted.
    Stopped,
}

struct Attached<G: GraphicsContext> {
    program: LinkedProgram<G>,
    geometry: GeometryBufferSet<G>,
}

/// Owns the graphics context and issues one complete frame per `draw`.
pub struct FrameRenderer<G: GraphicsContext> {
    gl: G,
    options: FrameOptions,
    state: RendererState,
    frame: FrameState,
    attached: Option<Attached<G>>,
    last_report: Option<FrameReport>,
}

impl<G: GraphicsContext> FrameRenderer<G> {
    pub fn new(gl: G, options: FrameOptions) -> Self {
        Self {
            gl,
            options,
            state: RendererState::Uninitialized,
            frame: FrameState::default(),
            attached: None,
            last_report: None,
        }
    }

    /// Hands the renderer its program and geometry, moving it to `Ready`.
    ///
    /// The program must expose a position attribute and the geometry must
    /// carry a non-empty position stream. Rejected inputs are released on
    /// this renderer's context before the error is returned.
    pub fn attach(
        &mut self,
        program: LinkedProgram<G>,
        geometry: GeometryBufferSet<G>,
    ) -> Result<(), GraphicsError> {
        let rejection = match self.state {
            RendererState::Stopped => Some("renderer has been stopped"),
            RendererState::Ready | RendererState::Rendering => {
                Some("renderer is already initialized")
            }
            RendererState::Uninitialized if program.locations().vertex_position.is_none() => {
                Some("shader program does not expose a vertex position attribute")
            }
            RendererState::Uninitialized if geometry.position().vertex_count() == 0 => {
                Some("geometry has no position data")
            }
            RendererState::Uninitialized => None,
        };
        if let Some(reason) = rejection {
            tracing::error!(reason, "rejecting program and geometry");
            program.release(&mut self.gl);
            geometry.release(&mut self.gl);
            return Err(GraphicsError::Initialization(reason.into()));
        }

        tracing::info!(draw = ?geometry.draw_call(), "renderer ready");
        self.attached = Some(Attached { program, geometry });
        self.state = RendererState::Ready;
        Ok(())
    }

    /// Renders one frame for `timestamp` (seconds).
    pub fn draw(&mut self, timestamp: f64) -> Result<FrameOutcome, GraphicsError> {
        match self.state {
            RendererState::Ready => {}
            RendererState::Stopped => return Ok(FrameOutcome::Stopped),
            RendererState::Uninitialized => {
                return Err(GraphicsError::Initialization(
                    "draw requested before program and geometry were attached".into(),
                ))
            }
            RendererState::Rendering => {
                return Err(GraphicsError::Initialization(
                    "draw requested while a frame is in flight".into(),
                ))
            }
        }
        let Some(attached) = self.attached.as_ref() else {
            return Err(GraphicsError::Initialization(
                "renderer is ready but has nothing attached".into(),
            ));
        };

        self.state = RendererState::Rendering;

        if self.options.anchor_first_frame && self.frame.frames == 0 {
            self.frame.previous_timestamp = timestamp;
        }
        let delta = self.frame.advance(timestamp);

        let gl = &mut self.gl;
        gl.clear_color(self.options.clear_color);
        gl.clear_depth(1.0);
        gl.enable(Capability::DepthTest);
        gl.depth_func(DepthFunc::LessOrEqual);
        gl.clear(ClearBuffers::COLOR_AND_DEPTH);

        let drawable = gl.drawable_size();
        let transforms = TransformPair::compute(
            &self.options.camera,
            self.options.axis_rates,
            self.frame.elapsed_angle as f32,
            drawable,
        );

        let locations = attached.program.locations();
        bind_attribute(gl, Some(attached.geometry.position()), locations.vertex_position);
        bind_attribute(gl, attached.geometry.color(), locations.vertex_color);

        if let Some(indices) = attached.geometry.indices() {
            gl.bind_buffer(BufferTarget::ElementArray, Some(indices.handle()));
        }

        gl.use_program(Some(attached.program.handle()));
        if let Some(location) = &locations.projection_matrix {
            gl.uniform_matrix_4(location, &transforms.projection_columns());
        }
        if let Some(location) = &locations.model_view_matrix {
            gl.uniform_matrix_4(location, &transforms.model_view_columns());
        }

        let draw = attached.geometry.draw_call();
        match draw {
            DrawCall::Indexed { count } => {
                gl.draw_elements(Primitive::Triangles, count as i32, IndexType::U16, 0)
            }
            DrawCall::Strip { count } => gl.draw_arrays(Primitive::TriangleStrip, 0, count as i32),
        }

        let report = FrameReport {
            timestamp,
            delta,
            elapsed_angle: self.frame.elapsed_angle,
            drawable,
            transforms,
            draw,
        };
        tracing::debug!(
            timestamp,
            delta,
            angle = self.frame.elapsed_angle,
            "frame submitted"
        );

        self.last_report = Some(report);
        self.state = RendererState::Ready;
        Ok(FrameOutcome::Drawn(report))
    }

    /// Stops the renderer for good. Later `draw` calls submit nothing.
    pub fn stop(&mut self) {
        if self.state != RendererState::Stopped {
            tracing::debug!(frames = self.frame.frames, "renderer stopped");
        }
        self.state = RendererState::Stopped;
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn frame_state(&self) -> FrameState {
        self.frame
    }

    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    pub fn context(&self) -> &G {
        &self.gl
    }

    pub fn context_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    /// Releases program and geometry, returning the context.
    pub fn into_context(mut self) -> G {
        if let Some(Attached { program, geometry }) = self.attached.take() {
            program.release(&mut self.gl);
            geometry.release(&mut self.gl);
        }
        self.gl
    }
}

impl<G: GraphicsContext> fmt::Debug for FrameRenderer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("options", &self.options)
            .field("attached", &self.attached.is_some())
            .finish()
    }
}

/// Binds and enables one attribute stream; skipped when either the stream or
/// the program location is absent.
fn bind_attribute<G: GraphicsContext>(
    gl: &mut G,
    buffer: Option<&VertexBuffer<G>>,
    location: Option<u32>,
) {
    let (Some(buffer), Some(location)) = (buffer, location) else {
        return;
    };
    gl.bind_buffer(BufferTarget::Array, Some(buffer.handle()));
    gl.vertex_attrib_pointer_f32(location, AttribLayout::packed(buffer.components() as i32));
    gl.enable_vertex_attrib_array(location);
}
