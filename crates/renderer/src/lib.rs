//! Renderer crate for the tumble demo: a coloured quad or cube drawn through a
//! WebGL-style immediate-mode API.
//!
//! All device access goes through the [`GraphicsContext`] trait so the same
//! pipeline runs against a real OpenGL context (`glow` feature) or the
//! in-memory [`HeadlessContext`]. The overall flow is:
//!
//! ```text
//!   ShaderSource ──▶ ShaderProgramBuilder ──▶ LinkedProgram ─┐
//!   Mesh ─────────▶ GeometryBufferSet ───────────────────────┤ attach
//!                                                            ▼
//!   AnimationDriver ──▶ FrameLoop::pump ──▶ FrameRenderer::draw(t)
//!          ▲                                      │
//!          └──────── schedule_next_frame ◀────────┘
//! ```
//!
//! `FrameRenderer` owns the context and walks `Uninitialized → Ready ⇄
//! Rendering → Stopped`. `FrameLoop` keeps at most one frame request
//! outstanding, so draws never overlap.

mod compile;
mod context;
mod error;
mod frame;
mod frame_loop;
mod geometry;
#[cfg(feature = "glow")]
mod glow_backend;
pub mod headless;
mod scene;
mod transform;

pub use compile::{
    CompiledShader, LinkedProgram, ProgramLocations, ShaderProgramBuilder, ShaderSource,
    ATTRIB_VERTEX_COLOR, ATTRIB_VERTEX_POSITION, UNIFORM_MODEL_VIEW_MATRIX,
    UNIFORM_PROJECTION_MATRIX,
};
pub use context::{
    AttribLayout, BufferTarget, BufferUsage, Capability, ClearBuffers, DepthFunc,
    GraphicsContext, IndexType, Primitive, ShaderStage,
};
pub use error::GraphicsError;
pub use frame::{FrameOptions, FrameOutcome, FrameRenderer, FrameReport, FrameState, RendererState};
pub use frame_loop::{FrameLoop, LoopEnd, LoopSummary};
pub use geometry::{
    upload_indices, upload_vertex_attribute, DrawCall, GeometryBufferSet, IndexBuffer, Mesh,
    VertexBuffer,
};
#[cfg(feature = "glow")]
pub use glow_backend::GlowContext;
pub use headless::HeadlessContext;
pub use scene::{SceneKind, ScenePreset};
pub use transform::{AxisRates, Camera, TransformPair};
