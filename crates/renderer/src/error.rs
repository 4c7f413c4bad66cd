use crate::context::ShaderStage;

/// Failures surfaced while preparing or driving the render pipeline.
///
/// Every variant is reported once, at the point of failure. None of them are
/// retried: the caller abandons the setup and rebuilds from scratch.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// A shader, program, or buffer object could not be allocated.
    #[error("unable to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },
    /// The compiler rejected a shader; `log` is the driver's text, unmodified.
    #[error("an error occurred compiling the {stage} shader: {log}")]
    Compile { stage: ShaderStage, log: String },
    /// The program failed to link; `log` is the driver's text, unmodified.
    #[error("unable to link the shader program: {log}")]
    Link { log: String },
    /// Geometry data was rejected before or during upload.
    #[error("geometry upload rejected: {reason}")]
    Upload { reason: String },
    /// The surface, context, or renderer is not in a usable state.
    #[error("graphics initialization failed: {0}")]
    Initialization(String),
}

impl GraphicsError {
    pub(crate) fn upload(reason: impl Into<String>) -> Self {
        Self::Upload {
            reason: reason.into(),
        }
    }
}
