use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneVariant {
    /// Flat two-triangle square spinning about the view axis.
    Quad,
    /// Indexed, per-face coloured cube tumbling about all three axes.
    #[default]
    Cube,
}

impl SceneVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneVariant::Quad => "quad",
            SceneVariant::Cube => "cube",
        }
    }

    /// Rotation rates about (z, y, x) applied to the elapsed angle.
    pub fn default_axis_rates(self) -> [f32; 3] {
        match self {
            SceneVariant::Quad => [1.0, 0.0, 0.0],
            SceneVariant::Cube => [1.0, 0.7, 0.3],
        }
    }
}

impl fmt::Display for SceneVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SceneVariant {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quad" | "square" => Ok(SceneVariant::Quad),
            "cube" => Ok(SceneVariant::Cube),
            other => Err(format!("unknown scene variant '{other}'; expected quad or cube")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub shaders: ShaderPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneSettings {
    #[serde(default)]
    pub variant: SceneVariant,
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
    /// Seed the previous timestamp with the first frame's timestamp instead of zero.
    #[serde(default)]
    pub anchor_first_frame: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_z_near")]
    pub z_near: f32,
    #[serde(default = "default_z_far")]
    pub z_far: f32,
    /// Distance the model is pushed away from the camera along -Z.
    #[serde(default = "default_distance")]
    pub distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationSettings {
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub duration: Option<Duration>,
    /// Overrides the variant's (z, y, x) rotation rates.
    #[serde(default)]
    pub axis_rates: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShaderPaths {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

fn default_version() -> u32 {
    1
}

fn default_clear_color() -> [f32; 4] {
    [1.0, 0.0, 0.0, 1.0]
}

fn default_fov() -> f32 {
    45.0
}

fn default_z_near() -> f32 {
    0.1
}

fn default_z_far() -> f32 {
    100.0
}

fn default_distance() -> f32 {
    6.0
}

/// Slowest accepted frame rate: one frame every 100 seconds.
pub const MIN_FPS: f32 = 0.01;

fn default_fps() -> f32 {
    60.0
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            variant: SceneVariant::default(),
            clear_color: default_clear_color(),
            anchor_first_frame: false,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            z_near: default_z_near(),
            z_far: default_z_far(),
            distance: default_distance(),
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            duration: None,
            axis_rates: None,
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            scene: SceneSettings::default(),
            camera: CameraSettings::default(),
            animation: AnimationSettings::default(),
            surface: SurfaceSettings::default(),
            shaders: ShaderPaths::default(),
        }
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a finite, non-negative number"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|_| E::custom(format!("duration of {v} seconds is out of range")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Rotation rates for the configured variant, honouring any override.
    pub fn axis_rates(&self) -> [f32; 3] {
        self.animation
            .axis_rates
            .unwrap_or_else(|| self.scene.variant.default_axis_rates())
    }

    /// Both shader paths, if a custom pair was configured.
    pub fn shader_files(&self) -> Option<(&Path, &Path)> {
        match (&self.shaders.vertex, &self.shaders.fragment) {
            (Some(vertex), Some(fragment)) => Some((vertex.as_path(), fragment.as_path())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        for (index, component) in self.scene.clear_color.iter().enumerate() {
            if !(0.0..=1.0).contains(component) {
                return Err(ConfigError::Invalid(format!(
                    "scene.clear_color[{index}] must be within 0.0..=1.0 (got {component})"
                )));
            }
        }

        let camera = &self.camera;
        for (field, value) in [
            ("fov_degrees", camera.fov_degrees),
            ("z_near", camera.z_near),
            ("z_far", camera.z_far),
            ("distance", camera.distance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "camera.{field} must be a finite number (got {value})"
                )));
            }
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be between 0 and 180 (got {})",
                camera.fov_degrees
            )));
        }
        if camera.z_near <= 0.0 {
            return Err(ConfigError::Invalid("camera.z_near must be > 0".into()));
        }
        if camera.z_far <= camera.z_near {
            return Err(ConfigError::Invalid(format!(
                "camera.z_far ({}) must be greater than camera.z_near ({})",
                camera.z_far, camera.z_near
            )));
        }
        if camera.distance <= 0.0 {
            return Err(ConfigError::Invalid("camera.distance must be > 0".into()));
        }

        if !self.animation.fps.is_finite() || self.animation.fps < MIN_FPS {
            return Err(ConfigError::Invalid(format!(
                "animation.fps must be a finite number of at least {MIN_FPS} (got {})",
                self.animation.fps
            )));
        }
        if let Some(duration) = self.animation.duration {
            if duration.is_zero() {
                return Err(ConfigError::Invalid(
                    "animation.duration must be greater than zero".into(),
                ));
            }
        }
        if let Some(rates) = self.animation.axis_rates {
            if rates.iter().any(|rate| !rate.is_finite()) {
                return Err(ConfigError::Invalid(
                    "animation.axis_rates must be finite".into(),
                ));
            }
        }

        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(ConfigError::Invalid(
                "surface dimensions must be greater than zero".into(),
            ));
        }

        if self.shaders.vertex.is_some() != self.shaders.fragment.is_some() {
            return Err(ConfigError::Invalid(
                "shaders.vertex and shaders.fragment must be provided together".into(),
            ));
        }

        Ok(())
    }
}
