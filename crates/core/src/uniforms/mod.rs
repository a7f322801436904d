use serde::{Deserialize, Serialize};

use crate::{ControlState, Viewport};

/// Everything the shader needs for one frame. Produced once, consumed once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameUniforms {
    pub resolution: [f32; 2],
    /// Colour temperature and contrast controls, both in `[0, 1]`.
    pub pointer: [f32; 2],
    pub time_seconds: f32,
    pub cursor_speed: f32,
    pub stylized: bool,
    pub chromatic_strength: f32,
    pub beat_strength: f32,
}

/// A single value bound to a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UniformBinding {
    pub name: &'static str,
    pub value: UniformValue,
}

impl FrameUniforms {
    /// Flattens the record into the uniform names the shader program
    /// declares.
    pub fn bindings(&self) -> [UniformBinding; 7] {
        let bind = |name, value| UniformBinding { name, value };
        [
            bind("u_resolution", UniformValue::Vec2(self.resolution)),
            bind("u_mouse", UniformValue::Vec2(self.pointer)),
            bind("u_time", UniformValue::Float(self.time_seconds)),
            bind("u_cursorSpeed", UniformValue::Float(self.cursor_speed)),
            bind("u_oldFilmEffect", UniformValue::Bool(self.stylized)),
            bind("u_chromaticStrength", UniformValue::Float(self.chromatic_strength)),
            bind("u_audioFreq", UniformValue::Float(self.beat_strength)),
        ]
    }
}

/// Audio-derived values for the frame. Absent audio reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioLevels {
    pub beat_strength: f32,
    pub chromatic_strength: f32,
}

/// Packages the per-frame values handed to the renderer. The only state is
/// the timestamp of the first frame.
#[derive(Debug, Clone, Default)]
pub struct RenderUniformPipeline {
    first_frame_ms: Option<f64>,
}

impl RenderUniformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_seconds(&self, now_ms: f64) -> f32 {
        self.first_frame_ms
            .map(|first| ((now_ms - first) / 1000.0).max(0.0) as f32)
            .unwrap_or(0.0)
    }

    pub fn package(
        &mut self,
        now_ms: f64,
        controls: &ControlState,
        audio: Option<AudioLevels>,
    ) -> FrameUniforms {
        self.first_frame_ms.get_or_insert(now_ms);
        let audio = audio.unwrap_or_default();
        let Viewport { width, height } = controls.viewport();

        FrameUniforms {
            resolution: [width, height],
            pointer: [controls.temperature(), controls.contrast()],
            time_seconds: self.elapsed_seconds(now_ms),
            cursor_speed: controls.velocity(),
            stylized: controls.stylized(),
            chromatic_strength: audio.chromatic_strength,
            beat_strength: audio.beat_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlConfig;

    fn controls() -> ControlState {
        ControlState::new(ControlConfig::default(), Viewport::default())
    }

    #[test]
    fn time_counts_from_the_first_frame() {
        let mut pipeline = RenderUniformPipeline::new();
        let controls = controls();

        assert_eq!(pipeline.package(5_000.0, &controls, None).time_seconds, 0.0);
        let later = pipeline.package(6_500.0, &controls, None);
        assert!((later.time_seconds - 1.5).abs() < 1e-6);
    }

    #[test]
    fn missing_audio_defaults_to_zero() {
        let mut pipeline = RenderUniformPipeline::new();
        let uniforms = pipeline.package(0.0, &controls(), None);

        assert_eq!(uniforms.beat_strength, 0.0);
        assert_eq!(uniforms.chromatic_strength, 0.0);
        assert_eq!(uniforms.pointer, [0.5, 0.5]);
        assert_eq!(uniforms.resolution, [1920.0, 1080.0]);
    }

    #[test]
    fn carries_controls_and_audio() {
        let mut pipeline = RenderUniformPipeline::new();
        let mut controls = controls();
        controls.toggle_stylization();

        let uniforms = pipeline.package(
            0.0,
            &controls,
            Some(AudioLevels {
                beat_strength: 0.9,
                chromatic_strength: 0.9,
            }),
        );

        assert!(uniforms.stylized);
        assert_eq!(uniforms.beat_strength, 0.9);
        assert_eq!(uniforms.chromatic_strength, 0.9);
    }

    #[test]
    fn binds_every_shader_uniform() {
        let mut pipeline = RenderUniformPipeline::new();
        let uniforms = pipeline.package(0.0, &controls(), None);
        let names: Vec<_> = uniforms.bindings().iter().map(|b| b.name).collect();

        assert_eq!(
            names,
            [
                "u_resolution",
                "u_mouse",
                "u_time",
                "u_cursorSpeed",
                "u_oldFilmEffect",
                "u_chromaticStrength",
                "u_audioFreq",
            ]
        );
        assert_eq!(uniforms.bindings()[4].value, UniformValue::Bool(false));
    }
}
