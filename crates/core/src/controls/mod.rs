use serde::{Deserialize, Serialize};

use crate::ControlConfig;

/// The two grading controls driven by the pointer or the sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slider {
    Temperature,
    Contrast,
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Pointer-derived parameters and manual toggles.
#[derive(Debug, Clone)]
pub struct ControlState {
    config: ControlConfig,
    viewport: Viewport,
    temperature: f32,
    contrast: f32,
    velocity: f32,
    stylized: bool,
    live_capture: bool,
    last_pointer: Option<(f32, f32, f64)>,
}

impl ControlState {
    pub fn new(config: ControlConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            temperature: 0.5,
            contrast: 0.5,
            velocity: 0.0,
            stylized: false,
            live_capture: false,
            last_pointer: None,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn stylized(&self) -> bool {
        self.stylized
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn live_capture(&self) -> bool {
        self.live_capture
    }

    /// Whether keyboard advances and slider clicks are currently honoured.
    pub fn manual_controls_enabled(&self) -> bool {
        !(self.live_capture && self.config.lock_manual_controls_during_capture)
    }

    pub fn set_live_capture(&mut self, active: bool) {
        self.live_capture = active;
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Tracks a pointer move at pixel position `(x, y)` observed at `at_ms`.
    pub fn pointer_moved(&mut self, x: f32, y: f32, at_ms: f64) {
        if let Some((last_x, last_y, last_ms)) = self.last_pointer {
            let distance = (x - last_x).hypot(y - last_y);
            let seconds = ((at_ms - last_ms) / 1000.0) as f32;
            self.velocity = if seconds > 0.0 {
                (distance / seconds / self.config.velocity_scale).min(1.0)
            } else if distance > 0.0 {
                1.0
            } else {
                0.0
            };
        }
        self.last_pointer = Some((x, y, at_ms));

        self.temperature = normalise(x, self.viewport.width);
        self.contrast = 1.0 - normalise(y, self.viewport.height);
    }

    /// Sets a control from a slider click expressed in percent. Returns
    /// `false` when manual controls are locked.
    pub fn set_slider(&mut self, slider: Slider, percent: f32) -> bool {
        if !self.manual_controls_enabled() {
            return false;
        }
        let value = if percent.is_finite() {
            percent.clamp(0.0, 100.0) / 100.0
        } else {
            return false;
        };
        match slider {
            Slider::Temperature => self.temperature = value,
            Slider::Contrast => self.contrast = value,
        }
        true
    }

    pub fn toggle_stylization(&mut self) -> bool {
        self.stylized = !self.stylized;
        self.stylized
    }
}

fn normalise(position: f32, extent: f32) -> f32 {
    if extent > 0.0 && position.is_finite() {
        (position / extent).clamp(0.0, 1.0)
    } else {
        0.5
    }
}
