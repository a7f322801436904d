use serde::{Deserialize, Serialize};

use crate::{FrameUniforms, MediaKind, MediaSource};

/// What the renderer should sample this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisualSource {
    Video {
        locator: String,
        position_seconds: f64,
    },
    Image {
        locator: String,
    },
}

impl VisualSource {
    pub fn new(source: &MediaSource, position_seconds: f64) -> Self {
        match source.kind {
            MediaKind::Video => Self::Video {
                locator: source.locator.clone(),
                position_seconds,
            },
            MediaKind::Image => Self::Image {
                locator: source.locator.clone(),
            },
        }
    }

    pub fn locator(&self) -> &str {
        match self {
            Self::Video { locator, .. } | Self::Image { locator } => locator,
        }
    }
}

/// GPU-side consumer of the per-frame output.
pub trait RenderSurface {
    fn present(&mut self, uniforms: &FrameUniforms, visual: Option<&VisualSource>);
}

/// Render surface that keeps the most recent frame instead of drawing it.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    frames: u64,
    last_uniforms: Option<FrameUniforms>,
    last_visual: Option<VisualSource>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_uniforms(&self) -> Option<&FrameUniforms> {
        self.last_uniforms.as_ref()
    }

    pub fn last_visual(&self) -> Option<&VisualSource> {
        self.last_visual.as_ref()
    }
}

impl RenderSurface for HeadlessSurface {
    fn present(&mut self, uniforms: &FrameUniforms, visual: Option<&VisualSource>) {
        self.frames += 1;
        self.last_uniforms = Some(*uniforms);
        // Without a new texture the previous frame stays on screen.
        if let Some(visual) = visual {
            self.last_visual = Some(visual.clone());
        }
    }
}
