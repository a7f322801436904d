//! Core library for the Reactive Backdrop application.
//!
//! A looping video or still image is rendered behind a colour-grading shader
//! whose chromatic aberration and playlist position follow live audio. The
//! crate holds the part with temporal logic: turning spectra into a beat
//! strength, debouncing beats into advance events, switching media without
//! losing relative playback position, and packaging per-frame uniforms.
//! GPU work, the media element and audio capture sit behind the
//! [`RenderSurface`], [`PlaybackSurface`] and [`AudioSource`] traits.

pub mod analysis;
pub mod audio;
pub mod beat;
pub mod config;
pub mod continuity;
pub mod controls;
pub mod director;
pub mod error;
pub mod playlist;
pub mod render;
pub mod spectrum;
pub mod uniforms;

#[cfg(test)]
mod testing;

pub use analysis::{BeatAnalysis, FrequencyAnalyzer};
pub use audio::{AudioEngine, AudioInput, AudioSource, CaptureState, CaptureTicket, Silence};
pub use beat::{BeatDetector, BeatObservation};
pub use config::{
    AudioConfig, BandLayout, BeatConfig, ControlConfig, DirectorConfig, PlaylistConfig,
};
pub use continuity::{
    Completion, PlayRequest, PlaybackContinuityManager, PlaybackSurface, PositionCache,
    SwitchPhase,
};
pub use controls::{ControlState, Slider, Viewport};
pub use director::{CommandOrigin, Direction, DirectorEvent, DirectorStats, MediaDirector};
pub use error::{DirectorError, Result};
pub use playlist::{MediaKind, MediaPlaylist, MediaSource, ResourceReleaser};
pub use render::{HeadlessSurface, RenderSurface, VisualSource};
pub use spectrum::SpectrumAnalyser;
pub use uniforms::{AudioLevels, FrameUniforms, RenderUniformPipeline, UniformBinding, UniformValue};
