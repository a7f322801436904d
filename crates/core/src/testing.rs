//! Fakes shared by the unit tests.

use std::collections::HashMap;

use crate::{MediaSource, PlayRequest, PlaybackSurface, ResourceReleaser};

#[derive(Debug, Default)]
pub struct RecordingReleaser {
    pub released: Vec<String>,
}

impl ResourceReleaser for RecordingReleaser {
    fn release(&mut self, locator: &str) {
        self.released.push(locator.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load(String),
    Play(u64),
    Pause,
    Seek(f64),
}

/// Scripted playback surface. Play requests stay pending until the test
/// resolves them through the director or continuity manager.
#[derive(Debug, Default)]
pub struct FakeSurface {
    pub calls: Vec<SurfaceCall>,
    pub durations: HashMap<String, f64>,
    pub loaded: Option<String>,
    pub time: f64,
    pub requests: Vec<PlayRequest>,
}

impl FakeSurface {
    pub fn with_durations(durations: &[(&str, f64)]) -> Self {
        Self {
            durations: durations
                .iter()
                .map(|(locator, duration)| (locator.to_string(), *duration))
                .collect(),
            ..Self::default()
        }
    }

    pub fn last_request(&self) -> PlayRequest {
        self.requests.last().cloned().expect("a play request was issued")
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Seek(time) => Some(*time),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackSurface for FakeSurface {
    fn load(&mut self, source: &MediaSource) {
        self.calls.push(SurfaceCall::Load(source.locator.clone()));
        self.loaded = Some(source.locator.clone());
        self.time = 0.0;
    }

    fn play(&mut self, request: PlayRequest) {
        self.calls.push(SurfaceCall::Play(request.id));
        self.requests.push(request);
    }

    fn pause(&mut self) {
        self.calls.push(SurfaceCall::Pause);
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.calls.push(SurfaceCall::Seek(seconds));
        self.time = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.loaded
            .as_ref()
            .and_then(|locator| self.durations.get(locator))
            .copied()
    }
}

pub fn sources(specs: &[&str]) -> Vec<MediaSource> {
    specs
        .iter()
        .map(|spec| MediaSource::from_path(spec).expect("test locators carry a media extension"))
        .collect()
}
