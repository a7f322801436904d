use std::{collections::HashSet, fmt, path::Path};

use serde::{Deserialize, Serialize};

/// Prefix of locators that point at transient, in-memory resources which
/// must be released once nothing references them.
pub const TRANSIENT_PREFIX: &str = "blob:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

/// A single playable background. Identity is the locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSource {
    pub locator: String,
    pub kind: MediaKind,
}

impl MediaSource {
    pub fn new(locator: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            locator: locator.into(),
            kind,
        }
    }

    pub fn video(locator: impl Into<String>) -> Self {
        Self::new(locator, MediaKind::Video)
    }

    pub fn image(locator: impl Into<String>) -> Self {
        Self::new(locator, MediaKind::Image)
    }

    /// Builds a source from an uploaded file's MIME type. Anything that is
    /// neither `video/*` nor `image/*` is rejected.
    pub fn from_mime(locator: impl Into<String>, mime: &str) -> Option<Self> {
        let kind = if mime.starts_with("video/") {
            MediaKind::Video
        } else if mime.starts_with("image/") {
            MediaKind::Image
        } else {
            return None;
        };
        Some(Self::new(locator, kind))
    }

    /// Guesses the kind from a file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        let kind = match extension.as_str() {
            "mp4" | "webm" | "mov" | "m4v" | "ogv" | "mkv" => MediaKind::Video,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" => MediaKind::Image,
            _ => return None,
        };
        Some(Self::new(path, kind))
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_transient(&self) -> bool {
        self.locator.starts_with(TRANSIENT_PREFIX)
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.locator)
    }
}

/// Releases transient resource handles once no media source refers to them.
pub trait ResourceReleaser {
    fn release(&mut self, locator: &str);
}

/// Ordered, wraparound-indexed collection of media sources.
///
/// The playlist is never empty and `current_index` always points at a valid
/// entry.
#[derive(Debug, Clone)]
pub struct MediaPlaylist {
    sources: Vec<MediaSource>,
    current_index: usize,
}

impl MediaPlaylist {
    /// Returns `None` when `sources` is empty.
    pub fn new(sources: Vec<MediaSource>) -> Option<Self> {
        if sources.is_empty() {
            return None;
        }
        Some(Self {
            sources,
            current_index: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[MediaSource] {
        &self.sources
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &MediaSource {
        &self.sources[self.current_index]
    }

    /// Index after the current one, wrapping to the start.
    pub fn next(&self) -> usize {
        (self.current_index + 1) % self.sources.len()
    }

    /// Index before the current one, wrapping to the end.
    pub fn previous(&self) -> usize {
        (self.current_index + self.sources.len() - 1) % self.sources.len()
    }

    /// Makes `index` (taken modulo the length) the current entry.
    pub fn commit(&mut self, index: usize) -> &MediaSource {
        self.current_index = index % self.sources.len();
        self.current()
    }

    /// Swaps in a new list and resets the index to the start. Transient
    /// locators that only the old list referenced are handed to `releaser`.
    /// An empty list is ignored and the current playlist retained.
    pub fn replace(
        &mut self,
        sources: Vec<MediaSource>,
        releaser: &mut dyn ResourceReleaser,
    ) -> bool {
        if sources.is_empty() {
            tracing::warn!("ignoring replacement with an empty playlist");
            return false;
        }

        let released = {
            let retained: HashSet<&str> = sources.iter().map(|s| s.locator.as_str()).collect();
            let mut released = HashSet::new();
            for source in &self.sources {
                let locator = source.locator.as_str();
                if source.is_transient()
                    && !retained.contains(locator)
                    && released.insert(locator)
                {
                    releaser.release(locator);
                }
            }
            released.len()
        };

        tracing::info!(
            previous = self.sources.len(),
            next = sources.len(),
            released,
            "playlist replaced"
        );
        self.sources = sources;
        self.current_index = 0;
        true
    }

    /// Releases every transient locator in the list. Used at shutdown.
    pub fn release_all(&self, releaser: &mut dyn ResourceReleaser) {
        let mut released = HashSet::new();
        for source in self.sources.iter().filter(|s| s.is_transient()) {
            if released.insert(source.locator.as_str()) {
                releaser.release(&source.locator);
            }
        }
    }
}
