//! Image cache for image elements.
//!
//! Images load asynchronously: the renderer asks the [`ImageLoader`] for a
//! URL once, the host reports the result back into the cache, and the next
//! repaint picks it up. Until then the element is simply not painted.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Image errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image is empty")]
    Empty,
}

/// A loaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    url: String,
    width: u32,
    height: u32,
    rgba: Option<Arc<Vec<u8>>>,
}

impl ImageHandle {
    /// An image decoded by the host (e.g. a browser image element); only its
    /// size is known here.
    pub fn external(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
            rgba: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decoded RGBA8 pixels, if this crate did the decoding.
    pub fn rgba(&self) -> Option<&[u8]> {
        self.rgba.as_deref().map(Vec::as_slice)
    }
}

/// Load state of one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    Pending,
    Ready(ImageHandle),
    Failed,
}

/// Starts fetching an image. Completion is reported back through
/// [`ImageCache::insert_encoded`], [`ImageCache::insert_ready`] or
/// [`ImageCache::mark_failed`].
pub trait ImageLoader {
    fn request(&mut self, url: &str);

    /// The cache dropped `url`; release anything held for it.
    fn forget(&mut self, _url: &str) {}
}

/// Loader that never fetches anything; images must be inserted directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl ImageLoader for NullLoader {
    fn request(&mut self, url: &str) {
        log::debug!("no image loader, {url} stays pending");
    }
}

/// Per-URL image state.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: HashMap<String, ImageStatus>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, url: &str) -> Option<&ImageStatus> {
        self.entries.get(url)
    }

    /// The image for `url` if it is ready.
    pub fn get(&self, url: &str) -> Option<&ImageHandle> {
        match self.entries.get(url) {
            Some(ImageStatus::Ready(handle)) => Some(handle),
            _ => None,
        }
    }

    /// The image for `url` if it is ready. Unknown URLs are requested from
    /// `loader` once and marked pending.
    pub fn request(&mut self, url: &str, loader: &mut dyn ImageLoader) -> Option<&ImageHandle> {
        if !self.entries.contains_key(url) {
            self.entries.insert(url.to_string(), ImageStatus::Pending);
            loader.request(url);
        }
        self.get(url)
    }

    /// Decode PNG or JPEG bytes for `url`. A decode failure marks the URL
    /// failed.
    pub fn insert_encoded(&mut self, url: &str, bytes: &[u8]) -> Result<(), ImageError> {
        match decode(url, bytes) {
            Ok(handle) => {
                log::debug!("image {url} ready ({}x{})", handle.width, handle.height);
                self.entries.insert(url.to_string(), ImageStatus::Ready(handle));
                Ok(())
            }
            Err(e) => {
                log::warn!("image {url} failed to decode: {e}");
                self.mark_failed(url);
                Err(e)
            }
        }
    }

    /// Record an image the host decoded itself.
    pub fn insert_ready(&mut self, url: &str, width: u32, height: u32) {
        let handle = ImageHandle::external(url, width, height);
        self.entries.insert(url.to_string(), ImageStatus::Ready(handle));
    }

    pub fn mark_failed(&mut self, url: &str) {
        self.entries.insert(url.to_string(), ImageStatus::Failed);
    }

    /// Drop every entry whose URL `keep` rejects, e.g. images no element
    /// references any more. Returns the dropped URLs.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let dropped: Vec<String> = self
            .entries
            .keys()
            .filter(|url| !keep(url))
            .cloned()
            .collect();
        for url in &dropped {
            self.entries.remove(url);
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode(url: &str, bytes: &[u8]) -> Result<ImageHandle, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageHandle {
        url: url.to_string(),
        width,
        height,
        rgba: Some(Arc::new(rgba.into_vec())),
    })
}
