//! Where script images come from.
//!
//! Names arrive either from the catalog (`name.int`) or from a running
//! program's `spawn`/`exec` (usually without the extension); both resolve to
//! the same image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mapscript_foundation::{Error, Result};
use mapscript_language::Image;

/// File extension of compiled scripts.
pub const IMAGE_EXTENSION: &str = "int";

/// Resolves image names.
pub trait ImageSource {
    /// Loads (or returns a cached) image.
    ///
    /// # Errors
    ///
    /// Returns a load error if the image is missing or malformed.
    fn load(&mut self, name: &str) -> Result<Arc<Image>>;
}

/// The image name with any `.int` extension removed, lowercased.
#[must_use]
pub fn image_stem(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    match lower.strip_suffix(".int") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

// =============================================================================
// MemorySource
// =============================================================================

/// Images registered up front.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    images: HashMap<String, Arc<Image>>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an image under its own name.
    pub fn insert(&mut self, image: Arc<Image>) {
        self.images.insert(image_stem(image.name()), image);
    }

    /// Registers an image, builder style.
    #[must_use]
    pub fn with_image(mut self, image: Arc<Image>) -> Self {
        self.insert(image);
        self
    }

    /// Number of registered images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSource for MemorySource {
    fn load(&mut self, name: &str) -> Result<Arc<Image>> {
        self.images
            .get(&image_stem(name))
            .cloned()
            .ok_or_else(|| Error::load(name, "no such image"))
    }
}

// =============================================================================
// DirectorySource
// =============================================================================

/// Images read from `<root>/<stem>.int`, cached after the first load.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    cache: HashMap<String, Arc<Image>>,
}

impl DirectorySource {
    /// Reads images from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    /// The directory images are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drops every cached image.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl ImageSource for DirectorySource {
    fn load(&mut self, name: &str) -> Result<Arc<Image>> {
        let stem = image_stem(name);
        if let Some(image) = self.cache.get(&stem) {
            return Ok(Arc::clone(image));
        }
        let path = self.root.join(format!("{stem}.{IMAGE_EXTENSION}"));
        log::debug!("loading {}", path.display());
        let image = Arc::new(Image::load(&path)?);
        self.cache.insert(stem, Arc::clone(&image));
        Ok(image)
    }
}
