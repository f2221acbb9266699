//! Asset lookup: turning an icon identity into raw image data.
//!
//! The resolver treats asset loading as an opaque collaborator behind
//! [`AssetSource`]. Two sources ship with the crate:
//!
//! - [`MemoryAssets`]: an in-memory map, used by tests and embedders that
//!   decode their own images.
//! - [`DirectoryAssets`]: PNG files laid out as `<root>/native/<id>.png` and
//!   `<root>/alternate/<id>.png`.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artifact::{IconImage, IconSet};
use crate::error::ResolveError;

/// Opaque asset lookup.
pub trait AssetSource {
    /// Load the image for `id` from the given icon family.
    fn load(&self, set: IconSet, id: &str) -> Result<IconImage, ResolveError>;
}

/// Assets held in memory.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    native: HashMap<String, IconImage>,
    alternate: HashMap<String, IconImage>,
    loads: Cell<usize>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: IconSet, id: impl Into<String>, image: IconImage) {
        match set {
            IconSet::Native => self.native.insert(id.into(), image),
            IconSet::Alternate => self.alternate.insert(id.into(), image),
        };
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, set: IconSet, id: impl Into<String>, image: IconImage) -> Self {
        self.insert(set, id, image);
        self
    }

    /// Number of successful and failed `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.get()
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, set: IconSet, id: &str) -> Result<IconImage, ResolveError> {
        self.loads.set(self.loads.get() + 1);
        let map = match set {
            IconSet::Native => &self.native,
            IconSet::Alternate => &self.alternate,
        };
        map.get(id)
            .cloned()
            .ok_or_else(|| ResolveError::ResourceUnavailable {
                id: id.to_string(),
                reason: format!("no {:?} asset", set),
            })
    }
}

/// PNG assets read from disk on every load.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where the asset `id` of `set` is expected.
    pub fn asset_path(&self, set: IconSet, id: &str) -> PathBuf {
        let dir = match set {
            IconSet::Native => "native",
            IconSet::Alternate => "alternate",
        };
        self.root.join(dir).join(format!("{id}.png"))
    }
}

impl AssetSource for DirectoryAssets {
    fn load(&self, set: IconSet, id: &str) -> Result<IconImage, ResolveError> {
        let path = self.asset_path(set, id);
        let unavailable = |reason: String| ResolveError::ResourceUnavailable {
            id: id.to_string(),
            reason,
        };

        let img = image::open(&path)
            .map_err(|e| unavailable(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded asset {}", path.display());

        let rgba_image = img.to_rgba8();
        let width = rgba_image.width();
        let height = rgba_image.height();
        IconImage::new(width, height, rgba_image.into_raw())
            .ok_or_else(|| unavailable("decoded buffer has unexpected size".to_string()))
    }
}

/// Encode an icon as PNG.
pub fn save_png(image: &IconImage, path: &Path) -> std::io::Result<()> {
    image::save_buffer(
        path,
        &image.pixels,
        image.width,
        image.height,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(std::io::Error::other)
}
