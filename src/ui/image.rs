//! PNG image loading

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tiny_skia::Pixmap;
use tracing::debug;

use crate::domain::raster::{ImageLoader, ImageSource, RasterError};

/// Loads PNG files from disk and named resources from memory or a
/// resource directory
#[derive(Debug, Default)]
pub struct PngImageLoader {
    resource_dir: Option<PathBuf>,
    resources: HashMap<String, Pixmap>,
}

impl PngImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `Resource { name }` to `<dir>/<name>.png` when the name
    /// was not registered in memory
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = Some(dir.into());
        self
    }

    /// Makes a decoded image available under a resource name
    pub fn register_resource(&mut self, name: impl Into<String>, image: Pixmap) {
        self.resources.insert(name.into(), image);
    }

    fn load_file(path: &Path, source: &ImageSource) -> Result<Pixmap, RasterError> {
        let pixmap = Pixmap::load_png(path).map_err(|e| RasterError::ImageLoadFailed {
            source_name: source.describe(),
            reason: e.to_string(),
        })?;
        debug!(image = %source.describe(), width = pixmap.width(), height = pixmap.height(), "decoded image");
        Ok(pixmap)
    }
}

impl ImageLoader for PngImageLoader {
    fn load(&self, source: &ImageSource) -> Result<Pixmap, RasterError> {
        match source {
            ImageSource::File { path } => Self::load_file(path, source),
            ImageSource::Resource { name } => {
                if let Some(image) = self.resources.get(name) {
                    return Ok(image.clone());
                }
                match &self.resource_dir {
                    Some(dir) => Self::load_file(&dir.join(format!("{name}.png")), source),
                    None => Err(RasterError::ImageLoadFailed {
                        source_name: source.describe(),
                        reason: "no such resource".to_string(),
                    }),
                }
            }
        }
    }
}
