//! Image source resolution.
//!
//! Turns what the visitor picked (a bundled preset, an uploaded file, or nothing)
//! into a decoded image, or into an [`ImageSourceError`] that says which of those
//! went wrong.

use crate::error::ImageSourceError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The selector value that means "no preset, use the upload instead".
pub const NO_PRESET: &str = "None";

/// Bundled sample images, in display order.
pub const DEFAULT_PRESETS: &[(&str, &str)] = &[
    ("Pizza", "sample_pizza.png"),
    ("Salad", "sample_salad.png"),
    ("Sushi", "sample_sushi.png"),
];

/// Upload extensions offered by the file picker.
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Fixed catalog of named presets, resolved against an assets directory.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    dir: PathBuf,
    entries: Vec<(String, PathBuf)>,
}

impl PresetCatalog {
    /// The default catalog rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_entries(
            dir,
            DEFAULT_PRESETS
                .iter()
                .map(|(name, file)| (name.to_string(), PathBuf::from(file))),
        )
    }

    pub fn with_entries<I>(dir: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        Self {
            dir: dir.into(),
            entries: entries.into_iter().collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Location of a preset's backing file, or `None` if the name is not in the catalog.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, file)| self.dir.join(file))
    }
}

/// What the visitor selected.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Nothing,
    Preset(String),
    Upload { bytes: Vec<u8>, filename: Option<String> },
}

impl ImageSource {
    /// Combine the preset dropdown and the upload field. A real preset wins over an
    /// upload; the `None` entry defers to the upload.
    pub fn from_selection(preset: Option<&str>, upload: Option<(Vec<u8>, Option<String>)>) -> Self {
        match preset.map(str::trim) {
            Some(name) if !name.is_empty() && name != NO_PRESET => {
                ImageSource::Preset(name.to_string())
            }
            _ => match upload {
                Some((bytes, filename)) if !bytes.is_empty() => {
                    ImageSource::Upload { bytes, filename }
                }
                _ => ImageSource::Nothing,
            },
        }
    }
}

/// A validated image. The bitmap is decoded once to check the bytes and then
/// dropped; only the encoded bytes are kept for upload to the classifier.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub encoded: Vec<u8>,
    width: u32,
    height: u32,
    pub format: ImageFormat,
    /// Human-readable origin (preset name or upload file name) for logs and captions.
    pub origin: String,
}

impl DecodedImage {
    /// Decode JPEG or PNG bytes. Any other format is rejected.
    pub fn decode(encoded: Vec<u8>, origin: impl Into<String>) -> Result<Self, ImageSourceError> {
        let format = image::guess_format(&encoded)
            .map_err(|e| ImageSourceError::Undecodable(e.to_string()))?;

        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(ImageSourceError::Undecodable(format!("unsupported format {:?}", format)));
        }

        let pixels = image::load_from_memory_with_format(&encoded, format)
            .map_err(|e| ImageSourceError::Undecodable(e.to_string()))?;

        Ok(Self {
            width: pixels.width(),
            height: pixels.height(),
            encoded,
            format,
            origin: origin.into(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            _ => "image/jpeg",
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Resolves selections against a preset catalog.
#[derive(Debug, Clone)]
pub struct ImageSourceResolver {
    catalog: PresetCatalog,
}

impl ImageSourceResolver {
    pub fn new(catalog: PresetCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn resolve(&self, source: ImageSource) -> Result<DecodedImage, ImageSourceError> {
        match source {
            ImageSource::Nothing => Err(ImageSourceError::NoImageProvided),
            ImageSource::Preset(name) => self.resolve_preset(&name),
            ImageSource::Upload { bytes, filename } => {
                let origin = filename.unwrap_or_else(|| "upload".to_string());
                debug!(origin = %origin, size = bytes.len(), "Decoding uploaded image");
                DecodedImage::decode(bytes, origin)
            }
        }
    }

    fn resolve_preset(&self, name: &str) -> Result<DecodedImage, ImageSourceError> {
        let Some(path) = self.catalog.path_for(name) else {
            warn!(preset = name, "Preset is not in the catalog");
            return Err(ImageSourceError::MissingPreset {
                name: name.to_string(),
                path: None,
            });
        };

        let bytes = read_asset(&path).ok_or_else(|| {
            warn!(preset = name, path = %path.display(), "Preset asset is missing");
            ImageSourceError::MissingPreset {
                name: name.to_string(),
                path: Some(path.clone()),
            }
        })?;

        debug!(preset = name, path = %path.display(), "Loaded preset image");
        DecodedImage::decode(bytes, name)
    }
}

/// Read an optional asset; a missing or unreadable file is `None`.
pub fn read_asset(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}
