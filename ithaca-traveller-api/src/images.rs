//! Image blobs for posts and users, stored on disk as `<kind>/<id>.<extension>`.

use headers::ContentType;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Upload size accepted when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No file was uploaded")]
    MissingFile,
    #[error("Upload exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },
    #[error("File {0:?} does not have a supported image extension")]
    UnsupportedFile(String),
    #[error("Image not found")]
    NotFound,
    #[error("Image storage failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ImageKind {
    Post,
    User,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ImageExtension {
    Png,
    Jpg,
    Jpeg,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Image {
    pub extension: ImageExtension,
    pub bytes: Vec<u8>,
}

impl ImageKind {
    #[must_use]
    pub fn directory(self) -> &'static str {
        match self {
            ImageKind::Post => "posts",
            ImageKind::User => "users",
        }
    }
}

impl ImageExtension {
    pub const ALL: [ImageExtension; 3] = [Self::Png, Self::Jpg, Self::Jpeg];

    /// Extension of an uploaded file name, matched case-insensitively.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Png => "png",
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
        }
    }

    #[must_use]
    pub fn content_type(self) -> ContentType {
        match self {
            ImageExtension::Png => ContentType::png(),
            ImageExtension::Jpg | ImageExtension::Jpeg => ContentType::jpeg(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ImageStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl ImageStore {
    /// Opens the store, creating the per-kind directories if needed.
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let store = Self {
            root: root.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        };
        for kind in [ImageKind::Post, ImageKind::User] {
            fs::create_dir_all(store.root.join(kind.directory())).await?;
        }

        Ok(store)
    }

    #[must_use]
    pub fn with_max_upload_bytes(self, max_upload_bytes: usize) -> Self {
        Self {
            max_upload_bytes,
            ..self
        }
    }

    /// Largest request body accepted by the upload routes.
    #[must_use]
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    fn relative_path(kind: ImageKind, id: i64, extension: ImageExtension) -> PathBuf {
        Path::new(kind.directory()).join(format!("{id}.{}", extension.as_str()))
    }

    /// Stores the image, replacing any earlier image of the same entity.
    /// Returns the path relative to the store root.
    pub async fn save(
        &self,
        kind: ImageKind,
        id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ImageError> {
        let extension = ImageExtension::from_file_name(file_name)
            .ok_or_else(|| ImageError::UnsupportedFile(file_name.to_owned()))?;

        self.remove_all(kind, id).await?;

        let relative = Self::relative_path(kind, id, extension);
        fs::write(self.root.join(&relative), bytes).await?;
        debug!(path = %relative.display(), "Saved image");

        Ok(relative)
    }

    pub async fn load(&self, kind: ImageKind, id: i64) -> Result<Image, ImageError> {
        for extension in ImageExtension::ALL {
            let path = self.root.join(Self::relative_path(kind, id, extension));
            match fs::read(&path).await {
                Ok(bytes) => return Ok(Image { extension, bytes }),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        Err(ImageError::NotFound)
    }

    /// Removes the entity's image. Returns the removed path relative to the store root.
    pub async fn remove(&self, kind: ImageKind, id: i64) -> Result<PathBuf, ImageError> {
        self.remove_all(kind, id)
            .await?
            .ok_or(ImageError::NotFound)
    }

    async fn remove_all(&self, kind: ImageKind, id: i64) -> io::Result<Option<PathBuf>> {
        let mut removed = None;
        for extension in ImageExtension::ALL {
            let relative = Self::relative_path(kind, id, extension);
            match fs::remove_file(self.root.join(&relative)).await {
                Ok(()) => removed = Some(relative),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }

        Ok(removed)
    }
}
