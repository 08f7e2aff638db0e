//! Object storage for profile media.

use std::io::Write;

use cloudinary::upload::{Source, Upload, UploadOptions};
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use crate::config::Cloudinary;
use crate::error::{Result, ServerError};

/// Narrow client over the image host.
///
/// The upload protocol itself belongs to the host; this only stages a buffer
/// and hands back a delivery URL.
#[derive(Debug, Clone, Default)]
pub struct MediaStorage {
    credentials: Option<Cloudinary>,
}

impl MediaStorage {
    /// Create a new [`MediaStorage`].
    pub fn new(credentials: Option<Cloudinary>) -> Self {
        Self { credentials }
    }

    fn stage(buffer: &[u8]) -> std::io::Result<NamedTempFile> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(buffer)?;
        Ok(temp_file)
    }

    /// Upload an image buffer, returning its public delivery URL.
    ///
    /// The public ID is the SHA-1 of the content, so re-uploading identical
    /// bytes lands on the same asset.
    pub async fn upload(&self, buffer: &[u8]) -> Result<String> {
        let Some(credentials) = &self.credentials else {
            return Err(ServerError::Internal {
                details: "media storage is not configured".into(),
                source: None,
            });
        };

        let mut hasher = Sha1::new();
        hasher.update(buffer);
        let public_id = hex::encode(hasher.finalize());

        let options = UploadOptions::new().set_public_id(public_id.clone());
        let upload = Upload::new(
            credentials.key.clone(),
            credentials.cloud_name.clone(),
            credentials.secret.clone(),
        );

        let temp_file =
            Self::stage(buffer).map_err(|err| ServerError::Internal {
                details: "cannot stage image for upload".into(),
                source: Some(Box::new(err)),
            })?;

        upload
            .image(Source::Path(temp_file.path().to_path_buf()), &options)
            .await
            .map_err(|err| ServerError::Internal {
                details: "image upload failed".into(),
                source: Some(err.into()),
            })?;

        Ok(format!(
            "https://res.cloudinary.com/{}/image/upload/{public_id}",
            credentials.cloud_name
        ))
    }
}
