use std::fs;
use std::path::Path;

use reqwest::multipart::{Form, Part};

use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::prediction::Prediction;

const SUPPORTED_IMAGE_MIMES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// An image read from disk and checked for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    file_name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read `path`, rejecting files over `max_bytes` and anything that is not an image.
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self> {
        let io_err = |source: std::io::Error| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let size = fs::metadata(path).map_err(io_err)?.len();
        if size > max_bytes {
            return Err(Error::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: max_bytes,
            });
        }

        let bytes = fs::read(path).map_err(io_err)?;

        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .filter(|mime| SUPPORTED_IMAGE_MIMES.contains(mime))
            .ok_or_else(|| Error::NotAnImage {
                path: path.to_path_buf(),
            })?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in mebibytes.
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }
}

/// Sends leaf images to the inference service.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: String,
}

impl InferenceClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(http, config.url.clone()))
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Upload the image and decode the service's answer.
    pub async fn try_predict(&self, upload: &ImageUpload) -> Result<Prediction> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime_type)?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            endpoint = %self.endpoint,
            file = %upload.file_name,
            bytes = upload.len(),
            "uploading image"
        );

        let prediction = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<Prediction>()
            .await?;

        tracing::info!(prediction = %prediction.prediction, "received prediction");
        Ok(prediction)
    }

    /// Like [`try_predict`](Self::try_predict), but any failure becomes
    /// [`Prediction::failed`] so it can be shown like a normal result.
    pub async fn predict(&self, upload: &ImageUpload) -> Prediction {
        match self.try_predict(upload).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, error = %e, "error uploading file");
                Prediction::failed()
            }
        }
    }
}
