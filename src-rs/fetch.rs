use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use image::GenericImageView;
use rand::Rng;
use tracing::debug;

use crate::error::FetchError;
use crate::request::MapRequest;

/// Local handle to a downloaded map image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Downloads the image for one request. Called once per shape, never
/// concurrently.
pub trait ImageFetcher {
    fn fetch(&mut self, request: &MapRequest) -> Result<FetchedImage, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    download_dir: PathBuf,
}

impl HttpFetcher {
    pub fn new(download_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("map-fill/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, download_dir))
    }

    pub fn with_client(client: reqwest::blocking::Client, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    fn next_path(&self, ext: &str) -> PathBuf {
        let ts = Utc::now().format("%Y%m%d-%H%M%S");
        let rand = rand::thread_rng().gen_range(1000..9999);
        self.download_dir
            .join(format!("map-{ts}-{}-{rand}.{ext}", std::process::id()))
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&mut self, request: &MapRequest) -> Result<FetchedImage, FetchError> {
        let url = request.url();
        debug!(endpoint = %request.endpoint, "requesting map image");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_text(body.trim(), 300),
            });
        }
        let bytes = response.bytes()?;
        store_image(&bytes, |ext| self.next_path(ext))
    }
}

/// Decodes `bytes` to make sure they form an image, then writes them to the
/// path chosen for the detected format.
fn store_image(
    bytes: &[u8],
    path_for: impl FnOnce(&str) -> PathBuf,
) -> Result<FetchedImage, FetchError> {
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    let (width, height) = decoded.dimensions();

    let ext = format.extensions_str().first().copied().unwrap_or("img");
    let path = path_for(ext);
    ensure_parent_dir(&path)?;
    fs::write(&path, bytes).map_err(|source| FetchError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), width, height, "stored map image");

    Ok(FetchedImage {
        path,
        width,
        height,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| FetchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    text.chars().take(limit).collect::<String>() + "..."
}
