//! Pluggable image access: a local list file or a remote slideshow server.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use reqwest::{Client, StatusCode, header};
use tracing::{debug, info};

use crate::error::LoadError;

/// Default extension for photo list files and session keys.
pub const DEFAULT_LIST_EXT: &str = "lst";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Normalize a photo list name: bare names get the default extension,
/// anything that already carries one is left alone. `None` for blank input.
#[must_use]
pub fn ensure_ext(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(stem) = name.strip_suffix('.') {
        return Some(format!("{stem}.{DEFAULT_LIST_EXT}"));
    }
    if Path::new(name).extension().is_some() {
        return Some(name.to_string());
    }
    Some(format!("{name}.{DEFAULT_LIST_EXT}"))
}

/// Data access for slideshow images, addressed by original (unshuffled)
/// index. Each fetch is independent: a failure on one index never corrupts
/// or blocks fetches for other indices, and nothing retries implicitly.
pub enum ImageSource {
    Local(LocalSource),
    Remote(RemoteSource),
}

impl ImageSource {
    /// The ordered path list; positions are original indices.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        match self {
            Self::Local(s) => &s.paths,
            Self::Remote(s) => &s.paths,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }

    /// Display path for an original index.
    #[must_use]
    pub fn name_of(&self, original: usize) -> &str {
        self.paths()
            .get(original)
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    /// Raw image bytes for an original index. The local variant blocks on
    /// file IO; callers accept that on the synchronous fallback path.
    pub async fn fetch(&self, original: usize) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::Local(s) => s.fetch(original),
            Self::Remote(s) => s.fetch(original).await,
        }
    }
}

/// Images on the local filesystem, enumerated by a newline-delimited list
/// file of absolute paths.
pub struct LocalSource {
    paths: Vec<String>,
}

impl LocalSource {
    /// Read the list file. A missing or empty list is fatal: there is
    /// nothing to play.
    pub fn open(list_file: &Path) -> Result<Self> {
        let raw = fs::read_to_string(list_file)
            .with_context(|| format!("reading photo list {}", list_file.display()))?;
        let paths: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        ensure!(
            !paths.is_empty(),
            "photo list {} contains no paths",
            list_file.display()
        );
        info!(count = paths.len(), list = %list_file.display(), "loaded local photo list");
        Ok(Self { paths })
    }

    fn fetch(&self, original: usize) -> Result<Vec<u8>, LoadError> {
        let path = self
            .paths
            .get(original)
            .ok_or_else(|| LoadError::NotFound(format!("image index {original} out of range")))?;
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(LoadError::NotFound(path.clone()))
            }
            Err(err) => Err(LoadError::Io(err)),
        }
    }
}

/// Images served by a slideshow server:
/// `GET <base>/api/slideshow/<key>/list` and `.../image/<original-index>`.
pub struct RemoteSource {
    client: Client,
    base_url: String,
    session_key: String,
    paths: Vec<String>,
}

impl RemoteSource {
    /// Issue the one list request of the session and cache the result.
    /// Any failure here is fatal for the caller.
    pub async fn connect(base_url: &str, session_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("building http client")?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{base_url}/api/slideshow/{session_key}/list");
        let response = client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting image list from {url}"))?;
        ensure!(
            response.status().is_success(),
            "image list request failed with status {} ({url})",
            response.status()
        );
        let paths: Vec<String> = response
            .json()
            .await
            .with_context(|| format!("parsing image list from {url}"))?;
        ensure!(
            !paths.is_empty(),
            "server returned an empty image list for key {session_key}"
        );
        info!(count = paths.len(), key = %session_key, "fetched remote photo list");
        Ok(Self {
            client,
            base_url,
            session_key: session_key.to_string(),
            paths,
        })
    }

    async fn fetch(&self, original: usize) -> Result<Vec<u8>, LoadError> {
        let url = format!(
            "{}/api/slideshow/{}/image/{}",
            self.base_url, self.session_key, original
        );
        debug!(url = %url, "fetching remote image");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| LoadError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &url));
        }
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(LoadError::Format(format!(
                "unexpected content type {content_type:?} from {url}"
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| LoadError::Network(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// 404 means a missing image or unknown session key; any other client error
/// means the server holds something that is not an image; everything else is
/// a transient server or transport failure.
fn classify_status(status: StatusCode, url: &str) -> LoadError {
    if status == StatusCode::NOT_FOUND {
        LoadError::NotFound(url.to_string())
    } else if status.is_client_error() {
        LoadError::Format(format!("status {status} from {url}"))
    } else {
        LoadError::Network(format!("status {status} from {url}"))
    }
}
