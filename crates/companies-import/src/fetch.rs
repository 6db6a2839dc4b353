//! Archive download

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{ImportError, Result};

/// Result of a download attempt that did not fail in transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body written to `path`
    Saved { path: PathBuf, bytes: u64 },
    /// Server answered with something other than 200; nothing was written
    Unavailable(StatusCode),
}

/// Download `url` into `path`, overwriting whatever is there
///
/// Transport failures are errors. A response with any status other than
/// exactly 200 is returned as [`FetchOutcome::Unavailable`] so the caller
/// can stop cleanly.
pub async fn fetch_archive(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<FetchOutcome> {
    info!(url, "Downloading archive");

    let response = client.get(url).send().await?;
    let status = response.status();

    if status != StatusCode::OK {
        return Ok(FetchOutcome::Unavailable(status));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = download_progress(total_size, path);

    let write_err = |source| ImportError::ArchiveWrite {
        path: path.display().to_string(),
        source,
    };

    let mut file = File::create(path).map_err(write_err)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush().map_err(write_err)?;
    pb.finish_and_clear();

    debug!(bytes = downloaded, path = %path.display(), "Archive saved");

    Ok(FetchOutcome::Saved {
        path: path.to_path_buf(),
        bytes: downloaded,
    })
}

fn download_progress(total_size: u64, path: &Path) -> ProgressBar {
    let pb = ProgressBar::new(total_size);
    let style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(format!("Downloading {}", path.display()));
    pb
}
