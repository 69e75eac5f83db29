//! 共享目录浏览与文件下载处理器。

use axum::body::Body as AxumBody;
use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use httpdate::fmt_http_date;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::config::BROWSE_PREFIX;
use crate::error::ApiError;
use crate::listing::Listing;
use crate::storage::Storage;

/// 浏览入口：目录返回列表页，文件返回内容。
pub async fn browse(
    uri: Uri,
    Extension(storage): Extension<Arc<Storage>>,
) -> Result<Response, ApiError> {
    let requested = uri
        .path()
        .strip_prefix(BROWSE_PREFIX)
        .unwrap_or_default();
    let resolved = storage.resolve(requested).inspect_err(|_| {
        warn!(requested, "rejected path outside shared directory");
    })?;

    let metadata = match fs::metadata(&resolved.path).await {
        Ok(metadata) => metadata,
        Err(err) => {
            debug!(path = resolved.relative, error = %err, "browse target missing");
            return Err(ApiError::NotFound("file or directory not found".into()));
        }
    };

    if metadata.is_dir() {
        let listing = Listing::read(&resolved.path).await?;
        info!(
            path = resolved.relative,
            directories = listing.directories.len(),
            files = listing.files.len(),
            "list directory"
        );
        return Ok(Html(listing.render(&resolved.relative)).into_response());
    }
    if metadata.is_file() {
        return serve_file(&resolved.path).await;
    }

    Err(ApiError::NotFound("file or directory not found".into()))
}

/// 以流式响应返回文件内容，附带类型、长度与修改时间。
pub async fn serve_file(path: &Path) -> Result<Response, ApiError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound("file not found".into()));
        }
        Err(err) => {
            warn!(path = ?path, error = %err, "failed to open file");
            return Err(ApiError::Internal(format!("server error: {err}")));
        }
    };
    // length and mtime come from the opened handle, not a second lookup
    let metadata = file.metadata().await.map_err(|err| {
        warn!(path = ?path, error = %err, "failed to stat file");
        ApiError::Internal(format!("server error: {err}"))
    })?;
    let file_size = metadata.len();
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid MIME type".into()))?,
    );
    response_headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&file_size.to_string())
            .map_err(|_| ApiError::Internal("failed to build response headers".into()))?,
    );
    if let Ok(modified) = metadata.modified() {
        response_headers.insert(
            header::LAST_MODIFIED,
            HeaderValue::from_str(&fmt_http_date(modified))
                .map_err(|_| ApiError::Internal("failed to build response headers".into()))?,
        );
    }

    info!(path = ?path, size = file_size, mime = mime.essence_str(), "download file");
    let stream = ReaderStream::new(file);
    Ok((
        StatusCode::OK,
        response_headers,
        AxumBody::from_stream(stream),
    )
        .into_response())
}
