//! 嵌入式上传页面。

use axum::body::Body as AxumBody;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

use crate::error::ApiError;

#[derive(RustEmbed)]
#[folder = "assets"]
/// 嵌入式静态页面。
pub struct Assets;

const UPLOAD_PAGE: &str = "upload.html";

/// 返回上传表单页面。
pub async fn upload_page() -> Result<Response, ApiError> {
    load_embedded_asset(UPLOAD_PAGE)
}

fn load_embedded_asset(path: &str) -> Result<Response, ApiError> {
    let asset = Assets::get(path)
        .ok_or_else(|| ApiError::Internal(format!("missing embedded asset {path}")))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = if mime.type_() == mime_guess::mime::TEXT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .map_err(|_| ApiError::Internal("invalid MIME type".into()))?,
    );
    Ok((headers, AxumBody::from(asset.data.into_owned())).into_response())
}
