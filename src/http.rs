//! HTTP 辅助工具：重定向回退、安全头与局域网地址展示。

use axum::body::Body as AxumBody;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::{middleware, response::IntoResponse, response::Response};
use std::net::IpAddr;
use tracing::warn;

use crate::config::UPLOAD_PATH;

/// 其余路径一律 302 重定向到上传页，并附带简短正文。
pub async fn redirect_to_upload() -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, UPLOAD_PATH)],
        format!("Redirecting to {UPLOAD_PATH}"),
    )
        .into_response()
}

/// 添加基础安全响应头。
pub async fn add_security_headers(request: Request<AxumBody>, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    response
}

/// 展示用地址：监听通配地址时改用本机局域网 IP。
pub fn display_host(bind: IpAddr) -> IpAddr {
    if !bind.is_unspecified() {
        return bind;
    }
    match local_ip_address::local_ip() {
        Ok(ip) => ip,
        Err(err) => {
            warn!(error = %err, "could not determine local ip");
            IpAddr::from([127, 0, 0, 1])
        }
    }
}
