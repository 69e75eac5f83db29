//! 路由装配：上传、浏览与回退重定向。

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::get;
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};

use crate::config::{BROWSE_PREFIX, UPLOAD_PATH};
use crate::storage::Storage;
use crate::upload::UploadConfig;
use crate::{files, frontend, http, upload};

/// 构建完整路由；目录配置通过 Extension 注入。
pub fn build_router(storage: Arc<Storage>, upload_config: Arc<UploadConfig>) -> Router {
    Router::new()
        .route(
            UPLOAD_PATH,
            get(frontend::upload_page)
                .post(upload::upload_files)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(BROWSE_PREFIX, get(files::browse))
        .route(&format!("{BROWSE_PREFIX}/"), get(files::browse))
        .route(&format!("{BROWSE_PREFIX}/{{*path}}"), get(files::browse))
        .fallback(http::redirect_to_upload)
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let client_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip().to_string())
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(Extension(storage))
        .layer(Extension(upload_config))
}
