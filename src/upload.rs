//! multipart 表单上传：逐个保存文件到上传目录。

use axum::body::Body as AxumBody;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// 上传目录配置；所有文件都直接保存为该目录的子项。
#[derive(Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
}

impl UploadConfig {
    /// 创建上传目录（如不存在）并记录其规范路径。
    pub async fn open(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir).await?;
        let dir = fs::canonicalize(&dir).await?;
        Ok(Self { dir })
    }
}

enum SaveError {
    Io(io::Error),
    Multipart(multer::Error),
}

/// 接收 multipart 上传，返回逗号分隔的已保存文件名。
pub async fn upload_files(
    headers: HeaderMap,
    Extension(upload): Extension<Arc<UploadConfig>>,
    body: AxumBody,
) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let saved = ingest(&upload, content_type, body).await?;
    info!(count = saved.len(), "upload batch saved");
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        saved.join(", "),
    )
        .into_response())
}

/// 解析请求体中的各个部分，按提交顺序保存带文件名的部分。
///
/// 单个文件写入失败只记录日志并继续处理后续部分；multipart 格式错误会结束本批次。
/// 一个文件都没有保存时返回 `NoFilesSaved`。
pub async fn ingest(
    upload: &UploadConfig,
    content_type: Option<&str>,
    body: AxumBody,
) -> Result<Vec<String>, ApiError> {
    let boundary = content_type
        .and_then(|value| multer::parse_boundary(value).ok())
        .ok_or_else(|| {
            ApiError::UnsupportedMediaType(
                "unsupported content type, use multipart/form-data".into(),
            )
        })?;

    let mut multipart = multer::Multipart::new(BodyExt::into_data_stream(body), boundary);
    let mut saved = Vec::new();

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "malformed multipart body");
                break;
            }
        };
        let field_name = field.name().unwrap_or_default().to_string();
        let Some(raw_name) = field.file_name().filter(|name| !name.is_empty()) else {
            debug!(field = field_name, "skip form field without file");
            continue;
        };
        let raw_name = raw_name.to_string();
        let Some(file_name) = sanitize_file_name(&raw_name) else {
            warn!(field = field_name, raw_name, "unusable upload file name");
            continue;
        };

        let target = upload.dir.join(&file_name);
        match save_part(&target, &mut field).await {
            Ok(bytes) => {
                info!(name = file_name, bytes, "file saved");
                saved.push(file_name);
            }
            Err(SaveError::Io(err)) => {
                warn!(name = file_name, error = %err, "failed to save uploaded file");
            }
            Err(SaveError::Multipart(err)) => {
                warn!(name = file_name, error = %err, "upload stream broken");
                break;
            }
        }
    }

    if saved.is_empty() {
        return Err(ApiError::NoFilesSaved);
    }
    Ok(saved)
}

/// 先写入同目录的隐藏临时文件，完整后再替换目标；失败时目标保持原样。
async fn save_part(target: &Path, field: &mut multer::Field<'_>) -> Result<u64, SaveError> {
    let temp_path = temp_path_for(target);
    let result = async {
        let mut file = File::create(&temp_path).await.map_err(SaveError::Io)?;
        let mut written: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(SaveError::Multipart)? {
            if chunk.is_empty() {
                continue;
            }
            file.write_all(&chunk).await.map_err(SaveError::Io)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(SaveError::Io)?;
        drop(file);
        fs::rename(&temp_path, target).await.map_err(SaveError::Io)?;
        Ok(written)
    }
    .await;
    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}

fn temp_path_for(target: &Path) -> PathBuf {
    let base = target
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| "upload".into());
    target.with_file_name(format!(".{base}.part.{}", Uuid::new_v4()))
}

/// 只保留客户端文件名的最后一段；`/` 与 `\` 都视为分隔符。
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let basename = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    if basename.is_empty() || basename == "." || basename == ".." {
        return None;
    }
    Some(basename.to_string())
}
