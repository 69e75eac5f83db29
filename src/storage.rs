//! 共享目录：请求路径解析与越界校验。

use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

/// 解析结果：绝对路径与相对共享根的逻辑路径（`/` 分隔，根目录为空串）。
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub relative: String,
}

impl Storage {
    /// 以给定根目录构建，不访问文件系统。
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: normalize_lexically(&root),
        }
    }

    /// 创建根目录（如不存在）并以其规范路径构建。
    pub async fn open(root: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&root).await?;
        let canonical = fs::canonicalize(&root).await?;
        Ok(Self::new(canonical))
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// 解码百分号转义后解析为共享根下的路径；越界时返回 `Forbidden`。
    pub fn resolve(&self, requested: &str) -> Result<ResolvedPath, StorageError> {
        let decoded = urlencoding::decode_binary(requested.as_bytes());
        let decoded = String::from_utf8_lossy(&decoded);
        let path = confine(&self.root, &decoded)?;
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| StorageError::Forbidden)?
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<Cow<'_, str>>>()
            .join("/");
        Ok(ResolvedPath { path, relative })
    }
}

/// 将 `requested` 拼接到 `root` 后做词法规范化，仅当结果等于 `root` 或位于其下时接受。
///
/// `root` 须已是规范化的绝对路径。前缀比较按完整路径段进行，`/srv/shareX` 不属于 `/srv/share`。
pub fn confine(root: &Path, requested: &str) -> Result<PathBuf, StorageError> {
    let trimmed = requested.trim_start_matches('/');
    let candidate = normalize_lexically(&root.join(trimmed));
    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(StorageError::Forbidden)
    }
}

/// 纯词法规范化：去除冗余分隔符与 `.`，折叠 `..`，不依赖路径是否存在。
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => continue,
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `..` above the filesystem root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
        }
    }
    normalized
}

#[derive(Debug)]
pub enum StorageError {
    Forbidden,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}
