//! 目录列表页生成。

use html_escape::encode_text;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::config::BROWSE_PREFIX;
use crate::storage::StorageError;

const STYLE: &str = r#"
        body { font-family: sans-serif; margin: 20px; background-color: #f4f4f4; color: #333; }
        h1 { color: #0056b3; text-align: center; margin-bottom: 30px; word-break: break-all; }
        .container { max-width: 800px; margin: 0 auto; background-color: #fff; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        ul { list-style: none; padding: 0; }
        li { margin-bottom: 8px; }
        li a { text-decoration: none; color: #007bff; font-weight: bold; }
        li a:hover { text-decoration: underline; }
        .folder-icon::before { content: "\1F4C1  "; }
        .file-icon::before { content: "\1F4C4  "; }
        .back-link { display: block; margin-bottom: 15px; font-weight: bold; }
        .back-link a { color: #dc3545; }
"#;

/// 目录的可见子项：子目录与文件分别按名称升序。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl Listing {
    /// 读取目录的直接子项，跳过以 `.` 开头的隐藏项与非 UTF-8 名称。
    pub async fn read(dir: &Path) -> Result<Self, StorageError> {
        let mut entries = fs::read_dir(dir).await?;
        let mut listing = Listing::default();

        while let Some(entry) = entries.next_entry().await? {
            // links are built from the name, so a lossy one would point nowhere
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "skip entry with non-UTF-8 name");
                    continue;
                }
            };
            if name.starts_with('.') {
                continue;
            }
            // follows symlinks; dangling ones are dropped
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(name, error = %err, "skip unreadable entry");
                    continue;
                }
            };
            if metadata.is_dir() {
                listing.directories.push(name);
            } else if metadata.is_file() {
                listing.files.push(name);
            }
        }

        listing.directories.sort();
        listing.files.sort();
        Ok(listing)
    }

    /// 生成完整 HTML 页面；`relative` 为相对共享根的逻辑路径，根目录为空串。
    pub fn render(&self, relative: &str) -> String {
        let current = if relative.is_empty() {
            "/".to_string()
        } else {
            format!("/{relative}/")
        };
        let href_base = format!("{BROWSE_PREFIX}{}", encode_path(&current));
        let title = encode_text(&current);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("    <title>Shared files - {title}</title>\n"));
        html.push_str(&format!("    <style>{STYLE}    </style>\n"));
        html.push_str("</head>\n<body>\n    <div class=\"container\">\n");
        html.push_str(&format!("        <h1>Contents of {title}</h1>\n"));

        if !relative.is_empty() {
            html.push_str(&format!(
                "        <p class=\"back-link\"><a href=\"{}\">Parent directory</a></p>\n",
                parent_href(relative)
            ));
        }

        html.push_str("        <ul>\n");
        for name in &self.directories {
            html.push_str(&format!(
                "            <li><span class=\"folder-icon\"></span><a href=\"{href_base}{}/\">{}/</a></li>\n",
                urlencoding::encode(name),
                encode_text(name)
            ));
        }
        for name in &self.files {
            html.push_str(&format!(
                "            <li><span class=\"file-icon\"></span><a href=\"{href_base}{}\">{}</a></li>\n",
                urlencoding::encode(name),
                encode_text(name)
            ));
        }
        html.push_str("        </ul>\n    </div>\n</body>\n</html>\n");
        html
    }
}

/// 父目录链接；父目录为共享根时指向浏览入口本身。
fn parent_href(relative: &str) -> String {
    match relative.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => {
            format!("{BROWSE_PREFIX}{}/", encode_path(&format!("/{parent}")))
        }
        _ => format!("{BROWSE_PREFIX}/"),
    }
}

/// 逐段百分号编码，保留 `/`。
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn link_positions(html: &str, hrefs: &[&str]) -> Vec<usize> {
        hrefs
            .iter()
            .map(|href| {
                html.find(&format!("href=\"{href}\""))
                    .unwrap_or_else(|| panic!("missing link {href}"))
            })
            .collect()
    }

    #[tokio::test]
    async fn directories_before_files_each_sorted_hidden_skipped() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        std::fs::create_dir(root.join("b")).expect("mkdir b");
        std::fs::create_dir(root.join("a")).expect("mkdir a");
        std::fs::write(root.join("z.txt"), b"z").expect("write z");
        std::fs::write(root.join("y.txt"), b"y").expect("write y");
        std::fs::write(root.join(".secret"), b"hidden").expect("write hidden");
        std::fs::create_dir(root.join(".git")).expect("mkdir hidden");

        let listing = Listing::read(root).await.expect("read listing");
        assert_eq!(listing.directories, vec!["a", "b"]);
        assert_eq!(listing.files, vec!["y.txt", "z.txt"]);

        let html = listing.render("");
        let positions = link_positions(&html, &["/get/a/", "/get/b/", "/get/y.txt", "/get/z.txt"]);
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(!html.contains(".secret"));
        assert!(!html.contains(".git"));
        assert!(!html.contains("Parent directory"));
    }

    #[test]
    fn sorting_is_two_separate_passes() {
        let listing = Listing {
            directories: vec!["zeta".into()],
            files: vec!["alpha.txt".into()],
        };
        let html = listing.render("");
        let positions = link_positions(&html, &["/get/zeta/", "/get/alpha.txt"]);
        assert!(positions[0] < positions[1]);
    }

    #[test]
    fn names_are_encoded_in_href_only() {
        let listing = Listing {
            directories: vec!["My Docs".into()],
            files: vec!["a&b <1>.txt".into(), "été.pdf".into()],
        };
        let html = listing.render("photos 2024");
        assert!(html.contains("href=\"/get/photos%202024/My%20Docs/\">My Docs/</a>"));
        assert!(html.contains("href=\"/get/photos%202024/a%26b%20%3C1%3E.txt\">a&amp;b &lt;1&gt;.txt</a>"));
        assert!(html.contains("href=\"/get/photos%202024/%C3%A9t%C3%A9.pdf\">été.pdf</a>"));
        assert!(html.contains("Contents of /photos 2024/"));
    }

    #[test]
    fn parent_link_points_at_browse_root_from_first_level() {
        let html = Listing::default().render("docs");
        assert!(html.contains("<a href=\"/get/\">Parent directory</a>"));
    }

    #[test]
    fn parent_link_from_nested_directory() {
        let html = Listing::default().render("docs/2024 q1/raw");
        assert!(html.contains("<a href=\"/get/docs/2024%20q1/\">Parent directory</a>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let listing = Listing {
            directories: vec!["a".into()],
            files: vec!["b.txt".into()],
        };
        assert_eq!(listing.render("x"), listing.render("x"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlinks_are_omitted() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        symlink(root.join("missing"), root.join("broken")).expect("symlink");
        std::fs::write(root.join("real.txt"), b"ok").expect("write");

        let listing = Listing::read(root).await.expect("read listing");
        assert!(listing.directories.is_empty());
        assert_eq!(listing.files, vec!["real.txt"]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        std::fs::write(root.join(OsStr::from_bytes(b"bad\xff.txt")), b"x").expect("write");
        std::fs::write(root.join("good.txt"), b"ok").expect("write");

        let listing = Listing::read(root).await.expect("read listing");
        assert_eq!(listing.files, vec!["good.txt"]);
    }
}
