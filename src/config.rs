//! CLI arguments and server configuration defaults.

use clap::Parser;
use std::io;
use std::path::PathBuf;

pub const UPLOAD_PATH: &str = "/upload";
pub const BROWSE_PREFIX: &str = "/get";
pub const UPLOAD_DIR_NAME: &str = "uploads";
pub const SHARE_DIR_NAME: &str = "share";
pub const DEFAULT_PORT: u16 = 8000;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "lan-drop", version, about = "LAN file drop and share server")]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        env = "LAN_DROP_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub bind: String,
    #[arg(
        short = 'p',
        long,
        env = "LAN_DROP_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        short = 'u',
        long,
        env = "LAN_DROP_UPLOAD_DIR",
        help = "Directory receiving uploads (default: ./uploads next to the binary)"
    )]
    pub upload_dir: Option<PathBuf>,
    #[arg(
        short = 's',
        long,
        env = "LAN_DROP_SHARE_DIR",
        help = "Directory exposed for browsing (default: ./share next to the binary)"
    )]
    pub share_dir: Option<PathBuf>,
    #[arg(short = 'v', long, help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,
}

impl Args {
    /// 上传目录：显式配置优先，否则位于可执行文件旁。
    pub fn upload_dir(&self) -> io::Result<PathBuf> {
        match &self.upload_dir {
            Some(dir) => Ok(dir.clone()),
            None => beside_executable(UPLOAD_DIR_NAME),
        }
    }

    /// 共享目录：显式配置优先，否则位于可执行文件旁。
    pub fn share_dir(&self) -> io::Result<PathBuf> {
        match &self.share_dir {
            Some(dir) => Ok(dir.clone()),
            None => beside_executable(SHARE_DIR_NAME),
        }
    }
}

fn beside_executable(name: &str) -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let parent = exe
        .parent()
        .ok_or_else(|| io::Error::other("executable has no parent directory"))?;
    Ok(parent.join(name))
}
