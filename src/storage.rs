//! 对象存储封装模块
//!
//! # 设计思路
//!
//! 统一管理用户头像与合集图片的持久化存储：调用方以“派生相对路径”
//! （如 `Collections/{address}/banner_image`）上传 Data URL 字符串，
//! 之后可按同一路径取回可直接用于 `<img>` 的地址。
//!
//! # 实现思路
//!
//! - 存储根目录在应用启动时从应用数据目录解析一次，作为 `StorageState` 注入，
//!   不使用模块级单例。
//! - 相对路径写入前做遍历攻击校验（拒绝绝对路径与 `..` 分量）。
//! - 缺失对象返回 `Ok(None)`，不用空字符串冒充“未找到”。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tauri::{AppHandle, Manager, State};

use crate::error::AppError;

/// 对象存储根目录，由 Tauri 托管。
pub struct StorageState {
    root: PathBuf,
}

impl StorageState {
    /// 以给定根目录构造存储状态（测试可指向临时目录）。
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// 存储根目录。
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// 存储目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 解析对象存储根目录（应用数据目录下的 `storage` 子目录）。
///
/// 在 `main.rs` 的 `setup` 阶段调用一次，结果包装为 `StorageState` 注入。
pub fn resolve_storage_root(app: &AppHandle) -> Result<PathBuf, AppError> {
    let app_data_dir = app.path().app_data_dir().map_err(|e| {
        AppError::Storage(format!("获取应用数据目录失败: {}", e))
    })?;
    let storage_dir = app_data_dir.join("storage");
    if !storage_dir.exists() {
        fs::create_dir_all(&storage_dir).map_err(|e| {
            AppError::Storage(format!("创建存储目录失败: {}", e))
        })?;
    }
    Ok(storage_dir)
}

fn sanitize_relative_path(relative: &str) -> Result<PathBuf, AppError> {
    if relative.is_empty() {
        return Err(AppError::Storage("对象路径不能为空".to_string()));
    }

    let path = Path::new(relative);
    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => sanitized.push(part),
            _ => {
                return Err(AppError::Storage(format!(
                    "非法对象路径: {}",
                    relative
                )));
            }
        }
    }

    Ok(sanitized)
}

/// 在派生路径上传一个 Data URL 字符串。
pub fn upload_data_url(root: &Path, relative: &str, data_url: &str) -> Result<(), AppError> {
    if !data_url.starts_with("data:") {
        return Err(AppError::Storage("上传内容必须是 Data URL".to_string()));
    }

    let target = root.join(sanitize_relative_path(relative)?);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("创建对象目录失败: {}", e))
        })?;
    }

    fs::write(&target, data_url).map_err(|e| {
        AppError::Storage(format!("写入对象 '{}' 失败: {}", relative, e))
    })?;

    log::info!("📦 对象已上传 - path={} size={}B", relative, data_url.len());
    Ok(())
}

/// 按派生路径取回可展示地址。
///
/// 缺失对象返回 `Ok(None)`。
pub fn download_url(root: &Path, relative: &str) -> Result<Option<String>, AppError> {
    let target = root.join(sanitize_relative_path(relative)?);
    if !target.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&target).map_err(|e| {
        AppError::Storage(format!("读取对象 '{}' 失败: {}", relative, e))
    })?;

    Ok(Some(content))
}

fn collect_dir_stats(dir: &Path, total_size: &mut u64, file_count: &mut u64) {
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    *total_size += metadata.len();
                    *file_count += 1;
                } else if metadata.is_dir() {
                    collect_dir_stats(&entry.path(), total_size, file_count);
                }
            }
        }
    }
}

/// 获取对象存储信息（路径 + 占用大小 + 文件数）
#[tauri::command]
pub fn get_storage_info(state: State<'_, StorageState>) -> Result<StorageInfo, AppError> {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if state.root().exists() {
        collect_dir_stats(state.root(), &mut total_size, &mut file_count);
    }

    Ok(StorageInfo {
        path: state.root().to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}
