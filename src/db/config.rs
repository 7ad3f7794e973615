use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbConfig {
    #[serde(default)]
    db_dir: Option<String>,
}

fn get_config_path(app: &AppHandle) -> Result<PathBuf, AppError> {
    let app_data_dir = app.path().app_data_dir().map_err(|e| {
        AppError::Database(format!("获取应用数据目录失败: {}", e))
    })?;
    Ok(app_data_dir.join("config.json"))
}

fn load_db_config_from_path(config_path: &Path) -> DbConfig {
    if config_path.exists() {
        if let Ok(content) = fs::read_to_string(config_path) {
            if let Ok(config) = serde_json::from_str(&content) {
                return config;
            }
        }
    }
    DbConfig { db_dir: None }
}

fn load_db_config(app: &AppHandle) -> DbConfig {
    let config_path = match get_config_path(app) {
        Ok(p) => p,
        Err(_) => return DbConfig { db_dir: None },
    };
    load_db_config_from_path(&config_path)
}

fn resolve_db_path_from_config(app_data_dir: &Path, config: &DbConfig) -> Result<PathBuf, AppError> {
    if let Some(ref dir) = config.db_dir {
        if !dir.is_empty() {
            let dir_path = PathBuf::from(dir);
            fs::create_dir_all(&dir_path).map_err(|e| {
                AppError::Database(format!("创建数据库目录失败: {}", e))
            })?;
            return Ok(dir_path.join("market.db"));
        }
    }
    Ok(app_data_dir.join("market.db"))
}

/// 解析数据库文件路径。
///
/// 优先使用配置文件中的自定义目录，未设置时回退到应用数据目录。
pub(super) fn resolve_db_path(app: &AppHandle) -> Result<PathBuf, AppError> {
    let app_data_dir = app.path().app_data_dir().map_err(|e| {
        AppError::Database(format!("获取应用数据目录失败: {}", e))
    })?;
    let config = load_db_config(app);
    resolve_db_path_from_config(&app_data_dir, &config)
}
