//! 数据库模块
//!
//! # 设计思路
//!
//! 将用户与合集档案的所有库表操作集中到 Rust 后端，前端通过 Tauri IPC 调用。
//! 使用 `rusqlite` 直接操作 SQLite，充当原托管文档库的本地落地。
//!
//! # 优势
//!
//! - **类型安全**：Rust struct + serde，编译期保证数据结构正确
//! - **查找语义明确**：单条查询返回 `Option<T>`，不用空对象冒充“未找到”
//! - **一致性**：单一数据源，后端统一管控
//! - **可维护性**：SQL 逻辑集中在一个模块

use std::fs;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, State};

use crate::error::AppError;

mod collections;
mod config;
mod schema;
mod users;

pub use collections::*;
pub use users::*;

// ============================================================================
// 数据模型
// ============================================================================

/// 用户档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// 钱包地址（唯一）
    pub address: String,
    pub name: String,
    /// 头像在对象存储中的派生路径，未设置时为空串
    pub image_path: String,
    /// 从对象存储解析出的可展示地址（不入库）
    pub image_url: String,
}

/// NFT 合集档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    /// 合集链上地址（唯一）
    pub collection_address: String,
    pub owner_address: String,
    /// 拥有者展示名，查询时从用户表联立
    pub owner_name: String,
    pub description: String,
    pub items: i64,
    pub floor_price: String,
    pub volume_traded: String,
    /// 合集图片在对象存储中的目录路径，未设置时为空串
    pub images_path: String,
    /// 横幅图展示地址（不入库）
    pub banner_image: String,
    /// 徽标图展示地址（不入库）
    pub logo_image: String,
}

// ============================================================================
// 数据库状态（Tauri Managed State）
// ============================================================================

/// 数据库连接封装，由 Tauri 托管
pub struct DbState(pub Mutex<Connection>);

pub(crate) fn with_conn<T>(
    state: &State<'_, DbState>,
    op: impl FnOnce(&Connection) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let conn = state.0.lock().map_err(|e| {
        AppError::Database(format!("获取数据库锁失败: {}", e))
    })?;
    op(&conn)
}

// ============================================================================
// 数据库初始化
// ============================================================================

/// 初始化数据库连接与 Schema
///
/// 在 `main.rs` 的 `setup` 阶段调用，创建表结构并执行迁移。
/// 返回的 `Connection` 将被包装为 `DbState` 注册到 Tauri 状态管理中。
pub fn init_db(app: &AppHandle) -> Result<Connection, AppError> {
    let db_path = config::resolve_db_path(app)?;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Database(format!("创建数据库目录失败: {}", e))
        })?;
    }
    log::info!("数据库路径: {}", db_path.display());

    let conn = Connection::open(&db_path).map_err(|e| {
        AppError::Database(format!("打开数据库失败: {}", e))
    })?;

    schema::initialize_schema(&conn)?;

    Ok(conn)
}

/// 打开内存数据库并初始化 Schema（测试与工具用途）。
pub fn init_in_memory_db() -> Result<Connection, AppError> {
    let conn = Connection::open_in_memory().map_err(|e| {
        AppError::Database(format!("打开内存数据库失败: {}", e))
    })?;
    schema::initialize_schema(&conn)?;
    Ok(conn)
}

// ============================================================================
// Tauri Commands
// ============================================================================

/// 数据库概览信息
#[derive(Debug, Clone, Serialize)]
pub struct DbInfo {
    pub users: i64,
    pub collections: i64,
}

/// 查询数据库概览（用户数 / 合集数）。
#[tauri::command]
pub fn db_get_info(state: State<'_, DbState>) -> Result<DbInfo, AppError> {
    with_conn(&state, |conn| {
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("查询用户数失败: {}", e)))?;
        let collections: i64 = conn
            .query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("查询合集数失败: {}", e)))?;
        Ok(DbInfo { users, collections })
    })
}

// 用户与合集命令已拆分到 `db/users.rs` 和 `db/collections.rs`，
// 通过 `pub use` 在本模块维持 `db::xxx` 兼容导出。
