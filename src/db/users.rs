use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tauri::State;

use crate::error::AppError;
use crate::storage::{self, StorageState};

use super::{DbState, User};

fn resolve_user_image(storage_root: &Path, image_path: &str) -> Result<String, AppError> {
    if image_path.is_empty() {
        return Ok(String::new());
    }
    Ok(storage::download_url(storage_root, image_path)?.unwrap_or_default())
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        address: row.get(1)?,
        name: row.get(2)?,
        image_path: row.get(3)?,
        image_url: String::new(),
    })
}

/// 按钱包地址查找单个用户。
///
/// 未找到返回 `Ok(None)`，不用空对象冒充。
pub fn get_user(
    conn: &Connection,
    storage_root: &Path,
    address: &str,
) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            "SELECT id, address, name, image_path FROM users WHERE address = ?1",
            params![address],
            row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("查询用户失败: {}", e)))?;

    match user {
        Some(mut user) => {
            user.image_url = resolve_user_image(storage_root, &user.image_path)?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// 查询全部用户。
pub fn get_users(conn: &Connection, storage_root: &Path) -> Result<Vec<User>, AppError> {
    let mut stmt = conn
        .prepare("SELECT id, address, name, image_path FROM users ORDER BY id")
        .map_err(|e| AppError::Database(format!("准备用户查询失败: {}", e)))?;

    let mut users = stmt
        .query_map([], row_to_user)
        .map_err(|e| AppError::Database(format!("查询用户列表失败: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(format!("读取用户行失败: {}", e)))?;

    for user in &mut users {
        user.image_url = resolve_user_image(storage_root, &user.image_path)?;
    }

    Ok(users)
}

/// 注册新用户（钱包首次连接时调用）。
///
/// 默认展示名为 `User`，头像为空。已存在的地址不重复插入。
pub fn add_user(conn: &Connection, address: &str) -> Result<(), AppError> {
    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT OR IGNORE INTO users (address, name, image_path, created_at) VALUES (?1, 'User', '', ?2)",
        params![address, now],
    ).map_err(|e| AppError::Database(format!("注册用户失败: {}", e)))?;
    Ok(())
}

/// 更新用户展示名与头像。
///
/// 头像以 Data URL 上传到派生路径 `Users/{address}/profile_image`。
pub fn update_user(
    conn: &Connection,
    storage_root: &Path,
    id: i64,
    address: &str,
    name: &str,
    image_data_url: &str,
) -> Result<(), AppError> {
    let image_path = format!("Users/{}/profile_image", address);
    storage::upload_data_url(storage_root, &image_path, image_data_url)?;

    conn.execute(
        "UPDATE users SET name = ?1, image_path = ?2 WHERE id = ?3",
        params![name, image_path, id],
    ).map_err(|e| AppError::Database(format!("更新用户失败: {}", e)))?;

    Ok(())
}

#[tauri::command]
pub fn db_get_user(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    address: String,
) -> Result<Option<User>, AppError> {
    super::with_conn(&state, |conn| get_user(conn, storage.root(), &address))
}

#[tauri::command]
pub fn db_get_users(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
) -> Result<Vec<User>, AppError> {
    super::with_conn(&state, |conn| get_users(conn, storage.root()))
}

#[tauri::command]
pub fn db_add_user(state: State<'_, DbState>, address: String) -> Result<(), AppError> {
    super::with_conn(&state, |conn| add_user(conn, &address))
}

#[tauri::command]
pub fn db_update_user(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    id: i64,
    address: String,
    name: String,
    image_data_url: String,
) -> Result<(), AppError> {
    super::with_conn(&state, |conn| {
        update_user(conn, storage.root(), id, &address, &name, &image_data_url)
    })
}
