//! Schema 初始化子模块
//!
//! ## 职责
//! - 创建/迁移数据库表结构与索引
//! - 设置 SQLite 运行参数（WAL、外键）
//!
//! ## 输入/输出
//! - 输入：`&Connection`
//! - 输出：`Result<(), AppError>`
//!
//! ## 错误语义
//! - DDL 失败统一映射为 `AppError::Database`

use rusqlite::Connection;

use crate::error::AppError;

const SCHEMA_VERSION: i64 = 1;

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Database(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Database(format!("写入数据库版本失败: {}", e)))
}

fn create_base_tables(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT 'User',
            image_path TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS collections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            collection_address TEXT NOT NULL UNIQUE,
            owner_address TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            items INTEGER NOT NULL DEFAULT 0,
            floor_price TEXT NOT NULL DEFAULT '0',
            volume_traded TEXT NOT NULL DEFAULT '0',
            images_path TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );"
    ).map_err(|e| AppError::Database(format!("创建基础表失败: {}", e)))?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_users_address ON users(address);
         CREATE INDEX IF NOT EXISTS idx_collections_address ON collections(collection_address);
         CREATE INDEX IF NOT EXISTS idx_collections_owner ON collections(owner_address);"
    ).map_err(|e| AppError::Database(format!("创建基础索引失败: {}", e)))?;

    Ok(())
}

/// 初始化表结构与运行参数。
///
/// 幂等：重复调用不破坏既有数据。
pub(super) fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;"
    ).map_err(|e| AppError::Database(format!("设置数据库运行参数失败: {}", e)))?;

    create_base_tables(conn)?;

    let version = get_user_version(conn)?;
    if version < SCHEMA_VERSION {
        set_user_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initialization_is_idempotent() {
        let conn = Connection::open_in_memory().expect("in-memory db should open");

        initialize_schema(&conn).expect("first init should succeed");
        initialize_schema(&conn).expect("second init should succeed");

        let version = get_user_version(&conn).expect("version should be readable");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
