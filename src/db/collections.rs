use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tauri::State;

use crate::error::AppError;
use crate::storage::{self, StorageState};

use super::{DbState, Collection};

/// 行读取只还原数据库列，owner_name 与两张图片地址随后单独补全。
fn row_to_collection(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        title: row.get(1)?,
        collection_address: row.get(2)?,
        owner_address: row.get(3)?,
        owner_name: String::new(),
        description: row.get(4)?,
        items: row.get(5)?,
        floor_price: row.get(6)?,
        volume_traded: row.get(7)?,
        images_path: row.get(8)?,
        banner_image: String::new(),
        logo_image: String::new(),
    })
}

const COLLECTION_COLUMNS: &str =
    "id, title, collection_address, owner_address, description, items, floor_price, volume_traded, images_path";

fn lookup_owner_name(conn: &Connection, owner_address: &str) -> Result<Option<String>, AppError> {
    conn.query_row(
        "SELECT name FROM users WHERE address = ?1",
        params![owner_address],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| AppError::Database(format!("查询合集所有者失败: {}", e)))
}

fn resolve_collection_images(
    storage_root: &Path,
    collection: &mut Collection,
) -> Result<(), AppError> {
    if collection.images_path.is_empty() {
        return Ok(());
    }

    let banner_path = format!("{}/banner_image", collection.images_path);
    let logo_path = format!("{}/logo_image", collection.images_path);
    collection.banner_image =
        storage::download_url(storage_root, &banner_path)?.unwrap_or_default();
    collection.logo_image = storage::download_url(storage_root, &logo_path)?.unwrap_or_default();
    Ok(())
}

/// 按合约地址查找单个合集。
///
/// 未找到返回 `Ok(None)`。所有者展示名与横幅/徽标图片在此处补全。
pub fn get_collection(
    conn: &Connection,
    storage_root: &Path,
    collection_address: &str,
) -> Result<Option<Collection>, AppError> {
    let collection = conn
        .query_row(
            &format!(
                "SELECT {} FROM collections WHERE collection_address = ?1",
                COLLECTION_COLUMNS
            ),
            params![collection_address],
            row_to_collection,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("查询合集失败: {}", e)))?;

    match collection {
        Some(mut collection) => {
            collection.owner_name = lookup_owner_name(conn, &collection.owner_address)?
                .unwrap_or_else(|| "User".to_string());
            resolve_collection_images(storage_root, &mut collection)?;
            Ok(Some(collection))
        }
        None => Ok(None),
    }
}

/// 查询合集列表，可按所有者地址过滤。
///
/// 所有者已不存在于 users 表的合集会被跳过，不混入残缺数据。
pub fn get_collections(
    conn: &Connection,
    storage_root: &Path,
    owner_address: Option<&str>,
) -> Result<Vec<Collection>, AppError> {
    let (sql, filter) = match owner_address {
        Some(owner) => (
            format!(
                "SELECT {} FROM collections WHERE owner_address = ?1 ORDER BY id",
                COLLECTION_COLUMNS
            ),
            Some(owner.to_string()),
        ),
        None => (
            format!("SELECT {} FROM collections ORDER BY id", COLLECTION_COLUMNS),
            None,
        ),
    };

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Database(format!("准备合集查询失败: {}", e)))?;

    let rows = match &filter {
        Some(owner) => stmt.query_map(params![owner], row_to_collection),
        None => stmt.query_map([], row_to_collection),
    }
    .map_err(|e| AppError::Database(format!("查询合集列表失败: {}", e)))?
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| AppError::Database(format!("读取合集行失败: {}", e)))?;

    let mut collections = Vec::with_capacity(rows.len());
    for mut collection in rows {
        match lookup_owner_name(conn, &collection.owner_address)? {
            Some(name) => collection.owner_name = name,
            None => {
                log::warn!(
                    "⚠️ 跳过所有者缺失的合集 - address={}",
                    collection.collection_address
                );
                continue;
            }
        }
        resolve_collection_images(storage_root, &mut collection)?;
        collections.push(collection);
    }

    Ok(collections)
}

/// 创建新合集。
///
/// 横幅与徽标按 `Collections/{address}/...` 派生路径上传，
/// 计数与交易量从零起步。
pub fn create_collection(
    conn: &Connection,
    storage_root: &Path,
    title: &str,
    collection_address: &str,
    owner_address: &str,
    description: &str,
    banner_data_url: &str,
    logo_data_url: &str,
) -> Result<(), AppError> {
    let images_path = format!("Collections/{}", collection_address);
    storage::upload_data_url(
        storage_root,
        &format!("{}/banner_image", images_path),
        banner_data_url,
    )?;
    storage::upload_data_url(
        storage_root,
        &format!("{}/logo_image", images_path),
        logo_data_url,
    )?;

    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO collections (title, collection_address, owner_address, description, items, floor_price, volume_traded, images_path, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, '0', '0', ?5, ?6)",
        params![title, collection_address, owner_address, description, images_path, now],
    ).map_err(|e| AppError::Database(format!("创建合集失败: {}", e)))?;

    log::info!("🧩 合集已创建 - address={}", collection_address);
    Ok(())
}

/// 更新合集的标题、描述与可选的新图片。
///
/// 图片上传失败只告警不中断，文字字段照常更新。
pub fn update_collection(
    conn: &Connection,
    storage_root: &Path,
    collection_address: &str,
    title: &str,
    description: &str,
    banner_data_url: Option<&str>,
    logo_data_url: Option<&str>,
) -> Result<(), AppError> {
    let images_path = format!("Collections/{}", collection_address);
    if let Some(banner) = banner_data_url {
        if let Err(e) =
            storage::upload_data_url(storage_root, &format!("{}/banner_image", images_path), banner)
        {
            log::warn!("⚠️ 横幅图片更新失败 - address={} err={}", collection_address, e);
        }
    }
    if let Some(logo) = logo_data_url {
        if let Err(e) =
            storage::upload_data_url(storage_root, &format!("{}/logo_image", images_path), logo)
        {
            log::warn!("⚠️ 徽标图片更新失败 - address={} err={}", collection_address, e);
        }
    }

    conn.execute(
        "UPDATE collections SET title = ?1, description = ?2 WHERE collection_address = ?3",
        params![title, description, collection_address],
    ).map_err(|e| AppError::Database(format!("更新合集失败: {}", e)))?;

    Ok(())
}

#[tauri::command]
pub fn db_get_collection(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    collection_address: String,
) -> Result<Option<Collection>, AppError> {
    super::with_conn(&state, |conn| {
        get_collection(conn, storage.root(), &collection_address)
    })
}

#[tauri::command]
pub fn db_get_collections(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    owner_address: Option<String>,
) -> Result<Vec<Collection>, AppError> {
    super::with_conn(&state, |conn| {
        get_collections(conn, storage.root(), owner_address.as_deref())
    })
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub fn db_create_collection(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    title: String,
    collection_address: String,
    owner_address: String,
    description: String,
    banner_data_url: String,
    logo_data_url: String,
) -> Result<(), AppError> {
    super::with_conn(&state, |conn| {
        create_collection(
            conn,
            storage.root(),
            &title,
            &collection_address,
            &owner_address,
            &description,
            &banner_data_url,
            &logo_data_url,
        )
    })
}

#[tauri::command]
pub fn db_update_collection(
    state: State<'_, DbState>,
    storage: State<'_, StorageState>,
    collection_address: String,
    title: String,
    description: String,
    banner_data_url: Option<String>,
    logo_data_url: Option<String>,
) -> Result<(), AppError> {
    super::with_conn(&state, |conn| {
        update_collection(
            conn,
            storage.root(),
            &collection_address,
            &title,
            &description,
            banner_data_url.as_deref(),
            logo_data_url.as_deref(),
        )
    })
}
