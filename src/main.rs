// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # NFT 市场桌面客户端 — 应用入口
//!
//! 本文件仅负责应用初始化与插件/命令注册。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::sync::Mutex;

use nft_market::{db, storage, uploader};
use tauri::Manager;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        // 插件初始化
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        // 应用设置
        .setup(|app| {
            log::info!("setup: begin");
            let handle = app.handle().clone();

            // 初始化数据库并注册为托管状态
            match db::init_db(&handle) {
                Ok(conn) => {
                    app.manage(db::DbState(Mutex::new(conn)));
                    log::info!("setup: db state managed");
                }
                Err(err) => {
                    log::error!("setup: 数据库初始化失败，应用将以受限模式运行: {err}");
                }
            }

            // 初始化对象存储根目录
            match storage::resolve_storage_root(&handle) {
                Ok(root) => {
                    app.manage(storage::StorageState::new(root));
                    log::info!("setup: storage state managed");
                }
                Err(err) => {
                    log::error!("setup: 对象存储初始化失败，应用将以受限模式运行: {err}");
                }
            }

            // 上传控件服务（规格化管线 + 控件状态）
            app.manage(uploader::UploaderServiceState::default());
            log::info!("setup: uploader service managed");

            log::info!("setup: complete");
            Ok(())
        })
        // 注册所有 Tauri 命令
        .invoke_handler(tauri::generate_handler![
            // 上传控件
            uploader::commands::uploader_configure,
            uploader::commands::uploader_file_selected,
            uploader::commands::uploader_activate_control,
            uploader::commands::uploader_remove,
            uploader::commands::uploader_get_visual_state,
            uploader::commands::uploader_set_quality_profile,
            uploader::commands::uploader_get_quality_profile,
            // 用户档案
            db::db_get_user,
            db::db_get_users,
            db::db_add_user,
            db::db_update_user,
            // 合集档案
            db::db_get_collection,
            db::db_get_collections,
            db::db_create_collection,
            db::db_update_collection,
            // 数据库管理
            db::db_get_info,
            // 存储目录信息
            storage::get_storage_info,
        ])
        .run(tauri::generate_context!())
        .expect("运行 Tauri 应用时出错");
}
