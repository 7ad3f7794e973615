//! # NFT 市场桌面客户端 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前端 (WebView UI)                        │
//! │                                                          │
//! │  钱包连接 ── 合集页 ── 个人资料页 ── 创建合集弹窗          │
//! │       │            (上传控件 × N)                         │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Tauri IPC (Result<T, AppError>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ uploader ─── 图片上传控件：选取·规格化·输出转换        │
//! │  │   ├─ pipeline   解码 → 比例分类 → 缩放 → 居中裁剪       │
//! │  │   ├─ service    控件状态机 + 代数计数器并发控制         │
//! │  │   └─ commands   IPC 入口（结构化错误 {code,stage}）     │
//! │  │                                                       │
//! │  ├─ db ───────── SQLite (rusqlite) 用户/合集档案           │
//! │  └─ storage ──── 对象存储（派生路径 → Data URL）           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有 Tauri command 的返回类型 |
//! | [`uploader`] | 上传控件：图片加载、等比缩放裁剪、输出格式转换、并发取消 |
//! | [`db`] | 用户与合集档案的 SQLite CRUD |
//! | [`storage`] | 按派生路径存取图片对象（本地对象存储） |

pub mod error;
pub mod db;
pub mod storage;
pub mod uploader;
