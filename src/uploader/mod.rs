//! # 图片上传组件模块（uploader）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码校验 → 适配裁剪 → 输出转换 → 视觉状态维护”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：仅做 IPC 入参/出参适配（薄封装）
//! - `service`：承载可注入状态（`UploaderServiceState`）与组件注册表
//! - `handler`：编排整条归一化流水线
//! - `loader`：负责文件 / Data URL 加载与安全校验
//! - `pipeline`：负责解码、几何方案、缩放裁剪与 JPEG 编码
//! - `output`：负责规范形态到输出模式的派生
//! - `state`：单个上传组件的视觉状态与代数计数器
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 前端 invoke
//!    ↓
//! commands.rs（参数适配）
//!    ↓
//! service.rs（State 注入、注册表、代数校验）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ pipeline.rs（解码 + plan_fit 几何 + 缩放裁剪 + JPEG 编码）
//!    └─ output.rs（InlineString / Blob / NamedFile 派生）
//!    ↓
//! 返回 SelectionOutcome / UploaderCommandError 给前端
//! ```
//!
//! ## 分层职责建议
//!
//! - 调用入口变更（命令名/参数）优先改 `commands.rs`
//! - 配置与策略变更优先改 `config.rs`
//! - 事件顺序与取消语义变更优先改 `service.rs`
//! - 单阶段行为优化分别改 `loader/pipeline/output`

pub mod commands;
mod config;
mod error;
mod handler;
mod loader;
mod output;
mod pipeline;
mod service;
mod source;
mod state;

pub use commands::{
    uploader_activate_control,
    uploader_configure,
    uploader_file_selected,
    uploader_get_quality_profile,
    uploader_get_visual_state,
    uploader_remove,
    uploader_set_quality_profile,
};
pub use config::{OutputMode, QualityProfile, UploaderConfig};
pub use error::UploaderError;
pub use pipeline::{plan_fit, FitPlan};
pub use service::{ControlAction, SelectionOutcome, UploaderServiceState, UploaderSpec};
pub use source::{AspectClass, ImageSource, NormalizedImage, NormalizedOutput, TargetSize};
pub use state::VisualState;

/// 内部核心编排器，不直接暴露给 Tauri 命令层。
pub(crate) use handler::UploaderHandler;
