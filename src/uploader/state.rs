//! # 上传组件视觉状态模块
//!
//! ## 设计思路
//!
//! 每个已配置的上传组件对应一个 `Uploader` 句柄，持有：
//! - 调用方配置（名称、占位图、目标尺寸、输出模式）
//! - 视觉状态（当前图片、是否已上传、控件文案）
//! - 代数计数器（generation），用于在移除或重复触发时作废在途完成回调
//!
//! ## 实现思路
//!
//! 文案恒由 `is_image_present` 派生（`"Remove " / "Upload " + name`），
//! 不允许外部直接写入，保证文案法则在任何时刻成立。
//! 视觉状态永不持久化，每次 `configure` 都从 `initial_value` 重建。

use serde::Serialize;

use super::{OutputMode, TargetSize, UploaderError};

/// 上传组件的视觉状态快照。
#[derive(Debug, Clone, Serialize)]
pub struct VisualState {
    /// 当前展示的图片地址：占位图或最近一次归一化产物。
    pub current_image_url: String,
    /// 是否已有上传图片。
    pub is_image_present: bool,
    /// 控件文案：`"Remove " + name` 或 `"Upload " + name`。
    pub label_text: String,
}

/// 单个上传组件句柄。
pub(crate) struct Uploader {
    pub(crate) name: String,
    pub(crate) placeholder_url: String,
    pub(crate) size: TargetSize,
    pub(crate) output_mode: OutputMode,
    current_image_url: String,
    is_image_present: bool,
    /// 代数计数器：每次开始新操作或移除时自增，
    /// 在途完成回调若发现代数已变化则放弃写入。
    generation: u64,
}

impl Uploader {
    /// 创建上传组件句柄。
    ///
    /// `initial_value` 非空时视为“已有图片”初始化。
    /// 目标尺寸必须为正，否则返回 `InvalidFormat`。
    pub(crate) fn new(
        name: String,
        placeholder_url: String,
        size: TargetSize,
        output_mode: OutputMode,
        initial_value: Option<String>,
    ) -> Result<Self, UploaderError> {
        if size.width == 0 || size.height == 0 {
            return Err(UploaderError::InvalidFormat(format!(
                "目标尺寸必须为正：{}x{}",
                size.width, size.height
            )));
        }

        let initial = initial_value.filter(|v| !v.is_empty());
        let is_image_present = initial.is_some();
        let current_image_url = initial.unwrap_or_else(|| placeholder_url.clone());

        Ok(Self {
            name,
            placeholder_url,
            size,
            output_mode,
            current_image_url,
            is_image_present,
            generation: 0,
        })
    }

    fn label_text(&self) -> String {
        let prefix = if self.is_image_present { "Remove " } else { "Upload " };
        format!("{}{}", prefix, self.name)
    }

    /// 当前视觉状态快照。
    pub(crate) fn visual_state(&self) -> VisualState {
        VisualState {
            current_image_url: self.current_image_url.clone(),
            is_image_present: self.is_image_present,
            label_text: self.label_text(),
        }
    }

    /// 是否已有上传图片。
    pub(crate) fn is_image_present(&self) -> bool {
        self.is_image_present
    }

    /// 开始一次新的归一化操作，返回本次操作的代数。
    pub(crate) fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// 校验某次操作的代数是否仍然有效。
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// 归一化成功后写入新图片。
    pub(crate) fn apply_image(&mut self, data_url: String) -> VisualState {
        self.current_image_url = data_url;
        self.is_image_present = true;
        self.visual_state()
    }

    /// 执行移除：重置为占位图并作废在途操作。
    ///
    /// 已处于移除态时重复调用不改变任何状态（幂等）。
    pub(crate) fn apply_removed(&mut self) -> VisualState {
        self.generation += 1;
        self.current_image_url = self.placeholder_url.clone();
        self.is_image_present = false;
        self.visual_state()
    }
}
