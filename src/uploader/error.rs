//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片归一化链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//! 解码失败与转换失败是两个独立分支：前者不触碰视觉状态，
//! 后者发生在裁剪成功之后，视觉状态保留新图片。

/// 图片归一化统一错误类型。
///
/// 该类型会在命令层被包装为带 `code/stage` 的结构化错误，最终透传给前端。
#[derive(Debug, thiserror::Error)]
pub enum UploaderError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("转换错误：{0}")]
    Conversion(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("操作已取消：{0}")]
    Cancelled(String),

    #[error("上传组件未配置：{0}")]
    NotConfigured(String),
}

impl UploaderError {
    /// 稳定错误码，供前端按类别处理。
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::Conversion(_) => "E_CONVERSION",
            Self::FileSystem(_) => "E_FILESYSTEM",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Cancelled(_) => "E_CANCELLED",
            Self::NotConfigured(_) => "E_NOT_CONFIGURED",
        }
    }

    /// 出错阶段，供日志与前端提示定位。
    pub(crate) fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::InvalidFormat(_) => "load",
            Self::Conversion(_) => "convert",
            Self::FileSystem(_) => "load",
            Self::ResourceLimit(_) => "decode",
            Self::Cancelled(_) => "state",
            Self::NotConfigured(_) => "state",
        }
    }
}
