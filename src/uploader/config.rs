//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `UploaderConfig`，保证运行时行为可观测、可调整、可测试。
//! 其中质量档位（quality / balanced / speed）作为高层语义，映射到底层参数组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `OutputMode` 负责输出模式字符串解析与反向输出。
//! - `apply_quality_profile` 将档位转换为具体编码参数。
//! - `infer_quality_profile` 用于从当前配置反推档位（给前端展示状态）。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::UploaderError;

/// 归一化流水线配置。
///
/// 字段覆盖了加载、解码、缩放与 JPEG 编码四个阶段。
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
    /// 缩放滤镜策略。
    pub resize_filter: FilterType,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            jpeg_quality: 85,
            resize_filter: FilterType::Triangle,
        }
    }
}

/// 归一化结果的输出模式（调用方语义）。
///
/// - `InlineString`：规范形态 Data URL 原样透传
/// - `Blob`：解出二进制字节
/// - `NamedFile`：字节加派生文件名 `{name}.jpeg`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    InlineString,
    Blob,
    NamedFile,
}

impl OutputMode {
    /// 从外部字符串解析输出模式。
    pub(crate) fn from_str(mode: &str) -> Result<Self, UploaderError> {
        match mode.trim().to_lowercase().as_str() {
            "inline_string" | "dataurl" => Ok(Self::InlineString),
            "blob" => Ok(Self::Blob),
            "named_file" | "file" => Ok(Self::NamedFile),
            other => Err(UploaderError::InvalidFormat(format!(
                "未知输出模式：{}（可选：inline_string / blob / named_file）",
                other
            ))),
        }
    }

    /// 将输出模式输出为稳定字符串，供前端展示与持久化。
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InlineString => "inline_string",
            Self::Blob => "blob",
            Self::NamedFile => "named_file",
        }
    }
}

/// 图片质量档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与体积平衡
/// - `Speed`：优先处理速度
#[derive(Debug, Clone, Copy)]
pub enum QualityProfile {
    Quality,
    Balanced,
    Speed,
}

impl QualityProfile {
    /// 从外部字符串解析档位。
    pub(crate) fn from_str(profile: &str) -> Result<Self, UploaderError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(UploaderError::InvalidFormat(format!(
                "未知质量档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    /// 将档位输出为稳定字符串。
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl UploaderConfig {
    /// 基于当前参数反推质量档位。
    ///
    /// 用于“后端当前生效档位”查询场景。
    pub(crate) fn infer_quality_profile(&self) -> QualityProfile {
        if self.jpeg_quality >= 95 {
            return QualityProfile::Quality;
        }
        if self.jpeg_quality <= 70 {
            return QualityProfile::Speed;
        }
        QualityProfile::Balanced
    }

    /// 应用指定质量档位到实际参数。
    ///
    /// 保持“档位语义稳定”，便于前端按档位切换而无需了解底层细节。
    pub(crate) fn apply_quality_profile(&mut self, profile: QualityProfile) {
        match profile {
            QualityProfile::Quality => {
                self.jpeg_quality = 95;
                self.resize_filter = FilterType::CatmullRom;
            }
            QualityProfile::Balanced => {
                self.jpeg_quality = 85;
                self.resize_filter = FilterType::Triangle;
            }
            QualityProfile::Speed => {
                self.jpeg_quality = 70;
                self.resize_filter = FilterType::Nearest;
            }
        }
    }
}
