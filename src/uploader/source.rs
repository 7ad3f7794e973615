//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `AspectClass` 表示源图与目标尺寸的宽高比关系
//! - `NormalizedImage` 表示归一化后的规范形态（JPEG Data URL）
//! - `NormalizedOutput` 表示按调用方要求转换后的最终产物

use serde::{Deserialize, Serialize};

/// 图片输入来源。
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ImageSource {
    /// 本地文件路径来源（来自原生文件选择对话框）。
    FilePath(String),
    /// Data URL（支持 Data URL 与纯 Base64 字符串）。
    DataUrl(String),
}

/// 目标尺寸（像素）。
///
/// 宽高都必须为正数，`configure` 阶段校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// 源图与目标尺寸的宽高比关系。
///
/// 对任意非退化的源/目标组合，三者有且仅有一个成立。
/// 分类采用整数交叉相乘（`src_w * tgt_h` 与 `src_h * tgt_w`），
/// 避免浮点比值的相等判定误差。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// 比值相等：只缩放，不裁剪。
    Matches,
    /// 源图更宽：按高度缩放后水平居中裁剪。
    Wider,
    /// 源图更高：按宽度缩放后垂直居中裁剪。
    Taller,
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 归一化结果的规范形态。
///
/// 所有输出模式均由此派生（见 `output.rs`）。
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedImage {
    /// JPEG Data URL。
    pub data_url: String,
    /// 最终宽度，恒等于目标宽度。
    pub width: u32,
    /// 最终高度，恒等于目标高度。
    pub height: u32,
}

/// 按调用方要求转换后的最终产物。
///
/// 每次完成事件（选择并处理成功 / 移除）恰好产生其中一种。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum NormalizedOutput {
    /// 内联 Data URL 字符串（规范形态原样透传）。
    InlineString(String),
    /// 二进制字节。
    Blob(Vec<u8>),
    /// 带派生文件名的字节（`{name}.jpeg`）。
    NamedFile { name: String, bytes: Vec<u8> },
    /// 空产物：移除或用户取消选择时的“无图片”语义。
    Empty,
}

impl NormalizedOutput {
    /// 是否为“无图片”语义。
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
