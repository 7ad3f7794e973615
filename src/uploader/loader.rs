//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / Data URL）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - Data URL：格式解析 + 解码前体积估算 + 解码。
//! - 两条路径统一以文件签名探测收尾，拒绝非图片内容。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::source::RawImageData;
use super::{UploaderConfig, UploaderError, UploaderHandler};

impl UploaderHandler {
    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        &self,
        path: &str,
        config: &UploaderConfig,
    ) -> Result<RawImageData, UploaderError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path);

        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(UploaderError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| UploaderError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size {
            return Err(UploaderError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(file_path)
            .map_err(|e| UploaderError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 从 Data URL 字符串加载图片原始字节。
    pub(super) fn load_from_data_url(
        &self,
        data: &str,
        config: &UploaderConfig,
    ) -> Result<RawImageData, UploaderError> {
        log::info!("📝 开始处理 Data URL 图片");

        let bytes = Self::parse_data_url_with_limit(data, config.max_file_size)?;

        if bytes.len() as u64 > config.max_file_size {
            return Err(UploaderError::ResourceLimit(format!(
                "Data URL 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "data_url",
        })
    }

    /// 解析 Data URL（或纯 Base64 字符串）为字节。
    pub(crate) fn parse_data_url(data: &str) -> Result<Vec<u8>, UploaderError> {
        Self::parse_data_url_with_limit(data, u64::MAX)
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, UploaderError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| UploaderError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| UploaderError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    fn parse_data_url_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, UploaderError> {
        let normalized = data.trim();

        if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| UploaderError::InvalidFormat("缺少 base64 标记".to_string()))?;
            let base64_data = &normalized[base64_start + 8..];
            let estimated_len = Self::estimate_base64_decoded_upper_bound_len(base64_data)?;

            if estimated_len > max_file_size {
                return Err(UploaderError::ResourceLimit(format!(
                    "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                    estimated_len as f64 / 1024.0 / 1024.0,
                    max_file_size as f64 / 1024.0 / 1024.0
                )));
            }

            return general_purpose::STANDARD
                .decode(base64_data)
                .map_err(|e| UploaderError::Decode(format!("Base64 解码失败：{}", e)));
        }

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(normalized)?;
        if estimated_len > max_file_size {
            return Err(UploaderError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(normalized)
            .map_err(|e| UploaderError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 校验字节签名确为图片类型。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), UploaderError> {
        if bytes.is_empty() {
            return Err(UploaderError::InvalidFormat("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| UploaderError::InvalidFormat("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(UploaderError::InvalidFormat(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}
