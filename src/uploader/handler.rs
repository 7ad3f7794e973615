//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `UploaderHandler` 只负责流程编排与配置管理，不直接与 Tauri 绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码为位图并校验资源上限
//! 4. 适配裁剪，产出规范形态
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<UploaderConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/fit/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::source::{ImageSource, NormalizedImage, TargetSize};
use super::{QualityProfile, UploaderConfig, UploaderError};

/// 图片归一化处理器。
///
/// 封装了配置状态，并编排加载、解码、适配裁剪各子模块。
pub struct UploaderHandler {
    pub(super) config: Arc<RwLock<UploaderConfig>>,
}

impl UploaderHandler {
    /// 根据初始配置创建处理器。
    pub fn new(config: UploaderConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<UploaderConfig, UploaderError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| UploaderError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置质量档位。
    pub fn set_quality_profile(&self, profile: QualityProfile) -> Result<(), UploaderError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| UploaderError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_quality_profile(profile);

        log::info!(
            "⚙️ 已切换图片质量档位：{:?}（jpeg_quality={}, filter={:?}）",
            profile,
            config.jpeg_quality,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_quality_profile(&self) -> Result<QualityProfile, UploaderError> {
        let config = self
            .config
            .read()
            .map_err(|_| UploaderError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_quality_profile())
    }

    /// 处理主入口：从任意来源加载并归一化到目标尺寸。
    ///
    /// 输出规范形态（JPEG Data URL 加最终尺寸），
    /// 输出模式派生由调用方在状态写入之后单独执行。
    pub fn normalize(
        &self,
        source: ImageSource,
        target: TargetSize,
    ) -> Result<NormalizedImage, UploaderError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = match source {
            ImageSource::FilePath(path) => self.load_from_file(&path, &config)?,
            ImageSource::DataUrl(data) => self.load_from_data_url(&data, &config)?,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = self.decode_source(raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        let fit_start = Instant::now();
        let normalized = self.fit_and_crop(&decoded, target, &config)?;
        let fit_elapsed = fit_start.elapsed();

        let total_elapsed = total_start.elapsed();
        log::info!(
            "✅ 图片归一化完成 - load={}ms decode={}ms fit={}ms total={}ms 输出={}x{}",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            fit_elapsed.as_millis(),
            total_elapsed.as_millis(),
            normalized.width,
            normalized.height
        );

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::test_support::{encode_png_bytes, to_data_url};
    use std::time::Instant;

    #[test]
    fn normalize_from_data_url_end_to_end() {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let data_url = to_data_url(&encode_png_bytes(1000, 500));

        let normalized = handler
            .normalize(
                ImageSource::DataUrl(data_url),
                TargetSize { width: 500, height: 500 },
            )
            .expect("normalize should succeed");

        assert_eq!(normalized.width, 500);
        assert_eq!(normalized.height, 500);
        assert!(normalized.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn normalize_missing_file_is_a_filesystem_error() {
        let handler = UploaderHandler::new(UploaderConfig::default());

        let result = handler.normalize(
            ImageSource::FilePath("/nonexistent/banner.png".to_string()),
            TargetSize { width: 500, height: 500 },
        );

        assert!(matches!(result, Err(UploaderError::FileSystem(_))));
    }

    #[test]
    fn normalize_rejects_non_image_payload() {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let data_url = to_data_url(b"definitely not an image");

        let result = handler.normalize(
            ImageSource::DataUrl(data_url),
            TargetSize { width: 500, height: 500 },
        );

        assert!(matches!(result, Err(UploaderError::InvalidFormat(_))));
    }

    #[test]
    fn perf_normalize_multiple_sizes() {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let cases = [(1024, 1024), (2048, 1024), (1080, 1920)];

        for (width, height) in cases {
            let data_url = to_data_url(&encode_png_bytes(width, height));
            let start = Instant::now();

            let normalized = handler
                .normalize(
                    ImageSource::DataUrl(data_url),
                    TargetSize { width: 500, height: 500 },
                )
                .expect("normalize should succeed");

            let elapsed = start.elapsed();
            println!(
                "[perf] normalize {}x{} -> {}x{} elapsed={}ms",
                width,
                height,
                normalized.width,
                normalized.height,
                elapsed.as_millis()
            );

            assert_eq!((normalized.width, normalized.height), (500, 500));
        }
    }
}
