//! # 适配裁剪流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 位图 → 规范形态”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//! 几何计算（分类、中间尺寸、裁剪偏移）抽成纯函数 `plan_fit`，便于精确测试。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸，按像素上限快速拒绝
//! 2. 完整解码
//! 3. 按目标尺寸分类宽高比：相等 / 偏宽 / 偏高
//! 4. 等比缩放到约束轴恰好等于目标（“cover” 适配）
//! 5. 中间结果编码为 JPEG Data URL；比例不等时重新解码并居中裁剪多余轴
//! 6. 最终 Data URL 即规范形态，尺寸恒为目标宽高

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgba};
use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};

use super::source::{AspectClass, NormalizedImage, RawImageData, TargetSize};
use super::{UploaderConfig, UploaderError, UploaderHandler};

/// 一次适配裁剪的几何方案。
///
/// 由 [`plan_fit`] 纯函数计算，缩放与裁剪严格按方案执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// 源图相对目标尺寸的宽高比分类。
    pub class: AspectClass,
    /// 缩放后的中间宽度（约束轴等于目标，自由轴不小于目标）。
    pub intermediate_width: u32,
    /// 缩放后的中间高度。
    pub intermediate_height: u32,
    /// 居中裁剪的水平偏移：`(intermediate_width - target.width) / 2`。
    pub crop_x: u32,
    /// 居中裁剪的垂直偏移：`(intermediate_height - target.height) / 2`。
    pub crop_y: u32,
}

/// 计算源图到目标尺寸的适配方案。
///
/// 分类规则（整数交叉相乘，无浮点相等判定）：
/// - `src_w * tgt_h == src_h * tgt_w` → [`AspectClass::Matches`]
/// - `src_w * tgt_h > src_h * tgt_w` → [`AspectClass::Wider`]
/// - 否则 → [`AspectClass::Taller`]
///
/// 源图任一维度为零视为解码错误，不向下游传播退化几何。
pub fn plan_fit(
    source_width: u32,
    source_height: u32,
    target: TargetSize,
) -> Result<FitPlan, UploaderError> {
    if source_width == 0 || source_height == 0 {
        return Err(UploaderError::Decode(format!(
            "源图尺寸退化：{}x{}",
            source_width, source_height
        )));
    }
    if target.width == 0 || target.height == 0 {
        return Err(UploaderError::InvalidFormat(format!(
            "目标尺寸必须为正：{}x{}",
            target.width, target.height
        )));
    }

    let lhs = source_width as u64 * target.height as u64;
    let rhs = source_height as u64 * target.width as u64;

    let class = if lhs == rhs {
        AspectClass::Matches
    } else if lhs > rhs {
        AspectClass::Wider
    } else {
        AspectClass::Taller
    };

    let (intermediate_width, intermediate_height) = match class {
        AspectClass::Wider => {
            // 高度为约束轴：缩放后高度恰为目标，宽度按比例放大且不小于目标。
            let scale = target.height as f64 / source_height as f64;
            let width = ((scale * source_width as f64).round() as u32).max(target.width);
            (width, target.height)
        }
        _ => {
            // 宽度为约束轴：Matches 时两轴同时命中目标。
            let scale = target.width as f64 / source_width as f64;
            let height = ((scale * source_height as f64).round() as u32).max(target.height);
            (target.width, height)
        }
    };

    Ok(FitPlan {
        class,
        intermediate_width,
        intermediate_height,
        crop_x: (intermediate_width - target.width) / 2,
        crop_y: (intermediate_height - target.height) / 2,
    })
}

impl UploaderHandler {
    /// 将原始字节解码为位图，并执行资源上限校验。
    pub(crate) fn decode_source(
        &self,
        raw: RawImageData,
        config: &UploaderConfig,
    ) -> Result<DynamicImage, UploaderError> {
        let _format = image::guess_format(&raw.bytes)
            .map_err(|e| UploaderError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        self.validate_pixel_limits(config, header_width, header_height)?;
        self.validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| UploaderError::Decode(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        self.validate_pixel_limits(config, width, height)?;
        self.validate_decoded_memory_limits(config, width, height)?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(decoded)
    }

    /// 执行适配裁剪，输出规范形态。
    ///
    /// 链路固定为：计算方案 → 等比缩放 → 编码中间 JPEG →
    /// （比例不等时）重新解码、居中裁剪、再编码。
    pub(crate) fn fit_and_crop(
        &self,
        decoded: &DynamicImage,
        target: TargetSize,
        config: &UploaderConfig,
    ) -> Result<NormalizedImage, UploaderError> {
        let (source_width, source_height) = decoded.dimensions();
        let plan = plan_fit(source_width, source_height, target)?;

        log::info!(
            "🧩 适配方案：{}x{} -> 中间 {}x{}（class={:?} crop=({}, {})）",
            source_width,
            source_height,
            plan.intermediate_width,
            plan.intermediate_height,
            plan.class,
            plan.crop_x,
            plan.crop_y
        );

        let scaled = self.scale_to_plan(decoded, &plan, config)?;
        let compressed = Self::encode_jpeg_data_url(&scaled, config.jpeg_quality)?;

        if plan.class == AspectClass::Matches {
            return Ok(NormalizedImage {
                data_url: compressed,
                width: target.width,
                height: target.height,
            });
        }

        // 裁剪作用于压缩后的中间图，而非缩放位图本身，
        // 保证规范形态经历同一条编码路径。
        let intermediate_bytes = Self::parse_data_url(&compressed)?;
        let intermediate = image::load_from_memory(&intermediate_bytes)
            .map_err(|e| UploaderError::Decode(format!("中间图片解码失败：{}", e)))?;

        let cropped = intermediate.crop_imm(plan.crop_x, plan.crop_y, target.width, target.height);
        let data_url = Self::encode_jpeg_data_url(&cropped, config.jpeg_quality)?;

        Ok(NormalizedImage {
            data_url,
            width: target.width,
            height: target.height,
        })
    }

    /// 按方案执行等比缩放。
    fn scale_to_plan(
        &self,
        image: &DynamicImage,
        plan: &FitPlan,
        config: &UploaderConfig,
    ) -> Result<DynamicImage, UploaderError> {
        let (width, height) = image.dimensions();
        if width == plan.intermediate_width && height == plan.intermediate_height {
            return Ok(image.clone());
        }

        match Self::resize_with_fast_image_resize(
            image,
            plan.intermediate_width,
            plan.intermediate_height,
            config.resize_filter,
        ) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 缩放失败，回退 image::resize_exact：{}",
                    err
                );
                Ok(image.resize_exact(
                    plan.intermediate_width,
                    plan.intermediate_height,
                    config.resize_filter,
                ))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: image::imageops::FilterType,
    ) -> Result<DynamicImage, UploaderError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| UploaderError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(
            Self::to_fast_filter(filter),
        ));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| UploaderError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| UploaderError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_filter(filter: image::imageops::FilterType) -> fr::FilterType {
        match filter {
            image::imageops::FilterType::Nearest => fr::FilterType::Box,
            image::imageops::FilterType::Triangle => fr::FilterType::Bilinear,
            image::imageops::FilterType::CatmullRom => fr::FilterType::CatmullRom,
            image::imageops::FilterType::Gaussian => fr::FilterType::Mitchell,
            image::imageops::FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }

    /// 将位图编码为 JPEG Data URL。
    ///
    /// JPEG 不携带透明通道，统一先转 RGB。
    pub(crate) fn encode_jpeg_data_url(
        image: &DynamicImage,
        quality: u8,
    ) -> Result<String, UploaderError> {
        let rgb = image.to_rgb8();
        let mut cursor = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);

        rgb.write_with_encoder(encoder)
            .map_err(|e| UploaderError::Decode(format!("JPEG 编码失败：{}", e)))?;

        Ok(format!(
            "data:image/jpeg;base64,{}",
            general_purpose::STANDARD.encode(cursor.get_ref())
        ))
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), UploaderError> {
        let cursor = Cursor::new(bytes);
        let reader = ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| UploaderError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| UploaderError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        &self,
        config: &UploaderConfig,
        width: u32,
        height: u32,
    ) -> Result<(), UploaderError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| UploaderError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(UploaderError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        &self,
        config: &UploaderConfig,
        width: u32,
        height: u32,
    ) -> Result<(), UploaderError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| UploaderError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(UploaderError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::test_support::{decode_data_url, sample_image};

    fn target(width: u32, height: u32) -> TargetSize {
        TargetSize { width, height }
    }

    #[test]
    fn square_target_classifies_landscape_as_wider() {
        let plan = plan_fit(1000, 500, target(500, 500)).expect("plan should succeed");
        assert_eq!(plan.class, AspectClass::Wider);
    }

    #[test]
    fn square_target_classifies_portrait_as_taller() {
        let plan = plan_fit(300, 600, target(400, 400)).expect("plan should succeed");
        assert_eq!(plan.class, AspectClass::Taller);
    }

    #[test]
    fn equal_ratio_classifies_as_matches() {
        let plan = plan_fit(800, 800, target(500, 500)).expect("plan should succeed");
        assert_eq!(plan.class, AspectClass::Matches);
        assert_eq!(plan.intermediate_width, 500);
        assert_eq!(plan.intermediate_height, 500);
        assert_eq!((plan.crop_x, plan.crop_y), (0, 0));
    }

    #[test]
    fn wider_scenario_1000x500_to_500x500() {
        let plan = plan_fit(1000, 500, target(500, 500)).expect("plan should succeed");

        assert_eq!(plan.intermediate_width, 1000);
        assert_eq!(plan.intermediate_height, 500);
        assert_eq!(plan.crop_x, 250);
        assert_eq!(plan.crop_y, 0);
    }

    #[test]
    fn taller_scenario_300x600_to_400x400() {
        let plan = plan_fit(300, 600, target(400, 400)).expect("plan should succeed");

        assert_eq!(plan.intermediate_width, 400);
        assert_eq!(plan.intermediate_height, 800);
        assert_eq!(plan.crop_x, 0);
        assert_eq!(plan.crop_y, 200);
    }

    #[test]
    fn degenerate_source_is_a_decode_error() {
        let result = plan_fit(0, 500, target(500, 500));
        assert!(matches!(result, Err(UploaderError::Decode(_))));

        let result = plan_fit(500, 0, target(500, 500));
        assert!(matches!(result, Err(UploaderError::Decode(_))));
    }

    #[test]
    fn fit_and_crop_outputs_exact_target_dimensions_for_all_classes() {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let config = handler.config_snapshot().expect("config snapshot failed");

        let cases = [
            (1000, 500, 500, 500), // Wider
            (300, 600, 400, 400),  // Taller
            (800, 800, 500, 500),  // Matches
        ];

        for (src_w, src_h, tgt_w, tgt_h) in cases {
            let decoded = sample_image(src_w, src_h);
            let normalized = handler
                .fit_and_crop(&decoded, target(tgt_w, tgt_h), &config)
                .expect("fit_and_crop should succeed");

            assert_eq!(normalized.width, tgt_w);
            assert_eq!(normalized.height, tgt_h);

            let reloaded = decode_data_url(&normalized.data_url);
            assert_eq!(reloaded.dimensions(), (tgt_w, tgt_h));
            assert!(normalized.data_url.starts_with("data:image/jpeg;base64,"));
        }
    }

    #[test]
    fn matches_case_skips_crop_step() {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let config = handler.config_snapshot().expect("config snapshot failed");

        let decoded = sample_image(1000, 1000);
        let plan = plan_fit(1000, 1000, target(500, 500)).expect("plan should succeed");
        assert_eq!(plan.class, AspectClass::Matches);

        // Matches 时规范形态就是缩放后的压缩结果本身。
        let scaled = handler
            .scale_to_plan(&decoded, &plan, &config)
            .expect("scale should succeed");
        let compressed =
            UploaderHandler::encode_jpeg_data_url(&scaled, config.jpeg_quality)
                .expect("encode should succeed");
        let normalized = handler
            .fit_and_crop(&decoded, target(500, 500), &config)
            .expect("fit_and_crop should succeed");

        assert_eq!(normalized.data_url, compressed);
    }

    #[test]
    fn decode_source_rejects_oversized_pixels() {
        let handler = UploaderHandler::new(UploaderConfig {
            max_decoded_pixels: 1_000_000,
            ..UploaderConfig::default()
        });
        let config = handler.config_snapshot().expect("config snapshot failed");

        let png = crate::uploader::test_support::encode_png_bytes(2000, 2000);
        let result = handler.decode_source(
            RawImageData {
                bytes: png,
                source_hint: "test",
            },
            &config,
        );

        assert!(matches!(result, Err(UploaderError::ResourceLimit(_))));
    }
}
