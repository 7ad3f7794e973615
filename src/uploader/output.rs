//! # 输出转换模块
//!
//! 规范形态（JPEG Data URL）向调用方要求的输出模式派生。
//! “获取本地生成 Data URL 的字节”在本实现里就是一次 Base64 解码，
//! 失败归类为 `Conversion`，与解码失败严格区分。

use super::source::{NormalizedImage, NormalizedOutput};
use super::{OutputMode, UploaderError, UploaderHandler};

impl UploaderHandler {
    /// 将规范形态转换为指定输出模式。
    ///
    /// `NamedFile` 的文件名由上传组件名称派生：`{name}.jpeg`。
    pub(crate) fn convert_output(
        normalized: &NormalizedImage,
        mode: OutputMode,
        name: &str,
    ) -> Result<NormalizedOutput, UploaderError> {
        match mode {
            OutputMode::InlineString => Ok(NormalizedOutput::InlineString(
                normalized.data_url.clone(),
            )),
            OutputMode::Blob => {
                let bytes = Self::parse_data_url(&normalized.data_url)
                    .map_err(|e| UploaderError::Conversion(format!("Blob 转换失败：{}", e)))?;
                Ok(NormalizedOutput::Blob(bytes))
            }
            OutputMode::NamedFile => {
                let bytes = Self::parse_data_url(&normalized.data_url)
                    .map_err(|e| UploaderError::Conversion(format!("文件转换失败：{}", e)))?;
                Ok(NormalizedOutput::NamedFile {
                    name: format!("{}.jpeg", name),
                    bytes,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploader::UploaderConfig;
    use crate::uploader::test_support::sample_image;
    use crate::uploader::TargetSize;

    fn sample_normalized() -> NormalizedImage {
        let handler = UploaderHandler::new(UploaderConfig::default());
        let config = handler.config_snapshot().expect("config snapshot failed");
        let decoded = sample_image(600, 600);
        handler
            .fit_and_crop(&decoded, TargetSize { width: 300, height: 300 }, &config)
            .expect("fit_and_crop should succeed")
    }

    #[test]
    fn inline_string_passes_canonical_form_through() {
        let normalized = sample_normalized();
        let output =
            UploaderHandler::convert_output(&normalized, OutputMode::InlineString, "NFT Image")
                .expect("conversion should succeed");

        match output {
            NormalizedOutput::InlineString(data_url) => {
                assert_eq!(data_url, normalized.data_url);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn blob_bytes_match_refetched_inline_string() {
        let normalized = sample_normalized();
        let output = UploaderHandler::convert_output(&normalized, OutputMode::Blob, "NFT Image")
            .expect("conversion should succeed");

        let expected =
            UploaderHandler::parse_data_url(&normalized.data_url).expect("parse should succeed");

        match output {
            NormalizedOutput::Blob(bytes) => {
                assert!(!bytes.is_empty());
                assert_eq!(bytes, expected);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn named_file_derives_name_from_uploader_name() {
        let normalized = sample_normalized();
        let output =
            UploaderHandler::convert_output(&normalized, OutputMode::NamedFile, "Profile Image")
                .expect("conversion should succeed");

        match output {
            NormalizedOutput::NamedFile { name, bytes } => {
                assert_eq!(name, "Profile Image.jpeg");
                assert!(!bytes.is_empty());
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn malformed_canonical_form_is_a_conversion_error() {
        let normalized = NormalizedImage {
            data_url: "data:image/jpeg;base64,@@not-base64@@".to_string(),
            width: 1,
            height: 1,
        };

        let result = UploaderHandler::convert_output(&normalized, OutputMode::Blob, "NFT Image");
        assert!(matches!(result, Err(UploaderError::Conversion(_))));
    }
}
