//! 上传控件服务的端到端测试。
//!
//! 走完整调用链：configure → file_selected → 取回产物，
//! 并验证移除/取消/未配置等边界语义。

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat, RgbaImage};
use nft_market::uploader::{
    ControlAction, ImageSource, NormalizedOutput, OutputMode, TargetSize, UploaderError,
    UploaderServiceState, UploaderSpec,
};

fn png_data_url(width: u32, height: u32) -> String {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 120, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png should succeed");
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(&bytes)
    )
}

fn decode_jpeg_data_url(data_url: &str) -> DynamicImage {
    let payload = data_url
        .strip_prefix("data:image/jpeg;base64,")
        .expect("output should be a jpeg data url");
    let bytes = general_purpose::STANDARD
        .decode(payload)
        .expect("payload should be valid base64");
    image::load_from_memory(&bytes).expect("output should decode")
}

fn spec(name: &str, width: u32, height: u32, mode: OutputMode) -> UploaderSpec {
    UploaderSpec {
        name: name.to_string(),
        placeholder_url: "https://via.placeholder.com/500".to_string(),
        size: TargetSize { width, height },
        output_mode: mode,
        initial_value: None,
    }
}

#[test]
fn selection_normalizes_to_target_and_updates_visual_state() {
    let service = UploaderServiceState::new();
    service
        .configure(spec("Banner Image", 500, 500, OutputMode::InlineString))
        .expect("configure should succeed");

    let outcome = service
        .file_selected(
            "Banner Image",
            Some(ImageSource::DataUrl(png_data_url(1000, 500))),
        )
        .expect("selection should succeed");

    assert!(outcome.visual.is_image_present);
    assert_eq!(outcome.visual.label_text, "Remove Banner Image");

    let NormalizedOutput::InlineString(data_url) = outcome.output else {
        panic!("expected inline string output");
    };
    let decoded = decode_jpeg_data_url(&data_url);
    assert_eq!(decoded.width(), 500);
    assert_eq!(decoded.height(), 500);
    assert_eq!(outcome.visual.current_image_url, data_url);
}

#[test]
fn named_file_output_derives_filename_from_control_name() {
    let service = UploaderServiceState::new();
    service
        .configure(spec("Profile Image", 400, 400, OutputMode::NamedFile))
        .expect("configure should succeed");

    let outcome = service
        .file_selected(
            "Profile Image",
            Some(ImageSource::DataUrl(png_data_url(300, 600))),
        )
        .expect("selection should succeed");

    let NormalizedOutput::NamedFile { name, bytes } = outcome.output else {
        panic!("expected named file output");
    };
    assert_eq!(name, "Profile Image.jpeg");

    let decoded = image::load_from_memory(&bytes).expect("named file bytes should decode");
    assert_eq!(decoded.width(), 400);
    assert_eq!(decoded.height(), 400);
}

#[test]
fn blob_output_decodes_to_target_dimensions() {
    let service = UploaderServiceState::new();
    service
        .configure(spec("Logo Image", 500, 500, OutputMode::Blob))
        .expect("configure should succeed");

    let outcome = service
        .file_selected(
            "Logo Image",
            Some(ImageSource::DataUrl(png_data_url(800, 800))),
        )
        .expect("selection should succeed");

    let NormalizedOutput::Blob(bytes) = outcome.output else {
        panic!("expected blob output");
    };
    let decoded = image::load_from_memory(&bytes).expect("blob bytes should decode");
    assert_eq!(decoded.width(), 500);
    assert_eq!(decoded.height(), 500);
}

/// 用户取消选择与主动移除产生同样的结果，且不是错误。
#[test]
fn cancelled_pick_behaves_like_remove() {
    let service = UploaderServiceState::new();
    let placeholder = "https://via.placeholder.com/500";
    service
        .configure(spec("Banner Image", 500, 500, OutputMode::InlineString))
        .expect("configure should succeed");
    service
        .file_selected(
            "Banner Image",
            Some(ImageSource::DataUrl(png_data_url(600, 600))),
        )
        .expect("selection should succeed");

    let outcome = service
        .file_selected("Banner Image", None)
        .expect("cancelled pick should not be an error");

    assert!(outcome.output.is_empty());
    assert!(!outcome.visual.is_image_present);
    assert_eq!(outcome.visual.current_image_url, placeholder);
    assert_eq!(outcome.visual.label_text, "Upload Banner Image");
}

/// 有图片时点击控件执行移除，无图片时指示打开选择对话框。
#[test]
fn activation_toggles_between_picker_and_remove() {
    let service = UploaderServiceState::new();
    service
        .configure(spec("Logo Image", 500, 500, OutputMode::InlineString))
        .expect("configure should succeed");

    assert!(matches!(
        service.activate("Logo Image").expect("activate should succeed"),
        ControlAction::OpenPicker
    ));

    service
        .file_selected(
            "Logo Image",
            Some(ImageSource::DataUrl(png_data_url(500, 500))),
        )
        .expect("selection should succeed");

    let ControlAction::Removed(outcome) =
        service.activate("Logo Image").expect("activate should succeed")
    else {
        panic!("expected removal when image present");
    };
    assert!(!outcome.visual.is_image_present);

    assert!(matches!(
        service.activate("Logo Image").expect("activate should succeed"),
        ControlAction::OpenPicker
    ));
}

/// 解码失败不触碰视觉状态：上一张图片保持展示。
#[test]
fn decode_failure_preserves_previous_visual_state() {
    let service = UploaderServiceState::new();
    service
        .configure(spec("Banner Image", 500, 500, OutputMode::InlineString))
        .expect("configure should succeed");
    let first = service
        .file_selected(
            "Banner Image",
            Some(ImageSource::DataUrl(png_data_url(500, 500))),
        )
        .expect("first selection should succeed");

    let result = service.file_selected(
        "Banner Image",
        Some(ImageSource::DataUrl(
            "data:image/png;base64,bm90LWFuLWltYWdl".to_string(),
        )),
    );
    assert!(result.is_err());

    let visual = service
        .visual_state("Banner Image")
        .expect("visual state should be readable");
    assert!(visual.is_image_present);
    assert_eq!(visual.current_image_url, first.visual.current_image_url);
}

#[test]
fn unknown_control_reports_not_configured() {
    let service = UploaderServiceState::new();

    let result = service.file_selected("Ghost", Some(ImageSource::DataUrl(png_data_url(10, 10))));
    assert!(matches!(result, Err(UploaderError::NotConfigured(_))));

    let result = service.visual_state("Ghost");
    assert!(matches!(result, Err(UploaderError::NotConfigured(_))));
}

/// 加载本地文件路径来源的完整链路。
#[test]
fn file_path_source_loads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("banner.png");
    let image = RgbaImage::from_pixel(1200, 300, image::Rgba([10, 20, 30, 255]));
    DynamicImage::ImageRgba8(image)
        .save_with_format(&path, ImageFormat::Png)
        .expect("write png should succeed");

    let service = UploaderServiceState::new();
    service
        .configure(spec("Banner Image", 600, 200, OutputMode::InlineString))
        .expect("configure should succeed");

    let outcome = service
        .file_selected(
            "Banner Image",
            Some(ImageSource::FilePath(path.to_string_lossy().to_string())),
        )
        .expect("selection should succeed");

    let NormalizedOutput::InlineString(data_url) = outcome.output else {
        panic!("expected inline string output");
    };
    let decoded = decode_jpeg_data_url(&data_url);
    assert_eq!(decoded.width(), 600);
    assert_eq!(decoded.height(), 200);
}
