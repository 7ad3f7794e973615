//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `UploaderServiceState` 作为 Tauri 注入状态，替代全局单例函数。
//! 好处：
//! 1. 生命周期清晰（由 `main.rs` 统一管理）
//! 2. 测试可创建独立实例，减少共享状态副作用
//! 3. 同一窗口可并存多个上传组件（横幅 / 徽标 / 头像各自独立）
//!
//! ## 实现思路
//!
//! 注册表以组件名称为键。每次“文件已选择”先登记代数快照，
//! 归一化在锁外执行，完成后校验代数仍然有效才写入视觉状态；
//! 期间发生移除或重新配置的，在途结果作废并返回 `Cancelled`。
//!
//! 策略说明（两条边界语义）：
//! - 解码失败不触碰视觉状态，上一张图片保持展示。
//! - 转换失败发生在裁剪成功之后，视觉状态保留新图片，仅产物缺失。

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::source::{ImageSource, NormalizedOutput, TargetSize};
use super::state::{Uploader, VisualState};
use super::{OutputMode, QualityProfile, UploaderConfig, UploaderError, UploaderHandler};

/// 上传组件配置请求（IPC 入参）。
#[derive(Debug, Clone, Deserialize)]
pub struct UploaderSpec {
    /// 组件名称，同时作为注册表键与文件名派生来源。
    pub name: String,
    /// 占位图地址。
    pub placeholder_url: String,
    /// 目标尺寸。
    pub size: TargetSize,
    /// 输出模式。
    pub output_mode: OutputMode,
    /// 初始图片（非空时以“已有图片”初始化）。
    #[serde(default)]
    pub initial_value: Option<String>,
}

/// 一次完成事件的结果：视觉状态加最终产物。
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    pub visual: VisualState,
    pub output: NormalizedOutput,
}

/// 激活控件的结果。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", content = "value")]
pub enum ControlAction {
    /// 当前无图片：前端应打开原生文件选择对话框。
    OpenPicker,
    /// 当前有图片：已执行移除。
    Removed(SelectionOutcome),
}

/// 图片上传服务状态。
///
/// 作为 Tauri `State` 注入到命令层，内部持有处理器与组件注册表。
pub struct UploaderServiceState {
    handler: UploaderHandler,
    uploaders: Mutex<HashMap<String, Uploader>>,
}

impl UploaderServiceState {
    /// 使用默认配置创建服务状态。
    pub fn new() -> Self {
        Self::with_config(UploaderConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    ///
    /// 主要用于测试或后续按场景注入不同策略。
    pub fn with_config(config: UploaderConfig) -> Self {
        Self {
            handler: UploaderHandler::new(config),
            uploaders: Mutex::new(HashMap::new()),
        }
    }

    fn with_uploaders<T>(
        &self,
        op: impl FnOnce(&mut HashMap<String, Uploader>) -> Result<T, UploaderError>,
    ) -> Result<T, UploaderError> {
        let mut guard = self
            .uploaders
            .lock()
            .map_err(|_| UploaderError::ResourceLimit("上传组件注册表锁已中毒".to_string()))?;
        op(&mut guard)
    }

    /// 注册（或重建）一个上传组件。
    ///
    /// 重复配置同名组件会整体替换旧句柄，其在途操作随之作废。
    pub fn configure(&self, spec: UploaderSpec) -> Result<VisualState, UploaderError> {
        let name = spec.name.clone();
        let uploader = Uploader::new(
            spec.name,
            spec.placeholder_url,
            spec.size,
            spec.output_mode,
            spec.initial_value,
        )?;
        let visual = uploader.visual_state();

        log::info!(
            "🧷 上传组件已配置 - name={} target={}x{} mode={}",
            name,
            spec.size.width,
            spec.size.height,
            spec.output_mode.as_str()
        );

        self.with_uploaders(|uploaders| {
            uploaders.insert(name, uploader);
            Ok(())
        })?;

        Ok(visual)
    }

    /// 事件：文件已选择（或选择被取消）。
    ///
    /// `source` 为 `None` 表示用户取消，语义等同移除，不视为错误。
    pub fn file_selected(
        &self,
        name: &str,
        source: Option<ImageSource>,
    ) -> Result<SelectionOutcome, UploaderError> {
        let Some(source) = source else {
            return self.remove(name);
        };

        let (generation, target, output_mode, uploader_name) =
            self.with_uploaders(|uploaders| {
                let uploader = Self::lookup(uploaders, name)?;
                let generation = uploader.begin();
                Ok((
                    generation,
                    uploader.size,
                    uploader.output_mode,
                    uploader.name.clone(),
                ))
            })?;

        // 归一化在注册表锁之外执行，期间允许其他组件继续工作。
        let normalized = self.handler.normalize(source, target)?;

        let visual = self.with_uploaders(|uploaders| {
            let uploader = Self::lookup(uploaders, name)?;
            if !uploader.is_current(generation) {
                return Err(UploaderError::Cancelled(
                    "归一化期间组件已被移除或重新触发，结果作废".to_string(),
                ));
            }
            Ok(uploader.apply_image(normalized.data_url.clone()))
        })?;

        // 视觉状态已更新；转换失败时保留新图片，仅向调用方报告产物缺失。
        let output = UploaderHandler::convert_output(&normalized, output_mode, &uploader_name)?;

        Ok(SelectionOutcome { visual, output })
    }

    /// 事件：移除当前图片。幂等。
    pub fn remove(&self, name: &str) -> Result<SelectionOutcome, UploaderError> {
        let visual = self.with_uploaders(|uploaders| {
            let uploader = Self::lookup(uploaders, name)?;
            Ok(uploader.apply_removed())
        })?;

        Ok(SelectionOutcome {
            visual,
            output: NormalizedOutput::Empty,
        })
    }

    /// 事件：激活控件表面（点击）。
    ///
    /// 无图片时指示前端打开文件选择对话框，有图片时执行移除。
    pub fn activate(&self, name: &str) -> Result<ControlAction, UploaderError> {
        let has_image = self.with_uploaders(|uploaders| {
            let uploader = Self::lookup(uploaders, name)?;
            Ok(uploader.is_image_present())
        })?;

        if has_image {
            Ok(ControlAction::Removed(self.remove(name)?))
        } else {
            Ok(ControlAction::OpenPicker)
        }
    }

    /// 查询视觉状态快照。
    pub fn visual_state(&self, name: &str) -> Result<VisualState, UploaderError> {
        self.with_uploaders(|uploaders| {
            let uploader = Self::lookup(uploaders, name)?;
            Ok(uploader.visual_state())
        })
    }

    /// 设置质量档位。
    pub fn set_quality_profile(&self, profile: &str) -> Result<(), UploaderError> {
        let profile = QualityProfile::from_str(profile)?;
        self.handler.set_quality_profile(profile)
    }

    /// 获取当前生效质量档位（字符串）。
    pub fn get_quality_profile(&self) -> Result<String, UploaderError> {
        let profile = self.handler.get_quality_profile()?;
        Ok(profile.as_str().to_string())
    }

    fn lookup<'a>(
        uploaders: &'a mut HashMap<String, Uploader>,
        name: &str,
    ) -> Result<&'a mut Uploader, UploaderError> {
        uploaders
            .get_mut(name)
            .ok_or_else(|| UploaderError::NotConfigured(name.to_string()))
    }
}

impl Default for UploaderServiceState {
    fn default() -> Self {
        Self::new()
    }
}
