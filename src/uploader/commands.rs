//! # Tauri 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做 IPC 参数接收与结果返回，不承载业务逻辑。
//! 所有实际处理交由 `UploaderServiceState`，保持命令函数薄、稳定、易测试。

use tauri::State;

use super::source::ImageSource;
use super::state::VisualState;
use super::{service, UploaderError};

#[derive(Debug, Clone, serde::Serialize)]
pub struct UploaderCommandError {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<UploaderError> for UploaderCommandError {
    fn from(error: UploaderError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

/// 注册（或重建）一个上传组件，返回初始视觉状态。
#[tauri::command]
pub fn uploader_configure(
    state: State<'_, service::UploaderServiceState>,
    spec: service::UploaderSpec,
) -> Result<VisualState, UploaderCommandError> {
    state.configure(spec).map_err(UploaderCommandError::from)
}

/// 文件已选择事件：归一化并返回视觉状态与最终产物。
///
/// `source` 缺省表示用户取消了选择，语义等同移除。
#[tauri::command]
pub async fn uploader_file_selected(
    state: State<'_, service::UploaderServiceState>,
    name: String,
    source: Option<ImageSource>,
) -> Result<service::SelectionOutcome, UploaderCommandError> {
    state
        .file_selected(&name, source)
        .map_err(UploaderCommandError::from)
}

/// 激活控件表面：无图片时指示打开文件选择，有图片时执行移除。
#[tauri::command]
pub fn uploader_activate_control(
    state: State<'_, service::UploaderServiceState>,
    name: String,
) -> Result<service::ControlAction, UploaderCommandError> {
    state.activate(&name).map_err(UploaderCommandError::from)
}

/// 移除当前图片，重置为占位图。
#[tauri::command]
pub fn uploader_remove(
    state: State<'_, service::UploaderServiceState>,
    name: String,
) -> Result<service::SelectionOutcome, UploaderCommandError> {
    state.remove(&name).map_err(UploaderCommandError::from)
}

/// 查询视觉状态快照。
#[tauri::command]
pub fn uploader_get_visual_state(
    state: State<'_, service::UploaderServiceState>,
    name: String,
) -> Result<VisualState, crate::error::AppError> {
    Ok(state.visual_state(&name)?)
}

/// 切换图片质量档位。
#[tauri::command]
pub fn uploader_set_quality_profile(
    state: State<'_, service::UploaderServiceState>,
    profile: String,
) -> Result<(), crate::error::AppError> {
    state.set_quality_profile(&profile)?;
    Ok(())
}

/// 查询后端当前生效质量档位。
#[tauri::command]
pub fn uploader_get_quality_profile(
    state: State<'_, service::UploaderServiceState>,
) -> Result<String, crate::error::AppError> {
    Ok(state.get_quality_profile()?)
}
