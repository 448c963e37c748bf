// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 错误类型
// Error kinds the pipeline branches on

use std::path::PathBuf;
use thiserror::Error;

/// 配置校验错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api_url 为空")]
    MissingApiUrl,

    #[error("api_url 必须以 http:// 或 https:// 开头: {0}")]
    InvalidApiUrl(String),

    #[error("api_key 为空 (使用 --api-key 或环境变量 ROBOFLOW_API_KEY)")]
    MissingApiKey,

    #[error("model_id 为空")]
    MissingModelId,

    #[error("输入目录不存在: {0}")]
    InputDirNotFound(PathBuf),

    #[error("timeout_secs 必须大于0")]
    InvalidTimeout,
}

/// 推理响应格式错误 (非致命: 图片照常保存, 只是不做标注)
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("响应不是合法JSON: {0}")]
    InvalidJson(String),

    #[error("响应缺少 predictions 字段: {0}")]
    MissingPredictions(String),

    #[error("无法识别的 predictions 格式: {0}")]
    Malformed(String),
}

/// 单张图片处理失败
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("图片解码失败 {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("推理请求失败 {path}: {source}")]
    Inference {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("图片保存失败 {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ProcessError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ProcessError::Decode { path, .. }
            | ProcessError::Inference { path, .. }
            | ProcessError::Encode { path, .. } => path,
        }
    }
}
