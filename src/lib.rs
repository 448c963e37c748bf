// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod annotate; // 边框 + 标签徽章绘制
pub mod config; // 命令行与JSON配置
pub mod discovery; // 输入图片发现
pub mod error; // 错误类型
pub mod inference; // 远程分类推理
pub mod pipeline; // 批处理流水线
pub mod types; // 预测结果数据结构
pub mod video; // 视频合成

pub use crate::annotate::{badge_text, Annotator, BadgeStyle};
pub use crate::config::{Args, PipelineConfig};
pub use crate::error::{ConfigError, ProcessError, ResponseError};
pub use crate::inference::{normalize_response, HttpClient, InferenceClient};
pub use crate::pipeline::{BatchSummary, ErrorPolicy, ImageRecord, Processor};
pub use crate::types::{Prediction, PredictionSet};
pub use crate::video::{frame_rate, FrameRate, VideoEncoder, VideoSummary};
