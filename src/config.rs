// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 运行参数: 命令行 + JSON配置文件

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// 默认推理服务地址
pub const DEFAULT_API_URL: &str = "https://classify.roboflow.com";

/// 默认模型
pub const DEFAULT_MODEL_ID: &str = "classification-waste/11";

/// 批量推理标注参数
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "批量图片分类标注 + 视频合成", long_about = None)]
pub struct Args {
    /// JSON配置文件 (命令行参数优先)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 推理服务地址
    #[arg(long)]
    pub api_url: Option<String>,

    /// API密钥
    #[arg(long, env = "ROBOFLOW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 输入图片目录
    #[arg(short, long)]
    pub input_dir: Option<PathBuf>,

    /// 输出目录
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 模型标识
    #[arg(short, long)]
    pub model_id: Option<String>,

    /// 标注字体 (.ttf/.ttc)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 请求超时(秒)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// 任意一张图片失败即终止
    #[arg(long)]
    pub fail_fast: bool,

    /// 不生成视频
    #[arg(long)]
    pub no_video: bool,

    /// 把合并后的配置写入JSON文件, 然后照常运行
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

/// 流水线配置
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub api_url: String,
    pub api_key: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub model_id: String,
    pub font_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub fail_fast: bool,
    pub video: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            input_dir: PathBuf::from("input_images"),
            output_dir: PathBuf::from("output_images"),
            model_id: DEFAULT_MODEL_ID.to_string(),
            font_path: None,
            timeout_secs: 30,
            fail_fast: false,
            video: true,
        }
    }
}

impl PipelineConfig {
    /// 从JSON文件加载配置
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
        tracing::info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        tracing::info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 配置文件 (可选) + 命令行覆盖
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(v) = &args.api_url {
            self.api_url = v.clone();
        }
        if let Some(v) = &args.api_key {
            self.api_key = v.clone();
        }
        if let Some(v) = &args.input_dir {
            self.input_dir = v.clone();
        }
        if let Some(v) = &args.output_dir {
            self.output_dir = v.clone();
        }
        if let Some(v) = &args.model_id {
            self.model_id = v.clone();
        }
        if let Some(v) = &args.font {
            self.font_path = Some(v.clone());
        }
        if let Some(v) = args.timeout_secs {
            self.timeout_secs = v;
        }
        self.fail_fast |= args.fail_fast;
        if args.no_video {
            self.video = false;
        }
    }

    /// 启动时校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(url.to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::MissingModelId);
        }
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InputDirNotFound(self.input_dir.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 打印当前配置 (不输出密钥)
    pub fn print_summary(&self) {
        tracing::info!("🌐 推理服务: {}", self.api_url);
        tracing::info!("📦 模型: {}", self.model_id);
        tracing::info!("📂 输入目录: {}", self.input_dir.display());
        tracing::info!("📁 输出目录: {}", self.output_dir.display());
    }
}
