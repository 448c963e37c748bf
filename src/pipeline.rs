// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 批处理流水线
//
// 每张图片顺序执行:
//   读取 → 推理 → 标注 → 保存 → 追加到帧缓冲
// 全部处理完成后由 create_video 一次性合成视频。

use anyhow::{Context, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::annotate::Annotator;
use crate::config::PipelineConfig;
use crate::discovery::{discover_images, IMAGE_EXTENSIONS};
use crate::error::ProcessError;
use crate::inference::{normalize_response, HttpClient, InferenceClient};
use crate::types::{Prediction, PredictionSet};
use crate::video::{self, VideoEncoder, VideoSummary, VIDEO_FILE_NAME};

/// 单张图片失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// 记录并跳过, 继续处理下一张
    #[default]
    Skip,
    /// 立即终止整个批次
    Abort,
}

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub processed: usize,
    pub annotated: usize,
    pub failed: Vec<PathBuf>,
}

/// 已解码的输入图片
pub struct ImageRecord {
    pub path: PathBuf,
    pub image: RgbImage,
}

impl ImageRecord {
    pub fn load(path: &Path) -> Result<Self, ProcessError> {
        let image = image::open(path)
            .map_err(|source| ProcessError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }
}

/// 图片推理处理器
pub struct Processor<C: InferenceClient> {
    client: C,
    annotator: Annotator,
    model_id: String,
    output_dir: PathBuf,
    input_images: Vec<PathBuf>,
    frames: Vec<RgbImage>,
    policy: ErrorPolicy,
}

impl Processor<HttpClient> {
    /// 从已校验的配置创建 (HTTP推理)
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let client = HttpClient::new(&config.api_url, &config.api_key, config.timeout());
        let annotator = Annotator::from_font_path(config.font_path.as_deref())?;
        let policy = if config.fail_fast {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Skip
        };
        Ok(Self::new(
            client,
            annotator,
            &config.input_dir,
            &config.output_dir,
            &config.model_id,
        )?
        .with_policy(policy))
    }
}

impl<C: InferenceClient> Processor<C> {
    /// 创建输出目录并扫描输入图片
    pub fn new(
        client: C,
        annotator: Annotator,
        input_dir: &Path,
        output_dir: &Path,
        model_id: &str,
    ) -> Result<Self> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("无法创建输出目录: {}", output_dir.display()))?;
        let input_images = discover_images(input_dir, &IMAGE_EXTENSIONS)?;
        tracing::info!("📂 发现 {} 张图片", input_images.len());

        Ok(Self {
            client,
            annotator,
            model_id: model_id.to_string(),
            output_dir: output_dir.to_path_buf(),
            input_images,
            frames: Vec::new(),
            policy: ErrorPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn input_images(&self) -> &[PathBuf] {
        &self.input_images
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn video_path(&self) -> PathBuf {
        self.output_dir.join(VIDEO_FILE_NAME)
    }

    /// 依次处理全部图片
    pub fn process_images(&mut self) -> Result<BatchSummary> {
        let mut summary = BatchSummary {
            discovered: self.input_images.len(),
            ..Default::default()
        };

        let paths = self.input_images.clone();
        for path in &paths {
            tracing::info!("🖼️ 处理图片: {}", path.display());
            match self.process_image(path) {
                Ok(top) => {
                    summary.processed += 1;
                    if top.is_some() {
                        summary.annotated += 1;
                    }
                }
                Err(e) => {
                    tracing::error!("❌ {}", e);
                    summary.failed.push(e.path().to_path_buf());
                    if self.policy == ErrorPolicy::Abort {
                        return Err(e.into());
                    }
                }
            }
        }

        tracing::info!(
            "📊 已处理 {}/{} 张图片 (标注 {}, 失败 {}), 输出目录: {}",
            summary.processed,
            summary.discovered,
            summary.annotated,
            summary.failed.len(),
            self.output_dir.display()
        );
        Ok(summary)
    }

    /// 处理单张图片, 返回被标注的 top1 (无预测时为 None)
    pub fn process_image(&mut self, path: &Path) -> Result<Option<Prediction>, ProcessError> {
        let mut record = ImageRecord::load(path)?;

        let t = Instant::now();
        let response = self
            .client
            .infer(&record.image, &self.model_id)
            .map_err(|e| ProcessError::Inference {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        tracing::debug!("[Inference]: {:?}", t.elapsed());

        let predictions = match normalize_response(&response) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("⚠️ 响应格式异常: {}", e);
                PredictionSet::default()
            }
        };
        if tracing::enabled!(tracing::Level::DEBUG) {
            let top5: Vec<_> = predictions
                .topk(5)
                .into_iter()
                .map(|p| format!("{} {:.4}", p.label(), p.confidence()))
                .collect();
            tracing::debug!("[Top5]: {:?}", top5);
        }

        let top = self.annotator.annotate(&mut record.image, &predictions);
        match &top {
            Some(p) => tracing::info!("🏷️ Top classification: {} ({:.4})", p.label(), p.confidence()),
            None => tracing::info!("📭 没有预测结果"),
        }

        self.save(record)?;
        Ok(top)
    }

    // 以原文件名保存到输出目录 (覆盖同名文件), 然后追加到帧缓冲
    fn save(&mut self, record: ImageRecord) -> Result<(), ProcessError> {
        let file_name = record.path.file_name().unwrap_or_default();
        let output = self.output_dir.join(file_name);
        record
            .image
            .save(&output)
            .map_err(|source| ProcessError::Encode {
                path: record.path.clone(),
                source,
            })?;
        tracing::info!("💾 已保存: {}", output.display());
        self.frames.push(record.image);
        Ok(())
    }

    /// 合成视频 (消耗帧缓冲)
    pub fn create_video(&mut self, encoder: &mut dyn VideoEncoder) -> Result<Option<VideoSummary>> {
        let frames = std::mem::take(&mut self.frames);
        let summary = video::assemble(frames, &self.video_path(), encoder)?;
        if let Some(s) = &summary {
            tracing::info!("🎬 视频已生成: {} ({} 帧)", s.path.display(), s.frames);
        }
        Ok(summary)
    }
}
