// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 批量图片分类标注
///
/// 流程:
/// 1. 扫描输入目录 (.jpg/.png)
/// 2. 逐张调用远程分类服务
/// 3. 标注 top1 并保存到输出目录
/// 4. 所有标注帧合成 output_video.mp4
use anyhow::Result;
use clap::Parser;
use image_inference_rs::{video, Args, HttpClient, PipelineConfig, Processor};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = PipelineConfig::from_args(&args)?;
    config.validate()?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
    }

    tracing::info!("🚀 批量推理启动");
    config.print_summary();

    let mut processor = Processor::<HttpClient>::from_config(&config)?;
    let summary = processor.process_images()?;

    if config.video {
        let mut encoder = video::default_encoder();
        processor.create_video(encoder.as_mut())?;
    }

    tracing::info!(
        "✅ Processed {} images. Output saved to {}",
        summary.processed,
        processor.output_dir().display()
    );
    if !summary.failed.is_empty() {
        tracing::warn!("⚠️ {} 张图片处理失败", summary.failed.len());
    }
    Ok(())
}
