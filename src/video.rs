// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 视频合成: 标注帧 → output_video.mp4
//
// 帧先以PNG序列暂存到临时目录, 再交给 FFmpeg (image2 demuxer + mpeg4编码)。
// 临时目录随 TempDir 释放自动删除。

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 输出视频文件名
pub const VIDEO_FILE_NAME: &str = "output_video.mp4";

/// 帧率上限
pub const MAX_FPS: u32 = 30;

/// 每多少帧对应1fps
pub const FRAMES_PER_FPS: u32 = 15;

/// 编码器 (mp4v)
pub const VIDEO_CODEC: &str = "mpeg4";

// 奇数宽高补齐为偶数 (yuv420p 要求)
const PAD_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// 有理数帧率 (避免浮点误差, 直接传给 FFmpeg)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        let g = gcd(num, den).max(1);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// 帧率 = min(30, 总帧数 / 15)
///
/// 帧数少于15时帧率低于1fps, 短序列播放得更慢。
pub fn frame_rate(total_frames: usize) -> FrameRate {
    let total = total_frames.min(u32::MAX as usize) as u32;
    if total >= MAX_FPS * FRAMES_PER_FPS {
        FrameRate::new(MAX_FPS, 1)
    } else {
        FrameRate::new(total, FRAMES_PER_FPS)
    }
}

/// 视频合成结果
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub path: PathBuf,
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: FrameRate,
}

/// 视频编码器接口
pub trait VideoEncoder {
    /// 按顺序编码全部帧 (帧尺寸一致)
    fn encode(&mut self, frames: &[RgbImage], fps: FrameRate, output: &Path) -> Result<()>;

    fn name(&self) -> &str;
}

/// 合成视频
///
/// 没有帧时不写文件, 返回 `None`。尺寸与第一帧不同的帧会被缩放到第一帧尺寸。
pub fn assemble(
    mut frames: Vec<RgbImage>,
    output: &Path,
    encoder: &mut dyn VideoEncoder,
) -> Result<Option<VideoSummary>> {
    let Some(first) = frames.first() else {
        tracing::info!("🎞️ 没有可用帧, 跳过视频生成");
        return Ok(None);
    };
    let (width, height) = first.dimensions();

    let mut resized = 0;
    for frame in frames.iter_mut().skip(1) {
        if frame.dimensions() != (width, height) {
            *frame = image::imageops::resize(frame, width, height, FilterType::Triangle);
            resized += 1;
        }
    }
    if resized > 0 {
        tracing::warn!("⚠️ {} 帧尺寸与首帧不同, 已缩放到 {}x{}", resized, width, height);
    }

    let fps = frame_rate(frames.len());
    tracing::info!(
        "🎬 编码视频: {} 帧 {}x{} @ {:.3}fps ({})",
        frames.len(),
        width,
        height,
        fps.as_f64(),
        encoder.name()
    );
    encoder.encode(&frames, fps, output)?;

    Ok(Some(VideoSummary {
        path: output.to_path_buf(),
        frames: frames.len(),
        width,
        height,
        fps,
    }))
}

/// 把帧写成 frame_000000.png 序列, 返回 image2 输入模式
pub fn stage_frames(frames: &[RgbImage], dir: &Path) -> Result<String> {
    for (idx, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("frame_{:06}.png", idx));
        frame
            .save(&path)
            .with_context(|| format!("暂存帧失败: {}", path.display()))?;
    }
    Ok(dir.join("frame_%06d.png").to_string_lossy().into_owned())
}

fn staging_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("image-inference-frames-")
        .tempdir()
        .context("创建临时目录失败")
}

/// 调用 ffmpeg 命令行编码
pub struct FfmpegCliEncoder {
    program: PathBuf,
}

impl FfmpegCliEncoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegCliEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl VideoEncoder for FfmpegCliEncoder {
    fn encode(&mut self, frames: &[RgbImage], fps: FrameRate, output: &Path) -> Result<()> {
        let staging = staging_dir()?;
        let pattern = stage_frames(frames, staging.path())?;

        let status = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-f", "image2", "-framerate"])
            .arg(fps.to_string())
            .arg("-i")
            .arg(&pattern)
            .args(["-vf", PAD_FILTER, "-c:v", VIDEO_CODEC, "-q:v", "3"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(output)
            .status()
            .with_context(|| format!("无法启动 {}", self.program.display()))?;

        if !status.success() {
            bail!("ffmpeg 编码失败: {}", status);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg-cli"
    }
}

/// 进程内编码 (ez-ffmpeg)
#[cfg(feature = "ffmpeg-lib")]
pub struct FfmpegLibEncoder;

#[cfg(feature = "ffmpeg-lib")]
impl VideoEncoder for FfmpegLibEncoder {
    fn encode(&mut self, frames: &[RgbImage], fps: FrameRate, output: &Path) -> Result<()> {
        use ez_ffmpeg::{FfmpegContext, Input, Output};

        let staging = staging_dir()?;
        let pattern = stage_frames(frames, staging.path())?;
        let rate = fps.to_string();

        let input = Input::new(pattern)
            .set_format("image2")
            .set_input_opts([("framerate", rate.as_str())].into());
        let out = Output::from(output.to_string_lossy().into_owned()).set_video_codec(VIDEO_CODEC);

        let ctx = FfmpegContext::builder()
            .input(input)
            .filter_descs([PAD_FILTER].into())
            .output(out)
            .build()
            .map_err(|e| anyhow::anyhow!("构建失败: {}", e))?;
        let sch = ctx.start().map_err(|e| anyhow::anyhow!("启动失败: {}", e))?;
        sch.wait().map_err(|e| anyhow::anyhow!("编码失败: {}", e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "ez-ffmpeg"
    }
}

/// 默认编码器: 开启 `ffmpeg-lib` 时进程内编码, 否则调用命令行
pub fn default_encoder() -> Box<dyn VideoEncoder> {
    #[cfg(feature = "ffmpeg-lib")]
    {
        Box::new(FfmpegLibEncoder)
    }
    #[cfg(not(feature = "ffmpeg-lib"))]
    {
        Box::new(FfmpegCliEncoder::default())
    }
}
