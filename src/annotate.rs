// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 标注渲染: 边框 + 右上角标签徽章
// Annotation renderer: border + top-right text badge

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

use crate::types::{Prediction, PredictionSet};

/// 随仓库分发的字体 (相对仓库根目录)
pub const BUNDLED_FONT: &str = "assets/font/DejaVuSans.ttf";

/// 常见系统字体位置 (按顺序尝试)
const FONT_CANDIDATES: [&str; 9] = [
    BUNDLED_FONT,
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// 用户字体目录下尝试的文件名
const USER_FONT_NAMES: [&str; 3] = ["DejaVuSans.ttf", "LiberationSans-Regular.ttf", "Arial.ttf"];

/// 标注样式
#[derive(Debug, Clone, Copy)]
pub struct BadgeStyle {
    pub border_color: Rgb<u8>,
    pub border_width: u32,
    pub text_color: Rgb<u8>,
    pub background: Rgb<u8>,
    pub scale: f32,
    pub margin_right: i32, // 徽章距右边缘
    pub baseline_y: i32,   // 文字基线
    pub padding: i32,
}

impl Default for BadgeStyle {
    fn default() -> Self {
        Self {
            border_color: Rgb([0, 255, 0]),
            border_width: 2,
            text_color: Rgb([255, 255, 255]),
            background: Rgb([0, 0, 0]),
            scale: 18.0,
            margin_right: 20,
            baseline_y: 30,
            padding: 5,
        }
    }
}

/// 徽章文字: 大写标签 + 百分比(一位小数)
pub fn badge_text(prediction: &Prediction) -> String {
    format!(
        "{} {:.1}%",
        prediction.label().to_uppercase(),
        prediction.confidence() * 100.0
    )
}

/// 在字体目录和常见系统路径中查找可用字体
pub fn find_system_font() -> Option<PathBuf> {
    let user_fonts = dirs::font_dir()
        .into_iter()
        .flat_map(|dir| USER_FONT_NAMES.iter().map(move |name| dir.join(name)));
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .chain(user_fonts)
        .find(|p| p.is_file())
}

/// 加载字体文件 (.ttf/.otf, .ttc 取第0个)
pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("无法读取字体: {}", path.display()))?;
    FontVec::try_from_vec_and_index(bytes, 0)
        .map_err(|e| anyhow!("字体解析失败 {}: {}", path.display(), e))
}

/// 标注渲染器
pub struct Annotator {
    font: FontVec,
    style: BadgeStyle,
}

impl Annotator {
    pub fn new(font: FontVec) -> Self {
        Self {
            font,
            style: BadgeStyle::default(),
        }
    }

    /// 指定字体路径, 未指定时自动查找系统字体
    pub fn from_font_path(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => find_system_font()
                .ok_or_else(|| anyhow!("未找到可用字体, 请通过 --font 指定 .ttf 文件"))?,
        };
        tracing::info!("🔤 标注字体: {}", path.display());
        Ok(Self::new(load_font(&path)?))
    }

    /// 原地标注, 返回被标注的 top1
    ///
    /// 预测为空时图片保持不变。
    pub fn annotate(&self, image: &mut RgbImage, predictions: &PredictionSet) -> Option<Prediction> {
        let top = predictions.top1()?.clone();
        self.draw_border(image);
        self.draw_badge(image, &badge_text(&top));
        Some(top)
    }

    fn draw_border(&self, image: &mut RgbImage) {
        let (w, h) = image.dimensions();
        for i in 0..self.style.border_width {
            if w <= 2 * i || h <= 2 * i {
                break;
            }
            let rect = Rect::at(i as i32, i as i32).of_size(w - 2 * i, h - 2 * i);
            draw_hollow_rect_mut(image, rect, self.style.border_color);
        }
    }

    fn draw_badge(&self, image: &mut RgbImage, text: &str) {
        let s = &self.style;
        let scale = PxScale::from(s.scale);
        let (tw, th) = text_size(scale, &self.font, text);
        let (tw, th) = (tw as i32, th as i32);

        let text_x = image.width() as i32 - tw - s.margin_right;
        let text_y = s.baseline_y;

        let bg = Rect::at(text_x, text_y - th - s.padding)
            .of_size((tw + 2 * s.padding).max(1) as u32, (th + 2 * s.padding).max(1) as u32);
        draw_filled_rect_mut(image, bg, s.background);
        draw_text_mut(
            image,
            s.text_color,
            text_x + s.padding,
            text_y - th,
            scale,
            &self.font,
            text,
        );
    }
}
