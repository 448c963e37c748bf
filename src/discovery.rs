// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 输入图片发现

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认识别的图片扩展名 (大小写敏感)
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// 列出目录下指定扩展名的图片, 按路径字典序排序
///
/// 扩展名逐字比较, `.JPG` 不会匹配 `jpg`。跳过隐藏文件, 不递归子目录。
pub fn discover_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("无法读取输入目录: {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let matched = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.contains(&ext))
            .unwrap_or(false);
        if matched {
            images.push(path);
        }
    }

    images.sort();
    tracing::debug!("📂 {} 中发现 {} 张图片", dir.display(), images.len());
    Ok(images)
}

// 以 . 开头的隐藏文件 (与 shell glob 一致)
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
