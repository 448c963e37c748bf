// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

// 构建脚本: 进程内编码 (ffmpeg-lib, 静态链接FFmpeg) 时补充依赖库
fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // 默认走 ffmpeg 命令行, 无需额外链接
    if std::env::var_os("CARGO_FEATURE_FFMPEG_LIB").is_none() {
        return;
    }

    // 仅在Windows MSVC环境下添加静态FFmpeg依赖的库
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_env = std::env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    if target_os == "windows" && target_env == "msvc" {
        // x264 编码器
        println!("cargo:rustc-link-lib=dylib=libx264");

        // OLE 自动化和VFW
        println!("cargo:rustc-link-lib=dylib=oleaut32");
        println!("cargo:rustc-link-lib=dylib=vfw32");
    }
}
