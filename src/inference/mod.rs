// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 远程分类推理接口
///
/// # 架构说明
/// - `InferenceClient`: 统一的推理接口, 输入RGB图片, 输出原始JSON响应
/// - `HttpClient`: 阻塞式HTTP实现 (ureq)
/// - `normalize_response`: 原始响应 → `PredictionSet`
///
/// ## 核心流程
/// ```text
/// RgbImage → infer → serde_json::Value
///                  ↓
///         normalize_response → PredictionSet
/// ```
use anyhow::Result;
use image::RgbImage;

pub mod http;
pub mod response;

pub use http::HttpClient;
pub use response::normalize_response;

/// 统一的远程推理接口
pub trait InferenceClient {
    /// 发送一张图片到推理服务
    ///
    /// # Arguments
    /// * `image` - RGB图片
    /// * `model_id` - 服务端模型标识 (例如 `classification-waste/11`)
    ///
    /// # Returns
    /// * `serde_json::Value` - 原始响应, 可能是对象, 也可能是JSON编码的字符串
    fn infer(&mut self, image: &RgbImage, model_id: &str) -> Result<serde_json::Value>;
}

impl<T: InferenceClient + ?Sized> InferenceClient for Box<T> {
    fn infer(&mut self, image: &RgbImage, model_id: &str) -> Result<serde_json::Value> {
        (**self).infer(image, model_id)
    }
}
