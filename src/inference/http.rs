// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 阻塞式HTTP推理客户端
// POST {api_url}/{model_id}?api_key=...  body: base64(JPEG)

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::time::{Duration, Instant};

use super::InferenceClient;

/// 远程分类服务客户端
pub struct HttpClient {
    api_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn model_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.api_url, model_id.trim_matches('/'))
    }
}

/// RGB图片 → JPEG → base64
pub fn encode_image(image: &RgbImage) -> Result<String> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Jpeg)
        .context("JPEG编码失败")?;
    Ok(STANDARD.encode(buf.into_inner()))
}

impl InferenceClient for HttpClient {
    fn infer(&mut self, image: &RgbImage, model_id: &str) -> Result<Value> {
        let body = encode_image(image)?;
        let url = self.model_url(model_id);

        let t = Instant::now();
        let resp = self
            .agent
            .post(&url)
            .query("api_key", &self.api_key)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(&body);

        let resp = match resp {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                return Err(anyhow!("推理服务返回 {}: {}", code, text));
            }
            Err(e) => return Err(anyhow!("请求 {} 失败: {}", url, e)),
        };

        let text = resp.into_string().context("读取响应失败")?;
        tracing::debug!("[Inference]: {:?} ({} bytes)", t.elapsed(), text.len());

        // 非JSON的响应原样交给归一化处理, 由它报告格式错误
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
