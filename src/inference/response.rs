// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 推理响应归一化
// 支持的 predictions 形态:
//   多标签: {"predictions": {"metal": {"confidence": 0.91}, ...}}
//   简写:   {"predictions": {"metal": 0.91, ...}}
//   单标签: {"predictions": [{"class": "metal", "confidence": 0.91}, ...]}
// 整个响应也可能是上述对象的JSON编码字符串。

use serde_json::{Map, Value};

use crate::error::ResponseError;
use crate::types::{Prediction, PredictionSet};

/// 原始响应 → PredictionSet
///
/// `predictions` 为空时返回空集合 (不是错误)。
pub fn normalize_response(value: &Value) -> Result<PredictionSet, ResponseError> {
    match value {
        Value::String(raw) => {
            let parsed: Value = serde_json::from_str(raw)
                .map_err(|e| ResponseError::InvalidJson(e.to_string()))?;
            if parsed.is_string() {
                // 只解一层, 避免字符串套字符串
                return Err(ResponseError::Malformed(short(&parsed)));
            }
            normalize_response(&parsed)
        }
        Value::Object(obj) => match obj.get("predictions") {
            Some(Value::Object(map)) => from_map(map),
            Some(Value::Array(list)) => from_list(list),
            Some(Value::Null) => Ok(PredictionSet::default()),
            Some(other) => Err(ResponseError::Malformed(short(other))),
            None => Err(ResponseError::MissingPredictions(short(value))),
        },
        other => Err(ResponseError::MissingPredictions(short(other))),
    }
}

fn from_map(map: &Map<String, Value>) -> Result<PredictionSet, ResponseError> {
    map.iter()
        .map(|(label, entry)| {
            let confidence = match entry {
                Value::Object(inner) => inner.get("confidence").and_then(Value::as_f64),
                Value::Number(n) => n.as_f64(),
                _ => None,
            }
            .ok_or_else(|| ResponseError::Malformed(format!("{}: {}", label, short(entry))))?;
            Ok(Prediction::new(label.as_str(), confidence))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PredictionSet::new)
}

fn from_list(list: &[Value]) -> Result<PredictionSet, ResponseError> {
    list.iter()
        .map(|entry| {
            let label = entry
                .get("class")
                .and_then(Value::as_str)
                .ok_or_else(|| ResponseError::Malformed(short(entry)))?;
            let confidence = entry
                .get("confidence")
                .and_then(Value::as_f64)
                .ok_or_else(|| ResponseError::Malformed(short(entry)))?;
            Ok(Prediction::new(label, confidence))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PredictionSet::new)
}

// 错误信息里只保留响应前200个字符
fn short(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
