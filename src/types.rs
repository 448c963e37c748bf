// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 分类结果数据结构
// Data structures for classification results

/// 单个类别预测 (label + confidence)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
    label: String,
    confidence: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// 一次推理调用的全部预测 (label → confidence)
///
/// 保持服务端返回的顺序, 只有 top1 会被用于标注。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PredictionSet {
    items: Vec<Prediction>,
}

impl PredictionSet {
    pub fn new(items: Vec<Prediction>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prediction> {
        self.items.iter()
    }

    /// 置信度最高的预测
    ///
    /// 并列时取插入顺序中的第一个; 非有限值 (NaN/inf) 被忽略。
    pub fn top1(&self) -> Option<&Prediction> {
        let mut best: Option<&Prediction> = None;
        for p in self.items.iter().filter(|p| p.confidence.is_finite()) {
            match best {
                Some(b) if p.confidence <= b.confidence => {}
                _ => best = Some(p),
            }
        }
        best
    }

    /// 按置信度降序取前k个 (稳定排序, 并列保持原顺序)
    pub fn topk(&self, k: usize) -> Vec<&Prediction> {
        let mut sorted: Vec<&Prediction> = self
            .items
            .iter()
            .filter(|p| p.confidence.is_finite())
            .collect();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        sorted.truncate(k);
        sorted
    }
}

impl FromIterator<Prediction> for PredictionSet {
    fn from_iter<I: IntoIterator<Item = Prediction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, f64)> for PredictionSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(label, confidence)| Prediction::new(label, confidence))
            .collect()
    }
}
