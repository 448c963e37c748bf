// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 流水线集成测试: 假推理客户端 + 记录型视频编码器, 不依赖网络与 ffmpeg

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use image_inference_rs::annotate::{load_font, BUNDLED_FONT};
use image_inference_rs::{
    frame_rate, Annotator, ErrorPolicy, FrameRate, InferenceClient, ProcessError, Processor,
    VideoEncoder,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// 按调用顺序返回预设响应
struct ScriptedClient {
    responses: Vec<Result<Value>>,
    calls: usize,
}

impl ScriptedClient {
    fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses,
            calls: 0,
        }
    }

    fn repeat(value: Value, n: usize) -> Self {
        Self::new((0..n).map(|_| Ok(value.clone())).collect())
    }
}

impl InferenceClient for ScriptedClient {
    fn infer(&mut self, _image: &RgbImage, model_id: &str) -> Result<Value> {
        assert_eq!(model_id, "waste/1");
        let idx = self.calls;
        self.calls += 1;
        match self.responses.get_mut(idx) {
            Some(slot) => std::mem::replace(slot, Err(anyhow!("consumed"))),
            None => Err(anyhow!("no scripted response #{}", idx)),
        }
    }
}

#[derive(Default)]
struct RecordingEncoder {
    calls: Vec<(usize, FrameRate, PathBuf)>,
}

impl VideoEncoder for RecordingEncoder {
    fn encode(&mut self, frames: &[RgbImage], fps: FrameRate, output: &Path) -> Result<()> {
        self.calls.push((frames.len(), fps, output.to_path_buf()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn test_annotator() -> Annotator {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(BUNDLED_FONT);
    Annotator::new(load_font(&path).unwrap())
}

fn write_inputs(dir: &Path, names: &[&str]) {
    for (i, name) in names.iter().enumerate() {
        let img = RgbImage::from_fn(96, 64, |x, y| Rgb([x as u8, y as u8, (i * 40) as u8]));
        img.save(dir.join(name)).unwrap();
    }
}

fn metal() -> Value {
    json!({"predictions": {"glass": {"confidence": 0.82}, "metal": {"confidence": 0.91}}})
}

#[test]
fn test_empty_input_dir() {
    let annotator = test_annotator();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let out_dir = output.path().join("nested/out");

    let mut processor = Processor::new(
        ScriptedClient::new(Vec::new()),
        annotator,
        input.path(),
        &out_dir,
        "waste/1",
    )
    .unwrap();
    assert!(out_dir.is_dir());

    let summary = processor.process_images().unwrap();
    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.processed, 0);

    let mut encoder = RecordingEncoder::default();
    assert!(processor.create_video(&mut encoder).unwrap().is_none());
    assert!(encoder.calls.is_empty());
    assert!(!processor.video_path().exists());
}

#[test]
fn test_batch_annotates_saves_and_assembles() {
    let annotator = test_annotator();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &["b.png", "a.png", "c.png"]);
    std::fs::write(input.path().join("readme.txt"), "ignored").unwrap();

    let client = ScriptedClient::new(vec![
        Ok(metal()),
        // JSON编码字符串形式
        Ok(Value::String(
            r#"{"predictions": {"paper": {"confidence": 0.5}}}"#.to_string(),
        )),
        Ok(json!({"predictions": {}})),
    ]);
    let mut processor =
        Processor::new(client, annotator, input.path(), output.path(), "waste/1").unwrap();

    let names: Vec<_> = processor
        .input_images()
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);

    let summary = processor.process_images().unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.annotated, 2);
    assert!(summary.failed.is_empty());
    assert_eq!(processor.frames().len(), 3);

    // 标注过的图片有绿色边框, 空预测的图片保持原样
    let a = image::open(output.path().join("a.png")).unwrap().to_rgb8();
    assert_eq!(*a.get_pixel(0, 0), Rgb([0, 255, 0]));
    let c_out = image::open(output.path().join("c.png")).unwrap().to_rgb8();
    let c_in = image::open(input.path().join("c.png")).unwrap().to_rgb8();
    assert_eq!(c_out, c_in);

    // 写回再读取, 尺寸与帧缓冲一致
    for (name, frame) in names.iter().zip(processor.frames()) {
        let saved = image::open(output.path().join(name)).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), frame.dimensions());
        assert_eq!(&saved, frame);
    }

    let mut encoder = RecordingEncoder::default();
    let video = processor.create_video(&mut encoder).unwrap().unwrap();
    assert_eq!(video.frames, 3);
    assert_eq!(video.fps, frame_rate(3));
    assert_eq!(encoder.calls.len(), 1);
    assert_eq!(encoder.calls[0].2, output.path().join("output_video.mp4"));
    // 帧缓冲只消费一次
    assert!(processor.frames().is_empty());
}

#[test]
fn test_malformed_response_still_writes_image() {
    let annotator = test_annotator();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &["x.png"]);

    let client = ScriptedClient::new(vec![Ok(json!({"message": "unexpected"}))]);
    let mut processor =
        Processor::new(client, annotator, input.path(), output.path(), "waste/1").unwrap();
    let summary = processor.process_images().unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.annotated, 0);
    let saved = image::open(output.path().join("x.png")).unwrap().to_rgb8();
    let original = image::open(input.path().join("x.png")).unwrap().to_rgb8();
    assert_eq!(saved, original);
}

#[test]
fn test_decode_failure_skip_and_abort() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &["a.png", "c.png"]);
    // 无法解码的图片
    std::fs::write(input.path().join("b.jpg"), b"not an image").unwrap();

    let client = ScriptedClient::repeat(metal(), 2);
    let mut processor =
        Processor::new(client, test_annotator(), input.path(), output.path(), "waste/1").unwrap();
    let summary = processor.process_images().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, vec![input.path().join("b.jpg")]);
    assert_eq!(processor.frames().len(), 2);

    let output = tempfile::tempdir().unwrap();
    let client = ScriptedClient::repeat(metal(), 1);
    let mut processor =
        Processor::new(client, test_annotator(), input.path(), output.path(), "waste/1")
            .unwrap()
            .with_policy(ErrorPolicy::Abort);
    let err = processor.process_images().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ProcessError>(),
        Some(ProcessError::Decode { .. })
    ));
    assert_eq!(processor.frames().len(), 1);
    assert!(!output.path().join("c.png").exists());
}

#[test]
fn test_inference_failure_skip_and_abort() {
    let input = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &["a.png", "b.png", "c.png"]);
    let responses = || vec![Ok(metal()), Err(anyhow!("service unreachable")), Ok(metal())];

    // Skip: 记录失败, 不写文件, 不追加帧, 继续处理后续图片
    let output = tempfile::tempdir().unwrap();
    let mut processor = Processor::new(
        ScriptedClient::new(responses()),
        test_annotator(),
        input.path(),
        output.path(),
        "waste/1",
    )
    .unwrap();
    let summary = processor.process_images().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.annotated, 2);
    assert_eq!(summary.failed, vec![input.path().join("b.png")]);
    assert_eq!(processor.frames().len(), 2);
    assert!(output.path().join("a.png").is_file());
    assert!(!output.path().join("b.png").exists());
    assert!(output.path().join("c.png").is_file());

    // Abort: 在第二张图片处终止
    let output = tempfile::tempdir().unwrap();
    let mut processor = Processor::new(
        ScriptedClient::new(responses()),
        test_annotator(),
        input.path(),
        output.path(),
        "waste/1",
    )
    .unwrap()
    .with_policy(ErrorPolicy::Abort);
    let err = processor.process_images().unwrap_err();
    match err.downcast_ref::<ProcessError>() {
        Some(ProcessError::Inference { path, .. }) => {
            assert_eq!(path, &input.path().join("b.png"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(processor.frames().len(), 1);
    assert!(!output.path().join("b.png").exists());
    assert!(!output.path().join("c.png").exists());
}

#[test]
fn test_rerun_is_idempotent() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(input.path(), &["a.png", "b.png"]);

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let annotator = test_annotator();
        let client = ScriptedClient::repeat(metal(), 2);
        let mut processor =
            Processor::new(client, annotator, input.path(), output.path(), "waste/1").unwrap();
        processor.process_images().unwrap();
        let bytes: Vec<Vec<u8>> = ["a.png", "b.png"]
            .iter()
            .map(|n| std::fs::read(output.path().join(n)).unwrap())
            .collect();
        snapshots.push(bytes);
    }
    assert_eq!(snapshots[0], snapshots[1]);
}
