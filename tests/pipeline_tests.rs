//! Pipeline tests driven by an in-memory video

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

use montage_cli::adapters::{FsOutputAdapter, ImageCrateCodec};
use montage_cli::app::{AppContainer, DefaultAppContainer, MontageInteractor};
use montage_cli::domain::model::{Config, OutputFormat, Rational, ThumbnailSize, VideoInfo};
use montage_cli::engine::FrameExtractor;
use montage_cli::error::{MontageError, MontageResult};
use montage_cli::output::OutputTarget;
use montage_cli::planner::{KeyframeLocator, TimestampScheduler};
use montage_cli::ports::{
    DecodeSession, DecodedFrame, DecodedPacket, MediaDecoder, OutputPort, ProbePort, StreamInfo,
    StreamKind,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 36;
const FPS: i64 = 10;
const GOP: i64 = 10;
const DURATION: f64 = 60.0;

// Test utilities

/// 10 fps video with a keyframe every second; pixels encode the pts
struct SyntheticDecoder {
    frame_count: i64,
    has_video: bool,
    /// Earlier seeks sleep longer, so tasks finish in reverse order
    reverse_delay: bool,
    opens: AtomicUsize,
}

impl SyntheticDecoder {
    fn new() -> Self {
        Self {
            frame_count: (DURATION as i64) * FPS,
            has_video: true,
            reverse_delay: false,
            opens: AtomicUsize::new(0),
        }
    }

    fn with_reverse_delay(mut self) -> Self {
        self.reverse_delay = true;
        self
    }

    fn without_video(mut self) -> Self {
        self.has_video = false;
        self
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl MediaDecoder for SyntheticDecoder {
    fn open(&self, _path: &Path) -> MontageResult<Box<dyn DecodeSession>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticSession {
            frame_count: self.frame_count,
            has_video: self.has_video,
            reverse_delay: self.reverse_delay,
            position: 0,
        }))
    }
}

struct SyntheticSession {
    frame_count: i64,
    has_video: bool,
    reverse_delay: bool,
    position: i64,
}

fn pixel_for(pts: i64) -> Rgb<u8> {
    Rgb([(pts / 256) as u8, (pts % 256) as u8, 7])
}

impl DecodeSession for SyntheticSession {
    fn streams(&self) -> Vec<StreamInfo> {
        let audio = StreamInfo {
            kind: StreamKind::Audio,
            index: 1,
            time_base: Rational::new(1, 48000),
            codec_name: "aac".into(),
            width: 0,
            height: 0,
            avg_frame_rate: Rational::new(0, 1),
        };
        if !self.has_video {
            return vec![audio];
        }
        vec![
            StreamInfo {
                kind: StreamKind::Video,
                index: 0,
                time_base: Rational::new(1, FPS as i32),
                codec_name: "h264".into(),
                width: WIDTH,
                height: HEIGHT,
                avg_frame_rate: Rational::new(FPS as i32, 1),
            },
            audio,
        ]
    }

    fn seek(&mut self, _stream_index: usize, pts: i64, backward: bool) -> MontageResult<()> {
        let pts = pts.clamp(0, self.frame_count - 1);
        if self.reverse_delay {
            let wait = (self.frame_count - pts) as u64 / 20;
            std::thread::sleep(Duration::from_millis(wait));
        }
        self.position = if backward { pts - pts % GOP } else { pts };
        Ok(())
    }

    fn next_packet(&mut self, _stream_index: usize) -> MontageResult<Option<DecodedPacket>> {
        if self.position >= self.frame_count {
            return Ok(None);
        }
        let pts = self.position;
        self.position += 1;
        Ok(Some(DecodedPacket {
            pts: Some(pts),
            frames: vec![DecodedFrame {
                pts: Some(pts),
                key_frame: pts % GOP == 0,
                pixels: Box::new(RgbImage::from_pixel(WIDTH, HEIGHT, pixel_for(pts))),
            }],
        }))
    }
}

/// Probe answering from the file name; names containing "broken" have no video
struct StaticProbe {
    calls: AtomicUsize,
}

impl StaticProbe {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProbePort for StaticProbe {
    async fn probe(&self, path: &Path) -> MontageResult<VideoInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if path.to_string_lossy().contains("broken") {
            return Err(MontageError::NoVideoStream {
                path: path.to_path_buf(),
            });
        }
        Ok(VideoInfo {
            path: path.to_path_buf(),
            duration: DURATION,
            width: WIDTH,
            height: HEIGHT,
            file_size: 1_234_567,
            video_codec: "h264".into(),
            audio_codec: "aac".into(),
            bit_rate: 2_500_000,
            avg_frame_rate: Rational::new(FPS as i32, 1),
        })
    }
}

/// Output that keeps stdout bytes in memory
#[derive(Default)]
struct MemoryOutput {
    stdout: Mutex<Vec<u8>>,
}

#[async_trait]
impl OutputPort for MemoryOutput {
    async fn write_file(&self, path: &Path, _bytes: &[u8]) -> MontageResult<()> {
        panic!("unexpected file write to {}", path.display());
    }

    async fn write_stdout(&self, bytes: &[u8]) -> MontageResult<()> {
        self.stdout.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    async fn exists(&self, _path: &Path) -> bool {
        false
    }
}

fn test_config(input: &Path) -> Config {
    Config {
        input_path: input.to_path_buf(),
        columns: 3,
        rows: 2,
        thumb_width: WIDTH,
        max_workers: 4,
        ..Config::default()
    }
}

fn interactor(
    probe: Arc<StaticProbe>,
    decoder: Arc<SyntheticDecoder>,
    output: Arc<dyn OutputPort>,
) -> MontageInteractor {
    MontageInteractor::new(probe, decoder, Arc::new(ImageCrateCodec::new()), output)
}

fn thumb() -> ThumbnailSize {
    ThumbnailSize {
        width: WIDTH,
        height: HEIGHT,
    }
}

// Extraction

#[tokio::test]
async fn test_output_order_ignores_completion_order() {
    let samples = TimestampScheduler::new(5.0, 5.0)
        .unwrap()
        .schedule(DURATION, 12)
        .unwrap();
    let codec = Arc::new(ImageCrateCodec::new());

    let parallel = FrameExtractor::new(Arc::new(SyntheticDecoder::new().with_reverse_delay()), codec.clone(), 6)
        .extract(Path::new("movie.mp4"), &samples, thumb())
        .await
        .unwrap();
    let sequential = FrameExtractor::new(Arc::new(SyntheticDecoder::new()), codec, 1)
        .extract(Path::new("movie.mp4"), &samples, thumb())
        .await
        .unwrap();

    assert_eq!(parallel.len(), 12);
    for (position, (a, b)) in parallel.iter().zip(&sequential).enumerate() {
        assert_eq!(a.index, position);
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.image, b.image);
    }
}

#[tokio::test]
async fn test_frames_come_from_next_keyframe() {
    let samples = TimestampScheduler::new(5.0, 5.0)
        .unwrap()
        .schedule(DURATION, 12)
        .unwrap();
    let frames = FrameExtractor::new(Arc::new(SyntheticDecoder::new()), Arc::new(ImageCrateCodec::new()), 4)
        .extract(Path::new("movie.mp4"), &samples, thumb())
        .await
        .unwrap();

    for (sample, frame) in samples.iter().zip(&frames) {
        let expected = sample.timestamp.floor() + 1.0;
        assert!((frame.timestamp - expected).abs() < 1e-9, "{} -> {}", sample.timestamp, frame.timestamp);
        let pts = (expected as i64) * FPS;
        assert_eq!(frame.image.get_pixel(0, 0), &pixel_for(pts));
    }
}

#[tokio::test]
async fn test_short_scan_budget_uses_landing_keyframe() {
    let samples = TimestampScheduler::new(5.0, 5.0)
        .unwrap()
        .schedule(DURATION, 4)
        .unwrap();
    let frames = FrameExtractor::new(Arc::new(SyntheticDecoder::new()), Arc::new(ImageCrateCodec::new()), 2)
        .with_locator(KeyframeLocator::new().with_max_packets(5))
        .extract(Path::new("movie.mp4"), &samples, thumb())
        .await
        .unwrap();

    for (sample, frame) in samples.iter().zip(&frames) {
        assert!((frame.timestamp - sample.timestamp.floor()).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_missing_video_stream() {
    let samples = TimestampScheduler::new(5.0, 5.0).unwrap().schedule(DURATION, 2).unwrap();
    let err = FrameExtractor::new(
        Arc::new(SyntheticDecoder::new().without_video()),
        Arc::new(ImageCrateCodec::new()),
        2,
    )
    .extract(Path::new("audio_only.mp4"), &samples, thumb())
    .await
    .unwrap_err();

    assert!(matches!(err, MontageError::NoVideoStream { .. }));
}

// Montage use case

#[tokio::test]
async fn test_invalid_skip_fails_before_probe_or_decode() {
    let probe = Arc::new(StaticProbe::new());
    let decoder = Arc::new(SyntheticDecoder::new());
    let montage = interactor(probe.clone(), decoder.clone(), Arc::new(MemoryOutput::default()));

    let config = Config {
        skip_start_percent: 60.0,
        skip_end_percent: 50.0,
        ..test_config(Path::new("movie.mp4"))
    };
    let err = montage.execute(&config, &OutputTarget::Stdout).await.unwrap_err();

    assert!(matches!(err, MontageError::InvalidRange { .. }));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    assert_eq!(decoder.opens(), 0);
}

#[tokio::test]
async fn test_jpeg_montage_end_to_end() {
    let dir = TempDir::new().unwrap();
    let target = OutputTarget::File(dir.path().join("sheet.jpg"));
    let decoder = Arc::new(SyntheticDecoder::new());
    let montage = interactor(Arc::new(StaticProbe::new()), decoder.clone(), Arc::new(FsOutputAdapter::new()));
    let config = test_config(Path::new("movie.mp4"));

    let report = montage.execute(&config, &target).await.unwrap();
    assert_eq!(report.samples, 6);
    assert_eq!(decoder.opens(), 6);

    let bytes = std::fs::read(dir.path().join("sheet.jpg")).unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    // 3*64 + 2*5 + 2*20 by 2*36 + 5 + 2*20 + 120
    assert_eq!((image.width(), image.height()), (242, 237));

    let again = montage.execute(&config, &target).await.unwrap_err();
    assert!(matches!(again, MontageError::OutputExists { .. }));
}

#[tokio::test]
async fn test_jpeg_to_stdout() {
    let output = Arc::new(MemoryOutput::default());
    let montage = interactor(Arc::new(StaticProbe::new()), Arc::new(SyntheticDecoder::new()), output.clone());

    montage
        .execute(&test_config(Path::new("movie.mp4")), &OutputTarget::Stdout)
        .await
        .unwrap();

    let bytes = output.stdout.lock().unwrap().clone();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_gif_montage_end_to_end() {
    let output = Arc::new(MemoryOutput::default());
    let montage = interactor(Arc::new(StaticProbe::new()), Arc::new(SyntheticDecoder::new()), output.clone());
    let config = Config {
        output_format: OutputFormat::Gif,
        columns: 2,
        rows: 2,
        gif_clip_duration: 1.0,
        gif_fps: 5,
        gif_loop: 2,
        ..test_config(Path::new("movie.mp4"))
    };

    montage.execute(&config, &OutputTarget::Stdout).await.unwrap();

    let bytes = output.stdout.lock().unwrap().clone();
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(bytes.as_slice()).unwrap();
    assert_eq!((decoder.width(), decoder.height()), (173, 237));

    let mut frames = 0;
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        assert_eq!(frame.delay, 20);
        frames += 1;
    }
    // 1s clips at 5 fps
    assert_eq!(frames, 5);
}

#[tokio::test]
async fn test_custom_layout_out_of_bounds_is_rejected_before_decoding() {
    let decoder = Arc::new(SyntheticDecoder::new());
    let montage = interactor(Arc::new(StaticProbe::new()), decoder.clone(), Arc::new(MemoryOutput::default()));
    let config: Config = serde_yaml::from_str(
        "columns: 2\nrows: 2\nlayout:\n  - {row: 1, col: 1, row_span: 2}\n",
    )
    .unwrap();
    let config = Config {
        input_path: PathBuf::from("movie.mp4"),
        thumb_width: WIDTH,
        ..config
    };

    let err = montage.execute(&config, &OutputTarget::Stdout).await.unwrap_err();
    assert!(matches!(err, MontageError::OutOfBounds { .. }));
    assert_eq!(decoder.opens(), 0);
}

// Batch

#[tokio::test]
async fn test_batch_isolates_failures_and_skips_existing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir_all(input.path().join("sub")).unwrap();
    std::fs::write(input.path().join("a.mp4"), b"").unwrap();
    std::fs::write(input.path().join("sub").join("b.MKV"), b"").unwrap();
    std::fs::write(input.path().join("broken.avi"), b"").unwrap();
    std::fs::write(input.path().join("notes.txt"), b"").unwrap();

    let container = DefaultAppContainer::with_media(Arc::new(StaticProbe::new()), Arc::new(SyntheticDecoder::new()));
    let config = Config {
        output_path: output.path().to_string_lossy().into_owned(),
        ..test_config(input.path())
    };

    let report = container.batch_interactor().execute(input.path(), &config).await.unwrap();
    assert_eq!((report.total, report.succeeded, report.failed, report.skipped), (3, 2, 1, 0));
    assert!(!report.all_failed());
    assert!(output.path().join("a_montage.jpg").is_file());
    assert!(output.path().join("sub_b_montage.jpg").is_file());

    let report = container.batch_interactor().execute(input.path(), &config).await.unwrap();
    assert_eq!((report.succeeded, report.failed, report.skipped), (0, 1, 2));
}

#[tokio::test]
async fn test_inspect_reports_plan() {
    let container = DefaultAppContainer::with_media(Arc::new(StaticProbe::new()), Arc::new(SyntheticDecoder::new()));
    let config = Config {
        auto_grid: true,
        ..test_config(Path::new("movie.mp4"))
    };

    let report = container.inspect_interactor().execute(&config).await.unwrap();
    // 60s falls under the first default rule
    assert_eq!((report.plan.grid.columns, report.plan.grid.rows), (3, 3));
    assert_eq!(report.plan.timestamps.len(), 9);
    assert_eq!(report.plan.thumbnail, thumb());

    let json = montage_cli::app::InspectInteractor::format_as_json(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["video"]["width"], WIDTH);
    assert_eq!(value["plan"]["timestamps"].as_array().unwrap().len(), 9);
}
