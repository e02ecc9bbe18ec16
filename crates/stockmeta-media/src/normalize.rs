//! Media normalization: API samples and display thumbnails.
//!
//! Two separate pipelines share the frame decoder:
//! - [`MediaNormalizer::sample`] produces the small JPEG sent to providers
//!   (shorter edge scaled to [`SAMPLE_SHORT_EDGE`], video frame at
//!   [`VIDEO_SAMPLE_OFFSET_SECS`]).
//! - [`MediaNormalizer::thumbnail`] produces a letterboxed PNG fitted into a
//!   fixed display box (video: first frame).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use stockmeta_types::{MediaFile, MediaKind, MetadataError};

use crate::types::Sample;

/// Target length of the sample's shorter edge.
pub const SAMPLE_SHORT_EDGE: u32 = 300;
/// JPEG quality of the sample.
pub const SAMPLE_JPEG_QUALITY: u8 = 82;
/// Video sample offset; skips black or transition frames at 0.
pub const VIDEO_SAMPLE_OFFSET_SECS: f64 = 0.1;
/// Letterbox background of thumbnails.
pub const THUMBNAIL_BACKGROUND: Rgb<u8> = Rgb([14, 17, 23]);

/// Decodes images and video frames into samples and thumbnails.
#[derive(Debug, Clone)]
pub struct MediaNormalizer {
    ffmpeg: PathBuf,
}

impl Default for MediaNormalizer {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl MediaNormalizer {
    /// Use a specific ffmpeg binary for video decoding.
    pub fn with_ffmpeg(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    /// Produce the API sample for an image or video.
    pub async fn sample(&self, file: &MediaFile) -> Result<Sample, MetadataError> {
        let frame = self.decode_frame(file, VIDEO_SAMPLE_OFFSET_SECS).await?;
        let name = file.name.clone();
        let sample = tokio::task::spawn_blocking(move || encode_sample(&frame))
            .await
            .map_err(|e| MetadataError::decode(&name, e))?
            .map_err(|e| MetadataError::decode(&name, e))?;
        tracing::debug!(
            file = %file.name,
            width = sample.width,
            height = sample.height,
            bytes = sample.jpeg.len(),
            "Sample created"
        );
        Ok(sample)
    }

    /// Produce a PNG thumbnail fitted into `width` x `height`.
    pub async fn thumbnail(
        &self,
        file: &MediaFile,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, MetadataError> {
        let frame = self.decode_frame(file, 0.0).await?;
        let name = file.name.clone();
        tokio::task::spawn_blocking(move || {
            let canvas = render_thumbnail(&frame, width, height);
            encode_png(&DynamicImage::ImageRgb8(canvas))
        })
        .await
        .map_err(|e| MetadataError::decode(&name, e))?
        .map_err(|e| MetadataError::decode(&name, e))
    }

    /// Bytes to hand to the keyword-scoring service: the original file for
    /// images, the sample JPEG for videos.
    pub async fn scoring_payload(
        &self,
        file: &MediaFile,
        sample: &Sample,
    ) -> Result<Vec<u8>, MetadataError> {
        match file.kind {
            MediaKind::Image => Ok(tokio::fs::read(&file.path).await?),
            MediaKind::Video => Ok(sample.jpeg.clone()),
            MediaKind::Unsupported => Err(MetadataError::UnsupportedMedia(file.name.clone())),
        }
    }

    async fn decode_frame(
        &self,
        file: &MediaFile,
        video_offset_secs: f64,
    ) -> Result<DynamicImage, MetadataError> {
        match file.kind {
            MediaKind::Image => {
                let bytes = tokio::fs::read(&file.path)
                    .await
                    .map_err(|e| MetadataError::decode(&file.name, e))?;
                decode_image_bytes(&file.name, bytes).await
            }
            MediaKind::Video => {
                let png = self.extract_video_frame(&file.path, video_offset_secs).await?;
                decode_image_bytes(&file.name, png).await
            }
            MediaKind::Unsupported => Err(MetadataError::UnsupportedMedia(file.name.clone())),
        }
    }

    /// Grab a single PNG-encoded frame at `offset_secs` via ffmpeg.
    async fn extract_video_frame(
        &self,
        path: &Path,
        offset_secs: f64,
    ) -> Result<Vec<u8>, MetadataError> {
        let name = path.display().to_string();
        let output = tokio::process::Command::new(&self.ffmpeg)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(format!("{offset_secs:.3}"))
            .arg("-i")
            .arg(path)
            .arg("-frames:v")
            .arg("1")
            .arg("-f")
            .arg("image2pipe")
            .arg("-vcodec")
            .arg("png")
            .arg("-")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MetadataError::decode(&name, format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MetadataError::decode(&name, stderr.trim()));
        }
        if output.stdout.is_empty() {
            return Err(MetadataError::decode(
                &name,
                format!("no frame at {offset_secs}s"),
            ));
        }
        Ok(output.stdout)
    }
}

async fn decode_image_bytes(name: &str, bytes: Vec<u8>) -> Result<DynamicImage, MetadataError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| MetadataError::decode(name, e))?
        .map_err(|e| MetadataError::decode(name, e))
}

/// Scale so the shorter edge equals `target`. Never upscales.
pub fn downscale_to_short_edge(img: &DynamicImage, target: u32) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    let short = w.min(h);
    if short <= target || short == 0 {
        return img.clone();
    }
    let scale = f64::from(target) / f64::from(short);
    let new_w = ((f64::from(w) * scale).round() as u32).max(1);
    let new_h = ((f64::from(h) * scale).round() as u32).max(1);
    img.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Downscale, JPEG-encode and base64 a decoded frame.
pub fn encode_sample(frame: &DynamicImage) -> image::ImageResult<Sample> {
    let scaled = downscale_to_short_edge(frame, SAMPLE_SHORT_EDGE).to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, SAMPLE_JPEG_QUALITY).encode_image(&scaled)?;
    let base64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &jpeg);
    Ok(Sample {
        jpeg,
        base64,
        width: scaled.width(),
        height: scaled.height(),
    })
}

/// Fit `frame` into a `width` x `height` box, centered on a dark background.
pub fn render_thumbnail(frame: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let fitted = if frame.width() <= width && frame.height() <= height {
        frame.to_rgb8()
    } else {
        frame.thumbnail(width, height).to_rgb8()
    };
    let mut canvas = RgbImage::from_pixel(width, height, THUMBNAIL_BACKGROUND);
    let x = (width.saturating_sub(fitted.width()) / 2) as i64;
    let y = (height.saturating_sub(fitted.height()) / 2) as i64;
    image::imageops::overlay(&mut canvas, &fitted, x, y);
    canvas
}

fn encode_png(img: &DynamicImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
