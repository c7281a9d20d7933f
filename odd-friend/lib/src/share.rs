//! Rendering a friend to PNG and handing it to the platform share sheet.
//!
//! The face is composed on a square canvas with the same proportions the
//! app screen uses: a 200 px head centred on a 300 px canvas, two 50 px eyes
//! side by side above the centre and an 80 px mouth below it. Other canvas
//! sizes scale the layout.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::catalog::AssetId;
use crate::error::ShareError;
use crate::generate::FaceParts;

/// Folder under the cache directory that holds snapshots.
pub const SNAPSHOT_DIR: &str = "images";
/// Snapshot file name; every share overwrites the previous one.
pub const SNAPSHOT_FILE: &str = "friend_image.png";
pub const PNG_MIME: &str = "image/png";
pub const CHOOSER_TITLE: &str = "Share your friend via";
/// Message shown to the user when sharing fails.
pub const SHARE_FAILED_NOTICE: &str = "Failed to share image.";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Side length of the reference canvas the layout is expressed in.
pub const CANVAS_SIZE: u32 = 300;

/// Position and size of one face slot on the reference canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    x: u32,
    y: u32,
    size: u32,
}

const HEAD: Slot = Slot { x: 50, y: 50, size: 200 };
const LEFT_EYE: Slot = Slot { x: 100, y: 115, size: 50 };
const RIGHT_EYE: Slot = Slot { x: 150, y: 115, size: 50 };
const MOUTH: Slot = Slot { x: 110, y: 150, size: 80 };

// ============================================================================
// Rendering
// ============================================================================

/// Turns a face into encoded PNG bytes.
///
/// Rendering may decode files and encode images, so async callers go
/// through [`render_blocking`] rather than calling it directly.
pub trait FaceRenderer: Send + Sync {
    fn render(&self, face: &FaceParts) -> Result<Vec<u8>, ShareError>;
}

/// Run `renderer` on Tokio's blocking pool.
///
/// ## Errors
///
/// Whatever the renderer returns, or [`ShareError::Task`] if the render
/// task panicked or was cancelled.
pub async fn render_blocking<R>(renderer: &R, face: &FaceParts) -> Result<Vec<u8>, ShareError>
where
    R: FaceRenderer + Clone + 'static,
{
    let renderer = renderer.clone();
    let face = face.clone();
    tokio::task::spawn_blocking(move || renderer.render(&face)).await?
}

/// Composes face parts with the `image` crate.
///
/// PNG assets (from an asset folder or a file handle) are decoded and
/// scaled into their slot. Anything else (bundled handles, vector files) is
/// drawn as a disc whose colour is derived from the asset key, so the same
/// part always looks the same.
#[derive(Debug, Clone, Copy)]
pub struct ImageCompositor {
    size: u32,
}

impl Default for ImageCompositor {
    fn default() -> Self {
        Self { size: CANVAS_SIZE }
    }
}

impl ImageCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render onto a `size`×`size` canvas instead of the reference size.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Compose the face without encoding it.
    pub fn compose(&self, face: &FaceParts) -> Result<RgbaImage, ShareError> {
        let mut canvas = RgbaImage::from_pixel(self.size, self.size, Rgba([255, 255, 255, 255]));

        for (slot, asset) in [
            (HEAD, &face.head),
            (LEFT_EYE, &face.left_eye),
            (RIGHT_EYE, &face.right_eye),
            (MOUTH, &face.mouth),
        ] {
            self.draw(&mut canvas, self.scale(slot), asset)?;
        }
        Ok(canvas)
    }

    fn scale(&self, slot: Slot) -> Slot {
        let scale = |v: u32| (u64::from(v) * u64::from(self.size) / u64::from(CANVAS_SIZE)) as u32;
        Slot {
            x: scale(slot.x),
            y: scale(slot.y),
            size: scale(slot.size).max(1),
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, slot: Slot, asset: &AssetId) -> Result<(), ShareError> {
        match asset.path().filter(|path| is_png(path)) {
            Some(path) => {
                let part = image::open(path)?
                    .resize_exact(slot.size, slot.size, FilterType::Triangle)
                    .to_rgba8();
                imageops::overlay(canvas, &part, i64::from(slot.x), i64::from(slot.y));
            }
            None => draw_disc(canvas, slot, placeholder_color(&asset.key())),
        }
        Ok(())
    }
}

impl FaceRenderer for ImageCompositor {
    fn render(&self, face: &FaceParts) -> Result<Vec<u8>, ShareError> {
        let canvas = self.compose(face)?;
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        debug!(bytes = png.len(), size = self.size, "rendered friend snapshot");
        Ok(png)
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn placeholder_color(key: &str) -> Rgba<u8> {
    let hash = key
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = hash.to_le_bytes();
    // Keep discs away from the white background.
    Rgba([r / 2 + 32, g / 2 + 32, b / 2 + 32, 255])
}

fn draw_disc(canvas: &mut RgbaImage, slot: Slot, color: Rgba<u8>) {
    let radius = f64::from(slot.size) / 2.0;
    let cx = f64::from(slot.x) + radius;
    let cy = f64::from(slot.y) + radius;

    for y in slot.y..(slot.y + slot.size).min(canvas.height()) {
        for x in slot.x..(slot.x + slot.size).min(canvas.width()) {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

// ============================================================================
// Sharing
// ============================================================================

/// What is handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareIntent {
    pub path: PathBuf,
    pub mime: &'static str,
    pub chooser_title: &'static str,
}

/// The platform side of sharing (a share sheet, a clipboard, a printer).
pub trait ShareTarget: Send + Sync {
    fn dispatch(&self, intent: &ShareIntent) -> Result<(), ShareError>;
}

/// Where a snapshot for `cache_dir` is written.
pub fn snapshot_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(SNAPSHOT_DIR).join(SNAPSHOT_FILE)
}

/// Write PNG bytes to the snapshot location, replacing any previous one.
///
/// The bytes go to a temporary file in the same folder first, are flushed
/// to disk and are then renamed into place, so readers never see a
/// half-written image.
///
/// ## Errors
///
/// Returns [`ShareError::NotPng`] if `png` lacks the PNG signature and
/// [`ShareError::Write`] if the cache folder cannot be written.
pub async fn write_snapshot(cache_dir: &Path, png: &[u8]) -> Result<PathBuf, ShareError> {
    if !png.starts_with(&PNG_SIGNATURE) {
        return Err(ShareError::NotPng);
    }

    let path = snapshot_path(cache_dir);
    let parent = cache_dir.join(SNAPSHOT_DIR);
    tokio::fs::create_dir_all(&parent).await?;

    let temp_path = parent.join(format!(
        ".odd-friend-tmp-{}-{}.tmp",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    if let Err(err) = write_synced(&temp_path, png).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&temp_path, &path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(err.into());
    }

    debug!(path = %path.display(), bytes = png.len(), "snapshot written");
    Ok(path)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Write the snapshot and dispatch it to `target`.
pub async fn share_snapshot(
    cache_dir: &Path,
    png: &[u8],
    target: &dyn ShareTarget,
) -> Result<ShareIntent, ShareError> {
    let path = write_snapshot(cache_dir, png).await?;
    let intent = ShareIntent {
        path,
        mime: PNG_MIME,
        chooser_title: CHOOSER_TITLE,
    };
    target.dispatch(&intent)?;
    info!(path = %intent.path.display(), "snapshot shared");
    Ok(intent)
}

// ============================================================================
// Tests
// ============================================================================
