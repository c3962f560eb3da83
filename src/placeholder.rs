//! Placeholder image composition
//!
//! A placeholder is a solid background with its own dimensions (`"640 x 480"`)
//! drawn in the middle. The label is rasterized at the bitmap font's native
//! size, then scaled uniformly so it spans a fraction of the canvas width.

use crate::font::{BitmapFont, TextBounds};
use anyhow::{bail, Context, Result};
use image::{
    codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    imageops::{self, FilterType},
    ColorType, ImageEncoder, Rgba, RgbaImage,
};
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// Label height used when neither the text nor the font report one
pub const FALLBACK_LINE_HEIGHT: u32 = 13;

/// Default share of the canvas width taken by the label
pub const DEFAULT_FIT_FRACTION: f64 = 0.5;

/// The label is never scaled narrower than this
pub const MIN_TEXT_WIDTH: f64 = 10.0;

/// Largest side a PNG can store
pub const MAX_PNG_DIMENSION: u32 = i32::MAX as u32;

/// Controls how large the label is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Target label width as a fraction of the canvas width
    pub fit_fraction: f64,
    /// Lower bound for the scaled label width, in pixels
    pub min_text_width: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            fit_fraction: DEFAULT_FIT_FRACTION,
            min_text_width: MIN_TEXT_WIDTH,
        }
    }
}

/// Everything needed to produce one placeholder image
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderConfig {
    width: u32,
    height: u32,
    bg_color: Rgba<u8>,
    text_color: Rgba<u8>,
    output: PathBuf,
    fit: FitOptions,
}

impl PlaceholderConfig {
    pub fn new(
        width: u32,
        height: u32,
        bg_color: Rgba<u8>,
        text_color: Rgba<u8>,
        output: impl Into<PathBuf>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Width and height must be greater than 0 (got {width}x{height})");
        }
        if width > MAX_PNG_DIMENSION || height > MAX_PNG_DIMENSION {
            bail!(
                "Image {width}x{height} is too large, PNG sides are limited to {MAX_PNG_DIMENSION} pixels"
            );
        }

        // RGBA8 canvas size must be addressable in a single allocation
        let canvas_bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if canvas_bytes.is_none() {
            bail!("Image {width}x{height} is too large to allocate");
        }

        Ok(Self {
            width,
            height,
            bg_color,
            text_color,
            output: output.into(),
            fit: FitOptions::default(),
        })
    }

    pub fn with_fit(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bg_color(&self) -> Rgba<u8> {
        self.bg_color
    }

    pub fn text_color(&self) -> Rgba<u8> {
        self.text_color
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn fit(&self) -> FitOptions {
        self.fit
    }

    /// The label drawn on the image, e.g. `"640 x 480"`
    pub fn label(&self) -> String {
        format!("{} x {}", self.width, self.height)
    }
}

/// Native size of a measured label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    pub bounds: TextBounds,
    pub width: u32,
    pub height: u32,
}

/// Where and how large the label lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    /// Left edge; negative when the label is wider than the canvas
    pub x: i64,
    /// Top edge; negative when the label is taller than the canvas
    pub y: i64,
}

/// Measure `text` at the font's native size. Both dimensions are at least 1.
pub fn measure_text(font: &dyn BitmapFont, text: &str) -> TextMetrics {
    let bounds = font.bound_string(text);

    let width = bounds.width().max(1) as u32;
    let height = match bounds.height() {
        h if h > 0 => h as u32,
        _ => match font.line_height() {
            0 => FALLBACK_LINE_HEIGHT,
            line_height => line_height,
        },
    };

    TextMetrics {
        bounds,
        width,
        height,
    }
}

/// Rasterize `text` onto a transparent bitmap sized to its measured bounds.
///
/// Transparent pixels carry the text color with zero alpha so resampling
/// does not bleed a foreign color into the glyph edges.
pub fn render_text_bitmap(
    font: &dyn BitmapFont,
    text: &str,
    metrics: &TextMetrics,
    color: Rgba<u8>,
) -> RgbaImage {
    let Rgba([r, g, b, _]) = color;
    let mut bitmap = RgbaImage::from_pixel(metrics.width, metrics.height, Rgba([r, g, b, 0]));

    // Baseline origin so that the bounds' top-left corner lands on (0, 0)
    let mut dot_x = -i64::from(metrics.bounds.min_x);
    let dot_y = -i64::from(metrics.bounds.min_y);
    let top = dot_y - i64::from(font.ascent());

    for ch in text.chars() {
        if let Some(glyph) = font.glyph(ch) {
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    if !glyph.is_set(gx, gy) {
                        continue;
                    }
                    let x = dot_x + i64::from(gx);
                    let y = top + i64::from(gy);
                    if (0..i64::from(bitmap.width())).contains(&x)
                        && (0..i64::from(bitmap.height())).contains(&y)
                    {
                        bitmap.put_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
        dot_x += i64::from(font.advance());
    }

    bitmap
}

/// Scale a label of native size `text_width`x`text_height` to fit a canvas and center it
pub fn fit_text(
    canvas_width: u32,
    canvas_height: u32,
    text_width: u32,
    text_height: u32,
    fit: FitOptions,
) -> TextLayout {
    let native_width = f64::from(text_width.max(1));
    let native_height = f64::from(text_height.max(1));

    let target_width = (f64::from(canvas_width) * fit.fit_fraction)
        .max(native_width)
        .max(fit.min_text_width);

    let scale = match target_width / native_width {
        s if s.is_finite() && s > 0.0 => s,
        _ => 1.0,
    };

    let width = ((native_width * scale).round() as u32).max(1);
    let height = ((native_height * scale).round() as u32).max(1);

    TextLayout {
        scale,
        width,
        height,
        x: (i64::from(canvas_width) - i64::from(width)) / 2,
        y: (i64::from(canvas_height) - i64::from(height)) / 2,
    }
}

/// Compose the placeholder image described by `config`
pub fn render_placeholder(config: &PlaceholderConfig, font: &dyn BitmapFont) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(config.width, config.height, config.bg_color);

    let label = config.label();
    let metrics = measure_text(font, &label);
    let bitmap = render_text_bitmap(font, &label, &metrics, config.text_color);

    let layout = fit_text(
        config.width,
        config.height,
        metrics.width,
        metrics.height,
        config.fit,
    );
    log::debug!(
        "label {label:?}: native {}x{}, scale {:.3}, placed {}x{} at ({}, {})",
        metrics.width,
        metrics.height,
        layout.scale,
        layout.width,
        layout.height,
        layout.x,
        layout.y
    );

    // Label overflow is clipped by the overlay, not clamped
    let scaled = imageops::resize(&bitmap, layout.width, layout.height, FilterType::Triangle);
    imageops::overlay(&mut canvas, &scaled, layout.x, layout.y);

    canvas
}

/// Encode an RGBA image as PNG
pub fn write_png<W: Write>(image: &RgbaImage, w: W) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)?;
    Ok(())
}

/// Write `image` as a PNG file.
///
/// The PNG is written to a temporary file next to `path` and renamed over it
/// only once fully flushed, so a failed write leaves the target untouched.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create file {}", path.display()))?;

    let mut out_file = BufWriter::new(tmp.as_file());
    write_png(image, &mut out_file).context("Failed to encode PNG")?;
    out_file.flush().context("Failed to write PNG")?;
    drop(out_file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .context("Failed to set PNG permissions")?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write file {}", path.display()))?;
    Ok(())
}

/// Render the placeholder and write it to the configured output path
pub fn generate_placeholder(
    config: &PlaceholderConfig,
    font: &dyn BitmapFont,
) -> Result<RgbaImage> {
    let image = render_placeholder(config, font);
    save_png(&image, &config.output)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Glyph;

    /// Every glyph is a solid block; handy for predictable ink
    struct BlockFont {
        advance: u32,
        ascent: u32,
        descent: u32,
    }

    impl BitmapFont for BlockFont {
        fn advance(&self) -> u32 {
            self.advance
        }

        fn ascent(&self) -> u32 {
            self.ascent
        }

        fn descent(&self) -> u32 {
            self.descent
        }

        fn glyph(&self, ch: char) -> Option<Glyph> {
            if ch == ' ' {
                return None;
            }
            let (width, height) = (self.advance, self.line_height());
            Some(Glyph {
                width,
                height,
                bits: vec![true; (width * height) as usize],
            })
        }
    }

    const BLOCK: BlockFont = BlockFont {
        advance: 4,
        ascent: 6,
        descent: 2,
    };

    const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_config_rejects_zero_dimensions() {
        assert!(PlaceholderConfig::new(0, 10, GREY, WHITE, "a.png").is_err());
        assert!(PlaceholderConfig::new(10, 0, GREY, WHITE, "a.png").is_err());
        assert!(PlaceholderConfig::new(1, 1, GREY, WHITE, "a.png").is_ok());
    }

    #[test]
    fn test_config_rejects_oversized_dimensions() {
        for (width, height) in [
            (u32::MAX, 1),
            (1, MAX_PNG_DIMENSION + 1),
            (4_000_000_000, 4_000_000_000),
            (MAX_PNG_DIMENSION, MAX_PNG_DIMENSION),
        ] {
            let err = PlaceholderConfig::new(width, height, GREY, WHITE, "a.png").unwrap_err();
            assert!(
                err.to_string().contains("too large"),
                "{width}x{height}: unexpected error {err}"
            );
        }

        assert!(PlaceholderConfig::new(10_000, 10_000, GREY, WHITE, "a.png").is_ok());
    }

    #[test]
    fn test_label() {
        let config = PlaceholderConfig::new(640, 480, GREY, WHITE, "a.png").unwrap();
        assert_eq!(config.label(), "640 x 480");
        assert_eq!(config.fit(), FitOptions::default());
    }

    #[test]
    fn test_measure_text() {
        let metrics = measure_text(&BLOCK, "12 x 34");
        assert_eq!(metrics.width, 28);
        assert_eq!(metrics.height, 8);
        assert_eq!(metrics.bounds.min_y, -6);
    }

    #[test]
    fn test_measure_degenerate_text_uses_line_height() {
        let metrics = measure_text(&BLOCK, "");
        assert_eq!((metrics.width, metrics.height), (1, 8));

        let empty_font = BlockFont {
            advance: 0,
            ascent: 0,
            descent: 0,
        };
        let metrics = measure_text(&empty_font, "1 x 1");
        assert_eq!((metrics.width, metrics.height), (1, FALLBACK_LINE_HEIGHT));
    }

    #[test]
    fn test_render_text_bitmap_places_ink_at_origin() {
        let metrics = measure_text(&BLOCK, "1 2");
        let bitmap = render_text_bitmap(&BLOCK, "1 2", &metrics, WHITE);

        assert_eq!(bitmap.dimensions(), (12, 8));
        assert_eq!(*bitmap.get_pixel(0, 0), WHITE);
        assert_eq!(*bitmap.get_pixel(3, 7), WHITE);
        // Space leaves a transparent gap in the text color
        assert_eq!(*bitmap.get_pixel(5, 3), Rgba([255, 255, 255, 0]));
        assert_eq!(*bitmap.get_pixel(11, 7), WHITE);
    }

    #[test]
    fn test_fit_text_uses_fraction_of_width() {
        let layout = fit_text(640, 480, 54, 12, FitOptions::default());
        assert_eq!(layout.width, 320);
        assert_eq!(layout.height, 71);
        assert_eq!(layout.x, 160);
        assert_eq!(layout.y, 204);

        let wide = FitOptions {
            fit_fraction: 0.7,
            ..FitOptions::default()
        };
        assert_eq!(fit_text(640, 480, 54, 12, wide).width, 448);
    }

    #[test]
    fn test_fit_text_never_shrinks_below_native() {
        let layout = fit_text(100, 20, 48, 12, FitOptions::default());
        assert_eq!((layout.width, layout.height), (50, 13));
        assert_eq!((layout.x, layout.y), (25, 3));

        let layout = fit_text(40, 40, 48, 12, FitOptions::default());
        assert_eq!(layout.scale, 1.0);
        assert_eq!((layout.width, layout.height), (48, 12));
        assert_eq!((layout.x, layout.y), (-4, 14));
    }

    #[test]
    fn test_fit_text_minimum_width() {
        let layout = fit_text(4, 4, 2, 2, FitOptions::default());
        assert_eq!(layout.width, 10);
        assert_eq!(layout.height, 10);
        assert_eq!((layout.x, layout.y), (-3, -3));
    }

    #[test]
    fn test_fit_text_guards_degenerate_fraction() {
        let zero = FitOptions {
            fit_fraction: 0.0,
            min_text_width: 0.0,
        };
        let layout = fit_text(100, 100, 0, 0, zero);
        assert_eq!(layout.scale, 1.0);
        assert_eq!((layout.width, layout.height), (1, 1));

        let nan = FitOptions {
            fit_fraction: f64::NAN,
            min_text_width: f64::NAN,
        };
        assert_eq!(fit_text(100, 100, 20, 10, nan).scale, 1.0);
    }

    #[test]
    fn test_fit_text_is_centered() {
        for (w, h) in [(1, 1), (7, 3), (100, 20), (333, 777), (640, 480), (1921, 1079)] {
            let layout = fit_text(w, h, 54, 12, FitOptions::default());
            let mid_x = layout.x as f64 + layout.width as f64 / 2.0;
            let mid_y = layout.y as f64 + layout.height as f64 / 2.0;
            assert!((mid_x - w as f64 / 2.0).abs() <= 1.0, "{w}x{h}: {layout:?}");
            assert!((mid_y - h as f64 / 2.0).abs() <= 1.0, "{w}x{h}: {layout:?}");
        }
    }

    #[test]
    fn test_render_placeholder_dimensions_and_background() {
        let config = PlaceholderConfig::new(200, 100, GREY, WHITE, "unused.png").unwrap();
        let image = render_placeholder(&config, &BLOCK);

        assert_eq!(image.dimensions(), (200, 100));
        assert_eq!(*image.get_pixel(0, 0), GREY);
        assert_eq!(*image.get_pixel(199, 99), GREY);
        assert_eq!(*image.get_pixel(100, 50), WHITE);
    }

    #[test]
    fn test_render_placeholder_is_deterministic() {
        let config = PlaceholderConfig::new(123, 45, GREY, WHITE, "unused.png").unwrap();
        assert_eq!(
            render_placeholder(&config, &BLOCK),
            render_placeholder(&config, &BLOCK)
        );
    }

    #[test]
    fn test_write_png_produces_decodable_image() {
        let config = PlaceholderConfig::new(30, 20, GREY, WHITE, "unused.png").unwrap();
        let image = render_placeholder(&config, &BLOCK);

        let mut buf = Vec::new();
        write_png(&image, &mut buf).unwrap();
        assert_eq!(&buf[1..4], b"PNG");

        let decoded = image::load_from_memory(&buf).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    /// Writer that fails like a full disk
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "No space left on device",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_png_reports_writer_errors() {
        let config = PlaceholderConfig::new(30, 20, GREY, WHITE, "unused.png").unwrap();
        let image = render_placeholder(&config, &BLOCK);

        assert!(write_png(&image, FullDisk).is_err());
    }
}
