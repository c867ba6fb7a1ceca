// SPDX-License-Identifier: MIT

//! PNG export of the shareable card.
//!
//! Runs a strictly sequential pipeline: resolve the avatar (download and
//! decode, cached per URL), rasterize the card layout at the fixed density
//! multiplier, encode the bitmap as PNG, and write the artifact. Each stage
//! propagates its error explicitly; a failed export leaves no partial file
//! because encoding happens entirely in memory before anything touches disk.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering}
    }
};

use image::{RgbaImage, imageops};
use plotters::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    card::{CardElement, CardLayout, PIXEL_DENSITY},
    client::GithubClient,
    error::{self, Error}
};

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The card was rasterized and written to the given path.
    Written(PathBuf),
    /// Another export was already running; this request was a no-op.
    SkippedInProgress
}

/// Owns the export-only mutable state: the in-progress flag that gates
/// re-entry and the decoded-avatar cache keyed by URL.
#[derive(Debug, Default)]
pub struct CardExporter {
    in_progress:  AtomicBool,
    avatar_cache: Mutex<Option<(String, RgbaImage)>>
}

impl CardExporter {
    /// Creates an exporter with no export in flight and an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an export is currently in flight.
    pub fn is_exporting(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Exports the card layout as a PNG at `output_path`.
    ///
    /// Triggering a second export while one is in flight is a no-op and
    /// reports [`ExportOutcome::SkippedInProgress`]. The in-progress flag is
    /// reset on success, failure, and early exit alike.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`](Error::Upstream) when the avatar download
    /// fails, [`Error::Render`](Error::Render) when decoding or rasterization
    /// fails, and [`Error::ExportIo`](Error::ExportIo) when the artifact
    /// cannot be written.
    pub async fn export_card(
        &self,
        client: &GithubClient,
        layout: &CardLayout,
        output_path: &Path
    ) -> Result<ExportOutcome, Error> {
        if !self.try_begin() {
            info!("Export already in progress; ignoring request");
            return Ok(ExportOutcome::SkippedInProgress);
        }

        let result = self.export_inner(client, layout, output_path).await;
        self.finish();
        result
    }

    async fn export_inner(
        &self,
        client: &GithubClient,
        layout: &CardLayout,
        output_path: &Path
    ) -> Result<ExportOutcome, Error> {
        // Avatar resolution must complete before rasterization begins.
        let avatar = match avatar_request(layout) {
            Some((url, size)) => Some(self.resolve_avatar(client, &url, size).await?),
            None => None
        };

        debug!("Rasterizing card at {}x density", PIXEL_DENSITY);
        let mut bitmap = rasterize_layout(layout)?;

        if let Some(image) = avatar {
            overlay_avatar(layout, &mut bitmap, &image);
        }

        let mut encoded = Vec::new();
        bitmap
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .map_err(|e| Error::render(format!("PNG encoding failed: {e}")))?;

        fs::write(output_path, &encoded)
            .map_err(|source| error::export_io_error(output_path, source))?;

        info!("Wrote card to {}", output_path.display());
        Ok(ExportOutcome::Written(output_path.to_path_buf()))
    }

    /// Downloads and decodes the avatar, reusing the cached copy when the
    /// URL matches the previous export.
    async fn resolve_avatar(
        &self,
        client: &GithubClient,
        url: &str,
        size: u32
    ) -> Result<RgbaImage, Error> {
        if let Some(cached) = self.cached_avatar(url) {
            debug!("Reusing cached avatar for {}", url);
            return Ok(cached);
        }

        let bytes = client.fetch_bytes(url).await?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| Error::render(format!("failed to decode avatar: {e}")))?;

        let scaled = size * PIXEL_DENSITY;
        let avatar =
            imageops::resize(&decoded.to_rgba8(), scaled, scaled, imageops::FilterType::Triangle);

        match self.avatar_cache.lock() {
            Ok(mut cache) => *cache = Some((url.to_owned(), avatar.clone())),
            Err(_) => warn!("Avatar cache poisoned; skipping cache update")
        }

        Ok(avatar)
    }

    fn cached_avatar(&self, url: &str) -> Option<RgbaImage> {
        let cache = self.avatar_cache.lock().ok()?;
        cache
            .as_ref()
            .filter(|(cached_url, _)| cached_url == url)
            .map(|(_, image)| image.clone())
    }

    /// Claims the in-progress flag; false when an export is already running.
    fn try_begin(&self) -> bool {
        self.in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Releases the in-progress flag.
    fn finish(&self) {
        self.in_progress.store(false, Ordering::SeqCst);
    }
}

/// Extracts the avatar URL and logical slot size from the layout, if any.
fn avatar_request(layout: &CardLayout) -> Option<(String, u32)> {
    layout.elements.iter().find_map(|element| match element {
        CardElement::Avatar {
            url: Some(url),
            size,
            ..
        } => Some((url.clone(), *size)),
        _ => None
    })
}

/// Rasterizes the card layout into an RGBA bitmap at the density multiplier.
///
/// Consumes exactly the instruction list the `--dry-run` mode prints; avatar
/// slots are left as placeholder tiles and composited afterwards.
///
/// # Errors
///
/// Returns [`Error::Render`](Error::Render) when the backing buffer is
/// malformed or a drawing primitive fails.
pub fn rasterize_layout(layout: &CardLayout) -> Result<RgbaImage, Error> {
    let width = layout.width * PIXEL_DENSITY;
    let height = layout.height * PIXEL_DENSITY;
    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&parse_hex_color(&layout.background))
            .map_err(|e| Error::render(format!("background fill failed: {e}")))?;

        for element in &layout.elements {
            draw_element(&root, element)?;
        }

        root.present()
            .map_err(|e| Error::render(format!("bitmap present failed: {e}")))?;
    }

    let rgb = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| Error::render("bitmap buffer size mismatch"))?;
    Ok(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
}

fn draw_element(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    element: &CardElement
) -> Result<(), Error> {
    let density = PIXEL_DENSITY as i32;

    match element {
        CardElement::Text {
            x,
            y,
            size,
            color,
            content
        } => {
            let style = ("sans-serif", (size * PIXEL_DENSITY) as f64)
                .into_font()
                .color(&parse_hex_color(color));
            root.draw(&Text::new(content.clone(), (x * density, y * density), style))
                .map_err(|e| Error::render(format!("text draw failed: {e}")))?;
        }
        CardElement::Rect {
            x,
            y,
            width,
            height,
            fill
        } => {
            draw_filled_rect(
                root,
                x * density,
                y * density,
                *width * PIXEL_DENSITY,
                *height * PIXEL_DENSITY,
                &parse_hex_color(fill)
            )?;
        }
        CardElement::Avatar {
            x,
            y,
            size,
            ..
        } => {
            // Placeholder tile; the decoded avatar is composited later.
            draw_filled_rect(
                root,
                x * density,
                y * density,
                size * PIXEL_DENSITY,
                size * PIXEL_DENSITY,
                &RGBColor(0xf6, 0xf8, 0xfa)
            )?;
        }
        CardElement::BarChart {
            x,
            y,
            width,
            height,
            color,
            values
        } => {
            draw_bars(
                root,
                x * density,
                y * density,
                *width * PIXEL_DENSITY,
                *height * PIXEL_DENSITY,
                &parse_hex_color(color),
                values
            )?;
        }
        CardElement::LineChart {
            x,
            y,
            width,
            height,
            color,
            values
        } => {
            draw_line(
                root,
                x * density,
                y * density,
                *width * PIXEL_DENSITY,
                *height * PIXEL_DENSITY,
                &parse_hex_color(color),
                values
            )?;
        }
    }

    Ok(())
}

fn draw_filled_rect(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: &RGBColor
) -> Result<(), Error> {
    root.draw(&Rectangle::new(
        [(x, y), (x + width as i32, y + height as i32)],
        color.filled()
    ))
    .map_err(|e| Error::render(format!("rect draw failed: {e}")))
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: &RGBColor,
    values: &[u32]
) -> Result<(), Error> {
    let Some(max) = values.iter().copied().max().filter(|max| *max > 0) else {
        return Ok(());
    };

    let slot = f64::from(width) / values.len() as f64;
    let bar_width = slot.floor().max(1.0) as u32;

    for (index, value) in values.iter().enumerate() {
        if *value == 0 {
            continue;
        }
        let bar_height = (f64::from(*value) / f64::from(max) * f64::from(height)).ceil() as u32;
        let bar_x = x + (index as f64 * slot) as i32;
        let bar_y = y + (height - bar_height) as i32;
        draw_filled_rect(root, bar_x, bar_y, bar_width, bar_height, color)?;
    }

    Ok(())
}

fn draw_line(
    root: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: &RGBColor,
    values: &[u64]
) -> Result<(), Error> {
    let Some(max) = values.iter().copied().max().filter(|max| *max > 0) else {
        return Ok(());
    };

    let step = if values.len() > 1 {
        f64::from(width) / (values.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<(i32, i32)> = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let px = x + (index as f64 * step) as i32;
            let py = y + height as i32
                - (*value as f64 / max as f64 * f64::from(height)).round() as i32;
            (px, py)
        })
        .collect();

    root.draw(&PathElement::new(points, color.stroke_width(2 * PIXEL_DENSITY)))
        .map_err(|e| Error::render(format!("line draw failed: {e}")))
}

/// Composites the decoded avatar over its slot in the rasterized bitmap.
fn overlay_avatar(layout: &CardLayout, bitmap: &mut RgbaImage, avatar: &RgbaImage) {
    for element in &layout.elements {
        if let CardElement::Avatar {
            x,
            y,
            ..
        } = element
        {
            let density = i64::from(PIXEL_DENSITY);
            imageops::overlay(bitmap, avatar, i64::from(*x) * density, i64::from(*y) * density);
            return;
        }
    }
}

/// Parses a `#rrggbb` hex color, falling back to black on malformed input.
fn parse_hex_color(hex: &str) -> RGBColor {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return RGBColor(0, 0, 0);
    }

    let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (parse(0..2), parse(2..4), parse(4..6)) {
        (Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
        _ => RGBColor(0, 0, 0)
    }
}
