//! Terminal preview of the selected image.
//!
//! Supports the graphics protocols ratatui-image detects (Kitty, Sixel,
//! iTerm2) with Unicode half-blocks as the fallback.

#[cfg(unix)]
use std::time::Duration;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use ratatui_image::picker::{Picker, ProtocolType};
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;
use ratatui_image::protocol::StatefulProtocol;

#[cfg(unix)]
const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Create a picker for terminal image rendering.
///
/// Must run before the terminal enters raw mode, since it queries stdio.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        tracing::debug!("preview protocol forced to halfblocks");
        return Some(Picker::halfblocks());
    }

    // The stdio query can leave a reader thread stuck on the Windows console.
    #[cfg(not(unix))]
    {
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        match Picker::from_query_stdio_with_options(query_options()) {
            Ok(picker) => {
                tracing::debug!(protocol = ?picker.protocol_type(), "terminal graphics detected");
                Some(picker)
            }
            Err(err) => {
                tracing::warn!("terminal graphics query failed: {err}");
                None
            }
        }
    }
}

/// Decode `bytes` and build a resizable protocol for the preview pane.
///
/// Returns `None` when the image cannot be decoded (SVG, HEIC, corrupt data);
/// the UI then shows a placeholder instead.
pub fn build_protocol(picker: &Picker, bytes: &[u8]) -> Option<StatefulProtocol> {
    let mut img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(err) => {
            tracing::debug!("preview decode failed: {err}");
            return None;
        }
    };
    if matches!(picker.protocol_type(), ProtocolType::Halfblocks) && !supports_truecolor_terminal()
    {
        img = quantize_to_ansi256(&img);
    }
    Some(picker.new_resize_protocol(img))
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if let Ok(force) = std::env::var("SCANLENS_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

/// Quantize image RGB channels to the ANSI-256 color cube, keeping alpha.
pub fn quantize_to_ansi256(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let mut out = RgbaImage::new(width, height);
    let src = image.to_rgba8();

    for (x, y, px) in src.enumerate_pixels() {
        let (r, g, b) = cube_to_rgb(rgb_to_cube(px[0], px[1], px[2]));
        out.put_pixel(x, y, Rgba([r, g, b, px[3]]));
    }

    DynamicImage::ImageRgba8(out)
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    term.is_some_and(|t| {
        let lower = t.to_ascii_lowercase();
        lower.contains("direct") || lower.contains("truecolor")
    })
}

/// Index into the 6x6x6 cube (16..=231).
pub(crate) fn rgb_to_cube(r: u8, g: u8, b: u8) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    let level = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

fn cube_to_rgb(index: u8) -> (u8, u8, u8) {
    let i = index.saturating_sub(16);
    let value = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
    (value((i / 36) % 6), value((i / 6) % 6), value(i % 6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_picker_query_timeout_is_fast() {
        let options = query_options();
        assert_eq!(options.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_supports_truecolor_from_env_detects_24bit() {
        assert!(supports_truecolor_from_env(
            Some("truecolor"),
            Some("xterm-256color")
        ));
        assert!(supports_truecolor_from_env(Some("24BIT"), Some("screen")));
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_quantize_to_ansi256_preserves_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([12, 34, 56, 77])));
        let quantized = quantize_to_ansi256(&image).to_rgba8();
        assert_eq!(quantized.get_pixel(0, 0)[3], 77);
    }

    #[test]
    fn test_cube_extremes() {
        assert_eq!(cube_to_rgb(rgb_to_cube(0, 0, 0)), (0, 0, 0));
        assert_eq!(cube_to_rgb(rgb_to_cube(255, 255, 255)), (255, 255, 255));
    }

    #[test]
    fn test_undecodable_bytes_have_no_protocol() {
        let picker = Picker::halfblocks();
        assert!(build_protocol(&picker, b"not an image").is_none());
    }

    #[test]
    fn test_png_builds_protocol() {
        let mut bytes = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 255])))
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        let picker = Picker::halfblocks();
        assert!(build_protocol(&picker, bytes.get_ref()).is_some());
    }
}
