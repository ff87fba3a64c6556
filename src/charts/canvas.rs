//! Raster drawing surface used by both charts.
//!
//! Layouts are expressed in chart units with the origin in the bottom-left
//! corner, the way plotting libraries usually address an axis. The canvas maps
//! those units onto an RGB pixel buffer.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut, draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rusttype::{point, Font, Scale};

use crate::error::{ReportError, Result};
use crate::fonts::RasterFonts;

pub const WHITE: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
pub const GRAY: Rgb<u8> = Rgb([0x80, 0x80, 0x80]);
pub const PRIMARY: Rgb<u8> = Rgb([0x00, 0xA6, 0x51]);
pub const SECONDARY: Rgb<u8> = Rgb([0x19, 0x76, 0xD2]);
pub const ACCENT: Rgb<u8> = Rgb([0xFF, 0x6B, 0x35]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Horizontal anchoring of a text mark relative to its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

/// A single line of text placed at `(x, y)` in chart units, vertically centred.
#[derive(Clone, Debug, PartialEq)]
pub struct TextMark {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Font size in points.
    pub size: f32,
    pub weight: Weight,
    pub color: Rgb<u8>,
    pub anchor: Anchor,
}

impl TextMark {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            weight: Weight::Regular,
            color: BLACK,
            anchor: Anchor::Center,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = Weight::Bold;
        self
    }

    pub fn colored(mut self, color: Rgb<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

/// A rounded, optionally outlined rectangle. `(x, y)` is its bottom-left corner.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxMark {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Rgb<u8>,
    pub edge: Rgb<u8>,
    /// Outline thickness in pixels; zero disables the outline.
    pub edge_px: i32,
    pub corner_px: i32,
}

pub struct Canvas {
    image: RgbImage,
    units_x: f32,
    units_y: f32,
    dpi: f32,
}

impl Canvas {
    /// Creates a white canvas of `width_px` x `height_px` covering
    /// `units_x` x `units_y` chart units. `dpi` converts point sizes to pixels.
    pub fn new(width_px: u32, height_px: u32, units_x: f32, units_y: f32, dpi: f32) -> Self {
        Self {
            image: RgbImage::from_pixel(width_px, height_px, WHITE),
            units_x,
            units_y,
            dpi,
        }
    }

    pub fn px_x(&self, x: f32) -> f32 {
        x / self.units_x * self.image.width() as f32
    }

    pub fn px_y(&self, y: f32) -> f32 {
        (self.units_y - y) / self.units_y * self.image.height() as f32
    }

    fn font_px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    fn fill_rounded(&mut self, left: i32, top: i32, right: i32, bottom: i32, radius: i32, color: Rgb<u8>) {
        let width = right - left;
        let height = bottom - top;
        if width <= 0 || height <= 0 {
            return;
        }
        let radius = radius.min(width / 2).min(height / 2).max(0);

        if height - 2 * radius > 0 {
            let band = Rect::at(left, top + radius).of_size(width as u32, (height - 2 * radius) as u32);
            draw_filled_rect_mut(&mut self.image, band, color);
        }
        if width - 2 * radius > 0 {
            let band = Rect::at(left + radius, top).of_size((width - 2 * radius) as u32, height as u32);
            draw_filled_rect_mut(&mut self.image, band, color);
        }
        if radius > 0 {
            for center in [
                (left + radius, top + radius),
                (right - radius - 1, top + radius),
                (left + radius, bottom - radius - 1),
                (right - radius - 1, bottom - radius - 1),
            ] {
                draw_filled_circle_mut(&mut self.image, center, radius, color);
            }
        }
    }

    pub fn draw_box(&mut self, mark: &BoxMark) {
        let left = self.px_x(mark.x).round() as i32;
        let right = self.px_x(mark.x + mark.width).round() as i32;
        let top = self.px_y(mark.y + mark.height).round() as i32;
        let bottom = self.px_y(mark.y).round() as i32;

        if mark.edge_px > 0 {
            self.fill_rounded(left, top, right, bottom, mark.corner_px, mark.edge);
            let inset = mark.edge_px;
            self.fill_rounded(
                left + inset,
                top + inset,
                right - inset,
                bottom - inset,
                mark.corner_px - inset,
                mark.fill,
            );
        } else {
            self.fill_rounded(left, top, right, bottom, mark.corner_px, mark.fill);
        }
    }

    pub fn draw_text(&mut self, mark: &TextMark, fonts: &RasterFonts) {
        let font = match mark.weight {
            Weight::Regular => &fonts.regular,
            Weight::Bold => &fonts.bold,
        };
        let scale = Scale::uniform(self.font_px(mark.size));
        let (width, height) = measure_text(font, scale, &mark.text);

        let anchor_x = self.px_x(mark.x);
        let left = match mark.anchor {
            Anchor::Left => anchor_x,
            Anchor::Center => anchor_x - width / 2.0,
            Anchor::Right => anchor_x - width,
        };
        let top = self.px_y(mark.y) - height / 2.0;

        draw_text_mut(
            &mut self.image,
            mark.color,
            left.max(0.0).round() as u32,
            top.max(0.0).round() as u32,
            scale,
            font,
            &mark.text,
        );
    }

    /// Fills a polygon given in pixel coordinates.
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb<u8>) {
        let mut poly: Vec<Point<i32>> = Vec::with_capacity(points.len());
        for &(x, y) in points {
            let next = Point::new(x.round() as i32, y.round() as i32);
            if poly.last() != Some(&next) {
                poly.push(next);
            }
        }
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() >= 3 {
            draw_polygon_mut(&mut self.image, &poly, color);
        }
    }

    /// Fills a circle given in pixel coordinates.
    pub fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgb<u8>) {
        draw_filled_circle_mut(
            &mut self.image,
            (center.0.round() as i32, center.1.round() as i32),
            radius.round() as i32,
            color,
        );
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Writes the canvas as a PNG, replacing any existing file.
    pub fn save(self, path: &Path) -> Result<()> {
        self.image.save(path).map_err(|err| match err {
            image::ImageError::IoError(source) => ReportError::io(path, source),
            other => ReportError::from(other),
        })
    }
}

/// Width and line height of `text` in pixels.
pub fn measure_text(font: &Font<'_>, scale: Scale, text: &str) -> (f32, f32) {
    let metrics = font.v_metrics(scale);
    let width = font
        .layout(text, scale, point(0.0, metrics.ascent))
        .fold(0.0f32, |width, glyph| {
            width.max(glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        });
    (width, metrics.ascent - metrics.descent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_map_with_bottom_left_origin() {
        let canvas = Canvas::new(1000, 800, 10.0, 8.0, 100.0);
        assert_eq!(canvas.px_x(0.0), 0.0);
        assert_eq!(canvas.px_x(5.0), 500.0);
        assert_eq!(canvas.px_y(8.0), 0.0);
        assert_eq!(canvas.px_y(0.0), 800.0);
    }

    #[test]
    fn outlined_box_keeps_fill_inside_edge() {
        let mut canvas = Canvas::new(100, 100, 10.0, 10.0, 72.0);
        canvas.draw_box(&BoxMark {
            x: 1.0,
            y: 1.0,
            width: 8.0,
            height: 8.0,
            fill: PRIMARY,
            edge: SECONDARY,
            edge_px: 2,
            corner_px: 0,
        });
        let image = canvas.into_image();
        assert_eq!(*image.get_pixel(50, 50), PRIMARY);
        assert_eq!(*image.get_pixel(10, 50), SECONDARY);
        assert_eq!(*image.get_pixel(5, 5), WHITE);
    }

    #[test]
    fn degenerate_polygon_is_ignored() {
        let mut canvas = Canvas::new(20, 20, 20.0, 20.0, 72.0);
        canvas.fill_polygon(&[(1.0, 1.0), (1.2, 1.1), (1.0, 1.0)], ACCENT);
        assert!(canvas.into_image().pixels().all(|pixel| *pixel == WHITE));
    }
}
