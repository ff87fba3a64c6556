//! Pie chart of compute instances by type code.

use std::f32::consts::PI;
use std::path::Path;

use image::Rgb;

use super::canvas::{Anchor, Canvas, TextMark};
use crate::error::Result;
use crate::fonts::RasterFonts;
use crate::inventory::Inventory;

const WIDTH_UNITS: f32 = 8.0;
const HEIGHT_UNITS: f32 = 6.0;
const WIDTH_PX: u32 = 1200;
const HEIGHT_PX: u32 = 900;
const DPI: f32 = 150.0;

const CENTER: (f32, f32) = (4.0, 2.75);
const RADIUS: f32 = 2.0;
const START_DEGREES: f32 = 90.0;

pub const TITLE: &str = "Resource Distribution by Instance Type";

/// The twelve-colour qualitative "Set3" palette.
const PALETTE: [Rgb<u8>; 12] = [
    Rgb([0x8D, 0xD3, 0xC7]),
    Rgb([0xFF, 0xFF, 0xB3]),
    Rgb([0xBE, 0xBA, 0xDA]),
    Rgb([0xFB, 0x80, 0x72]),
    Rgb([0x80, 0xB1, 0xD3]),
    Rgb([0xFD, 0xB4, 0x62]),
    Rgb([0xB3, 0xDE, 0x69]),
    Rgb([0xFC, 0xCD, 0xE5]),
    Rgb([0xD9, 0xD9, 0xD9]),
    Rgb([0xBC, 0x80, 0xBD]),
    Rgb([0xCC, 0xEB, 0xC5]),
    Rgb([0xFF, 0xED, 0x6F]),
];

/// Spreads `count` colours evenly over the palette.
fn palette_color(index: usize, count: usize) -> Rgb<u8> {
    if count <= 1 {
        return PALETTE[0];
    }
    let position = index as f32 / (count - 1) as f32;
    let slot = (position * PALETTE.len() as f32) as usize;
    PALETTE[slot.min(PALETTE.len() - 1)]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    pub label: String,
    pub count: usize,
    /// Share of all instances, in `0.0..=1.0`.
    pub share: f32,
    pub start_degrees: f32,
    pub sweep_degrees: f32,
    pub color: Rgb<u8>,
}

impl Slice {
    /// Whole-number percentage label, e.g. `67%`.
    pub fn percent_label(&self) -> String {
        format!("{:.0}%", self.share * 100.0)
    }

    fn mid_radians(&self) -> f32 {
        (self.start_degrees + self.sweep_degrees / 2.0).to_radians()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DistributionChart {
    pub slices: Vec<Slice>,
}

impl DistributionChart {
    /// Lays out one slice per distinct instance type. Returns `None` when the
    /// account has no instances, in which case no chart is drawn.
    pub fn from_inventory(inventory: &Inventory) -> Option<Self> {
        let counts = inventory.instance_type_counts();
        let total: usize = counts.iter().map(|(_, count)| count).sum();
        if total == 0 {
            return None;
        }

        let mut start = START_DEGREES;
        let slices = counts
            .iter()
            .enumerate()
            .map(|(index, (label, count))| {
                let share = *count as f32 / total as f32;
                let slice = Slice {
                    label: label.clone(),
                    count: *count,
                    share,
                    start_degrees: start,
                    sweep_degrees: share * 360.0,
                    color: palette_color(index, counts.len()),
                };
                start += slice.sweep_degrees;
                slice
            })
            .collect();

        Some(Self { slices })
    }

    fn unit_point(angle: f32, radius: f32) -> (f32, f32) {
        (CENTER.0 + radius * angle.cos(), CENTER.1 + radius * angle.sin())
    }

    /// Labels drawn around and inside the pie.
    pub fn texts(&self) -> Vec<TextMark> {
        let mut texts = vec![TextMark::new(TITLE, 4.0, 5.6, 14.0).bold()];

        for slice in &self.slices {
            let angle = slice.mid_radians();
            let (label_x, label_y) = Self::unit_point(angle, RADIUS * 1.1);
            let anchor = if angle.cos() < -1e-3 {
                Anchor::Right
            } else if angle.cos() > 1e-3 {
                Anchor::Left
            } else {
                Anchor::Center
            };
            texts.push(TextMark::new(slice.label.clone(), label_x, label_y, 10.0).anchored(anchor));

            let (pct_x, pct_y) = Self::unit_point(angle, RADIUS * 0.6);
            texts.push(TextMark::new(slice.percent_label(), pct_x, pct_y, 10.0));
        }

        texts
    }

    pub fn render(&self, fonts: &RasterFonts, path: &Path) -> Result<()> {
        let mut canvas = Canvas::new(WIDTH_PX, HEIGHT_PX, WIDTH_UNITS, HEIGHT_UNITS, DPI);
        let center = (canvas.px_x(CENTER.0), canvas.px_y(CENTER.1));
        let radius_px = canvas.px_x(RADIUS);

        for slice in &self.slices {
            if slice.sweep_degrees >= 359.999 {
                canvas.fill_circle(center, radius_px, slice.color);
                continue;
            }

            let steps = slice.sweep_degrees.ceil().max(2.0) as usize;
            let mut points = Vec::with_capacity(steps + 2);
            points.push(center);
            for step in 0..=steps {
                let degrees = slice.start_degrees + slice.sweep_degrees * step as f32 / steps as f32;
                let radians = degrees * PI / 180.0;
                // Screen y grows downwards, so counter-clockwise means subtracting the sine.
                points.push((
                    center.0 + radius_px * radians.cos(),
                    center.1 - radius_px * radians.sin(),
                ));
            }
            canvas.fill_polygon(&points, slice.color);
        }

        for text in self.texts() {
            canvas.draw_text(&text, fonts);
        }
        canvas.save(path)
    }
}
