//! Custom `genpdf` elements used by the report.
//!
//! `genpdf` ships neither filled table cells nor width-constrained images, so
//! this module adds a [`GridTable`] that lays out and paints its rows itself,
//! a [`FigureImage`] that scales a decoded chart to a fixed width, and a
//! fixed-height [`VerticalSpace`].

use std::path::Path;

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::model::TableBlock;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const CELL_PADDING_MM: f64 = 1.5;

const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);
const BLACK: Color = Color::Rgb(0x00, 0x00, 0x00);

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

fn rgb_components(color: Color) -> [u8; 3] {
    match color {
        Color::Rgb(r, g, b) => [r, g, b],
        Color::Greyscale(level) => [level, level, level],
        Color::Cmyk(c, m, y, k) => {
            let channel = |value: u8| {
                let white = 1.0 - f64::from(k) / 255.0;
                (255.0 * (1.0 - f64::from(value) / 255.0) * white).round() as u8
            };
            [channel(c), channel(m), channel(y)]
        }
    }
}

/// Paints a solid rectangle by stretching a single RGB pixel over it.
fn fill_rect(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    origin: Position,
    size: Size,
    color: Color,
) -> Result<(), Error> {
    let pixel = image::RgbImage::from_pixel(1, 1, image::Rgb(rgb_components(color)));
    let mut swatch = Image::from_dynamic_image(image::DynamicImage::ImageRgb8(pixel))?;
    let pixel_mm = MM_PER_INCH / DEFAULT_IMAGE_DPI;
    swatch.set_scale(Scale::new(
        mm_to_f64(size.width) / pixel_mm,
        mm_to_f64(size.height) / pixel_mm,
    ));

    let mut target = area.clone();
    target.add_offset(origin);
    swatch.render(context, target, Style::new())?;
    Ok(())
}

/// Greedy word wrap of `text` into lines no wider than `max_width` millimetres.
/// A single word wider than the cell stays on its own line.
fn wrap_text(font_cache: &genpdf::fonts::FontCache, text: &str, style: Style, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        let width = mm_to_f64(StyledString::new(candidate.clone(), style).width(font_cache));
        if current.is_empty() || width <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct LaidOutRow {
    cells: Vec<Vec<String>>,
    style: Style,
    fill: Color,
    line_height: f64,
    height: f64,
}

/// A centred, bordered table whose header row and body rows are filled with
/// solid colours. Rows never split across pages; when a table continues on a
/// new page its header row is printed again first.
pub struct GridTable {
    rows: Vec<Vec<String>>,
    widths: Vec<f64>,
    header_fill: Color,
    body_fill: Color,
    header_font_size: u8,
    body_font_size: u8,
    border: Color,
    next_row: usize,
}

impl GridTable {
    pub fn new(table: &TableBlock) -> Self {
        let style = table.style();
        Self {
            rows: table.rows().to_vec(),
            widths: table.column_widths_mm().to_vec(),
            header_fill: style.header_fill,
            body_fill: style.body_fill,
            header_font_size: style.header_font_size,
            body_font_size: style.body_font_size,
            border: BLACK,
            next_row: 0,
        }
    }

    /// Sum of the column widths in millimetres.
    pub fn total_width(&self) -> f64 {
        self.widths.iter().sum()
    }

    fn layout_row(&self, context: &genpdf::Context, index: usize, base: Style) -> LaidOutRow {
        let (style, fill) = if index == 0 {
            let style = base
                .with_font_size(self.header_font_size)
                .bold()
                .with_color(WHITE);
            (style, self.header_fill)
        } else {
            let style = base.with_font_size(self.body_font_size).with_color(BLACK);
            (style, self.body_fill)
        };

        let cells: Vec<Vec<String>> = self
            .widths
            .iter()
            .enumerate()
            .map(|(column, width)| {
                let text = self.rows[index].get(column).map(String::as_str).unwrap_or("");
                let inner = (width - 2.0 * CELL_PADDING_MM).max(0.0);
                wrap_text(&context.font_cache, text, style, inner)
            })
            .collect();

        let line_height = mm_to_f64(style.line_height(&context.font_cache));
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        LaidOutRow {
            cells,
            style,
            fill,
            line_height,
            height: lines as f64 * line_height + 2.0 * CELL_PADDING_MM,
        }
    }

    fn draw_row(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        left: f64,
        top: f64,
        row: &LaidOutRow,
    ) -> Result<(), Error> {
        let width = self.total_width();
        let bottom = top + row.height;

        fill_rect(
            context,
            area,
            position(left, top),
            Size::new(mm_from_f64(width), mm_from_f64(row.height)),
            row.fill,
        )?;

        let mut x = left;
        for (lines, column_width) in row.cells.iter().zip(&self.widths) {
            for (index, line) in lines.iter().enumerate() {
                let y = top + CELL_PADDING_MM + index as f64 * row.line_height;
                if let Some(mut section) = area.text_section(
                    &context.font_cache,
                    position(x + CELL_PADDING_MM, y),
                    row.style,
                ) {
                    section.print_str(line, row.style)?;
                }
            }
            x += column_width;
        }

        let border = Style::new().with_color(self.border);
        area.draw_line(vec![position(left, top), position(left + width, top)], border);
        area.draw_line(vec![position(left, bottom), position(left + width, bottom)], border);
        let mut x = left;
        area.draw_line(vec![position(x, top), position(x, bottom)], border);
        for column_width in &self.widths {
            x += column_width;
            area.draw_line(vec![position(x, top), position(x, bottom)], border);
        }
        Ok(())
    }
}

impl Element for GridTable {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let width = self.total_width();
        let available_width = mm_to_f64(area.size().width);
        let available_height = mm_to_f64(area.size().height);
        // Tables are centred horizontally.
        let left = ((available_width - width) / 2.0).max(0.0);

        let mut top = 0.0;
        let mut first_on_page = true;
        while self.next_row < self.rows.len() {
            let index = self.next_row;
            let row = self.layout_row(context, index, style);
            let header = (first_on_page && index > 0).then(|| self.layout_row(context, 0, style));

            let mut needed = row.height + header.as_ref().map_or(0.0, |header| header.height);
            if index == 0 && self.rows.len() > 1 {
                // Keep the header together with the first body row.
                needed += self.layout_row(context, 1, style).height;
            }
            if top + needed > available_height {
                result.has_more = true;
                break;
            }

            if let Some(header) = &header {
                self.draw_row(context, &area, left, top, header)?;
                top += header.height;
            }
            self.draw_row(context, &area, left, top, &row)?;
            top += row.height;

            self.next_row += 1;
            first_on_page = false;
        }

        result.size = Size::new(mm_from_f64(width), mm_from_f64(top));
        Ok(result)
    }
}

/// An image scaled to a requested width while keeping its aspect ratio.
///
/// Images with an alpha channel are flattened to RGB since the PDF backend
/// rejects them.
pub struct FigureImage {
    image: Image,
    natural_size: Size,
    width: Option<Mm>,
    alignment: Alignment,
}

impl FigureImage {
    pub fn from_dynamic_image(image: image::DynamicImage) -> Result<Self, Error> {
        let rgb = image::DynamicImage::ImageRgb8(image.to_rgb8());
        let natural_size = estimated_image_size(&rgb, DEFAULT_IMAGE_DPI);
        let image = Image::from_dynamic_image(rgb)?;
        Ok(Self {
            image,
            natural_size,
            width: None,
            alignment: Alignment::Center,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_dynamic_image(decode_image_from_path(path)?)
    }

    pub fn with_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.width = width.into();
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn scale(&self) -> f64 {
        let natural = mm_to_f64(self.natural_size.width);
        match self.width {
            Some(width) if natural > f64::EPSILON => mm_to_f64(width) / natural,
            _ => 1.0,
        }
    }

    /// Size on the page after scaling.
    pub fn rendered_size(&self) -> Size {
        let scale = self.scale();
        Size::new(
            mm_from_f64(mm_to_f64(self.natural_size.width) * scale),
            mm_from_f64(mm_to_f64(self.natural_size.height) * scale),
        )
    }
}

impl Element for FigureImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let size = self.rendered_size();
        if size.height > area.size().height {
            let mut result = RenderResult::default();
            result.has_more = true;
            return Ok(result);
        }

        let scale = self.scale();
        self.image.set_scale(Scale::new(scale, scale));
        self.image.set_alignment(self.alignment);
        self.image.render(context, area, style)
    }
}

/// Fixed vertical gap, truncated at the bottom of the page.
pub struct VerticalSpace {
    height: Mm,
}

impl VerticalSpace {
    pub fn new(height: Mm) -> Self {
        Self { height }
    }
}

impl Element for VerticalSpace {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let height = if self.height > area.size().height {
            area.size().height
        } else {
            self.height
        };
        result.size = Size::new(Mm::default(), height);
        Ok(result)
    }
}
