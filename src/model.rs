//! Logical content of the billing report.
//!
//! The report is assembled into these plain data types first and only then
//! converted into `genpdf` elements by [`crate::builder`]. Keeping the two
//! apart lets the section structure be inspected without loading any fonts.

use std::path::PathBuf;

use genpdf::style::{Color, Style, StyledString};

/// Horizontal placement of paragraphs, tables and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<HorizontalAlignment> for genpdf::Alignment {
    fn from(alignment: HorizontalAlignment) -> Self {
        match alignment {
            HorizontalAlignment::Left => genpdf::Alignment::Left,
            HorizontalAlignment::Center => genpdf::Alignment::Center,
            HorizontalAlignment::Right => genpdf::Alignment::Right,
        }
    }
}

/// A run of text with inline styling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Span {
    text: String,
    bold: bool,
    color: Option<Color>,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Converts the span into a `genpdf` string layered over `base`.
    pub fn to_styled_string(&self, base: Style) -> StyledString {
        let mut style = base;
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        StyledString::new(self.text.clone(), style)
    }
}

/// Paragraph made of styled spans.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
    font_size: Option<u8>,
}

impl RichParagraph {
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Span::new(text)])
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn font_size(&self) -> Option<u8> {
        self.font_size
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }
}

/// Colours and font sizes of a grid table.
///
/// The first row is the header: filled with `header_fill` and printed in
/// bold white. Every other row is filled with `body_fill`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableStyle {
    pub header_fill: Color,
    pub body_fill: Color,
    pub header_font_size: u8,
    pub body_font_size: u8,
}

impl TableStyle {
    pub fn new(header_fill: Color, body_fill: Color) -> Self {
        Self {
            header_fill,
            body_fill,
            header_font_size: 10,
            body_font_size: 10,
        }
    }

    pub fn with_header_font_size(mut self, size: u8) -> Self {
        self.header_font_size = size;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableBlock {
    rows: Vec<Vec<String>>,
    column_widths_mm: Vec<f64>,
    style: TableStyle,
}

impl TableBlock {
    /// Creates a table whose first row is the header.
    pub fn new(column_widths_mm: impl Into<Vec<f64>>, style: TableStyle) -> Self {
        Self {
            rows: Vec::new(),
            column_widths_mm: column_widths_mm.into(),
            style,
        }
    }

    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows after the header.
    pub fn body(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    pub fn column_widths_mm(&self) -> &[f64] {
        &self.column_widths_mm
    }

    pub fn style(&self) -> &TableStyle {
        &self.style
    }

    /// Value in the second column of the row whose first cell is `key`.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.first().map(String::as_str) == Some(key))
            .and_then(|row| row.get(1))
            .map(String::as_str)
    }
}

/// An image read from disk and scaled to a fixed width.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBlock {
    path: PathBuf,
    width_mm: f64,
    alignment: HorizontalAlignment,
}

impl ImageBlock {
    pub fn new(path: impl Into<PathBuf>, width_mm: f64) -> Self {
        Self {
            path: path.into(),
            width_mm,
            alignment: HorizontalAlignment::Center,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(RichParagraph),
    Table(TableBlock),
    Image(ImageBlock),
    /// Vertical gap in millimetres.
    Spacer(f64),
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Paragraph(RichParagraph::plain(text))
    }

    pub fn as_table(&self) -> Option<&TableBlock> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_paragraph(&self) -> Option<&RichParagraph> {
        match self {
            Self::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }
}

/// Title and untitled blocks shown before the first section.
#[derive(Clone, Debug, PartialEq)]
pub struct Cover {
    title: String,
    blocks: Vec<Block>,
}

impl Cover {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Text of every paragraph in the section.
    pub fn paragraphs(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(Block::as_paragraph)
            .map(RichParagraph::text)
            .collect()
    }
}

/// The complete report: cover followed by titled sections.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    cover: Cover,
    sections: Vec<Section>,
}

impl ReportDocument {
    pub fn new(cover: Cover) -> Self {
        Self {
            cover,
            sections: Vec::new(),
        }
    }

    pub fn cover(&self) -> &Cover {
        &self.cover
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn add_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.title() == title)
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(Section::title).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_reads_second_column() {
        let style = TableStyle::new(Color::Rgb(0, 0, 0), Color::Rgb(255, 255, 255));
        let table = TableBlock::new(vec![50.0, 50.0], style)
            .with_row(["Metric", "Value"])
            .with_row(["Instances", "3"]);

        assert_eq!(table.lookup("Instances"), Some("3"));
        assert_eq!(table.lookup("Clusters"), None);
        assert_eq!(table.body().len(), 1);
    }

    #[test]
    fn header_only_table_has_empty_body() {
        let style = TableStyle::new(Color::Rgb(0, 0, 0), Color::Rgb(1, 1, 1));
        let table = TableBlock::new(vec![10.0], style).with_row(["Only"]);
        assert!(table.body().is_empty());
    }

    #[test]
    fn span_styles_layer_over_base() {
        let styled = Span::new("Total")
            .bold()
            .colored(Color::Rgb(10, 20, 30))
            .to_styled_string(Style::new().with_font_size(14));
        assert_eq!(styled.s, "Total");
        assert!(styled.style.is_bold());
        assert_eq!(styled.style.font_size(), 14);
        assert_eq!(styled.style.color(), Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn sections_are_found_by_title() {
        let document = ReportDocument::new(Cover::new("Report"))
            .add_section(Section::new("First").with_block(Block::text("hello")))
            .add_section(Section::new("Second"));

        assert_eq!(document.section_titles(), vec!["First", "Second"]);
        assert_eq!(
            document.section("First").unwrap().paragraphs(),
            vec!["hello".to_owned()]
        );
        assert!(document.section("Third").is_none());
    }
}
