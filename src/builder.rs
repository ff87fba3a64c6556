//! Renders a [`ReportDocument`] into PDF bytes with `genpdf`.

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{self, Style};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::debug;

use crate::elements::{mm_from_f64, FigureImage, GridTable, VerticalSpace};
use crate::error::{ReportError, Result};
use crate::fonts::ResolvedFonts;
use crate::model::{Block, HorizontalAlignment, ReportDocument, RichParagraph, Span};
use crate::report::{PRIMARY, SECONDARY};

const MARGIN_TOP_BOTTOM_MM: f64 = 25.4;
const MARGIN_LEFT_RIGHT_MM: f64 = 19.05;
const FOOTER_HEIGHT_MM: f64 = 8.0;
const BODY_FONT_SIZE: u8 = 10;
const TITLE_FONT_SIZE: u8 = 24;
const HEADING_FONT_SIZE: u8 = 16;

type FooterFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Builder for `genpdf::Document` instances with the report's page setup.
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<Size>,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
    font_size: Option<u8>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A4 pages, 1 in top/bottom and 0.75 in side margins, `Page N` footer.
    pub fn for_report() -> Self {
        Self::new()
            .with_paper_size(PaperSize::A4)
            .with_margins(Margins::trbl(
                mm_from_f64(MARGIN_TOP_BOTTOM_MM),
                mm_from_f64(MARGIN_LEFT_RIGHT_MM),
                mm_from_f64(MARGIN_TOP_BOTTOM_MM),
                mm_from_f64(MARGIN_LEFT_RIGHT_MM),
            ))
            .with_font_size(BODY_FONT_SIZE)
            .with_footer(mm_from_f64(FOOTER_HEIGHT_MM), |page| {
                Paragraph::new(format!("Page {page}"))
                    .aligned(Alignment::Right)
                    .styled(Style::new().with_font_size(9))
            })
    }

    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Configures a footer callback with a fixed height that is invoked for every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let mut document = genpdf::Document::new(font_family);

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }

        document.set_page_decorator(ConfiguredPageDecorator::new(self.margins, self.footer));
        document
    }
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<FooterFactory>,
}

impl FooterSpec {
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Option<Margins>,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Option<Margins>, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> std::result::Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}

fn paragraph_element(paragraph: &RichParagraph) -> Paragraph {
    let mut base = Style::new();
    if let Some(size) = paragraph.font_size() {
        base.set_font_size(size);
    }

    let mut element = Paragraph::default();
    for span in paragraph.spans() {
        element.push(span.to_styled_string(base));
    }
    element.set_alignment(paragraph.alignment().into());
    element
}

fn title_paragraph(title: &str) -> RichParagraph {
    RichParagraph::new(vec![Span::new(title).bold().colored(PRIMARY)])
        .with_alignment(HorizontalAlignment::Center)
        .with_font_size(TITLE_FONT_SIZE)
}

fn heading_paragraph(title: &str) -> RichParagraph {
    RichParagraph::new(vec![Span::new(title).bold().colored(SECONDARY)])
        .with_font_size(HEADING_FONT_SIZE)
}

fn push_block(document: &mut genpdf::Document, block: &Block) -> Result<()> {
    match block {
        Block::Paragraph(paragraph) => document.push(paragraph_element(paragraph)),
        Block::Table(table) => document.push(GridTable::new(table)),
        Block::Image(image) => {
            if !image.path().is_file() {
                return Err(ReportError::MissingChart {
                    path: image.path().to_path_buf(),
                });
            }
            let figure = FigureImage::from_path(image.path())?
                .with_width(mm_from_f64(image.width_mm()))
                .with_alignment(image.alignment().into());
            document.push(figure);
        }
        Block::Spacer(height) => document.push(VerticalSpace::new(mm_from_f64(*height))),
    }
    Ok(())
}

/// Lays out `report` on A4 pages and returns the encoded PDF.
pub fn render_report(report: &ReportDocument, fonts: &ResolvedFonts) -> Result<Vec<u8>> {
    let mut document = DocumentBuilder::for_report().build(fonts.pdf_family()?);
    document.set_title(report.cover().title());

    document.push(
        paragraph_element(&title_paragraph(report.cover().title()))
            .padded(Margins::trbl(0, 0, mm_from_f64(10.5), 0)),
    );
    for block in report.cover().blocks() {
        push_block(&mut document, block)?;
    }

    for section in report.sections() {
        document.push(
            paragraph_element(&heading_paragraph(section.title()))
                .padded(Margins::trbl(mm_from_f64(7.0), 0, mm_from_f64(3.5), 0)),
        );
        for block in section.blocks() {
            push_block(&mut document, block)?;
        }
    }

    let mut bytes = Vec::new();
    document.render(&mut bytes)?;
    debug!("Rendered {} sections into {} bytes", report.sections().len(), bytes.len());
    Ok(bytes)
}
