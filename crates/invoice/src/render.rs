//! PDF rendering of an [`InvoiceDocument`].

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use crate::document::{InvoiceDocument, InvoicePage, InvoiceSummary};
use crate::error::{InvoiceError, Result};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const ROW_HEIGHT: f32 = 7.0;
const LAYER: &str = "Invoice";

const FIRST_TABLE_TOP: f32 = 112.0;
const CONTINUATION_TABLE_TOP: f32 = 40.0;

const COL_INDEX: f32 = MARGIN;
const COL_TITLE: f32 = 29.0;
const COL_QTY: f32 = 106.0;
const COL_UNIT: f32 = 124.0;
const COL_TOTAL: f32 = 160.0;

/// Longest product title printed before truncation.
const TITLE_CHARS: usize = 38;

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn primary() -> Color {
    rgb(0.0, 0.19, 0.29)
}

fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

fn gray() -> Color {
    rgb(0.4, 0.4, 0.4)
}

fn render_err(e: printpdf::Error) -> InvoiceError {
    InvoiceError::Render(e.to_string())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Draws on one page using top-left millimetre coordinates.
struct Canvas<'a> {
    layer: PdfLayerReference,
    fonts: &'a Fonts,
}

impl Canvas<'_> {
    fn text(&self, text: &str, size: f32, x: f32, top: f32, bold: bool) {
        let font = if bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        };
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT - top), font);
    }

    fn color(&self, color: Color) {
        self.layer.set_fill_color(color);
    }

    fn rule(&self, x1: f32, x2: f32, top: f32) {
        self.layer.set_outline_color(rgb(0.8, 0.8, 0.8));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(PAGE_HEIGHT - top)), false),
                (Point::new(Mm(x2), Mm(PAGE_HEIGHT - top)), false),
            ],
            is_closed: false,
        });
    }

    fn frame(&self, left: f32, top: f32, width: f32, height: f32) {
        let (x1, x2) = (left, left + width);
        let (y1, y2) = (PAGE_HEIGHT - top, PAGE_HEIGHT - top - height);
        self.layer.set_outline_color(rgb(0.87, 0.87, 0.87));
        self.layer.set_outline_thickness(0.75);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y2)), false),
                (Point::new(Mm(x1), Mm(y2)), false),
            ],
            is_closed: true,
        });
    }
}

/// Renders the invoice to PDF bytes.
pub fn render_pdf(doc: &InvoiceDocument) -> Result<Vec<u8>> {
    let title = format!("Invoice {}", doc.order_number);
    let (pdf, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
    let fonts = Fonts {
        regular: pdf
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?,
        bold: pdf
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?,
    };

    let page_count = doc.pages.len();
    for (i, page) in doc.pages.iter().enumerate() {
        let layer = if i == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
            pdf.get_page(page_idx).get_layer(layer_idx)
        };
        let canvas = Canvas {
            layer,
            fonts: &fonts,
        };

        let table_top = if i == 0 {
            draw_header(&canvas, doc);
            FIRST_TABLE_TOP
        } else {
            canvas.color(gray());
            canvas.text(
                &format!("Invoice {} (continued)", doc.order_number),
                10.0,
                MARGIN,
                25.0,
                false,
            );
            CONTINUATION_TABLE_TOP
        };

        let after_table = draw_table(&canvas, page, table_top);
        if let Some(summary) = &page.summary {
            draw_summary(&canvas, summary, after_table + ROW_HEIGHT);
        }
        draw_footer(&canvas, i + 1, page_count);
    }

    pdf.save_to_bytes().map_err(render_err)
}

fn draw_header(canvas: &Canvas<'_>, doc: &InvoiceDocument) {
    canvas.color(primary());
    canvas.text("INVOICE", 24.0, PAGE_WIDTH / 2.0 - 18.0, 22.0, true);

    canvas.color(black());
    canvas.text(&format!("Order No: {}", doc.order_number), 10.0, MARGIN, 34.0, false);
    canvas.text(
        &format!("Order Date: {}", doc.order_date.format("%a %b %d %Y")),
        10.0,
        MARGIN,
        40.0,
        false,
    );
    canvas.text(
        &format!("Delivery Date: {}", doc.delivery_date.format("%a %b %d %Y")),
        10.0,
        MARGIN,
        46.0,
        false,
    );

    canvas.text("From:", 10.0, 140.0, 34.0, false);
    canvas.color(primary());
    canvas.text(doc.seller.name, 10.0, 140.0, 40.0, false);
    canvas.text(doc.seller.website, 10.0, 140.0, 46.0, false);

    canvas.frame(MARGIN, 54.0, PAGE_WIDTH - 2.0 * MARGIN, 42.0);
    canvas.text("Billing Information", 12.0, MARGIN + 4.0, 62.0, true);

    let billing = &doc.billing;
    canvas.color(black());
    canvas.text(&format!("Name: {}", billing.name), 10.0, MARGIN + 4.0, 70.0, false);
    canvas.text(
        &format!("Email: {}", billing.email.as_deref().unwrap_or("N/A")),
        10.0,
        MARGIN + 4.0,
        76.0,
        false,
    );
    canvas.text(&format!("Mobile: {}", billing.mobile), 10.0, MARGIN + 4.0, 82.0, false);
    canvas.text(
        &format!("Shipping Address: {}", billing.shipping_address),
        10.0,
        MARGIN + 4.0,
        88.0,
        false,
    );

    canvas.color(primary());
    canvas.text("Order Summary", 12.0, MARGIN, FIRST_TABLE_TOP - 8.0, true);
}

/// Draws the column headings and rows; returns the top of the next free row.
fn draw_table(canvas: &Canvas<'_>, page: &InvoicePage, top: f32) -> f32 {
    canvas.color(black());
    for (label, x) in [
        ("No.", COL_INDEX),
        ("Product", COL_TITLE),
        ("Qty", COL_QTY),
        ("Unit Price", COL_UNIT),
        ("Total", COL_TOTAL),
    ] {
        canvas.text(label, 10.0, x, top, true);
    }
    canvas.rule(MARGIN, PAGE_WIDTH - MARGIN, top + 2.5);

    let mut y = top + ROW_HEIGHT + 1.0;
    for row in &page.rows {
        canvas.text(&row.index.to_string(), 10.0, COL_INDEX, y, false);
        canvas.text(&truncate(&row.title), 10.0, COL_TITLE, y, false);
        canvas.text(&row.quantity.to_string(), 10.0, COL_QTY, y, false);
        canvas.text(&row.unit_price.to_string(), 10.0, COL_UNIT, y, false);
        canvas.text(&row.line_total.to_string(), 10.0, COL_TOTAL, y, false);
        y += ROW_HEIGHT;
    }
    y
}

fn draw_summary(canvas: &Canvas<'_>, summary: &InvoiceSummary, top: f32) {
    canvas.color(primary());
    canvas.text("Total Summary", 12.0, MARGIN, top, true);

    canvas.color(black());
    canvas.text(
        &format!("Subtotal: {}", summary.subtotal),
        10.0,
        MARGIN,
        top + 6.0,
        false,
    );
    canvas.text(
        &format!("GST ({}%): {}", crate::document::GST_PERCENT, summary.gst),
        10.0,
        MARGIN,
        top + 12.0,
        false,
    );
    canvas.text(
        &format!("Discount: {}", summary.discount),
        10.0,
        MARGIN,
        top + 18.0,
        false,
    );
    canvas.text(
        &format!("Grand Total: {}", summary.grand_total),
        10.0,
        MARGIN,
        top + 26.0,
        true,
    );
}

fn draw_footer(canvas: &Canvas<'_>, page: usize, of: usize) {
    canvas.color(gray());
    canvas.text(
        "Thank you for shopping with us!",
        9.0,
        PAGE_WIDTH / 2.0 - 25.0,
        PAGE_HEIGHT - 12.0,
        false,
    );
    canvas.text(
        &format!("Page {page} of {of}"),
        8.0,
        PAGE_WIDTH - MARGIN - 16.0,
        PAGE_HEIGHT - 12.0,
        false,
    );
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= TITLE_CHARS {
        return title.to_string();
    }
    let mut short: String = title.chars().take(TITLE_CHARS - 3).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_titles() {
        assert_eq!(truncate("Shirt"), "Shirt");
    }

    #[test]
    fn truncate_shortens_long_titles() {
        let long = "x".repeat(60);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), TITLE_CHARS);
        assert!(short.ends_with("..."));
    }
}
