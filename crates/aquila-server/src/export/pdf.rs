//! PDF rendering via `printpdf`.
//!
//! A4 portrait, Helvetica. Title and summary at the top of the first page,
//! a header row, one line per report with continuation pages as needed, and
//! a totals footer.

use aquila_core::minutes::format_minutes;
use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::{COLUMNS, ExportDocument};
use crate::error::Error;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;

// Left edge of each column, in millimetres.
const COLUMN_X: [f64; 7] = [15.0, 40.0, 95.0, 115.0, 145.0, 165.0, 185.0];

pub fn render(doc: &ExportDocument) -> Result<Vec<u8>, Error> {
  let internal = |e: &dyn std::fmt::Display| {
    Error::Internal(format!("pdf rendering failed: {e}"))
  };

  let (pdf, page, layer) = PdfDocument::new(
    doc.title(),
    Mm(PAGE_WIDTH_MM as _),
    Mm(PAGE_HEIGHT_MM as _),
    "content",
  );
  let font = pdf
    .add_builtin_font(BuiltinFont::Helvetica)
    .map_err(|e| internal(&e))?;
  let bold = pdf
    .add_builtin_font(BuiltinFont::HelveticaBold)
    .map_err(|e| internal(&e))?;

  let mut current = pdf.get_page(page).get_layer(layer);
  let (bible_total, prayer_total) = doc.totals();

  // Title and summary.
  current.use_text(doc.title(), 14.0, Mm(15.0), Mm(280.0), &bold);
  current.use_text(
    format!(
      "{} reports, bible {}, prayer {}",
      doc.rows.len(),
      format_minutes(u32::try_from(bible_total).unwrap_or(u32::MAX)),
      format_minutes(u32::try_from(prayer_total).unwrap_or(u32::MAX)),
    ),
    10.0,
    Mm(15.0),
    Mm(272.0),
    &font,
  );

  let write_header = |layer: &printpdf::PdfLayerReference, y: f64| {
    for (i, name) in COLUMNS.iter().enumerate() {
      layer.use_text(*name, 9.0, Mm(COLUMN_X[i] as _), Mm(y as _), &bold);
    }
  };

  let mut y = 262.0;
  write_header(&current, y);
  y -= 7.0;

  for row in &doc.rows {
    if y < 20.0 {
      let (next_page, next_layer) = pdf.add_page(
        Mm(PAGE_WIDTH_MM as _),
        Mm(PAGE_HEIGHT_MM as _),
        "content",
      );
      current = pdf.get_page(next_page).get_layer(next_layer);
      y = 280.0;
      write_header(&current, y);
      y -= 7.0;
    }

    let fields = [
      row.date.to_string(),
      row.name.clone(),
      row.role.as_str().to_string(),
      row.group.clone(),
      row.bible_minutes.to_string(),
      row.prayer_minutes.to_string(),
      row.total_minutes().to_string(),
    ];
    for (i, field) in fields.iter().enumerate() {
      current.use_text(field, 9.0, Mm(COLUMN_X[i] as _), Mm(y as _), &font);
    }
    y -= 6.0;
  }

  // Totals footer.
  if y < 20.0 {
    let (next_page, next_layer) = pdf.add_page(
      Mm(PAGE_WIDTH_MM as _),
      Mm(PAGE_HEIGHT_MM as _),
      "content",
    );
    current = pdf.get_page(next_page).get_layer(next_layer);
    y = 280.0;
  }
  current.use_text("total", 9.0, Mm(COLUMN_X[3] as _), Mm(y as _), &bold);
  current.use_text(bible_total.to_string(), 9.0, Mm(COLUMN_X[4] as _), Mm(y as _), &bold);
  current.use_text(prayer_total.to_string(), 9.0, Mm(COLUMN_X[5] as _), Mm(y as _), &bold);
  current.use_text(
    (bible_total + prayer_total).to_string(),
    9.0,
    Mm(COLUMN_X[6] as _),
    Mm(y as _),
    &bold,
  );

  pdf.save_to_bytes().map_err(|e| internal(&e))
}
