//! XLSX rendering via `rust_xlsxwriter`.
//!
//! Layout: title, summary line (row count and totals), a bold header row,
//! one row per report, and a totals footer.

use aquila_core::minutes::format_minutes;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::{COLUMNS, ExportDocument};
use crate::error::Error;

pub fn render(doc: &ExportDocument) -> Result<Vec<u8>, Error> {
  build(doc).map_err(|e| Error::Internal(format!("xlsx rendering failed: {e}")))
}

fn build(doc: &ExportDocument) -> Result<Vec<u8>, XlsxError> {
  let mut workbook = Workbook::new();
  let bold = Format::new().set_bold();
  let worksheet = workbook.add_worksheet();
  worksheet.set_name("Reports")?;

  let (bible_total, prayer_total) = doc.totals();

  worksheet.write_string_with_format(0, 0, doc.title(), &bold)?;
  worksheet.write_string(1, 0, format!(
    "{} reports, bible {}, prayer {}",
    doc.rows.len(),
    format_minutes(u32::try_from(bible_total).unwrap_or(u32::MAX)),
    format_minutes(u32::try_from(prayer_total).unwrap_or(u32::MAX)),
  ))?;

  let header_row = 3;
  for (col, name) in COLUMNS.iter().enumerate() {
    worksheet.write_string_with_format(header_row, col as u16, *name, &bold)?;
  }

  let mut row = header_row + 1;
  for report in &doc.rows {
    worksheet.write_string(row, 0, report.date.to_string())?;
    worksheet.write_string(row, 1, report.name.as_str())?;
    worksheet.write_string(row, 2, report.role.as_str())?;
    worksheet.write_string(row, 3, report.group.as_str())?;
    worksheet.write_number(row, 4, f64::from(report.bible_minutes))?;
    worksheet.write_number(row, 5, f64::from(report.prayer_minutes))?;
    worksheet.write_number(row, 6, f64::from(report.total_minutes()))?;
    row += 1;
  }

  // Totals footer.
  worksheet.write_string_with_format(row, 3, "total", &bold)?;
  worksheet.write_number_with_format(row, 4, bible_total as f64, &bold)?;
  worksheet.write_number_with_format(row, 5, prayer_total as f64, &bold)?;
  worksheet.write_number_with_format(
    row,
    6,
    (bible_total + prayer_total) as f64,
    &bold,
  )?;

  workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::export::tests::sample;

  #[test]
  fn renders_a_zip_container() {
    let bytes = render(&sample()).unwrap();
    // XLSX is a zip archive.
    assert_eq!(&bytes[..2], b"PK");
  }

  #[test]
  fn empty_document_still_renders() {
    let doc = ExportDocument { rows: vec![], ..sample() };
    assert!(!render(&doc).unwrap().is_empty());
  }
}
