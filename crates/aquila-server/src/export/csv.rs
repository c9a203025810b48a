//! CSV rendering.
//!
//! Plain delimited text: a header row, then one line per report. Fields
//! containing a comma, quote, or newline are wrapped in double quotes with
//! internal quotes doubled.

use super::{COLUMNS, ExportDocument};

pub fn render(doc: &ExportDocument) -> String {
  let mut out = String::new();
  out.push_str(&COLUMNS.join(","));
  out.push('\n');
  for row in &doc.rows {
    let fields = [
      row.date.to_string(),
      row.name.clone(),
      row.role.as_str().to_string(),
      row.group.clone(),
      row.bible_minutes.to_string(),
      row.prayer_minutes.to_string(),
      row.total_minutes().to_string(),
    ];
    let line: Vec<String> = fields.iter().map(|f| quote(f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
  }
  out
}

fn quote(field: &str) -> String {
  if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}
