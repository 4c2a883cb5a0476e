// core/src/export/csv.rs
use std::borrow::Cow;

/// Escapes one CSV field.
///
/// Values containing a comma, a double quote, CR or LF are wrapped in double
/// quotes with inner quotes doubled. Everything else is written as-is.
pub fn escape_field(value: &str) -> Cow<'_, str> {
  if value.contains([',', '"', '\n', '\r']) {
    Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
  } else {
    Cow::Borrowed(value)
  }
}

/// Accumulates CSV text row by row.
#[derive(Debug, Default)]
pub struct CsvBuilder {
  buf: String,
  rows: usize,
}

impl CsvBuilder {
  const BOM: char = '\u{feff}';

  /// Starts a document with a UTF-8 byte order mark so spreadsheet tools
  /// detect the encoding of the Japanese headers.
  pub fn with_bom() -> Self {
    let mut buf = String::new();
    buf.push(Self::BOM);
    CsvBuilder { buf, rows: 0 }
  }

  pub fn push_row<I, S>(&mut self, fields: I)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut first = true;
    for field in fields {
      if !first {
        self.buf.push(',');
      }
      first = false;
      self.buf.push_str(&escape_field(field.as_ref()));
    }
    self.buf.push_str("\r\n");
    self.rows += 1;
  }

  /// Rows written so far, header included.
  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn finish(self) -> String {
    self.buf
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_values_are_untouched() {
    assert!(matches!(escape_field("東京都"), Cow::Borrowed("東京都")));
    assert_eq!(escape_field(""), "");
  }

  #[test]
  fn special_characters_force_quoting() {
    assert_eq!(escape_field("a,b"), "\"a,b\"");
    assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    assert_eq!(escape_field("cr\rlf"), "\"cr\rlf\"");
  }

  #[test]
  fn builder_joins_fields_and_terminates_rows() {
    let mut csv = CsvBuilder::default();
    csv.push_row(["a", "b,c"]);
    csv.push_row(vec![String::from("1"), String::from("2")]);
    assert_eq!(csv.rows(), 2);
    assert_eq!(csv.finish(), "a,\"b,c\"\r\n1,2\r\n");
  }

  #[test]
  fn bom_is_only_written_once_at_the_start() {
    let mut csv = CsvBuilder::with_bom();
    csv.push_row(["x"]);
    let out = csv.finish();
    assert!(out.starts_with('\u{feff}'));
    assert_eq!(out.matches('\u{feff}').count(), 1);
  }
}
