use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Plain-text table with per-column alignment, sized to its widest cell.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect::<Vec<String>>();
        let align = vec![Align::Left; headers.len()];
        TextTable {
            headers,
            align,
            rows: Vec::new(),
        }
    }

    /// Right-aligns the listed columns; used for numbers.
    pub fn right_align(mut self, columns: &[usize]) -> Self {
        for &idx in columns {
            if let Some(slot) = self.align.get_mut(idx) {
                *slot = Align::Right;
            }
        }
        self
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths = self
            .headers
            .iter()
            .map(|h| display_width(h).max(1))
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate().take(widths.len()) {
                widths[idx] = widths[idx].max(display_width(cell));
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", self.format_row(&self.headers, &widths));
        let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
        let _ = writeln!(output, "{}", self.format_row(&separator, &widths));
        for row in &self.rows {
            let _ = writeln!(output, "{}", self.format_row(row, &widths));
        }
        output
    }

    fn format_row(&self, values: &[String], widths: &[usize]) -> String {
        let cells = widths
            .iter()
            .enumerate()
            .map(|(idx, width)| {
                let value = values.get(idx).map(String::as_str).unwrap_or("");
                let sanitized = sanitize_cell(value);
                let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
                match self.align.get(idx).copied().unwrap_or_default() {
                    Align::Left => format!("{sanitized}{padding}"),
                    Align::Right => format!("{padding}{sanitized}"),
                }
            })
            .collect::<Vec<_>>();
        cells.join("  ").trim_end().to_string()
    }
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequences end at 'm'
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_pads_left_and_right_aligned_columns() {
        let mut table = TextTable::new(["Category", "Revenue"]).right_align(&[1]);
        table.push_row(["Set", "₹1,200"]);
        table.push_row(["kurta", "₹90"]);
        let rendered = table.render();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "Category  Revenue",
                "--------  -------",
                "Set        ₹1,200",
                "kurta         ₹90",
            ]
        );
    }

    #[test]
    fn render_replaces_control_characters() {
        let mut table = TextTable::new(["note"]);
        table.push_row(["line1\nline2\tvalue"]);
        let rendered = table.render();
        assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
    }

    #[test]
    fn render_ignores_ansi_sequences_when_sizing() {
        let mut table = TextTable::new(["status", "n"]);
        table.push_row(["\u{1b}[31mERR\u{1b}[0m", "1"]);
        let rendered = table.render();
        assert_eq!(rendered.lines().next(), Some("status  n"));
        assert_eq!(rendered.lines().nth(2), Some("\u{1b}[31mERR\u{1b}[0m     1"));
    }

    #[test]
    fn short_rows_are_padded_with_blanks() {
        let mut table = TextTable::new(["a", "b"]);
        table.push_row(["x"]);
        assert!(!table.is_empty());
        assert_eq!(table.render().lines().nth(2), Some("x"));
    }
}
