/// Rows and columns read from an attachment. The first row of the source is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from raw records, using the first record as the header.
    /// Ragged rows are padded with empty cells.
    pub fn from_records(mut records: Vec<Vec<String>>) -> Self {
        if records.is_empty() {
            return Table::default();
        }
        let mut columns = records.remove(0);
        let width = records
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(columns.len()))
            .max()
            .unwrap_or(0);

        columns.resize(width, String::new());
        for row in records.iter_mut() {
            row.resize(width, String::new());
        }
        Table {
            columns,
            rows: records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whitespace-aligned dump: a 0-based index column on the left, each column right
    /// aligned to its widest cell, two spaces between columns.
    pub fn render(&self) -> String {
        let index_width = self
            .rows
            .len()
            .checked_sub(1)
            .map(|last| last.to_string().len())
            .unwrap_or(0);

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .chain(std::iter::once(display_width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(render_line(&" ".repeat(index_width), &self.columns, &widths));
        for (index, row) in self.rows.iter().enumerate() {
            let label = format!("{:<width$}", index, width = index_width);
            lines.push(render_line(&label, row, &widths));
        }
        lines.join("\n")
    }
}

fn render_line(label: &str, cells: &[String], widths: &[usize]) -> String {
    let mut line = label.to_string();
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str("  ");
        let pad = width.saturating_sub(display_width(cell));
        line.push_str(&" ".repeat(pad));
        line.push_str(cell);
    }
    line
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}
