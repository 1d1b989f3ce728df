// Presentation adapter contract.
//
// Rendering proper (charts, styling, interactivity) is an external
// collaborator. The pipeline's obligation ends at finished tables: named
// numeric columns with an optional x-axis column. The bundled TextPresenter
// writes aligned summaries to any `Write` sink, which is all the CLI needs.

use std::io::Write;

// ---------------------------------------------------------------------------
// Table contract
// ---------------------------------------------------------------------------

/// Label column for a table's x axis.
#[derive(Debug, Clone)]
pub struct Axis {
    pub name: String,
    pub labels: Vec<String>,
}

/// One named numeric column.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// A finished table handed to the presentation collaborator.
#[derive(Debug, Clone)]
pub struct Table {
    pub title: String,
    pub x_axis: Option<Axis>,
    pub columns: Vec<Column>,
}

impl Table {
    /// Number of data rows (length of the longest column).
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len())
            .max()
            .unwrap_or(0)
    }
}

/// Anything that can receive finished tables.
pub trait Presenter {
    fn render(&mut self, table: &Table) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// TextPresenter
// ---------------------------------------------------------------------------

/// Plain-text renderer: fixed-width columns, NaN printed as such, long
/// tables truncated with a footer.
pub struct TextPresenter<W: Write> {
    out: W,
    max_rows: usize,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, max_rows: 30 }
    }

    pub fn with_max_rows(out: W, max_rows: usize) -> Self {
        Self { out, max_rows }
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.3}")
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render(&mut self, table: &Table) -> anyhow::Result<()> {
        writeln!(self.out, "\n== {} ==", table.title)?;

        let mut header = String::new();
        if let Some(axis) = &table.x_axis {
            header.push_str(&format!("{:<20}", axis.name));
        }
        for column in &table.columns {
            header.push_str(&format!("{:>12}", column.name));
        }
        writeln!(self.out, "{header}")?;

        let rows = table.row_count();
        let shown = rows.min(self.max_rows);
        for i in 0..shown {
            let mut line = String::new();
            if let Some(axis) = &table.x_axis {
                let label = axis.labels.get(i).map(String::as_str).unwrap_or("");
                line.push_str(&format!("{label:<20}"));
            }
            for column in &table.columns {
                let cell = column
                    .values
                    .get(i)
                    .copied()
                    .map(format_cell)
                    .unwrap_or_default();
                line.push_str(&format!("{cell:>12}"));
            }
            writeln!(self.out, "{line}")?;
        }
        if rows > shown {
            writeln!(self.out, "... ({} more rows)", rows - shown)?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
