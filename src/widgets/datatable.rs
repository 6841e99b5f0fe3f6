//! Scrollable table widget over a dataset.
//!
//! Headers come from the first record's keys; every cell value is
//! stringified for display. The widget shows a capped prefix of the dataset
//! and scrolls a visible window over it on both axes.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, Widget},
};
use serde_json::Value;

use crate::ingest::{display_string, Dataset};

fn cell_text(value: Option<&Value>) -> String {
    value.map(display_string).unwrap_or_default()
}

/// Scroll state for the data table.
#[derive(Debug)]
pub struct DataTableState {
    pub start_row: usize,
    pub start_col: usize,
    /// Rows the last render had space for; maintained on resize.
    pub visible_rows: usize,
    /// The table view shows at most this many records.
    pub row_limit: usize,
    pub row_numbers: bool,
    pub row_start_index: usize,
}

impl DataTableState {
    pub fn new(row_limit: usize, row_numbers: bool, row_start_index: usize) -> Self {
        Self {
            start_row: 0,
            start_col: 0,
            visible_rows: 0,
            row_limit,
            row_numbers,
            row_start_index,
        }
    }

    /// Number of records the view will show for this dataset.
    pub fn capped_len(&self, dataset: &Dataset) -> usize {
        dataset.len().min(self.row_limit)
    }

    fn max_start_row(&self, dataset: &Dataset) -> usize {
        self.capped_len(dataset)
            .saturating_sub(self.visible_rows.max(1))
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.start_row = self.start_row.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, dataset: &Dataset, lines: usize) {
        self.start_row = (self.start_row + lines).min(self.max_start_row(dataset));
    }

    pub fn scroll_left(&mut self) {
        self.start_col = self.start_col.saturating_sub(1);
    }

    pub fn scroll_right(&mut self, dataset: &Dataset) {
        let max = dataset.columns().len().saturating_sub(1);
        self.start_col = (self.start_col + 1).min(max);
    }

    pub fn scroll_top(&mut self) {
        self.start_row = 0;
    }

    pub fn scroll_bottom(&mut self, dataset: &Dataset) {
        self.start_row = self.max_start_row(dataset);
    }
}

/// Renders the dataset as a table through a `DataTableState` window.
pub struct DataTable<'a> {
    dataset: &'a Dataset,
}

impl<'a> DataTable<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }
}

impl StatefulWidget for DataTable<'_> {
    type State = DataTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default().title("Data").borders(Borders::ALL);

        // Keep the visible window in sync with the area we actually got
        // (borders + header row take 3 lines).
        state.visible_rows = (area.height.saturating_sub(3)) as usize;
        state.start_row = state.start_row.min(state.max_start_row(self.dataset));

        let columns: Vec<String> = self
            .dataset
            .columns()
            .into_iter()
            .skip(state.start_col)
            .collect();
        if columns.is_empty() {
            let empty = Block::default().title("Data (no columns)").borders(Borders::ALL);
            empty.render(area, buf);
            return;
        }

        let header_style = Style::default().add_modifier(Modifier::BOLD);
        let mut header_cells: Vec<Cell> = Vec::new();
        if state.row_numbers {
            header_cells.push(Cell::from(Span::styled("#", header_style)));
        }
        header_cells.extend(
            columns
                .iter()
                .map(|name| Cell::from(Span::styled(name.clone(), header_style))),
        );

        let end_row = (state.start_row + state.visible_rows).min(state.capped_len(self.dataset));
        let rows: Vec<Row> = self.dataset.records()[state.start_row..end_row]
            .iter()
            .enumerate()
            .map(|(offset, record)| {
                let mut cells: Vec<Cell> = Vec::new();
                if state.row_numbers {
                    let number = state.start_row + offset + state.row_start_index;
                    cells.push(Cell::from(Span::styled(
                        number.to_string(),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                cells.extend(
                    columns
                        .iter()
                        .map(|name| Cell::from(cell_text(record.get(name)))),
                );
                Row::new(cells)
            })
            .collect();

        let mut widths: Vec<Constraint> = Vec::new();
        if state.row_numbers {
            widths.push(Constraint::Length(6));
        }
        widths.extend(std::iter::repeat(Constraint::Fill(1)).take(columns.len()));

        let table = Table::new(rows, widths)
            .header(Row::new(header_cells))
            .block(block);

        Widget::render(table, area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FileFormat;
    use crate::ingest::parse_text;

    fn buffer_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn renders_headers_and_cells() {
        let dataset = parse_text("region,revenue\neast,100\nwest,250\n", FileFormat::Csv).unwrap();
        let mut state = DataTableState::new(100, false, 1);
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);
        DataTable::new(&dataset).render(area, &mut buf, &mut state);

        let text = buffer_text(&buf);
        assert!(text.contains("region"));
        assert!(text.contains("east"));
        assert!(text.contains("250"));
    }

    #[test]
    fn scrolling_clamps_to_capped_length() {
        let mut text = String::from("a\n");
        for i in 0..200 {
            text.push_str(&format!("{}\n", i));
        }
        let dataset = parse_text(&text, FileFormat::Csv).unwrap();
        let mut state = DataTableState::new(100, false, 1);
        state.visible_rows = 10;
        state.scroll_down(&dataset, 500);
        assert_eq!(state.start_row, 90);
        state.scroll_bottom(&dataset);
        assert_eq!(state.start_row, 90);
        state.scroll_up(1000);
        assert_eq!(state.start_row, 0);
    }

    #[test]
    fn empty_dataset_renders_placeholder() {
        let dataset = Dataset::default();
        let mut state = DataTableState::new(100, false, 1);
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        DataTable::new(&dataset).render(area, &mut buf, &mut state);
        assert!(buffer_text(&buf).contains("no columns"));
    }

    #[test]
    fn row_numbers_start_at_configured_index() {
        let dataset = parse_text("a\nx\ny\n", FileFormat::Csv).unwrap();
        let mut state = DataTableState::new(100, true, 1);
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        DataTable::new(&dataset).render(area, &mut buf, &mut state);
        assert!(buffer_text(&buf).contains('1'));
    }
}
