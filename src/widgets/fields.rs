//! Classified-fields panel: one row per column of the first record, with its
//! numeric/categorical role and markers for the selected chart fields.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Cell, Row, Table, Widget},
};

use crate::classify::FieldClassification;

pub struct FieldsView<'a> {
    fields: &'a FieldClassification,
    category_field: Option<&'a str>,
    value_field: Option<&'a str>,
}

impl<'a> FieldsView<'a> {
    pub fn new(
        fields: &'a FieldClassification,
        category_field: Option<&'a str>,
        value_field: Option<&'a str>,
    ) -> Self {
        Self {
            fields,
            category_field,
            value_field,
        }
    }

    fn row(&self, name: &str, role: &str) -> Row<'a> {
        let selected = Some(name) == self.category_field || Some(name) == self.value_field;
        let marker = if Some(name) == self.category_field {
            "labels"
        } else if Some(name) == self.value_field {
            "values"
        } else {
            ""
        };
        let style = if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(Span::styled(name.to_string(), style)),
            Cell::from(Span::styled(role.to_string(), style)),
            Cell::from(Span::styled(marker.to_string(), style)),
        ])
    }
}

impl Widget for &FieldsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Fields")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        let mut rows: Vec<Row> = Vec::new();
        for name in &self.fields.categorical {
            rows.push(self.row(name, "categorical"));
        }
        for name in &self.fields.numeric {
            rows.push(self.row(name, "numeric"));
        }

        let widths = vec![area.width / 3; 3];
        let table = Table::new(rows, widths)
            .header(Row::new(vec![
                Cell::from(Span::styled(
                    "Column",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Cell::from(Span::styled(
                    "Role",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Cell::from(Span::styled(
                    "Chart",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
            ]))
            .block(block);

        Widget::render(table, area, buf);
    }
}
