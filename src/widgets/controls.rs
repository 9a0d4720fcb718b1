use ratatui::{
    buffer::Buffer,
    layout::{Rect, Constraint},
    style::{Stylize, Style, Color, Modifier},
    widgets::{Block, Table, Row, Cell, Widget, BorderType},
};

use crate::core::registry::Slot;

/// One "Create Child" and one "Terminate" button per slot.
pub struct ControlsWidget<'a> {
    slots: &'a [Slot],
    selected: usize,
    spawning_disabled: bool,
}

impl<'a> ControlsWidget<'a> {
    pub fn new(slots: &'a [Slot], selected: usize, spawning_disabled: bool) -> Self {
        Self {
            slots,
            selected,
            spawning_disabled,
        }
    }
}

fn slot_state(slot: &Slot) -> String {
    match (slot.pid, slot.has_grandchild) {
        (Some(pid), true) => format!("PID {} + child", pid),
        (Some(pid), false) => format!("PID {}", pid),
        (None, _) => "empty".to_string(),
    }
}

impl Widget for ControlsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let create_style = if self.spawning_disabled {
            Style::new().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::new().fg(Color::Green)
        };

        let rows: Vec<Row> = self.slots.iter().enumerate().map(|(i, slot)| {
            let row = Row::new(vec![
                Cell::from(format!("[ Create Child {} ]", i + 1)).style(create_style),
                Cell::from("[ Terminate ]").style(Style::new().fg(Color::Red)),
                Cell::from(slot_state(slot)).style(Style::new().fg(Color::Gray)),
            ]);
            if i == self.selected {
                row.style(Style::new().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        }).collect();

        let widths = [
            Constraint::Length(20),  // Create
            Constraint::Length(15),  // Terminate
            Constraint::Min(10),     // State
        ];

        let title = if self.spawning_disabled {
            "Controls (spawning disabled)"
        } else {
            "Controls"
        };

        let table = Table::new(rows, widths)
            .block(
                Block::bordered()
                    .title(title)
                    .title_style(Style::new().bold().fg(Color::Cyan))
                    .border_type(BorderType::Plain)
                    .border_style(Style::new().fg(Color::Blue))
            );

        table.render(area, buf);
    }
}
