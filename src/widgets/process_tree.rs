use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Stylize, Style, Color},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::core::tree::ProcessTree;

pub struct ProcessTreeWidget<'a> {
    tree: &'a ProcessTree,
}

impl<'a> ProcessTreeWidget<'a> {
    pub fn new(tree: &'a ProcessTree) -> Self {
        Self { tree }
    }

    fn lines(&self) -> Vec<Line<'a>> {
        self.tree.rows().into_iter().enumerate().map(|(i, row)| {
            if row.depth == 0 {
                // The first root is always the hosting process.
                let style = if i == 0 {
                    Style::new().bold().fg(Color::Yellow)
                } else {
                    Style::new().fg(Color::Green)
                };
                Line::from(Span::styled(row.label, style))
            } else {
                let connector = if row.last_sibling { "└─ " } else { "├─ " };
                let indent = "   ".repeat(row.depth - 1);
                Line::from(vec![
                    Span::styled(format!("{}{}", indent, connector), Style::new().fg(Color::DarkGray)),
                    Span::styled(row.label, Style::new().fg(Color::Cyan)),
                ])
            }
        }).collect()
    }
}

impl Widget for ProcessTreeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let paragraph = Paragraph::new(self.lines())
            .block(
                Block::bordered()
                    .title("Processes")
                    .title_style(Style::new().bold().fg(Color::Cyan))
                    .border_type(BorderType::Plain)
                    .border_style(Style::new().fg(Color::Blue))
            );

        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render_to_string(tree: &ProcessTree) -> String {
        let mut terminal = Terminal::new(TestBackend::new(40, 6)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(ProcessTreeWidget::new(tree), frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn children_are_indented_under_their_slot() {
        let mut tree = ProcessTree::new();
        tree.add_root("Parent (PID: 1)");
        let slot = tree.add_root("Main Child 1 (PID: 2)");
        tree.add_child(slot, "Child of Main Child 1 (PID: 3)");

        let screen = render_to_string(&tree);
        assert!(screen.contains("Parent (PID: 1)"));
        assert!(screen.contains("Main Child 1 (PID: 2)"));
        assert!(screen.contains("└─ Child of Main Child 1"));
    }
}
