use std::collections::VecDeque;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Stylize, Style, Color},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Widget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct EventEntry {
    pub level: EventLevel,
    pub message: String,
}

/// Newest entries are drawn at the bottom; older ones scroll off the top.
pub struct EventLogWidget<'a> {
    entries: &'a VecDeque<EventEntry>,
}

impl<'a> EventLogWidget<'a> {
    pub fn new(entries: &'a VecDeque<EventEntry>) -> Self {
        Self { entries }
    }
}

impl Widget for EventLogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title("Events")
            .title_style(Style::new().bold().fg(Color::Cyan))
            .border_type(BorderType::Plain)
            .border_style(Style::new().fg(Color::Blue));

        let visible_rows = block.inner(area).height as usize;
        let skip = self.entries.len().saturating_sub(visible_rows);

        let lines: Vec<Line> = self.entries.iter().skip(skip).map(|entry| {
            let style = match entry.level {
                EventLevel::Info => Style::new().fg(Color::White),
                EventLevel::Warn => Style::new().fg(Color::Yellow),
                EventLevel::Error => Style::new().fg(Color::Red),
            };
            Line::from(Span::styled(entry.message.as_str(), style))
        }).collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
