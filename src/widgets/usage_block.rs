use ratatui::{
    buffer::Buffer,
    layout::{Rect, Alignment},
    style::{Stylize, Style, Color},
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget, BorderType},
};

pub struct UsageWidget<'a> {
    cpu_text: &'a str,
    memory_text: &'a str,
    stale: bool,
}

impl<'a> UsageWidget<'a> {
    pub fn new(cpu_text: &'a str, memory_text: &'a str) -> Self {
        Self {
            cpu_text,
            memory_text,
            stale: false,
        }
    }

    /// Dims the labels after a failed sample.
    pub fn stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }
}

impl Widget for UsageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let value_style = if self.stale {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bold()
        };

        let text = Text::from(vec![
            Line::from(Span::styled(self.cpu_text, value_style)),
            Line::from(Span::styled(self.memory_text, value_style)),
        ]);

        let paragraph = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title("Usage")
                    .title_style(Style::new().bold().fg(Color::Cyan))
                    .border_type(BorderType::Plain)
                    .border_style(Style::new().fg(Color::Blue))
            )
            .alignment(Alignment::Left);

        paragraph.render(area, buf);
    }
}
