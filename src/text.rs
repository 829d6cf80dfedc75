use console::Style;

use crate::block::{Document, List, Span, Visitor};

const RULE_WIDTH: usize = 40;

/// Render a document as terminal text, with ANSI styling when `styled` is set.
pub fn document_to_text(document: &Document, styled: bool) -> String {
    let mut writer = TextWriter::new(styled);
    document.accept(&mut writer);
    writer.out
}

struct TextWriter {
    out: String,
    heading: Style,
    bold: Style,
    bold_italic: Style,
    code: Style,
    marker: Style,
}

impl TextWriter {
    fn new(styled: bool) -> Self {
        let style = |s: Style| s.force_styling(styled);
        Self {
            out: String::new(),
            heading: style(Style::new().green().bold()),
            bold: style(Style::new().bold()),
            bold_italic: style(Style::new().green().bold().italic()),
            code: style(Style::new().cyan()),
            marker: style(Style::new().green().bold()),
        }
    }

    fn spans(&mut self, spans: &[Span]) {
        for span in spans {
            let text = match span {
                Span::Plain(text) => text.clone(),
                Span::Bold(text) => self.bold.apply_to(text).to_string(),
                Span::BoldItalic(text) => self.bold_italic.apply_to(text).to_string(),
                Span::Code(text) => self.code.apply_to(text).to_string(),
            };
            self.out.push_str(&text);
        }
    }
}

impl Visitor for TextWriter {
    fn heading(&mut self, _level: u8, content: &[Span]) {
        let plain: String = content.iter().map(Span::text).collect();
        let line = self.heading.apply_to(plain).to_string();
        self.out.push_str(&line);
        self.out.push('\n');
    }

    fn paragraph(&mut self, content: &[Span]) {
        self.spans(content);
        self.out.push('\n');
    }

    fn list(&mut self, list: &List) {
        for (i, item) in list.items.iter().enumerate() {
            let marker = if list.ordered {
                format!("{}.", i + 1)
            } else {
                "•".to_string()
            };
            let marker = self.marker.apply_to(marker).to_string();
            self.out.push_str("  ");
            self.out.push_str(&marker);
            self.out.push(' ');
            self.spans(item);
            self.out.push('\n');
        }
    }

    fn rule(&mut self) {
        self.out.push_str(&"─".repeat(RULE_WIDTH));
        self.out.push('\n');
    }

    fn spacer(&mut self) {
        self.out.push('\n');
    }
}
