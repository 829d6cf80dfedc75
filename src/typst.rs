use crate::block::{Document, List, Span, Visitor};
use crate::config::ReportConfig;
use crate::prediction::{Prediction, Verdict};

/// Convert a document to Typst markup
pub fn document_to_typst(document: &Document, config: &ReportConfig) -> String {
    let mut writer = TypstWriter::new(config);
    document.accept(&mut writer);
    writer.finish()
}

/// Typst markup for a full analysis report: title, verdict, then the explanation.
pub fn report_to_typst(prediction: &Prediction, config: &ReportConfig) -> String {
    let mut writer = TypstWriter::new(config);

    writer.out.push_str("#align(center)[\n#text(size: 20pt, weight: \"bold\")[");
    escape_into(&config.title, &mut writer.out);
    writer.out.push_str("]\n]\n\n");

    let verdict_color = match prediction.verdict() {
        Verdict::Healthy => "#059669",
        Verdict::Diseased => "#dc2626",
        Verdict::Error => "#6b7280",
    };
    writer.out.push_str("*Prediction:* #text(fill: rgb(\"");
    writer.out.push_str(verdict_color);
    writer.out.push_str("\"))[");
    escape_into(&prediction.prediction, &mut writer.out);
    writer.out.push_str("] (");
    writer.out.push_str(&prediction.verdict().to_string());
    writer.out.push_str(")\n\n#line(length: 100%)\n\n");

    prediction.document().accept(&mut writer);
    writer.finish()
}

/// Emits Typst markup, keeping every heading on the same page as the block after it.
struct TypstWriter {
    out: String,
    // A `#block(breakable: false)[` opened by a heading and not yet closed
    heading_open: bool,
}

impl TypstWriter {
    fn new(config: &ReportConfig) -> Self {
        let mut out = String::new();

        // Set up paragraph settings to prevent widows/orphans
        out.push_str("#set par(linebreaks: \"optimized\")\n");
        if config.page_numbers {
            out.push_str("#set page(numbering: \"1\")\n");
        }
        out.push_str("#show heading: set text(fill: rgb(\"");
        out.push_str(&config.accent);
        out.push_str("\"))\n\n");

        Self {
            out,
            heading_open: false,
        }
    }

    /// Close the heading group after the block that follows a heading.
    fn close_group(&mut self) {
        if self.heading_open {
            self.out.push_str("]\n\n");
            self.heading_open = false;
        }
    }

    fn finish(mut self) -> String {
        self.close_group();
        self.out
    }
}

impl Visitor for TypstWriter {
    fn heading(&mut self, level: u8, content: &[Span]) {
        let grouped = self.heading_open;
        if !grouped {
            self.out.push_str("#block(breakable: false)[\n");
        }
        for _ in 0..level {
            self.out.push('=');
        }
        self.out.push(' ');
        spans_to_typst(content, &mut self.out);
        self.out.push_str("\n\n");

        if grouped {
            self.close_group();
        } else {
            self.heading_open = true;
        }
    }

    fn paragraph(&mut self, content: &[Span]) {
        spans_to_typst(content, &mut self.out);
        self.out.push_str("\n\n");
        self.close_group();
    }

    fn list(&mut self, list: &List) {
        // Keep short lists together, let long ones break across pages
        if list.items.len() <= 5 && !self.heading_open {
            self.out.push_str("#block(breakable: false)[\n");
            list_to_typst(list, &mut self.out);
            self.out.push_str("]\n\n");
        } else {
            list_to_typst(list, &mut self.out);
            self.out.push('\n');
        }
        self.close_group();
    }

    fn rule(&mut self) {
        self.out.push_str("#line(length: 100%)\n\n");
        self.close_group();
    }

    fn spacer(&mut self) {
        self.out.push_str("#v(0.75em)\n\n");
        self.close_group();
    }
}

fn spans_to_typst(spans: &[Span], out: &mut String) {
    for span in spans {
        span_to_typst(span, out);
    }
}

fn span_to_typst(span: &Span, out: &mut String) {
    match span {
        Span::Plain(text) => escape_into(text, out),
        // `*` and `_` only delimit at word boundaries; the `;` keeps a following
        // `.`, `(` or `[` from extending the call
        Span::Bold(text) => {
            out.push_str("#strong[");
            escape_into(text, out);
            out.push_str("];");
        }
        Span::BoldItalic(text) => {
            out.push_str("#emph(strong[");
            escape_into(text, out);
            out.push_str("]);");
        }
        Span::Code(text) => {
            out.push('`');
            // Inline code never contains a backtick, the tokenizer stops at the first one
            out.push_str(text);
            out.push('`');
        }
    }
}

/// Escape characters that Typst markup would otherwise interpret.
fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '#' | '*' | '_' | '@' | '$' | '\\' | '`' | '<' | '>' | '[' | ']' | '=' | '-' | '+'
            | '/' | '~' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

fn list_to_typst(list: &List, out: &mut String) {
    // Typst numbers `+` items itself, starting from 1
    let prefix = if list.ordered { "+" } else { "-" };

    for item in &list.items {
        out.push_str(prefix);
        out.push(' ');
        spans_to_typst(item, out);
        out.push('\n');
    }
}
