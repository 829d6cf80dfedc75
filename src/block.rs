use serde::Serialize;

/// Inline text spans with formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Span {
    Plain(String),
    Bold(String),
    BoldItalic(String),
    Code(String),
}

impl Span {
    /// The text carried by the span, without its markers.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Bold(text) | Span::BoldItalic(text) | Span::Code(text) => {
                text
            }
        }
    }
}

/// A run of consecutive list lines of the same kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<Vec<Span>>,
}

/// Block-level elements of a rendered explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, content: Vec<Span> },
    Paragraph { content: Vec<Span> },
    List(List),
    Rule,
    Spacer,
}

/// The ordered blocks produced by one render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub(crate) fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Walk every block in source order.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        for block in &self.blocks {
            match block {
                Block::Heading { level, content } => visitor.heading(*level, content),
                Block::Paragraph { content } => visitor.paragraph(content),
                Block::List(list) => visitor.list(list),
                Block::Rule => visitor.rule(),
                Block::Spacer => visitor.spacer(),
            }
        }
    }
}

/// Maps each block variant onto a presentation primitive.
///
/// Backends implement this and are driven by [`Document::accept`].
pub trait Visitor {
    fn heading(&mut self, level: u8, content: &[Span]);
    fn paragraph(&mut self, content: &[Span]);
    fn list(&mut self, list: &List);
    fn rule(&mut self);
    fn spacer(&mut self);
}
