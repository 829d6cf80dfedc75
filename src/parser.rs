use std::sync::OnceLock;

use regex::Regex;

use crate::block::{Block, Document, List, Span};

fn re_ordered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.\s").unwrap())
}

fn re_ordered_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+\.\s*").unwrap())
}

// Alternation is leftmost-first, so at any position the triple-asterisk
// branch wins over the double-asterisk one.
fn re_inline() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*\*(?<bold_italic>[^*]+)\*\*\*|\*\*(?<bold>[^*]+)\*\*|`(?<code>[^`]+)`")
            .unwrap()
    })
}

const BULLET_MARKERS: [&str; 3] = ["- ", "• ", "* "];

/// Render explanation text into blocks.
///
/// Never fails: anything unrecognized becomes paragraph text.
pub fn render<'a>(source: impl Into<Option<&'a str>>) -> Document {
    let Some(source) = source.into().filter(|s| !s.is_empty()) else {
        return Document::default();
    };

    let mut blocks = Vec::new();
    let mut pending: Option<List> = None;

    for line in source.split('\n') {
        let line = line.trim();

        if let Some((level, rest)) = heading(line) {
            flush(&mut pending, &mut blocks);
            blocks.push(Block::Heading {
                level,
                content: format_inline(rest),
            });
        } else if re_ordered_item().is_match(line) {
            let rest = &line[re_ordered_marker().find(line).map_or(0, |m| m.end())..];
            push_item(&mut pending, &mut blocks, true, rest);
        } else if let Some(rest) = bullet(line) {
            push_item(&mut pending, &mut blocks, false, rest);
        } else if line == "---" || line == "***" {
            flush(&mut pending, &mut blocks);
            blocks.push(Block::Rule);
        } else if line.is_empty() {
            flush(&mut pending, &mut blocks);
            blocks.push(Block::Spacer);
        } else {
            flush(&mut pending, &mut blocks);
            blocks.push(Block::Paragraph {
                content: format_inline(line),
            });
        }
    }
    flush(&mut pending, &mut blocks);

    tracing::trace!(blocks = blocks.len(), "rendered explanation");
    Document::new(blocks)
}

fn heading(line: &str) -> Option<(u8, &str)> {
    if let Some(rest) = line.strip_prefix("### ") {
        Some((3, rest))
    } else if let Some(rest) = line.strip_prefix("## ") {
        Some((2, rest))
    } else {
        line.strip_prefix("# ").map(|rest| (1, rest))
    }
}

fn bullet(line: &str) -> Option<&str> {
    BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim_start)
}

/// Append an item, flushing first when the pending list is of the other kind.
fn push_item(pending: &mut Option<List>, blocks: &mut Vec<Block>, ordered: bool, text: &str) {
    if pending.as_ref().is_some_and(|list| list.ordered != ordered) {
        flush(pending, blocks);
    }
    pending
        .get_or_insert_with(|| List {
            ordered,
            items: Vec::new(),
        })
        .items
        .push(format_inline(text));
}

fn flush(pending: &mut Option<List>, blocks: &mut Vec<Block>) {
    if let Some(list) = pending.take() {
        blocks.push(Block::List(list));
    }
}

/// Split one line into plain, bold, bold-italic and code spans.
pub fn format_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in re_inline().captures_iter(text) {
        // Group 0 always participates in a match.
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::Plain(text[last..whole.start()].to_string()));
        }

        let span = if let Some(m) = caps.name("bold_italic") {
            Span::BoldItalic(m.as_str().to_string())
        } else if let Some(m) = caps.name("bold") {
            Span::Bold(m.as_str().to_string())
        } else if let Some(m) = caps.name("code") {
            Span::Code(m.as_str().to_string())
        } else {
            Span::Plain(whole.as_str().to_string())
        };
        spans.push(span);
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span::Plain(text.to_string())
    }

    fn list(ordered: bool, items: &[&str]) -> Block {
        Block::List(List {
            ordered,
            items: items.iter().map(|item| vec![plain(item)]).collect(),
        })
    }

    #[test]
    fn empty_input() {
        assert!(render(None).is_empty());
        assert!(render("").is_empty());
    }

    #[test]
    fn same_input_same_document() {
        let text = "## Causes\n- **Fungal** spores\n1. prune\n\nSee `copper` spray ***early***.";
        assert_eq!(render(text), render(text));
    }

    #[test]
    fn headings() {
        assert_eq!(
            render("# Title").blocks(),
            &[Block::Heading {
                level: 1,
                content: vec![plain("Title")]
            }]
        );
        let doc = render("## Two\n### Three");
        assert_eq!(
            doc.blocks(),
            &[
                Block::Heading {
                    level: 2,
                    content: vec![plain("Two")]
                },
                Block::Heading {
                    level: 3,
                    content: vec![plain("Three")]
                },
            ]
        );
    }

    #[test]
    fn heading_text_is_inline_formatted() {
        assert_eq!(
            render("### About **Psa**").blocks(),
            &[Block::Heading {
                level: 3,
                content: vec![plain("About "), Span::Bold("Psa".to_string())]
            }]
        );
    }

    #[test]
    fn hash_without_space_is_paragraph() {
        assert_eq!(
            render("#hashtag").blocks(),
            &[Block::Paragraph {
                content: vec![plain("#hashtag")]
            }]
        );
        assert_eq!(
            render("#### Four").blocks(),
            &[Block::Paragraph {
                content: vec![plain("#### Four")]
            }]
        );
    }

    #[test]
    fn bullets_merge_into_one_list() {
        assert_eq!(render("- a\n- b\n- c").blocks(), &[list(false, &["a", "b", "c"])]);
    }

    #[test]
    fn all_bullet_markers_share_a_list() {
        assert_eq!(render("- a\n• b\n* c").blocks(), &[list(false, &["a", "b", "c"])]);
    }

    #[test]
    fn ordered_items_drop_their_numbers() {
        assert_eq!(
            render("1. first\n2. second").blocks(),
            &[list(true, &["first", "second"])]
        );
        assert_eq!(render("42. x\n7.\ty").blocks(), &[list(true, &["x", "y"])]);
    }

    #[test]
    fn only_ascii_digits_start_ordered_items() {
        assert_eq!(
            render("\u{0661}. x").blocks(),
            &[Block::Paragraph {
                content: vec![plain("\u{0661}. x")]
            }]
        );
        assert_eq!(
            render("1\u{0662}. x").blocks(),
            &[Block::Paragraph {
                content: vec![plain("1\u{0662}. x")]
            }]
        );
    }

    #[test]
    fn kind_change_flushes() {
        assert_eq!(
            render("- a\n1. b").blocks(),
            &[list(false, &["a"]), list(true, &["b"])]
        );
    }

    #[test]
    fn indented_list_lines_are_trimmed() {
        assert_eq!(render("  - a\n\t- b").blocks(), &[list(false, &["a", "b"])]);
    }

    #[test]
    fn non_list_lines_flush() {
        let doc = render("- a\n# H\n- b\n---\n- c\n\n- d\ntext");
        assert_eq!(
            doc.blocks(),
            &[
                list(false, &["a"]),
                Block::Heading {
                    level: 1,
                    content: vec![plain("H")]
                },
                list(false, &["b"]),
                Block::Rule,
                list(false, &["c"]),
                Block::Spacer,
                list(false, &["d"]),
                Block::Paragraph {
                    content: vec![plain("text")]
                },
            ]
        );
    }

    #[test]
    fn bare_markers_degrade_to_paragraphs() {
        assert_eq!(
            render("-\n1.").blocks(),
            &[
                Block::Paragraph {
                    content: vec![plain("-")]
                },
                Block::Paragraph {
                    content: vec![plain("1.")]
                },
            ]
        );
    }

    #[test]
    fn list_item_keeps_formatting() {
        assert_eq!(
            render("- use `copper` **early**").blocks(),
            &[Block::List(List {
                ordered: false,
                items: vec![vec![
                    plain("use "),
                    Span::Code("copper".to_string()),
                    plain(" "),
                    Span::Bold("early".to_string()),
                ]],
            })]
        );
    }

    #[test]
    fn rules() {
        assert_eq!(render("---").blocks(), &[Block::Rule]);
        assert_eq!(render("  ***  ").blocks(), &[Block::Rule]);
        assert_eq!(
            render("----").blocks(),
            &[Block::Paragraph {
                content: vec![plain("----")]
            }]
        );
    }

    #[test]
    fn blank_lines_become_spacers() {
        assert_eq!(render("   ").blocks(), &[Block::Spacer]);
        assert_eq!(
            render("a\n\n \nb").blocks(),
            &[
                Block::Paragraph {
                    content: vec![plain("a")]
                },
                Block::Spacer,
                Block::Spacer,
                Block::Paragraph {
                    content: vec![plain("b")]
                },
            ]
        );
    }

    #[test]
    fn crlf_line_endings() {
        assert_eq!(
            render("- a\r\n- b\r\n").blocks(),
            &[list(false, &["a", "b"]), Block::Spacer]
        );
    }

    #[test]
    fn mixed_inline_spans() {
        assert_eq!(
            render("**bold** and ***boldital*** and `code`").blocks(),
            &[Block::Paragraph {
                content: vec![
                    Span::Bold("bold".to_string()),
                    plain(" and "),
                    Span::BoldItalic("boldital".to_string()),
                    plain(" and "),
                    Span::Code("code".to_string()),
                ]
            }]
        );
    }

    #[test]
    fn triple_asterisks_are_never_bold() {
        assert_eq!(format_inline("***x***"), vec![Span::BoldItalic("x".to_string())]);
    }

    #[test]
    fn unsupported_markers_stay_literal() {
        assert_eq!(format_inline("*italic* [link](x)"), vec![plain("*italic* [link](x)")]);
        assert_eq!(format_inline("**unclosed"), vec![plain("**unclosed")]);
        assert_eq!(format_inline("****"), vec![plain("****")]);
    }

    #[test]
    fn unbalanced_stars_fall_back_to_bold() {
        assert_eq!(
            format_inline("***x**"),
            vec![plain("*"), Span::Bold("x".to_string())]
        );
    }

    #[test]
    fn code_may_contain_asterisks() {
        assert_eq!(format_inline("`a**b`"), vec![Span::Code("a**b".to_string())]);
    }

    #[test]
    fn empty_text_has_no_spans() {
        assert!(format_inline("").is_empty());
    }

    #[test]
    fn spans_reassemble_source_text() {
        let line = "Apply **copper**, then `wait` 7 days; ***repeat*** if needed.";
        let joined: String = format_inline(line).iter().map(Span::text).collect();
        assert_eq!(joined, "Apply copper, then wait 7 days; repeat if needed.");
    }
}
