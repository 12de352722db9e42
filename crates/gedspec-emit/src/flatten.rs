//! Description flattening.
//!
//! Record descriptions start life as fragments of the source document's
//! markup. Before emission they are reduced to plain text and re-wrapped to
//! a fixed column, with continuation lines indented to sit under the first.
//! The trait seam exists so a richer converter can be swapped in; the
//! default strips the markup constructs the source documents actually use.

/// Reduce marked-up prose to plain wrapped text. `indent` is the number of
/// columns already consumed by the field prefix; continuation lines are
/// indented by exactly that much.
pub trait TextFlattener {
    fn flatten(&self, text: &str, indent: usize) -> String;
}

/// Markup stripper and greedy line wrapper.
///
/// Paragraph breaks survive as empty lines; everything inside a paragraph is
/// rewrapped at `width` minus the indent. Inline code loses its backticks,
/// emphasis markers are dropped, and bracketed link text keeps only the
/// text.
#[derive(Debug, Clone)]
pub struct PlainFlattener {
    width: usize,
}

impl PlainFlattener {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    fn wrap(&self, paragraph: &str, columns: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
            } else if line.len() + 1 + word.len() <= columns {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

impl Default for PlainFlattener {
    fn default() -> Self {
        Self::new(79)
    }
}

impl TextFlattener for PlainFlattener {
    fn flatten(&self, text: &str, indent: usize) -> String {
        let columns = self.width.saturating_sub(indent).max(1);
        let plain = strip_markup(text);

        let mut lines: Vec<String> = Vec::new();
        for paragraph in plain.split("\n\n") {
            let wrapped = self.wrap(paragraph, columns);
            if wrapped.is_empty() {
                continue;
            }
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(wrapped);
        }
        lines.join(&format!("\n{}", " ".repeat(indent)))
    }
}

/// Drop inline markup while leaving the words alone.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '`' | '*' => {}
            '_' => {
                // underscores inside words are literal, emphasis hugs spaces
                let boundary = out.ends_with(char::is_whitespace) || out.is_empty();
                let closing = chars.peek().map_or(true, |n| n.is_whitespace());
                if !boundary && !closing {
                    out.push('_');
                }
            }
            '[' => {}
            ']' => {
                // drop a following (url) or reference label
                if chars.peek() == Some(&'(') {
                    for inner in chars.by_ref() {
                        if inner == ')' {
                            break;
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
