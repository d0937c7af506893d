//! HTML → Markdown rendering over the arena DOM.
//!
//! Used to turn descriptions and content documents into readable text.
//! Block separation is lazy: a block only marks that a blank line is due,
//! and the blank line is written when the next piece of content arrives,
//! so empty wrappers never produce stray blank lines.

use super::arena::{Dom, NodeId};
use super::sink::parse_html;

/// Escape special Markdown characters in text.
///
/// Escapes backslash, emphasis, link brackets, backticks, pipes, angle
/// brackets, `#` at line start and `!` before `[`.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' => {
                result.push('\\');
                result.push(c);
            }
            '#' if at_line_start => result.push_str("\\#"),
            '!' if chars.peek() == Some(&'[') => result.push_str("\\!"),
            _ => result.push(c),
        }
        at_line_start = c == '\n';
    }

    result
}

/// Longest run of `ch` in `content`.
fn longest_run(content: &str, ch: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;
    for c in content.chars() {
        if c == ch {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }
    max_run
}

/// Smallest fence (at least 3) that does not occur in the content.
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Smallest backtick count that does not occur in inline code.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

/// Collapse HTML whitespace runs to single spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "aside"
            | "main"
            | "nav"
            | "figure"
            | "figcaption"
            | "body"
            | "html"
            | "address"
            | "dl"
            | "dt"
            | "dd"
            | "details"
            | "summary"
            | "hgroup"
            | "center"
    )
}

fn is_skipped(tag: &str) -> bool {
    matches!(
        tag,
        "head" | "title" | "script" | "style" | "template" | "noscript"
    )
}

struct ListContext {
    ordered: bool,
    counter: usize,
}

struct MarkdownWriter<'a> {
    dom: &'a Dom,
    output: String,
    line_prefix: String,
    list_stack: Vec<ListContext>,
    at_line_start: bool,
    pending_break: bool,
    /// Set right after a list bullet so the item's first block stays on the bullet line.
    after_bullet: bool,
}

impl<'a> MarkdownWriter<'a> {
    fn new(dom: &'a Dom) -> Self {
        Self {
            dom,
            output: String::new(),
            line_prefix: String::new(),
            list_stack: Vec::new(),
            at_line_start: true,
            pending_break: false,
            after_bullet: false,
        }
    }

    fn newline(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Flush any pending block separation and write the line prefix.
    fn begin_content(&mut self) {
        if self.after_bullet {
            self.pending_break = false;
            self.after_bullet = false;
        }
        if self.pending_break && !self.output.is_empty() {
            if !self.at_line_start {
                self.newline();
            }
            self.output.push_str(self.line_prefix.trim_end());
            self.newline();
        }
        self.pending_break = false;
        if self.at_line_start {
            self.output.push_str(&self.line_prefix);
            self.at_line_start = false;
        }
    }

    fn write_text(&mut self, text: &str) {
        let collapsed = collapse_whitespace(text);
        let only_space = collapsed.trim().is_empty();
        if collapsed.is_empty() || (only_space && (self.pending_break || self.at_line_start)) {
            return;
        }

        let mut s = collapsed.as_str();
        if self.at_line_start || self.pending_break || self.output.ends_with([' ', '\n']) {
            s = s.trim_start();
        }
        if s.is_empty() {
            return;
        }
        self.begin_content();
        self.output.push_str(&escape_markdown(s));
    }

    fn walk_children(&mut self, id: NodeId) {
        for child in self.dom.children(id) {
            self.walk(child);
        }
    }

    fn walk(&mut self, id: NodeId) {
        if let Some(text) = self.dom.text(id) {
            self.write_text(text);
            return;
        }
        let Some(tag) = self.dom.element_name(id).map(|n| n.to_string()) else {
            // Document root
            self.walk_children(id);
            return;
        };
        let tag = tag.as_str();

        match tag {
            _ if is_skipped(tag) => {}

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.pending_break = true;
                self.begin_content();
                self.output.push_str(&"#".repeat(level));
                self.output.push(' ');
                self.walk_children(id);
                self.pending_break = true;
            }

            "ul" | "ol" => {
                self.pending_break = true;
                let start = self
                    .dom
                    .get_attr(id, "start")
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(1);
                self.list_stack.push(ListContext {
                    ordered: tag == "ol",
                    counter: start.saturating_sub(1),
                });
                self.walk_children(id);
                self.list_stack.pop();
                self.pending_break = true;
            }

            "li" => {
                let nested = self.list_stack.len() > 1;
                let first = self
                    .list_stack
                    .last()
                    .is_some_and(|ctx| ctx.counter == 0);
                if self.pending_break && !(nested && first) && !self.output.is_empty() {
                    self.begin_content();
                } else if !self.at_line_start {
                    self.newline();
                }
                self.pending_break = false;
                self.after_bullet = false;
                if self.at_line_start {
                    self.output.push_str(&self.line_prefix);
                    self.at_line_start = false;
                }

                let bullet = match self.list_stack.last_mut() {
                    Some(ctx) => {
                        ctx.counter += 1;
                        if ctx.ordered {
                            format!("{}. ", ctx.counter)
                        } else {
                            "- ".to_string()
                        }
                    }
                    None => "- ".to_string(),
                };
                self.output.push_str(&bullet);
                self.after_bullet = true;

                let old_prefix = self.line_prefix.clone();
                self.line_prefix.push_str(&" ".repeat(bullet.len()));
                self.walk_children(id);
                self.line_prefix = old_prefix;
                self.after_bullet = false;
                self.pending_break = false;
            }

            "blockquote" => {
                self.pending_break = true;
                let old_prefix = self.line_prefix.clone();
                self.line_prefix.push_str("> ");
                self.walk_children(id);
                self.line_prefix = old_prefix;
                self.pending_break = true;
            }

            "pre" => {
                let content = self.dom.text_content(id);
                let content = content.trim_end_matches('\n');
                let fence = "`".repeat(calculate_fence_length(content, '`'));
                self.pending_break = true;
                self.begin_content();
                self.output.push_str(&fence);
                self.newline();
                for line in content.lines() {
                    self.output.push_str(&self.line_prefix);
                    self.output.push_str(line);
                    self.newline();
                }
                self.output.push_str(&self.line_prefix);
                self.output.push_str(&fence);
                self.at_line_start = false;
                self.pending_break = true;
            }

            "code" | "kbd" | "samp" | "tt" => {
                let content = collapse_whitespace(&self.dom.text_content(id));
                if content.trim().is_empty() {
                    return;
                }
                self.begin_content();
                let ticks = "`".repeat(calculate_inline_code_ticks(&content));
                let spacer = if content.starts_with('`') || content.ends_with('`') {
                    " "
                } else {
                    ""
                };
                self.output
                    .push_str(&format!("{ticks}{spacer}{content}{spacer}{ticks}"));
            }

            "em" | "i" | "cite" | "strong" | "b" => {
                if self.dom.text_content(id).trim().is_empty() {
                    return self.walk_children(id);
                }
                let marker = if matches!(tag, "strong" | "b") { "**" } else { "*" };
                self.begin_content();
                self.output.push_str(marker);
                self.walk_children(id);
                // Emphasis markers must hug the text
                let trimmed_len = self.output.trim_end().len();
                self.output.truncate(trimmed_len);
                self.output.push_str(marker);
            }

            "a" => match self.dom.get_attr(id, "href") {
                Some(href) if !href.is_empty() && !self.dom.text_content(id).trim().is_empty() => {
                    let href = href.to_string();
                    self.begin_content();
                    self.output.push('[');
                    self.walk_children(id);
                    self.output.push_str(&format!("]({})", href));
                }
                _ => self.walk_children(id),
            },

            "img" => {
                let src = self.dom.get_attr(id, "src").unwrap_or("").to_string();
                let alt = self.dom.get_attr(id, "alt").unwrap_or("").to_string();
                self.begin_content();
                self.output
                    .push_str(&format!("![{}]({})", escape_markdown(&alt), src));
            }

            "br" => {
                if !self.at_line_start && !self.pending_break {
                    self.output.push('\\');
                    self.newline();
                }
            }

            "hr" => {
                self.pending_break = true;
                self.begin_content();
                self.output.push_str("---");
                self.pending_break = true;
            }

            "tr" => {
                let cells: Vec<String> = self
                    .dom
                    .element_children(id)
                    .map(|cell| {
                        escape_markdown(collapse_whitespace(&self.dom.text_content(cell)).trim())
                    })
                    .collect();
                if !cells.is_empty() {
                    if !self.at_line_start {
                        self.newline();
                    }
                    self.begin_content();
                    self.output.push_str(&cells.join(" | "));
                    self.newline();
                }
            }

            "table" => {
                self.pending_break = true;
                self.walk_children(id);
                self.pending_break = true;
            }

            _ if is_block(tag) => {
                self.pending_break = true;
                self.walk_children(id);
                self.pending_break = true;
            }

            _ => self.walk_children(id),
        }
    }

    fn finish(self) -> String {
        self.output.trim().to_string()
    }
}

/// Render the subtree under `root` as Markdown, trimmed.
pub fn to_markdown(dom: &Dom, root: NodeId) -> String {
    let mut writer = MarkdownWriter::new(dom);
    if dom.element_name(root).is_some() {
        writer.walk(root);
    } else {
        writer.walk_children(root);
    }
    writer.finish()
}

/// Parse an HTML string (document or fragment) and render its body.
pub fn html_to_markdown(html: &str) -> String {
    let dom = parse_html(html);
    let root = dom.find_by_tag("body").unwrap_or(dom.document());
    to_markdown(&dom, root)
}
