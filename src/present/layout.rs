//! Box drawing for panels and single-column tables.
//!
//! Panels and tables render to a `Vec<String>` of lines for a given width;
//! the caller decides where they are written. Layout works on display widths
//! so wide characters line up. ANSI escape sequences in the text are carried
//! through with zero width.

use unicode_width::UnicodeWidthChar;

const MIN_INNER_WIDTH: usize = 8;

/// Display width of `text`, ignoring ANSI escape sequences.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            skip_escape(&mut chars, &mut String::new());
        } else {
            width += ch.width().unwrap_or(0);
        }
    }
    width
}

fn skip_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, into: &mut String) {
    if chars.peek() != Some(&'[') {
        return;
    }
    for c in chars.by_ref() {
        into.push(c);
        if c.is_ascii_alphabetic() {
            break;
        }
    }
}

/// Hard-wrap one line to `width` display columns.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let line = line.replace('\t', "    ");
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            current.push(ch);
            skip_escape(&mut chars, &mut current);
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    out.push(current);
    out
}

/// Wrap every line of `text`, keeping blank lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let text = text.trim_end_matches('\n');
    if text.is_empty() {
        return vec![String::new()];
    }
    text.lines().flat_map(|line| wrap_line(line, width)).collect()
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(visible_width(text));
    format!("{text}{}", " ".repeat(fill))
}

fn fit_title(title: &str, width: usize) -> String {
    wrap_line(title, width).into_iter().next().unwrap_or_default()
}

/// How the border and title of a box are colored.
pub struct Paint<'a> {
    pub border: &'a dyn Fn(&str) -> String,
    pub title: &'a dyn Fn(&str) -> String,
}

fn inner_width(width: usize) -> usize {
    width.saturating_sub(4).max(MIN_INNER_WIDTH)
}

/// A rounded panel `width` columns wide with `title` in the top border.
pub fn panel(title: &str, body: &str, width: usize, paint: &Paint<'_>) -> Vec<String> {
    let inner = inner_width(width);
    let title = fit_title(title, inner.saturating_sub(2));
    let title_width = visible_width(&title);
    let border = paint.border;

    let mut lines = Vec::new();
    let top_fill = "─".repeat((inner + 2).saturating_sub(title_width + 3));
    lines.push(format!(
        "{}{}{}",
        border("╭─ "),
        (paint.title)(&title),
        border(&format!(" {top_fill}╮"))
    ));
    for line in wrap_text(body, inner) {
        lines.push(format!("{}{}{}", border("│ "), pad(&line, inner), border(" │")));
    }
    lines.push(border(&format!("╰{}╯", "─".repeat(inner + 2))));
    lines
}

/// A one-column table with a heavy header row.
pub fn table(header: &str, body: &str, width: usize, paint: &Paint<'_>) -> Vec<String> {
    let inner = inner_width(width);
    let border = paint.border;
    let rule = |left: &str, fill: &str, right: &str| {
        border(&format!("{left}{}{right}", fill.repeat(inner + 2)))
    };

    let mut lines = vec![rule("┏", "━", "┓")];
    for line in wrap_text(header, inner) {
        lines.push(format!(
            "{}{}{}",
            border("┃ "),
            (paint.title)(&pad(&line, inner)),
            border(" ┃")
        ));
    }
    lines.push(rule("┡", "━", "┩"));
    for line in wrap_text(body, inner) {
        lines.push(format!("{}{}{}", border("│ "), pad(&line, inner), border(" │")));
    }
    lines.push(rule("└", "─", "┘"));
    lines
}
