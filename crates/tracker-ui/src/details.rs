//! HTML for the details pane.

use chrono::{DateTime, Utc};
use tracker_services::Comment;

use crate::models::format_pretty_date;

const DETAILS_STYLE: &str = "<style>\
.comment {color: #000; background-color: #ddffff; padding: 5px 10px; border-left: 6px solid #ccc; display:inline}\
p {padding-left:10px;}\
</style>";

/// Turns markdown into an HTML fragment. Must not fail; unknown syntax passes through as text.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// Small renderer covering paragraphs, ATX headings and `-`/`*` bullet lists.
/// Everything else is escaped text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicMarkdown;

impl MarkdownRenderer for BasicMarkdown {
    fn render(&self, markdown: &str) -> String {
        let mut html = String::new();
        let mut paragraph: Vec<&str> = Vec::new();
        let mut in_list = false;

        for line in markdown.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                flush_paragraph(&mut html, &mut paragraph);
                close_list(&mut html, &mut in_list);
                continue;
            }

            if let Some((level, text)) = heading(trimmed) {
                flush_paragraph(&mut html, &mut paragraph);
                close_list(&mut html, &mut in_list);
                html.push_str(&format!("<h{level}>{}</h{level}>\n", escape_html(text)));
                continue;
            }

            if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                flush_paragraph(&mut html, &mut paragraph);
                if !in_list {
                    html.push_str("<ul>\n");
                    in_list = true;
                }
                html.push_str(&format!("<li>{}</li>\n", escape_html(item.trim())));
                continue;
            }

            close_list(&mut html, &mut in_list);
            paragraph.push(trimmed);
        }

        flush_paragraph(&mut html, &mut paragraph);
        close_list(&mut html, &mut in_list);
        html
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..]
        .strip_prefix(' ')
        .map(|text| (level, text.trim_end_matches('#').trim()))
}

fn flush_paragraph(html: &mut String, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    html.push_str("<p>");
    html.push_str(&escape_html(&lines.join("\n")));
    html.push_str("</p>\n");
    lines.clear();
}

fn close_list(html: &mut String, in_list: &mut bool) {
    if *in_list {
        html.push_str("</ul>\n");
        *in_list = false;
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One `show_details` push, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsDocument {
    pub description: Option<String>,
    pub url: Option<String>,
    pub comments: Option<Vec<Comment>>,
}

impl DetailsDocument {
    pub fn new(
        description: Option<String>,
        url: Option<String>,
        comments: Option<Vec<Comment>>,
    ) -> Self {
        Self {
            description,
            url,
            comments,
        }
    }

    /// Style block, description, one `comment` block per comment, then the issue link.
    pub fn to_html(&self, renderer: &dyn MarkdownRenderer, now: DateTime<Utc>) -> String {
        let mut html = String::from(DETAILS_STYLE);

        if let Some(description) = &self.description {
            html.push_str(&renderer.render(description));
        }
        html.push_str("<br/>");

        for comment in self.comments.iter().flatten() {
            html.push_str("<div class=\"comment\"><div class=\"comment_author_date\"><strong>");
            html.push_str(&escape_html(&comment.author));
            html.push_str("&nbsp;(");
            html.push_str(&format_pretty_date(comment.created_at, now));
            html.push_str(")</strong></div>");
            html.push_str(&renderer.render(&comment.text));
            html.push_str("</div><br/>");
        }

        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            let url = escape_html(url.trim());
            html.push_str(&format!("<a href=\"{url}\">{url}</a><br/>"));
        }

        html
    }
}
