//! The link normalizer: rewrites inline citations into HTML anchors, then
//! renders the result as Markdown.
//!
//! Hosted search agents cite sources as `([label](url))`. Rendered as-is that
//! is an awkward Markdown construct, so the citation's inner `(url)` is
//! replaced with a real anchor before the whole answer goes through the
//! Markdown renderer.

use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

lazy_static! {
    // label: anything but `]`; url: http(s), terminated by the first `)`.
    static ref CITATION: Regex =
        Regex::new(r"\(\[([^\]]+)\]\((https?://[^)]+)\)\)").unwrap();
}

/// Rewrite every citation `([label](url))` into
/// `([label](<a href="url" target="_blank">url</a>))`.
///
/// The outer brackets and parentheses are preserved; only the inner `(url)`
/// becomes an anchor, and the anchor's visible text is the URL itself, not
/// the label. One linear regex pass, left to right, non-overlapping. Input
/// without citations comes back unchanged.
///
/// Known limitation: a URL containing a literal `)` terminates the match
/// early and is left alone. Parenthesised URLs are rare in the news links
/// this handles, so the pattern is kept narrow on purpose.
pub fn rewrite_citations(text: &str) -> String {
    CITATION
        .replace_all(text, |caps: &Captures| {
            let label = &caps[1];
            let url = &caps[2];
            format!(r#"([{label}](<a href="{url}" target="_blank">{url}</a>))"#)
        })
        .into_owned()
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render Markdown to HTML with the extended feature set.
pub fn render_markdown(text: &str) -> anyhow::Result<String> {
    let parser = Parser::new_ext(text, markdown_options());
    let mut buffer = Vec::new();
    html::write_html_io(&mut buffer, parser)?;
    Ok(String::from_utf8(buffer)?)
}

/// Turn a raw agent answer into an HTML fragment.
///
/// Citations are rewritten first, then the whole answer is rendered as
/// Markdown. If rendering fails the citation-rewritten text is returned
/// as-is; a broken renderer must not lose the answer.
pub fn normalize(answer: &str) -> String {
    let linked = rewrite_citations(answer);
    match render_markdown(&linked) {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!("markdown rendering failed, returning plain text: {err}");
            linked
        }
    }
}
