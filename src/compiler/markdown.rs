//! Native Markdown compiler backed by comrak.
//!
//! Template tags (`{{ }}`, `{% %}`, `{# #}`) are swapped for opaque tokens
//! before parsing and put back afterwards, so Markdown never escapes their
//! quotes or reads `*` and `_` inside them as emphasis.

use super::{CompileError, Compiler};
use crate::{config::MarkdownConfig, site::Site};
use comrak::{Options, markdown_to_html};
use std::path::Path;

/// CommonMark with the usual GitHub extensions.
#[derive(Debug, Clone)]
pub struct MarkdownCompiler {
    /// Tables, strikethrough, autolinks, task lists, footnotes.
    gfm: bool,
    /// Typographic quotes and dashes.
    smart: bool,
    /// Keep raw HTML blocks and inline HTML.
    unsafe_html: bool,
}

impl Default for MarkdownCompiler {
    fn default() -> Self {
        Self {
            gfm: true,
            smart: false,
            unsafe_html: true,
        }
    }
}

impl MarkdownCompiler {
    pub fn from_config(config: &MarkdownConfig) -> Self {
        Self {
            gfm: config.gfm,
            smart: config.smart,
            unsafe_html: config.unsafe_html,
        }
    }
}

impl Compiler for MarkdownCompiler {
    fn compile(&self, _source: &Path, text: &str, _site: &Site) -> Result<String, CompileError> {
        let mut options = Options::default();
        options.extension.table = self.gfm;
        options.extension.strikethrough = self.gfm;
        options.extension.autolink = self.gfm;
        options.extension.tasklist = self.gfm;
        options.extension.footnotes = self.gfm;
        options.parse.smart = self.smart;
        options.render.r#unsafe = self.unsafe_html;

        let (masked, spans) = mask_template_spans(text);
        Ok(unmask_template_spans(markdown_to_html(&masked, &options), &spans))
    }
}

const TEMPLATE_DELIMITERS: [(&str, &str); 3] = [("{{", "}}"), ("{%", "%}"), ("{#", "#}")];

/// Plain word that comrak passes through untouched.
fn span_token(index: usize) -> String {
    format!("QUIRExSPAN{index}x")
}

/// Replace each closed template span with a token; unclosed openers stay.
fn mask_template_spans(text: &str) -> (String, Vec<&str>) {
    let mut masked = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        let tail = &rest[start..];
        let span_len = TEMPLATE_DELIMITERS.iter().find_map(|(open, close)| {
            let end = tail.strip_prefix(open)?.find(close)?;
            Some(open.len() + end + close.len())
        });

        match span_len {
            Some(len) => {
                masked.push_str(&rest[..start]);
                masked.push_str(&span_token(spans.len()));
                spans.push(&tail[..len]);
                rest = &tail[len..];
            }
            None => {
                masked.push_str(&rest[..=start]);
                rest = &tail[1..];
            }
        }
    }
    masked.push_str(rest);

    (masked, spans)
}

fn unmask_template_spans(html: String, spans: &[&str]) -> String {
    spans
        .iter()
        .enumerate()
        .fold(html, |html, (index, span)| {
            html.replace(&span_token(index), span)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(compiler: &MarkdownCompiler, text: &str) -> String {
        compiler
            .compile(Path::new("t.md"), text, &Site::default())
            .unwrap()
    }

    #[test]
    fn test_heading_and_paragraph() {
        let out = compile(&MarkdownCompiler::default(), "# Title\n\nHello *world*");
        assert_eq!(out, "<h1>Title</h1>\n<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn test_template_syntax_survives() {
        let out = compile(&MarkdownCompiler::default(), "# {{ title }}");
        assert_eq!(out, "<h1>{{ title }}</h1>\n");
    }

    #[test]
    fn test_template_quotes_not_escaped() {
        let out = compile(
            &MarkdownCompiler::default(),
            "{% include \"nav\" %}\n\nHi {{ t | default(\"d\") }}\n",
        );
        assert_eq!(
            out,
            "<p>{% include \"nav\" %}</p>\n<p>Hi {{ t | default(\"d\") }}</p>\n"
        );
    }

    #[test]
    fn test_template_spans_not_emphasized() {
        let compiler = MarkdownCompiler::default();
        let out = compile(&compiler, "{{ a * b }} and {{ c * d }}\n");
        assert_eq!(out, "<p>{{ a * b }} and {{ c * d }}</p>\n");

        let out = compile(&compiler, "*{{ x }}* {# note #}\n");
        assert_eq!(out, "<p><em>{{ x }}</em> {# note #}</p>\n");
    }

    #[test]
    fn test_mask_template_spans() {
        let text = "a {{ x }} { b {% if y %} {{ open";
        let (masked, spans) = mask_template_spans(text);
        assert_eq!(spans, vec!["{{ x }}", "{% if y %}"]);
        assert_eq!(
            masked,
            format!("a {} {{ b {} {{{{ open", span_token(0), span_token(1))
        );
        assert_eq!(unmask_template_spans(masked, &spans), text);
    }

    #[test]
    fn test_raw_html_kept_by_default() {
        let out = compile(&MarkdownCompiler::default(), "<div class=\"x\">hi</div>\n");
        assert!(out.contains("<div class=\"x\">hi</div>"));
    }

    #[test]
    fn test_raw_html_stripped_when_safe() {
        let compiler = MarkdownCompiler {
            unsafe_html: false,
            ..MarkdownCompiler::default()
        };
        let out = compile(&compiler, "<div>hi</div>\n");
        assert!(!out.contains("<div>"));
    }

    #[test]
    fn test_gfm_table() {
        let out = compile(&MarkdownCompiler::default(), "| a |\n|---|\n| 1 |\n");
        assert!(out.contains("<table>"));

        let plain = MarkdownCompiler {
            gfm: false,
            ..MarkdownCompiler::default()
        };
        assert!(!compile(&plain, "| a |\n|---|\n| 1 |\n").contains("<table>"));
    }
}
