//! Front matter extraction.
//!
//! A document may start with a YAML block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! layout: default
//! ---
//! # {{ title }}
//! ```
//!
//! The block is parsed into [`Variables`]; everything after the closing
//! delimiter is the content. The closing delimiter may also be `...`, as in
//! a YAML document end marker.

use crate::render::Variables;
use serde_json::Value;
use thiserror::Error;

/// Opening (and closing) delimiter line.
const DELIMITER: &str = "---";

/// Lines accepted as the end of the metadata block.
const END_DELIMITERS: &[&str] = &["---", "..."];

/// Reserved key naming the layout that wraps a document.
pub const LAYOUT_KEY: &str = "layout";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter opened with `---` is never closed")]
    Unterminated,

    #[error("front matter is not a valid YAML mapping")]
    Yaml(#[from] serde_yaml::Error),
}

/// A document split into metadata and content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub variables: Variables,
    pub content: String,
}

impl FrontMatter {
    /// Raw `layout` value, `None` when absent or `null`.
    pub fn layout(&self) -> Option<&Value> {
        self.variables.get(LAYOUT_KEY).filter(|v| !v.is_null())
    }
}

/// Split `text` into front matter and content.
///
/// Without a leading delimiter the whole text is content and the variables
/// are empty.
pub fn parse(text: &str) -> Result<FrontMatter, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(rest) = strip_opening(text) else {
        return Ok(FrontMatter {
            variables: Variables::new(),
            content: text.to_owned(),
        });
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if END_DELIMITERS.contains(&trimmed) {
            return Ok(FrontMatter {
                variables: parse_yaml(&rest[..offset])?,
                content: rest[offset + line.len()..].to_owned(),
            });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

/// Remove the opening `---` line, if the text starts with one.
fn strip_opening(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    rest.strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
}

fn parse_yaml(yaml: &str) -> Result<Variables, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Variables::new());
    }
    let variables: Option<Variables> = serde_yaml::from_str(yaml)?;
    Ok(variables.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_with_front_matter() {
        let fm = parse("---\ntitle: Hi\n---\n# {{title}}").unwrap();
        assert_eq!(fm.variables.get("title"), Some(&json!("Hi")));
        assert_eq!(fm.content, "# {{title}}");
    }

    #[test]
    fn test_parse_without_front_matter() {
        let text = "# Just content\n\n---\nnot: metadata\n";
        let fm = parse(text).unwrap();
        assert!(fm.variables.is_empty());
        assert_eq!(fm.content, text);
    }

    #[test]
    fn test_parse_empty_block() {
        let fm = parse("---\n---\nbody").unwrap();
        assert!(fm.variables.is_empty());
        assert_eq!(fm.content, "body");
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let fm = parse("\u{feff}---\r\ntitle: Windows\r\n---\r\nline\r\n").unwrap();
        assert_eq!(fm.variables.get("title"), Some(&json!("Windows")));
        assert_eq!(fm.content, "line\r\n");
    }

    #[test]
    fn test_parse_dots_end_marker() {
        let fm = parse("---\ntags: [a, b]\n...\ncontent").unwrap();
        assert_eq!(fm.variables.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(fm.content, "content");
    }

    #[test]
    fn test_parse_nested_values() {
        let fm = parse("---\nauthor:\n  name: Ada\n  age: 36\ndraft: false\n---\n").unwrap();
        assert_eq!(
            fm.variables.get("author"),
            Some(&json!({ "name": "Ada", "age": 36 }))
        );
        assert_eq!(fm.variables.get("draft"), Some(&json!(false)));
        assert_eq!(fm.content, "");
    }

    #[test]
    fn test_parse_order_independent() {
        let a = parse("---\ntitle: T\nlayout: x\n---\nc").unwrap();
        let b = parse("---\nlayout: x\ntitle: T\n---\nc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_unterminated() {
        let err = parse("---\ntitle: Hi\n# no closing").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_parse_non_mapping_yaml() {
        let err = parse("---\n- just\n- a list\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_layout_accessor() {
        let fm = parse("---\nlayout: default\n---\n").unwrap();
        assert_eq!(fm.layout(), Some(&json!("default")));

        let fm = parse("---\nlayout:\n---\n").unwrap();
        assert_eq!(fm.layout(), None);

        let fm = parse("no front matter").unwrap();
        assert_eq!(fm.layout(), None);
    }
}
