//! Markdown documents with an optional YAML front matter block.

use crate::context::ExtractionContext;
use crate::error::Result;
use crate::extract::{extract_full_text_terms, extract_properties};
use crate::loader::DocumentExtractor;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value as Json;
use serde_yaml::Value as Yaml;

lazy_static! {
    static ref IMAGE: Regex = Regex::new(r"!\[(?P<alt>[^\]]*)\]\((?P<url>[^)\s]+)(?P<rest>[^)]*)\)").expect("valid regex");
    static ref HEADING: Regex = Regex::new(r"(?m)^#[ \t]+(?P<title>.+?)[ \t#\r]*$").expect("valid regex");
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownExtractor;

impl DocumentExtractor for MarkdownExtractor {
    fn load(&self, ctx: &mut dyn ExtractionContext, source: &str) -> Result<String> {
        let (front_matter, body) = split_front_matter(source);
        let metadata = match front_matter {
            Some(yaml) if !yaml.trim().is_empty() => yaml_to_json(serde_yaml::from_str(yaml)?),
            _ => Json::Null,
        };

        match metadata.get("title").and_then(Json::as_str) {
            Some(title) => ctx.set_title(title),
            None => {
                if let Some(caps) = HEADING.captures(body) {
                    ctx.set_title(&caps["title"]);
                }
            }
        }

        for (name, values) in extract_properties(&metadata) {
            for value in &values {
                ctx.add_property(&name, value);
            }
        }

        for term in extract_full_text_terms(source) {
            ctx.add_full_text_term(&term);
        }

        let content = IMAGE.replace_all(body, |caps: &Captures| {
            let url = &caps["url"];
            if is_external(url) {
                caps[0].to_string()
            } else {
                format!("![{}]({}{})", &caps["alt"], ctx.add_media(url), &caps["rest"])
            }
        });
        Ok(content.into_owned())
    }
}

fn is_external(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") || url.starts_with("data:")
}

/// Split a leading `---` delimited block off the source.
pub fn split_front_matter(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source.strip_prefix("---\n").or_else(|| source.strip_prefix("---\r\n")) else {
        return (None, source);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, source)
}

fn yaml_to_json(value: Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => serde_json::to_value(&n).unwrap_or(Json::Null),
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Json::Object(
            map.into_iter()
                .filter_map(|(k, v)| Some((yaml_key(k)?, yaml_to_json(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DocumentContext;

    fn load(source: &str, parent: &[&str]) -> crate::context::LoadedDocument {
        let parent: Vec<String> = parent.iter().map(|s| s.to_string()).collect();
        let mut ctx = DocumentContext::new(&parent);
        let content = MarkdownExtractor.load(&mut ctx, source).unwrap();
        ctx.finalize(".md".into(), "page.md".into(), content)
    }

    #[test]
    fn front_matter_becomes_properties() {
        let doc = load("---\ntitle: Hello\ntags: [rust, wiki]\nmeta:\n  draft: true\n---\nbody text\n", &[]);
        assert_eq!(doc.title, "Hello");
        assert_eq!(doc.facts.properties["tags"], vec!["rust", "wiki"]);
        assert_eq!(doc.facts.properties["meta/draft"], vec!["true"]);
        assert_eq!(doc.facts.properties["title"], vec!["Hello"]);
        assert_eq!(doc.content, "body text\n");
    }

    #[test]
    fn heading_is_fallback_title() {
        let doc = load("intro\n\n# Getting Started ##\ntext", &[]);
        assert_eq!(doc.title, "Getting Started");
        assert!(doc.facts.properties.is_empty());
        assert_eq!(load("no heading", &[]).title, "page.md");
    }

    #[test]
    fn images_are_registered_as_media() {
        let doc = load("![logo](img/logo.png \"Logo\") ![ext](https://x.org/a.png)", &["guide"]);
        assert_eq!(doc.medias.len(), 1);
        assert_eq!(doc.medias[0].source, "guide/img/logo.png");
        let expected = format!("![logo](/assets/medias/{} \"Logo\")", doc.medias[0].name);
        assert!(doc.content.starts_with(&expected), "{}", doc.content);
        assert!(doc.content.ends_with("![ext](https://x.org/a.png)"));
    }

    #[test]
    fn full_text_covers_whole_source() {
        let doc = load("---\ntag: rust\n---\n中文网", &[]);
        assert_eq!(doc.facts.full_text_terms["中文"], 1);
        assert_eq!(doc.facts.full_text_terms["中文网"], 1);
        assert_eq!(doc.facts.full_text_terms["ru"], 1);
    }

    #[test]
    fn unterminated_front_matter_is_body() {
        let (fm, body) = split_front_matter("---\ntitle: x\nno end");
        assert!(fm.is_none());
        assert_eq!(body, "---\ntitle: x\nno end");
        let (fm, body) = split_front_matter("---\r\na: 1\r\n---\r\nrest");
        assert_eq!(fm, Some("a: 1\r\n"));
        assert_eq!(body, "rest");
    }

    #[test]
    fn malformed_front_matter_is_an_error() {
        let mut ctx = DocumentContext::new(&[]);
        assert!(MarkdownExtractor.load(&mut ctx, "---\na: [1, 2\n---\n").is_err());
    }
}
