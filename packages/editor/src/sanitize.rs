//! # Sanitization
//!
//! Strips unsafe markup from rich text and unsafe schemes from links.
//!
//! Output is canonical: allowed tags are re-emitted in one fixed form, stray
//! markup characters are escaped, and valid entities are kept verbatim. Running
//! the sanitizer over its own output therefore changes nothing.

use pagecraft_model::{FieldKind, PageContent};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::warn;
use url::{ParseError, Url};

/// Turns arbitrary markup into safe markup. Implementations must be
/// idempotent and free of side effects.
pub trait HtmlSanitizer: Send + Sync {
    fn sanitize_html(&self, markup: &str) -> String;
}

/// Which URL schemes links may use. Scheme-less (relative) URLs are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    allowed_schemes: Vec<String>,
}

impl UrlPolicy {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_schemes: schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Relative URLs are safe. Absolute ones need an allowed scheme and must
    /// parse; a malformed absolute URL is rejected.
    pub fn is_safe(&self, url: &str) -> bool {
        match Url::parse(&normalize_url(url)) {
            Ok(parsed) => self.allowed_schemes.iter().any(|s| s == parsed.scheme()),
            Err(ParseError::RelativeUrlWithoutBase) => true,
            Err(_) => false,
        }
    }

    /// The trimmed URL if it is safe, otherwise the empty string
    pub fn sanitize(&self, url: &str) -> String {
        if self.is_safe(url) {
            url.trim().to_string()
        } else {
            String::new()
        }
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(["http", "https", "mailto", "tel"])
    }
}

/// Allow-list sanitizer for the rich text the editor produces
#[derive(Debug, Clone)]
pub struct AllowListSanitizer {
    allowed_tags: HashSet<&'static str>,
    /// Attributes allowed per tag; `"*"` applies to every tag
    allowed_attributes: HashMap<&'static str, Vec<&'static str>>,
    urls: UrlPolicy,
}

const VOID_TAGS: &[&str] = &["br"];

/// Tags whose whole content is dropped along with them
const OPAQUE_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea", "title",
];

const URL_ATTRIBUTES: &[&str] = &["href"];

impl AllowListSanitizer {
    pub fn new(urls: UrlPolicy) -> Self {
        let allowed_tags = [
            "p", "br", "strong", "b", "em", "i", "u", "s", "a", "ul", "ol", "li", "blockquote",
            "code", "pre", "span", "sub", "sup",
        ]
        .into_iter()
        .collect();

        let mut allowed_attributes = HashMap::new();
        allowed_attributes.insert("*", vec!["class"]);
        allowed_attributes.insert("a", vec!["href", "title", "target", "rel"]);

        Self {
            allowed_tags,
            allowed_attributes,
            urls,
        }
    }

    fn attribute_allowed(&self, tag: &str, attribute: &str) -> bool {
        [tag, "*"].iter().any(|key| {
            self.allowed_attributes
                .get(key)
                .is_some_and(|attrs| attrs.contains(&attribute))
        })
    }

    fn emit_open_tag(&self, out: &mut String, tag: &str, attributes: &str) {
        out.push('<');
        out.push_str(tag);

        let mut seen = HashSet::new();
        for caps in attribute_re().captures_iter(attributes) {
            let name = caps[1].to_ascii_lowercase();
            if !self.attribute_allowed(tag, &name) || !seen.insert(name.clone()) {
                continue;
            }
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            if URL_ATTRIBUTES.contains(&name.as_str()) && !self.urls.is_safe(value) {
                continue;
            }
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }

        out.push('>');
    }
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self::new(UrlPolicy::default())
    }
}

impl HtmlSanitizer for AllowListSanitizer {
    fn sanitize_html(&self, markup: &str) -> String {
        let mut out = String::with_capacity(markup.len());
        let mut pos = 0;

        while pos < markup.len() {
            let rest = &markup[pos..];

            if rest.starts_with("<!--") {
                pos += rest.find("-->").map(|end| end + 3).unwrap_or(rest.len());
                continue;
            }

            if rest.starts_with('<') {
                let Some(caps) = tag_re().captures(rest) else {
                    out.push_str("&lt;");
                    pos += 1;
                    continue;
                };
                let whole = caps.get(0).map(|m| m.len()).unwrap_or(1);
                let closing = caps.get(1).is_some();
                let self_closing = caps.get(4).is_some();
                let tag = caps[2].to_ascii_lowercase();
                pos += whole;

                if OPAQUE_TAGS.contains(&tag.as_str()) {
                    if !closing && !self_closing {
                        pos += skip_opaque_content(&markup[pos..], &tag);
                    }
                    continue;
                }
                if !self.allowed_tags.contains(tag.as_str()) {
                    continue;
                }
                if closing {
                    if !VOID_TAGS.contains(&tag.as_str()) {
                        out.push_str("</");
                        out.push_str(&tag);
                        out.push('>');
                    }
                } else {
                    let attributes = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                    self.emit_open_tag(&mut out, &tag, attributes);
                }
                continue;
            }

            let Some(c) = rest.chars().next() else {
                break;
            };
            match c {
                '>' => out.push_str("&gt;"),
                '&' => match entity_re().find(rest) {
                    Some(entity) => {
                        out.push_str(entity.as_str());
                        pos += entity.len();
                        continue;
                    }
                    None => out.push_str("&amp;"),
                },
                other => out.push(other),
            }
            pos += c.len_utf8();
        }

        out
    }
}

/// Sanitize every rich-text and link field in the tree. Returns the cleaned
/// tree and how many fields were rewritten.
pub fn sanitize_content(
    content: &PageContent,
    html: &dyn HtmlSanitizer,
    urls: &UrlPolicy,
) -> (PageContent, usize) {
    let mut next = content.clone();
    let mut rewritten = 0;

    let ids: Vec<_> = content.ids().cloned().collect();
    for id in ids {
        let needs_work = content
            .get(&id)
            .is_some_and(|n| !n.props.clone().fields_mut().is_empty());
        if !needs_work {
            continue;
        }
        let Some(node) = next.node_mut(&id) else {
            continue;
        };
        for (field, value) in node.props.fields_mut() {
            let clean = match field {
                FieldKind::RichText => html.sanitize_html(value),
                FieldKind::Url => urls.sanitize(value),
            };
            if clean != *value {
                warn!(node_id = %id, field = ?field, "Sanitizer rewrote unsafe content");
                *value = clean;
                rewritten += 1;
            }
        }
    }

    // Leave untouched trees sharing every node with the input
    if rewritten == 0 {
        return (content.clone(), 0);
    }
    (next, rewritten)
}

fn skip_opaque_content(rest: &str, tag: &str) -> usize {
    let closing = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag)));
    match closing.ok().and_then(|re| re.find(rest)) {
        Some(m) => m.end(),
        None => rest.len(),
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pos = 0;
    while pos < value.len() {
        let rest = &value[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };
        match c {
            '&' => {
                if let Some(entity) = entity_re().find(rest) {
                    out.push_str(entity.as_str());
                    pos += entity.len();
                    continue;
                }
                out.push_str("&amp;");
            }
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
        pos += c.len_utf8();
    }
    out
}

/// Decode the entities browsers honor inside URLs, then drop whitespace and
/// control characters, so `java&#115;cript:` and `java\tscript:` are caught
fn normalize_url(url: &str) -> String {
    let decoded = numeric_entity_re().replace_all(url, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    let decoded = named_url_entity_re().replace_all(&decoded, |caps: &regex::Captures<'_>| {
        match caps[1].to_ascii_lowercase().as_str() {
            "colon" => ":".to_string(),
            _ => String::new(),
        }
    });

    decoded
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^<(/)?([A-Za-z][A-Za-z0-9]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/)?>"#,
        )
        .expect("tag pattern is valid")
    })
}

fn attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
            .expect("entity pattern is valid")
    })
}

fn numeric_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&#(?:([0-9]{1,7})|[xX]([0-9A-Fa-f]{1,6}));?").expect("numeric entity pattern is valid")
    })
}

fn named_url_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)&(colon|tab|newline);").expect("named entity pattern is valid")
    })
}
