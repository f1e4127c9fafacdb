//! Matching URIs against resource templates.
//!
//! Supports simple `{var}` expressions, which match one or more characters
//! other than `/`, and reserved `{+var}` expressions, which match across
//! `/`. A brace that does not close is treated as literal text.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var { name: String, reserved: bool },
}

/// A parsed resource URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            literal.push_str(&rest[..open]);
            let expr = &rest[open + 1..close];
            let (name, reserved) = match expr.strip_prefix('+') {
                Some(name) => (name, true),
                None => (expr, false),
            };
            if name.is_empty() {
                literal.push_str(&rest[open..=close]);
            } else {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var {
                    name: name.to_string(),
                    reserved,
                });
            }
            rest = &rest[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: template.to_string(),
            segments,
        }
    }

    /// The template text this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the template's variables, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match `uri`, returning the variable bindings on success.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut bindings = HashMap::new();
        match_from(&self.segments, uri, &mut bindings).then_some(bindings)
    }
}

fn match_from(segments: &[Segment], input: &str, bindings: &mut HashMap<String, String>) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return input.is_empty();
    };

    match first {
        Segment::Literal(lit) => input
            .strip_prefix(lit.as_str())
            .is_some_and(|tail| match_from(rest, tail, bindings)),
        Segment::Var { name, reserved } => {
            let limit = if *reserved {
                input.len()
            } else {
                input.find('/').unwrap_or(input.len())
            };
            // Longest candidate first, so a trailing variable takes the rest.
            let mut ends: Vec<usize> = input[..limit]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            ends.reverse();
            for end in ends {
                if match_from(rest, &input[end..], bindings) {
                    bindings.insert(name.clone(), input[..end].to_string());
                    return true;
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_variable() {
        let t = UriTemplate::parse("users://{id}/profile");
        let b = t.matches("users://42/profile").unwrap();
        assert_eq!(b["id"], "42");
        assert!(t.matches("users:///profile").is_none());
        assert!(t.matches("users://4/2/profile").is_none());
    }

    #[test]
    fn test_reserved_variable_spans_slashes() {
        let t = UriTemplate::parse("file:///{+path}");
        let b = t.matches("file:///a/b/c.txt").unwrap();
        assert_eq!(b["path"], "a/b/c.txt");
    }

    #[test]
    fn test_multiple_variables() {
        let t = UriTemplate::parse("repo://{owner}/{name}");
        let b = t.matches("repo://rust-lang/rust").unwrap();
        assert_eq!(b["owner"], "rust-lang");
        assert_eq!(b["name"], "rust");
        assert_eq!(t.variables().collect::<Vec<_>>(), ["owner", "name"]);
    }

    #[test]
    fn test_prefixed_template_still_matches() {
        let t = UriTemplate::parse("r+users://{id}");
        assert_eq!(t.matches("r+users://7").unwrap()["id"], "7");
        assert!(t.matches("users://7").is_none());
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let t = UriTemplate::parse("odd://{x");
        assert!(t.matches("odd://{x").is_some());
        assert!(t.matches("odd://y").is_none());
    }
}
