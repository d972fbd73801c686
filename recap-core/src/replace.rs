//! Replacement string handling
//!
//! This module handles replacement templates that reference groups of a
//! match, and the [`Replacer`] trait that lets templates and closures share
//! one replacement loop.
//!
//! Template syntax:
//! - `$$`: a literal `$`
//! - `$N`, `${N}`: group N
//! - `${name}`: the named group
//! - `$&`: the whole match
//! - `` $` ``, `$'`: the text before and after the match
//! - `$+`: the highest numbered group that took part in the match
//! - `$_`: the whole input
//!
//! Any other `$` is literal. A group that does not exist or did not take part
//! expands to nothing.

use crate::engine::Regex;
use crate::error::MatchTimeoutError;
use crate::matches::Match;
use std::borrow::Cow;

/// A part of a replacement template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart<'t> {
    /// Literal text
    Literal(Cow<'t, str>),
    /// `$123`: the longest digit prefix naming a group, then literal digits
    Digits(Cow<'t, str>),
    /// `${12}`: exactly that group
    Number(usize),
    /// `${name}`
    Name(Cow<'t, str>),
    /// `$&`
    WholeMatch,
    /// `` $` ``
    Before,
    /// `$'`
    After,
    /// `$+`
    LastGroup,
    /// `$_`
    Input,
}

impl TemplatePart<'_> {
    fn into_owned(self) -> TemplatePart<'static> {
        match self {
            TemplatePart::Literal(s) => TemplatePart::Literal(Cow::Owned(s.into_owned())),
            TemplatePart::Digits(s) => TemplatePart::Digits(Cow::Owned(s.into_owned())),
            TemplatePart::Name(s) => TemplatePart::Name(Cow::Owned(s.into_owned())),
            TemplatePart::Number(n) => TemplatePart::Number(n),
            TemplatePart::WholeMatch => TemplatePart::WholeMatch,
            TemplatePart::Before => TemplatePart::Before,
            TemplatePart::After => TemplatePart::After,
            TemplatePart::LastGroup => TemplatePart::LastGroup,
            TemplatePart::Input => TemplatePart::Input,
        }
    }

    /// Append the expansion of this part for `m`
    fn append(&self, m: &Match<'_>, dst: &mut String) {
        match self {
            TemplatePart::Literal(text) => dst.push_str(text),
            TemplatePart::Digits(digits) => {
                // longest prefix that names a group wins
                for split in (1..=digits.len()).rev() {
                    if let Ok(index) = digits[..split].parse::<usize>()
                        && index < m.group_len()
                    {
                        dst.push_str(m.group_text(index));
                        dst.push_str(&digits[split..]);
                        return;
                    }
                }
            }
            TemplatePart::Number(index) => dst.push_str(m.group_text(*index)),
            TemplatePart::Name(name) => {
                if let Some(index) = m.regex().group_number(name) {
                    dst.push_str(m.group_text(index as usize));
                }
            }
            TemplatePart::WholeMatch => dst.push_str(m.as_str()),
            TemplatePart::Before => dst.push_str(&m.haystack()[..m.start()]),
            TemplatePart::After => dst.push_str(&m.haystack()[m.end()..]),
            TemplatePart::LastGroup => dst.push_str(m.group_text(m.last_group())),
            TemplatePart::Input => dst.push_str(m.haystack()),
        }
    }
}

/// Split the next part off the front of a template
fn next_part(template: &str) -> Option<(TemplatePart<'_>, &str)> {
    if template.is_empty() {
        return None;
    }

    let dollar = template.find('$').unwrap_or(template.len());
    if dollar > 0 {
        let (text, rest) = template.split_at(dollar);
        return Some((TemplatePart::Literal(Cow::Borrowed(text)), rest));
    }

    let rest = &template[1..];
    let literal_dollar = Some((TemplatePart::Literal(Cow::Borrowed("$")), rest));
    let Some(c) = rest.chars().next() else {
        return literal_dollar;
    };

    let part = match c {
        '$' => TemplatePart::Literal(Cow::Borrowed("$")),
        '&' => TemplatePart::WholeMatch,
        '`' => TemplatePart::Before,
        '\'' => TemplatePart::After,
        '+' => TemplatePart::LastGroup,
        '_' => TemplatePart::Input,
        '0'..='9' => {
            let len = rest
                .bytes()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(rest.len());
            return Some((TemplatePart::Digits(Cow::Borrowed(&rest[..len])), &rest[len..]));
        }
        '{' => {
            let Some(close) = rest.find('}') else {
                return literal_dollar;
            };
            let inner = &rest[1..close];
            let part = if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                match inner.parse::<usize>() {
                    Ok(n) => TemplatePart::Number(n),
                    Err(_) => return literal_dollar,
                }
            } else if is_group_name(inner) {
                TemplatePart::Name(Cow::Borrowed(inner))
            } else {
                return literal_dollar;
            };
            return Some((part, &rest[close + 1..]));
        }
        _ => return literal_dollar,
    };
    Some((part, &rest[c.len_utf8()..]))
}

fn is_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// A parsed replacement template, reusable across matches and patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    parts: Vec<TemplatePart<'static>>,
}

impl Template {
    /// Parse a template. Every string is a valid template.
    pub fn parse(template: &str) -> Self {
        let mut parts = Vec::new();
        let mut rest = template;
        while let Some((part, tail)) = next_part(rest) {
            parts.push(part.into_owned());
            rest = tail;
        }
        Template { parts }
    }

    /// Get the parts of the template
    pub fn parts(&self) -> &[TemplatePart<'static>] {
        &self.parts
    }

    /// Expand the template for a match
    pub fn expand(&self, m: &Match<'_>, dst: &mut String) {
        for part in &self.parts {
            part.append(m, dst);
        }
    }

    /// Expand a template string for a match without keeping the parse
    pub fn expand_str(template: &str, m: &Match<'_>, dst: &mut String) {
        let mut rest = template;
        while let Some((part, tail)) = next_part(rest) {
            part.append(m, dst);
            rest = tail;
        }
    }
}

/// Produces the replacement text for each match
///
/// Implemented for template strings, [`Template`], and closures taking a
/// [`Match`] and returning anything string-like.
pub trait Replacer {
    /// Append the replacement for `m` to `dst`
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String);
}

impl Replacer for &str {
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        Template::expand_str(self, m, dst);
    }
}

impl Replacer for String {
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        Template::expand_str(self, m, dst);
    }
}

impl Replacer for &String {
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        Template::expand_str(self, m, dst);
    }
}

impl Replacer for Template {
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        self.expand(m, dst);
    }
}

impl Replacer for &Template {
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        self.expand(m, dst);
    }
}

impl<F, T> Replacer for F
where
    F: FnMut(&Match<'_>) -> T,
    T: AsRef<str>,
{
    fn replace_append(&mut self, m: &Match<'_>, dst: &mut String) {
        dst.push_str((*self)(m).as_ref());
    }
}

/// Replace up to `limit` matches (0 = all), copying the text between them
pub(crate) fn replace_matches<R: Replacer>(
    regex: &Regex,
    haystack: &str,
    limit: usize,
    mut replacer: R,
) -> Result<String, MatchTimeoutError> {
    let mut result = String::with_capacity(haystack.len());
    let mut last = 0;

    let limit = if limit == 0 { usize::MAX } else { limit };
    for m in regex.find_iter(haystack).take(limit) {
        let m = m?;
        result.push_str(&haystack[last..m.start()]);
        replacer.replace_append(&m, &mut result);
        last = m.end();
    }

    result.push_str(&haystack[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(pattern: &str, input: &str, template: &str) -> String {
        let re = Regex::new(pattern).unwrap();
        let m = re.find(input).unwrap().unwrap();
        m.result(template)
    }

    #[test]
    fn test_parse_literal() {
        let t = Template::parse("hello");
        assert_eq!(t.parts(), &[TemplatePart::Literal(Cow::Borrowed("hello"))]);
    }

    #[test]
    fn test_parse_references() {
        let t = Template::parse("a$1${name}${12}$&$$");
        assert_eq!(
            t.parts(),
            &[
                TemplatePart::Literal(Cow::Borrowed("a")),
                TemplatePart::Digits(Cow::Borrowed("1")),
                TemplatePart::Name(Cow::Borrowed("name")),
                TemplatePart::Number(12),
                TemplatePart::WholeMatch,
                TemplatePart::Literal(Cow::Borrowed("$")),
            ]
        );
    }

    #[test]
    fn test_parse_stray_dollars_are_literal() {
        let t = Template::parse("$x${}${a");
        let text: String = t
            .parts()
            .iter()
            .map(|p| match p {
                TemplatePart::Literal(s) => s.to_string(),
                other => panic!("unexpected part {:?}", other),
            })
            .collect();
        assert_eq!(text, "$x${}${a");
    }

    #[test]
    fn test_expand_numbered_groups() {
        assert_eq!(expand(r"(\d)-(\d+)", "1-22", "$1+$2"), "1+22");
        assert_eq!(expand(r"(\d)-(\d+)", "1-22", "${2}${1}"), "221");
    }

    #[test]
    fn test_expand_named_group() {
        assert_eq!(expand(r"(?<amount>\d+)", "1", "$$ ${amount}"), "$ 1");
    }

    #[test]
    fn test_expand_longest_existing_group_prefix() {
        // only group 1 exists, so "$10" is group 1 then a literal 0
        assert_eq!(expand(r"(a)", "a", "$10"), "a0");
        assert_eq!(expand(r"(a)", "a", "$2"), "");
    }

    #[test]
    fn test_expand_missing_groups_are_empty() {
        assert_eq!(expand(r"(a)", "a", "[${nope}][${7}]"), "[][]");
        assert_eq!(expand(r"(a)|(b)", "b", "[$1]"), "[]");
    }

    #[test]
    fn test_expand_special_references() {
        assert_eq!(expand(r"b", "abc", "[$`|$&|$']"), "[a|b|c]");
        assert_eq!(expand(r"b", "abc", "$_"), "abc");
        assert_eq!(expand(r"(a)|(b)", "b", "$+"), "b");
        assert_eq!(expand(r"(a)(x)?", "a", "$+"), "a");
    }

    #[test]
    fn test_replacer_for_closure() {
        let re = Regex::new("Hello").unwrap();
        let result = re
            .replace("Hello World!", |m: &Match<'_>| format!("<b>{}</b>", m.as_str()))
            .unwrap();
        assert_eq!(result, "<b>Hello</b> World!");
    }

    #[test]
    fn test_replacer_for_template() {
        let re = Regex::new(r"(\w+)@(\w+)").unwrap();
        let template = Template::parse("$2:$1");
        assert_eq!(re.replace("a@b c@d", &template).unwrap(), "b:a d:c");
    }

    #[test]
    fn test_replace_limit() {
        let re = Regex::new("a").unwrap();
        assert_eq!(re.replacen("aaaa", 2, "b").unwrap(), "bbaa");
        assert_eq!(re.replacen("aaaa", 0, "b").unwrap(), "bbbb");
    }

    #[test]
    fn test_replace_no_match_returns_input() {
        let re = Regex::new("z").unwrap();
        assert_eq!(re.replace("abc", "y").unwrap(), "abc");
    }

    #[test]
    fn test_replace_empty_matches() {
        let re = Regex::new("x*").unwrap();
        assert_eq!(re.replace("abc", "-").unwrap(), "-a-b-c-");
    }
}
