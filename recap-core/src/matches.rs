//! Match results and the match iterator

use crate::engine::Regex;
use crate::error::MatchTimeoutError;
use crate::replace::Template;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

/// A successful match
///
/// A `Match` owns a snapshot of the capture spans, so it stays valid after
/// the search that produced it. Offsets are byte offsets into the haystack.
#[derive(Clone)]
pub struct Match<'h> {
    regex: Regex,
    haystack: &'h str,
    start: usize,
    end: usize,
    spans: Vec<Option<(usize, usize)>>,
}

impl<'h> Match<'h> {
    pub(crate) fn new(regex: Regex, haystack: &'h str, spans: Vec<Option<(usize, usize)>>) -> Self {
        let (start, end) = spans.first().copied().flatten().unwrap_or_default();
        Match {
            regex,
            haystack,
            start,
            end,
            spans,
        }
    }

    /// The matched text
    pub fn as_str(&self) -> &'h str {
        &self.haystack[self.start..self.end]
    }

    /// Byte offset where the match starts
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the match
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the match in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The whole text that was searched
    pub fn haystack(&self) -> &'h str {
        self.haystack
    }

    /// The regex that produced this match
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// All groups of the pattern, group 0 first
    pub fn groups(&self) -> Groups<'_> {
        Groups { m: self }
    }

    /// The group with ordinal `index`, or `None` if the pattern has no such group
    ///
    /// A group that exists but did not take part in the match is returned with
    /// [`Group::success`] false.
    pub fn group(&self, index: usize) -> Option<Group<'_>> {
        let span = *self.spans.get(index)?;
        let index = index as u32;
        Some(Group {
            haystack: self.haystack,
            span,
            index,
            name: self.regex.group_name(index),
        })
    }

    /// The group called `name`
    pub fn name(&self, name: &str) -> Option<Group<'_>> {
        let index = self.regex.group_number(name)?;
        self.group(index as usize)
    }

    /// Search again, starting where this match ended
    ///
    /// After an empty match the search starts one character later, so the
    /// sequence of matches always makes progress.
    pub fn next_match(&self) -> Result<Option<Match<'h>>, MatchTimeoutError> {
        match resume_at(self.haystack, self.end, self.is_empty()) {
            Some(at) => self.regex.search_at(self.haystack, at),
            None => Ok(None),
        }
    }

    /// Expand a replacement template for this match
    pub fn result(&self, template: &str) -> String {
        let mut dst = String::new();
        Template::expand_str(template, self, &mut dst);
        dst
    }

    /// Text of group `index`, empty when it did not take part in the match
    pub(crate) fn group_text(&self, index: usize) -> &'h str {
        match self.spans.get(index).copied().flatten() {
            Some((start, end)) => &self.haystack[start..end],
            None => "",
        }
    }

    /// Number of groups, group 0 included
    pub(crate) fn group_len(&self) -> usize {
        self.spans.len()
    }

    /// The highest numbered group that took part in the match
    pub(crate) fn last_group(&self) -> usize {
        self.spans.iter().rposition(Option::is_some).unwrap_or(0)
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("text", &self.as_str())
            .field("groups", &self.spans)
            .finish()
    }
}

/// Where to search after a match ending at `end`
pub(crate) fn resume_at(haystack: &str, end: usize, empty: bool) -> Option<usize> {
    if !empty {
        return Some(end);
    }
    haystack[end..].chars().next().map(|c| end + c.len_utf8())
}

/// The groups of a match, by ordinal and by name
#[derive(Clone, Copy)]
pub struct Groups<'a> {
    m: &'a Match<'a>,
}

impl<'a> Groups<'a> {
    /// Number of groups, group 0 included
    pub fn len(&self) -> usize {
        self.m.group_len()
    }

    /// Always false: group 0 is always present
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Group<'a>> {
        self.m.group(index)
    }

    pub fn name(&self, name: &str) -> Option<Group<'a>> {
        self.m.name(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = Group<'a>> + 'a {
        let m = self.m;
        (0..m.group_len()).filter_map(move |i| m.group(i))
    }
}

impl fmt::Debug for Groups<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// One capture group of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group<'a> {
    haystack: &'a str,
    span: Option<(usize, usize)>,
    index: u32,
    name: Option<&'a str>,
}

impl<'a> Group<'a> {
    /// Whether the group took part in the match
    pub fn success(&self) -> bool {
        self.span.is_some()
    }

    /// The captured text, empty when the group did not take part
    pub fn as_str(&self) -> &'a str {
        self.span.map_or("", |(start, end)| &self.haystack[start..end])
    }

    /// Start offset, 0 when the group did not take part
    pub fn start(&self) -> usize {
        self.span.map_or(0, |(start, _)| start)
    }

    /// End offset, 0 when the group did not take part
    pub fn end(&self) -> usize {
        self.span.map_or(0, |(_, end)| end)
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The span, if the group took part
    pub fn range(&self) -> Option<Range<usize>> {
        self.span.map(|(start, end)| start..end)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Iterator over successive non-overlapping matches
///
/// Created by [`Regex::find_iter`]. Each step runs one search with its own
/// deadline. After a timeout the iterator is exhausted.
pub struct Matches<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h str,
    next: Option<usize>,
}

impl<'r, 'h> Matches<'r, 'h> {
    pub(crate) fn new(regex: &'r Regex, haystack: &'h str) -> Self {
        Matches {
            regex,
            haystack,
            next: Some(0),
        }
    }
}

impl<'h> Iterator for Matches<'_, 'h> {
    type Item = Result<Match<'h>, MatchTimeoutError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next.take()?;
        match self.regex.search_at(self.haystack, at) {
            Ok(Some(m)) => {
                self.next = resume_at(self.haystack, m.end(), m.is_empty());
                Some(Ok(m))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl FusedIterator for Matches<'_, '_> {}

impl fmt::Debug for Matches<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matches")
            .field("regex", self.regex)
            .field("next", &self.next)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::Regex;

    #[test]
    fn test_match_accessors() {
        let re = Regex::new(r"\d+").unwrap();
        let m = re.find("ab 123 cd").unwrap().unwrap();
        assert_eq!(m.as_str(), "123");
        assert_eq!(m.start(), 3);
        assert_eq!(m.end(), 6);
        assert_eq!(m.len(), 3);
        assert_eq!(m.range(), 3..6);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_groups() {
        let re = Regex::new(r"(?<key>\w+)=(\w+)?").unwrap();
        let m = re.find("a=").unwrap().unwrap();
        let groups = m.groups();
        assert_eq!(groups.len(), 3);

        let key = groups.name("key").unwrap();
        assert!(key.success());
        assert_eq!(key.as_str(), "a");
        assert_eq!(key.name(), Some("key"));
        assert_eq!(key.index(), 1);

        let value = groups.get(2).unwrap();
        assert!(!value.success());
        assert_eq!(value.as_str(), "");
        assert_eq!(value.range(), None);
        assert!(groups.get(3).is_none());
        assert!(m.name("nope").is_none());

        let texts: Vec<_> = groups.iter().map(|g| g.as_str()).collect();
        assert_eq!(texts, vec!["a=", "a", ""]);
    }

    #[test]
    fn test_next_match() {
        let re = Regex::new(r"\d").unwrap();
        let first = re.find("1a2").unwrap().unwrap();
        let second = first.next_match().unwrap().unwrap();
        assert_eq!(second.as_str(), "2");
        assert!(second.next_match().unwrap().is_none());
    }

    #[test]
    fn test_next_match_after_empty_match() {
        let re = Regex::new("x*").unwrap();
        let first = re.find("ab").unwrap().unwrap();
        assert_eq!(first.range(), 0..0);
        let second = first.next_match().unwrap().unwrap();
        assert_eq!(second.range(), 1..1);
        let third = second.next_match().unwrap().unwrap();
        assert_eq!(third.range(), 2..2);
        assert!(third.next_match().unwrap().is_none());
    }

    #[test]
    fn test_find_iter_empty_matches_progress() {
        let re = Regex::new("a*").unwrap();
        let spans: Vec<_> = re
            .find_iter("baab")
            .map(|m| m.unwrap().range())
            .collect();
        assert_eq!(spans, vec![0..0, 1..3, 3..3, 4..4]);
    }

    #[test]
    fn test_find_iter_multibyte() {
        let re = Regex::new("").unwrap();
        let starts: Vec<_> = re.find_iter("éa").map(|m| m.unwrap().start()).collect();
        assert_eq!(starts, vec![0, 2, 3]);
    }

    #[test]
    fn test_match_result() {
        let re = Regex::new(r"(\w+)@(\w+)").unwrap();
        let m = re.find("mail bob@host now").unwrap().unwrap();
        assert_eq!(m.result("$2 <- $1"), "host <- bob");
    }
}
