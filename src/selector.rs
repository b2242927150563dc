//! Path expressions
//!
//! A path such as `$.b.l[0:2].i` is split on `.` into segments. Each segment
//! carries a name and an optional trailing bracket filter (`l` with `0:2`).
//! `$` anchors at the root, `@` at the current node and `*` fans out over
//! every visible field.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

static BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)\[(.*)\]$").expect("valid regex"));

/// One `name[filter]` step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub filter: Option<String>,
}

impl Segment {
    pub fn new<N: Into<String>>(name: N, filter: Option<&str>) -> Self {
        Self {
            name: name.into(),
            filter: filter.map(str::to_string),
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.name == "$" || self.name == "@"
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*" || self.name.is_empty()
    }
}

/// Parsed path, consumed front to back
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    segments: VecDeque<Segment>,
}

impl Selector {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|part| match BRACKET.captures(part) {
                Some(caps) => Segment::new(
                    caps.get(1).map_or("", |m| m.as_str()),
                    caps.get(2).map(|m| m.as_str()),
                ),
                None => Segment::new(part, None),
            })
            .collect();
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop_front()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub(crate) fn as_slice(&mut self) -> &[Segment] {
        self.segments.make_contiguous()
    }
}

/// Split `prefix[filter]` at its trailing bracket.
pub fn split_trailing_bracket(path: &str) -> Option<(&str, &str)> {
    let caps = BRACKET.captures(path)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// A bracket filter resolved against a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    Single(i64),
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

impl Index {
    /// Parse `3`, `-1`, `1:3`, `::2`. Anything else is rejected.
    pub fn parse(filter: &str) -> Option<Index> {
        let parts: Vec<&str> = filter.split(':').collect();
        let bound = |s: &str| -> Option<Option<i64>> {
            let s = s.trim();
            if s.is_empty() {
                Some(None)
            } else {
                s.parse::<i64>().ok().map(Some)
            }
        };
        match parts.as_slice() {
            [single] => single.trim().parse::<i64>().ok().map(Index::Single),
            [start, stop] => Some(Index::Slice {
                start: bound(start)?,
                stop: bound(stop)?,
                step: None,
            }),
            [start, stop, step] => {
                let step = bound(step)?;
                if step == Some(0) {
                    return None;
                }
                Some(Index::Slice {
                    start: bound(start)?,
                    stop: bound(stop)?,
                    step,
                })
            }
            _ => None,
        }
    }

    /// Positions addressed in a sequence of `len` items. An out of range
    /// single index yields nothing.
    pub fn positions(&self, len: usize) -> Vec<usize> {
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        match *self {
            Index::Single(i) => {
                let i = if i < 0 { i + len } else { i };
                if (0..len).contains(&i) {
                    vec![i as usize]
                } else {
                    Vec::new()
                }
            }
            Index::Slice { start, stop, step } => {
                let step = step.unwrap_or(1);
                let clamp = |b: i64, low: i64, high: i64| {
                    let b = if b < 0 { b + len } else { b };
                    b.clamp(low, high)
                };
                let mut out = Vec::new();
                if step > 0 {
                    let start = start.map_or(0, |b| clamp(b, 0, len));
                    let stop = stop.map_or(len, |b| clamp(b, 0, len));
                    let mut i = start;
                    while i < stop {
                        out.push(i as usize);
                        match i.checked_add(step) {
                            Some(next) => i = next,
                            None => break,
                        }
                    }
                } else {
                    let start = start.map_or(len - 1, |b| clamp(b, -1, len - 1));
                    let stop = stop.map_or(-1, |b| clamp(b, -1, len - 1));
                    let mut i = start;
                    while i > stop {
                        out.push(i as usize);
                        match i.checked_add(step) {
                            Some(next) => i = next,
                            None => break,
                        }
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments() {
        let mut sel = Selector::parse("$.name[1:2]");
        assert_eq!(sel.pop(), Some(Segment::new("$", None)));
        assert_eq!(sel.pop(), Some(Segment::new("name", Some("1:2"))));
        assert!(sel.pop().is_none());

        let mut sel = Selector::parse("");
        assert_eq!(sel.pop(), Some(Segment::new("", None)));
        assert!(sel.pop().is_none());
        assert!(sel.is_empty());
    }

    #[test]
    fn test_bracket_only_segment() {
        let mut sel = Selector::parse("$[0].i");
        assert_eq!(sel.pop(), Some(Segment::new("$", Some("0"))));
        assert_eq!(sel.pop(), Some(Segment::new("i", None)));
    }

    #[test]
    fn test_index_parse() {
        assert_eq!(Index::parse("-1"), Some(Index::Single(-1)));
        assert_eq!(Index::parse(""), None);
        assert_eq!(Index::parse("coucou"), None);
        assert_eq!(Index::parse("1:2:0"), None);
        assert_eq!(
            Index::parse("::2"),
            Some(Index::Slice { start: None, stop: None, step: Some(2) })
        );
    }

    #[test]
    fn test_positions() {
        assert_eq!(Index::Single(-1).positions(3), vec![2]);
        assert!(Index::Single(20).positions(3).is_empty());
        assert_eq!(Index::parse("0:2").unwrap().positions(3), vec![0, 1]);
        assert_eq!(Index::parse("::-1").unwrap().positions(3), vec![2, 1, 0]);
        assert_eq!(Index::parse("1:").unwrap().positions(3), vec![1, 2]);
        assert_eq!(Index::parse("-2:").unwrap().positions(3), vec![1, 2]);
        assert_eq!(Index::parse("::2").unwrap().positions(3), vec![0, 2]);
    }

    #[test]
    fn test_extreme_slices_stay_in_range() {
        let max = i64::MAX;
        let min = i64::MIN;
        assert_eq!(Index::parse(&format!("1:3:{max}")).unwrap().positions(5), vec![1]);
        assert_eq!(Index::parse(&format!("::{min}")).unwrap().positions(5), vec![4]);
        assert_eq!(
            Index::parse(&format!("{min}:{max}")).unwrap().positions(3),
            vec![0, 1, 2]
        );
        assert_eq!(Index::parse(&format!("{max}:{min}:-1")).unwrap().positions(3), vec![2, 1, 0]);
        assert!(Index::Single(min).positions(3).is_empty());
        assert!(Index::parse("5:9").unwrap().positions(3).is_empty());
    }
}
