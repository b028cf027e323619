//! Generator identifier patterns
//!
//! Glob-like matching over colon-delimited generator ids. `*` matches any run of
//! characters within a segment, `**` matches across segments, and every pattern
//! also matches its sub-paths, so `thumbnails` selects `thumbnails:admin:small`.

use crate::error::PatternError;
use regex::Regex;
use std::fmt;

/// Segment separator in generator ids.
pub const SEPARATOR: char = ':';

const ONE_SEGMENT: &str = "[^:]*";
const ANY_SEGMENTS: &str = ".*";
const SUB_PATH: &str = "(?::.*)?";

/// A compiled identifier pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Whether `id` equals the pattern segment-wise or is a sub-path of it.
    pub fn matches(&self, id: &str) -> bool {
        self.regex.is_match(id)
    }

    /// The pattern as supplied by the caller.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Compile a single identifier pattern.
///
/// Literal runs are escaped, `*` becomes "anything but `:`" and `**` becomes
/// "anything". Three or more consecutive `*` are rejected. The empty pattern
/// matches every id.
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    let mut body = String::with_capacity(pattern.len() * 2);
    let mut literal = String::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '*' {
            literal.push(c);
            continue;
        }

        let mut count = 1;
        while chars.next_if(|&(_, next)| next == '*').is_some() {
            count += 1;
        }
        if count > 2 {
            return Err(PatternError::RepeatedWildcard {
                pattern: pattern.to_string(),
                position: offset,
                count,
            });
        }

        body.push_str(&regex::escape(&literal));
        literal.clear();
        body.push_str(if count == 1 { ONE_SEGMENT } else { ANY_SEGMENTS });
    }
    body.push_str(&regex::escape(&literal));

    if pattern.is_empty() {
        body.push_str(ANY_SEGMENTS);
    }

    let source = format!("(?s)^{}{}$", body, SUB_PATH);
    let regex = Regex::new(&source).map_err(|e| PatternError::Compile {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    Ok(CompiledPattern {
        pattern: pattern.to_string(),
        regex,
    })
}

/// Any-of set of compiled patterns. An empty set matches everything.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    pub fn matches(&self, id: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(id))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }
}

/// Compile every pattern, failing on the first malformed one.
pub fn compile_all<I, S>(patterns: I) -> Result<PatternSet, PatternError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let patterns = patterns
        .into_iter()
        .map(|p| compile(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatternSet { patterns })
}
