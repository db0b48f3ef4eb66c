//! Pattern matching for paths, header names and origins.
//!
//! # Responsibilities
//! - Ant-style path patterns (`?`, `*`, `**`, `{name}`)
//! - Flat wildcard patterns (`*`) for header names and CORS origins
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Empty path segments are ignored, so a trailing slash is tolerated
//! - No regex to guarantee linear matching per segment

use thiserror::Error;

/// Errors raised when a path pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern '{0}' has an unbalanced '{{' or '}}'")]
    UnbalancedBraces(String),
}

/// Match `text` against `pattern`, where `*` matches any run of characters
/// and `?` matches exactly one. Case-sensitive; callers lowercase both sides
/// for case-insensitive matching.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    // Position of the last '*' and the text index it currently absorbs up to.
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Case-insensitive [`wildcard_match`].
pub fn wildcard_match_ignore_case(pattern: &str, text: &str) -> bool {
    wildcard_match(&pattern.to_lowercase(), &text.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard(String),
    Variable,
    AnyDepth,
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Result<Self, PatternError> {
        if raw == "**" {
            return Ok(Segment::AnyDepth);
        }
        let opens = raw.matches('{').count();
        let closes = raw.matches('}').count();
        if opens != closes {
            return Err(PatternError::UnbalancedBraces(pattern.to_string()));
        }
        if opens == 1 && raw.starts_with('{') && raw.ends_with('}') {
            return Ok(Segment::Variable);
        }
        if raw.contains('*') || raw.contains('?') {
            return Ok(Segment::Wildcard(raw.to_string()));
        }
        Ok(Segment::Literal(raw.to_string()))
    }

    fn matches(&self, part: &str) -> bool {
        match self {
            Segment::Literal(lit) => lit == part,
            Segment::Wildcard(glob) => wildcard_match(glob, part),
            Segment::Variable => true,
            Segment::AnyDepth => true,
        }
    }
}

/// A compiled Ant-style path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern such as `/`, `/foo`, `/api/*/events` or `/hooks/**`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| Segment::parse(s, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Returns true if the request path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], parts: &[&str]) -> bool {
    match pattern.split_first() {
        None => parts.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=parts.len()).any(|skip| match_segments(rest, &parts[skip..]))
        }
        Some((segment, rest)) => match parts.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}
