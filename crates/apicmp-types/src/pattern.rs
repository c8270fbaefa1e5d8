//! Matching of difference codes and element paths.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::TypeError;

/// Which difference codes a transform is interested in.
#[derive(Clone)]
pub enum CodePattern {
    /// The code must equal the string.
    Exact(String),
    /// The code must match a glob where `*` matches any run of characters
    /// and `?` matches exactly one.
    Glob(String),
    /// The whole code must match the regular expression.
    Regex(Regex),
    /// An arbitrary test.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl CodePattern {
    pub fn exact(code: impl Into<String>) -> Self {
        Self::Exact(code.into())
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, TypeError> {
        full_match_regex(pattern).map(Self::Regex)
    }

    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Matches every code.
    pub fn any() -> Self {
        Self::Glob("*".into())
    }

    /// Parse a pattern from configuration text: strings containing `*` or `?`
    /// become globs, anything else an exact match.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        if text.is_empty() {
            return Err(TypeError::InvalidPattern {
                pattern: text.to_string(),
                reason: "pattern is empty".into(),
            });
        }
        if text.contains(['*', '?']) {
            Ok(Self::Glob(text.to_string()))
        } else {
            Ok(Self::Exact(text.to_string()))
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == code,
            Self::Glob(pattern) => glob_match(pattern, code),
            Self::Regex(regex) => regex.is_match(code),
            Self::Predicate(f) => f(code),
        }
    }
}

impl fmt::Debug for CodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => f.debug_tuple("Exact").field(code).finish(),
            Self::Glob(pattern) => f.debug_tuple("Glob").field(pattern).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Compile `pattern` so that it only matches whole strings.
pub fn full_match_regex(pattern: &str) -> Result<Regex, TypeError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| TypeError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Match `text` against a glob `pattern` supporting `*` and `?`.
///
/// Iterative with single-star backtracking, so the cost stays linear in the
/// common case and never exponential.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_pattern() {
        let pattern = CodePattern::exact("removed");
        assert!(pattern.matches("removed"));
        assert!(!pattern.matches("removed-x"));
    }

    #[test]
    fn glob_star_and_question_mark() {
        assert!(glob_match("java.class.*", "java.class.removed"));
        assert!(glob_match("*removed", "java.method.removed"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXbYY"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "a"));
    }

    #[test]
    fn predicate_pattern() {
        let pattern = CodePattern::predicate(|c| c.len() > 3);
        assert!(pattern.matches("long"));
        assert!(!pattern.matches("no"));
        assert_eq!(format!("{pattern:?}"), "Predicate(..)");
    }

    #[test]
    fn parse_picks_glob_when_wildcards_present() {
        assert!(matches!(CodePattern::parse("a.*").unwrap(), CodePattern::Glob(_)));
        assert!(matches!(CodePattern::parse("a.b").unwrap(), CodePattern::Exact(_)));
        assert!(matches!(
            CodePattern::parse(""),
            Err(TypeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn regex_pattern_matches_whole_codes() {
        let pattern = CodePattern::regex(r"java\.(class|method)\.removed").unwrap();
        assert!(pattern.matches("java.class.removed"));
        assert!(pattern.matches("java.method.removed"));
        assert!(!pattern.matches("java.field.removed"));
        // anchored at both ends
        assert!(!pattern.matches("x.java.class.removed"));
        assert!(!pattern.matches("java.class.removed.x"));
        assert_eq!(
            format!("{pattern:?}"),
            r#"Regex("^(?:java\\.(class|method)\\.removed)$")"#
        );
    }

    #[test]
    fn alternation_stays_inside_the_anchors() {
        let regex = full_match_regex("a|b").unwrap();
        assert!(regex.is_match("a"));
        assert!(!regex.is_match("ab"));
        assert!(!regex.is_match("xa"));
    }

    #[test]
    fn invalid_regex_is_a_pattern_error() {
        match CodePattern::regex("java.(class") {
            Err(TypeError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "java.(class"),
            other => panic!("expected invalid pattern, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn literal_pattern_matches_itself(s in "[a-z.]{0,12}") {
            prop_assert!(glob_match(&s, &s));
        }

        #[test]
        fn prefix_star_matches_any_suffix(prefix in "[a-z]{0,6}", suffix in "[a-z]{0,6}") {
            let pattern = format!("{prefix}*");
            let text = format!("{prefix}{suffix}");
            prop_assert!(glob_match(&pattern, &text));
        }
    }
}
