//! Wildmat pattern matching (RFC 3977 §4).
//!
//! A wildmat expression is a comma-separated list of sub-patterns.
//! Each sub-pattern is either an inclusion or, when prefixed with `!`,
//! an exclusion; a string matches the whole expression when at least
//! one inclusion sub-pattern matches and no exclusion sub-pattern does.
//! An expression with no inclusion sub-patterns at all (e.g. a single
//! `!foo`) is treated as "match everything except the exclusions".

/// A single compiled sub-pattern: its source text and whether it negates.
#[derive(Debug, Clone)]
struct SubPattern {
    text: String,
    exclude: bool,
}

/// A compiled wildmat expression, ready for repeated evaluation.
#[derive(Debug, Clone)]
pub struct Wildmat {
    patterns: Vec<SubPattern>,
}

impl Wildmat {
    /// Compile a wildmat expression once. Commas split alternatives
    /// unless escaped with a backslash.
    #[must_use]
    pub fn compile(spec: &str) -> Self {
        let mut patterns = Vec::new();
        for token in split_unescaped_commas(spec) {
            let (exclude, text) = match token.strip_prefix('!') {
                Some(rest) => (true, rest.to_string()),
                None => (false, token),
            };
            if !text.is_empty() || exclude {
                patterns.push(SubPattern { text, exclude });
            }
        }
        Self { patterns }
    }

    /// Evaluate the compiled expression against `candidate`.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let (includes, excludes): (Vec<_>, Vec<_>) =
            self.patterns.iter().partition(|p| !p.exclude);

        if excludes.iter().any(|p| match_single(&p.text, candidate)) {
            return false;
        }
        includes.is_empty() || includes.iter().any(|p| match_single(&p.text, candidate))
    }
}

fn split_unescaped_commas(spec: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(next) = chars.next() {
                current.push(next);
            }
        } else if c == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Match a single glob-style sub-pattern (no comma/`!` handling here)
/// against `text`: `*`, `?`, `[set]`, `[!set]`/`[^set]`, and `\`-escapes.
#[must_use]
pub fn match_single(pattern: &str, text: &str) -> bool {
    inner(pattern.as_bytes(), text.as_bytes())
}

fn inner(p: &[u8], t: &[u8]) -> bool {
    if p.is_empty() {
        return t.is_empty();
    }
    match p[0] {
        b'?' => !t.is_empty() && inner(&p[1..], &t[1..]),
        b'*' => {
            if inner(&p[1..], t) {
                return true;
            }
            for i in 0..t.len() {
                if inner(&p[1..], &t[i + 1..]) {
                    return true;
                }
            }
            false
        }
        b'[' => match_class(p, t),
        b'\\' => p.len() >= 2 && !t.is_empty() && p[1] == t[0] && inner(&p[2..], &t[1..]),
        c => !t.is_empty() && c == t[0] && inner(&p[1..], &t[1..]),
    }
}

fn match_class(p: &[u8], t: &[u8]) -> bool {
    if t.is_empty() {
        return false;
    }
    let mut i = 1;
    let mut neg = false;
    if i < p.len() && (p[i] == b'!' || p[i] == b'^') {
        neg = true;
        i += 1;
    }
    let class_start = i;
    let c = t[0];
    let mut matched = false;
    let mut prev = 0u8;
    let mut has_prev = false;
    while i < p.len() {
        let pc = p[i];
        if pc == b']' && i != class_start {
            break;
        }
        if pc == b'-' && has_prev && i + 1 < p.len() && p[i + 1] != b']' {
            let end = p[i + 1];
            if prev <= c && c <= end {
                matched = true;
            }
            i += 2;
            has_prev = false;
            continue;
        }
        if pc == c {
            matched = true;
        }
        prev = pc;
        has_prev = true;
        i += 1;
    }
    if i >= p.len() || p[i] != b']' {
        // Unterminated class: treat the leading '[' literally.
        return p[0] == t[0] && inner(&p[1..], &t[1..]);
    }
    if matched ^ neg {
        inner(&p[i + 1..], &t[1..])
    } else {
        false
    }
}

/// Convenience one-shot match without compiling a [`Wildmat`] first.
#[must_use]
pub fn wildmat(spec: &str, candidate: &str) -> bool {
    Wildmat::compile(spec).matches(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_and_question() {
        assert!(wildmat("foo", "foo"));
        assert!(!wildmat("foo", "bar"));
        assert!(wildmat("f?o", "foo"));
        assert!(wildmat("f*o", "fooo"));
        assert!(wildmat("*", "anything.at.all"));
    }

    #[test]
    fn character_classes() {
        assert!(wildmat("b[aeiou]r", "bar"));
        assert!(!wildmat("b[!aeiou]r", "bar"));
        assert!(wildmat("b[a-z]r", "bor"));
    }

    #[test]
    fn escapes() {
        assert!(wildmat("a\\*b", "a*b"));
        assert!(!wildmat("a\\*b", "axxb"));
    }

    #[test]
    fn comma_alternation() {
        assert!(wildmat("comp.lang.*,comp.os.*", "comp.lang.rust"));
        assert!(wildmat("comp.lang.*,comp.os.*", "comp.os.linux"));
        assert!(!wildmat("comp.lang.*,comp.os.*", "rec.sport.*"));
    }

    #[test]
    fn exclusion_overrides_inclusion() {
        assert!(wildmat("comp.*,!comp.lang.rust", "comp.lang.c"));
        assert!(!wildmat("comp.*,!comp.lang.rust", "comp.lang.rust"));
    }

    #[test]
    fn bare_exclusion_matches_everything_else() {
        let w = Wildmat::compile("!local.*");
        assert!(w.matches("comp.lang.rust"));
        assert!(!w.matches("local.nntp.postus.log"));
    }

    #[test]
    fn empty_pattern_matches_all() {
        let w = Wildmat::compile("");
        assert!(w.matches("anything"));
    }
}
