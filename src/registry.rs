use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::FilterError;
use crate::store::PreferenceStore;

/// Accent color used for muted lines until the user picks one.
pub const DEFAULT_ACCENT_COLOR: &str = "21";

/// A shell-style sender pattern, compiled once.
#[derive(Clone)]
pub struct MutePattern {
    raw: String,
    matcher: Matcher,
}

#[derive(Clone)]
enum Matcher {
    Glob(GlobMatcher),
    /// Not a valid glob (e.g. an unclosed `[`), so only the exact string matches.
    Literal,
}

impl MutePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            return Self {
                raw,
                matcher: Matcher::Literal,
            };
        }
        let matcher = match GlobBuilder::new(&shell_glob(&raw))
            .literal_separator(false)
            .backslash_escape(false)
            .build()
        {
            Ok(glob) => Matcher::Glob(glob.compile_matcher()),
            Err(e) => {
                tracing::debug!(
                    pattern = %raw,
                    error = %e,
                    "pattern is not a glob, matching literally"
                );
                Matcher::Literal
            }
        };
        Self { raw, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whole-string, case-sensitive match.
    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Glob(glob) => glob.is_match(name),
            Matcher::Literal => self.raw == name,
        }
    }

    /// Sort key: the pattern with every leading and trailing `*` removed.
    pub fn sort_key(&self) -> &str {
        self.raw.trim_matches('*')
    }
}

impl fmt::Debug for MutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutePattern").field(&self.raw).finish()
    }
}

/// Rewrite shell wildcards into globset syntax.
///
/// Braces are alternation to globset but plain text to the shell, so the
/// ones outside classes get a class of their own. Inside a class a leading
/// `^` is a member for the shell but negation for globset, so it moves to
/// the end.
fn shell_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let mut negate = false;
                let mut body = String::new();
                if let Some(&'!') = chars.peek() {
                    negate = true;
                    chars.next();
                }
                // `]` right after `[` or `[!` is a member, not the close.
                if let Some(&']') = chars.peek() {
                    body.push(']');
                    chars.next();
                }
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    body.push(inner);
                }

                if !closed {
                    // Left for globset to reject, which makes the pattern literal.
                    out.push('[');
                    if negate {
                        out.push('!');
                    }
                    out.push_str(&body);
                } else if !negate && body == "^" {
                    out.push('^');
                } else {
                    if !negate && body.starts_with('^') {
                        body.remove(0);
                        body.push('^');
                    }
                    out.push('[');
                    if negate {
                        out.push('!');
                    }
                    out.push_str(&body);
                    out.push(']');
                }
            }
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            c => out.push(c),
        }
    }
    out
}

/// The ordered set of muted sender patterns plus the accent color.
///
/// Every mutation is saved to the preference store before it takes effect,
/// so the stored copy always matches what `list` shows.
pub struct MuteRegistry {
    name: String,
    patterns: Vec<MutePattern>,
    accent_color: String,
    store: Box<dyn PreferenceStore>,
}

impl MuteRegistry {
    /// Load state saved under `name`. Absent keys fall back to an empty
    /// list and `default_color`; a stored empty list is an empty list.
    pub fn load(
        name: impl Into<String>,
        default_color: impl Into<String>,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        let name = name.into();

        let mut patterns: Vec<MutePattern> = Vec::new();
        if let Some(saved) = store.get(&muted_key(&name)).filter(|s| !s.is_empty()) {
            for raw in saved.split(',') {
                if !patterns.iter().any(|p| p.as_str() == raw) {
                    patterns.push(MutePattern::new(raw));
                }
            }
        }

        let accent_color = store
            .get(&color_key(&name))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_color.into());

        tracing::debug!(
            name = %name,
            patterns = patterns.len(),
            color = %accent_color,
            "loaded mute registry"
        );

        Self {
            name,
            patterns,
            accent_color,
            store,
        }
    }

    /// Insert `pattern` unless already present, re-sort, persist.
    /// Returns the list in its new display order.
    pub fn add(&mut self, pattern: &str) -> Result<Vec<&str>, FilterError> {
        let mut next = self.patterns.clone();
        if !next.iter().any(|p| p.as_str() == pattern) {
            next.push(MutePattern::new(pattern));
        }
        // Stable: equal keys keep their insertion order.
        next.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        self.commit(next, self.accent_color.clone())?;
        tracing::debug!(pattern, count = self.patterns.len(), "muted pattern added");
        Ok(self.patterns())
    }

    /// Remove the pattern currently shown at `index`.
    ///
    /// Indices shift after a removal; list again before removing another.
    pub fn remove_at(&mut self, index: i64) -> Result<String, FilterError> {
        let len = self.patterns.len();
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(FilterError::IndexOutOfRange { index, len })?;
        let mut next = self.patterns.clone();
        let removed = next.remove(slot);
        self.commit(next, self.accent_color.clone())?;
        tracing::debug!(pattern = %removed.as_str(), index, "muted pattern removed");
        Ok(removed.raw)
    }

    /// `(index, pattern)` pairs in display order.
    pub fn list(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.patterns.iter().map(MutePattern::as_str).enumerate()
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(MutePattern::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Does any pattern match `sender`? Checked in display order.
    pub fn matches(&self, sender: &str) -> bool {
        self.matching_pattern(sender).is_some()
    }

    /// The first pattern, in display order, that matches `sender`.
    pub fn matching_pattern(&self, sender: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(sender))
            .map(MutePattern::as_str)
    }

    pub fn accent_color(&self) -> &str {
        &self.accent_color
    }

    pub fn set_accent_color(&mut self, code: &str) -> Result<(), FilterError> {
        self.commit(self.patterns.clone(), code.to_string())?;
        tracing::debug!(color = code, "accent color changed");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Save `patterns` and `color`, then make them current. A failed save
    /// leaves both memory and the store as they were.
    fn commit(&mut self, patterns: Vec<MutePattern>, color: String) -> Result<(), FilterError> {
        let joined = patterns
            .iter()
            .map(MutePattern::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let muted = muted_key(&self.name);
        let color_name = color_key(&self.name);
        self.store.set_all(&[
            (muted.as_str(), joined.as_str()),
            (color_name.as_str(), color.as_str()),
        ])?;
        self.patterns = patterns;
        self.accent_color = color;
        Ok(())
    }
}

impl fmt::Debug for MuteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MuteRegistry")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("accent_color", &self.accent_color)
            .finish_non_exhaustive()
    }
}

pub fn muted_key(name: &str) -> String {
    format!("{name}_muted")
}

pub fn color_key(name: &str) -> String {
    format!("{name}_color")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> MuteRegistry {
        MuteRegistry::load("mute_senders", DEFAULT_ACCENT_COLOR, Box::new(MemoryStore::new()))
    }

    fn registry_with(muted: &str, color: &str) -> MuteRegistry {
        let mut store = MemoryStore::new();
        store.set("mute_senders_muted", muted).unwrap();
        store.set("mute_senders_color", color).unwrap();
        MuteRegistry::load("mute_senders", DEFAULT_ACCENT_COLOR, Box::new(store))
    }

    /// Reads from a seeded map, refuses every write.
    struct ReadOnlyStore(MemoryStore);

    impl PreferenceStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), FilterError> {
            Err(std::io::Error::other("read-only").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), FilterError> {
            Err(std::io::Error::other("read-only").into())
        }
    }

    fn read_only_registry(muted: &str) -> MuteRegistry {
        let mut seed = MemoryStore::new();
        seed.set("mute_senders_muted", muted).unwrap();
        MuteRegistry::load(
            "mute_senders",
            DEFAULT_ACCENT_COLOR,
            Box::new(ReadOnlyStore(seed)),
        )
    }

    #[test]
    fn failed_save_leaves_registry_unchanged() {
        let mut reg = read_only_registry("alice");

        assert!(matches!(reg.add("*bot"), Err(FilterError::Store(_))));
        assert_eq!(reg.patterns(), vec!["alice"]);
        assert!(!reg.matches("evilbot"));

        assert!(reg.remove_at(0).is_err());
        assert_eq!(reg.patterns(), vec!["alice"]);
        assert!(reg.matches("alice"));

        assert!(reg.set_accent_color("4").is_err());
        assert_eq!(reg.accent_color(), DEFAULT_ACCENT_COLOR);
    }

    #[test]
    fn add_is_idempotent() {
        let mut reg = registry();
        reg.add("alice").unwrap();
        let list = reg.add("alice").unwrap();
        assert_eq!(list, vec!["alice"]);
    }

    #[test]
    fn sorts_by_stripped_key_with_insertion_tie_break() {
        let mut reg = registry();
        reg.add("*bot").unwrap();
        reg.add("alice").unwrap();
        let list = reg.add("bot*").unwrap();
        assert_eq!(list, vec!["alice", "*bot", "bot*"]);
    }

    #[test]
    fn ties_keep_insertion_order_either_way() {
        let mut reg = registry();
        reg.add("bot*").unwrap();
        let list = reg.add("*bot").unwrap();
        assert_eq!(list, vec!["bot*", "*bot"]);
    }

    #[test]
    fn empty_pattern_is_a_literal_entry() {
        let mut reg = registry();
        let list = reg.add("").unwrap();
        assert_eq!(list, vec![""]);
        assert!(reg.matches(""));
        assert!(!reg.matches("alice"));
    }

    #[test]
    fn remove_at_len_is_out_of_range() {
        let mut reg = registry();
        reg.add("alice").unwrap();
        let err = reg.remove_at(1).unwrap_err();
        assert!(matches!(err, FilterError::IndexOutOfRange { index: 1, len: 1 }));
        assert!(matches!(
            reg.remove_at(-1),
            Err(FilterError::IndexOutOfRange { index: -1, .. })
        ));
        assert_eq!(reg.patterns(), vec!["alice"]);
    }

    #[test]
    fn remove_at_returns_pattern_and_shifts() {
        let mut reg = registry();
        reg.add("alice").unwrap();
        reg.add("carol").unwrap();
        assert_eq!(reg.remove_at(0).unwrap(), "alice");
        assert_eq!(reg.list().collect::<Vec<_>>(), vec![(0, "carol")]);
    }

    #[test]
    fn glob_matching_is_whole_string() {
        let mut reg = registry();
        reg.add("*bot").unwrap();
        assert!(reg.matches("evilbot"));
        assert!(!reg.matches("evilbot2"));

        let mut reg = registry();
        reg.add("bot*").unwrap();
        assert!(!reg.matches("evilbot"));
        assert!(reg.matches("bot9000"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut reg = registry();
        reg.add("*bot").unwrap();
        assert!(!reg.matches("EvilBot99"));
        reg.add("*Bot*").unwrap();
        assert!(reg.matches("EvilBot99"));
    }

    #[test]
    fn question_mark_and_classes() {
        let mut reg = registry();
        reg.add("a?ice").unwrap();
        reg.add("[bc]ob").unwrap();
        assert!(reg.matches("alice"));
        assert!(reg.matches("cob"));
        assert!(!reg.matches("dob"));
    }

    #[test]
    fn braces_and_slashes_are_plain_text() {
        let mut reg = registry();
        reg.add("nick{away}").unwrap();
        reg.add("a*z").unwrap();
        assert!(reg.matches("nick{away}"));
        assert!(reg.matches("a/b/z"));
    }

    #[test]
    fn caret_in_class_is_a_member_not_negation() {
        let mut reg = registry();
        reg.add("[^a]ob").unwrap();
        assert!(reg.matches("^ob"));
        assert!(reg.matches("aob"));
        assert!(!reg.matches("bob"));

        let mut reg = registry();
        reg.add("x[^]").unwrap();
        assert!(reg.matches("x^"));
        assert!(!reg.matches("xy"));
    }

    #[test]
    fn bang_negates_a_class() {
        let mut reg = registry();
        reg.add("[!a]ob").unwrap();
        assert!(reg.matches("bob"));
        assert!(!reg.matches("aob"));
    }

    #[test]
    fn unclosed_class_matches_literally() {
        let mut reg = registry();
        reg.add("foo[").unwrap();
        assert!(reg.matches("foo["));
        assert!(!reg.matches("foo"));
    }

    #[test]
    fn first_match_follows_display_order() {
        let mut reg = registry();
        reg.add("*bot").unwrap();
        reg.add("evil*").unwrap();
        assert_eq!(reg.matching_pattern("evilbot"), Some("*bot"));
    }

    #[test]
    fn load_treats_empty_list_as_no_patterns() {
        let reg = registry_with("", "");
        assert!(reg.is_empty());
        assert_eq!(reg.accent_color(), DEFAULT_ACCENT_COLOR);
    }

    #[test]
    fn load_reads_saved_state() {
        let reg = registry_with("*bot,alice,*bot", "4");
        assert_eq!(reg.patterns(), vec!["*bot", "alice"]);
        assert_eq!(reg.accent_color(), "4");
    }

    #[test]
    fn set_accent_color_is_unvalidated() {
        let mut reg = registry();
        reg.set_accent_color("not-a-number").unwrap();
        assert_eq!(reg.accent_color(), "not-a-number");
    }
}
