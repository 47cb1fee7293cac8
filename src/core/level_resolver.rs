//! Glob pattern → level rules and the longest-match-wins resolver

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use glob::Pattern;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Pattern every rule set must carry; it matches any identity
pub const DEFAULT_PATTERN: &str = "*";

#[derive(Debug, Clone)]
struct LevelRule {
    pattern: String,
    matcher: Pattern,
    /// Pattern length in characters, the specificity of the rule
    specificity: usize,
    level: LogLevel,
}

impl LevelRule {
    fn compile(pattern: String, level: LogLevel) -> Result<Self> {
        if !level.is_valid() {
            return Err(LoggerError::InvalidLevel(format!(
                "pattern '{}' maps to {}",
                pattern, level
            )));
        }
        let matcher = Pattern::new(&pattern)
            .map_err(|e| LoggerError::pattern(pattern.clone(), e.msg))?;
        Ok(Self {
            specificity: pattern.chars().count(),
            pattern,
            matcher,
            level,
        })
    }
}

/// Ordered glob → level rules with a mandatory `"*"` default.
///
/// Rules keep configuration order; that order breaks ties between matching
/// patterns of equal length. Every constructor guarantees the default rule
/// exists and every pattern compiles.
#[derive(Debug, Clone)]
pub struct LevelPatterns {
    rules: Vec<LevelRule>,
}

impl LevelPatterns {
    /// Rules holding only the `"*"` default
    pub fn new(default_level: LogLevel) -> Result<Self> {
        Self::from_rules([(DEFAULT_PATTERN, default_level)])
    }

    /// Build from `(pattern, level)` pairs in order.
    ///
    /// A repeated pattern overrides the earlier level but keeps the earlier
    /// position.
    pub fn from_rules<I, P>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, LogLevel)>,
        P: Into<String>,
    {
        let mut patterns = Self { rules: Vec::new() };
        for (pattern, level) in rules {
            patterns.insert(pattern.into(), level)?;
        }

        if !patterns.rules.iter().any(|r| r.pattern == DEFAULT_PATTERN) {
            return Err(LoggerError::config(
                "levels",
                format!("missing the '{}' default level", DEFAULT_PATTERN),
            ));
        }
        Ok(patterns)
    }

    /// Add or replace one rule
    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, pattern: impl Into<String>, level: LogLevel) -> Result<Self> {
        self.insert(pattern.into(), level)?;
        Ok(self)
    }

    fn insert(&mut self, pattern: String, level: LogLevel) -> Result<()> {
        let rule = LevelRule::compile(pattern, level)?;
        match self.rules.iter_mut().find(|r| r.pattern == rule.pattern) {
            Some(existing) => existing.level = rule.level,
            None => self.rules.push(rule),
        }
        Ok(())
    }

    /// Level of the `"*"` rule
    pub fn default_level(&self) -> LogLevel {
        self.rules
            .iter()
            .find(|r| r.pattern == DEFAULT_PATTERN)
            .map(|r| r.level)
            .unwrap_or_default()
    }

    /// Rules in configuration order
    pub fn rules(&self) -> impl Iterator<Item = (&str, LogLevel)> {
        self.rules.iter().map(|r| (r.pattern.as_str(), r.level))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Shorthand for [`resolve_level`]
    pub fn resolve(&self, identity: &str) -> LogLevel {
        resolve_level(identity, self)
    }
}

impl Default for LevelPatterns {
    fn default() -> Self {
        // "*" at Info always compiles; the empty fallback still resolves to Info
        Self::new(LogLevel::Info).unwrap_or(Self { rules: Vec::new() })
    }
}

/// Effective level for `identity`.
///
/// Each pattern is matched against the whole identity. Among matching
/// patterns the longest wins; equal lengths resolve to the one configured
/// first. With no match the `"*"` default applies.
pub fn resolve_level(identity: &str, patterns: &LevelPatterns) -> LogLevel {
    let mut best: Option<&LevelRule> = None;
    for rule in &patterns.rules {
        if !rule.matcher.matches(identity) {
            continue;
        }
        if best.map_or(true, |b| rule.specificity > b.specificity) {
            best = Some(rule);
        }
    }

    best.map(|r| r.level)
        .unwrap_or_else(|| patterns.default_level())
}

impl Serialize for LevelPatterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.rules.iter().map(|r| (&r.pattern, r.level)))
    }
}

impl<'de> Deserialize<'de> for LevelPatterns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = Vec<(String, LogLevel)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of glob patterns to log levels")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut rules = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, level)) = map.next_entry::<String, LogLevel>()? {
                    rules.push((pattern, level));
                }
                Ok(rules)
            }
        }

        let rules = deserializer.deserialize_map(RulesVisitor)?;
        LevelPatterns::from_rules(rules).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(rules: &[(&str, LogLevel)]) -> LevelPatterns {
        LevelPatterns::from_rules(rules.iter().copied()).unwrap()
    }

    #[test]
    fn test_default_applies_without_other_match() {
        let p = patterns(&[("*", LogLevel::Warn), ("app::db::*", LogLevel::Debug)]);
        assert_eq!(p.resolve("app::http::Server"), LogLevel::Warn);
    }

    #[test]
    fn test_longest_match_wins() {
        let p = patterns(&[
            ("*", LogLevel::Info),
            ("app::*", LogLevel::Warn),
            ("app::db::*", LogLevel::Debug),
            ("app::db::Pool", LogLevel::Error),
        ]);

        assert_eq!(p.resolve("app::db::Pool"), LogLevel::Error);
        assert_eq!(p.resolve("app::db::Conn"), LogLevel::Debug);
        assert_eq!(p.resolve("app::cache"), LogLevel::Warn);
        assert_eq!(p.resolve("other"), LogLevel::Info);
    }

    #[test]
    fn test_suffix_glob() {
        let p = patterns(&[("*", LogLevel::Info), ("*Struct", LogLevel::Debug)]);
        assert_eq!(p.resolve("tests::MyLogStruct"), LogLevel::Debug);
        assert_eq!(p.resolve("tests::MyLog"), LogLevel::Info);
    }

    #[test]
    fn test_equal_length_tie_goes_to_first_configured() {
        let p = patterns(&[
            ("*", LogLevel::Info),
            ("app*", LogLevel::Warn),
            ("*Log", LogLevel::Debug),
        ]);
        for _ in 0..10 {
            assert_eq!(p.resolve("appLog"), LogLevel::Warn);
        }

        let flipped = patterns(&[
            ("*Log", LogLevel::Debug),
            ("app*", LogLevel::Warn),
            ("*", LogLevel::Info),
        ]);
        assert_eq!(flipped.resolve("appLog"), LogLevel::Debug);
    }

    #[test]
    fn test_whole_string_match_only() {
        let p = patterns(&[("*", LogLevel::Info), ("app", LogLevel::Debug)]);
        assert_eq!(p.resolve("app::db"), LogLevel::Info);
        assert_eq!(p.resolve("app"), LogLevel::Debug);
    }

    #[test]
    fn test_question_mark_and_character_class() {
        let p = patterns(&[
            ("*", LogLevel::Info),
            ("worker-?", LogLevel::Debug),
            ("shard[0-3]", LogLevel::Error),
        ]);
        assert_eq!(p.resolve("worker-7"), LogLevel::Debug);
        assert_eq!(p.resolve("worker-17"), LogLevel::Info);
        assert_eq!(p.resolve("shard2"), LogLevel::Error);
        assert_eq!(p.resolve("shard9"), LogLevel::Info);
    }

    #[test]
    fn test_missing_default_rejected() {
        let err = LevelPatterns::from_rules([("app::*", LogLevel::Debug)]).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_bad_glob_rejected() {
        let err = LevelPatterns::from_rules([("*", LogLevel::Info), ("[a-", LogLevel::Debug)])
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = LevelPatterns::new(LogLevel::Invalid).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidLevel(_)));
    }

    #[test]
    fn test_repeated_pattern_overrides_in_place() {
        let p = LevelPatterns::new(LogLevel::Info)
            .and_then(|p| p.with("app::*", LogLevel::Debug))
            .and_then(|p| p.with("*", LogLevel::Error))
            .unwrap();

        let rules: Vec<_> = p.rules().collect();
        assert_eq!(rules, vec![("*", LogLevel::Error), ("app::*", LogLevel::Debug)]);
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let p: LevelPatterns =
            serde_json::from_str(r#"{"*Log": "debug", "app*": "warn", "*": "error"}"#).unwrap();

        let order: Vec<_> = p.rules().map(|(pattern, _)| pattern).collect();
        assert_eq!(order, vec!["*Log", "app*", "*"]);
        assert_eq!(p.resolve("appLog"), LogLevel::Debug);
        assert_eq!(p.default_level(), LogLevel::Error);
    }

    #[test]
    fn test_deserialize_requires_default() {
        let result: std::result::Result<LevelPatterns, _> =
            serde_json::from_str(r#"{"app::*": "debug"}"#);
        assert!(result.is_err());
    }
}
