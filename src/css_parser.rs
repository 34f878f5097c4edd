//! Hand-rolled, cursor-based CSS parser with per-declaration and per-rule
//! error recovery (spec.md section 4.4). There is deliberately no crate for
//! this — cssparser/selectors appear elsewhere in the wider example pack
//! (e.g. `BigBadE-valor`'s `css_syntax`/`css_selectors` crates), but spec.md
//! calls for exactly the tag/descendant grammar below and nothing else, so a
//! generic CSS tokenizer would be more machinery than the task needs.

use std::collections::HashMap;

use crate::selector::Selector;

pub type Rule = (Selector, HashMap<String, String>);

/// A CSS source string plus a cursor into it. `index` walks over `char`
/// positions (not bytes), so the parser is correct for non-ASCII property
/// values even though the grammar itself is ASCII.
pub struct CssParser {
    chars: Vec<char>,
    index: usize,
}

impl CssParser {
    pub fn new(source: &str) -> Self {
        Self { chars: source.chars().collect(), index: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.index += 1;
        }
    }

    /// Runs of `[alnum#-.%]`. An empty run is an error (returns `None`
    /// without consuming anything).
    fn word(&mut self) -> Option<String> {
        let start = self.index;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || "#-.%".contains(c)) {
            self.index += 1;
        }
        if self.index == start {
            None
        } else {
            Some(self.chars[start..self.index].iter().collect())
        }
    }

    fn literal(&mut self, expected: char) -> Result<(), ()> {
        if self.peek() == Some(expected) {
            self.index += 1;
            Ok(())
        } else {
            Err(())
        }
    }

    /// `word : word`, property lowercased.
    fn pair(&mut self) -> Result<(String, String), ()> {
        let prop = self.word().ok_or(())?;
        self.whitespace();
        self.literal(':')?;
        self.whitespace();
        let value = self.word().ok_or(())?;
        Ok((prop.to_lowercase(), value))
    }

    /// Advances until the next character in `stop` (inclusive) or end of
    /// input, returning which stop character (if any) was found.
    fn ignore_until(&mut self, stop: &[char]) -> Option<char> {
        loop {
            match self.peek() {
                None => return None,
                Some(c) if stop.contains(&c) => return Some(c),
                _ => self.index += 1,
            }
        }
    }

    /// A selector is a tag word, then while not at `{`, more tag words
    /// wrapped left-associatively as `Descendant(prev, next)`.
    fn selector(&mut self) -> Result<Selector, ()> {
        self.whitespace();
        let first = self.word().ok_or(())?;
        let mut out = Selector::tag(first);
        self.whitespace();
        while self.peek() != Some('{') {
            let next = self.word().ok_or(())?;
            out = Selector::descendant(out, Selector::tag(next));
            self.whitespace();
            if self.peek().is_none() {
                return Err(());
            }
        }
        Ok(out)
    }

    /// Zero or more `pair`s separated by `;`. A pair-level parse error is
    /// recovered via `ignore_until({';', '}'})`: if a `;` is found, consume
    /// it and keep going. If instead `ignore_until` lands on `}` (or runs off
    /// the end) without ever finding a `;`, the failed declaration was never
    /// terminated — the whole body is malformed and `Err` propagates up so
    /// the caller discards the entire rule, not just the bad declaration.
    pub fn body(&mut self) -> Result<HashMap<String, String>, ()> {
        let mut pairs = HashMap::new();
        loop {
            self.whitespace();
            if matches!(self.peek(), None | Some('}')) {
                break;
            }
            match self.pair() {
                Ok((prop, value)) => {
                    pairs.insert(prop, value);
                    self.whitespace();
                    if self.peek() == Some(';') {
                        self.index += 1;
                    } else {
                        break;
                    }
                }
                Err(()) => match self.ignore_until(&[';', '}']) {
                    Some(';') => self.index += 1,
                    _ => return Err(()),
                },
            }
        }
        Ok(pairs)
    }

    /// Zero or more `selector '{' body '}'` rules. A rule-level parse error
    /// is recovered via `ignore_until({'}'})`, consuming the closing brace
    /// and continuing with the next rule.
    pub fn parse(&mut self) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            self.whitespace();
            if self.peek().is_none() {
                break;
            }
            let result: Result<Rule, ()> = (|| {
                let selector = self.selector()?;
                self.whitespace();
                self.literal('{')?;
                let body = self.body()?;
                self.whitespace();
                self.literal('}')?;
                Ok((selector, body))
            })();
            match result {
                Ok(rule) => rules.push(rule),
                Err(()) => {
                    self.ignore_until(&['}']);
                    if self.peek() == Some('}') {
                        self.index += 1;
                    }
                }
            }
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_rule() {
        let rules = CssParser::new("p { color: red; }").parse();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].1.get("color"), Some(&"red".to_string()));
    }

    #[test]
    fn recovers_from_malformed_declaration_and_rule() {
        // from spec.md section 8: "p { : ; color: red; } q { x }" yields one
        // rule (p, {color: red}) and skips q entirely.
        let rules = CssParser::new("p { : ; color: red; } q { x }").parse();
        assert_eq!(rules.len(), 1);
        assert!(matches!(rules[0].0, Selector::Tag(ref t) if t == "p"));
        assert_eq!(rules[0].1.len(), 1);
        assert_eq!(rules[0].1.get("color"), Some(&"red".to_string()));
    }

    #[test]
    fn descendant_selector_builds_left_associative() {
        let rules = CssParser::new("div p { color: blue; }").parse();
        assert_eq!(rules.len(), 1);
        match &rules[0].0 {
            Selector::Descendant(a, d) => {
                assert!(matches!(**a, Selector::Tag(ref t) if t == "div"));
                assert!(matches!(**d, Selector::Tag(ref t) if t == "p"));
            }
            _ => panic!("expected descendant selector"),
        }
    }

    #[test]
    fn inline_style_body_parses_without_braces() {
        let mut parser = CssParser::new("color: green");
        let body = parser.body().unwrap();
        assert_eq!(body.get("color"), Some(&"green".to_string()));
    }
}
