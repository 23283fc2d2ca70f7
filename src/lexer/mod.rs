use std::collections::{BTreeMap, BTreeSet};

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::symbol::{dump_plain_id, SymbolId};

pub mod terminal;

use terminal::{Skips, TermInner, Terminal, UserTerminal};

/// A matched token: the terminal's symbol id and the evaluated value.
pub(crate) struct Token<V> {
    pub term: SymbolId,
    pub value: V,
}

/// The terminal registry: all user terminals in declaration order plus
/// the whitespace terminals skipped before every match attempt.
pub(crate) struct Lexer<V> {
    terminals: Vec<UserTerminal<V>>,
    index: BTreeMap<SymbolId, usize>,
    whitespace: Vec<Box<dyn Skips>>,
}

impl<V> Lexer<V> {
    pub fn new(terminals: Vec<Terminal<V>>) -> Self {
        let mut list = Vec::with_capacity(terminals.len());
        let mut index = BTreeMap::new();
        let mut whitespace = Vec::new();
        for t in terminals {
            match t.inner {
                TermInner::Whitespace(skip) => whitespace.push(skip),
                TermInner::User(user) => {
                    if index.insert(user.id, list.len()).is_some() {
                        panic!(
                            "grammar definition: duplicate terminal id {} ({})",
                            user.id,
                            user.dump()
                        );
                    }
                    list.push(user);
                }
            }
        }
        Self {
            terminals: list,
            index,
            whitespace,
        }
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_hidden(&self, id: SymbolId) -> bool {
        match self.index.get(&id) {
            Some(&i) => self.terminals[i].hidden,
            None => false,
        }
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.index.get(&id).map(|&i| self.terminals[i].name.as_str())
    }

    /// The set of all declared user terminal ids.
    pub fn terminal_ids(&self) -> BTreeSet<SymbolId> {
        self.index.keys().copied().collect()
    }

    /// Names of declared terminals whose id is not in `used`, in
    /// declaration order.
    pub fn unused_terminals(&self, used: &BTreeSet<SymbolId>) -> Vec<String> {
        self.terminals
            .iter()
            .filter(|t| !used.contains(&t.id))
            .map(|t| t.dump())
            .collect()
    }

    /// Advances over every whitespace match, trying all whitespace
    /// terminals in declaration order at each position.
    pub fn skip_whitespace<'a>(&self, cur: Cursor<'a>) -> Cursor<'a> {
        let mut next = cur;
        'ws: while !next.is_eof() {
            for ws in &self.whitespace {
                if let Some(to) = ws.skip(next) {
                    if to.offset() == next.offset() {
                        panic!("grammar definition: whitespace terminal matched empty input");
                    }
                    next = to;
                    continue 'ws;
                }
            }
            break;
        }
        next
    }

    /// Tries to match one of the `expected` terminals at `cur`.
    ///
    /// Whitespace is skipped first; at EOF the result is `(cursor, None)`:
    /// EOF is not an error here, merely "no token". Terminals are tried
    /// in declaration order, so of two overlapping prefixes the one
    /// declared first wins. The first expected match returns immediately;
    /// otherwise the first successful match of an unexpected terminal is
    /// returned instead, which lets the caller report "expected X" with
    /// the offending token already consumed. A value function error
    /// aborts the scan.
    pub fn scan<'a>(
        &self,
        cur: Cursor<'a>,
        expected: &BTreeSet<SymbolId>,
    ) -> Result<(Cursor<'a>, Option<Token<V>>), ParseError> {
        let start = self.skip_whitespace(cur);
        if start.is_eof() {
            return Ok((start, None));
        }
        let mut fallback: Option<(Cursor<'a>, Token<V>)> = None;
        for t in &self.terminals {
            let (next, value) = match t.matches.matches(start) {
                Some(m) => m,
                None => continue,
            };
            if next.offset() == start.offset() {
                panic!(
                    "grammar definition: terminal {} matched empty input",
                    t.dump()
                );
            }
            let value = match value {
                Ok(v) => v,
                Err(err) => return Err(ParseError::value(err, start.context())),
            };
            let token = Token {
                term: t.id,
                value,
            };
            if expected.contains(&t.id) {
                return Ok((next, Some(token)));
            }
            if fallback.is_none() {
                fallback = Some((next, token));
            }
        }
        if let Some((next, token)) = fallback {
            return Ok((next, Some(token)));
        }
        Err(self.expectation_error(expected, "", start))
    }

    /// Builds the "expected int, \"+\" or \"-\"" diagnostic, enumerating
    /// the expected terminals in declaration order, with an optional
    /// message prefix.
    pub fn expectation_error(
        &self,
        expected: &BTreeSet<SymbolId>,
        pre: &str,
        at: Cursor,
    ) -> ParseError {
        let mut message = String::from(pre);
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str("expected ");
        message.push_str(&self.describe_expected(expected));
        ParseError::unexpected(message, at.context())
    }

    fn describe_expected(&self, expected: &BTreeSet<SymbolId>) -> String {
        let names: Vec<String> = self
            .terminals
            .iter()
            .filter(|t| expected.contains(&t.id))
            .map(|t| t.dump())
            .collect();
        if names.is_empty() {
            // ids unknown to this registry; render them raw
            return expected
                .iter()
                .map(|&id| dump_plain_id(id))
                .collect::<Vec<_>>()
                .join(", ");
        }
        format_alternatives(&names)
    }
}

/// Joins names with `", "` and a final `" or "`.
fn format_alternatives(names: &[String]) -> String {
    let mut s = String::new();
    let last = names.len().saturating_sub(1);
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            s.push_str(if i < last { ", " } else { " or " });
        }
        s.push_str(name);
    }
    s
}
