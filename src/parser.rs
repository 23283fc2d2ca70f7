use crate::cursor::Cursor;
use crate::error::{ParseError, ValueError};
use crate::grammar::{Grammar, NonTerminalDef};
use crate::lexer::terminal::Terminal;
use crate::lexer::Token;
use crate::symbol::SymbolId;
use crate::table::row::Row;
use crate::table::Table;

/// A parser prepared for one grammar: the validated grammar plus its
/// LR(0) table. Building is fallible only by panic (definition
/// mistakes); a built parser is immutable and can be shared freely
/// across threads, each `parse` call owning its own stack and cursors.
pub struct Parser<V> {
    grammar: Grammar<V>,
    table: Table,
}

impl<V> Parser<V> {
    /// Compiles the grammar and its parse table.
    ///
    /// Terminals come from [`crate::term`] and [`crate::whitespace`],
    /// non-terminals from [`crate::non_term`]. Any definition mistake
    /// (duplicate or unknown ids, zero or several goal rules, unused
    /// terminals, handler arity mismatches, LR(0) conflicts) panics
    /// here with the offender named.
    pub fn new(terminals: Vec<Terminal<V>>, non_terminals: Vec<NonTerminalDef<V>>) -> Self {
        let grammar = Grammar::new(terminals, non_terminals);
        let table = Table::new(&grammar);
        Self { grammar, table }
    }

    /// Parses `input` to the single value of the goal rule.
    pub fn parse(&self, input: &[u8]) -> Result<V, ParseError> {
        let mut stack = Stack::new(&self.table);
        let mut cursor = Cursor::new(input);

        'goal: loop {
            let at = cursor;

            // drain states that can do nothing but reduce before
            // touching the input again
            while stack.row().is_reduce_only() {
                match stack.reduce(&self.grammar) {
                    Ok(true) => (),
                    Ok(false) => {
                        return Err(ParseError::unexpected("unexpected input 1", at.context()))
                    }
                    Err(err) => return Err(ParseError::value(err, at.context())),
                }
            }

            let mut token: Option<Token<V>> = None;
            if !cursor.is_eof() {
                let (next, matched) = self
                    .grammar
                    .lexer()
                    .scan(cursor, stack.row().expected_terminals())?;
                cursor = next;
                token = matched;
            }

            loop {
                let target = match &token {
                    Some(t) => stack.row().shift_to(t.term),
                    None => None,
                };
                if let Some(to) = target {
                    if let Some(t) = token.take() {
                        stack.shift(to, t.term, t.value);
                    }
                    continue 'goal;
                }
                if stack.row().accept_eof() {
                    if token.is_none() {
                        break 'goal;
                    }
                    return Err(ParseError::unexpected(
                        "unexpected input instead of EOF",
                        at.context(),
                    ));
                }
                match stack.reduce(&self.grammar) {
                    Ok(true) => (),
                    Ok(false) => {
                        return Err(self.grammar.lexer().expectation_error(
                            stack.row().expected_terminals(),
                            "unexpected input",
                            at,
                        ))
                    }
                    Err(err) => return Err(ParseError::value(err, at.context())),
                }
            }
        }

        Ok(stack.finish())
    }

    /// Renders the compiled parse table row by row, for debugging a
    /// grammar. The output is deterministic for a given grammar.
    pub fn dump_table(&self) -> String {
        self.table.dump(&self.grammar)
    }
}

/// The value stack of one parse: `(state, symbol, value)` entries over
/// the implicit initial state 0.
struct Stack<'p, V> {
    table: &'p Table,
    entries: Vec<Entry<V>>,
}

struct Entry<V> {
    state: usize,
    symbol: SymbolId,
    value: V,
}

impl<'p, V> Stack<'p, V> {
    fn new(table: &'p Table) -> Self {
        Self {
            table,
            entries: Vec::new(),
        }
    }

    fn current_state(&self) -> usize {
        match self.entries.last() {
            Some(entry) => entry.state,
            None => 0,
        }
    }

    fn row(&self) -> &'p Row {
        self.table.row(self.current_state())
    }

    fn shift(&mut self, state: usize, symbol: SymbolId, value: V) {
        self.entries.push(Entry {
            state,
            symbol,
            value,
        });
    }

    /// Tries the current state's reduction: verifies the stack tail
    /// matches the rule definition, evaluates the handler over the
    /// non-hidden values, pops the tail and pushes the subject through
    /// the base state's goto. `Ok(false)` when the state has no
    /// reduction rule; `Err` propagates a handler rejection.
    fn reduce(&mut self, g: &Grammar<V>) -> Result<bool, ValueError> {
        let rule = match self.row().reduce_rule() {
            Some(index) => g.rule(index),
            None => return Ok(false),
        };

        let count = rule.definition().len();
        if self.entries.len() < count {
            panic!("internal: not enough items in stack");
        }
        let base = self.entries.len() - count;
        for (i, entry) in self.entries[base..].iter().enumerate() {
            if entry.symbol != rule.definition()[i] {
                panic!("internal: unexpected stack content");
            }
        }

        let mut values = Vec::with_capacity(count);
        for (i, entry) in self.entries.split_off(base).into_iter().enumerate() {
            if !rule.is_hidden(i) {
                values.push(entry.value);
            }
        }
        let value = rule.value(values)?;

        let target = match self.row().goto_to(rule.subject()) {
            Some(target) => target,
            None => panic!("internal: unexpected state in gotos"),
        };
        self.shift(target, rule.subject(), value);
        Ok(true)
    }

    /// Ends the parse: exactly one value must remain.
    fn finish(mut self) -> V {
        if self.entries.len() != 1 {
            panic!("internal: unexpected stack content");
        }
        match self.entries.pop() {
            Some(entry) => entry.value,
            None => panic!("internal: unexpected stack content"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::grammar::non_term;
    use crate::lexer::terminal::{term, whitespace};
    use std::fmt;

    const T_INT: SymbolId = 1;
    const T_PLUS: SymbolId = 2;
    const T_MINUS: SymbolId = 3;
    const T_DIV: SymbolId = 4;

    const N_VAL: SymbolId = 10;
    const N_SUM: SymbolId = 11;
    const N_GOAL: SymbolId = 12;

    #[derive(Debug, PartialEq)]
    struct DivByZero;

    impl fmt::Display for DivByZero {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("division by zero")
        }
    }

    impl std::error::Error for DivByZero {}

    fn match_int<'a>(cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<i64, ValueError>)> {
        let (next, digits) = cur.take_bytes_while(|b| b.is_ascii_digit());
        if next.offset() == cur.offset() {
            return None;
        }
        let value = String::from_utf8_lossy(digits).parse::<i64>().map_err(Into::into);
        Some((next, value))
    }

    fn new_parser() -> Parser<i64> {
        Parser::new(
            vec![
                term(T_INT, "int").match_with(match_int),
                term(T_PLUS, "\"+\"").hidden().text("+"),
                term(T_MINUS, "\"-\"").hidden().text("-"),
                whitespace().take_runes(char::is_whitespace),
            ],
            vec![
                non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
                non_term(N_SUM, "Sum")
                    .is(&[N_SUM, T_PLUS, N_VAL])
                    .eval(|a: i64, b: i64| a + b)
                    .is(&[N_SUM, T_MINUS, N_VAL])
                    .eval(|a: i64, b: i64| a - b)
                    .is(&[N_VAL]),
                non_term(N_VAL, "Val").is(&[T_INT]),
            ],
        )
    }

    #[test]
    fn single_value_bubbles_to_the_result() {
        let p = new_parser();
        assert_eq!(p.parse(b"42").expect("value"), 42);
    }

    #[test]
    fn sums_reduce_left_to_right() {
        let p = new_parser();
        assert_eq!(p.parse(b"1 + 2 + 3").expect("value"), 6);
        assert_eq!(p.parse(b"10 - 4 - 3").expect("value"), 3);
        assert_eq!(p.parse(b"10-4+3").expect("value"), 9);
    }

    #[test]
    fn dangling_operator_reports_expected_terminal() {
        let p = new_parser();
        let err = match p.parse(b"1+") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
        assert_eq!(err.context().offset(), 2);
        assert_eq!(
            err.to_string(),
            "unexpected input: expected int near \u{27ea}1+\u{27eb}\u{23f5}<EOF>"
        );
    }

    #[test]
    fn empty_input_is_rejected_at_offset_zero() {
        let p = new_parser();
        let err = match p.parse(b"") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
        assert_eq!(err.context().offset(), 0);
    }

    #[test]
    fn whitespace_only_input_is_rejected() {
        let p = new_parser();
        let err = match p.parse(b"   ") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
    }

    #[test]
    fn trailing_token_reports_eof_expectation() {
        let p = new_parser();
        let err = match p.parse(b"1 2") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
        assert_eq!(
            err.to_string(),
            "unexpected input instead of EOF near \u{27ea}1\u{27eb}\u{23f5}\u{27ea}\u{2420}2\u{27eb}"
        );
    }

    #[test]
    fn unknown_byte_reports_the_expected_set() {
        let p = new_parser();
        let err = match p.parse(b"1+?") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
        assert_eq!(err.context().offset(), 2);
        let message = err.to_string();
        assert!(message.contains("expected int"), "got: {}", message);
    }

    #[test]
    fn value_function_error_aborts_with_the_user_error() {
        let p = new_parser();
        let err = match p.parse(b"1 + 99999999999999999999") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(!err.is_syntax());
        assert!(err.value_error().is_some());
    }

    #[test]
    fn handler_error_aborts_the_parse() {
        let p = Parser::new(
            vec![
                term(T_INT, "int").match_with(match_int),
                term(T_DIV, "\"/\"").hidden().text("/"),
                whitespace().take_runes(char::is_whitespace),
            ],
            vec![
                non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
                non_term(N_SUM, "Div")
                    .is(&[N_SUM, T_DIV, T_INT])
                    .eval(|a: i64, b: i64| -> Result<i64, DivByZero> {
                        if b == 0 {
                            Err(DivByZero)
                        } else {
                            Ok(a / b)
                        }
                    })
                    .is(&[T_INT]),
            ],
        );
        assert_eq!(p.parse(b"42 / 2 / 3").expect("value"), 7);

        let err = match p.parse(b"42 / 0") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(!err.is_syntax());
        let source = err.value_error().expect("user error");
        assert_eq!(source.downcast_ref::<DivByZero>(), Some(&DivByZero));
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        let p = std::sync::Arc::new(new_parser());
        let mut handles = Vec::new();
        for i in 0..4 {
            let p = std::sync::Arc::clone(&p);
            handles.push(std::thread::spawn(move || {
                let input = format!("{} + {}", i, i);
                p.parse(input.as_bytes()).expect("value")
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().expect("join"), (i as i64) * 2);
        }
    }
}
