//! Build deterministic bottom-up parsers from LR(0) grammars and run
//! them over byte input to a single computed value.
//!
//! A grammar is declared as a list of terminals (token patterns over
//! bytes) and a list of non-terminals (alternatives with optional
//! reduction handlers), one of which is marked as the goal. [`Parser::new`]
//! validates the declaration and compiles the LR(0) parse table once;
//! definition mistakes are programming errors and panic. [`Parser::parse`]
//! then scans the input with whitespace skipping and longest-preferred
//! terminal selection, drives the shift/reduce loop, and returns the
//! goal value or a [`ParseError`] carrying the source position.
//!
//! ```
//! use lr0::{non_term, term, whitespace, Parser, SymbolId, ValueError};
//!
//! const T_INT: SymbolId = 1;
//! const T_PLUS: SymbolId = 2;
//!
//! const N_SUM: SymbolId = 10;
//! const N_GOAL: SymbolId = 11;
//!
//! fn to_int(bytes: &[u8]) -> Result<i64, ValueError> {
//!     Ok(String::from_utf8_lossy(bytes).parse::<i64>()?)
//! }
//!
//! let parser: Parser<i64> = Parser::new(
//!     vec![
//!         term(T_INT, "int").take_bytes_with(|b| b.is_ascii_digit(), to_int),
//!         term(T_PLUS, "\"+\"").hidden().text("+"),
//!         whitespace().take_runes(char::is_whitespace),
//!     ],
//!     vec![
//!         non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
//!         non_term(N_SUM, "Sum")
//!             .is(&[N_SUM, T_PLUS, T_INT])
//!             .eval(|a: i64, b: i64| a + b)
//!             .is(&[T_INT]),
//!     ],
//! );
//!
//! assert_eq!(parser.parse(b"2 + 40").unwrap(), 42);
//! assert!(parser.parse(b"2 +").is_err());
//! ```

mod cursor;
mod error;
mod grammar;
mod lexer;
mod parser;
mod symbol;
mod table;

pub use cursor::Cursor;
pub use error::{ParseError, SourceContext, ValueError};
pub use grammar::non_terminal::{non_term, NonTerminalDef};
pub use grammar::reduce::{IntoValue, Reduction};
pub use lexer::terminal::{
    term, whitespace, IntoTokenValue, Terminal, TerminalFactory, WhitespaceFactory,
};
pub use parser::Parser;
pub use symbol::{SymbolId, INVALID_ID};

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;
    use std::fmt;

    use super::*;

    const T_INT: SymbolId = 1;
    const T_PLUS: SymbolId = 2;
    const T_MINUS: SymbolId = 3;
    const T_MUL: SymbolId = 4;
    const T_DIV: SymbolId = 5;
    const T_LPAREN: SymbolId = 6;
    const T_RPAREN: SymbolId = 7;

    const N_VAL: SymbolId = 10;
    const N_PROD: SymbolId = 11;
    const N_SUM: SymbolId = 12;
    const N_GOAL: SymbolId = 13;

    #[derive(Debug, PartialEq)]
    struct DivByZero;

    impl fmt::Display for DivByZero {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("division by zero")
        }
    }

    impl std::error::Error for DivByZero {}

    fn to_int(bytes: &[u8]) -> Result<i64, ValueError> {
        Ok(String::from_utf8_lossy(bytes).parse::<i64>()?)
    }

    lazy_static! {
        static ref CALC: Parser<i64> = Parser::new(
            vec![
                term(T_INT, "int").take_bytes_with(|b| b.is_ascii_digit(), to_int),
                term(T_PLUS, "\"+\"").hidden().text("+"),
                term(T_MINUS, "\"-\"").hidden().text("-"),
                term(T_MUL, "\"*\"").hidden().text("*"),
                term(T_DIV, "\"/\"").hidden().text("/"),
                term(T_LPAREN, "\"(\"").hidden().text("("),
                term(T_RPAREN, "\")\"").hidden().text(")"),
                whitespace().take_runes(char::is_whitespace),
            ],
            vec![
                non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
                non_term(N_SUM, "Sum")
                    .is(&[N_SUM, T_PLUS, N_PROD])
                    .eval(|a: i64, b: i64| a + b)
                    .is(&[N_SUM, T_MINUS, N_PROD])
                    .eval(|a: i64, b: i64| a - b)
                    .is(&[N_PROD]),
                non_term(N_PROD, "Prod")
                    .is(&[N_PROD, T_MUL, N_VAL])
                    .eval(|a: i64, b: i64| a * b)
                    .is(&[N_PROD, T_DIV, N_VAL])
                    .eval(|a: i64, b: i64| -> Result<i64, DivByZero> {
                        if b == 0 {
                            Err(DivByZero)
                        } else {
                            Ok(a / b)
                        }
                    })
                    .is(&[N_VAL]),
                non_term(N_VAL, "Val")
                    .is(&[T_INT])
                    .is(&[T_LPAREN, N_SUM, T_RPAREN]),
            ],
        );
    }

    #[test]
    fn precedence_comes_from_the_grammar_shape() {
        assert_eq!(CALC.parse(b"2 + 3 * 4").expect("value"), 14);
        assert_eq!(CALC.parse(b"(2 + 3) * 4").expect("value"), 20);
        assert_eq!(CALC.parse(b"42*23/3+90/15-17*19").expect("value"), 5);
    }

    #[test]
    fn parenthesised_groups_bubble_through_hidden_parens() {
        assert_eq!(CALC.parse(b"(42)").expect("value"), 42);
        assert_eq!(CALC.parse(b"((1 + 2))").expect("value"), 3);
    }

    #[test]
    fn division_by_zero_surfaces_the_handler_error() {
        let err = match CALC.parse(b"6 / (1 - 1)") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(!err.is_syntax());
        let source = err.value_error().expect("user error");
        assert_eq!(source.downcast_ref::<DivByZero>(), Some(&DivByZero));
        assert!(err.to_string().starts_with("division by zero near "));
    }

    #[test]
    fn value_followed_by_group_is_rejected() {
        let err = match CALC.parse(b"1+2(3") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
    }

    #[test]
    fn table_dump_names_the_goal_rule() {
        let dump = CALC.dump_table();
        assert!(dump.starts_with("====[ table ]===="));
        assert!(dump.contains("Goal : Sum $"));
        assert!(dump.contains("EOF: ACCEPT"));
    }

    #[test]
    fn unknown_character_is_rejected_where_it_appears() {
        let err = match CALC.parse(b"42/3*?0") {
            Err(err) => err,
            Ok(v) => panic!("unexpected value {}", v),
        };
        assert!(err.is_syntax());
        assert_eq!(err.context().offset(), 5);
    }
}
