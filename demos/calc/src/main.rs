use std::fmt;

use lazy_static::lazy_static;
use structopt::StructOpt;

use lr0::{non_term, term, whitespace, Parser, SymbolId, ValueError};

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

#[derive(Debug)]
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
    static ref PARSER: Parser<i64> = Parser::new(
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

/// Evaluate integer expressions with +, -, *, / and parentheses.
#[derive(Debug, StructOpt)]
#[structopt(name = "calc")]
struct Opt {
    /// Render parse errors with a caret under the failing position.
    #[structopt(short, long)]
    verbose: bool,
    /// Expressions to evaluate.
    #[structopt(required = true)]
    exprs: Vec<String>,
}

fn main() {
    let opt = Opt::from_args();
    for (i, input) in opt.exprs.iter().enumerate() {
        print!("{}> {}\t=> ", i, input);
        match PARSER.parse(input.as_bytes()) {
            Ok(value) => println!("{}", value),
            Err(err) if opt.verbose => println!("Error: {:#}", err),
            Err(err) => println!("Error: {}", err),
        }
    }
}
