use lazy_static::lazy_static;
use structopt::StructOpt;

use lr0::{non_term, term, whitespace, Parser, SymbolId, ValueError};

const T_INT: SymbolId = 1;
const T_PLUS: SymbolId = 2;
const T_MINUS: SymbolId = 3;

const N_VAL: SymbolId = 10;
const N_SUM: SymbolId = 11;
const N_GOAL: SymbolId = 12;

fn to_int(bytes: &[u8]) -> Result<i64, ValueError> {
    Ok(String::from_utf8_lossy(bytes).parse::<i64>()?)
}

lazy_static! {
    static ref PARSER: Parser<i64> = Parser::new(
        vec![
            term(T_INT, "int").take_bytes_with(|b| b.is_ascii_digit(), to_int),
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
    );
}

/// Evaluate integer expressions with + and -.
#[derive(Debug, StructOpt)]
#[structopt(name = "calc_tiny")]
struct Opt {
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
            Err(err) => println!("Error: {}", err),
        }
    }
}
