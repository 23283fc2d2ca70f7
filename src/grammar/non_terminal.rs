use crate::grammar::reduce::{CalcFn, Reduction};
use crate::symbol::{dump_name, SymbolId};

/// One alternative of a non-terminal: the symbol sequence it derives to
/// and, optionally, the attached reduction handler with its declared
/// arity.
pub(crate) struct Alternative<V> {
    pub items: Vec<SymbolId>,
    pub calc: Option<(usize, CalcFn<V>)>,
}

/// Starts a non-terminal definition.
///
/// ```text
/// non_term(N_SUM, "Sum")
///     .is(&[N_SUM, T_PLUS, N_VAL]).eval(|a: i64, b: i64| a + b)
///     .is(&[N_SUM, T_MINUS, N_VAL]).eval(|a: i64, b: i64| a - b)
///     .is(&[N_VAL])
/// ```
pub fn non_term<V>(id: SymbolId, name: &str) -> NonTerminalDef<V> {
    NonTerminalDef {
        id,
        name: name.to_string(),
        main: false,
        alts: Vec::new(),
    }
}

/// A non-terminal under definition: an ordered list of alternatives with
/// optional handlers, and the goal marker.
pub struct NonTerminalDef<V> {
    id: SymbolId,
    name: String,
    main: bool,
    alts: Vec<Alternative<V>>,
}

impl<V> NonTerminalDef<V> {
    pub(crate) fn id(&self) -> SymbolId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_main(&self) -> bool {
        self.main
    }

    pub(crate) fn dump(&self) -> String {
        dump_name(&self.name, self.id)
    }

    pub(crate) fn into_alternatives(self) -> Vec<Alternative<V>> {
        if self.alts.is_empty() {
            panic!(
                "grammar definition: non-terminal {} has no alternatives by is()",
                dump_name(&self.name, self.id)
            );
        }
        self.alts
    }

    /// Marks this non-terminal as the goal. The goal non-terminal must
    /// have exactly one alternative, and exactly one goal must exist in
    /// the grammar. Calling `main` again is permitted.
    pub fn main(mut self) -> Self {
        if self.alts.len() > 1 {
            panic!(
                "grammar definition: main non-terminal {} must have the only alternative, here are {}",
                self.dump(),
                self.alts.len()
            );
        }
        self.main = true;
        self
    }

    /// Appends an alternative: the sequence of symbol ids (at least one)
    /// this non-terminal derives to.
    pub fn is(mut self, items: &[SymbolId]) -> Self {
        if items.is_empty() {
            panic!(
                "grammar definition: empty alternative for non-terminal {}",
                self.dump()
            );
        }
        if self.main && !self.alts.is_empty() {
            panic!(
                "grammar definition: main non-terminal {} must have the only alternative",
                self.dump()
            );
        }
        self.alts.push(Alternative {
            items: items.to_vec(),
            calc: None,
        });
        self
    }

    /// Attaches the reduction handler for the latest `is()` alternative.
    ///
    /// The handler receives the values of the alternative's non-hidden
    /// positions, in order, and returns the non-terminal's value, or
    /// `Result<value, error>` to abort the parse. When the alternative
    /// evaluates exactly one value, `eval` may be omitted and the child
    /// value bubbles up unchanged.
    pub fn eval<Args, H>(mut self, handler: H) -> Self
    where
        H: Reduction<V, Args> + 'static,
    {
        let alt = match self.alts.last_mut() {
            Some(alt) => alt,
            None => panic!(
                "grammar definition: using eval() without is() on non-terminal {}",
                dump_name(&self.name, self.id)
            ),
        };
        if alt.calc.is_some() {
            panic!(
                "grammar definition: using eval() again without is() on non-terminal {}",
                dump_name(&self.name, self.id)
            );
        }
        let arity = handler.arity();
        alt.calc = Some((arity, Box::new(move |values| handler.apply(values))));
        self
    }
}
