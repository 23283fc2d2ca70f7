use std::collections::BTreeSet;

use crate::error::ValueError;
use crate::grammar::non_terminal::Alternative;
use crate::grammar::reduce::{bubble, CalcFn};
use crate::lexer::Lexer;
use crate::symbol::{dump_id, dump_name, SymbolId, SymbolRegistry};

/// A compiled grammar rule: one alternative of a non-terminal.
///
/// `hidden_at` holds the definition positions occupied by hidden
/// terminals; those positions are skipped when collecting handler
/// arguments. `eof` is set on the single goal rule only.
pub(crate) struct Rule<V> {
    subject: SymbolId,
    eof: bool,
    definition: Vec<SymbolId>,
    hidden_at: BTreeSet<usize>,
    calc: CalcFn<V>,
}

impl<V> Rule<V> {
    /// Compiles one alternative of `subject` against the lexer's hidden
    /// flags, adapting the handler. Definition mistakes panic with the
    /// owning non-terminal named.
    pub fn compile(
        subject: SymbolId,
        subject_name: &str,
        main: bool,
        alt: Alternative<V>,
        lexer: &Lexer<V>,
    ) -> Self {
        let hidden_at: BTreeSet<usize> = alt
            .items
            .iter()
            .enumerate()
            .filter(|(_, &id)| lexer.is_hidden(id))
            .map(|(i, _)| i)
            .collect();
        let arity = alt.items.len() - hidden_at.len();
        let calc = match alt.calc {
            None if arity == 1 => bubble(),
            None => panic!(
                "grammar definition: rule for {}: no eval() handler and {} values to reduce",
                dump_name(subject_name, subject),
                arity
            ),
            Some((declared, _)) if declared != arity => panic!(
                "grammar definition: rule for {}: handler arguments count is {} when wanted {}",
                dump_name(subject_name, subject),
                declared,
                arity
            ),
            Some((_, calc)) => calc,
        };
        Self {
            subject,
            eof: main,
            definition: alt.items,
            hidden_at,
            calc,
        }
    }

    pub fn subject(&self) -> SymbolId {
        self.subject
    }

    /// True only for the goal rule, whose reduction must coincide with
    /// end of input.
    pub fn has_eof(&self) -> bool {
        self.eof
    }

    pub fn definition(&self) -> &[SymbolId] {
        &self.definition
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden_at.contains(&index)
    }

    /// Evaluates the rule over the collected non-hidden child values.
    pub fn value(&self, values: Vec<V>) -> Result<V, ValueError> {
        (self.calc)(values)
    }

    /// Renders `Subject : sym sym $` through a symbol registry.
    pub fn dump(&self, registry: &dyn SymbolRegistry) -> String {
        let mut s = format!("{} :", dump_id(self.subject, registry));
        for &id in &self.definition {
            s.push(' ');
            s.push_str(&dump_id(id, registry));
        }
        if self.eof {
            s.push_str(" $");
        }
        s
    }
}
