use std::collections::{BTreeMap, BTreeSet};

use crate::lexer::terminal::Terminal;
use crate::lexer::Lexer;
use crate::symbol::{dump_name, SymbolId, SymbolRegistry};

pub mod non_terminal;
pub mod reduce;
pub(crate) mod rule;

pub use non_terminal::{non_term, NonTerminalDef};

use non_terminal::NonTerminalDef as Def;
use rule::Rule;

/// The validated grammar: the terminal registry, the flat rule arena in
/// declaration order, the goal rule, and the subject → rules index.
/// Immutable once built; rules are referenced by index everywhere else.
pub(crate) struct Grammar<V> {
    lexer: Lexer<V>,
    non_terminals: BTreeMap<SymbolId, String>,
    rules: Vec<Rule<V>>,
    main_index: usize,
    subject_rules: BTreeMap<SymbolId, Vec<usize>>,
}

impl<V> Grammar<V> {
    /// Builds and validates the grammar. Any violated invariant (id
    /// reuse, subject that is a terminal, rule referencing an undefined
    /// symbol, zero or several goal rules, unused terminals) is a
    /// definition mistake and panics with the offender named.
    pub fn new(terminals: Vec<Terminal<V>>, definitions: Vec<Def<V>>) -> Self {
        let lexer = Lexer::new(terminals);
        let mut non_terminals = BTreeMap::new();
        let mut rules: Vec<Rule<V>> = Vec::new();
        let mut main_index: Option<usize> = None;
        let mut subject_rules: BTreeMap<SymbolId, Vec<usize>> = BTreeMap::new();
        // non-terminals referenced before (or without) a definition,
        // keyed by id, valued by the place first seen
        let mut undefined: BTreeMap<SymbolId, String> = BTreeMap::new();
        let mut used_terminals: BTreeSet<SymbolId> = BTreeSet::new();

        for def in definitions {
            let subject = def.id();
            let subject_dump = def.dump();
            if subject <= 0 {
                panic!(
                    "grammar definition: non-terminal {} id must be positive",
                    subject_dump
                );
            }
            if lexer.is_terminal(subject) {
                panic!(
                    "grammar definition: non-terminal {} is a terminal",
                    subject_dump
                );
            }
            if non_terminals.insert(subject, def.name().to_string()).is_some() {
                panic!(
                    "grammar definition: non-terminal {} defined twice",
                    subject_dump
                );
            }
            undefined.remove(&subject);

            let main = def.is_main();
            let name = def.name().to_string();
            for (ri, alt) in def.into_alternatives().into_iter().enumerate() {
                let rule = Rule::compile(subject, &name, main, alt, &lexer);
                if rule.has_eof() {
                    if main_index.is_some() {
                        panic!(
                            "grammar definition: another rule {} has the main flag too",
                            subject_dump
                        );
                    }
                    main_index = Some(rules.len());
                }
                subject_rules.entry(subject).or_default().push(rules.len());
                for (i, &id) in rule.definition().iter().enumerate() {
                    if lexer.is_terminal(id) {
                        used_terminals.insert(id);
                        continue;
                    }
                    if subject_rules.contains_key(&id) || undefined.contains_key(&id) {
                        continue;
                    }
                    undefined.insert(
                        id,
                        format!(
                            "#{} in non-terminal {} rules[{}] definitions[{}]",
                            id, subject_dump, ri, i
                        ),
                    );
                }
                rules.push(rule);
            }
        }

        if !undefined.is_empty() {
            let mut message =
                String::from("grammar definition: undefined non-terminals without rules:\n");
            for at in undefined.values() {
                message.push_str("- ");
                message.push_str(at);
                message.push('\n');
            }
            panic!("{}", message);
        }
        let main_index = match main_index {
            Some(index) => index,
            None => panic!("grammar definition: no main rule with EOF flag"),
        };
        let unused = lexer.unused_terminals(&used_terminals);
        if !unused.is_empty() {
            let mut message =
                String::from("grammar definition: terminals not used in any rule:\n");
            for name in unused {
                message.push_str("- ");
                message.push_str(&name);
                message.push('\n');
            }
            panic!("{}", message);
        }

        Self {
            lexer,
            non_terminals,
            rules,
            main_index,
            subject_rules,
        }
    }

    pub fn lexer(&self) -> &Lexer<V> {
        &self.lexer
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.lexer.is_terminal(id)
    }

    pub fn terminal_ids(&self) -> BTreeSet<SymbolId> {
        self.lexer.terminal_ids()
    }

    #[cfg(test)]
    pub fn rules_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, index: usize) -> &Rule<V> {
        &self.rules[index]
    }

    /// Index of the single rule with the EOF flag.
    pub fn main_rule_index(&self) -> usize {
        self.main_index
    }

    /// Indices of the rules whose subject is `id`. Validation guarantees
    /// every non-terminal referenced by a rule has at least one.
    pub fn rules_for(&self, id: SymbolId) -> &[usize] {
        match self.subject_rules.get(&id) {
            Some(indices) => indices,
            None => panic!("internal: no rules for non-terminal {}", dump_name("", id)),
        }
    }
}

impl<V> SymbolRegistry for Grammar<V> {
    fn symbol_name(&self, id: SymbolId) -> Option<String> {
        if let Some(name) = self.lexer.symbol_name(id) {
            return Some(name.to_string());
        }
        self.non_terminals.get(&id).cloned()
    }
}
