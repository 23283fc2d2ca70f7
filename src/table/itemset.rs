use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::Grammar;
use crate::symbol::SymbolId;
use crate::table::item::Item;

/// A closed set of LR(0) items. Equality is set equality; the member
/// order is the canonical order produced by the closure walk.
#[derive(Debug)]
pub(crate) struct ItemSet {
    items: Vec<Item>,
}

impl ItemSet {
    /// Closes the seed items over the grammar and validates the result
    /// for LR(0) conflicts.
    pub fn new<V>(seed: Vec<Item>, g: &Grammar<V>) -> Self {
        let items = close_over(seed, g);
        validate_deterministic(&items, g);
        Self { items }
    }

    /// True when the set contains the goal rule with the dot at the end:
    /// this state accepts EOF.
    pub fn has_final_item<V>(&self, g: &Grammar<V>) -> bool {
        self.items
            .iter()
            .any(|it| g.rule(it.rule).has_eof() && !it.has_further(g))
    }

    /// The rule of the single reducible item, if any. Uniqueness is
    /// guaranteed by the reduce-reduce validation.
    pub fn reduce_rule<V>(&self, g: &Grammar<V>) -> Option<usize> {
        self.items
            .iter()
            .find(|it| !it.has_further(g))
            .map(|it| it.rule)
    }

    /// Set equality regardless of member order.
    pub fn same_items(&self, other: &ItemSet) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|it| other.items.contains(it))
    }

    /// Builds the successor seed for every symbol some item expects:
    /// items grouped by the expected symbol with the dot advanced over
    /// it, each group closed into the successor set.
    pub fn goto_sets<V>(&self, g: &Grammar<V>) -> BTreeMap<SymbolId, ItemSet> {
        let mut groups: BTreeMap<SymbolId, Vec<Item>> = BTreeMap::new();
        for it in &self.items {
            let id = match it.expected(g) {
                Some(id) => id,
                None => continue,
            };
            let next = it.shifted(g);
            let group = groups.entry(id).or_default();
            if !group.contains(&next) {
                group.push(next);
            }
        }
        groups
            .into_iter()
            .map(|(id, seed)| (id, ItemSet::new(seed, g)))
            .collect()
    }
}

/// Transitive ε-closure: for every item whose dot stands before a
/// non-terminal, every rule of that non-terminal joins with the dot at
/// the start. Each non-terminal is expanded once.
fn close_over<V>(seed: Vec<Item>, g: &Grammar<V>) -> Vec<Item> {
    let mut closed: Vec<Item> = Vec::new();
    let mut expanded: BTreeSet<SymbolId> = BTreeSet::new();

    let mut pending = seed;
    while !pending.is_empty() {
        let mut fresh: Vec<SymbolId> = Vec::new();
        for it in pending {
            if closed.contains(&it) {
                continue;
            }
            closed.push(it);
            let next_id = match it.expected(g) {
                Some(id) if !g.is_terminal(id) => id,
                _ => continue,
            };
            if expanded.contains(&next_id) {
                continue;
            }
            fresh.push(next_id);
        }
        expanded.extend(fresh.iter().copied());
        pending = fresh
            .into_iter()
            .flat_map(|id| g.rules_for(id).iter().map(|&r| Item::new(r)))
            .collect();
    }
    closed
}

/// Validates an itemset for LR(0) conflicts; a conflict is a grammar
/// definition mistake and panics.
///
/// The shift-reduce check only fires when the shifting items cover every
/// declared terminal: while one terminal remains unshiftable the grammar
/// is given the benefit of the doubt, since the tokenizer may be unable
/// to produce the shifting terminals where the reduction applies.
fn validate_deterministic<V>(items: &[Item], g: &Grammar<V>) {
    let mut finite: Vec<Item> = Vec::new();
    let mut shift_terminals: Vec<SymbolId> = Vec::new();
    for it in items {
        match it.expected(g) {
            None => finite.push(*it),
            Some(id) if g.is_terminal(id) => shift_terminals.push(id),
            Some(_) => (),
        }
    }

    if !finite.is_empty() && !shift_terminals.is_empty() {
        let mut rest = g.terminal_ids();
        for id in &shift_terminals {
            rest.remove(id);
        }
        if rest.is_empty() {
            let mut message =
                String::from("grammar definition: shift-reduce conflict in state:\n");
            for it in items {
                message.push_str("- ");
                message.push_str(&it.dump(g));
                message.push('\n');
            }
            panic!("{}", message);
        }
    }

    if finite.len() > 1 {
        let mut message = String::from("grammar definition: reduce-reduce conflict between:\n");
        for it in &finite {
            message.push_str("- ");
            message.push_str(&it.dump(g));
            message.push('\n');
        }
        panic!("{}", message);
    }
}
