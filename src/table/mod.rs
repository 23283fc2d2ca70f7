use std::collections::BTreeMap;

use crate::grammar::Grammar;
use crate::symbol::{SymbolId, INVALID_ID};

pub(crate) mod item;
pub(crate) mod itemset;
pub(crate) mod row;

use item::Item;
use itemset::ItemSet;
use row::Row;

/// The LR(0) parse table: one row per state of the canonical itemset
/// collection, state 0 being the closure of the goal rule.
pub(crate) struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Enumerates the canonical collection breadth-first. Both the
    /// pending states and each state's outgoing groups are visited in
    /// ascending id order, so state numbering is deterministic for a
    /// given grammar.
    pub fn new<V>(g: &Grammar<V>) -> Self {
        let mut states: Vec<ItemSet> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();

        let mut pending: BTreeMap<usize, BTreeMap<SymbolId, ItemSet>> = BTreeMap::new();
        let mut seed = BTreeMap::new();
        seed.insert(
            INVALID_ID,
            ItemSet::new(vec![Item::new(g.main_rule_index())], g),
        );
        pending.insert(0, seed);

        while !pending.is_empty() {
            let mut next_pending: BTreeMap<usize, BTreeMap<SymbolId, ItemSet>> = BTreeMap::new();
            for (from_state, incoming) in pending {
                for (incoming_id, incoming_set) in incoming {
                    if let Some(existing) = states.iter().position(|s| s.same_items(&incoming_set))
                    {
                        record_action(&mut rows, g, from_state, incoming_id, existing);
                        continue;
                    }
                    let new_state = states.len();
                    let mut row = Row::default();
                    if incoming_set.has_final_item(g) {
                        row.set_accept_eof();
                    }
                    let outgoing = incoming_set.goto_sets(g);
                    states.push(incoming_set);
                    rows.push(row);
                    record_action(&mut rows, g, from_state, incoming_id, new_state);
                    next_pending.insert(new_state, outgoing);
                }
            }
            pending = next_pending;
        }

        for (state, set) in states.iter().enumerate() {
            if let Some(rule) = set.reduce_rule(g) {
                rows[state].set_reduce_rule(rule);
            }
        }

        Self { rows }
    }

    pub fn row(&self, state: usize) -> &Row {
        &self.rows[state]
    }

    pub fn rows_count(&self) -> usize {
        self.rows.len()
    }

    /// Renders every row, for debugging and determinism checks.
    pub fn dump<V>(&self, g: &Grammar<V>) -> String {
        let mut s = String::from("====[ table ]====\n");
        for (i, row) in self.rows.iter().enumerate() {
            s.push_str(&format!("row {} ---------\n", i));
            s.push_str(&row.dump("\t", g));
        }
        s.push_str("=================\n");
        s
    }
}

/// Records the edge leading into a state: a shift for a terminal label,
/// a goto for a non-terminal one. The `INVALID_ID` label marks the seed
/// of state 0, which nothing leads into.
fn record_action<V>(
    rows: &mut [Row],
    g: &Grammar<V>,
    from_state: usize,
    incoming_id: SymbolId,
    to_state: usize,
) {
    if incoming_id == INVALID_ID {
        return;
    }
    if g.is_terminal(incoming_id) {
        rows[from_state].set_shift(incoming_id, to_state);
    } else {
        rows[from_state].set_goto(incoming_id, to_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::grammar::{non_term, NonTerminalDef};
    use crate::lexer::terminal::{term, whitespace, Terminal};

    const T_INT: SymbolId = 1;
    const T_PLUS: SymbolId = 2;
    const T_MINUS: SymbolId = 3;

    const N_VAL: SymbolId = 10;
    const N_SUM: SymbolId = 11;
    const N_GOAL: SymbolId = 12;

    fn terminals() -> Vec<Terminal<i64>> {
        vec![
            term(T_INT, "int").take_bytes_with(
                |b| b.is_ascii_digit(),
                |b: &[u8]| -> Result<i64, ValueError> {
                    Ok(String::from_utf8_lossy(b).parse::<i64>()?)
                },
            ),
            term(T_PLUS, "\"+\"").hidden().text("+"),
            term(T_MINUS, "\"-\"").hidden().text("-"),
            whitespace().take_bytes(|b| b == b' '),
        ]
    }

    fn definitions() -> Vec<NonTerminalDef<i64>> {
        vec![
            non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
            non_term(N_SUM, "Sum")
                .is(&[N_SUM, T_PLUS, N_VAL])
                .eval(|a: i64, b: i64| a + b)
                .is(&[N_SUM, T_MINUS, N_VAL])
                .eval(|a: i64, b: i64| a - b)
                .is(&[N_VAL]),
            non_term(N_VAL, "Val").is(&[T_INT]),
        ]
    }

    fn new_grammar() -> Grammar<i64> {
        Grammar::new(terminals(), definitions())
    }

    #[test]
    fn all_references_stay_in_range() {
        let g = new_grammar();
        let table = Table::new(&g);
        assert!(table.rows_count() > 0);
        for state in 0..table.rows_count() {
            let row = table.row(state);
            for to in row.shift_targets() {
                assert!(to < table.rows_count());
            }
            for to in row.goto_targets() {
                assert!(to < table.rows_count());
            }
            if let Some(rule) = row.reduce_rule() {
                assert!(rule < g.rules_count());
            }
        }
    }

    #[test]
    fn start_state_shifts_into_the_grammar() {
        let g = new_grammar();
        let table = Table::new(&g);
        let start = table.row(0);
        assert!(!start.accept_eof());
        assert!(start.shift_to(T_INT).is_some());
        assert!(start.shift_to(T_PLUS).is_none());
        assert!(start.goto_to(N_SUM).is_some());
        assert!(start.goto_to(N_VAL).is_some());
        assert_eq!(start.reduce_rule(), None);
    }

    #[test]
    fn accepting_state_exists_and_keeps_shifting() {
        let g = new_grammar();
        let table = Table::new(&g);
        let accept: Vec<usize> = (0..table.rows_count())
            .filter(|&s| table.row(s).accept_eof())
            .collect();
        assert_eq!(accept.len(), 1);
        let row = table.row(accept[0]);
        // `Goal := Sum > $` coexists with `Sum := Sum > "+" Val`
        assert!(row.shift_to(T_PLUS).is_some());
        assert!(row.shift_to(T_MINUS).is_some());
        assert!(row.shift_to(T_INT).is_none());
    }

    #[test]
    fn reduce_only_states_reduce_the_unit_rules() {
        let g = new_grammar();
        let table = Table::new(&g);
        let reduce_only: Vec<usize> = (0..table.rows_count())
            .filter(|&s| table.row(s).is_reduce_only())
            .collect();
        // after int: Val := int >; after Val: Sum := Val >;
        // after Sum "+" Val and Sum "-" Val
        assert_eq!(reduce_only.len(), 4);
        for state in reduce_only {
            let rule = match table.row(state).reduce_rule() {
                Some(rule) => rule,
                None => unreachable!(),
            };
            assert!(!g.rule(rule).has_eof());
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let g1 = new_grammar();
        let g2 = Grammar::new(terminals(), definitions());
        let d1 = Table::new(&g1).dump(&g1);
        let d2 = Table::new(&g2).dump(&g2);
        assert_eq!(d1, d2);
        assert!(d1.contains("====[ table ]===="));
        assert!(d1.contains("Goal : Sum $"));
    }
}
