use crate::grammar::Grammar;
use crate::symbol::{dump_id, SymbolId};

/// An LR(0) item: a rule (by arena index) with a dot position splitting
/// its definition into passed and further symbols. A rule of N symbols
/// produces exactly N+1 items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Item {
    pub rule: usize,
    pub dot: usize,
}

impl Item {
    /// The item for `rule` with the dot at the first symbol.
    pub fn new(rule: usize) -> Self {
        Self { rule, dot: 0 }
    }

    /// Whether any symbols remain after the dot.
    pub fn has_further<V>(&self, g: &Grammar<V>) -> bool {
        self.dot < g.rule(self.rule).definition().len()
    }

    /// The symbol right after the dot, `None` with the dot at the end.
    pub fn expected<V>(&self, g: &Grammar<V>) -> Option<SymbolId> {
        g.rule(self.rule).definition().get(self.dot).copied()
    }

    /// A new item with the dot moved over one symbol.
    pub fn shifted<V>(&self, g: &Grammar<V>) -> Item {
        if !self.has_further(g) {
            panic!("internal: shifting an item with the dot at the end");
        }
        Item {
            rule: self.rule,
            dot: self.dot + 1,
        }
    }

    /// Renders `Subject : sym > sym` with `>` marking the dot.
    pub fn dump<V>(&self, g: &Grammar<V>) -> String {
        let rule = g.rule(self.rule);
        let mut s = format!("{} :", dump_id(rule.subject(), g));
        for (i, &id) in rule.definition().iter().enumerate() {
            if i == self.dot {
                s.push_str(" >");
            }
            s.push(' ');
            s.push_str(&dump_id(id, g));
        }
        if self.dot >= rule.definition().len() {
            s.push_str(" >");
        }
        if rule.has_eof() {
            s.push_str(" $");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::grammar::non_term;
    use crate::lexer::terminal::term;
    use crate::symbol::SymbolId;

    const T_INT: SymbolId = 1;
    const T_PLUS: SymbolId = 2;
    const N_SUM: SymbolId = 10;
    const N_GOAL: SymbolId = 11;

    fn new_grammar() -> Grammar<i64> {
        Grammar::new(
            vec![
                term(T_INT, "int").take_bytes_with(
                    |b| b.is_ascii_digit(),
                    |b: &[u8]| -> Result<i64, ValueError> {
                        Ok(String::from_utf8_lossy(b).parse::<i64>()?)
                    },
                ),
                term(T_PLUS, "\"+\"").hidden().text("+"),
            ],
            vec![
                non_term(N_GOAL, "Goal").main().is(&[N_SUM]),
                non_term(N_SUM, "Sum")
                    .is(&[N_SUM, T_PLUS, T_INT])
                    .eval(|a: i64, b: i64| a + b)
                    .is(&[T_INT]),
            ],
        )
    }

    #[test]
    fn dot_walks_the_definition() {
        let g = new_grammar();
        // Sum : Sum "+" int
        let item = Item::new(1);
        assert!(item.has_further(&g));
        assert_eq!(item.expected(&g), Some(N_SUM));

        let item = item.shifted(&g);
        assert_eq!(item.expected(&g), Some(T_PLUS));
        let item = item.shifted(&g).shifted(&g);
        assert!(!item.has_further(&g));
        assert_eq!(item.expected(&g), None);
    }

    #[test]
    #[should_panic(expected = "dot at the end")]
    fn shifting_past_the_end_is_an_internal_error() {
        let g = new_grammar();
        let item = Item { rule: 2, dot: 1 };
        item.shifted(&g);
    }

    #[test]
    fn dump_marks_the_dot() {
        let g = new_grammar();
        assert_eq!(Item::new(1).dump(&g), "Sum : > Sum \"+\" int");
        assert_eq!(Item { rule: 1, dot: 1 }.dump(&g), "Sum : Sum > \"+\" int");
        assert_eq!(Item { rule: 1, dot: 3 }.dump(&g), "Sum : Sum \"+\" int >");
        assert_eq!(Item::new(0).dump(&g), "Goal : > Sum $");
    }
}
