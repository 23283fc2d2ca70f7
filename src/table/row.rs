use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::Grammar;
use crate::symbol::{dump_id, SymbolId};

/// One table state: the terminal shifts, the non-terminal gotos, the
/// accept-EOF flag and the optional reduction rule (by arena index).
#[derive(Debug, Default)]
pub(crate) struct Row {
    accept_eof: bool,
    expected: BTreeSet<SymbolId>,
    shifts: BTreeMap<SymbolId, usize>,
    gotos: BTreeMap<SymbolId, usize>,
    reduce_rule: Option<usize>,
}

impl Row {
    pub fn accept_eof(&self) -> bool {
        self.accept_eof
    }

    pub fn set_accept_eof(&mut self) {
        self.accept_eof = true;
    }

    pub fn reduce_rule(&self) -> Option<usize> {
        self.reduce_rule
    }

    pub fn set_reduce_rule(&mut self, rule: usize) {
        self.reduce_rule = Some(rule);
    }

    /// All terminals shiftable in this state, for the scanner.
    pub fn expected_terminals(&self) -> &BTreeSet<SymbolId> {
        &self.expected
    }

    pub fn shift_to(&self, id: SymbolId) -> Option<usize> {
        self.shifts.get(&id).copied()
    }

    /// Records a shift edge. Re-recording the same edge is idempotent; a
    /// different target would be a bug in the state enumeration.
    pub fn set_shift(&mut self, id: SymbolId, to: usize) {
        if let Some(&have) = self.shifts.get(&id) {
            if have != to {
                panic!(
                    "internal: shift for {} already set to state {}, now {}",
                    id, have, to
                );
            }
        }
        self.expected.insert(id);
        self.shifts.insert(id, to);
    }

    pub fn goto_to(&self, id: SymbolId) -> Option<usize> {
        self.gotos.get(&id).copied()
    }

    pub fn set_goto(&mut self, id: SymbolId, to: usize) {
        if let Some(&have) = self.gotos.get(&id) {
            if have != to {
                panic!(
                    "internal: goto for {} already set to state {}, now {}",
                    id, have, to
                );
            }
        }
        self.gotos.insert(id, to);
    }

    /// True when reducing is all this state can do: no shifts, no gotos,
    /// no EOF acceptance, and a reduction rule present.
    pub fn is_reduce_only(&self) -> bool {
        !self.accept_eof
            && self.shifts.is_empty()
            && self.gotos.is_empty()
            && self.reduce_rule.is_some()
    }

    #[cfg(test)]
    pub fn shift_targets(&self) -> impl Iterator<Item = usize> + '_ {
        self.shifts.values().copied()
    }

    #[cfg(test)]
    pub fn goto_targets(&self) -> impl Iterator<Item = usize> + '_ {
        self.gotos.values().copied()
    }

    pub fn dump<V>(&self, indent: &str, g: &Grammar<V>) -> String {
        let mut s = format!(
            "{}EOF: {}\n",
            indent,
            if self.accept_eof { "ACCEPT" } else { "-" }
        );
        s.push_str(indent);
        s.push_str("terminals:");
        if self.shifts.is_empty() {
            s.push_str(" -\n");
        } else {
            s.push('\n');
            for (&id, &to) in &self.shifts {
                s.push_str(&format!("{}\t{} -> {}\n", indent, dump_id(id, g), to));
            }
        }
        s.push_str(indent);
        s.push_str("goto:");
        if self.gotos.is_empty() {
            s.push_str(" -\n");
        } else {
            s.push('\n');
            for (&id, &to) in &self.gotos {
                s.push_str(&format!("{}\t{} -> {}\n", indent, dump_id(id, g), to));
            }
        }
        s.push_str(indent);
        s.push_str("rule:");
        match self.reduce_rule {
            Some(rule) => {
                s.push('\n');
                s.push_str(indent);
                s.push('\t');
                s.push_str(&g.rule(rule).dump(g));
                s.push('\n');
            }
            None => s.push_str(" -\n"),
        }
        s
    }
}
