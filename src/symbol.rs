use std::fmt::Write;

/// Identifier for terminals and non-terminals.
///
/// Zero is `INVALID_ID` and must not be used in definitions. All
/// user-defined symbols, terminal and non-terminal alike, take positive
/// ids from a single id space.
pub type SymbolId = i32;

/// The reserved zero value of `SymbolId`. Used internally to seed the
/// initial table state; not allowed in definitions.
pub const INVALID_ID: SymbolId = 0;

/// Name lookup for symbols, for diagnostics and dumps.
pub(crate) trait SymbolRegistry {
    /// Returns the declared name of the symbol, if any.
    fn symbol_name(&self, id: SymbolId) -> Option<String>;
}

/// Renders a symbol by name, falling back to `#<id>` for unnamed or
/// unknown ids.
pub(crate) fn dump_id(id: SymbolId, registry: &dyn SymbolRegistry) -> String {
    match registry.symbol_name(id) {
        Some(name) if !name.is_empty() => name,
        _ => dump_plain_id(id),
    }
}

pub(crate) fn dump_plain_id(id: SymbolId) -> String {
    let mut s = String::new();
    let _ = write!(s, "#{}", id);
    s
}

/// Renders a symbol from its declared name and id.
pub(crate) fn dump_name(name: &str, id: SymbolId) -> String {
    if name.is_empty() {
        dump_plain_id(id)
    } else {
        name.to_string()
    }
}
