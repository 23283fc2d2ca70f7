use crate::cursor::Cursor;
use crate::error::ValueError;
use crate::symbol::{dump_name, SymbolId};

/// A token matching strategy. `None` means the terminal does not match at
/// the given position; a successful match returns the cursor past the
/// token together with the token value (or the value function's error,
/// which aborts the parse).
pub(crate) trait Matches<V>: Send + Sync {
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)>;
}

/// A whitespace skipping strategy; `None` means nothing to skip here.
pub(crate) trait Skips: Send + Sync {
    fn skip<'a>(&self, cur: Cursor<'a>) -> Option<Cursor<'a>>;
}

type ValueFn<V> = Box<dyn Fn(&[u8]) -> Result<V, ValueError> + Send + Sync>;

/// A token matcher. Either a user terminal, which takes part in the
/// grammar under its symbol id, or a whitespace terminal, which is
/// silently skipped before every match attempt.
pub struct Terminal<V> {
    pub(crate) inner: TermInner<V>,
}

pub(crate) enum TermInner<V> {
    User(UserTerminal<V>),
    Whitespace(Box<dyn Skips>),
}

pub(crate) struct UserTerminal<V> {
    pub id: SymbolId,
    pub name: String,
    pub hidden: bool,
    pub matches: Box<dyn Matches<V>>,
}

impl<V> UserTerminal<V> {
    pub fn dump(&self) -> String {
        dump_name(&self.name, self.id)
    }
}

/// Starts a user terminal definition.
///
/// The id must be positive; `name` is used in diagnostics and may be
/// empty, in which case the terminal renders as `#<id>`.
///
/// ```text
/// term(T_PLUS, "\"+\"").hidden().text("+")
/// ```
pub fn term(id: SymbolId, name: &str) -> TerminalFactory {
    if id <= 0 {
        panic!(
            "grammar definition: terminal {} id must be positive",
            dump_name(name, id)
        );
    }
    TerminalFactory {
        id,
        name: name.to_string(),
        hidden: false,
    }
}

/// Starts a whitespace terminal definition. Whitespace terminals carry no
/// symbol id and produce no value; they are tried, in declaration order,
/// before every match attempt, and any number of them may be declared.
///
/// ```text
/// whitespace().take_runes(char::is_whitespace)
/// ```
pub fn whitespace() -> WhitespaceFactory {
    WhitespaceFactory {}
}

/// Chainable builder for a user terminal; finished by one of the matcher
/// constructors.
pub struct TerminalFactory {
    id: SymbolId,
    name: String,
    hidden: bool,
}

impl TerminalFactory {
    /// Marks the terminal hidden: its position is omitted from reduction
    /// handler arguments.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    fn finish<V>(self, matches: Box<dyn Matches<V>>) -> Terminal<V> {
        Terminal {
            inner: TermInner::User(UserTerminal {
                id: self.id,
                name: self.name,
                hidden: self.hidden,
                matches,
            }),
        }
    }

    fn dump(&self) -> String {
        dump_name(&self.name, self.id)
    }

    /// Matches the exact byte sequence. Fixed patterns carry no payload
    /// (the pattern is statically known), so the token value is
    /// `V::default()`.
    pub fn bytes<V>(self, pattern: impl Into<Vec<u8>>) -> Terminal<V>
    where
        V: Default + 'static,
    {
        let pattern = pattern.into();
        if pattern.is_empty() {
            panic!(
                "grammar definition: empty bytes pattern for terminal {}",
                self.dump()
            );
        }
        self.finish(Box::new(FixedMatcher { pattern }))
    }

    /// Matches the exact substring; see [`TerminalFactory::bytes`].
    pub fn text<V>(self, pattern: &str) -> Terminal<V>
    where
        V: Default + 'static,
    {
        if pattern.is_empty() {
            panic!(
                "grammar definition: empty text pattern for terminal {}",
                self.dump()
            );
        }
        self.bytes(pattern.as_bytes().to_vec())
    }

    /// Matches the maximal non-empty run of bytes satisfying `ok`; the
    /// token value is the matched bytes.
    pub fn take_bytes<V, F>(self, ok: F) -> Terminal<V>
    where
        V: From<Vec<u8>> + 'static,
        F: Fn(u8) -> bool + Send + Sync + 'static,
    {
        self.take_bytes_with(ok, |bytes: &[u8]| V::from(bytes.to_vec()))
    }

    /// Matches the maximal non-empty run of bytes satisfying `ok` and
    /// evaluates the token value with `calc`, which may reject the token
    /// by returning an error.
    ///
    /// ```text
    /// term(T_INT, "int").take_bytes_with(|b| b.is_ascii_digit(), to_int)
    /// ```
    pub fn take_bytes_with<V, F, C, R>(self, ok: F, calc: C) -> Terminal<V>
    where
        V: 'static,
        F: Fn(u8) -> bool + Send + Sync + 'static,
        C: Fn(&[u8]) -> R + Send + Sync + 'static,
        R: IntoTokenValue<V>,
    {
        self.finish(Box::new(ByteRunMatcher {
            ok,
            calc: value_fn(calc),
        }))
    }

    /// Matches the maximal non-empty run of UTF-8 runes satisfying `ok`;
    /// the token value is the matched text.
    pub fn take_runes<V, F>(self, ok: F) -> Terminal<V>
    where
        V: From<String> + 'static,
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        self.take_runes_with(ok, |text: &str| V::from(text.to_string()))
    }

    /// Rune-run matcher with an explicit value function over the matched
    /// text.
    pub fn take_runes_with<V, F, C, R>(self, ok: F, calc: C) -> Terminal<V>
    where
        V: 'static,
        F: Fn(char) -> bool + Send + Sync + 'static,
        C: Fn(&str) -> R + Send + Sync + 'static,
        R: IntoTokenValue<V>,
    {
        self.finish(Box::new(RuneRunMatcher {
            ok,
            calc: Box::new(move |text: &str| calc(text).into_token_value()),
        }))
    }

    /// Matches an anchored byte regex at the current position; the token
    /// value is the matched text (lossily decoded). The pattern must
    /// start with `\A` so it cannot silently match away from the cursor.
    pub fn regex<V>(self, pattern: &str) -> Terminal<V>
    where
        V: From<String> + 'static,
    {
        self.regex_with(pattern, |bytes: &[u8]| {
            V::from(String::from_utf8_lossy(bytes).into_owned())
        })
    }

    /// Anchored regex matcher with an explicit value function over the
    /// matched bytes.
    pub fn regex_with<V, C, R>(self, pattern: &str, calc: C) -> Terminal<V>
    where
        V: 'static,
        C: Fn(&[u8]) -> R + Send + Sync + 'static,
        R: IntoTokenValue<V>,
    {
        let re = compile_anchored(pattern, &self.dump());
        self.finish(Box::new(RegexMatcher {
            re,
            calc: value_fn(calc),
        }))
    }

    /// Wraps an arbitrary match function. `None` means no match; a match
    /// must move the cursor forward (returning the input position is a
    /// definition error, reported when the terminal first fires). A plain
    /// `fn` item works best here, the way a dedicated `match_int` would.
    pub fn match_with<V, F>(self, f: F) -> Terminal<V>
    where
        V: 'static,
        F: for<'a> Fn(Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)>
            + Send
            + Sync
            + 'static,
    {
        self.finish(Box::new(FuncMatcher { f }))
    }
}

/// Chainable builder for a whitespace terminal.
pub struct WhitespaceFactory {}

impl WhitespaceFactory {
    fn finish<V>(self, skip: Box<dyn Skips>) -> Terminal<V> {
        Terminal {
            inner: TermInner::Whitespace(skip),
        }
    }

    /// Skips the maximal non-empty run of bytes satisfying `ok`.
    pub fn take_bytes<V, F>(self, ok: F) -> Terminal<V>
    where
        F: Fn(u8) -> bool + Send + Sync + 'static,
    {
        self.finish(Box::new(ByteRunSkipper { ok }))
    }

    /// Skips the maximal non-empty run of runes satisfying `ok`.
    pub fn take_runes<V, F>(self, ok: F) -> Terminal<V>
    where
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        self.finish(Box::new(RuneRunSkipper { ok }))
    }

    /// Skips an anchored byte regex match, e.g. a line comment:
    ///
    /// ```text
    /// whitespace().regex(r"\A#[^\n]*")
    /// ```
    pub fn regex<V>(self, pattern: &str) -> Terminal<V> {
        let re = compile_anchored(pattern, "whitespace");
        self.finish(Box::new(RegexSkipper { re }))
    }

    /// Wraps an arbitrary skip function; `None` means nothing to skip.
    pub fn match_with<V, F>(self, f: F) -> Terminal<V>
    where
        F: for<'a> Fn(Cursor<'a>) -> Option<Cursor<'a>> + Send + Sync + 'static,
    {
        self.finish(Box::new(FuncSkipper { f }))
    }
}

fn value_fn<V, C, R>(calc: C) -> ValueFn<V>
where
    C: Fn(&[u8]) -> R + Send + Sync + 'static,
    R: IntoTokenValue<V>,
{
    Box::new(move |bytes: &[u8]| calc(bytes).into_token_value())
}

fn compile_anchored(pattern: &str, owner: &str) -> regex::bytes::Regex {
    if pattern.is_empty() {
        panic!("grammar definition: empty regex pattern for terminal {}", owner);
    }
    if !pattern.starts_with("\\A") {
        panic!(
            "grammar definition: unanchored regex {:?} for terminal {}: pattern must start with \\A",
            pattern, owner
        );
    }
    match regex::bytes::Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!(
            "grammar definition: bad regex {:?} for terminal {}: {}",
            pattern, owner, err
        ),
    }
}

struct FixedMatcher {
    pattern: Vec<u8>,
}

impl<V: Default> Matches<V> for FixedMatcher {
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> {
        let next = cur.expect_bytes(&self.pattern)?;
        Some((next, Ok(V::default())))
    }
}

struct ByteRunMatcher<V, F> {
    ok: F,
    calc: ValueFn<V>,
}

impl<V, F> Matches<V> for ByteRunMatcher<V, F>
where
    F: Fn(u8) -> bool + Send + Sync,
{
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> {
        let (next, bytes) = cur.take_bytes_while(&self.ok);
        if next.offset() == cur.offset() {
            return None;
        }
        Some((next, (self.calc)(bytes)))
    }
}

struct RuneRunMatcher<V, F> {
    ok: F,
    calc: Box<dyn Fn(&str) -> Result<V, ValueError> + Send + Sync>,
}

impl<V, F> Matches<V> for RuneRunMatcher<V, F>
where
    F: Fn(char) -> bool + Send + Sync,
{
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> {
        let (next, text) = cur.take_runes_while(&self.ok);
        if next.offset() == cur.offset() {
            return None;
        }
        Some((next, (self.calc)(&text)))
    }
}

struct RegexMatcher<V> {
    re: regex::bytes::Regex,
    calc: ValueFn<V>,
}

impl<V> Matches<V> for RegexMatcher<V> {
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> {
        let m = self.re.find(cur.rest_bytes())?;
        if m.end() == 0 {
            return None;
        }
        Some((cur.advance(m.end() as isize), (self.calc)(m.as_bytes())))
    }
}

struct FuncMatcher<F> {
    f: F,
}

impl<V, F> Matches<V> for FuncMatcher<F>
where
    F: for<'a> Fn(Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> + Send + Sync,
{
    fn matches<'a>(&self, cur: Cursor<'a>) -> Option<(Cursor<'a>, Result<V, ValueError>)> {
        (self.f)(cur)
    }
}

struct ByteRunSkipper<F> {
    ok: F,
}

impl<F> Skips for ByteRunSkipper<F>
where
    F: Fn(u8) -> bool + Send + Sync,
{
    fn skip<'a>(&self, cur: Cursor<'a>) -> Option<Cursor<'a>> {
        let (next, _) = cur.take_bytes_while(&self.ok);
        if next.offset() == cur.offset() {
            return None;
        }
        Some(next)
    }
}

struct RuneRunSkipper<F> {
    ok: F,
}

impl<F> Skips for RuneRunSkipper<F>
where
    F: Fn(char) -> bool + Send + Sync,
{
    fn skip<'a>(&self, cur: Cursor<'a>) -> Option<Cursor<'a>> {
        let (next, _) = cur.take_runes_while(&self.ok);
        if next.offset() == cur.offset() {
            return None;
        }
        Some(next)
    }
}

struct RegexSkipper {
    re: regex::bytes::Regex,
}

impl Skips for RegexSkipper {
    fn skip<'a>(&self, cur: Cursor<'a>) -> Option<Cursor<'a>> {
        let m = self.re.find(cur.rest_bytes())?;
        if m.end() == 0 {
            return None;
        }
        Some(cur.advance(m.end() as isize))
    }
}

struct FuncSkipper<F> {
    f: F,
}

impl<F> Skips for FuncSkipper<F>
where
    F: for<'a> Fn(Cursor<'a>) -> Option<Cursor<'a>> + Send + Sync,
{
    fn skip<'a>(&self, cur: Cursor<'a>) -> Option<Cursor<'a>> {
        (self.f)(cur)
    }
}

/// Adapts a value function result: either a plain value or
/// `Result<value, error>`, mirroring the reduction handler contract.
pub trait IntoTokenValue<V> {
    fn into_token_value(self) -> Result<V, ValueError>;
}

impl<V> IntoTokenValue<V> for V {
    fn into_token_value(self) -> Result<V, ValueError> {
        Ok(self)
    }
}

impl<V, E> IntoTokenValue<V> for Result<V, E>
where
    E: Into<ValueError>,
{
    fn into_token_value(self) -> Result<V, ValueError> {
        self.map_err(Into::into)
    }
}
