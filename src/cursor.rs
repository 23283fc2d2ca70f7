use std::fmt;

use crate::error::SourceContext;

/// Rune window rendered on each side of a cursor position in error context.
const FORMAT_CONTEXT: usize = 30;

/// An immutable reading position inside a byte buffer.
///
/// Every operation returns a new `Cursor` instead of mutating; a cursor is
/// `Copy`, so callers keep as many positions alive as they need while
/// backtracking between terminal candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    source: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor pointing at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { source: input, at: 0 }
    }

    fn to(self, pos: usize) -> Self {
        Self {
            source: self.source,
            at: pos.min(self.source.len()),
        }
    }

    /// Returns true when the position is at the end of the buffer.
    pub fn is_eof(&self) -> bool {
        self.at >= self.source.len()
    }

    /// Length of the whole underlying buffer.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// The current byte offset.
    pub fn offset(&self) -> usize {
        self.at
    }

    /// Count of bytes left to read.
    pub fn rest_len(&self) -> usize {
        self.source.len() - self.at
    }

    /// The unread tail of the buffer.
    pub fn rest_bytes(&self) -> &'a [u8] {
        &self.source[self.at..]
    }

    /// Bytes between this position and `to`.
    ///
    /// Panics when `to` points backwards.
    pub fn bytes_to(&self, to: Cursor<'a>) -> &'a [u8] {
        if to.at < self.at {
            panic!(
                "internal: negative offset: from {} to backward offset {}",
                self.at, to.at
            );
        }
        &self.source[self.at..to.at]
    }

    /// A new cursor moved `n` bytes forward (clamped at the end of the
    /// buffer) or backward for negative `n`.
    ///
    /// Panics when a backward move would underflow the buffer start.
    pub fn advance(&self, n: isize) -> Self {
        if n < 0 {
            let back = n.unsigned_abs();
            if back > self.at {
                panic!(
                    "internal: negative offset: from {} backward by {}",
                    self.at, back
                );
            }
            self.to(self.at - back)
        } else {
            self.to(self.at.saturating_add(n as usize))
        }
    }

    /// The byte at the current position, `None` at EOF.
    pub fn peek_byte(&self) -> Option<u8> {
        self.source.get(self.at).copied()
    }

    /// Decodes one UTF-8 rune at the current position, returning it with
    /// its encoded length. Invalid UTF-8 yields U+FFFD with length 1, so
    /// byte-oriented skipping still makes progress. `None` at EOF.
    pub fn peek_rune(&self) -> Option<(char, usize)> {
        if self.is_eof() {
            return None;
        }
        let end = (self.at + 4).min(self.source.len());
        let window = &self.source[self.at..end];
        let valid = match std::str::from_utf8(window) {
            Ok(s) => s,
            Err(e) if e.valid_up_to() > 0 => match std::str::from_utf8(&window[..e.valid_up_to()]) {
                Ok(s) => s,
                Err(_) => return Some((char::REPLACEMENT_CHARACTER, 1)),
            },
            Err(_) => return Some((char::REPLACEMENT_CHARACTER, 1)),
        };
        valid.chars().next().map(|c| (c, c.len_utf8()))
    }

    /// Consumes the maximal prefix of bytes satisfying `ok`. When nothing
    /// matches, the input cursor itself and an empty slice come back.
    pub fn take_bytes_while<F: Fn(u8) -> bool>(&self, ok: F) -> (Cursor<'a>, &'a [u8]) {
        let mut next = *self;
        while let Some(b) = next.peek_byte() {
            if !ok(b) {
                break;
            }
            next = next.advance(1);
        }
        (next, &self.source[self.at..next.at])
    }

    /// Consumes the maximal prefix of runes satisfying `ok`, collecting
    /// the decoded text. Invalid UTF-8 decodes as U+FFFD (length 1).
    pub fn take_runes_while<F: Fn(char) -> bool>(&self, ok: F) -> (Cursor<'a>, String) {
        let mut next = *self;
        let mut text = String::new();
        while let Some((r, n)) = next.peek_rune() {
            if !ok(r) {
                break;
            }
            text.push(r);
            next = next.advance(n as isize);
        }
        (next, text)
    }

    /// Returns the cursor past `pattern` when every byte of it matches at
    /// the current position, `None` otherwise.
    pub fn expect_bytes(&self, pattern: &[u8]) -> Option<Cursor<'a>> {
        let mut next = *self;
        for &b in pattern {
            match next.peek_byte() {
                Some(have) if have == b => next = next.advance(1),
                _ => return None,
            }
        }
        Some(next)
    }

    /// Snapshots the surrounding source text for error rendering. The
    /// windows hold up to 30 runes each side; C0 control characters,
    /// space and DEL map to Unicode Control Pictures.
    pub fn context(&self) -> SourceContext {
        SourceContext::new(
            self.at,
            map_control(&self.before_window()),
            map_control(&self.after_window()),
        )
    }

    fn before_window(&self) -> String {
        let mut from = self.at;
        let mut rest = FORMAT_CONTEXT;
        while from > 0 && rest > 0 {
            from -= 1;
            if is_rune_start(self.source[from]) {
                rest -= 1;
            }
        }
        String::from_utf8_lossy(&self.source[from..self.at]).into_owned()
    }

    fn after_window(&self) -> String {
        let mut to = self.at;
        let mut started = 0;
        while to < self.source.len() {
            if is_rune_start(self.source[to]) {
                started += 1;
                if started > FORMAT_CONTEXT {
                    break;
                }
            }
            to += 1;
        }
        String::from_utf8_lossy(&self.source[self.at..to]).into_owned()
    }
}

impl fmt::Display for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.context(), f)
    }
}

fn is_rune_start(b: u8) -> bool {
    b & 0xC0 != 0x80
}

fn map_control(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\0'..='\x1f' => char::from_u32(0x2400 + c as u32).unwrap_or(c),
            ' ' => '\u{2420}',
            '\u{7f}' => '\u{2421}',
            c => c,
        })
        .collect()
}
