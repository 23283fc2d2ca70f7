use std::error::Error;
use std::fmt;

/// Error produced by a user value function or reduction handler. Returned
/// unchanged to the caller, wrapped into [`ParseError::Value`] so it stays
/// discoverable through the standard `source()` chain.
pub type ValueError = Box<dyn Error + Send + Sync + 'static>;

/// An owned snapshot of the source text around an error position.
///
/// Rendering contract: `⟪before⟫⏵⟪after⟫`, with `⏵<EOF>` at the end of
/// input; the alternate form (`{:#}`) lays the text out on its own line
/// with a caret under the error position. C0 control characters, space
/// and DEL appear as Unicode Control Pictures so they stay visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    offset: usize,
    before: String,
    after: String,
}

impl SourceContext {
    pub(crate) fn new(offset: usize, before: String, after: String) -> Self {
        Self { offset, before, after }
    }

    /// Byte offset of the error position in the original input.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            if !self.before.is_empty() {
                f.write_str(&self.before)?;
            }
            if !self.after.is_empty() {
                f.write_str(&self.after)?;
            } else {
                f.write_str("<EOF>")?;
            }
            writeln!(f)?;
            for _ in self.before.chars() {
                f.write_str("-")?;
            }
            writeln!(f, "^")
        } else {
            if !self.before.is_empty() {
                write!(f, "\u{27ea}{}\u{27eb}", self.before)?;
            }
            f.write_str("\u{23f5}")?;
            if !self.after.is_empty() {
                write!(f, "\u{27ea}{}\u{27eb}", self.after)
            } else {
                f.write_str("<EOF>")
            }
        }
    }
}

/// Run-time rejection of an input, returned from `Parser::parse`.
///
/// Grammar-definition mistakes and internal invariant violations are not
/// represented here: those are programming errors and panic at build time
/// (messages prefixed `grammar definition:` and `internal:` respectively).
#[derive(Debug)]
pub enum ParseError {
    /// The input does not match the grammar: unexpected byte, no viable
    /// shift or reduce, or trailing input where EOF was required.
    Unexpected {
        message: String,
        at: SourceContext,
    },
    /// A user value function or reduction handler rejected the parse.
    Value {
        source: ValueError,
        at: SourceContext,
    },
}

impl ParseError {
    pub(crate) fn unexpected(message: impl Into<String>, at: SourceContext) -> Self {
        ParseError::Unexpected {
            message: message.into(),
            at,
        }
    }

    pub(crate) fn value(source: ValueError, at: SourceContext) -> Self {
        ParseError::Value { source, at }
    }

    /// The source position the parse failed at.
    pub fn context(&self) -> &SourceContext {
        match self {
            ParseError::Unexpected { at, .. } | ParseError::Value { at, .. } => at,
        }
    }

    /// True for input rejections produced by the parser itself, false
    /// when the error originated in user code.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Unexpected { .. })
    }

    /// The user error that aborted the parse, if any.
    pub fn value_error(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Value { source, .. } => Some(&**source as &(dyn Error + 'static)),
            ParseError::Unexpected { .. } => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (head, at): (&dyn fmt::Display, &SourceContext) = match self {
            ParseError::Unexpected { message, at } => (message, at),
            ParseError::Value { source, at } => (source, at),
        };
        if f.alternate() {
            writeln!(f, "{} near:", head)?;
            write!(f, "{:#}", at)
        } else {
            write!(f, "{} near {}", head, at)
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.value_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl Error for Boom {}

    fn ctx() -> SourceContext {
        SourceContext::new(2, "1+".to_string(), "x".to_string())
    }

    #[test]
    fn unexpected_renders_message_with_context() {
        let err = ParseError::unexpected("expected int", ctx());
        assert!(err.is_syntax());
        assert_eq!(err.context().offset(), 2);
        assert_eq!(
            err.to_string(),
            "expected int near \u{27ea}1+\u{27eb}\u{23f5}\u{27ea}x\u{27eb}"
        );
        assert_eq!(format!("{:#}", err), "expected int near:\n1+x\n--^\n");
    }

    #[test]
    fn value_error_is_exposed_through_source_chain() {
        let err = ParseError::value(Box::new(Boom), ctx());
        assert!(!err.is_syntax());
        assert_eq!(err.to_string(), "boom near \u{27ea}1+\u{27eb}\u{23f5}\u{27ea}x\u{27eb}");
        let source = err.source().expect("source");
        assert!(source.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn eof_context_renders_marker() {
        let at = SourceContext::new(0, String::new(), String::new());
        assert_eq!(at.to_string(), "\u{23f5}<EOF>");
        assert_eq!(format!("{:#}", at), "<EOF>\n^\n");
    }
}
