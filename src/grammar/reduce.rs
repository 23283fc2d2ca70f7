use crate::error::ValueError;

/// Boxed reduction evaluator stored on a compiled rule: consumes the
/// non-hidden child values and produces the rule's value.
pub(crate) type CalcFn<V> = Box<dyn Fn(Vec<V>) -> Result<V, ValueError> + Send + Sync>;

/// Adapts a handler result: either a plain value or `Result<value, error>`.
/// Returning an error aborts the parse with that error.
pub trait IntoValue<V> {
    fn into_value(self) -> Result<V, ValueError>;
}

impl<V> IntoValue<V> for V {
    fn into_value(self) -> Result<V, ValueError> {
        Ok(self)
    }
}

impl<V, E> IntoValue<V> for Result<V, E>
where
    E: Into<ValueError>,
{
    fn into_value(self) -> Result<V, ValueError> {
        self.map_err(Into::into)
    }
}

/// A reduction handler over value type `V`.
///
/// Implemented for plain functions and closures of up to seven `V`
/// arguments, so handler arity is checked through the type system: the
/// grammar build verifies it against the number of non-hidden positions
/// in the rule. The `Args` parameter is only a marker distinguishing the
/// arities.
pub trait Reduction<V, Args>: Send + Sync {
    fn arity(&self) -> usize;
    fn apply(&self, values: Vec<V>) -> Result<V, ValueError>;
}

fn arity_mismatch<T>(wanted: usize, got: usize) -> T {
    panic!(
        "internal: reduction of arity {} applied to {} values",
        wanted, got
    );
}

impl<V, F, R> Reduction<V, [V; 0]> for F
where
    F: Fn() -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        0
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 0]>::try_from(values) {
            Ok([]) => self().into_value(),
            Err(values) => arity_mismatch(0, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 1]> for F
where
    F: Fn(V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        1
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 1]>::try_from(values) {
            Ok([a]) => self(a).into_value(),
            Err(values) => arity_mismatch(1, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 2]> for F
where
    F: Fn(V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        2
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 2]>::try_from(values) {
            Ok([a, b]) => self(a, b).into_value(),
            Err(values) => arity_mismatch(2, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 3]> for F
where
    F: Fn(V, V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        3
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 3]>::try_from(values) {
            Ok([a, b, c]) => self(a, b, c).into_value(),
            Err(values) => arity_mismatch(3, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 4]> for F
where
    F: Fn(V, V, V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        4
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 4]>::try_from(values) {
            Ok([a, b, c, d]) => self(a, b, c, d).into_value(),
            Err(values) => arity_mismatch(4, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 5]> for F
where
    F: Fn(V, V, V, V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        5
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 5]>::try_from(values) {
            Ok([a, b, c, d, e]) => self(a, b, c, d, e).into_value(),
            Err(values) => arity_mismatch(5, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 6]> for F
where
    F: Fn(V, V, V, V, V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        6
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 6]>::try_from(values) {
            Ok([a, b, c, d, e, f]) => self(a, b, c, d, e, f).into_value(),
            Err(values) => arity_mismatch(6, values.len()),
        }
    }
}

impl<V, F, R> Reduction<V, [V; 7]> for F
where
    F: Fn(V, V, V, V, V, V, V) -> R + Send + Sync,
    R: IntoValue<V>,
{
    fn arity(&self) -> usize {
        7
    }

    fn apply(&self, values: Vec<V>) -> Result<V, ValueError> {
        match <[V; 7]>::try_from(values) {
            Ok([a, b, c, d, e, f, g]) => self(a, b, c, d, e, f, g).into_value(),
            Err(values) => arity_mismatch(7, values.len()),
        }
    }
}

/// The implicit rule evaluator used when no handler is attached and the
/// rule has exactly one non-hidden position: the child value bubbles up
/// unchanged.
pub(crate) fn bubble<V>() -> CalcFn<V> {
    Box::new(|mut values: Vec<V>| {
        if values.len() != 1 {
            panic!(
                "internal: bubble reduction over {} values instead of 1",
                values.len()
            );
        }
        match values.pop() {
            Some(v) => Ok(v),
            None => panic!("internal: bubble reduction over empty values"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Negative;

    impl fmt::Display for Negative {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("negative")
        }
    }

    impl std::error::Error for Negative {}

    #[test]
    fn plain_results_are_values() {
        let h = |a: i64, b: i64| a + b;
        assert_eq!(Reduction::<i64, _>::arity(&h), 2);
        assert_eq!(h.apply(vec![40, 2]).expect("value"), 42);
    }

    #[test]
    fn fallible_handlers_surface_their_error() {
        let h = |a: i64| -> Result<i64, Negative> {
            if a < 0 {
                Err(Negative)
            } else {
                Ok(a)
            }
        };
        assert_eq!(h.apply(vec![5]).expect("value"), 5);
        let err = match h.apply(vec![-5]) {
            Err(err) => err,
            Ok(_) => panic!("handler must fail"),
        };
        assert!(err.downcast_ref::<Negative>().is_some());
    }

    #[test]
    fn zero_arity_handlers_are_allowed() {
        let h = || 7i64;
        assert_eq!(Reduction::<i64, _>::arity(&h), 0);
        assert_eq!(h.apply(vec![]).expect("value"), 7);
    }

    #[test]
    #[should_panic(expected = "internal: reduction of arity")]
    fn wrong_argument_count_is_an_internal_error() {
        let h = |a: i64, b: i64| a + b;
        let _ = h.apply(vec![1]);
    }

    #[test]
    fn bubble_returns_the_single_child() {
        let b = bubble::<i64>();
        assert_eq!(b(vec![42]).expect("value"), 42);
    }

    #[test]
    #[should_panic(expected = "internal: bubble")]
    fn bubble_over_many_values_is_an_internal_error() {
        let b = bubble::<i64>();
        let _ = b(vec![1, 2]);
    }
}
