//! Assertion primitives
//!
//! Each check evaluates its operands once and reports `PASS` or `FAIL` through
//! the [`Context`]. They are normally reached through the `check*!` macros,
//! which supply the operand source text.
//!
//! Numeric checks accept any mix of primitive integer and float types and
//! compare mathematically: `-1i32 < 0u64` holds and `10i32 == 10u8` passes.
//! Floats render with six decimals in failure messages.

use crate::context::Context;
use crate::reporter::ResultKind;
use std::cmp::Ordering;
use std::fmt;

/// A primitive number widened without loss of sign
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Signed(i128),
    Unsigned(u128),
    Float(f64),
}

impl Number {
    /// Mathematical ordering across representations; `None` when NaN is involved
    pub fn compare(self, other: Number) -> Option<Ordering> {
        use Number::*;

        match (self, other) {
            (Signed(a), Signed(b)) => Some(a.cmp(&b)),
            (Unsigned(a), Unsigned(b)) => Some(a.cmp(&b)),
            (Signed(a), Unsigned(b)) => Some(cmp_signed_unsigned(a, b)),
            (Unsigned(a), Signed(b)) => Some(cmp_signed_unsigned(b, a).reverse()),
            (Float(a), b) => a.partial_cmp(&b.as_f64()),
            (a, Float(b)) => a.as_f64().partial_cmp(&b),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Signed(v) => v as f64,
            Number::Unsigned(v) => v as f64,
            Number::Float(v) => v,
        }
    }
}

fn cmp_signed_unsigned(signed: i128, unsigned: u128) -> Ordering {
    if signed < 0 {
        Ordering::Less
    } else {
        (signed as u128).cmp(&unsigned)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Signed(v) => write!(f, "{}", v),
            Number::Unsigned(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{:.6}", v),
        }
    }
}

/// Primitive numeric types usable in `check_eq!` and friends
pub trait Numeric: Copy {
    fn to_number(self) -> Number;
}

macro_rules! impl_numeric {
    ($variant:ident, $wide:ty: $($ty:ty),+) => {
        $(
            impl Numeric for $ty {
                fn to_number(self) -> Number {
                    Number::$variant(self as $wide)
                }
            }
        )+
    };
}

impl_numeric!(Signed, i128: i8, i16, i32, i64, i128, isize);
impl_numeric!(Unsigned, u128: u8, u16, u32, u64, u128, usize);
impl_numeric!(Float, f64: f32, f64);

/// Comparison operator of a numeric check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }

    /// Whether the operator holds for an ordering; unordered only satisfies `!=`
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        match ordering {
            None => self == Comparison::Ne,
            Some(ordering) => match self {
                Comparison::Eq => ordering == Ordering::Equal,
                Comparison::Ne => ordering != Ordering::Equal,
                Comparison::Gt => ordering == Ordering::Greater,
                Comparison::Ge => ordering != Ordering::Less,
                Comparison::Lt => ordering == Ordering::Less,
                Comparison::Le => ordering != Ordering::Greater,
            },
        }
    }
}

/// Result of evaluating one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: ResultKind,
    pub message: String,
}

impl Outcome {
    fn new(holds: bool, message: String) -> Self {
        let kind = if holds {
            ResultKind::Pass
        } else {
            ResultKind::Fail
        };
        Self { kind, message }
    }

    #[track_caller]
    fn report(self, ctx: &Context<'_>) {
        ctx.report(self.kind, self.message);
    }
}

fn equality_symbol(same: bool) -> &'static str {
    if same {
        "=="
    } else {
        "!="
    }
}

/// First `len` bytes of both buffers, `None` when either is too short
fn prefixes<'b>(a: &'b [u8], b: &'b [u8], len: usize) -> Option<(&'b [u8], &'b [u8])> {
    Some((a.get(..len)?, b.get(..len)?))
}

pub fn eval_numeric(op: Comparison, a: Number, b: Number, a_text: &str, b_text: &str) -> Outcome {
    let expression = format!("{} {} {}", a_text, op.symbol(), b_text);

    if op.holds(a.compare(b)) {
        Outcome::new(true, expression)
    } else {
        Outcome::new(
            false,
            format!("{} ({} = {}, {} = {})", expression, a_text, a, b_text, b),
        )
    }
}

pub fn eval_ptr_null(ptr: *const (), text: &str) -> Outcome {
    if ptr.is_null() {
        Outcome::new(true, format!("{} == NULL", text))
    } else {
        Outcome::new(false, format!("{} == NULL ({:p})", text, ptr))
    }
}

pub fn eval_ptr_not_null(ptr: *const (), text: &str) -> Outcome {
    if ptr.is_null() {
        Outcome::new(false, format!("{} != NULL", text))
    } else {
        Outcome::new(true, format!("{} != NULL ({:p})", text, ptr))
    }
}

pub fn eval_ptr_cmp(
    equal: bool,
    a: *const (),
    b: *const (),
    a_text: &str,
    b_text: &str,
) -> Outcome {
    let same = a == b;
    Outcome::new(
        same == equal,
        format!(
            "{} ({:p}) {} {} ({:p})",
            a_text,
            a,
            equality_symbol(same),
            b_text,
            b
        ),
    )
}

pub fn eval_mem_cmp(
    equal: bool,
    a: &[u8],
    b: &[u8],
    len: usize,
    a_text: &str,
    b_text: &str,
) -> Outcome {
    match prefixes(a, b, len) {
        Some((a, b)) => {
            let same = a == b;
            Outcome::new(
                same == equal,
                format!("{} {} {}", a_text, equality_symbol(same), b_text),
            )
        }
        None => Outcome::new(
            false,
            format!("{} / {}: length {} exceeds a buffer", a_text, b_text, len),
        ),
    }
}

pub fn eval_str_cmp(
    equal: bool,
    a: &[u8],
    b: &[u8],
    len: usize,
    a_text: &str,
    b_text: &str,
) -> Outcome {
    let same = prefixes(a, b, len).map(|(a, b)| a == b);
    Outcome::new(
        same == Some(equal),
        format!(
            "{} {} {} ({} = {}, {} = {})",
            a_text,
            equality_symbol(same == Some(true)),
            b_text,
            a_text,
            String::from_utf8_lossy(a),
            b_text,
            String::from_utf8_lossy(b)
        ),
    )
}

/// `check!`
#[track_caller]
pub fn expr(ctx: &Context<'_>, value: bool, text: &str) {
    Outcome::new(value, text.to_string()).report(ctx);
}

/// `check_eq!`, `check_ne!`, `check_gt!`, `check_ge!`, `check_lt!`, `check_le!`
#[track_caller]
pub fn numeric<A: Numeric, B: Numeric>(
    ctx: &Context<'_>,
    op: Comparison,
    a: A,
    b: B,
    a_text: &str,
    b_text: &str,
) {
    eval_numeric(op, a.to_number(), b.to_number(), a_text, b_text).report(ctx);
}

/// `check_ptr_null!`
#[track_caller]
pub fn ptr_null<T: ?Sized>(ctx: &Context<'_>, ptr: *const T, text: &str) {
    eval_ptr_null(ptr.cast(), text).report(ctx);
}

/// `check_ptr_not_null!`
#[track_caller]
pub fn ptr_not_null<T: ?Sized>(ctx: &Context<'_>, ptr: *const T, text: &str) {
    eval_ptr_not_null(ptr.cast(), text).report(ctx);
}

/// `check_ptr_eq!` (`equal = true`) and `check_ptr_ne!` (`equal = false`)
#[track_caller]
pub fn ptr_cmp<T: ?Sized, U: ?Sized>(
    ctx: &Context<'_>,
    equal: bool,
    a: *const T,
    b: *const U,
    a_text: &str,
    b_text: &str,
) {
    eval_ptr_cmp(equal, a.cast(), b.cast(), a_text, b_text).report(ctx);
}

/// `check_mem_eq!` (`equal = true`) and `check_mem_ne!` (`equal = false`)
#[track_caller]
pub fn mem_cmp<A, B>(
    ctx: &Context<'_>,
    equal: bool,
    a: &A,
    b: &B,
    len: usize,
    a_text: &str,
    b_text: &str,
) where
    A: AsRef<[u8]> + ?Sized,
    B: AsRef<[u8]> + ?Sized,
{
    eval_mem_cmp(equal, a.as_ref(), b.as_ref(), len, a_text, b_text).report(ctx);
}

/// `check_str_eq!` (`equal = true`) and `check_str_ne!` (`equal = false`)
#[track_caller]
pub fn str_cmp<A, B>(
    ctx: &Context<'_>,
    equal: bool,
    a: &A,
    b: &B,
    len: usize,
    a_text: &str,
    b_text: &str,
) where
    A: AsRef<[u8]> + ?Sized,
    B: AsRef<[u8]> + ?Sized,
{
    eval_str_cmp(equal, a.as_ref(), b.as_ref(), len, a_text, b_text).report(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(10i32.to_number(), 10u32.to_number(), Some(Ordering::Equal))]
    #[case((-1i64).to_number(), 0u8.to_number(), Some(Ordering::Less))]
    #[case(u128::MAX.to_number(), i128::MAX.to_number(), Some(Ordering::Greater))]
    #[case(2.5f32.to_number(), 2i8.to_number(), Some(Ordering::Greater))]
    #[case(3u16.to_number(), 3.0f64.to_number(), Some(Ordering::Equal))]
    #[case(f64::NAN.to_number(), 1i32.to_number(), None)]
    fn test_compare_across_types(
        #[case] a: Number,
        #[case] b: Number,
        #[case] expected: Option<Ordering>,
    ) {
        assert_eq!(a.compare(b), expected);
    }

    #[rstest]
    #[case(Comparison::Eq, Ordering::Equal, true)]
    #[case(Comparison::Eq, Ordering::Less, false)]
    #[case(Comparison::Ne, Ordering::Greater, true)]
    #[case(Comparison::Gt, Ordering::Greater, true)]
    #[case(Comparison::Gt, Ordering::Equal, false)]
    #[case(Comparison::Ge, Ordering::Equal, true)]
    #[case(Comparison::Lt, Ordering::Less, true)]
    #[case(Comparison::Le, Ordering::Greater, false)]
    fn test_comparison_holds(
        #[case] op: Comparison,
        #[case] ordering: Ordering,
        #[case] expected: bool,
    ) {
        assert_eq!(op.holds(Some(ordering)), expected);
    }

    #[test]
    fn test_nan_only_satisfies_ne() {
        assert!(Comparison::Ne.holds(None));
        assert!(!Comparison::Eq.holds(None));
        assert!(!Comparison::Le.holds(None));
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!((0.1f64 + 0.2).to_number().to_string(), "0.300000");
        assert_eq!(0.3f64.to_number().to_string(), "0.300000");
        assert_eq!((-42i16).to_number().to_string(), "-42");
        assert_eq!(u64::MAX.to_number().to_string(), "18446744073709551615");
    }

    #[test]
    fn test_float_exact_equality_is_exact() {
        let a = (0.1f64 + 0.2).to_number();
        let b = 0.3f64.to_number();
        assert!(!Comparison::Eq.holds(a.compare(b)));
    }

    #[test]
    fn test_numeric_failure_renders_operands() {
        let outcome = eval_numeric(
            Comparison::Eq,
            (0.1f64 + 0.2).to_number(),
            0.3f64.to_number(),
            "0.1 + 0.2",
            "0.3",
        );
        assert_eq!(outcome.kind, ResultKind::Fail);
        assert_eq!(
            outcome.message,
            "0.1 + 0.2 == 0.3 (0.1 + 0.2 = 0.300000, 0.3 = 0.300000)"
        );
    }

    #[test]
    fn test_numeric_pass_renders_expression_only() {
        let outcome = eval_numeric(Comparison::Eq, 10i32.to_number(), 10u32.to_number(), "a", "b");
        assert_eq!(outcome, Outcome::new(true, "a == b".to_string()));

        let outcome = eval_numeric(Comparison::Lt, (-1i32).to_number(), 0u32.to_number(), "x", "0");
        assert_eq!(outcome.kind, ResultKind::Pass);
    }

    #[test]
    fn test_ptr_outcomes() {
        let value = 5u8;
        let addr: *const () = (&value as *const u8).cast();
        let null = std::ptr::null::<()>();

        assert_eq!(eval_ptr_null(null, "p"), Outcome::new(true, "p == NULL".to_string()));
        let outcome = eval_ptr_null(addr, "p");
        assert_eq!(outcome.kind, ResultKind::Fail);
        assert_eq!(outcome.message, format!("p == NULL ({:p})", addr));

        assert_eq!(eval_ptr_not_null(null, "p"), Outcome::new(false, "p != NULL".to_string()));
        assert_eq!(eval_ptr_not_null(addr, "p").kind, ResultKind::Pass);

        let outcome = eval_ptr_cmp(true, addr, addr, "a", "b");
        assert_eq!(outcome.kind, ResultKind::Pass);
        assert_eq!(outcome.message, format!("a ({:p}) == b ({:p})", addr, addr));

        let outcome = eval_ptr_cmp(false, addr, null, "a", "b");
        assert_eq!(outcome.kind, ResultKind::Pass);
        assert!(outcome.message.contains(" != b "));

        assert_eq!(eval_ptr_cmp(false, addr, addr, "a", "b").kind, ResultKind::Fail);
    }

    #[rstest]
    #[case(true, b"ciao", b"ciao", 4, ResultKind::Pass, "a == b")]
    #[case(true, b"ciao", b"cia0", 4, ResultKind::Fail, "a != b")]
    #[case(true, b"ciao", b"cia0", 3, ResultKind::Pass, "a == b")]
    #[case(false, b"ciao", b"cia0", 4, ResultKind::Pass, "a != b")]
    #[case(false, b"ciao", b"ciao", 4, ResultKind::Fail, "a == b")]
    fn test_mem_outcomes(
        #[case] equal: bool,
        #[case] a: &[u8],
        #[case] b: &[u8],
        #[case] len: usize,
        #[case] kind: ResultKind,
        #[case] message: &str,
    ) {
        assert_eq!(
            eval_mem_cmp(equal, a, b, len, "a", "b"),
            Outcome::new(kind == ResultKind::Pass, message.to_string())
        );
    }

    #[test]
    fn test_overlong_length_fails_both_ways() {
        assert_eq!(eval_mem_cmp(true, b"ab", b"abc", 3, "a", "b").kind, ResultKind::Fail);
        assert_eq!(eval_mem_cmp(false, b"ab", b"abc", 3, "a", "b").kind, ResultKind::Fail);
        assert_eq!(eval_str_cmp(true, b"ab", b"abc", 3, "a", "b").kind, ResultKind::Fail);
        assert_eq!(eval_str_cmp(false, b"ab", b"abc", 3, "a", "b").kind, ResultKind::Fail);
    }

    #[test]
    fn test_str_outcome_renders_text() {
        let outcome = eval_str_cmp(true, b"ciao", b"cia0", 4, "s", "t");
        assert_eq!(outcome.kind, ResultKind::Fail);
        assert_eq!(outcome.message, "s != t (s = ciao, t = cia0)");

        let outcome = eval_str_cmp(false, b"ciao", b"cia0", 4, "s", "t");
        assert_eq!(outcome.kind, ResultKind::Pass);
    }

    #[test]
    fn test_prefixes_bounds() {
        assert!(prefixes(b"ciao", b"cia0", 4).is_some());
        assert!(prefixes(b"ciao", b"cia", 4).is_none());
        assert_eq!(prefixes(b"ciao", b"cia0", 3), Some((&b"cia"[..], &b"cia"[..])));
    }
}
