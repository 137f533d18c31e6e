//! Built-in fragments and the compositions every synthesis starts from.
//!
//! The constants are built directly; their types are exactly what the
//! checked operators would assign to the same text.

use crate::diagnostic::Violation;
use crate::fragment::{Fragment, Repr};
use crate::op;
use crate::types::{FragType, Kind, Taint};

/// `[]`
pub fn array() -> Fragment {
    op::empty_container()
}

/// `+[]`, evaluates to 0.
pub fn zero() -> Fragment {
    Fragment::new(FragType::PLAIN_NUMBER, Vec::new(), Repr::CastNumber(array()))
}

/// `[]==[]`, evaluates to false.
pub fn false_() -> Fragment {
    Fragment::new(
        FragType::PLAIN_LOGIC,
        Vec::new(),
        Repr::Compare(array(), array()),
    )
}

/// `+[]==[]`, evaluates to true.
///
/// The numeric left side is declared unconstrained so that the compare
/// accepts it; `0 == ""` holds in the environment.
pub fn true_() -> Fragment {
    let left = op::masquerade(zero(), FragType::ANY);
    Fragment::new(FragType::PLAIN_LOGIC, Vec::new(), Repr::Compare(left, array()))
}

/// `[][[]]`, the absence sentinel.
pub fn undefined() -> Fragment {
    let empty = array();
    let latent = empty.latent().get(1..).unwrap_or(&[]).to_vec();
    Fragment::new(
        FragType::new(Taint::Slot, Kind::Unconstrained),
        latent,
        Repr::Index(empty, array()),
    )
}

/// `+[][[]]`, evaluates to NaN.
pub fn nan() -> Fragment {
    Fragment::new(
        FragType::PLAIN_NUMBER,
        Vec::new(),
        Repr::CastNumber(undefined()),
    )
}

/// `[x][+[]]`: the value of `x` in slot position, safe to place anywhere.
pub fn group(x: Fragment) -> Result<Fragment, Violation> {
    op::index(op::container(Some(x))?, zero())
}

/// `[][v]=r`: evaluates `v` for its effects, yields `r`.
pub fn comma(v: Fragment, r: Fragment) -> Result<Fragment, Violation> {
    op::assign(op::index(array(), v)?, r)
}

/// Text conversion of `x`.
///
/// | input | result |
/// |---|---|
/// | text kind | `x` |
/// | container or slot | `[]+x` |
/// | number kind | `x+[]` |
/// | anything else | `[]+[x]` |
pub fn cast_string(x: Fragment) -> Result<Fragment, Violation> {
    if x.kind().is_exactly(Kind::Text) {
        Ok(x)
    } else if x.taint().is_addressable() {
        op::join(array(), x)
    } else if x.kind().is_exactly(Kind::Number) {
        op::join(x, array())
    } else {
        op::join(array(), op::container(Some(x))?)
    }
}

/// `x` if it can already be indexed, `[x]` otherwise.
pub fn weak_container(x: Fragment) -> Result<Fragment, Violation> {
    if x.taint().is_addressable() {
        Ok(x)
    } else {
        op::container(Some(x))
    }
}

/// A single decimal digit built from first principles.
///
/// 1 increments an empty container's slot, 2 increments a `true` slot,
/// and every later digit increments the slot holding its predecessor.
pub fn digit(d: u8) -> Result<Fragment, Violation> {
    match d {
        0 => Ok(zero()),
        1 => op::increment(group(array())?),
        2 => op::increment(group(true_())?),
        3..=9 => op::increment(group(digit(d - 1)?)?),
        _ => Err(Violation::type_error(format!("{} is not a decimal digit", d))),
    }
}

/// A fragment that coerces to `n`, built digit by digit.
///
/// Multi-digit values render as `d1+[d2+[d3]]`; the nested containers
/// force concatenation instead of addition.
pub fn integer(n: u64) -> Result<Fragment, Violation> {
    integer_with(n, digit)
}

/// [`integer`] with a caller-supplied digit source.
pub fn integer_with<F>(n: u64, mut digit_of: F) -> Result<Fragment, Violation>
where
    F: FnMut(u8) -> Result<Fragment, Violation>,
{
    let digits: Vec<u8> = n.to_string().bytes().map(|b| b - b'0').collect();
    let Some((&last, rest)) = digits.split_last() else {
        return digit_of(0);
    };
    let mut def = digit_of(last)?;
    for &d in rest.iter().rev() {
        def = op::join(digit_of(d)?, op::container(Some(def))?)?;
    }
    Ok(def)
}
