//! Operator constructors.
//!
//! Each constructor checks its operands against the taint/kind lattice and
//! either returns a new fragment or a violation; nothing is built on
//! failure and operands are never modified.
//!
//! | operator | text | operands | result |
//! |---|---|---|---|
//! | container | `[x?]` | any | container:array |
//! | index | `t[k]` | container/slot, any | slot:<element kind> |
//! | cast_number | `+x` | container/slot | plain:number |
//! | increment | `++s` | slot, not string | plain:number |
//! | join | `a+b` | a: container/slot/plain:string/plain:number, b: container/slot/plain:string | plain:number or plain:string |
//! | assign | `s=v` | slot, any | plain:<kind of v> |
//! | compare | `a==b` | container/slot, container/slot | plain:boolean |

#[cfg(test)]
mod tests;

use crate::diagnostic::Violation;
use crate::fragment::{Fragment, Lineage, Repr, PREFIX};
use crate::span::Span;
use crate::types::{FragType, Kind, Taint};

const ADDRESSABLE: [FragType; 2] = [FragType::ANY_CONTAINER, FragType::ANY_SLOT];

/// `[inner]`, or `[]` when `inner` is `None`.
pub fn container(inner: Option<Fragment>) -> Result<Fragment, Violation> {
    let inner = inner.unwrap_or_else(Fragment::empty);
    inner.ty().expect(FragType::ANY, "container element")?;

    let mut latent = Vec::with_capacity(inner.latent().len() + 1);
    latent.push(inner.ty());
    latent.extend_from_slice(inner.latent());
    Ok(Fragment::new(FragType::CONTAINER, latent, Repr::Container(inner)))
}

/// `[]`.
pub fn empty_container() -> Fragment {
    let inner = Fragment::empty();
    let latent = vec![inner.ty()];
    Fragment::new(FragType::CONTAINER, latent, Repr::Container(inner))
}

/// `target[key]`.
///
/// Indexing past the end is legal; the environment yields the absence
/// sentinel there.
pub fn index(target: Fragment, key: Fragment) -> Result<Fragment, Violation> {
    target.ty().expect_any(&ADDRESSABLE, "index target")?;
    key.ty().expect(FragType::ANY, "index key")?;

    // members of text are text; otherwise the element kind the target holds
    let kind = if target.kind() == Kind::Text {
        Kind::Text
    } else {
        target
            .latent()
            .first()
            .map(|t| t.kind)
            .unwrap_or(Kind::Unconstrained)
    };
    let latent = target.latent().get(1..).unwrap_or(&[]).to_vec();
    Ok(Fragment::new(
        FragType::new(Taint::Slot, kind),
        latent,
        Repr::Index(target, key),
    ))
}

/// `+x`. A fragment that is already a number is returned unchanged.
pub fn cast_number(x: Fragment) -> Result<Fragment, Violation> {
    if x.kind().is_exactly(Kind::Number) {
        return Ok(x);
    }
    x.ty().expect_any(&ADDRESSABLE, "operand of numeric cast")?;
    Ok(Fragment::new(
        FragType::PLAIN_NUMBER,
        Vec::new(),
        Repr::CastNumber(x),
    ))
}

/// `++slot`. Reads the slot, writes back the incremented number.
pub fn increment(slot: Fragment) -> Result<Fragment, Violation> {
    slot.ty().expect(FragType::ANY_SLOT, "operand of increment")?;
    if !slot.kind().increments_as_number() {
        return Err(Violation::type_error(format!(
            "cannot increment a {} slot",
            slot.kind().name()
        ))
        .with_note("members of text are read-only".to_string()));
    }
    Ok(Fragment::new(
        FragType::PLAIN_NUMBER,
        Vec::new(),
        Repr::Increment(slot),
    ))
}

/// `a+b`: arithmetic when both sides are number-like, concatenation
/// otherwise.
pub fn join(a: Fragment, b: Fragment) -> Result<Fragment, Violation> {
    a.ty().expect_any(
        &[
            FragType::ANY_SLOT,
            FragType::ANY_CONTAINER,
            FragType::PLAIN_TEXT,
            FragType::PLAIN_NUMBER,
        ],
        "left operand of join",
    )?;
    b.ty().expect_any(
        &[
            FragType::ANY_SLOT,
            FragType::ANY_CONTAINER,
            FragType::PLAIN_TEXT,
        ],
        "right operand of join",
    )?;

    if b.first_char() == Some(PREFIX) {
        let text = format!("{}+{}", a.peek(), b.peek());
        let at = a.len() as u32;
        return Err(Violation::syntax(format!(
            "right operand starts with '{}' at the join point",
            PREFIX
        ))
        .at(text, Span::new(at, at + 2))
        .with_help("wrap the right operand in a container".to_string()));
    }

    // `a+x+y` parses as `(a+x)+y`
    if b.effective_lineage() == Lineage::Join {
        let text = format!("{}+{}", a.peek(), b.peek());
        let at = a.len() as u32;
        return Err(Violation::syntax(
            "right operand of join comes from Join and would regroup to the left".to_string(),
        )
        .at(text, Span::new(at, at + 1))
        .with_help("wrap the right operand in a container".to_string()));
    }

    for (side, operand) in [("left", &a), ("right", &b)] {
        let lineage = operand.effective_lineage();
        if matches!(lineage, Lineage::Assign | Lineage::Compare) {
            return Err(Violation::syntax(format!(
                "{} operand of join comes from {:?}, which cannot be joined without parentheses",
                side, lineage
            ))
            .with_help("wrap the operand in a container".to_string()));
        }
    }

    let kind = if a.kind().is_number_like() && b.kind().is_number_like() {
        Kind::Number
    } else {
        Kind::Text
    };
    Ok(Fragment::new(
        FragType::new(Taint::Plain, kind),
        Vec::new(),
        Repr::Join(a, b),
    ))
}

/// `slot=value`. Evaluates to `value` and overwrites the slot.
pub fn assign(slot: Fragment, value: Fragment) -> Result<Fragment, Violation> {
    slot.ty().expect(FragType::ANY_SLOT, "assignment target")?;
    value.ty().expect(FragType::ANY, "assigned value")?;

    let ty = FragType::new(Taint::Plain, value.kind());
    let latent = value.latent().to_vec();
    Ok(Fragment::new(ty, latent, Repr::Assign(slot, value)))
}

/// `a==b` under the environment's loose equality.
pub fn compare(a: Fragment, b: Fragment) -> Result<Fragment, Violation> {
    a.ty().expect_any(&ADDRESSABLE, "left operand of compare")?;
    b.ty().expect_any(&ADDRESSABLE, "right operand of compare")?;
    Ok(Fragment::new(
        FragType::PLAIN_LOGIC,
        Vec::new(),
        Repr::Compare(a, b),
    ))
}

/// Same text as `x`, declared as `ty`. Latent element types are kept.
///
/// Only for operands known by construction to behave as `ty` where the
/// lattice cannot see it.
pub fn masquerade(x: Fragment, ty: FragType) -> Fragment {
    let latent = x.latent().to_vec();
    Fragment::new(ty, latent, Repr::Masquerade(x))
}

/// `slot+=value`. Outside the model: the assigned kind cannot be tracked.
pub fn add_assign(_slot: Fragment, _value: Fragment) -> Result<Fragment, Violation> {
    Err(Violation::unimplemented("+=")
        .with_note("the kind a compound assignment leaves in its slot is not tracked".to_string()))
}

/// `a===b`. Outside the model.
pub fn strict_compare(_a: Fragment, _b: Fragment) -> Result<Fragment, Violation> {
    Err(Violation::unimplemented("==="))
}
