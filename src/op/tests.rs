use super::*;
use crate::diagnostic::ViolationKind;
use crate::eval::{Interpreter, Value};
use crate::intrinsic;

fn zero() -> Fragment {
    cast_number(empty_container()).unwrap()
}

fn text() -> Fragment {
    join(empty_container(), empty_container()).unwrap()
}

fn eval(f: &Fragment) -> Value {
    f.evaluate(&Interpreter::new())
        .unwrap_or_else(|e| panic!("evaluating {}: {e}", f.peek()))
}

#[test]
fn test_container_tracks_element_types() {
    let boxed = container(Some(zero())).unwrap();
    assert_eq!(boxed.peek(), "[+[]]");
    assert_eq!(boxed.ty(), FragType::CONTAINER);
    assert_eq!(boxed.latent(), &[FragType::PLAIN_NUMBER]);

    let nested = container(Some(boxed)).unwrap();
    assert_eq!(nested.latent(), &[FragType::CONTAINER, FragType::PLAIN_NUMBER]);
    assert_eq!(nested.len(), nested.peek().len());
}

#[test]
fn test_index_takes_element_kind() {
    let slot = index(container(Some(zero())).unwrap(), zero()).unwrap();
    assert_eq!(slot.ty(), FragType::new(Taint::Slot, Kind::Number));
    assert!(slot.latent().is_empty());
    assert_eq!(eval(&slot), Value::from(0.0));
}

#[test]
fn test_index_into_text_container_is_text() {
    let slot = index(container(Some(text())).unwrap(), zero()).unwrap();
    assert_eq!(slot.ty(), FragType::new(Taint::Slot, Kind::Text));

    // members of text stay text regardless of latent types
    let member = index(slot, zero()).unwrap();
    assert_eq!(member.kind(), Kind::Text);
}

#[test]
fn test_index_out_of_range_is_absent() {
    let absent = index(empty_container(), empty_container()).unwrap();
    assert_eq!(absent.peek(), "[][[]]");
    assert_eq!(absent.ty(), FragType::ANY_SLOT);
    assert_eq!(eval(&absent), Value::Undefined);
}

#[test]
fn test_index_rejects_plain_target() {
    let err = index(zero(), zero()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
    assert!(err.message.contains("index target"), "{}", err.message);
}

#[test]
fn test_cast_number_is_noop_on_numbers() {
    let z = zero();
    let again = cast_number(z.clone()).unwrap();
    assert!(again.ptr_eq(&z));

    let err = cast_number(text()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
}

#[test]
fn test_increment_needs_numeric_slot() {
    let one = increment(index(container(Some(empty_container())).unwrap(), zero()).unwrap())
        .unwrap();
    assert_eq!(one.peek(), "++[[]][+[]]");
    assert_eq!(one.ty(), FragType::PLAIN_NUMBER);
    assert_eq!(eval(&one), Value::from(1.0));

    let err = increment(empty_container()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);

    let text_slot = index(container(Some(text())).unwrap(), zero()).unwrap();
    let err = increment(text_slot).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
    assert!(err.message.contains("string"));
}

#[test]
fn test_join_of_numbers_is_number() {
    let number_slot = index(container(Some(zero())).unwrap(), zero()).unwrap();
    let sum = join(zero(), number_slot).unwrap();
    assert_eq!(sum.ty(), FragType::PLAIN_NUMBER);
    assert_eq!(eval(&sum), Value::from(0.0));
}

#[test]
fn test_join_with_text_is_text() {
    let joined = join(zero(), container(Some(zero())).unwrap()).unwrap();
    assert_eq!(joined.peek(), "+[]+[+[]]");
    assert_eq!(joined.ty(), FragType::PLAIN_TEXT);
    assert_eq!(eval(&joined), Value::from("00"));

    assert_eq!(text().ty(), FragType::PLAIN_TEXT);
    assert_eq!(eval(&text()), Value::from(""));
}

#[test]
fn test_join_rejects_prefix_at_join_point() {
    // `+[]+[]` is plain text but starts with the prefix character
    let prefixed = join(zero(), empty_container()).unwrap();
    let err = join(empty_container(), prefixed).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Syntax);
    assert_eq!(err.source_text.as_deref(), Some("[]++[]+[]"));
    assert_eq!(err.span.map(|s| s.range()), Some(2..4));
    assert!(err.report("join").contains("++"));
}

#[test]
fn test_join_rejects_plain_number_on_the_right() {
    let err = join(empty_container(), zero()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
}

#[test]
fn test_join_rejects_compare_and_assign_lineage() {
    let cmp = compare(empty_container(), empty_container()).unwrap();
    let disguised = masquerade(cmp, FragType::ANY_SLOT);
    let err = join(disguised, empty_container()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Syntax);
    assert!(err.message.contains("Compare"));

    let slot = index(empty_container(), empty_container()).unwrap();
    let set = assign(slot, empty_container()).unwrap();
    let disguised = masquerade(set, FragType::ANY_CONTAINER);
    let err = join(empty_container(), disguised).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Syntax);
    assert!(err.message.contains("Assign"));
}

#[test]
fn test_join_rejects_join_on_the_right() {
    // `+[]+[+[]==[]][+[]]+[]` would add 0 and "t" first
    let t = intrinsic::group(intrinsic::true_()).unwrap();
    let tail = join(t, empty_container()).unwrap();
    assert_eq!(tail.peek(), "[+[]==[]][+[]]+[]");
    assert_eq!(tail.ty(), FragType::PLAIN_TEXT);

    let err = join(zero(), tail.clone()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Syntax);
    assert!(err.message.contains("Join"));
    assert_eq!(err.span.map(|s| s.range()), Some(3..4));

    let disguised = masquerade(tail.clone(), FragType::ANY_SLOT);
    let err = join(empty_container(), disguised).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Syntax);

    let boxed = join(zero(), container(Some(tail)).unwrap()).unwrap();
    assert_eq!(eval(&boxed), Value::from("0true"));
}

#[test]
fn test_assign_takes_value_type() {
    let slot = index(empty_container(), empty_container()).unwrap();
    let set = assign(slot, zero()).unwrap();
    assert_eq!(set.peek(), "[][[]]=+[]");
    assert_eq!(set.ty(), FragType::PLAIN_NUMBER);
    assert_eq!(eval(&set), Value::from(0.0));

    let boxed = assign(
        index(empty_container(), empty_container()).unwrap(),
        container(Some(zero())).unwrap(),
    )
    .unwrap();
    assert_eq!(boxed.taint(), Taint::Plain);
    assert_eq!(boxed.latent(), &[FragType::PLAIN_NUMBER]);

    let err = assign(empty_container(), zero()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
}

#[test]
fn test_compare() {
    let f = compare(empty_container(), empty_container()).unwrap();
    assert_eq!(f.peek(), "[]==[]");
    assert_eq!(f.ty(), FragType::PLAIN_LOGIC);
    assert_eq!(eval(&f), Value::from(false));

    assert!(compare(zero(), empty_container()).is_err());
}

#[test]
fn test_masquerade_keeps_text_and_latent() {
    let boxed = container(Some(zero())).unwrap();
    let m = masquerade(boxed.clone(), FragType::ANY);
    assert_eq!(m.peek(), boxed.peek());
    assert_eq!(m.ty(), FragType::ANY);
    assert_eq!(m.latent(), boxed.latent());
    assert_eq!(m.lineage(), Lineage::Masquerade);
    assert_eq!(m.effective_lineage(), Lineage::Container);
}

#[test]
fn test_compound_operators_are_unimplemented() {
    let slot = index(empty_container(), empty_container()).unwrap();
    let err = add_assign(slot, zero()).unwrap_err();
    assert!(err.is(ViolationKind::Unimplemented));
    assert!(err.message.contains("+="));

    let err = strict_compare(empty_container(), empty_container()).unwrap_err();
    assert!(err.is(ViolationKind::Unimplemented));
    assert!(err.message.contains("==="));
}

#[test]
fn test_operands_are_not_modified() {
    let a = zero();
    let b = container(Some(a.clone())).unwrap();
    let before = (a.peek(), a.ty(), b.peek(), b.ty());
    let _ = join(a.clone(), b.clone()).unwrap();
    let _ = join(b.clone(), a.clone());
    assert_eq!(before, (a.peek(), a.ty(), b.peek(), b.ty()));
}
