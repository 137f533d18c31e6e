use std::cell::Cell;

use super::*;
use crate::eval::ArrayRef;

/// Digits plus the letters of `false`, `true`, `undefined` and `NaN`.
fn seeded() -> Synthesizer {
    let mut s = Synthesizer::new();
    for d in 0..=9 {
        s.register(intrinsic::digit(d).unwrap()).unwrap();
    }
    for source in [
        intrinsic::false_(),
        intrinsic::true_(),
        intrinsic::undefined(),
        intrinsic::nan(),
    ] {
        s.register_letters(source, None).unwrap();
    }
    s
}

fn eval(s: &Synthesizer, f: &Fragment) -> Value {
    s.evaluate(f)
        .unwrap_or_else(|e| panic!("evaluating {}: {e}", f.peek()))
}

#[test]
fn test_digit_prefers_cache() {
    let mut s = Synthesizer::new();
    assert_eq!(s.digit(1).unwrap().peek(), "++[[]][+[]]");

    let one = intrinsic::digit(1).unwrap();
    s.register(one.clone()).unwrap();
    assert!(s.digit(1).unwrap().ptr_eq(&one));
}

#[test]
fn test_integers_coerce_to_themselves() {
    let s = seeded();
    for n in 0..=2000u64 {
        let f = s.integer(n).unwrap();
        assert_eq!(eval(&s, &f).to_number(), n as f64, "integer {n}");
    }
}

#[test]
fn test_large_integers() {
    let s = seeded();
    for n in [
        65_536u64,
        4_294_967_296,
        9_007_199_254_740_991,
        12_345_678_901_234_567_890,
    ] {
        let f = s.integer(n).unwrap();
        assert_eq!(eval(&s, &f).to_number(), n as f64, "integer {n}");
    }
}

#[test]
fn test_words_from_seeded_letters() {
    let mut s = seeded();
    for text in ["fun", "NaN", "true", "a1", "1e1000", "11e20", "42", "7", "defined"] {
        let f = s.word(text).unwrap();
        assert_eq!(f.kind(), Kind::Text, "word {text:?}");
        assert_eq!(eval(&s, &f), Value::from(text), "word {text:?}");
    }
}

#[test]
fn test_empty_word() {
    let mut s = Synthesizer::new();
    let f = s.word("").unwrap();
    assert_eq!(f.peek(), "[]+[]");
    assert_eq!(eval(&s, &f), Value::from(""));
}

#[test]
fn test_single_digit_word_is_cast() {
    let mut s = Synthesizer::new();
    let f = s.word("7").unwrap();
    assert_eq!(
        f.peek(),
        format!("{}+[]", intrinsic::digit(7).unwrap().peek())
    );
}

#[test]
fn test_unknown_letter_is_a_miss() {
    let mut s = seeded();
    let err = s.word("fox").unwrap_err();
    assert_eq!(err.kind, ViolationKind::CacheMiss);
    assert_eq!(err.message, "<String/'o'> not found");
}

#[test]
fn test_fallback_derives_and_registers() {
    let mut s = Synthesizer::new();
    s.register(intrinsic::cast_string(intrinsic::undefined()).unwrap())
        .unwrap();

    let d = s.word("d").unwrap();
    assert_eq!(eval(&s, &d), Value::from("d"));
    assert!(s.table().contains(&Value::from("d")));

    let again = s.word("d").unwrap();
    assert!(again.ptr_eq(&d));
}

#[test]
fn test_fallback_picks_shortest_source() {
    let mut s = Synthesizer::new();
    s.register(intrinsic::cast_string(intrinsic::false_()).unwrap())
        .unwrap();
    s.register(intrinsic::cast_string(intrinsic::undefined()).unwrap())
        .unwrap();

    let e = s.word("e").unwrap();
    let expected = op::index(
        intrinsic::group(intrinsic::cast_string(intrinsic::undefined()).unwrap()).unwrap(),
        intrinsic::digit(3).unwrap(),
    )
    .unwrap();
    assert_eq!(e.peek(), expected.peek());
    assert_eq!(eval(&s, &e), Value::from("e"));
}

#[test]
fn test_fallback_without_registration() {
    let mut s = Synthesizer::with_config(SynthConfig {
        register_derived: false,
        ..SynthConfig::default()
    });
    s.register(intrinsic::cast_string(intrinsic::undefined()).unwrap())
        .unwrap();
    let d = s.word("d").unwrap();
    assert_eq!(eval(&s, &d), Value::from("d"));
    assert!(!s.table().contains(&Value::from("d")));
}

#[test]
fn test_fallback_disabled() {
    let mut s = Synthesizer::with_config(SynthConfig {
        letter_fallback: false,
        ..SynthConfig::default()
    });
    s.register(intrinsic::cast_string(intrinsic::undefined()).unwrap())
        .unwrap();
    let err = s.word("d").unwrap_err();
    assert_eq!(err.kind, ViolationKind::CacheMiss);
}

#[test]
fn test_register_letters() {
    let mut s = Synthesizer::new();
    assert_eq!(s.register_letters(intrinsic::false_(), None).unwrap(), 5);
    for ch in ["f", "a", "l", "s", "e"] {
        assert!(s.table().contains(&Value::from(ch)), "letter {ch}");
    }
    let f = s.lookup(&Value::from("f")).unwrap();
    assert_eq!(f.ty(), FragType::new(Taint::Slot, Kind::Text));
}

#[test]
fn test_register_letters_until() {
    let mut s = Synthesizer::new();
    let count = s
        .register_letters(intrinsic::undefined(), Some('f'))
        .unwrap();
    assert_eq!(count, 5);
    assert!(s.table().contains(&Value::from("f")));
    assert!(!s.table().contains(&Value::from("i")));
}

#[test]
fn test_register_letters_missing_terminator() {
    let mut s = Synthesizer::new();
    let err = s
        .register_letters(intrinsic::nan(), Some('{'))
        .unwrap_err();
    assert_eq!(err.kind, ViolationKind::Type);
    assert!(s.table().is_empty());
}

#[test]
fn test_register_letters_of_number() {
    let mut s = Synthesizer::new();
    assert_eq!(s.register_letters(intrinsic::zero(), None).unwrap(), 1);
    let key = SymbolKey::of(&Value::from("0"));
    assert_eq!(s.table().candidates(&key).len(), 1);
}

#[test]
fn test_synthesize_constants() {
    let mut s = Synthesizer::new();
    assert_eq!(s.synthesize(&Value::from(true)).unwrap().compile(), "+[]==[]");
    assert_eq!(s.synthesize(&Value::from(false)).unwrap().compile(), "[]==[]");
    assert_eq!(s.synthesize(&Value::Undefined).unwrap().compile(), "[][[]]");
    assert_eq!(
        s.synthesize(&Value::from(f64::NAN)).unwrap().compile(),
        "+[][[]]"
    );
}

#[test]
fn test_synthesize_numbers() {
    let mut s = Synthesizer::new();
    let seven = s.synthesize(&Value::from(7.0)).unwrap();
    assert_eq!(seven.peek(), intrinsic::digit(7).unwrap().peek());

    for n in [10.0, 42.0, 1234.0] {
        let f = s.synthesize(&Value::from(n)).unwrap();
        assert_eq!(f.ty(), FragType::PLAIN_NUMBER);
        assert_eq!(eval(&s, &f), Value::from(n));
    }

    let err = s.synthesize(&Value::from(-1.0)).unwrap_err();
    assert_eq!(err.kind, ViolationKind::CacheMiss);
}

#[test]
fn test_negative_zero_shares_the_zero_entry() {
    let mut s = Synthesizer::new();
    let f = s.synthesize(&Value::from(-0.0)).unwrap();
    assert_eq!(f.peek(), "+[]");
    assert_eq!(SymbolKey::of(&Value::from(-0.0)), SymbolKey::of(&Value::from(0.0)));
    assert_eq!(eval(&s, &f), Value::from(0.0));
}

#[test]
fn test_synthesize_prefers_cache() {
    let mut s = seeded();
    let word = s.word("fun").unwrap();
    s.register(word.clone()).unwrap();
    let found = s.synthesize(&Value::from("fun")).unwrap();
    assert!(found.ptr_eq(&word));

    let text = s.synthesize(&Value::from("tan")).unwrap();
    assert_eq!(eval(&s, &text), Value::from("tan"));
}

#[test]
fn test_synthesize_object_needs_registration() {
    let mut s = Synthesizer::new();
    let arr = Value::Array(ArrayRef::new(Vec::new()));
    let err = s.synthesize(&arr).unwrap_err();
    assert_eq!(err.kind, ViolationKind::CacheMiss);
    assert!(err.help.is_some());
}

struct Counting {
    inner: Interpreter,
    calls: Cell<usize>,
}

impl Evaluator for Counting {
    fn evaluate(&self, source: &str) -> Result<Value, Violation> {
        self.calls.set(self.calls.get() + 1);
        self.inner.evaluate(source)
    }
}

#[test]
fn test_injected_evaluator() {
    let counting = Counting {
        inner: Interpreter::new(),
        calls: Cell::new(0),
    };
    let mut s = Synthesizer::with_evaluator(counting, SynthConfig::default());
    s.register(intrinsic::zero()).unwrap();
    s.register_letters(intrinsic::false_(), None).unwrap();
    // one for the zero, one for the text, one per letter
    assert_eq!(s.evaluator().calls.get(), 7);
}
