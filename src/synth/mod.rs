//! Value and word construction on top of the symbol cache.
//!
//! A [`Synthesizer`] owns its cache and an injected evaluator. Digits,
//! integers and words are assembled bottom-up from cached fragments, with
//! the intrinsic constructions as fallback where one exists.

#[cfg(test)]
mod tests;

use crate::config::SynthConfig;
use crate::diagnostic::{Violation, ViolationKind};
use crate::eval::{number_to_string, Evaluator, Interpreter, Value};
use crate::fragment::{Fragment, Lineage, PREFIX};
use crate::intrinsic;
use crate::op;
use crate::symbol::{SymbolKey, SymbolTable};
use crate::types::{FragType, Kind, Taint};

/// Largest integer the environment's numbers hold exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub struct Synthesizer<E: Evaluator = Interpreter> {
    table: SymbolTable,
    evaluator: E,
    config: SynthConfig,
}

impl Default for Synthesizer<Interpreter> {
    fn default() -> Self {
        Self::with_config(SynthConfig::default())
    }
}

impl Synthesizer<Interpreter> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A synthesizer over the built-in interpreter, configured by `config`.
    pub fn with_config(config: SynthConfig) -> Self {
        let evaluator = Interpreter::with_config(&config);
        Self::with_evaluator(evaluator, config)
    }
}

impl<E: Evaluator> Synthesizer<E> {
    pub fn with_evaluator(evaluator: E, config: SynthConfig) -> Self {
        Self {
            table: SymbolTable::new(),
            evaluator,
            config,
        }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn evaluate(&self, fragment: &Fragment) -> Result<Value, Violation> {
        fragment.evaluate(&self.evaluator)
    }

    /// Evaluate `fragment` and cache it under its value.
    pub fn register(&mut self, fragment: Fragment) -> Result<SymbolKey, Violation> {
        self.table.register(fragment, &self.evaluator)
    }

    /// Shortest cached fragment for `value`.
    pub fn lookup(&self, value: &Value) -> Result<Fragment, Violation> {
        self.table.lookup(value)
    }

    /// Cached fragment for digit `d`, or the intrinsic construction.
    pub fn digit(&self, d: u8) -> Result<Fragment, Violation> {
        match self.table.lookup(&Value::from(d as f64)) {
            Err(e) if e.is(ViolationKind::CacheMiss) => intrinsic::digit(d),
            found => found,
        }
    }

    /// A fragment coercing to `n`, assembled from cached digits.
    pub fn integer(&self, n: u64) -> Result<Fragment, Violation> {
        intrinsic::integer_with(n, |d| self.digit(d))
    }

    /// A text fragment that evaluates to `text`.
    ///
    /// Letters are joined left to right. The empty word is `[]+[]`.
    pub fn word(&mut self, text: &str) -> Result<Fragment, Violation> {
        let mut acc: Option<Fragment> = None;
        for ch in text.chars() {
            let letter = self.letter(ch)?;
            let next = match acc {
                None if fits_left(&letter) => letter,
                None => op::container(Some(letter))?,
                Some(prev) => {
                    let right = if fits_right(&prev, &letter) {
                        letter
                    } else {
                        op::container(Some(letter))?
                    };
                    let joined = op::join(prev, right)?;
                    tracing::trace!(%ch, len = joined.len(), "joined letter");
                    joined
                }
            };
            acc = Some(next);
        }

        match acc {
            None => op::join(intrinsic::array(), intrinsic::array()),
            Some(def) if def.kind() == Kind::Text => Ok(def),
            Some(def) => intrinsic::cast_string(def),
        }
    }

    /// Register every letter of `source`'s text form, up to and including
    /// the first `until`. Returns the number of letters registered.
    pub fn register_letters(
        &mut self,
        source: Fragment,
        until: Option<char>,
    ) -> Result<usize, Violation> {
        let word = intrinsic::cast_string(source)?;
        let value = self.evaluate(&word)?;
        let Some(text) = value.as_str() else {
            return Err(Violation::type_error(format!(
                "letters need a string, but {} evaluates to {}",
                word.peek(),
                value.type_tag()
            )));
        };

        let count = match until {
            None => text.encode_utf16().count(),
            Some(stop) => utf16_position(text, stop).map(|p| p + 1).ok_or_else(|| {
                Violation::type_error(format!("'{}' does not occur in '{}'", stop, text))
            })?,
        };

        let grouped = intrinsic::group(word)?;
        for i in 0..count {
            let position = self.integer(i as u64)?;
            let letter = op::index(grouped.clone(), position)?;
            self.register(letter)?;
        }
        Ok(count)
    }

    /// The shortest known fragment for `value`: cached if registered,
    /// otherwise constructed.
    pub fn synthesize(&mut self, value: &Value) -> Result<Fragment, Violation> {
        match self.table.lookup(value) {
            Err(e) if e.is(ViolationKind::CacheMiss) => {}
            found => return found,
        }

        match value {
            Value::Undefined => Ok(intrinsic::undefined()),
            Value::Boolean(true) => Ok(intrinsic::true_()),
            Value::Boolean(false) => Ok(intrinsic::false_()),
            Value::Number(n) if n.is_nan() => Ok(intrinsic::nan()),
            // -0 shares the key of 0 and comes out as `+[]`
            Value::Number(n) if (0.0..=9.0).contains(n) && n.fract() == 0.0 => {
                self.digit(*n as u8)
            }
            Value::Number(n) => {
                let text = if *n > 0.0 && *n <= MAX_SAFE_INTEGER && n.fract() == 0.0 {
                    self.integer(*n as u64)?
                } else {
                    self.word(&number_to_string(*n))?
                };
                op::cast_number(op::container(Some(text))?)
            }
            Value::String(s) => self.word(s),
            Value::Array(_) | Value::Function(_) => Err(Violation::cache_miss(SymbolKey::of(value))
                .with_help("register a fragment producing this object first".to_string())),
        }
    }

    fn letter(&mut self, ch: char) -> Result<Fragment, Violation> {
        if let Some(d) = ch.to_digit(10) {
            return self.digit(d as u8);
        }
        let value = Value::from(ch);
        match self.table.lookup(&value) {
            Err(e) if e.is(ViolationKind::CacheMiss) && self.config.letter_fallback => {
                let derived = self.derive_letter(ch).ok_or(e)?;
                tracing::debug!(%ch, len = derived.len(), "derived letter");
                if self.config.register_derived {
                    self.register(derived.clone())?;
                }
                Ok(derived)
            }
            found => found,
        }
    }

    /// Index into the cached text values containing `ch` and keep the
    /// shortest result.
    fn derive_letter(&self, ch: char) -> Option<Fragment> {
        let sources: Vec<(SymbolKey, usize)> = self
            .table
            .iter()
            .filter_map(|(key, _)| {
                let text = key.text()?;
                let pos = utf16_position(text, ch)?;
                Some((key.clone(), pos))
            })
            .collect();

        sources
            .into_iter()
            .filter_map(|(key, pos)| {
                let source = self.table.lookup_key(&key).ok()?;
                let text = intrinsic::cast_string(source).ok()?;
                let position = self.integer(pos as u64).ok()?;
                op::index(intrinsic::group(text).ok()?, position).ok()
            })
            .min_by_key(Fragment::len)
    }
}

/// Whether `f` can start a join.
fn fits_left(f: &Fragment) -> bool {
    f.ty()
        .expect_any(
            &[
                FragType::ANY_SLOT,
                FragType::ANY_CONTAINER,
                FragType::PLAIN_TEXT,
                FragType::PLAIN_NUMBER,
            ],
            "left operand of join",
        )
        .is_ok()
        && joinable_lineage(f)
}

/// Whether `f` can follow `acc` in a join without a wrapper.
fn fits_right(acc: &Fragment, f: &Fragment) -> bool {
    matches!(f.taint(), Taint::Container | Taint::Slot)
        && f.first_char() != Some(PREFIX)
        && joinable_lineage(f)
        && f.effective_lineage() != Lineage::Join
        && !(acc.kind().is_number_like() && f.kind().is_number_like())
}

fn joinable_lineage(f: &Fragment) -> bool {
    !matches!(f.effective_lineage(), Lineage::Assign | Lineage::Compare)
}

/// Position of `ch` in `text`, counted in UTF-16 code units. Characters
/// outside the basic plane have no single-unit position.
fn utf16_position(text: &str, ch: char) -> Option<usize> {
    if ch.len_utf16() != 1 {
        return None;
    }
    let mut pos = 0;
    for c in text.chars() {
        if c == ch {
            return Some(pos);
        }
        pos += c.len_utf16();
    }
    None
}
