//! Runtime values of the modeled environment and its implicit coercions.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// A value produced by evaluating fragment text.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absence sentinel.
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(ArrayRef),
    Function(NativeFn),
}

/// Type tag of a value, as the environment's `Object.prototype.toString`
/// names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    Undefined,
    Boolean,
    Number,
    String,
    Array,
    Function,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Undefined => "Undefined",
            TypeTag::Boolean => "Boolean",
            TypeTag::Number => "Number",
            TypeTag::String => "String",
            TypeTag::Array => "Array",
            TypeTag::Function => "Function",
        }
    }

    pub fn is_primitive(self) -> bool {
        !matches!(self, TypeTag::Array | TypeTag::Function)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A shared, mutable array object.
#[derive(Clone, Debug, Default)]
pub struct ArrayRef(Rc<RefCell<ArrayObject>>);

/// Elements are stored sparsely: writing far past the end only moves
/// `length`, it never allocates the hole.
#[derive(Debug, Default)]
pub struct ArrayObject {
    pub elements: BTreeMap<usize, Value>,
    pub length: usize,
    /// Non-index own properties.
    pub props: BTreeMap<String, Value>,
}

impl ArrayRef {
    pub fn new(elements: Vec<Value>) -> Self {
        let length = elements.len();
        ArrayRef(Rc::new(RefCell::new(ArrayObject {
            elements: elements.into_iter().enumerate().collect(),
            length,
            props: BTreeMap::new(),
        })))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_index(&self, index: usize) -> Value {
        self.0
            .borrow()
            .elements
            .get(&index)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn set_index(&self, index: usize, value: Value) {
        let mut obj = self.0.borrow_mut();
        obj.elements.insert(index, value);
        if index >= obj.length {
            obj.length = index + 1;
        }
    }

    /// Truncate or extend; extension only adds holes.
    pub fn set_len(&self, len: usize) {
        let mut obj = self.0.borrow_mut();
        obj.elements.split_off(&len);
        obj.length = len;
    }

    pub fn get_prop(&self, key: &str) -> Option<Value> {
        self.0.borrow().props.get(key).cloned()
    }

    pub fn set_prop(&self, key: String, value: Value) {
        self.0.borrow_mut().props.insert(key, value);
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Length and present elements, released from the borrow.
    fn snapshot(&self) -> (usize, Vec<(usize, Value)>) {
        let obj = self.0.borrow();
        let present = obj
            .elements
            .iter()
            .map(|(i, v)| (*i, v.clone()))
            .collect();
        (obj.length, present)
    }
}

/// A built-in function object, identified by its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeFn(pub &'static str);

impl NativeFn {
    /// Source text the environment prints for a native function.
    pub fn source_text(self) -> String {
        format!("function {}() {{ [native code] }}", self.0)
    }
}

const OBJECT_METHODS: &[&str] = &[
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
];

const ARRAY_METHODS: &[&str] = &[
    "at",
    "concat",
    "copyWithin",
    "entries",
    "every",
    "fill",
    "filter",
    "find",
    "findIndex",
    "findLast",
    "findLastIndex",
    "flat",
    "flatMap",
    "forEach",
    "includes",
    "indexOf",
    "join",
    "keys",
    "lastIndexOf",
    "map",
    "pop",
    "push",
    "reduce",
    "reduceRight",
    "reverse",
    "shift",
    "slice",
    "some",
    "sort",
    "splice",
    "toLocaleString",
    "toReversed",
    "toSorted",
    "toSpliced",
    "toString",
    "unshift",
    "values",
    "with",
];

const STRING_METHODS: &[&str] = &[
    "anchor",
    "at",
    "big",
    "blink",
    "bold",
    "charAt",
    "charCodeAt",
    "codePointAt",
    "concat",
    "endsWith",
    "fixed",
    "fontcolor",
    "fontsize",
    "includes",
    "indexOf",
    "isWellFormed",
    "italics",
    "lastIndexOf",
    "link",
    "localeCompare",
    "match",
    "matchAll",
    "normalize",
    "padEnd",
    "padStart",
    "repeat",
    "replace",
    "replaceAll",
    "search",
    "slice",
    "small",
    "split",
    "startsWith",
    "strike",
    "sub",
    "substr",
    "substring",
    "sup",
    "toLocaleLowerCase",
    "toLocaleUpperCase",
    "toLowerCase",
    "toString",
    "toUpperCase",
    "toWellFormed",
    "trim",
    "trimEnd",
    "trimStart",
    "valueOf",
];

const NUMBER_METHODS: &[&str] = &[
    "toExponential",
    "toFixed",
    "toLocaleString",
    "toPrecision",
    "toString",
    "valueOf",
];

const BOOLEAN_METHODS: &[&str] = &["toString", "valueOf"];

const FUNCTION_METHODS: &[&str] = &["apply", "bind", "call", "toString"];

fn find_method(tables: &[&[&'static str]], key: &str) -> Option<NativeFn> {
    tables
        .iter()
        .flat_map(|t| t.iter())
        .find(|m| **m == key)
        .map(|m| NativeFn(*m))
}

/// Outcome of a property read on a value.
pub enum PropertyRead {
    Value(Value),
    /// Reading from the absence sentinel.
    NoObject,
}

/// Canonical array index: the decimal form of an integer below 2^32 - 1.
fn array_index(key: &str) -> Option<usize> {
    let n: u32 = key.parse().ok()?;
    if n == u32::MAX || n.to_string() != key {
        return None;
    }
    Some(n as usize)
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Undefined => TypeTag::Undefined,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Function(_) => TypeTag::Function,
        }
    }

    pub fn is_object(&self) -> bool {
        !self.type_tag().is_primitive()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// ToPrimitive. Arrays and functions have no primitive `valueOf`, so
    /// both hints land on their text form.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Function(_) => Value::String(self.to_js_string()),
            other => other.clone(),
        }
    }

    /// ToNumber.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) | Value::Function(_) => self.to_primitive().to_number(),
        }
    }

    /// ToString.
    pub fn to_js_string(&self) -> String {
        let mut seen = HashSet::new();
        self.to_js_string_guarded(&mut seen)
    }

    fn to_js_string_guarded(&self, seen: &mut HashSet<usize>) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
            Value::Function(f) => f.source_text(),
            Value::Array(arr) => {
                // cyclic joins render the inner reference as empty
                if !seen.insert(arr.id()) {
                    return String::new();
                }
                // element i follows i commas; holes and undefined are empty
                let (length, present) = arr.snapshot();
                let mut out = String::new();
                let mut commas = 0;
                for (i, v) in present {
                    while commas < i {
                        out.push(',');
                        commas += 1;
                    }
                    if !matches!(v, Value::Undefined) {
                        out.push_str(&v.to_js_string_guarded(seen));
                    }
                }
                while commas + 1 < length {
                    out.push(',');
                    commas += 1;
                }
                seen.remove(&arr.id());
                out
            }
        }
    }

    /// ToPropertyKey.
    pub fn to_property_key(&self) -> String {
        self.to_primitive().to_js_string()
    }

    /// `a + b`: concatenation if either primitive is text, addition otherwise.
    pub fn add(&self, other: &Value) -> Value {
        let lhs = self.to_primitive();
        let rhs = other.to_primitive();
        if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
            let mut s = lhs.to_js_string();
            s.push_str(&rhs.to_js_string());
            Value::String(s)
        } else {
            Value::Number(lhs.to_number() + rhs.to_number())
        }
    }

    /// `a == b` with the environment's loose coercions.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Number(a), Value::String(b)) => *a == string_to_number(b),
            (Value::String(a), Value::Number(b)) => string_to_number(a) == *b,
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_eq(other),
            (_, Value::Boolean(_)) => self.loose_eq(&Value::Number(other.to_number())),
            (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Function(_)) => {
                self.loose_eq(&other.to_primitive())
            }
            (Value::Array(_) | Value::Function(_), Value::Number(_) | Value::String(_)) => {
                self.to_primitive().loose_eq(other)
            }
            _ => false,
        }
    }

    /// Property read `self[key]`.
    pub fn get(&self, key: &str) -> PropertyRead {
        let value = match self {
            Value::Undefined => return PropertyRead::NoObject,
            Value::Array(arr) => {
                if let Some(i) = array_index(key) {
                    arr.get_index(i)
                } else if key == "length" {
                    Value::Number(arr.len() as f64)
                } else if let Some(v) = arr.get_prop(key) {
                    v
                } else if key == "constructor" {
                    Value::Function(NativeFn("Array"))
                } else {
                    method_or_undefined(&[ARRAY_METHODS, OBJECT_METHODS], key)
                }
            }
            Value::String(s) => {
                if let Some(i) = array_index(key) {
                    utf16_unit(s, i).map(Value::String).unwrap_or(Value::Undefined)
                } else if key == "length" {
                    Value::Number(s.encode_utf16().count() as f64)
                } else if key == "constructor" {
                    Value::Function(NativeFn("String"))
                } else {
                    method_or_undefined(&[STRING_METHODS, OBJECT_METHODS], key)
                }
            }
            Value::Number(_) => {
                if key == "constructor" {
                    Value::Function(NativeFn("Number"))
                } else {
                    method_or_undefined(&[NUMBER_METHODS, OBJECT_METHODS], key)
                }
            }
            Value::Boolean(_) => {
                if key == "constructor" {
                    Value::Function(NativeFn("Boolean"))
                } else {
                    method_or_undefined(&[BOOLEAN_METHODS, OBJECT_METHODS], key)
                }
            }
            Value::Function(f) => match key {
                "name" => Value::String(f.0.to_string()),
                "length" => Value::Number(0.0),
                "constructor" => Value::Function(NativeFn("Function")),
                _ => method_or_undefined(&[FUNCTION_METHODS, OBJECT_METHODS], key),
            },
        };
        PropertyRead::Value(value)
    }

    /// Property write `self[key] = value`. Returns `false` when the target
    /// is the absence sentinel. Writes to primitives and native functions
    /// are dropped silently, as in the environment's sloppy mode.
    pub fn set(&self, key: &str, value: Value) -> Result<bool, String> {
        match self {
            Value::Undefined => Ok(false),
            Value::Array(arr) => {
                if let Some(i) = array_index(key) {
                    arr.set_index(i, value);
                } else if key == "length" {
                    let n = value.to_number();
                    if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                        return Err("Invalid array length".to_string());
                    }
                    arr.set_len(n as usize);
                } else {
                    arr.set_prop(key.to_string(), value);
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

fn method_or_undefined(tables: &[&[&'static str]], key: &str) -> Value {
    find_method(tables, key)
        .map(Value::Function)
        .unwrap_or(Value::Undefined)
}

/// The code unit at UTF-16 position `index`, as a one-unit string.
fn utf16_unit(s: &str, index: usize) -> Option<String> {
    let unit = s.encode_utf16().nth(index)?;
    Some(String::from_utf16_lossy(&[unit]))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_js_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// StringToNumber: decimal, signed infinity, and 0x/0o/0b literals.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim_matches(is_js_whitespace);
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let bytes = t.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'0' {
        let radix = match bytes[1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return parse_radix(&t[2..], radix);
        }
    }
    if !is_decimal_literal(bytes) {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    let mut acc = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => acc = acc * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    acc
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(b: &[u8]) -> bool {
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}

/// Number::toString(10): shortest round-trip digits, laid out the way the
/// environment prints them.
pub fn number_to_string(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if x < 0.0 {
        return format!("-{}", number_to_string(-x));
    }

    let sci = format!("{:e}", x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exp + 1;

    if k <= n && n <= 21 {
        let mut s = digits;
        s.extend(std::iter::repeat('0').take((n - k) as usize));
        s
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}
