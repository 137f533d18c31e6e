//! Taint/kind lattice.
//!
//! Every fragment carries a taint (what addressing capability its text has)
//! and a kind (what value category the environment coerces it to). Either
//! axis may be `Unconstrained`, which matches anything on that axis.

use std::fmt;

use crate::diagnostic::Violation;

/// Addressing capability of a fragment's text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Taint {
    /// A composite value literal, directly indexable.
    Container,
    /// A member of a container; indexable, assignable, incrementable.
    Slot,
    /// A value with no addressing capability.
    Plain,
    Unconstrained,
}

/// Coerced value category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Container,
    Text,
    Number,
    Logic,
    Unconstrained,
}

impl Taint {
    /// Lattice match: equal, or either side unconstrained.
    pub fn matches(self, other: Taint) -> bool {
        self == other || self == Taint::Unconstrained || other == Taint::Unconstrained
    }

    pub fn is_addressable(self) -> bool {
        matches!(self, Taint::Container | Taint::Slot)
    }

    pub fn name(self) -> &'static str {
        match self {
            Taint::Container => "container",
            Taint::Slot => "slot",
            Taint::Plain => "plain",
            Taint::Unconstrained => "any",
        }
    }
}

impl Kind {
    /// Exact match, no lattice widening.
    pub fn is_exactly(self, other: Kind) -> bool {
        self == other
    }

    /// Lattice match: equal, or either side unconstrained.
    pub fn matches(self, other: Kind) -> bool {
        self == other || self == Kind::Unconstrained || other == Kind::Unconstrained
    }

    /// Kinds the `+` operator treats as numeric when both operands have one.
    pub fn is_number_like(self) -> bool {
        matches!(self, Kind::Number | Kind::Logic)
    }

    /// Kinds whose slot can be read as a number and written back.
    pub fn increments_as_number(self) -> bool {
        match self {
            Kind::Number | Kind::Logic | Kind::Container | Kind::Unconstrained => true,
            Kind::Text => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Container => "array",
            Kind::Text => "string",
            Kind::Number => "number",
            Kind::Logic => "boolean",
            Kind::Unconstrained => "any",
        }
    }
}

/// A taint/kind pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragType {
    pub taint: Taint,
    pub kind: Kind,
}

impl FragType {
    pub const ANY: FragType = FragType::new(Taint::Unconstrained, Kind::Unconstrained);
    pub const CONTAINER: FragType = FragType::new(Taint::Container, Kind::Container);
    pub const ANY_CONTAINER: FragType = FragType::new(Taint::Container, Kind::Unconstrained);
    pub const ANY_SLOT: FragType = FragType::new(Taint::Slot, Kind::Unconstrained);
    pub const PLAIN_TEXT: FragType = FragType::new(Taint::Plain, Kind::Text);
    pub const PLAIN_NUMBER: FragType = FragType::new(Taint::Plain, Kind::Number);
    pub const PLAIN_LOGIC: FragType = FragType::new(Taint::Plain, Kind::Logic);

    pub const fn new(taint: Taint, kind: Kind) -> Self {
        Self { taint, kind }
    }

    /// Combined lattice match on both axes.
    pub fn matches(self, other: FragType) -> bool {
        self.taint.matches(other.taint) && self.kind.matches(other.kind)
    }

    /// Fail with a type violation unless `self` matches `want`.
    pub fn expect(self, want: FragType, role: &str) -> Result<(), Violation> {
        if self.matches(want) {
            return Ok(());
        }
        Err(Violation::type_error(format!(
            "expected {} for {} but got {}",
            want, role, self
        )))
    }

    /// Fail with a type violation unless `self` matches one of `wants`.
    pub fn expect_any(self, wants: &[FragType], role: &str) -> Result<(), Violation> {
        if wants.iter().any(|w| self.matches(*w)) {
            return Ok(());
        }
        let listed: Vec<String> = wants.iter().map(|w| w.to_string()).collect();
        Err(Violation::type_error(format!(
            "expected {} for {} but got {}",
            listed.join("|"),
            role,
            self
        )))
    }
}

impl fmt::Display for FragType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.taint.name(), self.kind.name())
    }
}
