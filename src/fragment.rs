//! Immutable typed units of generated text.

use std::fmt;
use std::rc::Rc;

use crate::diagnostic::Violation;
use crate::eval::{Evaluator, Value};
use crate::types::{FragType, Kind, Taint};

/// The operator that constructed a fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lineage {
    /// The implicit "no elements" inner of an empty container.
    Empty,
    Container,
    Index,
    CastNumber,
    Increment,
    Join,
    Assign,
    Compare,
    Masquerade,
    BestOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Final, reusable text.
    Compile,
    /// Inspectable text, used for length comparison and evaluation.
    Peek,
}

/// First character of increment and numeric-cast text.
pub const PREFIX: char = '+';

#[derive(Debug)]
pub(crate) enum Repr {
    Empty,
    Container(Fragment),
    Index(Fragment, Fragment),
    CastNumber(Fragment),
    Increment(Fragment),
    Join(Fragment, Fragment),
    Assign(Fragment, Fragment),
    Compare(Fragment, Fragment),
    Masquerade(Fragment),
    BestOf { chosen: Fragment, candidates: usize },
}

struct Node {
    ty: FragType,
    latent: Vec<FragType>,
    repr: Repr,
    len: usize,
}

/// A node in the fragment DAG.
///
/// Cloning is cheap and shares the node. The taint, kind, latent element
/// types and peek length are fixed when the node is built.
#[derive(Clone)]
pub struct Fragment(Rc<Node>);

impl Fragment {
    pub(crate) fn new(ty: FragType, latent: Vec<FragType>, repr: Repr) -> Self {
        let len = match &repr {
            Repr::Empty => 0,
            Repr::Container(inner) => inner.len() + 2,
            Repr::Index(target, key) => target.len() + key.len() + 2,
            Repr::CastNumber(x) => x.len() + 1,
            Repr::Increment(x) => x.len() + 2,
            Repr::Join(a, b) | Repr::Assign(a, b) => a.len() + b.len() + 1,
            Repr::Compare(a, b) => a.len() + b.len() + 2,
            Repr::Masquerade(x) => x.len(),
            Repr::BestOf { chosen, .. } => chosen.len(),
        };
        Fragment(Rc::new(Node {
            ty,
            latent,
            repr,
            len,
        }))
    }

    /// The "no elements" placeholder wrapped by an empty container.
    pub fn empty() -> Self {
        Fragment::new(FragType::ANY, Vec::new(), Repr::Empty)
    }

    pub fn ty(&self) -> FragType {
        self.0.ty
    }

    pub fn taint(&self) -> Taint {
        self.0.ty.taint
    }

    pub fn kind(&self) -> Kind {
        self.0.ty.kind
    }

    /// Types of the values this fragment holds, outermost element first.
    pub fn latent(&self) -> &[FragType] {
        &self.0.latent
    }

    /// Length of the peek rendering.
    pub fn len(&self) -> usize {
        self.0.len
    }

    pub fn is_empty(&self) -> bool {
        self.0.len == 0
    }

    pub fn lineage(&self) -> Lineage {
        match &self.0.repr {
            Repr::Empty => Lineage::Empty,
            Repr::Container(_) => Lineage::Container,
            Repr::Index(..) => Lineage::Index,
            Repr::CastNumber(_) => Lineage::CastNumber,
            Repr::Increment(_) => Lineage::Increment,
            Repr::Join(..) => Lineage::Join,
            Repr::Assign(..) => Lineage::Assign,
            Repr::Compare(..) => Lineage::Compare,
            Repr::Masquerade(_) => Lineage::Masquerade,
            Repr::BestOf { .. } => Lineage::BestOf,
        }
    }

    /// Lineage of the operator whose text actually renders, looking
    /// through masquerades and best-of selections.
    pub fn effective_lineage(&self) -> Lineage {
        match &self.0.repr {
            Repr::Masquerade(inner) => inner.effective_lineage(),
            Repr::BestOf { chosen, .. } => chosen.effective_lineage(),
            _ => self.lineage(),
        }
    }

    /// First character of the peek rendering.
    pub fn first_char(&self) -> Option<char> {
        match &self.0.repr {
            Repr::Empty => None,
            Repr::Container(_) => Some('['),
            Repr::Index(target, _) => target.first_char(),
            Repr::CastNumber(_) | Repr::Increment(_) => Some(PREFIX),
            Repr::Join(a, _) | Repr::Assign(a, _) | Repr::Compare(a, _) => a.first_char(),
            Repr::Masquerade(x) => x.first_char(),
            Repr::BestOf { chosen, .. } => chosen.first_char(),
        }
    }

    pub fn render(&self, mode: RenderMode) -> String {
        let mut out = String::with_capacity(self.len());
        self.write(&mut out, mode);
        out
    }

    pub fn compile(&self) -> String {
        self.render(RenderMode::Compile)
    }

    pub fn peek(&self) -> String {
        self.render(RenderMode::Peek)
    }

    fn write(&self, out: &mut String, mode: RenderMode) {
        match &self.0.repr {
            Repr::Empty => {}
            Repr::Container(inner) => {
                out.push('[');
                inner.write(out, mode);
                out.push(']');
            }
            Repr::Index(target, key) => {
                target.write(out, mode);
                out.push('[');
                key.write(out, mode);
                out.push(']');
            }
            Repr::CastNumber(x) => {
                out.push(PREFIX);
                x.write(out, mode);
            }
            Repr::Increment(x) => {
                out.push(PREFIX);
                out.push(PREFIX);
                x.write(out, mode);
            }
            Repr::Join(a, b) => {
                a.write(out, mode);
                out.push('+');
                b.write(out, mode);
            }
            Repr::Assign(a, b) => {
                a.write(out, mode);
                out.push('=');
                b.write(out, mode);
            }
            Repr::Compare(a, b) => {
                a.write(out, mode);
                out.push_str("==");
                b.write(out, mode);
            }
            Repr::Masquerade(x) => x.write(out, mode),
            Repr::BestOf { chosen, .. } => chosen.write(out, mode),
        }
    }

    /// Run the peek text through `evaluator`.
    pub fn evaluate(&self, evaluator: &dyn Evaluator) -> Result<Value, Violation> {
        evaluator.evaluate(&self.peek())
    }

    /// Number of candidates a best-of selection chose among; 1 otherwise.
    pub fn alternatives(&self) -> usize {
        match &self.0.repr {
            Repr::BestOf { candidates, .. } => *candidates,
            _ => 1,
        }
    }

    /// Whether two handles share the same node.
    pub fn ptr_eq(&self, other: &Fragment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("ty", &format_args!("{}", self.ty()))
            .field("lineage", &self.lineage())
            .field("text", &self.peek())
            .finish()
    }
}
