//! Best-of-N selection among equivalent fragments.

use crate::diagnostic::Violation;
use crate::fragment::{Fragment, Repr};

/// Pick the shortest of `candidates`.
///
/// The result renders as the chosen candidate and carries its type and
/// latent element types, so later operators check against the text that
/// is actually emitted. Ties go to the earliest candidate. The choice is
/// made once, here.
pub fn best_of<I>(candidates: I) -> Result<Fragment, Violation>
where
    I: IntoIterator<Item = Fragment>,
{
    let mut iter = candidates.into_iter();
    let Some(first) = iter.next() else {
        return Err(Violation::type_error(
            "best-of selection needs at least one candidate".to_string(),
        ));
    };

    let mut chosen = first.clone();
    let mut count = 1;
    for candidate in iter {
        count += 1;
        if candidate.len() < chosen.len() {
            chosen = candidate;
        }
    }

    if count == 1 {
        return Ok(first);
    }
    let latent = chosen.latent().to_vec();
    Ok(Fragment::new(
        chosen.ty(),
        latent,
        Repr::BestOf {
            chosen,
            candidates: count,
        },
    ))
}
