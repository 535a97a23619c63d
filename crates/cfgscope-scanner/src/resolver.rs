//! Collision resolution
//!
//! The single place that decides which scope wins when a name is defined
//! in several scopes. Pure and deterministic: no state and no I/O.

use crate::collision::CollisionOccurrence;
use crate::error::{ScanError, ScanResult};
use crate::record::ToolRecord;
use crate::types::Scope;
use std::cmp::{Ordering, Reverse};

/// Total order over scopes, greatest wins
///
/// Managed > Local > Project > User > Plugin. Two plugin scopes compare by
/// plugin id, the lexicographically smaller id winning.
#[must_use]
pub fn compare_scopes(a: &Scope, b: &Scope) -> Ordering {
    a.precedence()
        .cmp(&b.precedence())
        .then_with(|| match (a, b) {
            (Scope::Plugin(x), Scope::Plugin(y)) => Reverse(x).cmp(&Reverse(y)),
            _ => Ordering::Equal,
        })
}

/// Pick the winning scope among a collision's occurrences
///
/// Fails only for an empty occurrence list, which a well-formed collision
/// never has.
pub fn resolve_winner(occurrences: &[CollisionOccurrence]) -> ScanResult<Scope> {
    occurrences
        .iter()
        .map(|o| &o.scope)
        .max_by(|a, b| compare_scopes(a, b))
        .cloned()
        .ok_or_else(|| ScanError::CollisionAmbiguous("no occurrences".into()))
}

/// The effective definition among records that share a name
#[must_use]
pub fn effective_record<'a, I>(candidates: I) -> Option<&'a ToolRecord>
where
    I: IntoIterator<Item = &'a ToolRecord>,
{
    candidates
        .into_iter()
        .max_by(|a, b| compare_scopes(&a.scope, &b.scope).then_with(|| b.path.cmp(&a.path)))
}
