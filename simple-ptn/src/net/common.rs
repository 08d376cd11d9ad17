use std::{
    fmt::{Debug, Display},
    hash::Hash,
    sync::Arc,
};

use num_traits::{CheckedAdd, CheckedSub, Unsigned};

use super::{PlaceSnapshot, Transition};

/// Identity of a place or transition.
///
/// Implemented for every type that is cloneable, hashable and can be shared between threads,
/// e.g. `String`, `&'static str`, integers or fieldless enums.
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<X> NodeId for X where X: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Amount of tokens on a place, also used for arc weights.
///
/// Only unsigned integers qualify, so neither a count nor a weight can be negative. Firing uses
/// checked arithmetic: a transition whose inputs hold too few tokens, or whose outputs would
/// overflow, is not ready.
///
/// ```compile_fail
/// use simple_ptn::net::PetriNet;
///
/// let net: PetriNet<String, i32> = PetriNet::new();
/// ```
pub trait TokenCount:
    Copy + Ord + Unsigned + CheckedAdd + CheckedSub + Debug + Send + Sync + 'static
{
}

impl<X> TokenCount for X where
    X: Copy + Ord + Unsigned + CheckedAdd + CheckedSub + Debug + Send + Sync + 'static
{
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Place,
    Transition,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Place => write!(f, "place"),
            NodeKind::Transition => write!(f, "transition"),
        }
    }
}

pub(crate) type Listener<I, T> = Arc<dyn Fn(&PlaceSnapshot<I, T>, T) + Send + Sync>;
pub(crate) type Predicate<I, T> = Arc<dyn Fn(&Transition<I, T>) -> bool + Send + Sync>;
