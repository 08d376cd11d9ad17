use std::fmt::{Debug, Display};

use super::common::Listener;

/// State of a place right after a transition changed it, handed to change listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceSnapshot<I, T> {
    pub id: I,
    pub tokens: T,
}

/// A pending change notification for a single place.
///
/// Collected while the net is locked, delivered after the lock has been released.
pub(crate) struct PlaceChange<I, T> {
    pub(crate) listener: Option<Listener<I, T>>,
    pub(crate) snapshot: PlaceSnapshot<I, T>,
    pub(crate) previous: T,
}

impl<I, T: Copy> PlaceChange<I, T> {
    /// Call the listener of the place, if one was registered at the time of the firing.
    pub(crate) fn changed(&self) {
        if let Some(listener) = &self.listener {
            listener(&self.snapshot, self.previous);
        }
    }
}

/// All place changes caused by one firing of a transition.
pub(crate) struct FireEvent<I, T> {
    pub(crate) transition: I,
    pub(crate) changes: Vec<PlaceChange<I, T>>,
}

impl<I, T: Copy> FireEvent<I, T> {
    /// Deliver the notifications in the order the places were first touched.
    ///
    /// Must not be called while holding the net lock: listeners may call back into the net.
    pub(crate) fn notify(&self) {
        for change in &self.changes {
            change.changed();
        }
    }
}

impl<I: Debug, T: Debug> Display for FireEvent<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transition={:?}, changes=[", self.transition)?;
        for (idx, change) in self.changes.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{:?}: {:?} -> {:?}",
                change.snapshot.id, change.previous, change.snapshot.tokens
            )?;
        }
        write!(f, "]")
    }
}
