use std::{collections::HashSet, fmt::Debug, sync::Arc};

use tracing::{trace, warn};

use super::{
    arena::{NetCore, NetState},
    common::{Listener, NodeId, NodeKind, TokenCount},
    PlaceSnapshot, Transition,
};
use crate::error::{id_string, PetriError, Result};

/// Handle to a place of a [`PetriNet`](super::PetriNet).
///
/// Handles are cheap to clone and may be shared between threads. A handle keeps referring to
/// the same place after its net has been merged into another one.
pub struct Place<I = String, T = u32> {
    core: Arc<NetCore<I, T>>,
    index: usize,
}

impl<I, T> Clone for Place<I, T> {
    fn clone(&self) -> Self {
        Place { core: Arc::clone(&self.core), index: self.index }
    }
}

impl<I: NodeId, T: TokenCount> Place<I, T> {
    pub(crate) fn new(core: Arc<NetCore<I, T>>, index: usize) -> Self {
        Place { core, index }
    }

    fn read<R>(&self, f: impl FnOnce(&Arc<NetCore<I, T>>, &NetState<I, T>, usize) -> R) -> R {
        NetCore::read(&self.core, NodeKind::Place, self.index, f)
    }

    pub fn id(&self) -> I {
        self.read(|_, state, idx| state.place(idx).id.clone())
    }

    /// Current amount of tokens.
    ///
    /// Read under the shared net lock, but the value may be outdated as soon as it is returned
    /// if other threads fire transitions concurrently.
    pub fn tokens(&self) -> T {
        self.read(|_, state, idx| state.place(idx).tokens)
    }

    pub fn snapshot(&self) -> PlaceSnapshot<I, T> {
        self.read(|_, state, idx| {
            let place = state.place(idx);
            PlaceSnapshot { id: place.id.clone(), tokens: place.tokens }
        })
    }

    /// Set the change listener, replacing any previous one.
    ///
    /// The listener receives the state of the place after a firing and the token count before
    /// it. It runs after the net lock has been released and may call back into the net.
    pub fn on_change(&self, listener: impl Fn(&PlaceSnapshot<I, T>, T) + Send + Sync + 'static) {
        let listener: Listener<I, T> = Arc::new(listener);
        NetCore::write(&self.core, NodeKind::Place, self.index, |_, state, idx| {
            state.place_mut(idx).listener = Some(listener);
        });
    }

    pub fn clear_on_change(&self) {
        NetCore::write(&self.core, NodeKind::Place, self.index, |_, state, idx| {
            state.place_mut(idx).listener = None;
        });
    }

    pub fn has_on_change(&self) -> bool {
        self.read(|_, state, idx| state.place(idx).listener.is_some())
    }

    /// Transitions taking tokens from this place.
    pub fn consumers(&self) -> Vec<Transition<I, T>> {
        self.read(|core, state, idx| transitions(core, &state.place(idx).input_of))
    }

    /// Transitions putting tokens onto this place.
    pub fn producers(&self) -> Vec<Transition<I, T>> {
        self.read(|core, state, idx| transitions(core, &state.place(idx).output_of))
    }

    /// Fire every consumer of this place and cascade along the output places of each
    /// transition that fired.
    ///
    /// Fails with [`PetriError::CycleDetected`] if a cascade reaches a place that is already on
    /// its own path. Tokens moved before the cycle was detected stay where they are.
    pub fn deep_tick(&self) -> Result<()> {
        let mut path = HashSet::new();
        self.deep_tick_on_path(&mut path)
    }

    /// `path` holds the places of the current cascade branch only, so a place reachable on
    /// two separate branches (diamond) is no cycle.
    pub(crate) fn deep_tick_on_path(&self, path: &mut HashSet<I>) -> Result<()> {
        let (id, consumers) = self.read(|core, state, idx| {
            let place = state.place(idx);
            (place.id.clone(), transitions(core, &place.input_of))
        });
        if path.contains(&id) {
            warn!(net = %self.core.name, place = ?id, "Cycle detected during deep tick.");
            return Err(PetriError::CycleDetected(id_string(&id)));
        }
        trace!(place = ?id, depth = path.len(), "Deep tick reached place.");
        path.insert(id.clone());
        let result = consumers.iter().try_for_each(|tr| tr.deep_tick_on_path(path).map(|_| ()));
        path.remove(&id);
        result
    }
}

fn transitions<I: NodeId, T: TokenCount>(
    core: &Arc<NetCore<I, T>>,
    indices: &[usize],
) -> Vec<Transition<I, T>> {
    indices.iter().map(|&tr| Transition::new(Arc::clone(core), tr)).collect()
}

impl<I: NodeId, T: TokenCount> Debug for Place<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Place").field("id", &snapshot.id).field("tokens", &snapshot.tokens).finish()
    }
}
