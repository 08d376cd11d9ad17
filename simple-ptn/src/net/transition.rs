use std::{collections::HashSet, fmt::Debug, sync::Arc};

use tracing::trace;

use super::{
    arena::{NetCore, NetState},
    common::{NodeId, NodeKind, Predicate, TokenCount},
    Place, TransitionSketch,
};
use crate::error::Result;

/// Handle to a transition of a [`PetriNet`](super::PetriNet).
///
/// Like [`Place`], handles are cheap to clone, may be shared between threads and survive
/// merging their net into another one.
pub struct Transition<I = String, T = u32> {
    core: Arc<NetCore<I, T>>,
    index: usize,
}

impl<I, T> Clone for Transition<I, T> {
    fn clone(&self) -> Self {
        Transition { core: Arc::clone(&self.core), index: self.index }
    }
}

impl<I: NodeId, T: TokenCount> Transition<I, T> {
    pub(crate) fn new(core: Arc<NetCore<I, T>>, index: usize) -> Self {
        Transition { core, index }
    }

    fn read<R>(&self, f: impl FnOnce(&Arc<NetCore<I, T>>, &NetState<I, T>, usize) -> R) -> R {
        NetCore::read(&self.core, NodeKind::Transition, self.index, f)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&Arc<NetCore<I, T>>, &mut NetState<I, T>, usize) -> R,
    ) -> R {
        NetCore::write(&self.core, NodeKind::Transition, self.index, f)
    }

    pub fn id(&self) -> I {
        self.read(|_, state, idx| state.transition(idx).id.clone())
    }

    /// Input arcs as (place id, weight) in declaration order.
    pub fn inputs(&self) -> Vec<(I, T)> {
        self.read(|_, state, idx| state.arc_ids(&state.transition(idx).inputs))
    }

    /// Output arcs as (place id, weight) in declaration order.
    pub fn outputs(&self) -> Vec<(I, T)> {
        self.read(|_, state, idx| state.arc_ids(&state.transition(idx).outputs))
    }

    pub fn sketch(&self) -> TransitionSketch<I, T> {
        self.read(|_, state, idx| state.sketch(idx))
    }

    /// True if every input place holds enough tokens to fire and no output place would
    /// overflow.
    pub fn ready(&self) -> bool {
        self.read(|_, state, idx| state.is_ready(idx))
    }

    /// Fire if ready.
    ///
    /// Readiness is checked again under the exclusive net lock, so concurrent callers can never
    /// take the same tokens twice. Change listeners of all touched places run after the lock
    /// has been released. Returns false if the transition was not ready.
    pub fn fire(&self) -> bool {
        let evt = self.write(|core, state, idx| {
            let evt = state.fire(idx);
            if let Some(evt) = &evt {
                trace!(net = %core.name, "Fired {}.", evt);
            }
            evt
        });
        match evt {
            Some(evt) => {
                evt.notify();
                true
            }
            None => false,
        }
    }

    /// Set the auto-fire predicate evaluated by [`tick`](Self::tick), replacing any previous
    /// one.
    ///
    /// The predicate runs without holding the net lock. If it reads state shared with other
    /// threads, that state needs its own synchronization.
    pub fn auto_fire(&self, predicate: impl Fn(&Transition<I, T>) -> bool + Send + Sync + 'static) {
        let predicate: Predicate<I, T> = Arc::new(predicate);
        self.write(|_, state, idx| state.transition_mut(idx).predicate = Some(predicate));
    }

    /// Fire on every tick (if ready).
    pub fn auto_fire_always(&self) {
        self.auto_fire(|_| true);
    }

    pub fn disable_auto_fire(&self) {
        self.write(|_, state, idx| state.transition_mut(idx).predicate = None);
    }

    pub fn has_auto_fire(&self) -> bool {
        self.read(|_, state, idx| state.transition(idx).predicate.is_some())
    }

    /// Fire if an auto-fire predicate is set and returns true.
    pub fn tick(&self) -> bool {
        let predicate = self.read(|_, state, idx| state.transition(idx).predicate.clone());
        match predicate {
            Some(predicate) if predicate(self) => self.fire(),
            _ => false,
        }
    }

    /// Fire (ignoring the auto-fire predicate) and, if that worked, deep tick every output
    /// place.
    pub fn deep_tick(&self) -> Result<bool> {
        let mut path = HashSet::new();
        self.deep_tick_on_path(&mut path)
    }

    /// Fire and cascade into the output places, each starting a fresh path.
    pub fn deep_fire(&self) -> Result<bool> {
        if !self.fire() {
            return Ok(false);
        }
        for place in self.output_places() {
            place.deep_tick()?;
        }
        Ok(true)
    }

    pub(crate) fn deep_tick_on_path(&self, path: &mut HashSet<I>) -> Result<bool> {
        if !self.fire() {
            return Ok(false);
        }
        for place in self.output_places() {
            place.deep_tick_on_path(path)?;
        }
        Ok(true)
    }

    // distinct output places in declaration order
    fn output_places(&self) -> Vec<Place<I, T>> {
        self.read(|core, state, idx| {
            let mut indices: Vec<usize> = Vec::new();
            for &(pl_idx, _) in &state.transition(idx).outputs {
                if !indices.contains(&pl_idx) {
                    indices.push(pl_idx);
                }
            }
            indices.into_iter().map(|pl_idx| Place::new(Arc::clone(core), pl_idx)).collect()
        })
    }
}

impl<I: NodeId, T: TokenCount> Debug for Transition<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (id, ready) =
            self.read(|_, state, idx| (state.transition(idx).id.clone(), state.is_ready(idx)));
        f.debug_struct("Transition").field("id", &id).field("ready", &ready).finish()
    }
}
