use std::{
    borrow::Borrow,
    collections::HashSet,
    ops::Range,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use super::{
    change::{FireEvent, PlaceChange, PlaceSnapshot},
    common::{Listener, NodeId, NodeKind, Predicate, TokenCount},
    TransitionSketch,
};
use crate::error::{id_string, PetriError, Result};

// Serial numbers order lock acquisition when two nets are locked at once (merge).
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Shared part of a net: the lock and everything it guards.
///
/// Place and transition handles keep an `Arc` to the core they were created in together with a
/// stable index. Indices are never reused within one core.
pub(crate) struct NetCore<I, T> {
    pub(crate) serial: u64,
    pub(crate) name: String,
    pub(crate) state: RwLock<NetState<I, T>>,
}

pub(crate) struct PlaceData<I, T> {
    pub(crate) id: I,
    pub(crate) tokens: T,
    pub(crate) listener: Option<Listener<I, T>>,
    // transitions this place is an input of (cascade targets)
    pub(crate) input_of: Vec<usize>,
    // transitions this place is an output of
    pub(crate) output_of: Vec<usize>,
}

pub(crate) struct TransitionData<I, T> {
    pub(crate) id: I,
    pub(crate) inputs: Vec<(usize, T)>,
    pub(crate) outputs: Vec<(usize, T)>,
    pub(crate) predicate: Option<Predicate<I, T>>,
}

/// Places and transitions that were moved into another net by a merge.
struct Relocation<I, T> {
    places: Range<usize>,
    transitions: Range<usize>,
    target: Arc<NetCore<I, T>>,
    place_start: usize,
    transition_start: usize,
}

impl<I, T> Relocation<I, T> {
    fn range(&self, kind: NodeKind) -> &Range<usize> {
        match kind {
            NodeKind::Place => &self.places,
            NodeKind::Transition => &self.transitions,
        }
    }

    fn start(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Place => self.place_start,
            NodeKind::Transition => self.transition_start,
        }
    }
}

pub(crate) struct NetState<I, T> {
    places: Vec<PlaceData<I, T>>,
    transitions: Vec<TransitionData<I, T>>,
    // index of the first live place / transition, everything below has been relocated
    place_base: usize,
    transition_base: usize,
    relocations: Vec<Relocation<I, T>>,
}

impl<I, T> NetCore<I, T> {
    pub(crate) fn new(name: String) -> Self {
        NetCore {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            name,
            state: RwLock::new(NetState {
                places: Vec::new(),
                transitions: Vec::new(),
                place_base: 0,
                transition_base: 0,
                relocations: Vec::new(),
            }),
        }
    }

    /// Run `f` with a shared lock on the net that currently owns the node.
    ///
    /// Follows relocations left behind by merges, so handles created before a merge keep
    /// working. Only one lock is held at any time.
    pub(crate) fn read<R>(
        core: &Arc<Self>,
        kind: NodeKind,
        index: usize,
        f: impl FnOnce(&Arc<Self>, &NetState<I, T>, usize) -> R,
    ) -> R {
        let mut core = Arc::clone(core);
        let mut index = index;
        loop {
            let (target, target_index) = {
                let state = core.state.read();
                match state.relocated(kind, index) {
                    None => return f(&core, &*state, index),
                    Some(moved) => moved,
                }
            };
            core = target;
            index = target_index;
        }
    }

    /// Run `f` with an exclusive lock on the net that currently owns the node.
    pub(crate) fn write<R>(
        core: &Arc<Self>,
        kind: NodeKind,
        index: usize,
        f: impl FnOnce(&Arc<Self>, &mut NetState<I, T>, usize) -> R,
    ) -> R {
        let mut core = Arc::clone(core);
        let mut index = index;
        loop {
            let (target, target_index) = {
                let mut state = core.state.write();
                match state.relocated(kind, index) {
                    None => return f(&core, &mut *state, index),
                    Some(moved) => moved,
                }
            };
            core = target;
            index = target_index;
        }
    }
}

impl<I, T> NetState<I, T> {
    fn relocated(&self, kind: NodeKind, index: usize) -> Option<(Arc<NetCore<I, T>>, usize)> {
        let base = match kind {
            NodeKind::Place => self.place_base,
            NodeKind::Transition => self.transition_base,
        };
        if index >= base {
            return None;
        }
        // relocations are contiguous and cover 0..base
        let pos = self.relocations.partition_point(|r| r.range(kind).end <= index);
        let relocation = &self.relocations[pos];
        let offset = index - relocation.range(kind).start;
        Some((Arc::clone(&relocation.target), relocation.start(kind) + offset))
    }

    pub(crate) fn place(&self, index: usize) -> &PlaceData<I, T> {
        &self.places[index - self.place_base]
    }

    pub(crate) fn place_mut(&mut self, index: usize) -> &mut PlaceData<I, T> {
        &mut self.places[index - self.place_base]
    }

    pub(crate) fn transition(&self, index: usize) -> &TransitionData<I, T> {
        &self.transitions[index - self.transition_base]
    }

    pub(crate) fn transition_mut(&mut self, index: usize) -> &mut TransitionData<I, T> {
        &mut self.transitions[index - self.transition_base]
    }

    /// Indices of all live places in registration order.
    pub(crate) fn place_indices(&self) -> Range<usize> {
        self.place_base..self.place_base + self.places.len()
    }

    /// Indices of all live transitions in registration order.
    pub(crate) fn transition_indices(&self) -> Range<usize> {
        self.transition_base..self.transition_base + self.transitions.len()
    }

    pub(crate) fn find_place<Q>(&self, id: &Q) -> Option<usize>
    where
        I: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.places.iter().position(|pl| pl.id.borrow() == id).map(|pos| pos + self.place_base)
    }

    pub(crate) fn find_transition<Q>(&self, id: &Q) -> Option<usize>
    where
        I: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.transitions
            .iter()
            .position(|tr| tr.id.borrow() == id)
            .map(|pos| pos + self.transition_base)
    }
}

impl<I: NodeId, T: TokenCount> NetState<I, T> {
    pub(crate) fn insert_place(&mut self, id: I, tokens: T) -> Result<usize> {
        if self.find_place(&id).is_some() {
            return Err(PetriError::DuplicateIdentity(NodeKind::Place, id_string(&id)));
        }
        self.places.push(PlaceData {
            id,
            tokens,
            listener: None,
            input_of: Vec::new(),
            output_of: Vec::new(),
        });
        Ok(self.place_base + self.places.len() - 1)
    }

    /// Resolve the sketch against the places of this net and register the new transition.
    ///
    /// Nothing is modified if the id is taken or a place cannot be found.
    pub(crate) fn insert_transition(&mut self, sketch: &TransitionSketch<I, T>) -> Result<usize> {
        if self.find_transition(&sketch.id).is_some() {
            return Err(PetriError::DuplicateIdentity(NodeKind::Transition, id_string(&sketch.id)));
        }
        let inputs = self.resolve_arcs(&sketch.inputs)?;
        let outputs = self.resolve_arcs(&sketch.outputs)?;

        let tr_idx = self.transition_base + self.transitions.len();
        for &(pl_idx, _) in &inputs {
            let place = self.place_mut(pl_idx);
            if !place.input_of.contains(&tr_idx) {
                place.input_of.push(tr_idx);
            }
        }
        for &(pl_idx, _) in &outputs {
            let place = self.place_mut(pl_idx);
            if !place.output_of.contains(&tr_idx) {
                place.output_of.push(tr_idx);
            }
        }
        self.transitions.push(TransitionData {
            id: sketch.id.clone(),
            inputs,
            outputs,
            predicate: None,
        });
        Ok(tr_idx)
    }

    fn resolve_arcs(&self, arcs: &[(I, T)]) -> Result<Vec<(usize, T)>> {
        arcs.iter()
            .map(|(pl_id, weight)| {
                self.find_place(pl_id)
                    .map(|pl_idx| (pl_idx, *weight))
                    .ok_or_else(|| PetriError::UnknownIdentity(NodeKind::Place, id_string(pl_id)))
            })
            .collect()
    }

    /// Express a transition in terms of place ids again.
    pub(crate) fn sketch(&self, index: usize) -> TransitionSketch<I, T> {
        let tr = self.transition(index);
        TransitionSketch {
            id: tr.id.clone(),
            inputs: self.arc_ids(&tr.inputs),
            outputs: self.arc_ids(&tr.outputs),
        }
    }

    pub(crate) fn arc_ids(&self, arcs: &[(usize, T)]) -> Vec<(I, T)> {
        arcs.iter().map(|&(pl_idx, weight)| (self.place(pl_idx).id.clone(), weight)).collect()
    }

    pub(crate) fn is_ready(&self, index: usize) -> bool {
        self.plan(index).is_some()
    }

    /// Token counts of every place the transition touches, as `(index, (before, after))` in
    /// order of first appearance.
    ///
    /// Inputs are taken before outputs are added, so repeated input places are checked against
    /// their summed weight. None if an input holds too few tokens or an output would overflow.
    fn plan(&self, index: usize) -> Option<Vec<(usize, (T, T))>> {
        let tr = self.transition(index);
        let mut touched: Vec<(usize, (T, T))> =
            Vec::with_capacity(tr.inputs.len() + tr.outputs.len());
        for &(pl_idx, weight) in &tr.inputs {
            let counts = entry(&mut touched, pl_idx, self.place(pl_idx).tokens);
            counts.1 = counts.1.checked_sub(&weight)?;
        }
        for &(pl_idx, weight) in &tr.outputs {
            let counts = entry(&mut touched, pl_idx, self.place(pl_idx).tokens);
            counts.1 = counts.1.checked_add(&weight)?;
        }
        Some(touched)
    }

    /// Check readiness and move the tokens if the transition is ready.
    ///
    /// Returns the notifications to deliver once the lock is released, or None if the
    /// transition was not ready. All new counts are computed before any place is written, so a
    /// transition either moves all of its tokens or none. Every touched place is reported once,
    /// with the token count it had before this firing and the count after the whole firing.
    pub(crate) fn fire(&mut self, index: usize) -> Option<FireEvent<I, T>> {
        let touched = self.plan(index)?;
        let base = self.place_base;
        let changes = touched
            .into_iter()
            .map(|(pl_idx, (previous, tokens))| {
                let place = &mut self.places[pl_idx - base];
                place.tokens = tokens;
                PlaceChange {
                    listener: place.listener.clone(),
                    snapshot: PlaceSnapshot { id: place.id.clone(), tokens },
                    previous,
                }
            })
            .collect();
        Some(FireEvent { transition: self.transition(index).id.clone(), changes })
    }

    /// Check that `other` and the interconnections can be merged into this net.
    pub(crate) fn validate_merge(
        &self,
        other: &NetState<I, T>,
        interconnections: &[TransitionSketch<I, T>],
    ) -> Result<()> {
        for place in &other.places {
            if self.find_place(&place.id).is_some() {
                return Err(PetriError::DuplicateIdentity(NodeKind::Place, id_string(&place.id)));
            }
        }
        for tr in &other.transitions {
            if self.find_transition(&tr.id).is_some() {
                return Err(PetriError::DuplicateIdentity(NodeKind::Transition, id_string(&tr.id)));
            }
        }
        let mut new_ids = HashSet::new();
        for sketch in interconnections {
            if self.find_transition(&sketch.id).is_some()
                || other.find_transition(&sketch.id).is_some()
                || !new_ids.insert(&sketch.id)
            {
                return Err(PetriError::DuplicateIdentity(
                    NodeKind::Transition,
                    id_string(&sketch.id),
                ));
            }
            for pl_id in sketch.places() {
                if self.find_place(pl_id).is_none() && other.find_place(pl_id).is_none() {
                    return Err(PetriError::UnknownIdentity(NodeKind::Place, id_string(pl_id)));
                }
            }
        }
        Ok(())
    }

    /// Move all places and transitions of `other` into this net.
    ///
    /// `own_core` must be the core guarding `self`; `other` keeps a relocation entry pointing
    /// there so handles into `other` follow the moved nodes. Expects `validate_merge` to have
    /// succeeded. Returns the number of moved places and transitions.
    pub(crate) fn absorb(
        &mut self,
        other: &mut NetState<I, T>,
        own_core: &Arc<NetCore<I, T>>,
    ) -> Result<(usize, usize)> {
        let place_start = self.place_base + self.places.len();
        let transition_start = self.transition_base + self.transitions.len();
        let moved_places = other.places.len();
        let moved_transitions = other.transitions.len();

        let sketches: Vec<_> = other
            .transition_indices()
            .map(|tr_idx| (other.sketch(tr_idx), other.transition(tr_idx).predicate.clone()))
            .collect();
        other.transitions.clear();

        for mut place in other.places.drain(..) {
            place.input_of.clear();
            place.output_of.clear();
            self.places.push(place);
        }
        // same order as in `other`, so relocated transition indices stay valid
        for (sketch, predicate) in sketches {
            let tr_idx = self.insert_transition(&sketch)?;
            self.transition_mut(tr_idx).predicate = predicate;
        }

        other.relocations.push(Relocation {
            places: other.place_base..other.place_base + moved_places,
            transitions: other.transition_base..other.transition_base + moved_transitions,
            target: Arc::clone(own_core),
            place_start,
            transition_start,
        });
        other.place_base += moved_places;
        other.transition_base += moved_transitions;
        Ok((moved_places, moved_transitions))
    }
}

/// The `(before, after)` counts recorded for a place, added on first use.
fn entry<T: Copy>(touched: &mut Vec<(usize, (T, T))>, pl_idx: usize, tokens: T) -> &mut (T, T) {
    let pos = match touched.iter().position(|(idx, _)| *idx == pl_idx) {
        Some(pos) => pos,
        None => {
            touched.push((pl_idx, (tokens, tokens)));
            touched.len() - 1
        }
    };
    &mut touched[pos].1
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = NetState<&'static str, u32>;

    fn core() -> Arc<NetCore<&'static str, u32>> {
        Arc::new(NetCore::new("test".to_string()))
    }

    fn tokens(state: &State, id: &str) -> u32 {
        state.place(state.find_place(id).unwrap()).tokens
    }

    #[test]
    fn serials_increase() {
        let first = core();
        let second = core();
        assert!(first.serial < second.serial);
    }

    #[test]
    fn insert_transition_rejects_unknown_place_without_changes() {
        let core = core();
        let mut state = core.state.write();
        state.insert_place("a", 1).unwrap();
        let err = state
            .insert_transition(&TransitionSketch::new("t").input("a", 1).output("missing", 1))
            .unwrap_err();
        assert!(matches!(err, PetriError::UnknownIdentity(NodeKind::Place, _)));
        assert!(state.transitions.is_empty());
        assert!(state.place(0).input_of.is_empty());
    }

    #[test]
    fn duplicate_inputs_are_summed() {
        let core = core();
        let mut state = core.state.write();
        state.insert_place("a", 3).unwrap();
        state.insert_place("b", 0).unwrap();
        let sketch = TransitionSketch::new("t").input("a", 2).input("a", 2).output("b", 1);
        let tr = state.insert_transition(&sketch).unwrap();
        assert!(!state.is_ready(tr));
        assert!(state.fire(tr).is_none());
        assert_eq!(tokens(&state, "a"), 3);

        state.place_mut(0).tokens = 4;
        assert!(state.is_ready(tr));
        assert!(state.fire(tr).is_some());
        assert_eq!(tokens(&state, "a"), 0);
        assert_eq!(tokens(&state, "b"), 1);
        // one adjacency entry per place and transition
        assert_eq!(state.place(0).input_of, vec![tr]);
    }

    #[test]
    fn output_overflow_leaves_marking_unchanged() {
        let core = core();
        let mut state = core.state.write();
        state.insert_place("a", 1).unwrap();
        state.insert_place("b", u32::MAX).unwrap();
        let tr = state
            .insert_transition(&TransitionSketch::new("t").input("a", 1).output("b", 1))
            .unwrap();
        assert!(!state.is_ready(tr));
        assert!(state.fire(tr).is_none());
        assert_eq!(tokens(&state, "a"), 1);
        assert_eq!(tokens(&state, "b"), u32::MAX);

        // taking from the same place first makes room
        let sketch = TransitionSketch::new("cycle").input("b", 1).output("b", 1);
        let cycle = state.insert_transition(&sketch).unwrap();
        assert!(state.fire(cycle).is_some());
        assert_eq!(tokens(&state, "b"), u32::MAX);
    }

    #[test]
    fn huge_duplicate_inputs_do_not_overflow() {
        let core = core();
        let mut state = core.state.write();
        state.insert_place("a", u32::MAX).unwrap();
        let sketch = TransitionSketch::new("t").input("a", u32::MAX).input("a", 1);
        let tr = state.insert_transition(&sketch).unwrap();
        assert!(!state.is_ready(tr));
        assert!(state.fire(tr).is_none());
        assert_eq!(tokens(&state, "a"), u32::MAX);
    }

    #[test]
    fn fire_reports_each_place_once() {
        let core = core();
        let mut state = core.state.write();
        state.insert_place("loop", 2).unwrap();
        state.insert_place("out", 0).unwrap();
        let tr = state
            .insert_transition(
                &TransitionSketch::new("t").input("loop", 2).output("loop", 1).output("out", 3),
            )
            .unwrap();
        let evt = state.fire(tr).unwrap();
        let reported: Vec<_> =
            evt.changes.iter().map(|c| (c.snapshot.id, c.previous, c.snapshot.tokens)).collect();
        assert_eq!(reported, vec![("loop", 2, 1), ("out", 0, 3)]);
    }

    #[test]
    fn absorb_relocates_indices() {
        let ours = core();
        let theirs = core();
        let mut ours_state = ours.state.write();
        let mut theirs_state = theirs.state.write();
        ours_state.insert_place("a", 1).unwrap();
        theirs_state.insert_place("b", 2).unwrap();
        theirs_state.insert_place("c", 0).unwrap();
        theirs_state
            .insert_transition(&TransitionSketch::new("bc").input("b", 1).output("c", 1))
            .unwrap();

        ours_state.validate_merge(&theirs_state, &[]).unwrap();
        let moved = ours_state.absorb(&mut theirs_state, &ours).unwrap();
        assert_eq!(moved, (2, 1));
        assert_eq!(theirs_state.place_indices(), 2..2);
        assert_eq!(theirs_state.transition_indices(), 1..1);

        let (target, idx) = theirs_state.relocated(NodeKind::Place, 1).unwrap();
        assert!(Arc::ptr_eq(&target, &ours));
        assert_eq!(ours_state.place(idx).id, "c");
        let (_, tr_idx) = theirs_state.relocated(NodeKind::Transition, 0).unwrap();
        assert_eq!(ours_state.transition(tr_idx).id, "bc");
        assert_eq!(ours_state.place(ours_state.find_place("b").unwrap()).input_of, vec![tr_idx]);

        // new places in the emptied net get fresh indices
        let idx = theirs_state.insert_place("d", 0).unwrap();
        assert_eq!(idx, 2);
        assert!(theirs_state.relocated(NodeKind::Place, idx).is_none());
    }
}
