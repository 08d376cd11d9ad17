use std::{borrow::Borrow, fmt::Debug, sync::Arc};

use tracing::debug;

use super::{
    arena::NetCore,
    common::{NodeId, NodeKind, TokenCount},
    PetriNetConfig, Place, Transition, TransitionSketch,
};
use crate::error::{id_string, PetriError, Result};

/// A place/transition net guarded by a single reader/writer lock.
///
/// All methods take `&self`, so a net can be shared between threads (e.g. through an `Arc` or
/// a scoped thread). Places and transitions are only ever created through the net and are
/// returned as handles.
pub struct PetriNet<I = String, T = u32> {
    config: PetriNetConfig,
    core: Arc<NetCore<I, T>>,
}

impl<I: NodeId, T: TokenCount> Default for PetriNet<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: NodeId, T: TokenCount> PetriNet<I, T> {
    pub fn new() -> Self {
        Self::with_config(PetriNetConfig::default())
    }

    pub fn with_config(config: PetriNetConfig) -> Self {
        let core = Arc::new(NetCore::new(config.name.clone()));
        PetriNet { config, core }
    }

    pub fn config(&self) -> &PetriNetConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Add a place holding `tokens` initially.
    pub fn add_place(&self, id: impl Into<I>, tokens: T) -> Result<Place<I, T>> {
        let id = id.into();
        let index = self.core.state.write().insert_place(id.clone(), tokens)?;
        debug!(net = %self.core.name, place = ?id, ?tokens, "Added place.");
        Ok(Place::new(Arc::clone(&self.core), index))
    }

    /// Add a transition, resolving the place ids of the sketch against this net.
    ///
    /// Fails without modifying the net if the transition id is already taken or one of the
    /// places does not exist.
    pub fn add_transition(&self, sketch: TransitionSketch<I, T>) -> Result<Transition<I, T>> {
        let index = self.core.state.write().insert_transition(&sketch)?;
        debug!(
            net = %self.core.name,
            transition = ?sketch.id,
            inputs = sketch.inputs.len(),
            outputs = sketch.outputs.len(),
            "Added transition."
        );
        Ok(Transition::new(Arc::clone(&self.core), index))
    }

    pub fn find_place<Q>(&self, id: &Q) -> Option<Place<I, T>>
    where
        I: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.core.state.read().find_place(id)?;
        Some(Place::new(Arc::clone(&self.core), index))
    }

    pub fn find_transition<Q>(&self, id: &Q) -> Option<Transition<I, T>>
    where
        I: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let index = self.core.state.read().find_transition(id)?;
        Some(Transition::new(Arc::clone(&self.core), index))
    }

    /// All places in the order they were added.
    pub fn places(&self) -> Vec<Place<I, T>> {
        let state = self.core.state.read();
        state.place_indices().map(|idx| Place::new(Arc::clone(&self.core), idx)).collect()
    }

    /// All transitions in the order they were added.
    pub fn transitions(&self) -> Vec<Transition<I, T>> {
        let state = self.core.state.read();
        state
            .transition_indices()
            .map(|idx| Transition::new(Arc::clone(&self.core), idx))
            .collect()
    }

    pub fn place_count(&self) -> usize {
        self.core.state.read().place_indices().len()
    }

    pub fn transition_count(&self) -> usize {
        self.core.state.read().transition_indices().len()
    }

    /// Token count of every place in the order they were added, read as one consistent state.
    pub fn marking(&self) -> Vec<(I, T)> {
        let state = self.core.state.read();
        state
            .place_indices()
            .map(|idx| {
                let place = state.place(idx);
                (place.id.clone(), place.tokens)
            })
            .collect()
    }

    /// Tick every transition once, in the order they were added.
    ///
    /// Transitions fired by an earlier tick in the same pass may enable later ones, but nothing
    /// is retried or cascaded. Returns the number of transitions that fired.
    pub fn tick(&self) -> usize {
        let fired = self.transitions().iter().filter(|tr| tr.tick()).count();
        debug!(net = %self.core.name, fired, "Ticked net.");
        fired
    }

    /// Deep tick the place with the given id, see [`Place::deep_tick`].
    #[tracing::instrument(level = "debug", skip_all, fields(net = %self.core.name, place = ?id))]
    pub fn deep_tick<Q>(&self, id: &Q) -> Result<()>
    where
        I: Borrow<Q>,
        Q: Eq + Debug + ?Sized,
    {
        let place = self
            .find_place(id)
            .ok_or_else(|| PetriError::UnknownIdentity(NodeKind::Place, id_string(id)))?;
        place.deep_tick()
    }

    /// Deep tick every place once, in the order they were added.
    ///
    /// Cascades of different places are not deduplicated: a transition fired during an earlier
    /// cascade is visited again by later ones (and simply fires again if it is still ready).
    /// Stops at the first error.
    #[tracing::instrument(level = "debug", skip_all, fields(net = %self.core.name))]
    pub fn deep_tick_cover(&self) -> Result<()> {
        for place in self.places() {
            place.deep_tick()?;
        }
        Ok(())
    }

    /// Move all places and transitions of `other` into this net and connect both parts with
    /// the `interconnections`.
    ///
    /// Everything is validated before anything is changed: place or transition ids present in
    /// both nets, interconnection ids colliding with any transition, and interconnection arcs
    /// to places found in neither net are rejected, leaving both nets untouched.
    ///
    /// Afterwards `other` is empty but can still be used. Listeners and auto-fire predicates
    /// move along with their nodes, and handles obtained from `other` now refer to the nodes in
    /// this net.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(net = %self.core.name, other = %other.core.name)
    )]
    pub fn merge(
        &self,
        other: &PetriNet<I, T>,
        interconnections: impl IntoIterator<Item = TransitionSketch<I, T>>,
    ) -> Result<()> {
        if Arc::ptr_eq(&self.core, &other.core) {
            return Err(PetriError::SelfMerge());
        }
        let interconnections: Vec<_> = interconnections.into_iter().collect();

        // always lock the older net first
        let (mut ours, mut theirs) = if self.core.serial < other.core.serial {
            let ours = self.core.state.write();
            (ours, other.core.state.write())
        } else {
            let theirs = other.core.state.write();
            (self.core.state.write(), theirs)
        };

        ours.validate_merge(&theirs, &interconnections)?;
        let (places, transitions) = ours.absorb(&mut theirs, &self.core)?;
        for sketch in &interconnections {
            ours.insert_transition(sketch)?;
        }
        debug!(places, transitions, interconnections = interconnections.len(), "Merged nets.");
        Ok(())
    }
}

impl<I: NodeId, T: TokenCount> Debug for PetriNet<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.state.read();
        f.debug_struct("PetriNet")
            .field("name", &self.config.name)
            .field("places", &state.place_indices().len())
            .field("transitions", &state.transition_indices().len())
            .finish()
    }
}
