mod arena;
mod change;
mod common;
mod config;
mod net_state;
mod place;
mod sketch;
mod transition;

pub use change::PlaceSnapshot;
pub use common::{NodeId, NodeKind, TokenCount};
pub use config::{PetriNetConfig, PetriNetConfigBuilder, PetriNetConfigBuilderError};
pub use net_state::PetriNet;
pub use place::Place;
pub use sketch::TransitionSketch;
pub use transition::Transition;
