//! A small place/transition net engine that can be shared between threads.
//!
//! Nets are built through [`net::PetriNet`] by adding places and
//! [`net::TransitionSketch`]es. Transitions can be fired manually, gated by an auto-fire
//! predicate and ticked, or fired in cascades starting from a place. Two nets can be merged
//! into one.
//!
//! ```
//! use simple_ptn::net::{PetriNet, TransitionSketch};
//!
//! let net: PetriNet = PetriNet::new();
//! net.add_place("in", 2)?;
//! net.add_place("out", 0)?;
//! let tr = net.add_transition(TransitionSketch::new("move").input("in", 1).output("out", 1))?;
//! assert!(tr.fire());
//! assert_eq!(net.find_place("out").map(|pl| pl.tokens()), Some(1));
//! # Ok::<(), simple_ptn::PetriError>(())
//! ```
pub mod error;
pub mod net;

pub use error::{PetriError, Result};
