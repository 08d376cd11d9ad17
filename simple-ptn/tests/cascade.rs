use std::sync::{Arc, Mutex};

use simple_ptn::{
    net::{PetriNet, TransitionSketch},
    PetriError,
};

mod common;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Stage {
    Berth,
    Crane,
    Stack,
    Gate,
    Unload,
    Store,
    Release,
}

fn terminal(ships: u64) -> PetriNet<Stage, u64> {
    let net = PetriNet::new();
    net.add_place(Stage::Berth, ships).unwrap();
    net.add_place(Stage::Stack, 0).unwrap();
    net.add_place(Stage::Gate, 0).unwrap();
    // each ship brings 3 containers
    net.add_transition(
        TransitionSketch::new(Stage::Unload).input(Stage::Berth, 1).output(Stage::Stack, 3),
    )
    .unwrap();
    net.add_transition(
        TransitionSketch::new(Stage::Store).input(Stage::Stack, 3).output(Stage::Gate, 2),
    )
    .unwrap();
    net
}

#[test]
fn cascade_with_custom_types() {
    common::init_logging();
    let net = terminal(2);
    net.deep_tick(&Stage::Berth).unwrap();
    assert_eq!(net.marking(), vec![(Stage::Berth, 1), (Stage::Stack, 0), (Stage::Gate, 2)]);
    assert!(matches!(net.deep_tick(&Stage::Release), Err(PetriError::UnknownIdentity(..))));
}

#[test]
fn cascade_reports_every_change_in_order() {
    common::init_logging();
    let net = terminal(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    for place in net.places() {
        let seen = Arc::clone(&seen);
        place.on_change(move |snapshot, previous| {
            seen.lock().unwrap().push((snapshot.id, previous, snapshot.tokens));
        });
    }
    net.deep_tick(&Stage::Berth).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (Stage::Berth, 1, 0),
            (Stage::Stack, 0, 3),
            (Stage::Stack, 3, 0),
            (Stage::Gate, 0, 2),
        ]
    );
}

#[test]
fn self_loop_is_a_cycle() {
    common::init_logging();
    let net = terminal(1);
    let crane = net.add_place(Stage::Crane, 1).unwrap();
    // the crane is taken and given back in the same firing
    net.add_transition(
        TransitionSketch::new(Stage::Release).input(Stage::Crane, 1).output(Stage::Crane, 1),
    )
    .unwrap();
    let err = net.deep_tick(&Stage::Crane).unwrap_err();
    assert_eq!(err.to_string(), "Cycle detected at place Crane");
    assert_eq!(crane.tokens(), 1);
    assert_eq!(net.find_place(&Stage::Berth).unwrap().tokens(), 1);
}

#[test]
fn cover_roots_every_place() {
    common::init_logging();
    let net = common::net("cover", &[("a", 2), ("b", 0), ("c", 0)]);
    let ab = net.add_transition(common::arc("ab", "a", "b")).unwrap();
    net.add_transition(common::arc("bc", "b", "c")).unwrap();
    let fired = Arc::new(Mutex::new(0));
    let fired_clone = Arc::clone(&fired);
    net.find_place("b").unwrap().on_change(move |snapshot, previous| {
        if snapshot.tokens > previous {
            *fired_clone.lock().unwrap() += 1;
        }
    });

    // root a: ab fires once and cascades into bc, root b: nothing left to fire
    net.deep_tick_cover().unwrap();
    assert_eq!(common::total_tokens(&net), 2);
    assert_eq!(net.find_place("c").unwrap().tokens(), 1);
    assert_eq!(*fired.lock().unwrap(), 1);

    // the next cover picks up where the last one stopped
    net.deep_tick_cover().unwrap();
    assert_eq!(net.find_place("c").unwrap().tokens(), 2);
    assert!(!ab.ready());
}
