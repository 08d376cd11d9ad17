#![allow(dead_code)]

use simple_ptn::net::{PetriNet, PetriNetConfigBuilder, TransitionSketch};
use tracing_subscriber::EnvFilter;

/// Log to the test output, filtered by `RUST_LOG` (e.g. `RUST_LOG=simple_ptn=trace`).
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn net(name: &str, places: &[(&str, u32)]) -> PetriNet {
    let config = PetriNetConfigBuilder::default().name(name).build().unwrap();
    let net = PetriNet::with_config(config);
    for &(id, tokens) in places {
        net.add_place(id, tokens).unwrap();
    }
    net
}

pub fn arc(id: &str, from: &str, to: &str) -> TransitionSketch<String, u32> {
    TransitionSketch::new(id).input(from, 1).output(to, 1)
}

pub fn total_tokens(net: &PetriNet) -> u32 {
    net.marking().into_iter().map(|(_, tokens)| tokens).sum()
}
