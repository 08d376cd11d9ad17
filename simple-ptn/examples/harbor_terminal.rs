//! A harbor with two berths and freight delivered by suppliers.
//!
//! Ships enter berth A or B when it is free and leave once they could load their freight (2
//! units at berth A, 3 at berth B). Suppliers move their stock to the freight place on every
//! tick while they are enabled. Several threads fire transitions concurrently while the main
//! thread ticks the net.
//!
//! Run with `RUST_LOG=info,simple_ptn=trace` to see every firing.
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use simple_ptn::{
    net::{PetriNet, PetriNetConfigBuilder, Transition, TransitionSketch},
    Result as PetriResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(100);
const TICKS: u32 = 60;

/// Brings `per_tick` units of freight on every tick while enabled, until `amount` is used up.
struct Supplier {
    amount: u32,
    per_tick: u32,
    enabled: Arc<AtomicBool>,
}

impl Supplier {
    fn new(amount: u32, per_tick: u32) -> Self {
        Supplier { amount, per_tick, enabled: Arc::new(AtomicBool::new(false)) }
    }

    fn attach(&self, net: &PetriNet) -> PetriResult<()> {
        let suffix = format!("{}@{}", self.amount, self.per_tick);
        let stock = format!("supplier_stock_{suffix}");
        net.add_place(stock.as_str(), self.amount)?;
        let supply = net.add_transition(
            TransitionSketch::new(format!("supply_{suffix}"))
                .input(stock, self.per_tick)
                .output("freight", self.per_tick),
        )?;
        let enabled = Arc::clone(&self.enabled);
        supply.auto_fire(move |_| enabled.load(Ordering::SeqCst));
        Ok(())
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

struct Port {
    net: PetriNet,
    enter_a: Transition,
    enter_b: Transition,
    leave_a: Transition,
    leave_b: Transition,
}

impl Port {
    fn new() -> PetriResult<Self> {
        let net = PetriNet::with_config(PetriNetConfigBuilder::default().name("harbor").build()?);
        net.add_place("port_a", 0)?;
        net.add_place("port_a_free", 1)?;
        net.add_place("port_b", 0)?;
        net.add_place("port_b_free", 1)?;
        net.add_place("freight", 0)?;

        let enter_a = net.add_transition(
            TransitionSketch::new("enter_a").input("port_a_free", 1).output("port_a", 1),
        )?;
        let enter_b = net.add_transition(
            TransitionSketch::new("enter_b").input("port_b_free", 1).output("port_b", 1),
        )?;
        let leave_a = net.add_transition(
            TransitionSketch::new("leave_a")
                .input("port_a", 1)
                .input("freight", 2)
                .output("port_a_free", 1),
        )?;
        let leave_b = net.add_transition(
            TransitionSketch::new("leave_b")
                .input("port_b", 1)
                .input("freight", 3)
                .output("port_b_free", 1),
        )?;

        if let Some(freight) = net.find_place("freight") {
            freight.on_change(|place, previous| {
                let total = place.tokens;
                if total < previous {
                    info!(total, "Ship took {} freight.", previous - total);
                } else {
                    info!(total, "Supplier brought {} freight.", total - previous);
                }
            });
        }
        for berth in ["port_a", "port_b"] {
            if let Some(place) = net.find_place(berth) {
                place.on_change(|place, _| {
                    if place.tokens == 0 {
                        info!("Ship left {}.", place.id);
                    } else {
                        info!("Ship entered {}.", place.id);
                    }
                });
            }
        }

        Ok(Port { net, enter_a, enter_b, leave_a, leave_b })
    }

    fn add_supplier(&self, supplier: &Supplier) -> PetriResult<()> {
        supplier.attach(&self.net)
    }
}

#[tracing::instrument(level = "info")]
fn run() -> PetriResult<()> {
    let port = Port::new()?;
    let large = Supplier::new(28, 2);
    let small = Supplier::new(10, 1);
    port.add_supplier(&large)?;
    port.add_supplier(&small)?;

    let done = AtomicBool::new(false);
    thread::scope(|s| {
        // ships try to leave as soon as there is enough freight
        for leave in [&port.leave_a, &port.leave_b] {
            let done = &done;
            s.spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    leave.fire();
                    thread::sleep(Duration::from_millis(1));
                }
            });
        }
        s.spawn(|| {
            while !done.load(Ordering::SeqCst) {
                port.enter_a.fire();
                port.enter_b.fire();
                thread::sleep(TICK * 10);
            }
        });
        for (supplier, on, off) in [(&large, 35, 65), (&small, 25, 55)] {
            let done = &done;
            s.spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    supplier.set_enabled(true);
                    thread::sleep(TICK * on / 10);
                    supplier.set_enabled(false);
                    thread::sleep(TICK * off / 10);
                }
            });
        }

        // only the suppliers have auto-fire predicates
        for _ in 0..TICKS {
            thread::sleep(TICK);
            port.net.tick();
        }
        done.store(true, Ordering::SeqCst);
    });

    for (place, tokens) in port.net.marking() {
        info!(%place, tokens, "Final marking.");
    }
    info!("Bye.");
    Ok(())
}

fn main() -> PetriResult<()> {
    // set up logging
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run()
}
