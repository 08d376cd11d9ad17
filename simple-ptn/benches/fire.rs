/// Throughput of firing and ticking on a single thread.
///
/// Uses a ring of `n` places and transitions:
///
///   pl0 ──► tr0 ──► pl1 ──► tr1 ──► ... ──► pl(n-1) ──► tr(n-1)
///    ▲                                               │
///    └───────────────────────────────────────────────┘
///
/// Every place starts with one token, so each transition is ready at all times and the marking
/// never changes. `fire` fires all transitions directly, `tick` does the same through the
/// net-wide tick with an always-true auto-fire predicate.
use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use simple_ptn::net::PetriNet;
use simple_ptn::net::PetriNetConfigBuilder;
use simple_ptn::net::Transition;
use simple_ptn::net::TransitionSketch;

fn ring(size: usize) -> (PetriNet, Vec<Transition>) {
    let config = PetriNetConfigBuilder::default().name(format!("ring-{size}")).build().unwrap();
    let net = PetriNet::with_config(config);
    for i in 0..size {
        net.add_place(format!("pl{i}"), 1).unwrap();
    }
    let transitions = (0..size)
        .map(|i| {
            let sketch = TransitionSketch::new(format!("tr{i}"))
                .input(format!("pl{i}"), 1)
                .output(format!("pl{}", (i + 1) % size), 1);
            net.add_transition(sketch).unwrap()
        })
        .collect();
    (net, transitions)
}

fn benchmark_fire(c: &mut Criterion) {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new("error").unwrap())
        .init();

    let mut group = c.benchmark_group("fire");
    for &size in [1usize, 4, 16, 64, 256].iter() {
        let (_net, transitions) = ring(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fire", size), &transitions, |b, transitions| {
            b.iter(|| {
                for tr in transitions {
                    black_box(tr.fire());
                }
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("tick");
    for &size in [1usize, 4, 16, 64, 256].iter() {
        let (net, transitions) = ring(size);
        for tr in &transitions {
            tr.auto_fire_always();
        }
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("tick", size), &net, |b, net| {
            b.iter(|| black_box(net.tick()));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_fire);
criterion_main!(benches);
