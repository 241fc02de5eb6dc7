use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qcircuit::prelude::*;

fn bench_state_vector(c: &mut Criterion) {
    let h = Gate::H.matrix().unwrap();

    c.bench_function("hadamard_layer_12_qubits", |b| {
        b.iter(|| {
            let mut state = StateVector::zero(12).unwrap();
            for q in 0..12 {
                state.apply_single(black_box(q), &h);
            }
            state
        });
    });

    c.bench_function("qrng_64_bits", |b| {
        let mut qrng = QuantumRng::seeded(7);
        b.iter(|| qrng.generate_bits(black_box(64)).unwrap());
    });
}

criterion_group!(benches, bench_state_vector);
criterion_main!(benches);
