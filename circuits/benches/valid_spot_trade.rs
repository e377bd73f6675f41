//! Benchmarks constraint generation and witness generation for a spot trade

use circuit_types::{PlonkCircuit, traits::CircuitBaseType};
use circuits::zk_circuits::valid_spot_trade::{
    SpotTradeWitnessGenerator, ValidSpotTrade,
    test_helpers::{amm_witness, dummy_params, fungible_witness},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// Tests the time taken to apply the constraints of `VALID SPOT TRADE`
pub fn bench_apply_constraints(c: &mut Criterion) {
    let params = dummy_params();
    let witnesses = [("fungible", fungible_witness().unwrap()), ("amm", amm_witness(55).unwrap())];

    let mut group = c.benchmark_group("valid_spot_trade");
    for (name, witness) in witnesses.iter() {
        group.bench_function(BenchmarkId::new("constraint-generation", name), |b| {
            b.iter(|| {
                let mut cs = PlonkCircuit::new_turbo_plonk();
                let witness_var = witness.create_witness(&mut cs).unwrap();
                let params_var = params.create_witness(&mut cs).unwrap();
                ValidSpotTrade::derive(&witness_var, &params_var, &mut cs).unwrap();
            });
        });
    }
}

/// Tests the time taken to natively generate the statement of a trade
pub fn bench_witness_generation(c: &mut Criterion) {
    let params = dummy_params();
    let witness = fungible_witness().unwrap();

    let mut group = c.benchmark_group("valid_spot_trade");
    group.bench_function(BenchmarkId::new("witness-generation", ""), |b| {
        b.iter(|| SpotTradeWitnessGenerator::generate(&witness, &params).unwrap());
    });
}

criterion_group! {
    name = valid_spot_trade;
    config = Criterion::default().sample_size(10);
    targets = bench_apply_constraints, bench_witness_generation
}
criterion_main!(valid_spot_trade);
