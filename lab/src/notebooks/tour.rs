use std::slice;

use anyhow::Result;
use qcircuit::{Circuit, Gate, Operation, Qubit};

use super::{heading, simulator};

pub fn run(seed: Option<u64>, repetitions: usize) -> Result<()> {
    let mut simulator = simulator(seed);
    let apolonia = Qubit::named("Apolonia");

    heading("A qubit in superposition");
    let circuit = Circuit::from_operations([Gate::H.on(&apolonia)])?;
    println!("{circuit}\n");
    let result = simulator.simulate(&circuit)?;
    println!("Final state: {}", result.final_state);
    println!("Norm:        {:.6}", result.final_state.norm());

    heading("Moment by moment");
    let circuit = Circuit::from_operations([
        Gate::H.on(&apolonia),
        Operation::measure(slice::from_ref(&apolonia), "m"),
    ])?;
    println!("{circuit}\n");
    for step in simulator.simulate_moment_steps(&circuit)? {
        println!(
            "Step: {}\nLast moment: {}\nState: {}\n",
            step.step, step.moment, step.state
        );
    }

    heading("Classical bit versus qubit");
    let bit = Qubit::named("bit");
    let flipped = Circuit::from_operations([
        Gate::X.on(&bit),
        Operation::measure(slice::from_ref(&bit), "x"),
    ])?;
    let superposed = Circuit::from_operations([
        Gate::H.on(&bit),
        Operation::measure(slice::from_ref(&bit), "h"),
    ])?;
    println!("X then measure: {:?}", simulator.run(&flipped, 10)?.histogram("x")?);
    println!("H then measure: {:?}", simulator.run(&superposed, 10)?.histogram("h")?);

    heading("A Bell pair");
    let pair = Qubit::range(2, "q");
    let bell = Circuit::from_operations([
        Gate::H.on(&pair[0]),
        Gate::Cnot.on_pair(&pair[0], &pair[1]),
        Operation::measure(&pair, "bell"),
    ])?;
    println!("{bell}\n");
    let samples = simulator.run(&bell, repetitions)?;
    println!("{} repetitions:", samples.repetitions);
    for (outcome, count) in samples.histogram("bell")? {
        println!("  {outcome}: {count}");
    }
    Ok(())
}
