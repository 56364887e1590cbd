use steering_core::{SimConfig, Simulation};
use std::time::Instant;

fn main() {
    let num_agents = 20_000;
    let topology = vec![4, 32, 32, 2];
    println!(
        "Benchmarking {} agents with topology {:?}",
        num_agents, topology
    );

    let config = SimConfig {
        num_agents,
        topology,
        seed: 42,
        ..SimConfig::default()
    };

    let mut serial = Simulation::new(config.clone());
    let mut parallel = Simulation::new(config);
    serial.set_target([-100.0, 300.0]);
    parallel.set_target([-100.0, 300.0]);

    let steps = 50;

    let start = Instant::now();
    for _ in 0..steps {
        serial.tick();
    }
    let duration_serial = start.elapsed();
    println!("Time for {} ticks (serial): {:?}", steps, duration_serial);
    println!("Avg time per tick (serial): {:?}", duration_serial / steps as u32);

    let start = Instant::now();
    for _ in 0..steps {
        parallel.tick_parallel();
    }
    let duration_parallel = start.elapsed();
    println!("Time for {} ticks (parallel): {:?}", steps, duration_parallel);
    println!("Avg time per tick (parallel): {:?}", duration_parallel / steps as u32);

    let speedup = duration_serial.as_secs_f64() / duration_parallel.as_secs_f64().max(1e-9);
    println!("Speedup: {:.2}x", speedup);

    let identical = serial
        .agents()
        .iter()
        .zip(parallel.agents())
        .all(|(a, b)| a.position() == b.position() && a.speed() == b.speed());
    println!("Serial and parallel states identical: {}", identical);
}
