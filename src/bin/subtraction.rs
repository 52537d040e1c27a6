//! Example driver: teaches a 2-2-1 swish network to subtract two small
//! non-negative integers, then prints its answer for `6 - 2`.

use rand::prelude::Distribution;

use flexnet::feedforward::{Activation, Net, Neuron};

fn main() {
    let swish = |weights, bias| Neuron::new(Activation::Swish, weights, bias);
    let mut net = Net::from_layers(vec![
        vec![swish(vec![1.0, -1.0], 0.0), swish(vec![1.0, -1.0], 0.0)],
        vec![swish(vec![1.0, -1.0], 0.0)],
    ])
    .expect("topology is consistent");

    let mut rng = rand::thread_rng();
    let operands = rand::distributions::Uniform::from(0..=10);

    let mut trained: u32 = 0;
    while trained <= 100_000 {
        let a: i32 = operands.sample(&mut rng);
        let b: i32 = operands.sample(&mut rng);
        // Only teach subtractions with a non-negative result.
        if a - b < 0 {
            continue;
        }
        net.forward(&[a as f64, b as f64]).unwrap();
        net.backward(&[(a - b) as f64], 0.006).unwrap();
        trained += 1;
    }

    println!("{:?}", net.forward(&[6.0, 2.0]).unwrap());
}
