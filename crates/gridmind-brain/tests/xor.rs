use gridmind_brain::{PolicyNetwork, TrainingData};
use rand::{SeedableRng, rngs::SmallRng};

#[test]
fn learns_xor_within_tolerance() {
    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let data = TrainingData::supervised(inputs.clone(), targets.clone()).expect("xor data");

    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut network = PolicyNetwork::new(2, 10, 1, 0.1, &mut rng);
    network.fit(&data, 50_000, &mut rng).expect("fit");

    for (input, target) in inputs.iter().zip(&targets) {
        let prediction = network.predict(input).expect("predict")[0];
        assert!(
            (prediction - target[0]).abs() < 0.3,
            "xor({input:?}) = {prediction}, expected {}",
            target[0]
        );
    }
}
