//! Three-layer sigmoid network trained by single-sample backpropagation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::training::{Example, LearningStrategy, TrainingData};
use crate::{BrainError, Matrix, Shape};

/// Fully connected `input -> hidden -> output` network with sigmoid activations on both
/// layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyNetwork {
    weights_ih: Matrix,
    weights_ho: Matrix,
    bias_h: Matrix,
    bias_o: Matrix,
    learning_rate: f64,
}

impl PolicyNetwork {
    /// Randomly initialised network; every weight and bias is uniform in `[-1, 1]`.
    #[must_use]
    pub fn new<R: Rng + ?Sized>(
        input: usize,
        hidden: usize,
        output: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Self {
        Self {
            weights_ih: Matrix::random(hidden, input, rng),
            weights_ho: Matrix::random(output, hidden, rng),
            bias_h: Matrix::random(hidden, 1, rng),
            bias_o: Matrix::random(output, 1, rng),
            learning_rate,
        }
    }

    /// Assemble a network from explicit parameters, checking that the layers line up.
    pub fn from_parts(
        weights_ih: Matrix,
        weights_ho: Matrix,
        bias_h: Matrix,
        bias_o: Matrix,
        learning_rate: f64,
    ) -> Result<Self, BrainError> {
        let hidden = weights_ih.rows();
        let output = weights_ho.rows();
        let checks = [
            ("hidden layer", Shape::new(output, hidden), weights_ho.shape()),
            ("hidden bias", Shape::new(hidden, 1), bias_h.shape()),
            ("output bias", Shape::new(output, 1), bias_o.shape()),
        ];
        for (op, expected, actual) in checks {
            if expected != actual {
                return Err(BrainError::ShapeMismatch {
                    op,
                    lhs: expected,
                    rhs: actual,
                });
            }
        }
        Ok(Self {
            weights_ih,
            weights_ho,
            bias_h,
            bias_o,
            learning_rate,
        })
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.weights_ih.cols()
    }

    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.weights_ih.rows()
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.weights_ho.rows()
    }

    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Forward pass; returns one score in `(0, 1)` per output.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>, BrainError> {
        let (_, output) = self.forward(&Matrix::column(input))?;
        Ok(output.to_flat_vec())
    }

    /// One step of gradient descent on the squared error between the prediction for `input`
    /// and `target`.
    pub fn train(&mut self, input: &[f64], target: &[f64]) -> Result<(), BrainError> {
        let input = Matrix::column(input);
        let (hidden, output) = self.forward(&input)?;
        let errors = Matrix::column(target).subtract(&output)?;

        let gradient = output
            .sigmoid_derivative()
            .multiply(&errors)?
            .multiply_scalar(self.learning_rate);
        let delta_ho = gradient.dot(&hidden.transpose())?;
        self.weights_ho = self.weights_ho.add(&delta_ho)?;
        self.bias_o = self.bias_o.add(&gradient)?;

        // Hidden errors flow back through the freshly updated output weights.
        let hidden_errors = self.weights_ho.transpose().dot(&errors)?;
        let hidden_gradient = hidden
            .sigmoid_derivative()
            .multiply(&hidden_errors)?
            .multiply_scalar(self.learning_rate);
        let delta_ih = hidden_gradient.dot(&input.transpose())?;
        self.weights_ih = self.weights_ih.add(&delta_ih)?;
        self.bias_h = self.bias_h.add(&hidden_gradient)?;
        Ok(())
    }

    /// Perform `epochs` single-sample updates, each on an example drawn uniformly (with
    /// replacement) from `data`.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        data: &TrainingData,
        epochs: usize,
        rng: &mut R,
    ) -> Result<(), BrainError> {
        if data.is_empty() {
            return Ok(());
        }
        for _ in 0..epochs {
            let index = rng.random_range(0..data.len());
            let Some(example) = data.example(index) else {
                continue;
            };
            match example {
                Example::Supervised { input, target } => self.train(input, target)?,
                Example::Experience {
                    input,
                    reward,
                    next_state,
                    action,
                    strategy,
                } => {
                    let target = self.experience_target(input, reward, next_state, action, strategy)?;
                    self.train(input, &target)?;
                }
            }
        }
        Ok(())
    }

    fn experience_target(
        &self,
        input: &[f64],
        reward: f64,
        next_state: &[f64],
        action: usize,
        strategy: LearningStrategy,
    ) -> Result<Vec<f64>, BrainError> {
        let mut target = self.predict(input)?;
        let outputs = target.len();
        let slot = target
            .get_mut(action)
            .ok_or(BrainError::ActionOutOfRange { action, outputs })?;
        *slot = match strategy {
            LearningStrategy::RewardOnly => reward,
            LearningStrategy::Discounted { discount } => {
                let best_next = self
                    .predict(next_state)?
                    .into_iter()
                    .fold(f64::NEG_INFINITY, f64::max);
                reward + discount * best_next
            }
        };
        Ok(target)
    }

    fn forward(&self, input: &Matrix) -> Result<(Matrix, Matrix), BrainError> {
        let hidden = self.weights_ih.dot(input)?.add(&self.bias_h)?.sigmoid();
        let output = self.weights_ho.dot(&hidden)?.add(&self.bias_o)?.sigmoid();
        Ok((hidden, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn network(seed: u64) -> PolicyNetwork {
        let mut rng = SmallRng::seed_from_u64(seed);
        PolicyNetwork::new(7, 12, 5, 0.1, &mut rng)
    }

    #[test]
    fn predict_returns_one_score_per_output() {
        let net = network(1);
        let scores = net.predict(&[0.0, 1.0, 2.0, 3.0, 4.0, 1.0, 500.0]).expect("predict");
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|s| *s > 0.0 && *s < 1.0));
    }

    #[test]
    fn experience_target_replaces_only_the_taken_action() {
        let net = network(9);
        let state = [1.0, 0.0, 2.0, 0.0, 3.0, 1.0, 40.0];
        let next = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 39.0];
        let predicted = net.predict(&state).expect("predict");
        let best_next = net
            .predict(&next)
            .expect("predict")
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);

        let discounted = net
            .experience_target(&state, 2.0, &next, 1, LearningStrategy::discounted())
            .expect("target");
        assert!((discounted[1] - (2.0 + 0.95 * best_next)).abs() < 1e-12);
        for slot in [0, 2, 3, 4] {
            assert_eq!(discounted[slot], predicted[slot]);
        }

        let reward_only = net
            .experience_target(&state, 2.0, &next, 1, LearningStrategy::RewardOnly)
            .expect("target");
        assert_eq!(reward_only[1], 2.0);
        assert_eq!(reward_only[3], predicted[3]);

        assert_eq!(
            net.experience_target(&state, 2.0, &next, 5, LearningStrategy::RewardOnly),
            Err(BrainError::ActionOutOfRange {
                action: 5,
                outputs: 5
            })
        );
    }

    #[test]
    fn predict_rejects_wrong_input_length() {
        let net = network(2);
        assert!(matches!(
            net.predict(&[1.0, 2.0]),
            Err(BrainError::ShapeMismatch { op: "dot", .. })
        ));
    }

    #[test]
    fn train_rejects_wrong_target_length_without_mutating() {
        let mut net = network(3);
        let before = net.clone();
        assert!(net.train(&[0.0; 7], &[1.0; 4]).is_err());
        assert_eq!(net, before);
    }

    #[test]
    fn train_moves_prediction_towards_target() {
        let mut net = network(4);
        let input = [0.5; 7];
        let target = [1.0, 0.0, 1.0, 0.0, 1.0];
        let distance = |net: &PolicyNetwork| -> f64 {
            net.predict(&input)
                .expect("predict")
                .iter()
                .zip(target)
                .map(|(p, t)| (p - t).powi(2))
                .sum()
        };
        let before = distance(&net);
        for _ in 0..50 {
            net.train(&input, &target).expect("train");
        }
        assert!(distance(&net) < before);
    }

    #[test]
    fn copies_are_independent() {
        let mut original = network(5);
        let copy = original.clone();
        original.train(&[1.0; 7], &[0.0; 5]).expect("train");
        assert_ne!(original, copy);
        assert_eq!(copy.output_size(), 5);
    }

    #[test]
    fn from_parts_validates_layer_shapes() {
        let err = PolicyNetwork::from_parts(
            Matrix::zeros(4, 3),
            Matrix::zeros(2, 5),
            Matrix::zeros(4, 1),
            Matrix::zeros(2, 1),
            0.1,
        )
        .expect_err("hidden sizes disagree");
        assert!(matches!(err, BrainError::ShapeMismatch { op: "hidden layer", .. }));
    }

    #[test]
    fn reward_only_fit_pulls_taken_action_towards_reward() {
        let mut rng = SmallRng::seed_from_u64(6);
        let mut net = PolicyNetwork::new(3, 8, 2, 0.5, &mut rng);
        let input = vec![0.2, 0.4, 0.6];
        let data = TrainingData::experience(vec![input.clone()], vec![0.0], vec![input.clone()], vec![1])
            .expect("data");
        let before = net.predict(&input).expect("predict")[1];
        net.fit(&data, 200, &mut rng).expect("fit");
        let after = net.predict(&input).expect("predict")[1];
        assert!(after < before);
    }

    #[test]
    fn fit_reports_out_of_range_actions() {
        let mut rng = SmallRng::seed_from_u64(8);
        let mut net = PolicyNetwork::new(2, 4, 2, 0.1, &mut rng);
        let data = TrainingData::experience(vec![vec![0.0, 1.0]], vec![1.0], vec![vec![1.0, 0.0]], vec![9])
            .expect("data")
            .with_strategy(LearningStrategy::discounted());
        assert_eq!(
            net.fit(&data, 1, &mut rng),
            Err(BrainError::ActionOutOfRange { action: 9, outputs: 2 })
        );
    }

    #[test]
    fn fit_on_empty_data_is_a_no_op() {
        let mut rng = SmallRng::seed_from_u64(10);
        let mut net = PolicyNetwork::new(2, 4, 2, 0.1, &mut rng);
        let before = net.clone();
        let data = TrainingData::supervised(Vec::new(), Vec::new()).expect("empty");
        net.fit(&data, 100, &mut rng).expect("fit");
        assert_eq!(net, before);
    }
}
