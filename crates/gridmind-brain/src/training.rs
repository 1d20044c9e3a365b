//! Training sets and the rules that turn experiences into regression targets.

use serde::{Deserialize, Serialize};

use crate::BrainError;

/// How the target for a taken action is derived from an experience.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningStrategy {
    /// The taken action's target is the observed reward.
    #[default]
    RewardOnly,
    /// The taken action's target is the reward plus the discounted best predicted score of
    /// the following state.
    Discounted { discount: f64 },
}

impl LearningStrategy {
    /// Discount factor used by [`LearningStrategy::discounted`].
    pub const DEFAULT_DISCOUNT: f64 = 0.95;

    #[must_use]
    pub const fn discounted() -> Self {
        Self::Discounted {
            discount: Self::DEFAULT_DISCOUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Labels {
    Targets(Vec<Vec<f64>>),
    Experience {
        rewards: Vec<f64>,
        next_states: Vec<Vec<f64>>,
        actions: Vec<usize>,
        strategy: LearningStrategy,
    },
}

/// One training example, borrowed from a [`TrainingData`] set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Example<'a> {
    Supervised {
        input: &'a [f64],
        target: &'a [f64],
    },
    Experience {
        input: &'a [f64],
        reward: f64,
        next_state: &'a [f64],
        action: usize,
        strategy: LearningStrategy,
    },
}

/// Parallel sequences of training examples with equal lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingData {
    inputs: Vec<Vec<f64>>,
    labels: Labels,
}

impl TrainingData {
    /// Plain `(input, target)` pairs.
    pub fn supervised(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Self, BrainError> {
        check_len("targets", inputs.len(), targets.len())?;
        Ok(Self {
            inputs,
            labels: Labels::Targets(targets),
        })
    }

    /// Remembered experiences: what was observed, the reward earned, what was observed
    /// afterwards and which action was taken. Defaults to [`LearningStrategy::RewardOnly`].
    pub fn experience(
        inputs: Vec<Vec<f64>>,
        rewards: Vec<f64>,
        next_states: Vec<Vec<f64>>,
        actions: Vec<usize>,
    ) -> Result<Self, BrainError> {
        check_len("rewards", inputs.len(), rewards.len())?;
        check_len("next states", inputs.len(), next_states.len())?;
        check_len("actions", inputs.len(), actions.len())?;
        Ok(Self {
            inputs,
            labels: Labels::Experience {
                rewards,
                next_states,
                actions,
                strategy: LearningStrategy::RewardOnly,
            },
        })
    }

    /// Select the target rule for experience data. Supervised sets are unaffected.
    #[must_use]
    pub fn with_strategy(mut self, new_strategy: LearningStrategy) -> Self {
        if let Labels::Experience { strategy, .. } = &mut self.labels {
            *strategy = new_strategy;
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Example at `index`, or `None` when out of range.
    #[must_use]
    pub fn example(&self, index: usize) -> Option<Example<'_>> {
        let input = self.inputs.get(index)?;
        Some(match &self.labels {
            Labels::Targets(targets) => Example::Supervised {
                input,
                target: &targets[index],
            },
            Labels::Experience {
                rewards,
                next_states,
                actions,
                strategy,
            } => Example::Experience {
                input,
                reward: rewards[index],
                next_state: &next_states[index],
                action: actions[index],
                strategy: *strategy,
            },
        })
    }
}

fn check_len(field: &'static str, inputs: usize, actual: usize) -> Result<(), BrainError> {
    if inputs == actual {
        Ok(())
    } else {
        Err(BrainError::InvalidTrainingData {
            field,
            inputs,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_rejects_mismatched_lengths() {
        let err = TrainingData::experience(
            vec![vec![0.0]; 3],
            vec![1.0; 3],
            vec![vec![0.0]; 2],
            vec![0; 3],
        )
        .expect_err("next states are short");
        assert_eq!(
            err,
            BrainError::InvalidTrainingData {
                field: "next states",
                inputs: 3,
                actual: 2,
            }
        );

        assert!(
            TrainingData::experience(vec![vec![0.0]; 2], vec![1.0; 2], vec![vec![0.0]; 2], vec![0])
                .is_err()
        );
        assert!(TrainingData::supervised(vec![vec![0.0]; 2], vec![vec![1.0]]).is_err());
    }

    #[test]
    fn strategy_applies_to_experience_examples() {
        let data = TrainingData::experience(vec![vec![1.0]], vec![2.0], vec![vec![3.0]], vec![1])
            .expect("data")
            .with_strategy(LearningStrategy::discounted());
        match data.example(0) {
            Some(Example::Experience {
                reward,
                action,
                strategy,
                ..
            }) => {
                assert_eq!(reward, 2.0);
                assert_eq!(action, 1);
                assert_eq!(strategy, LearningStrategy::Discounted { discount: 0.95 });
            }
            other => panic!("unexpected example {other:?}"),
        }
        assert!(data.example(1).is_none());
    }
}
