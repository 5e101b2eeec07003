//! Training sessions

use match_engine::{training_gain, AttributeKind};

use crate::state::{Player, TRAINING_POINTS_PER_SESSION, TRAIN_FATIGUE};

impl Player {
    /// Go training: grants a fresh budget of training points
    pub fn start_training(&mut self) -> u32 {
        self.training_points = TRAINING_POINTS_PER_SESSION;
        self.training_points
    }

    /// Spend one training point on `kind` and return the gain
    ///
    /// Without points nothing changes and the gain is 0.
    pub fn train(&mut self, kind: AttributeKind) -> f64 {
        if self.training_points == 0 {
            return 0.0;
        }
        let gain = training_gain(self.trained.get(kind), self.peripheral_bonus());
        *self.attributes.get_mut(kind) += gain;
        self.trained.increment(kind);
        self.fatigue += TRAIN_FATIGUE;
        self.training_points -= 1;
        gain
    }
}
