use rand::Rng;
use rand_isaac::Isaac64Rng;

use super::population::Plan;
use super::replanning_group::ReplanningGroup;


/// Computes how desirable a plan is for selection.  Implementations must be pure apart from
/// draws on the rng they are handed, since groups are processed concurrently.
pub trait WeightFunction: Send + Sync {
    fn weight(&self, plan: &Plan, group: &ReplanningGroup, rng: &mut Isaac64Rng) -> f64;
}

/// Uses the score directly.  Unscored plans get an infinite weight so they are tried first.
pub struct ScoreWeight;

impl WeightFunction for ScoreWeight {
    fn weight(&self, plan: &Plan, _group: &ReplanningGroup, _rng: &mut Isaac64Rng) -> f64 {
        match plan.score {
            Some(score) => score,
            None => f64::INFINITY,
        }
    }
}

/// Prefers the worst-scored plans, to force exploration.
pub struct InverseScoreWeight;

impl WeightFunction for InverseScoreWeight {
    fn weight(&self, plan: &Plan, _group: &ReplanningGroup, _rng: &mut Isaac64Rng) -> f64 {
        match plan.score {
            Some(score) => -score,
            None => f64::INFINITY,
        }
    }
}

/// Scaled score plus standard Gumbel noise, so that picking the maximum weight amounts to
/// drawing from a multinomial logit over the plans.
pub struct LogitWeight {
    pub scale: f64,
}

impl WeightFunction for LogitWeight {
    fn weight(&self, plan: &Plan, _group: &ReplanningGroup, rng: &mut Isaac64Rng) -> f64 {
        // draw even for unscored plans, so the sequence of draws doesn't depend on scores
        let uu: f64 = rng.gen_range(f64::EPSILON..1.0);
        let gumbel = -(-uu.ln()).ln();
        match plan.score {
            Some(score) => self.scale * score + gumbel,
            None => f64::INFINITY,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum WeightKind {
    Score,
    InverseScore,
    Logit { scale: f64 },
}

impl WeightKind {
    pub fn build(&self) -> Box<dyn WeightFunction> {
        match self {
            WeightKind::Score => Box::new(ScoreWeight),
            WeightKind::InverseScore => Box::new(InverseScoreWeight),
            WeightKind::Logit { scale } => Box::new(LogitWeight { scale: *scale }),
        }
    }
}
