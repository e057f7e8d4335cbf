// imports of other modules from this crate
mod errors;
pub use errors::{ConfigError, SelectionError};

mod population;
pub use population::{Agent, AgentId, Plan, PlanId, PlanKey, Population};

mod joint_plans;
pub use joint_plans::{JointPlan, JointPlanError, JointPlanId, JointPlans};

mod replanning_group;
pub use replanning_group::{GroupingPolicy, ReplanningGroup};

mod weights;
pub use weights::{InverseScoreWeight, LogitWeight, ScoreWeight, WeightFunction, WeightKind};

mod incompatibility;
pub use incompatibility::{IncompatibilityKind, IncompatiblePlansIdentifier, NoIncompatibility,
                          SharedVehicleIdentifier};

mod plan_record;
pub use plan_record::PlanRecord;

mod pointing_agent;
pub use pointing_agent::PointingAgent;

mod conflict_solver;
pub use conflict_solver::{BossChoice, ConflictSolver, ConflictView, UnitKey};

mod coalition_selector;
pub use coalition_selector::{CoalitionSelector, GroupSelection, SelectedPlan};

mod plan_removal;
pub use plan_removal::ExtraPlanRemover;

mod config_utils;

mod config;
pub use config::{GroupingConfig, ReplanningConfig};

mod replanning;
pub use replanning::{FailurePolicy, GroupReplanner, IterationReport};

mod synthetic;
pub use synthetic::generate_carpool_population;

#[cfg(test)]
mod test_utils;
