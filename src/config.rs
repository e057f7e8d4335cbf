use std::path::{Path, PathBuf};

use yaml_rust::Yaml;
use yaml_rust::YamlLoader;

use super::config_utils;
use super::conflict_solver::{BossChoice, ConflictSolver};
use super::errors::ConfigError;
use super::incompatibility::IncompatibilityKind;
use super::replanning::FailurePolicy;
use super::replanning_group::GroupingPolicy;
use super::weights::WeightKind;


#[derive(PartialEq, Debug, Clone)]
pub enum GroupingConfig {
    // path to a csv file with one group per line
    Fixed { groups_path: PathBuf },
    JointPlans { by_vehicles: bool },
}

/// Everything needed to set up group replanning.  Values are checked when the config is read, so
/// a config that exists is a valid one.
#[derive(PartialEq, Debug, Clone)]
pub struct ReplanningConfig {
    // seeds every random draw of the selection and removal steps
    pub seed: u64,
    pub weight: WeightKind,
    pub conflict_solver: ConflictSolver,
    pub incompatibility: IncompatibilityKind,
    pub grouping: GroupingConfig,
    pub max_plans_per_agent: usize,
    pub max_joint_plans_per_composition: usize,
    pub on_group_failure: FailurePolicy,
}

impl Default for ReplanningConfig {
    fn default() -> ReplanningConfig {
        ReplanningConfig {
            seed: 100,
            weight: WeightKind::Score,
            conflict_solver: ConflictSolver::LeastAverageWeight,
            incompatibility: IncompatibilityKind::None,
            grouping: GroupingConfig::JointPlans { by_vehicles: false },
            max_plans_per_agent: 5,
            max_joint_plans_per_composition: 3,
            on_group_failure: FailurePolicy::Abort,
        }
    }
}

impl ReplanningConfig {
    pub fn from_file(path: &str) -> Result<ReplanningConfig, ConfigError> {
        let file_contents = std::fs::read_to_string(path).map_err(
            |source| ConfigError::Io { path: String::from(path), source })?;
        let config_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        ReplanningConfig::from_yaml_str(&file_contents, config_dir)
    }

    /// Relative paths in the config are resolved against `config_dir`.
    pub fn from_yaml_str(contents: &str, config_dir: &Path)
                         -> Result<ReplanningConfig, ConfigError> {
        let yaml_cfgs = YamlLoader::load_from_str(contents)?;
        match yaml_cfgs.get(0) {
            Some(yaml_cfg) => ReplanningConfig::from_yaml(yaml_cfg, config_dir),
            None => Err(ConfigError::MissingField(String::from("seed"))),
        }
    }

    fn from_yaml(yaml_cfg: &Yaml, config_dir: &Path) -> Result<ReplanningConfig, ConfigError> {
        let defaults = ReplanningConfig::default();
        let seed = config_utils::require(config_utils::get_u64(yaml_cfg, "seed")?, "seed")?;

        let weight = match config_utils::get_str(yaml_cfg, "weight")? {
            None | Some("score") => WeightKind::Score,
            Some("inverse_score") => WeightKind::InverseScore,
            Some("logit") => {
                let scale = config_utils::get_f64(yaml_cfg, "logit_scale")?.unwrap_or(1.);
                if !scale.is_finite() || scale <= 0. {
                    return Err(invalid_value("logit_scale", &scale.to_string()));
                }
                WeightKind::Logit { scale }
            }
            Some(other) => return Err(invalid_value("weight", other)),
        };

        let conflict_solver = match config_utils::get_str(yaml_cfg, "conflict_solver")? {
            None | Some("least_average_weight") => ConflictSolver::LeastAverageWeight,
            Some("who_is_the_boss") => {
                let choice = match config_utils::get_str(yaml_cfg, "boss_choice")? {
                    None | Some("random") => BossChoice::Random,
                    Some("lowest_weight") => BossChoice::LowestWeight,
                    Some("first_in_group") => BossChoice::FirstInGroup,
                    Some(other) => return Err(invalid_value("boss_choice", other)),
                };
                ConflictSolver::WhoIsTheBoss(choice)
            }
            Some(other) => return Err(invalid_value("conflict_solver", other)),
        };

        let incompatibility = match config_utils::get_str(yaml_cfg, "incompatibility")? {
            None | Some("none") => IncompatibilityKind::None,
            Some("shared_vehicle") => IncompatibilityKind::SharedVehicle,
            Some(other) => return Err(invalid_value("incompatibility", other)),
        };

        // selection only sees one group at a time, so agents that may share a vehicle have to be
        // grouped together for the vehicle constraint to hold
        let needs_vehicle_groups = incompatibility == IncompatibilityKind::SharedVehicle;
        let grouping = match config_utils::get_str(yaml_cfg, "grouping")? {
            None | Some("joint_plans") => {
                let by_vehicles = config_utils::get_bool(yaml_cfg, "group_by_vehicles")?
                    .unwrap_or(needs_vehicle_groups);
                if needs_vehicle_groups && !by_vehicles {
                    return Err(invalid_value("group_by_vehicles", "false"));
                }
                GroupingConfig::JointPlans { by_vehicles }
            }
            Some("fixed") if needs_vehicle_groups => return Err(invalid_value("grouping", "fixed")),
            Some("fixed") => {
                let path = config_utils::require(
                    config_utils::get_str(yaml_cfg, "groups_path")?, "groups_path")?;
                GroupingConfig::Fixed {
                    groups_path: config_utils::str_to_absolute_path(path, config_dir),
                }
            }
            Some(other) => return Err(invalid_value("grouping", other)),
        };

        let max_plans_per_agent = match config_utils::get_u64(yaml_cfg, "max_plans_per_agent")? {
            Some(0) => return Err(invalid_value("max_plans_per_agent", "0")),
            Some(max) => max as usize,
            None => defaults.max_plans_per_agent,
        };
        let max_joint_plans_per_composition =
            match config_utils::get_u64(yaml_cfg, "max_joint_plans_per_composition")? {
                Some(0) => return Err(invalid_value("max_joint_plans_per_composition", "0")),
                Some(max) => max as usize,
                None => defaults.max_joint_plans_per_composition,
            };

        let on_group_failure = match config_utils::get_str(yaml_cfg, "on_group_failure")? {
            None | Some("abort") => FailurePolicy::Abort,
            Some("drop_group") => FailurePolicy::DropGroup,
            Some(other) => return Err(invalid_value("on_group_failure", other)),
        };

        Ok(ReplanningConfig {
            seed,
            weight,
            conflict_solver,
            incompatibility,
            grouping,
            max_plans_per_agent,
            max_joint_plans_per_composition,
            on_group_failure,
        })
    }

    /// Fixed groups are read from disk here, so errors in the group file surface at setup time.
    pub fn grouping_policy(&self) -> Result<GroupingPolicy, ConfigError> {
        match &self.grouping {
            GroupingConfig::Fixed { groups_path } => GroupingPolicy::fixed_from_csv(groups_path),
            GroupingConfig::JointPlans { by_vehicles } =>
                Ok(GroupingPolicy::JointPlans { by_vehicles: *by_vehicles }),
        }
    }
}

fn invalid_value(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: String::from(field),
        value: String::from(value),
    }
}
