use rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use rayon::prelude::*;

use super::coalition_selector::{CoalitionSelector, GroupSelection};
use super::config::ReplanningConfig;
use super::errors::SelectionError;
use super::incompatibility::IncompatiblePlansIdentifier;
use super::joint_plans::JointPlans;
use super::plan_removal::ExtraPlanRemover;
use super::population::Population;
use super::replanning_group::ReplanningGroup;


/// What to do with a group whose selection fails.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FailurePolicy {
    /// Fail the whole iteration, leaving every selection untouched.
    Abort,
    /// Log the error and keep the group's previous selection.
    DropGroup,
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct IterationReport {
    pub num_groups: usize,
    pub num_failed_groups: usize,
    pub num_selected_joint_plans: usize,
    pub num_solver_calls: usize,
}

/// Drives selection and plan removal over all groups of a population, one iteration at a time.
pub struct GroupReplanner {
    selector: CoalitionSelector,
    identifier: Box<dyn IncompatiblePlansIdentifier>,
    remover: ExtraPlanRemover,
    failure_policy: FailurePolicy,
    seed: u64,
}

impl GroupReplanner {
    pub fn new(selector: CoalitionSelector, identifier: Box<dyn IncompatiblePlansIdentifier>,
               remover: ExtraPlanRemover, failure_policy: FailurePolicy, seed: u64)
               -> GroupReplanner {
        GroupReplanner {
            selector,
            identifier,
            remover,
            failure_policy,
            seed,
        }
    }

    pub fn from_config(cfg: &ReplanningConfig) -> GroupReplanner {
        GroupReplanner::new(
            CoalitionSelector::new(cfg.weight.build(), cfg.conflict_solver),
            cfg.incompatibility.build(),
            ExtraPlanRemover::new(cfg.max_plans_per_agent, cfg.max_joint_plans_per_composition),
            cfg.on_group_failure,
            cfg.seed,
        )
    }

    /// Every group gets its own random stream, so results don't depend on how rayon schedules
    /// the groups.
    pub fn group_rng(&self, iteration: u32, group_idx: usize) -> Isaac64Rng {
        let mut seed = self.seed;
        seed ^= (iteration as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        seed ^= (group_idx as u64 + 1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        Isaac64Rng::seed_from_u64(seed)
    }

    /// Selects plans for all groups in parallel.  Results are in group order.
    pub fn select_all(&self, groups: &[ReplanningGroup], population: &Population,
                      joint_plans: &JointPlans, iteration: u32)
                      -> Vec<Result<GroupSelection, SelectionError>> {
        groups.par_iter().enumerate().map(|(ii, group)| {
            let mut rng = self.group_rng(iteration, ii);
            self.selector.select_plans(group, population, joint_plans, &*self.identifier,
                                       &mut rng)
        }).collect()
    }

    /// Selects a plan for every agent and marks it as the agent's selected plan.
    pub fn run_iteration(&self, groups: &[ReplanningGroup], population: &mut Population,
                         joint_plans: &JointPlans, iteration: u32)
                         -> Result<IterationReport, SelectionError> {
        log::info!("selecting plans for {} groups in iteration {}", groups.len(), iteration);
        let results = self.select_all(groups, population, joint_plans, iteration);

        // with abort, nothing is applied unless every group succeeded
        if self.failure_policy == FailurePolicy::Abort {
            if let Some(Err(err)) = results.iter().find(|res| res.is_err()) {
                log::error!("aborting iteration {}: {}", iteration, err);
                return Err(err.clone());
            }
        }

        let mut report = IterationReport {
            num_groups: groups.len(),
            ..IterationReport::default()
        };
        for (group, result) in groups.iter().zip(results) {
            let selection = match result {
                Ok(selection) => selection,
                Err(err) => {
                    log::error!("dropping group of {:?}: {}", group.get_agent_ids(), err);
                    report.num_failed_groups += 1;
                    continue;
                }
            };
            report.num_selected_joint_plans += selection.joint_plans.len();
            report.num_solver_calls += selection.num_solver_calls;
            for selected in &selection.selected {
                if let Some(agent) = population.get_agent_mut(&selected.agent_id) {
                    agent.set_selected_plan(selected.plan_id);
                }
            }
        }
        log::info!("iteration {}: {} joint plans selected, {} solver calls, {} groups failed",
                   iteration, report.num_selected_joint_plans, report.num_solver_calls,
                   report.num_failed_groups);
        Ok(report)
    }

    /// Caps stored plans in every group.  Meant to run after the selected plans were scored.
    /// Returns the number of removed plans.
    pub fn remove_extra_plans(&self, groups: &[ReplanningGroup], population: &mut Population,
                              joint_plans: &mut JointPlans, iteration: u32)
                              -> Result<usize, SelectionError> {
        let mut num_removed = 0;
        for (ii, group) in groups.iter().enumerate() {
            let mut rng = self.group_rng(iteration, ii);
            match self.remover.remove_extra_plans(group, population, joint_plans,
                                                  self.selector.get_weight_fn(), &mut rng) {
                Ok(removed) => num_removed += removed.len(),
                Err(err) if self.failure_policy == FailurePolicy::DropGroup => {
                    log::error!("skipping plan removal for {:?}: {}", group.get_agent_ids(), err);
                }
                Err(err) => return Err(err),
            }
        }
        log::info!("removed {} extra plans in iteration {}", num_removed, iteration);
        Ok(num_removed)
    }
}
