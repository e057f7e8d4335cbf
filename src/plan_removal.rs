use std::collections::HashMap;

use itertools::Itertools;
use rand_isaac::Isaac64Rng;

use super::errors::SelectionError;
use super::joint_plans::{JointPlan, JointPlanId, JointPlans};
use super::population::{PlanKey, Population};
use super::replanning_group::ReplanningGroup;
use super::weights::WeightFunction;


/// Caps the number of plans kept in memory, once per iteration after scoring.  Joint plans are
/// removed as a whole, and plans that are currently selected are never removed.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct ExtraPlanRemover {
    max_plans_per_agent: usize,
    max_joint_plans_per_composition: usize,
}

impl ExtraPlanRemover {
    pub fn new(max_plans_per_agent: usize, max_joint_plans_per_composition: usize)
               -> ExtraPlanRemover {
        ExtraPlanRemover {
            max_plans_per_agent,
            max_joint_plans_per_composition,
        }
    }

    /// Returns the keys of the removed plans, in the order they were removed.
    pub fn remove_extra_plans(&self, group: &ReplanningGroup, population: &mut Population,
                              joint_plans: &mut JointPlans, weight_fn: &dyn WeightFunction,
                              rng: &mut Isaac64Rng) -> Result<Vec<PlanKey>, SelectionError> {
        let mut weights = HashMap::new();
        for agent_id in group.get_agent_ids() {
            let agent = match population.get_agent(agent_id) {
                Some(agent) => agent,
                None => return Err(SelectionError::UnknownAgent { agent_id: agent_id.clone() }),
            };
            for plan in agent.get_plans() {
                weights.insert(plan.key(), weight_fn.weight(plan, group, rng));
            }
        }

        let mut removed = vec![];
        self.cap_compositions(group, population, joint_plans, &weights, &mut removed)?;
        self.cap_agents(group, population, joint_plans, &weights, &mut removed)?;
        if removed.len() > 0 {
            log::debug!("removed {} plans from a group of {}", removed.len(), group.len());
        }
        Ok(removed)
    }

    fn cap_compositions(&self, group: &ReplanningGroup, population: &mut Population,
                        joint_plans: &mut JointPlans, weights: &HashMap<PlanKey, f64>,
                        removed: &mut Vec<PlanKey>) -> Result<(), SelectionError> {
        let by_composition = joint_plans.iter()
            .filter(|jp| jp.members.keys().any(|id| group.contains(id)))
            .map(|jp| (jp.composition(), jp.id))
            .into_group_map();

        for (composition, ids) in by_composition.into_iter().sorted() {
            if ids.len() <= self.max_joint_plans_per_composition {
                continue;
            }
            let mut ranked = vec![];
            for id in ids {
                if let Some(jp) = joint_plans.get(id) {
                    let protected = is_selected(jp, population);
                    ranked.push((mean_weight(jp, weights)?, id, protected));
                }
            }
            // best first; older joint plans rank first among equals
            ranked.sort_by(|aa, bb| bb.0.partial_cmp(&aa.0)
                                        .unwrap_or(std::cmp::Ordering::Equal)
                                        .then(aa.1.cmp(&bb.1)));

            let mut num_kept = ranked.len();
            for (_, id, protected) in ranked.iter().rev() {
                if num_kept <= self.max_joint_plans_per_composition {
                    break;
                }
                if *protected {
                    continue;
                }
                remove_joint_plan(*id, population, joint_plans, removed);
                num_kept -= 1;
            }
            if num_kept > self.max_joint_plans_per_composition {
                log::warn!("composition {:?} keeps {} joint plans, all selected", composition,
                           num_kept);
            }
        }
        Ok(())
    }

    fn cap_agents(&self, group: &ReplanningGroup, population: &mut Population,
                  joint_plans: &mut JointPlans, weights: &HashMap<PlanKey, f64>,
                  removed: &mut Vec<PlanKey>) -> Result<(), SelectionError> {
        for agent_id in group.get_agent_ids() {
            loop {
                let agent = match population.get_agent(agent_id) {
                    Some(agent) => agent,
                    None => break,
                };
                if agent.num_plans() <= self.max_plans_per_agent {
                    break;
                }

                let mut worst: Option<(f64, PlanKey)> = None;
                for plan in agent.get_plans() {
                    let key = plan.key();
                    if agent.get_selected_plan_id() == Some(plan.id) {
                        continue;
                    }
                    let weight = match joint_plans.get_joint_plan_for(&key) {
                        Some(jp) if is_selected(jp, population) => continue,
                        Some(jp) => mean_weight(jp, weights)?,
                        None => weights.get(&key).cloned().unwrap_or(f64::INFINITY),
                    };
                    let is_worse = match &worst {
                        Some((worst_weight, _)) => weight <= *worst_weight,
                        None => true,
                    };
                    if is_worse {
                        worst = Some((weight, key));
                    }
                }

                let key = match worst {
                    Some((_, key)) => key,
                    None => {
                        log::warn!("agent {} has {} plans but none can be removed", agent_id,
                                   agent.num_plans());
                        break;
                    }
                };
                match joint_plans.get_joint_plan_for(&key).map(|jp| jp.id) {
                    Some(id) => remove_joint_plan(id, population, joint_plans, removed),
                    None => {
                        if let Some(agent) = population.get_agent_mut(agent_id) {
                            agent.remove_plan(key.plan_id);
                        }
                        removed.push(key);
                    }
                }
            }
        }
        Ok(())
    }
}

fn is_selected(joint_plan: &JointPlan, population: &Population) -> bool {
    joint_plan.members.iter().any(|(agent_id, plan_id)| {
        match population.get_agent(agent_id) {
            Some(agent) => agent.get_selected_plan_id() == Some(*plan_id),
            None => false,
        }
    })
}

fn mean_weight(joint_plan: &JointPlan, weights: &HashMap<PlanKey, f64>)
               -> Result<f64, SelectionError> {
    let mut total = 0.;
    for key in joint_plan.member_keys() {
        match weights.get(&key) {
            Some(weight) => total += weight,
            None => return Err(SelectionError::MalformedJointPlan {
                joint_plan_id: joint_plan.id.0,
                agent_id: key.agent_id,
            }),
        }
    }
    Ok(total / joint_plan.len() as f64)
}

fn remove_joint_plan(id: JointPlanId, population: &mut Population, joint_plans: &mut JointPlans,
                     removed: &mut Vec<PlanKey>) {
    if let Some(joint_plan) = joint_plans.remove_joint_plan(id) {
        for key in joint_plan.member_keys() {
            if let Some(agent) = population.get_agent_mut(&key.agent_id) {
                agent.remove_plan(key.plan_id);
            }
            removed.push(key);
        }
    }
}
