use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use super::population::{AgentId, PlanId, PlanKey, Population};


#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct JointPlanId(pub u64);

impl fmt::Display for JointPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jp{}", self.0)
    }
}

/// A set of individual plans of different agents that can only be selected together.
#[derive(PartialEq, Debug, Clone)]
pub struct JointPlan {
    pub id: JointPlanId,
    // one plan per participating agent
    pub members: BTreeMap<AgentId, PlanId>,
}

impl JointPlan {
    pub fn member_keys(&self) -> impl Iterator<Item = PlanKey> + '_ {
        self.members.iter().map(|(agent_id, plan_id)| PlanKey::new(agent_id, *plan_id))
    }

    pub fn has_member(&self, agent_id: &str) -> bool {
        self.members.contains_key(agent_id)
    }

    /// The sorted ids of the participating agents.
    pub fn composition(&self) -> Vec<AgentId> {
        self.members.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[derive(PartialEq, Debug, Clone, Error)]
pub enum JointPlanError {
    #[error("a joint plan needs plans of at least two agents")]
    TooFewMembers,
    #[error("plan {0} is already linked")]
    AlreadyLinked(PlanKey),
    #[error("plan {0} is not in the population")]
    UnknownPlan(PlanKey),
}

/// Links individual plans to the joint plans they belong to.
#[derive(Debug, Clone, Default)]
pub struct JointPlans {
    joint_plans: BTreeMap<JointPlanId, JointPlan>,
    by_plan: HashMap<PlanKey, JointPlanId>,
    next_id: u64,
}

impl JointPlans {
    pub fn new() -> JointPlans {
        JointPlans {
            joint_plans: BTreeMap::new(),
            by_plan: HashMap::new(),
            next_id: 0,
        }
    }

    /// Links the given plans into a new joint plan.  Every plan must exist in the population and
    /// may belong to at most one joint plan.
    pub fn add_joint_plan(&mut self, members: &[PlanKey], population: &Population)
                          -> Result<JointPlanId, JointPlanError> {
        let mut member_map = BTreeMap::new();
        for key in members {
            if population.get_plan(key).is_none() {
                return Err(JointPlanError::UnknownPlan(key.clone()));
            }
            if self.by_plan.contains_key(key) {
                return Err(JointPlanError::AlreadyLinked(key.clone()));
            }
            // two plans of the same agent can't be part of one joint plan
            if member_map.insert(key.agent_id.clone(), key.plan_id).is_some() {
                return Err(JointPlanError::AlreadyLinked(key.clone()));
            }
        }
        if member_map.len() < 2 {
            return Err(JointPlanError::TooFewMembers);
        }

        let id = JointPlanId(self.next_id);
        self.next_id += 1;
        for key in members {
            self.by_plan.insert(key.clone(), id);
        }
        self.joint_plans.insert(id, JointPlan { id, members: member_map });
        Ok(id)
    }

    pub fn get(&self, id: JointPlanId) -> Option<&JointPlan> {
        self.joint_plans.get(&id)
    }

    pub fn get_joint_plan_for(&self, key: &PlanKey) -> Option<&JointPlan> {
        let id = self.by_plan.get(key)?;
        self.joint_plans.get(id)
    }

    /// Unlinks a joint plan.  The member plans themselves stay in the population.
    pub fn remove_joint_plan(&mut self, id: JointPlanId) -> Option<JointPlan> {
        let joint_plan = self.joint_plans.remove(&id)?;
        for key in joint_plan.member_keys() {
            self.by_plan.remove(&key);
        }
        Some(joint_plan)
    }

    pub fn joint_plans_of_agent(&self, agent_id: &str) -> Vec<&JointPlan> {
        self.joint_plans.values().filter(|jp| jp.has_member(agent_id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JointPlan> {
        self.joint_plans.values()
    }

    pub fn len(&self) -> usize {
        self.joint_plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joint_plans.is_empty()
    }
}
