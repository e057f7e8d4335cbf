use std::collections::BTreeMap;
use std::fmt;


pub type AgentId = String;
pub type PlanId = u32;

/// Identifies one plan across the whole population.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Clone)]
pub struct PlanKey {
    pub agent_id: AgentId,
    pub plan_id: PlanId,
}

impl PlanKey {
    pub fn new(agent_id: &str, plan_id: PlanId) -> PlanKey {
        PlanKey {
            agent_id: String::from(agent_id),
            plan_id,
        }
    }
}

impl fmt::Display for PlanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.agent_id, self.plan_id)
    }
}

/// A candidate plan of one agent.  The selection code only ever reads plans.
#[derive(PartialEq, Debug, Clone)]
pub struct Plan {
    pub id: PlanId,
    pub agent_id: AgentId,
    // None until the plan has been executed and scored at least once
    pub score: Option<f64>,
    // vehicles this plan drives; used to detect plans competing for a vehicle
    pub vehicle_ids: Vec<String>,
}

impl Plan {
    pub fn key(&self) -> PlanKey {
        PlanKey::new(&self.agent_id, self.id)
    }

    pub fn uses_vehicle(&self, vehicle_id: &str) -> bool {
        self.vehicle_ids.iter().any(|vv| vv == vehicle_id)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    plans: Vec<Plan>,
    selected_plan: Option<PlanId>,
    next_plan_id: PlanId,
}

impl Agent {
    pub fn new(id: &str) -> Agent {
        Agent {
            id: String::from(id),
            plans: vec![],
            selected_plan: None,
            next_plan_id: 0,
        }
    }

    /// Adds a plan and returns its id.  Ids are never reused, even after removal.
    pub fn add_plan(&mut self, score: Option<f64>, vehicle_ids: Vec<String>) -> PlanId {
        let id = self.next_plan_id;
        self.next_plan_id += 1;
        self.plans.push(Plan {
            id,
            agent_id: self.id.clone(),
            score,
            vehicle_ids,
        });
        id
    }

    pub fn get_plans(&self) -> &Vec<Plan> {
        &self.plans
    }

    pub fn get_plan(&self, plan_id: PlanId) -> Option<&Plan> {
        self.plans.iter().find(|pp| pp.id == plan_id)
    }

    pub fn has_plan(&self, plan_id: PlanId) -> bool {
        self.get_plan(plan_id).is_some()
    }

    pub fn num_plans(&self) -> usize {
        self.plans.len()
    }

    pub fn set_score(&mut self, plan_id: PlanId, score: f64) -> bool {
        match self.plans.iter_mut().find(|pp| pp.id == plan_id) {
            Some(plan) => {
                plan.score = Some(score);
                true
            }
            None => false,
        }
    }

    pub fn remove_plan(&mut self, plan_id: PlanId) -> Option<Plan> {
        let idx = self.plans.iter().position(|pp| pp.id == plan_id)?;
        if self.selected_plan == Some(plan_id) {
            self.selected_plan = None;
        }
        Some(self.plans.remove(idx))
    }

    pub fn get_selected_plan_id(&self) -> Option<PlanId> {
        self.selected_plan
    }

    pub fn get_selected_plan(&self) -> Option<&Plan> {
        match self.selected_plan {
            Some(plan_id) => self.get_plan(plan_id),
            None => None,
        }
    }

    pub fn set_selected_plan(&mut self, plan_id: PlanId) -> bool {
        if !self.has_plan(plan_id) {
            return false;
        }
        self.selected_plan = Some(plan_id);
        true
    }
}

/// All agents of a scenario.  Agents are kept sorted by id so that every traversal is
/// reproducible.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Population {
    agents: BTreeMap<AgentId, Agent>,
}

impl Population {
    pub fn new() -> Population {
        Population {
            agents: BTreeMap::new(),
        }
    }

    /// Returns false if an agent with the same id was already present.
    pub fn add_agent(&mut self, agent: Agent) -> bool {
        if self.agents.contains_key(&agent.id) {
            return false;
        }
        self.agents.insert(agent.id.clone(), agent);
        true
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.get(agent_id)
    }

    pub fn get_agent_mut(&mut self, agent_id: &str) -> Option<&mut Agent> {
        self.agents.get_mut(agent_id)
    }

    pub fn get_plan(&self, key: &PlanKey) -> Option<&Plan> {
        self.agents.get(&key.agent_id)?.get_plan(key.plan_id)
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agents.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    pub fn num_plans(&self) -> usize {
        self.agents.values().map(|aa| aa.num_plans()).sum()
    }
}
