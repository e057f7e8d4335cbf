use super::joint_plans::JointPlans;
use super::population::{Agent, PlanKey, Population};


/// Builds small populations for tests.  Plans get ids in the order their scores are given.
pub struct PopulationBuilder {
    agents: Vec<Agent>,
    joints: Vec<Vec<(String, u32)>>,
}

impl PopulationBuilder {
    pub fn new() -> PopulationBuilder {
        PopulationBuilder {
            agents: vec![],
            joints: vec![],
        }
    }

    pub fn agent(mut self, id: &str, scores: &[f64]) -> PopulationBuilder {
        let mut agent = Agent::new(id);
        for score in scores {
            agent.add_plan(Some(*score), vec![]);
        }
        self.agents.push(agent);
        self
    }

    pub fn unscored_plan(mut self, id: &str) -> PopulationBuilder {
        if let Some(agent) = self.agents.iter_mut().find(|aa| aa.id == id) {
            agent.add_plan(None, vec![]);
        }
        self
    }

    /// Adds a plan driving the given vehicle to an already-declared agent.
    pub fn vehicle_plan(mut self, id: &str, score: f64, vehicle_id: &str) -> PopulationBuilder {
        if let Some(agent) = self.agents.iter_mut().find(|aa| aa.id == id) {
            agent.add_plan(Some(score), vec![String::from(vehicle_id)]);
        }
        self
    }

    pub fn joint(mut self, members: &[(&str, u32)]) -> PopulationBuilder {
        self.joints.push(members.iter().map(|(aa, pp)| (String::from(*aa), *pp)).collect());
        self
    }

    pub fn build(self) -> (Population, JointPlans) {
        let mut population = Population::new();
        for agent in self.agents {
            population.add_agent(agent);
        }
        let mut joint_plans = JointPlans::new();
        for members in self.joints {
            let keys: Vec<PlanKey> = members.iter().map(|(aa, pp)| PlanKey::new(aa, *pp))
                                                   .collect();
            if let Err(err) = joint_plans.add_joint_plan(&keys, &population) {
                panic!("bad joint plan in test setup: {:?}", err);
            }
        }
        (population, joint_plans)
    }
}
