use priority_queue::PriorityQueue;
use rand_isaac::Isaac64Rng;

use super::errors::SelectionError;
use super::plan_record::{PlanRecord, RecordPriority};
use super::population::{Agent, AgentId, Plan};
use super::replanning_group::ReplanningGroup;
use super::weights::WeightFunction;


/// Holds one agent's plan records in a max-heap by weight, and points at the best one that is
/// still feasible.
pub struct PointingAgent {
    agent_idx: usize,
    agent_id: AgentId,
    records: Vec<usize>,
    // the queue tracks item positions itself, so arbitrary removal is O(log n)
    heap: PriorityQueue<usize, RecordPriority>,
}

impl PointingAgent {
    /// Builds a record for every plan of the agent and appends it to `records`.  `joint_plan_of`
    /// gives the run-local index of the joint plan a plan belongs to.
    pub fn new<'a, F>(agent_idx: usize, agent: &'a Agent, group: &ReplanningGroup,
                      weight_fn: &dyn WeightFunction, rng: &mut Isaac64Rng,
                      records: &mut Vec<PlanRecord<'a>>, mut joint_plan_of: F)
                      -> Result<PointingAgent, SelectionError>
        where F: FnMut(&'a Plan) -> Option<usize>
    {
        let mut own_records = vec![];
        let mut heap = PriorityQueue::new();
        for plan in agent.get_plans() {
            let weight = weight_fn.weight(plan, group, rng);
            if weight.is_nan() {
                return Err(SelectionError::InvalidWeight {
                    agent_id: agent.id.clone(),
                    plan_id: plan.id,
                });
            }
            let record_idx = records.len();
            records.push(PlanRecord::new(agent_idx, plan, weight, joint_plan_of(plan)));
            own_records.push(record_idx);
            heap.push(record_idx, RecordPriority::new(weight, record_idx));
        }

        Ok(PointingAgent {
            agent_idx,
            agent_id: agent.id.clone(),
            records: own_records,
            heap,
        })
    }

    pub fn get_agent_idx(&self) -> usize {
        self.agent_idx
    }

    pub fn get_agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn get_records(&self) -> &Vec<usize> {
        &self.records
    }

    /// The top of the heap, feasible or not.
    pub fn peek(&self) -> Option<usize> {
        self.heap.peek().map(|(record_idx, _)| *record_idx)
    }

    /// Drops infeasible records off the top of the heap and returns the best feasible one.
    /// Dropped records are gone for good, which is fine because feasibility is never restored.
    pub fn pointed_record(&mut self, records: &[PlanRecord]) -> Result<usize, SelectionError> {
        while let Some(record_idx) = self.peek() {
            if records[record_idx].is_feasible() {
                return Ok(record_idx);
            }
            self.heap.pop();
        }
        Err(SelectionError::ExhaustedAgent { agent_id: self.agent_id.clone() })
    }

    pub fn get_pointed_plan<'a>(&mut self, records: &[PlanRecord<'a>])
                                -> Result<&'a Plan, SelectionError> {
        let record_idx = self.pointed_record(records)?;
        Ok(records[record_idx].get_plan())
    }

    /// Removes a record from anywhere in the heap.  Returns false if it was already gone.
    pub fn discard(&mut self, record_idx: usize) -> bool {
        self.heap.remove(&record_idx).is_some()
    }

    pub fn num_remaining(&self) -> usize {
        self.heap.len()
    }
}
