use std::cmp::Ordering;

use super::population::Plan;


/// One candidate plan of one agent, as seen by a single selection run.
#[derive(Debug, Clone)]
pub struct PlanRecord<'a> {
    agent_idx: usize,
    plan: &'a Plan,
    weight: f64,
    feasible: bool,
    // dense index of the joint plan this plan belongs to, if any
    joint_plan: Option<usize>,
}

impl<'a> PlanRecord<'a> {
    pub fn new(agent_idx: usize, plan: &'a Plan, weight: f64, joint_plan: Option<usize>)
               -> PlanRecord<'a> {
        PlanRecord {
            agent_idx,
            plan,
            weight,
            feasible: true,
            joint_plan,
        }
    }

    pub fn get_agent_idx(&self) -> usize {
        self.agent_idx
    }

    pub fn get_plan(&self) -> &'a Plan {
        self.plan
    }

    pub fn get_weight(&self) -> f64 {
        self.weight
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn get_joint_plan(&self) -> Option<usize> {
        self.joint_plan
    }

    /// Returns true if this call changed the flag.  There is no way back.
    pub fn mark_infeasible(&mut self) -> bool {
        let changed = self.feasible;
        self.feasible = false;
        changed
    }
}

/// Heap priority of a record: higher weight first, and among equal weights the record created
/// first (i.e. the agent's earlier plan).
#[derive(Clone, Copy, Debug)]
pub struct RecordPriority {
    weight: f64,
    record_idx: usize,
}

impl RecordPriority {
    pub fn new(weight: f64, record_idx: usize) -> RecordPriority {
        RecordPriority { weight, record_idx }
    }
}

impl Ord for RecordPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        // weights are checked for NaN before records are built
        match self.weight.partial_cmp(&other.weight) {
            Some(Ordering::Equal) | None => other.record_idx.cmp(&self.record_idx),
            Some(ordering) => ordering,
        }
    }
}

impl PartialOrd for RecordPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RecordPriority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RecordPriority {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasibility_is_permanent() {
        let plan = Plan { id: 0, agent_id: String::from("a"), score: Some(1.), vehicle_ids: vec![] };
        let mut record = PlanRecord::new(0, &plan, 1., None);
        assert!(record.is_feasible());
        assert!(record.mark_infeasible());
        assert!(!record.mark_infeasible());
        assert!(!record.is_feasible());
    }

    #[test]
    fn test_priority_order() {
        let low = RecordPriority::new(1., 0);
        let high = RecordPriority::new(2., 1);
        let high_later = RecordPriority::new(2., 2);
        let infinite = RecordPriority::new(f64::INFINITY, 3);

        assert!(high > low);
        assert!(high > high_later);
        assert!(infinite > high);
        assert_eq!(high, RecordPriority::new(2., 1));
    }
}
