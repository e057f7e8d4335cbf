use std::collections::{BTreeSet, HashMap, HashSet};

use rand_isaac::Isaac64Rng;

use super::conflict_solver::{ConflictSolver, ConflictView, UnitKey};
use super::errors::SelectionError;
use super::incompatibility::IncompatiblePlansIdentifier;
use super::joint_plans::{JointPlanId, JointPlans};
use super::plan_record::PlanRecord;
use super::pointing_agent::PointingAgent;
use super::population::{AgentId, PlanId, Population};
use super::replanning_group::ReplanningGroup;
use super::weights::WeightFunction;


#[derive(PartialEq, Debug, Clone)]
pub struct SelectedPlan {
    pub agent_id: AgentId,
    pub plan_id: PlanId,
    pub joint_plan: Option<JointPlanId>,
}

/// The outcome of one group's selection: one plan per agent, in group order.
#[derive(PartialEq, Debug, Clone)]
pub struct GroupSelection {
    pub selected: Vec<SelectedPlan>,
    // joint plans selected as a whole, in order of their first member
    pub joint_plans: Vec<JointPlanId>,
    pub num_solver_calls: usize,
    pub num_pruned_records: usize,
}

impl GroupSelection {
    pub fn get_selected(&self, agent_id: &str) -> Option<&SelectedPlan> {
        self.selected.iter().find(|ss| ss.agent_id == agent_id)
    }
}

/// Selects one plan per agent of a group so that joint plans are taken all-or-nothing and no two
/// selected plans are incompatible.
///
/// Every agent starts out pointing at its highest-weight plan.  As long as some conflict remains
/// among the pointed plans (a joint plan only some of its members point at, or two pointed plans
/// flagged incompatible), the conflict solver prunes units of that conflict and the affected
/// agents move on to their next best plan.
pub struct CoalitionSelector {
    weight_fn: Box<dyn WeightFunction>,
    conflict_solver: ConflictSolver,
}

impl CoalitionSelector {
    pub fn new(weight_fn: Box<dyn WeightFunction>, conflict_solver: ConflictSolver)
               -> CoalitionSelector {
        CoalitionSelector { weight_fn, conflict_solver }
    }

    pub fn get_weight_fn(&self) -> &dyn WeightFunction {
        &*self.weight_fn
    }

    pub fn select_plans(&self, group: &ReplanningGroup, population: &Population,
                        joint_plans: &JointPlans, identifier: &dyn IncompatiblePlansIdentifier,
                        rng: &mut Isaac64Rng) -> Result<GroupSelection, SelectionError> {
        let mut run = SelectionRun::build(group, population, joint_plans, identifier,
                                          &*self.weight_fn, rng)?;
        run.resolve(&self.conflict_solver, rng)?;
        Ok(run.into_selection())
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
enum ConflictKey {
    // some, but not all, members point at the joint plan
    IncompleteJointPlan(usize),
    // two pointed records flagged by the identifier; the smaller index comes first
    Incompatible(usize, usize),
}

struct JointEntry {
    id: JointPlanId,
    num_members: usize,
    records: Vec<usize>,
}

/// State of one selection run.  Agents, records and joint plans are addressed by dense indices
/// assigned in group order.
struct SelectionRun<'a> {
    records: Vec<PlanRecord<'a>>,
    agents: Vec<PointingAgent>,
    pointed: Vec<usize>,
    joints: Vec<JointEntry>,
    joints_of_agent: Vec<Vec<usize>>,
    identifier: &'a dyn IncompatiblePlansIdentifier,
    live: BTreeSet<ConflictKey>,
    // joint plans that won against their members' alternatives
    upheld: HashSet<usize>,
    num_solver_calls: usize,
    num_pruned_records: usize,
}

impl<'a> SelectionRun<'a> {
    fn build(group: &ReplanningGroup, population: &'a Population, joint_plans: &'a JointPlans,
             identifier: &'a dyn IncompatiblePlansIdentifier, weight_fn: &dyn WeightFunction,
             rng: &mut Isaac64Rng) -> Result<SelectionRun<'a>, SelectionError> {
        let mut records = vec![];
        let mut agents = vec![];
        let mut joints: Vec<JointEntry> = vec![];
        let mut joint_idxs: HashMap<JointPlanId, usize> = HashMap::new();
        let mut agent_idxs: HashMap<&str, usize> = HashMap::new();

        for (ii, agent_id) in group.get_agent_ids().iter().enumerate() {
            let agent = match population.get_agent(agent_id) {
                Some(agent) => agent,
                None => return Err(SelectionError::UnknownAgent { agent_id: agent_id.clone() }),
            };
            agent_idxs.insert(agent_id.as_str(), ii);
            let pointing_agent = PointingAgent::new(
                ii, agent, group, weight_fn, rng, &mut records,
                |plan| {
                    let joint_plan = joint_plans.get_joint_plan_for(&plan.key())?;
                    let next_idx = joints.len();
                    let idx = *joint_idxs.entry(joint_plan.id).or_insert_with(|| {
                        joints.push(JointEntry {
                            id: joint_plan.id,
                            num_members: joint_plan.len(),
                            records: vec![],
                        });
                        next_idx
                    });
                    Some(idx)
                })?;
            agents.push(pointing_agent);
        }

        let mut joints_of_agent = vec![vec![]; agents.len()];
        for (rr, record) in records.iter().enumerate() {
            if let Some(jj) = record.get_joint_plan() {
                joints[jj].records.push(rr);
                joints_of_agent[record.get_agent_idx()].push(jj);
            }
        }
        for list in joints_of_agent.iter_mut() {
            list.sort_unstable();
        }

        // every member of a joint plan must be present, or it can't be pruned atomically
        for entry in &joints {
            if entry.records.len() == entry.num_members {
                continue;
            }
            let joint_plan = joint_plans.get(entry.id);
            let missing = joint_plan.and_then(|jp| {
                jp.members.keys().find(|member| match agent_idxs.get(member.as_str()) {
                    Some(agent_idx) => !entry.records.iter().any(
                        |rr| records[*rr].get_agent_idx() == *agent_idx),
                    None => true,
                })
            });
            return Err(SelectionError::MalformedJointPlan {
                joint_plan_id: entry.id.0,
                agent_id: missing.cloned().unwrap_or_default(),
            });
        }

        let mut pointed = vec![];
        for agent in agents.iter_mut() {
            pointed.push(agent.pointed_record(&records)?);
        }

        let mut run = SelectionRun {
            records,
            agents,
            pointed,
            joints,
            joints_of_agent,
            identifier,
            live: BTreeSet::new(),
            upheld: HashSet::new(),
            num_solver_calls: 0,
            num_pruned_records: 0,
        };
        for ii in 0..run.agents.len() {
            run.detect_conflicts_of(ii);
        }
        log::debug!("group of {} agents with {} records starts with {} conflicts",
                    run.agents.len(), run.records.len(), run.live.len());
        Ok(run)
    }

    fn is_pointed(&self, record_idx: usize) -> bool {
        self.pointed[self.records[record_idx].get_agent_idx()] == record_idx
    }

    fn unit_of(&self, record_idx: usize) -> UnitKey {
        match self.records[record_idx].get_joint_plan() {
            Some(jj) => UnitKey::Joint(jj),
            None => UnitKey::Individual(record_idx),
        }
    }

    fn unit_records(&self, unit: UnitKey) -> Vec<usize> {
        match unit {
            UnitKey::Joint(jj) => self.joints[jj].records.clone(),
            UnitKey::Individual(rr) => vec![rr],
        }
    }

    fn joint_plan_is_incomplete(&self, joint_idx: usize) -> bool {
        let recs = &self.joints[joint_idx].records;
        // joint plans are pruned as a whole, so checking one record is enough
        if !self.records[recs[0]].is_feasible() {
            return false;
        }
        let num_pointing = recs.iter().filter(|rr| self.is_pointed(**rr)).count();
        num_pointing > 0 && num_pointing < recs.len()
    }

    fn is_live(&self, key: ConflictKey) -> bool {
        match key {
            ConflictKey::IncompleteJointPlan(jj) => self.joint_plan_is_incomplete(jj),
            ConflictKey::Incompatible(aa, bb) => {
                self.records[aa].is_feasible() && self.records[bb].is_feasible() &&
                    self.is_pointed(aa) && self.is_pointed(bb)
            }
        }
    }

    /// Adds the live conflicts the agent's current pointer takes part in.
    fn detect_conflicts_of(&mut self, agent_idx: usize) {
        for jj in self.joints_of_agent[agent_idx].clone() {
            if self.joint_plan_is_incomplete(jj) {
                self.live.insert(ConflictKey::IncompleteJointPlan(jj));
            }
        }

        if self.identifier.never_incompatible() {
            return;
        }
        let own = self.pointed[agent_idx];
        let own_plan = self.records[own].get_plan();
        // includes the agent itself: a plan may be flagged incompatible with itself
        for other in self.pointed.iter() {
            if self.identifier.are_incompatible(own_plan, self.records[*other].get_plan()) {
                let key = ConflictKey::Incompatible(own.min(*other), own.max(*other));
                self.live.insert(key);
            }
        }
    }

    fn conflict_units(&self, key: ConflictKey) -> Vec<UnitKey> {
        let mut units = BTreeSet::new();
        match key {
            ConflictKey::IncompleteJointPlan(jj) => {
                units.insert(UnitKey::Joint(jj));
                for rr in &self.joints[jj].records {
                    let pointed = self.pointed[self.records[*rr].get_agent_idx()];
                    if pointed != *rr {
                        units.insert(self.unit_of(pointed));
                    }
                }
            }
            ConflictKey::Incompatible(aa, bb) => {
                units.insert(self.unit_of(aa));
                units.insert(self.unit_of(bb));
            }
        }
        units.into_iter().collect()
    }

    fn resolve(&mut self, solver: &ConflictSolver, rng: &mut Isaac64Rng)
               -> Result<(), SelectionError> {
        while let Some(key) = self.live.pop_first() {
            // conflicts are dropped lazily once pointers have moved on
            if !self.is_live(key) {
                continue;
            }

            let units = self.conflict_units(key);
            let unit_records = units.iter().map(|uu| self.unit_records(*uu)).collect();
            let joint = match key {
                ConflictKey::IncompleteJointPlan(jj) => Some(jj),
                ConflictKey::Incompatible(..) => None,
            };
            let joint_pos = joint.and_then(
                |jj| units.iter().position(|uu| *uu == UnitKey::Joint(jj)));
            let is_upheld = joint.map_or(false, |jj| self.upheld.contains(&jj));

            let pruned = {
                let mut view = ConflictView::new(units, unit_records, &self.pointed,
                                                 &mut self.records);
                if let Some(pos) = joint_pos {
                    view = view.around_joint_plan(pos);
                }
                match joint_pos {
                    // once a joint plan has won, members that still look elsewhere follow it
                    Some(pos) if is_upheld => {
                        view.prune_rivals_of(pos);
                    }
                    _ => {
                        solver.attempt_to_solve_conflict(&mut view, rng);
                        self.num_solver_calls += 1;
                    }
                }
                view.into_pruned()
            };
            // every unit of a live conflict holds a pointed record, so only a solver that
            // ignores the conflict ends up here
            if pruned.is_empty() {
                log::error!("solver {:?} left conflict {:?} untouched", solver, key);
                return Err(SelectionError::NonProgress { conflict: format!("{:?}", key) });
            }
            self.num_pruned_records += pruned.len();

            if let Some(jj) = joint {
                if self.records[self.joints[jj].records[0]].is_feasible() {
                    self.upheld.insert(jj);
                }
            }

            self.repoint_after_pruning(&pruned)?;
            if self.is_live(key) {
                self.live.insert(key);
            }
        }
        Ok(())
    }

    fn repoint_after_pruning(&mut self, pruned: &[usize]) -> Result<(), SelectionError> {
        let mut moved = BTreeSet::new();
        for rr in pruned {
            let agent_idx = self.records[*rr].get_agent_idx();
            if self.pointed[agent_idx] == *rr {
                moved.insert(agent_idx);
            } else {
                self.agents[agent_idx].discard(*rr);
            }
        }

        for agent_idx in &moved {
            let agent = &mut self.agents[*agent_idx];
            self.pointed[*agent_idx] = match agent.pointed_record(&self.records) {
                Ok(rr) => rr,
                Err(err) => {
                    log::warn!("agent {} ran out of feasible plans", agent.get_agent_id());
                    return Err(err);
                }
            };
        }
        for agent_idx in moved {
            self.detect_conflicts_of(agent_idx);
        }
        Ok(())
    }

    fn into_selection(self) -> GroupSelection {
        let mut selected = vec![];
        let mut selected_joints = vec![];
        for (agent, pointed) in self.agents.iter().zip(self.pointed.iter()) {
            let record = &self.records[*pointed];
            let joint_plan = record.get_joint_plan().map(|jj| self.joints[jj].id);
            if let Some(jj) = record.get_joint_plan() {
                debug_assert!(self.joints[jj].records.iter().all(|rr| self.is_pointed(*rr)));
                let jp_id = self.joints[jj].id;
                if !selected_joints.contains(&jp_id) {
                    selected_joints.push(jp_id);
                }
            }
            selected.push(SelectedPlan {
                agent_id: String::from(agent.get_agent_id()),
                plan_id: record.get_plan().id,
                joint_plan,
            });
        }

        GroupSelection {
            selected,
            joint_plans: selected_joints,
            num_solver_calls: self.num_solver_calls,
            num_pruned_records: self.num_pruned_records,
        }
    }
}
