use std::cmp::Ordering;

use rand::Rng;
use rand_isaac::Isaac64Rng;

use super::plan_record::PlanRecord;


/// Something that is selected or pruned as a whole: either a joint plan (all member records at
/// once) or a single individual plan record.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum UnitKey {
    Joint(usize),
    Individual(usize),
}

/// The part of a selection run a conflict solver is allowed to touch: the competing units of one
/// conflict.  Pruning goes through unit positions, so a solver can't reach outside its conflict.
///
/// In a plain conflict every unit competes with every other.  When the conflict is a joint plan
/// that only some of its members point at, the other members' pointed units compete with the
/// joint plan alone, not with each other.
pub struct ConflictView<'v, 'a> {
    units: Vec<UnitKey>,
    unit_records: Vec<Vec<usize>>,
    pointed: &'v [usize],
    records: &'v mut [PlanRecord<'a>],
    joint_pos: Option<usize>,
    pruned: Vec<usize>,
}

impl<'v, 'a> ConflictView<'v, 'a> {
    pub fn new(units: Vec<UnitKey>, unit_records: Vec<Vec<usize>>, pointed: &'v [usize],
               records: &'v mut [PlanRecord<'a>]) -> ConflictView<'v, 'a> {
        ConflictView {
            units,
            unit_records,
            pointed,
            records,
            joint_pos: None,
            pruned: vec![],
        }
    }

    /// Marks the unit at `unit_pos` as the incompletely pointed joint plan of the conflict.
    pub fn around_joint_plan(mut self, unit_pos: usize) -> ConflictView<'v, 'a> {
        self.joint_pos = Some(unit_pos);
        self
    }

    pub fn incomplete_joint_plan(&self) -> Option<usize> {
        self.joint_pos
    }

    /// Positions of the units that can't be selected together with the unit at `unit_pos`.
    pub fn rivals_of(&self, unit_pos: usize) -> Vec<usize> {
        match self.joint_pos {
            Some(joint_pos) if joint_pos != unit_pos => vec![joint_pos],
            _ => (0..self.units.len()).filter(|pos| *pos != unit_pos).collect(),
        }
    }

    pub fn units(&self) -> &Vec<UnitKey> {
        &self.units
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// Mean weight over all records of the unit at position `unit_pos`.
    pub fn mean_weight(&self, unit_pos: usize) -> f64 {
        let recs = &self.unit_records[unit_pos];
        let total: f64 = recs.iter().map(|rr| self.records[*rr].get_weight()).sum();
        total / recs.len() as f64
    }

    /// Agents whose pointed record lies in the conflict, with the position of the unit they point
    /// into and the weight of their pointed record, in group order.
    pub fn pointing_agents(&self) -> Vec<(usize, usize, f64)> {
        let mut agents = vec![];
        for (unit_pos, recs) in self.unit_records.iter().enumerate() {
            for rr in recs {
                let record = &self.records[*rr];
                if self.pointed[record.get_agent_idx()] == *rr {
                    agents.push((record.get_agent_idx(), unit_pos, record.get_weight()));
                }
            }
        }
        agents.sort_by_key(|(agent_idx, _, _)| *agent_idx);
        agents.dedup_by_key(|(agent_idx, _, _)| *agent_idx);
        agents
    }

    /// Marks every record of the unit infeasible.  Returns how many records changed.
    pub fn prune_unit(&mut self, unit_pos: usize) -> usize {
        let mut num_changed = 0;
        for rr in &self.unit_records[unit_pos] {
            if self.records[*rr].mark_infeasible() {
                self.pruned.push(*rr);
                num_changed += 1;
            }
        }
        num_changed
    }

    /// Prunes everything competing with the unit at `unit_pos`, keeping that unit.
    pub fn prune_rivals_of(&mut self, unit_pos: usize) -> usize {
        let mut num_changed = 0;
        for pos in self.rivals_of(unit_pos) {
            num_changed += self.prune_unit(pos);
        }
        num_changed
    }

    pub fn into_pruned(self) -> Vec<usize> {
        self.pruned
    }
}

/// How the boss of a conflict is picked.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BossChoice {
    Random,
    LowestWeight,
    FirstInGroup,
}

/// Policies for pruning a conflict down to fewer competing units.  Each call prunes at least one
/// unit of the conflict and nothing outside it, and only units that compete with one that is
/// kept.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ConflictSolver {
    /// Prunes the unit whose records have the lowest mean weight.  A joint plan that is fairly
    /// good for all its members beats one that is great for one member only.  An incompletely
    /// pointed joint plan is measured against the strongest of its members' alternatives: if it
    /// holds up, all alternatives go, otherwise only the joint plan does.
    LeastAverageWeight,
    /// One agent of the conflict decides: everything except the unit it points at is pruned.
    WhoIsTheBoss(BossChoice),
}

impl ConflictSolver {
    pub fn attempt_to_solve_conflict(&self, view: &mut ConflictView, rng: &mut Isaac64Rng) {
        if view.num_units() == 0 {
            return;
        }
        if view.num_units() == 1 {
            // a unit conflicting with itself can never be selected
            view.prune_unit(0);
            return;
        }

        match self {
            ConflictSolver::LeastAverageWeight => prune_least_average(view),
            ConflictSolver::WhoIsTheBoss(choice) => prune_all_but_boss(view, *choice, rng),
        }
    }
}

fn prune_least_average(view: &mut ConflictView) {
    let means: Vec<f64> = (0..view.num_units()).map(|ii| view.mean_weight(ii)).collect();
    if let Some(joint_pos) = view.incomplete_joint_plan() {
        // ties go to the joint plan
        let joint_holds = view.rivals_of(joint_pos).iter()
                              .all(|pos| means[*pos] <= means[joint_pos]);
        if joint_holds {
            log::debug!("keeping {:?} with mean weight {}", view.units()[joint_pos],
                        means[joint_pos]);
            view.prune_rivals_of(joint_pos);
        } else {
            log::debug!("pruning {:?} with mean weight {}", view.units()[joint_pos],
                        means[joint_pos]);
            view.prune_unit(joint_pos);
        }
        return;
    }

    let mut worst = 0;
    for ii in 1..means.len() {
        let ordering = means[ii].partial_cmp(&means[worst]).unwrap_or(Ordering::Equal);
        // on ties the later unit is pruned
        if ordering != Ordering::Greater {
            worst = ii;
        }
    }
    log::debug!("pruning {:?} with mean weight {}", view.units()[worst], means[worst]);
    view.prune_unit(worst);
}

fn prune_all_but_boss(view: &mut ConflictView, choice: BossChoice, rng: &mut Isaac64Rng) {
    let agents = view.pointing_agents();
    if agents.is_empty() {
        return;
    }
    let boss_pos = match choice {
        BossChoice::Random => rng.gen_range(0..agents.len()),
        BossChoice::FirstInGroup => 0,
        BossChoice::LowestWeight => {
            let mut lowest = 0;
            for (ii, (_, _, weight)) in agents.iter().enumerate() {
                if *weight < agents[lowest].2 {
                    lowest = ii;
                }
            }
            lowest
        }
    };
    let (boss, boss_unit, _) = agents[boss_pos];
    log::debug!("agent {} is the boss, keeping {:?}", boss, view.units()[boss_unit]);
    view.prune_rivals_of(boss_unit);
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::population::Plan;
    use rand::SeedableRng;

    fn plans(num: usize) -> Vec<Plan> {
        (0..num).map(|ii| Plan {
            id: ii as u32,
            agent_id: format!("agent{}", ii),
            score: None,
            vehicle_ids: vec![],
        }).collect()
    }

    // records 0 and 1 form joint plan 0, record 2 is individual.  Every record is pointed at by
    // its own agent.
    fn build_records<'a>(plans: &'a [Plan], weights: &[f64]) -> Vec<PlanRecord<'a>> {
        vec![
            PlanRecord::new(0, &plans[0], weights[0], Some(0)),
            PlanRecord::new(1, &plans[1], weights[1], Some(0)),
            PlanRecord::new(2, &plans[2], weights[2], None),
        ]
    }

    fn solve(solver: ConflictSolver, weights: &[f64], seed: u64) -> Vec<bool> {
        let plans = plans(3);
        let mut records = build_records(&plans, weights);
        let pointed = vec![0, 1, 2];
        let mut rng = Isaac64Rng::seed_from_u64(seed);
        {
            let mut view = ConflictView::new(
                vec![UnitKey::Joint(0), UnitKey::Individual(2)],
                vec![vec![0, 1], vec![2]], &pointed, &mut records).around_joint_plan(0);
            solver.attempt_to_solve_conflict(&mut view, &mut rng);
        }
        records.iter().map(|rr| rr.is_feasible()).collect()
    }

    #[test]
    fn test_least_average_prunes_joint_atomically() {
        // joint mean is 4, individual is 6
        let feasible = solve(ConflictSolver::LeastAverageWeight, &[5., 3., 6.], 0);
        assert_eq!(feasible, vec![false, false, true]);
    }

    #[test]
    fn test_least_average_uses_mean_not_total() {
        // total of the joint plan (7) is above the individual weight, its mean is not
        let feasible = solve(ConflictSolver::LeastAverageWeight, &[6., 1., 4.], 0);
        assert_eq!(feasible, vec![false, false, true]);

        let feasible = solve(ConflictSolver::LeastAverageWeight, &[5., 3., 3.5], 0);
        assert_eq!(feasible, vec![true, true, false]);
    }

    #[test]
    fn test_least_average_tie_prunes_later_unit() {
        let feasible = solve(ConflictSolver::LeastAverageWeight, &[5., 3., 4.], 0);
        assert_eq!(feasible, vec![true, true, false]);
    }

    #[test]
    fn test_boss_choices() {
        let weights = [5., 3., 6.];
        let feasible = solve(ConflictSolver::WhoIsTheBoss(BossChoice::FirstInGroup), &weights, 0);
        assert_eq!(feasible, vec![true, true, false]);

        // agent 1 points at the lowest weight, and it is part of the joint plan
        let feasible = solve(ConflictSolver::WhoIsTheBoss(BossChoice::LowestWeight), &weights, 0);
        assert_eq!(feasible, vec![true, true, false]);

        let feasible = solve(ConflictSolver::WhoIsTheBoss(BossChoice::LowestWeight),
                             &[7., 8., 6.], 0);
        assert_eq!(feasible, vec![false, false, true]);
    }

    #[test]
    fn test_random_boss_is_seeded() {
        let solver = ConflictSolver::WhoIsTheBoss(BossChoice::Random);
        for seed in 0..10 {
            let feasible = solve(solver, &[5., 3., 6.], seed);
            assert_eq!(feasible, solve(solver, &[5., 3., 6.], seed));
            // exactly one of the two units survives
            assert_eq!(feasible[0], feasible[1]);
            assert_ne!(feasible[0], feasible[2]);
        }
    }

    // a joint plan of agents 0, 1 and 2 (records 0 to 2) that only agent 0 points at.  Agents 1
    // and 2 point at their solo plans, records 3 and 4.
    fn solve_three_member_conflict(solver: ConflictSolver, weights: &[f64], seed: u64)
                                   -> Vec<bool> {
        let plans = plans(5);
        let mut records = vec![
            PlanRecord::new(0, &plans[0], weights[0], Some(0)),
            PlanRecord::new(1, &plans[1], weights[1], Some(0)),
            PlanRecord::new(2, &plans[2], weights[2], Some(0)),
            PlanRecord::new(1, &plans[3], weights[3], None),
            PlanRecord::new(2, &plans[4], weights[4], None),
        ];
        let pointed = vec![0, 3, 4];
        let mut rng = Isaac64Rng::seed_from_u64(seed);
        {
            let mut view = ConflictView::new(
                vec![UnitKey::Joint(0), UnitKey::Individual(3), UnitKey::Individual(4)],
                vec![vec![0, 1, 2], vec![3], vec![4]], &pointed, &mut records)
                .around_joint_plan(0);
            assert_eq!(view.rivals_of(0), vec![1, 2]);
            assert_eq!(view.rivals_of(2), vec![0]);
            solver.attempt_to_solve_conflict(&mut view, &mut rng);
        }
        records.iter().map(|rr| rr.is_feasible()).collect()
    }

    const JOINT_PRUNED: [bool; 5] = [false, false, false, true, true];
    const ALTERNATIVES_PRUNED: [bool; 5] = [true, true, true, false, false];

    #[test]
    fn test_least_average_with_three_members() {
        // the joint plan averages 2, below agent 1's alternative
        let feasible = solve_three_member_conflict(ConflictSolver::LeastAverageWeight,
                                                   &[5., 0., 1., 6., 1.9], 0);
        assert_eq!(feasible, JOINT_PRUNED.to_vec());

        // averaging 7, it holds up against both alternatives
        let feasible = solve_three_member_conflict(ConflictSolver::LeastAverageWeight,
                                                   &[9., 6., 6., 7., 6.5], 0);
        assert_eq!(feasible, ALTERNATIVES_PRUNED.to_vec());
    }

    #[test]
    fn test_boss_with_three_members() {
        let weights = [5., 1., 1., 4., 3.];
        let feasible = solve_three_member_conflict(
            ConflictSolver::WhoIsTheBoss(BossChoice::FirstInGroup), &weights, 0);
        assert_eq!(feasible, ALTERNATIVES_PRUNED.to_vec());

        // agent 2 is the boss and keeps its solo plan; agent 1's solo plan is left alone
        let feasible = solve_three_member_conflict(
            ConflictSolver::WhoIsTheBoss(BossChoice::LowestWeight), &weights, 0);
        assert_eq!(feasible, JOINT_PRUNED.to_vec());

        for seed in 0..20 {
            let feasible = solve_three_member_conflict(
                ConflictSolver::WhoIsTheBoss(BossChoice::Random), &weights, seed);
            assert!(feasible == JOINT_PRUNED.to_vec() || feasible == ALTERNATIVES_PRUNED.to_vec());
        }
    }

    #[test]
    fn test_boss_needs_a_pointing_agent() {
        let plans = plans(3);
        let mut records = build_records(&plans, &[1., 1., 1.]);
        // nobody points into the conflict
        let pointed = vec![7, 7, 7];
        let mut rng = Isaac64Rng::seed_from_u64(0);
        let mut view = ConflictView::new(vec![UnitKey::Joint(0), UnitKey::Individual(2)],
                                         vec![vec![0, 1], vec![2]], &pointed, &mut records);
        assert!(view.pointing_agents().is_empty());
        ConflictSolver::WhoIsTheBoss(BossChoice::Random)
            .attempt_to_solve_conflict(&mut view, &mut rng);
        assert!(view.into_pruned().is_empty());
    }

    #[test]
    fn test_single_unit_is_pruned() {
        let plans = plans(3);
        let mut records = build_records(&plans, &[1., 1., 1.]);
        let pointed = vec![0, 1, 2];
        let mut rng = Isaac64Rng::seed_from_u64(0);
        let mut view = ConflictView::new(vec![UnitKey::Individual(2)], vec![vec![2]], &pointed,
                                         &mut records);
        ConflictSolver::WhoIsTheBoss(BossChoice::FirstInGroup)
            .attempt_to_solve_conflict(&mut view, &mut rng);
        assert_eq!(view.into_pruned(), vec![2]);
    }
}
