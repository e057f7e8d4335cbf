use rand::Rng;
use rand::seq::SliceRandom;

use super::joint_plans::{JointPlanError, JointPlans};
use super::population::{Agent, PlanKey, Population};


/// Generates a population of households sharing one car each, with some agents grouped into
/// carpools of two or three.
///
/// num_agents: the number of agents.  Households are consecutive pairs of agents.
/// plans_per_agent: the number of individual plans each agent starts with.
/// carpool_fraction: the fraction of agents that get a joint driver/passenger plan.  Each carpool
///     drives its own pool car, so joint plans never compete for a household car.
pub fn generate_carpool_population<RR>(num_agents: usize, plans_per_agent: usize,
                                       carpool_fraction: f64, rng: &mut RR)
                                       -> Result<(Population, JointPlans), JointPlanError>
                                       where RR: Rng {
    let agent_ids: Vec<String> = (0..num_agents).map(|ii| format!("agent{:05}", ii)).collect();
    let car_of = |agent_idx: usize| format!("car{:05}", agent_idx / 2);

    let mut population = Population::new();
    for (ii, agent_id) in agent_ids.iter().enumerate() {
        let mut agent = Agent::new(agent_id);
        for jj in 0..plans_per_agent {
            // the first plan always uses transit, so there is a plan no other can conflict with.
            // about half the others drive the household car.
            let vehicles = if jj > 0 && rng.gen_bool(0.5) { vec![car_of(ii)] } else { vec![] };
            agent.add_plan(Some(rng.gen_range(-20.0..0.0)), vehicles);
        }
        population.add_agent(agent);
    }

    // split randomly chosen agents into carpools; the first of each carpool drives
    let mut joint_plans = JointPlans::new();
    let num_carpoolers = (num_agents as f64 * carpool_fraction.max(0.).min(1.)) as usize;
    let mut indices: Vec<usize> = (0..num_agents).collect();
    indices.shuffle(rng);
    let mut remaining = &indices[..num_carpoolers];
    while remaining.len() >= 2 {
        let size: usize = rng.gen_range(2..=3);
        let size = size.min(remaining.len());
        let (carpool, rest) = remaining.split_at(size);
        remaining = rest;

        let pool_car = format!("pool{:05}", joint_plans.len());
        let mut keys = vec![];
        for (ii, agent_idx) in carpool.iter().enumerate() {
            let vehicles = if ii == 0 { vec![pool_car.clone()] } else { vec![] };
            let agent_id = &agent_ids[*agent_idx];
            if let Some(agent) = population.get_agent_mut(agent_id) {
                let plan_id = agent.add_plan(Some(rng.gen_range(-15.0..0.0)), vehicles);
                keys.push(PlanKey::new(agent_id, plan_id));
            }
        }
        joint_plans.add_joint_plan(&keys, &population)?;
    }

    log::debug!("generated {} agents with {} joint plans", population.len(), joint_plans.len());
    Ok((population, joint_plans))
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    #[test]
    fn test_generate_carpool_population() {
        let mut rng = Isaac64Rng::seed_from_u64(37);
        let (population, joint_plans) =
            generate_carpool_population(20, 3, 0.5, &mut rng).unwrap();
        assert_eq!(population.len(), 20);
        // carpools of two or three, each adding one plan per member
        let num_members: usize = joint_plans.iter().map(|jp| jp.len()).sum();
        assert!(num_members >= 9 && num_members <= 10);
        assert_eq!(population.num_plans(), 20 * 3 + num_members);

        for jp in joint_plans.iter() {
            assert!(jp.len() == 2 || jp.len() == 3);
            let mut num_drivers = 0;
            for key in jp.member_keys() {
                let plan = population.get_plan(&key).unwrap();
                assert!(plan.score.unwrap() < 0.);
                if !plan.vehicle_ids.is_empty() {
                    assert!(plan.vehicle_ids[0].starts_with("pool"));
                    num_drivers += 1;
                }
            }
            assert_eq!(num_drivers, 1);
        }

        for agent in population.agents() {
            let idx: usize = agent.id["agent".len()..].parse().unwrap();
            let car = format!("car{:05}", idx / 2);
            let num_joint = joint_plans.joint_plans_of_agent(&agent.id).len();
            assert!(num_joint <= 1);
            for plan in agent.get_plans() {
                if joint_plans.get_joint_plan_for(&plan.key()).is_none() {
                    assert!(plan.vehicle_ids.is_empty() || plan.uses_vehicle(&car));
                }
            }
            assert!(agent.get_plan(0).unwrap().vehicle_ids.is_empty());
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let gen = |seed| {
            let mut rng = Isaac64Rng::seed_from_u64(seed);
            generate_carpool_population(10, 2, 1., &mut rng).unwrap()
        };
        let (pop1, jps1) = gen(5);
        let (pop2, jps2) = gen(5);
        assert_eq!(pop1, pop2);
        let members1: Vec<_> = jps1.iter().cloned().collect();
        let members2: Vec<_> = jps2.iter().cloned().collect();
        assert_eq!(members1, members2);
    }
}
