use std::error::Error;

use env_logger;
use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;

use group_replanning::{generate_carpool_population, GroupReplanner, ReplanningConfig};


const PLANS_PER_AGENT: usize = 3;
const CARPOOL_FRACTION: f64 = 0.3;

/// usage: group_replanning [config.yaml] [num_agents] [num_iterations]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    let cfg = match args.get(1) {
        Some(path) => ReplanningConfig::from_file(path)?,
        None => ReplanningConfig::default(),
    };
    let num_agents = match args.get(2) {
        Some(arg) => arg.parse::<usize>()?,
        None => 1000,
    };
    let num_iterations = match args.get(3) {
        Some(arg) => arg.parse::<u32>()?,
        None => 10,
    };

    let mut rng = Isaac64Rng::seed_from_u64(cfg.seed);
    let (mut population, mut joint_plans) =
        generate_carpool_population(num_agents, PLANS_PER_AGENT, CARPOOL_FRACTION, &mut rng)?;
    let grouping = cfg.grouping_policy()?;
    let replanner = GroupReplanner::from_config(&cfg);

    for iteration in 0..num_iterations {
        let groups = grouping.build_groups(&population, &joint_plans)?;
        let report = replanner.run_iteration(&groups, &mut population, &joint_plans,
                                             iteration)?;

        // stand-in for a mobility simulation: executed plans get a noisy new score, and every
        // agent comes up with one fresh unscored plan
        let agent_ids: Vec<String> = population.agent_ids().cloned().collect();
        let mut total_score = 0.;
        for agent_id in &agent_ids {
            if let Some(agent) = population.get_agent_mut(agent_id) {
                let selected = agent.get_selected_plan().map(|pp| (pp.id, pp.score));
                if let Some((plan_id, old_score)) = selected {
                    let score = match old_score {
                        Some(old_score) => old_score + rng.gen_range(-1.0..1.0),
                        None => rng.gen_range(-20.0..0.0),
                    };
                    agent.set_score(plan_id, score);
                    total_score += score;
                }
                let vehicles = agent.get_plans().iter()
                                    .flat_map(|pp| pp.vehicle_ids.iter().cloned())
                                    .take(1).collect();
                agent.add_plan(None, vehicles);
            }
        }

        let num_removed = replanner.remove_extra_plans(&groups, &mut population,
                                                       &mut joint_plans, iteration)?;
        println!("iteration {}: {} groups, {} joint plans selected, mean score {:.3}, \
                  {} plans removed",
                 iteration, report.num_groups, report.num_selected_joint_plans,
                 total_score / population.len().max(1) as f64, num_removed);
    }
    Ok(())
}
