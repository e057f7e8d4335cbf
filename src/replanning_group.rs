use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use petgraph::unionfind::UnionFind;

use super::errors::ConfigError;
use super::joint_plans::JointPlans;
use super::population::{AgentId, Population};


/// The agents that are co-optimized in one selection pass.  Member order is significant: it
/// fixes record indices and tie-breaks in the selector.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ReplanningGroup {
    agent_ids: Vec<AgentId>,
}

impl ReplanningGroup {
    pub fn new(agent_ids: Vec<AgentId>) -> ReplanningGroup {
        ReplanningGroup { agent_ids }
    }

    pub fn singleton(agent_id: &str) -> ReplanningGroup {
        ReplanningGroup { agent_ids: vec![String::from(agent_id)] }
    }

    pub fn get_agent_ids(&self) -> &Vec<AgentId> {
        &self.agent_ids
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agent_ids.iter().any(|aa| aa == agent_id)
    }

    pub fn len(&self) -> usize {
        self.agent_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agent_ids.is_empty()
    }
}

/// Decides how the population is partitioned into replanning groups.
#[derive(PartialEq, Debug, Clone)]
pub enum GroupingPolicy {
    /// Groups listed explicitly in a file, one group per line.  Agents not listed get their own
    /// group.
    Fixed(Vec<Vec<AgentId>>),
    /// Agents sharing a joint plan end up together, and if `by_vehicles` is set, so do agents
    /// whose plans use a common vehicle.
    JointPlans { by_vehicles: bool },
}

impl GroupingPolicy {
    /// Reads a headerless csv file where each line holds the ids of one group's members.
    pub fn fixed_from_csv(path: &Path) -> Result<GroupingPolicy, ConfigError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let mut groups = vec![];
        for result in reader.records() {
            let record = result?;
            let group: Vec<AgentId> = record.iter()
                                            .filter(|ss| !ss.is_empty())
                                            .map(String::from)
                                            .collect();
            if group.len() > 0 {
                groups.push(group);
            }
        }
        Ok(GroupingPolicy::Fixed(groups))
    }

    pub fn build_groups(&self, population: &Population, joint_plans: &JointPlans)
                        -> Result<Vec<ReplanningGroup>, ConfigError> {
        let groups = match self {
            GroupingPolicy::Fixed(listed) => fixed_groups(listed, population)?,
            GroupingPolicy::JointPlans { by_vehicles } =>
                linked_groups(population, joint_plans, *by_vehicles),
        };
        log::info!("partitioned {} agents into {} replanning groups", population.len(),
                   groups.len());
        Ok(groups)
    }
}

fn fixed_groups(listed: &Vec<Vec<AgentId>>, population: &Population)
                -> Result<Vec<ReplanningGroup>, ConfigError> {
    let mut seen = HashSet::new();
    let mut groups = vec![];
    for members in listed {
        for id in members {
            if !population.contains(id) {
                return Err(ConfigError::UnknownAgent(id.clone()));
            }
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateAgent(id.clone()));
            }
        }
        groups.push(ReplanningGroup::new(members.clone()));
    }

    for id in population.agent_ids() {
        if !seen.contains(id) {
            groups.push(ReplanningGroup::singleton(id));
        }
    }
    Ok(groups)
}

fn linked_groups(population: &Population, joint_plans: &JointPlans, by_vehicles: bool)
                 -> Vec<ReplanningGroup> {
    let ids: Vec<&AgentId> = population.agent_ids().collect();
    let idxs_by_id: HashMap<&str, usize> =
        ids.iter().enumerate().map(|(ii, id)| (id.as_str(), ii)).collect();
    let mut components = UnionFind::new(ids.len());

    for joint_plan in joint_plans.iter() {
        let mut member_idxs = joint_plan.members.keys()
                                                .filter_map(|id| idxs_by_id.get(id.as_str()));
        if let Some(first) = member_idxs.next() {
            for other in member_idxs {
                components.union(*first, *other);
            }
        }
    }

    if by_vehicles {
        let mut first_user_of_vehicle: HashMap<&str, usize> = HashMap::new();
        for agent in population.agents() {
            let agent_idx = idxs_by_id[agent.id.as_str()];
            for plan in agent.get_plans() {
                for vehicle_id in &plan.vehicle_ids {
                    let first = *first_user_of_vehicle.entry(vehicle_id.as_str())
                                                      .or_insert(agent_idx);
                    components.union(first, agent_idx);
                }
            }
        }
    }

    // members are visited in sorted id order, so each group is sorted and groups are ordered by
    // their first member
    let labels = components.into_labeling();
    let mut members_by_label: BTreeMap<usize, Vec<AgentId>> = BTreeMap::new();
    let mut label_order = vec![];
    for (ii, label) in labels.iter().enumerate() {
        let members = members_by_label.entry(*label).or_insert_with(|| {
            label_order.push(*label);
            vec![]
        });
        members.push(ids[ii].to_string());
    }

    label_order.iter()
               .filter_map(|label| members_by_label.remove(label))
               .map(ReplanningGroup::new)
               .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_utils::PopulationBuilder;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_fixed_groups_from_csv() -> Result<(), Box<dyn std::error::Error>> {
        let (population, joint_plans) = PopulationBuilder::new()
            .agent("a", &[1.])
            .agent("b", &[1.])
            .agent("c", &[1.])
            .agent("d", &[1.])
            .build();

        let dir = tempdir()?;
        let file_path = dir.path().join("groups.csv");
        {
            let mut file = File::create(&file_path)?;
            file.write_all(b"d, b\n\nc\n")?;
        }

        let policy = GroupingPolicy::fixed_from_csv(&file_path)?;
        let groups = policy.build_groups(&population, &joint_plans)?;
        let expected = vec![
            ReplanningGroup::new(vec![String::from("d"), String::from("b")]),
            ReplanningGroup::singleton("c"),
            ReplanningGroup::singleton("a"),
        ];
        assert_eq!(groups, expected);
        Ok(())
    }

    #[test]
    fn test_fixed_groups_errors() {
        let (population, joint_plans) = PopulationBuilder::new()
            .agent("a", &[1.])
            .agent("b", &[1.])
            .build();

        let policy = GroupingPolicy::Fixed(vec![vec![String::from("a"), String::from("z")]]);
        match policy.build_groups(&population, &joint_plans) {
            Err(ConfigError::UnknownAgent(id)) => assert_eq!(id, "z"),
            other => panic!("expected unknown agent, got {:?}", other),
        }

        let policy = GroupingPolicy::Fixed(vec![vec![String::from("a")],
                                                vec![String::from("b"), String::from("a")]]);
        match policy.build_groups(&population, &joint_plans) {
            Err(ConfigError::DuplicateAgent(id)) => assert_eq!(id, "a"),
            other => panic!("expected duplicate agent, got {:?}", other),
        }
    }

    #[test]
    fn test_groups_from_joint_plans() {
        let (population, joint_plans) = PopulationBuilder::new()
            .agent("a", &[1., 1.])
            .agent("b", &[1.])
            .agent("c", &[1., 1.])
            .agent("d", &[1.])
            .agent("e", &[1.])
            .joint(&[("a", 0), ("c", 0)])
            .joint(&[("c", 1), ("e", 0)])
            .build();

        let policy = GroupingPolicy::JointPlans { by_vehicles: false };
        let groups = policy.build_groups(&population, &joint_plans).unwrap();
        let ids: Vec<Vec<&str>> = groups.iter().map(
            |gg| gg.get_agent_ids().iter().map(|ss| ss.as_str()).collect()).collect();
        assert_eq!(ids, vec![vec!["a", "c", "e"], vec!["b"], vec!["d"]]);
    }

    #[test]
    fn test_groups_from_shared_vehicles() {
        let (population, joint_plans) = PopulationBuilder::new()
            .agent("a", &[])
            .agent("b", &[1.])
            .agent("c", &[])
            .vehicle_plan("a", 1., "car1")
            .vehicle_plan("c", 1., "car1")
            .build();

        let policy = GroupingPolicy::JointPlans { by_vehicles: false };
        assert_eq!(policy.build_groups(&population, &joint_plans).unwrap().len(), 3);

        let policy = GroupingPolicy::JointPlans { by_vehicles: true };
        let groups = policy.build_groups(&population, &joint_plans).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].contains("a") && groups[0].contains("c"));
        assert_eq!(groups[1], ReplanningGroup::singleton("b"));
    }
}
