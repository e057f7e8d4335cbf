use super::population::Plan;


/// Reports plans that can't be selected at the same time even though they aren't linked by a
/// joint plan, e.g. two plans that both need the same car.  Judgements must not change during a
/// selection run.
pub trait IncompatiblePlansIdentifier: Send + Sync {
    fn are_incompatible(&self, plan_a: &Plan, plan_b: &Plan) -> bool;

    /// Lets the selector skip pairwise checks entirely.
    fn never_incompatible(&self) -> bool {
        false
    }
}

/// No constraints beyond joint plan linkage.
pub struct NoIncompatibility;

impl IncompatiblePlansIdentifier for NoIncompatibility {
    fn are_incompatible(&self, _plan_a: &Plan, _plan_b: &Plan) -> bool {
        false
    }

    fn never_incompatible(&self) -> bool {
        true
    }
}

/// Plans of different agents that drive the same vehicle are incompatible.
pub struct SharedVehicleIdentifier;

impl IncompatiblePlansIdentifier for SharedVehicleIdentifier {
    fn are_incompatible(&self, plan_a: &Plan, plan_b: &Plan) -> bool {
        // an agent only ever executes one of its plans
        if plan_a.agent_id == plan_b.agent_id {
            return false;
        }
        plan_a.vehicle_ids.iter().any(|vv| plan_b.uses_vehicle(vv))
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum IncompatibilityKind {
    None,
    SharedVehicle,
}

impl IncompatibilityKind {
    pub fn build(&self) -> Box<dyn IncompatiblePlansIdentifier> {
        match self {
            IncompatibilityKind::None => Box::new(NoIncompatibility),
            IncompatibilityKind::SharedVehicle => Box::new(SharedVehicleIdentifier),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn plan(agent_id: &str, id: u32, vehicles: &[&str]) -> Plan {
        Plan {
            id,
            agent_id: String::from(agent_id),
            score: None,
            vehicle_ids: vehicles.iter().map(|vv| String::from(*vv)).collect(),
        }
    }

    #[test]
    fn test_shared_vehicle() {
        let identifier = IncompatibilityKind::SharedVehicle.build();
        assert!(!identifier.never_incompatible());

        let a0 = plan("a", 0, &["car1"]);
        let a1 = plan("a", 1, &["car1", "car2"]);
        let b0 = plan("b", 0, &["car2"]);
        let b1 = plan("b", 1, &[]);

        assert!(!identifier.are_incompatible(&a0, &a0));
        assert!(!identifier.are_incompatible(&a0, &a1));
        assert!(!identifier.are_incompatible(&a0, &b0));
        assert!(identifier.are_incompatible(&a1, &b0));
        assert!(identifier.are_incompatible(&b0, &a1));
        assert!(!identifier.are_incompatible(&a1, &b1));
    }

    #[test]
    fn test_no_incompatibility() {
        let identifier = IncompatibilityKind::None.build();
        assert!(identifier.never_incompatible());
        let a0 = plan("a", 0, &["car1"]);
        let b0 = plan("b", 0, &["car1"]);
        assert!(!identifier.are_incompatible(&a0, &b0));
    }
}
