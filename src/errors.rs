use thiserror::Error;


/// Failures of a single group's selection run.  All of these are deterministic given the input,
/// so retrying never helps.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("agent {agent_id} has no feasible plan left")]
    ExhaustedAgent { agent_id: String },

    #[error("conflict solver made no progress on conflict {conflict}")]
    NonProgress { conflict: String },

    #[error("joint plan {joint_plan_id} references agent {agent_id}, which is not in the group \
             or does not hold the linked plan")]
    MalformedJointPlan { joint_plan_id: u64, agent_id: String },

    #[error("agent {agent_id} is not in the population")]
    UnknownAgent { agent_id: String },

    #[error("plan {plan_id} of agent {agent_id} has a NaN weight")]
    InvalidWeight { agent_id: String, plan_id: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed to parse config as yaml: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("config has no {0:?} entry")]
    MissingField(String),

    #[error("invalid value for {field:?}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("group file lists unknown agent {0}")]
    UnknownAgent(String),

    #[error("agent {0} is listed in more than one group")]
    DuplicateAgent(String),
}
