use std::collections::HashMap;

use crate::tensor::{Tensor, TensorSpec};

/// Lifecycle state reported with every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EnvironmentStateType {
    InvalidEnvironmentState = 0,
    Running = 1,
    Terminated = 2,
    Interrupted = 3,
}

impl EnvironmentStateType {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentStateType::InvalidEnvironmentState => "invalid",
            EnvironmentStateType::Running => "running",
            EnvironmentStateType::Terminated => "terminated",
            EnvironmentStateType::Interrupted => "interrupted",
        }
    }
}

/// UID-keyed action and observation specs advertised when joining a world.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ActionObservationSpecs {
    #[prost(map = "uint64, message", tag = "1")]
    pub actions: HashMap<u64, TensorSpec>,
    #[prost(map = "uint64, message", tag = "2")]
    pub observations: HashMap<u64, TensorSpec>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateWorldRequest {
    #[prost(map = "string, message", tag = "1")]
    pub settings: HashMap<String, Tensor>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateWorldResponse {
    #[prost(string, tag = "1")]
    pub world_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinWorldRequest {
    #[prost(string, tag = "1")]
    pub world_name: String,
    #[prost(map = "string, message", tag = "2")]
    pub settings: HashMap<String, Tensor>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinWorldResponse {
    #[prost(message, optional, tag = "1")]
    pub specs: Option<ActionObservationSpecs>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepRequest {
    #[prost(map = "uint64, message", tag = "1")]
    pub actions: HashMap<u64, Tensor>,
    #[prost(uint64, repeated, tag = "2")]
    pub requested_observations: Vec<u64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StepResponse {
    #[prost(map = "uint64, message", tag = "1")]
    pub observations: HashMap<u64, Tensor>,
    #[prost(enumeration = "EnvironmentStateType", tag = "2")]
    pub state: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResetRequest {
    #[prost(map = "string, message", tag = "1")]
    pub settings: HashMap<String, Tensor>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResetResponse {
    #[prost(message, optional, tag = "1")]
    pub specs: Option<ActionObservationSpecs>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResetWorldRequest {
    #[prost(string, tag = "1")]
    pub world_name: String,
    #[prost(map = "string, message", tag = "2")]
    pub settings: HashMap<String, Tensor>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ResetWorldResponse {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LeaveWorldRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LeaveWorldResponse {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DestroyWorldRequest {
    #[prost(string, tag = "1")]
    pub world_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DestroyWorldResponse {}

macro_rules! message_names {
    ($($ty:ident),* $(,)?) => {
        $(
            impl prost::Name for $ty {
                const NAME: &'static str = stringify!($ty);
                const PACKAGE: &'static str = crate::PACKAGE;
            }
        )*
    };
}

message_names!(
    ActionObservationSpecs,
    CreateWorldRequest,
    CreateWorldResponse,
    JoinWorldRequest,
    JoinWorldResponse,
    StepRequest,
    StepResponse,
    ResetRequest,
    ResetResponse,
    ResetWorldRequest,
    ResetWorldResponse,
    LeaveWorldRequest,
    LeaveWorldResponse,
    DestroyWorldRequest,
    DestroyWorldResponse,
);

impl prost::Name for Tensor {
    const NAME: &'static str = "Tensor";
    const PACKAGE: &'static str = crate::PACKAGE;
}

impl prost::Name for TensorSpec {
    const NAME: &'static str = "TensorSpec";
    const PACKAGE: &'static str = crate::PACKAGE;
}
