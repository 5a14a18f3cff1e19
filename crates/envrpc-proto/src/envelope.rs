/// Error payload of a failed request: a status code, a human readable
/// message, and any structured details the server attached.
///
/// Wire-compatible with `google.rpc.Status`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Status {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<prost_types::Any>,
}

impl Status {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Attach a structured detail.
    pub fn with_detail(mut self, detail: prost_types::Any) -> Self {
        self.details.push(detail);
        self
    }
}

/// Canonical status codes (`google.rpc.Code`) used in [`Status::code`].
pub mod code {
    pub const OK: i32 = 0;
    pub const CANCELLED: i32 = 1;
    pub const UNKNOWN: i32 = 2;
    pub const INVALID_ARGUMENT: i32 = 3;
    pub const NOT_FOUND: i32 = 5;
    pub const ALREADY_EXISTS: i32 = 6;
    pub const FAILED_PRECONDITION: i32 = 9;
    pub const UNIMPLEMENTED: i32 = 12;
    pub const INTERNAL: i32 = 13;
    pub const UNAVAILABLE: i32 = 14;
}

impl prost::Name for Status {
    const NAME: &'static str = "Status";
    const PACKAGE: &'static str = "google.rpc";
}

/// Client-to-server envelope. Exactly one payload field is populated.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvironmentRequest {
    #[prost(oneof = "environment_request::Payload", tags = "1, 2, 3, 4, 5, 6, 7, 15")]
    pub payload: Option<environment_request::Payload>,
}

pub mod environment_request {
    use crate::messages::*;

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        CreateWorld(CreateWorldRequest),
        #[prost(message, tag = "2")]
        JoinWorld(JoinWorldRequest),
        #[prost(message, tag = "3")]
        Step(StepRequest),
        #[prost(message, tag = "4")]
        Reset(ResetRequest),
        #[prost(message, tag = "5")]
        ResetWorld(ResetWorldRequest),
        #[prost(message, tag = "6")]
        LeaveWorld(LeaveWorldRequest),
        #[prost(message, tag = "7")]
        DestroyWorld(DestroyWorldRequest),
        /// Application-specific request outside the native vocabulary.
        #[prost(message, tag = "15")]
        Extension(prost_types::Any),
    }
}

/// Server-to-client envelope. Exactly one payload field is populated; the
/// `error` field replaces the expected response when a request fails.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EnvironmentResponse {
    #[prost(
        oneof = "environment_response::Payload",
        tags = "1, 2, 3, 4, 5, 6, 7, 15, 127"
    )]
    pub payload: Option<environment_response::Payload>,
}

pub mod environment_response {
    use crate::messages::*;

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        CreateWorld(CreateWorldResponse),
        #[prost(message, tag = "2")]
        JoinWorld(JoinWorldResponse),
        #[prost(message, tag = "3")]
        Step(StepResponse),
        #[prost(message, tag = "4")]
        Reset(ResetResponse),
        #[prost(message, tag = "5")]
        ResetWorld(ResetWorldResponse),
        #[prost(message, tag = "6")]
        LeaveWorld(LeaveWorldResponse),
        #[prost(message, tag = "7")]
        DestroyWorld(DestroyWorldResponse),
        #[prost(message, tag = "15")]
        Extension(prost_types::Any),
        #[prost(message, tag = "127")]
        Error(super::Status),
    }
}

impl prost::Name for EnvironmentRequest {
    const NAME: &'static str = "EnvironmentRequest";
    const PACKAGE: &'static str = crate::PACKAGE;
}

impl prost::Name for EnvironmentResponse {
    const NAME: &'static str = "EnvironmentResponse";
    const PACKAGE: &'static str = crate::PACKAGE;
}

impl From<environment_request::Payload> for EnvironmentRequest {
    fn from(payload: environment_request::Payload) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

impl From<environment_response::Payload> for EnvironmentResponse {
    fn from(payload: environment_response::Payload) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}
