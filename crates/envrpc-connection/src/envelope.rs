use std::fmt;

use envrpc_proto::environment_request::Payload as RequestPayload;
use envrpc_proto::environment_response::Payload as ResponsePayload;
use envrpc_proto::{
    Any, CreateWorldRequest, CreateWorldResponse, DestroyWorldRequest, DestroyWorldResponse,
    EnvironmentRequest, EnvironmentResponse, JoinWorldRequest, JoinWorldResponse,
    LeaveWorldRequest, LeaveWorldResponse, ResetRequest, ResetResponse, ResetWorldRequest,
    ResetWorldResponse, Status, StepRequest, StepResponse,
};

use crate::error::{ConnectionError, Result};

/// Envelope oneof field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeField {
    CreateWorld,
    JoinWorld,
    Step,
    Reset,
    ResetWorld,
    LeaveWorld,
    DestroyWorld,
    Extension,
    /// Response-only.
    Error,
}

impl EnvelopeField {
    /// Field name as declared in the envelope schema.
    pub fn name(self) -> &'static str {
        match self {
            EnvelopeField::CreateWorld => "create_world",
            EnvelopeField::JoinWorld => "join_world",
            EnvelopeField::Step => "step",
            EnvelopeField::Reset => "reset",
            EnvelopeField::ResetWorld => "reset_world",
            EnvelopeField::LeaveWorld => "leave_world",
            EnvelopeField::DestroyWorld => "destroy_world",
            EnvelopeField::Extension => "extension",
            EnvelopeField::Error => "error",
        }
    }

    pub fn of_request(payload: &RequestPayload) -> Self {
        match payload {
            RequestPayload::CreateWorld(_) => EnvelopeField::CreateWorld,
            RequestPayload::JoinWorld(_) => EnvelopeField::JoinWorld,
            RequestPayload::Step(_) => EnvelopeField::Step,
            RequestPayload::Reset(_) => EnvelopeField::Reset,
            RequestPayload::ResetWorld(_) => EnvelopeField::ResetWorld,
            RequestPayload::LeaveWorld(_) => EnvelopeField::LeaveWorld,
            RequestPayload::DestroyWorld(_) => EnvelopeField::DestroyWorld,
            RequestPayload::Extension(_) => EnvelopeField::Extension,
        }
    }

    pub fn of_response(payload: &ResponsePayload) -> Self {
        match payload {
            ResponsePayload::CreateWorld(_) => EnvelopeField::CreateWorld,
            ResponsePayload::JoinWorld(_) => EnvelopeField::JoinWorld,
            ResponsePayload::Step(_) => EnvelopeField::Step,
            ResponsePayload::Reset(_) => EnvelopeField::Reset,
            ResponsePayload::ResetWorld(_) => EnvelopeField::ResetWorld,
            ResponsePayload::LeaveWorld(_) => EnvelopeField::LeaveWorld,
            ResponsePayload::DestroyWorld(_) => EnvelopeField::DestroyWorld,
            ResponsePayload::Extension(_) => EnvelopeField::Extension,
            ResponsePayload::Error(_) => EnvelopeField::Error,
        }
    }
}

impl fmt::Display for EnvelopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A request that can be sent in an [`EnvironmentRequest`], together with
/// the response type it is answered with.
///
/// Implemented for the seven native request messages and for `Any`, which
/// travels in the `extension` field.
pub trait NativeRequest: Sized {
    type Response;

    /// Envelope field carrying both the request and its response.
    const FIELD: EnvelopeField;

    fn into_payload(self) -> RequestPayload;

    /// Take the response out of `payload`, or give it back if it is some
    /// other field.
    fn take_response(
        payload: ResponsePayload,
    ) -> std::result::Result<Self::Response, ResponsePayload>;
}

macro_rules! native_request {
    ($($request:ty => $response:ty, $field:ident;)*) => {
        $(
            impl NativeRequest for $request {
                type Response = $response;
                const FIELD: EnvelopeField = EnvelopeField::$field;

                fn into_payload(self) -> RequestPayload {
                    RequestPayload::$field(self)
                }

                fn take_response(
                    payload: ResponsePayload,
                ) -> std::result::Result<Self::Response, ResponsePayload> {
                    match payload {
                        ResponsePayload::$field(response) => Ok(response),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

native_request! {
    CreateWorldRequest => CreateWorldResponse, CreateWorld;
    JoinWorldRequest => JoinWorldResponse, JoinWorld;
    StepRequest => StepResponse, Step;
    ResetRequest => ResetResponse, Reset;
    ResetWorldRequest => ResetWorldResponse, ResetWorld;
    LeaveWorldRequest => LeaveWorldResponse, LeaveWorld;
    DestroyWorldRequest => DestroyWorldResponse, DestroyWorld;
    Any => Any, Extension;
}

/// Wrap a request in its envelope.
pub fn pack_environment_request<R: NativeRequest>(request: R) -> EnvironmentRequest {
    EnvironmentRequest::from(request.into_payload())
}

/// Unwrap the response to a request of type `R`.
///
/// The `error` field becomes [`ConnectionError::Rpc`]; any other
/// unexpected field is [`ConnectionError::UnexpectedResponse`].
pub fn unpack_environment_response<R: NativeRequest>(
    response: EnvironmentResponse,
) -> Result<R::Response> {
    match response.payload {
        None => Err(ConnectionError::EmptyEnvelope),
        Some(ResponsePayload::Error(status)) => Err(ConnectionError::Rpc(status.into())),
        Some(payload) => {
            let actual = EnvelopeField::of_response(&payload);
            R::take_response(payload).map_err(|_| ConnectionError::UnexpectedResponse {
                expected: R::FIELD,
                actual,
            })
        }
    }
}

/// Server side: take the populated request field out of its envelope.
pub fn unpack_environment_request(request: EnvironmentRequest) -> Result<RequestPayload> {
    request.payload.ok_or(ConnectionError::EmptyEnvelope)
}

/// Server side: wrap a handler result, putting a failure in the `error`
/// field.
pub fn pack_environment_response(
    result: std::result::Result<ResponsePayload, Status>,
) -> EnvironmentResponse {
    match result {
        Ok(payload) => EnvironmentResponse::from(payload),
        Err(status) => EnvironmentResponse::from(ResponsePayload::Error(status)),
    }
}
