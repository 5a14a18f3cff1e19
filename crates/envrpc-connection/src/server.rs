use std::sync::atomic::{AtomicU64, Ordering};

use envrpc_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use envrpc_proto::environment_request::Payload as RequestPayload;
use envrpc_proto::environment_response::Payload as ResponsePayload;
use envrpc_proto::{code, EnvironmentRequest, EnvironmentResponse, Status};
use envrpc_transport::{Endpoint, Listener, Stream};
use tracing::{debug, info, warn};

use crate::envelope::{pack_environment_response, unpack_environment_request, EnvelopeField};
use crate::error::Result;

/// What a handler answers a request with.
pub type HandlerResult = std::result::Result<ResponsePayload, Status>;

/// Server-side request handler.
///
/// Returning `Err(status)` answers the request with the envelope's `error`
/// field. Implemented for any matching `FnMut` closure.
pub trait Environment {
    fn handle(&mut self, request: RequestPayload) -> HandlerResult;
}

impl<F> Environment for F
where
    F: FnMut(RequestPayload) -> HandlerResult,
{
    fn handle(&mut self, request: RequestPayload) -> HandlerResult {
        self(request)
    }
}

/// Answer requests on `stream` until the peer closes it, using the default
/// frame configuration. Returns the number of requests answered.
pub fn serve_stream<E>(stream: Stream, environment: &mut E) -> Result<u64>
where
    E: Environment + ?Sized,
{
    serve_stream_with_config(stream, environment, FrameConfig::default())
}

/// Answer requests on `stream` until the peer closes it.
///
/// Each request gets exactly one response, in order. A request that does
/// not decode, or an envelope with nothing in it, is answered with an
/// `INVALID_ARGUMENT` error and the loop continues.
pub fn serve_stream_with_config<E>(
    stream: Stream,
    environment: &mut E,
    config: FrameConfig,
) -> Result<u64>
where
    E: Environment + ?Sized,
{
    let mut reader = FrameReader::with_config_stream(stream.try_clone()?, config.clone())?;
    let mut writer = FrameWriter::with_config_stream(stream, config)?;
    let mut served = 0u64;

    loop {
        let response = match reader.read_message::<EnvironmentRequest>() {
            Ok(request) => match unpack_environment_request(request) {
                Ok(payload) => {
                    let field = EnvelopeField::of_request(&payload);
                    debug!(%field, "handling request");
                    pack_environment_response(environment.handle(payload))
                }
                Err(err) => {
                    warn!(error = %err, "rejecting empty request envelope");
                    error_response(err.to_string())
                }
            },
            Err(FrameError::ConnectionClosed) => {
                debug!(served, "peer closed stream");
                return Ok(served);
            }
            Err(FrameError::Decode(err)) => {
                warn!(error = %err, "rejecting undecodable request");
                error_response(format!("failed to decode request: {err}"))
            }
            Err(err) => return Err(err.into()),
        };

        writer.write_message(&response)?;
        served += 1;
    }
}

fn error_response(message: String) -> EnvironmentResponse {
    pack_environment_response(Err(Status::new(code::INVALID_ARGUMENT, message)))
}

/// Listens for client sessions on an [`Endpoint`].
pub struct EnvironmentListener {
    listener: Listener,
    frame_config: FrameConfig,
    next_session_id: AtomicU64,
}

impl EnvironmentListener {
    /// Bind to an endpoint. Unix sockets are created with mode 0600.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        let listener = endpoint.bind()?;
        info!(endpoint = %listener.endpoint(), "listening");
        Ok(Self {
            listener,
            frame_config: FrameConfig::default(),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Override frame configuration for accepted sessions.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Accept the next session (blocking).
    pub fn accept(&self) -> Result<Session> {
        let stream = self.listener.accept()?;
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        info!(
            session = id,
            transport = stream.transport_name(),
            "accepted session"
        );
        Ok(Session {
            id,
            stream,
            frame_config: self.frame_config.clone(),
        })
    }

    /// The endpoint clients should connect to.
    pub fn endpoint(&self) -> Endpoint {
        self.listener.endpoint()
    }
}

impl std::fmt::Debug for EnvironmentListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentListener")
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

/// An accepted, not yet served client session.
#[derive(Debug)]
pub struct Session {
    id: u64,
    stream: Stream,
    frame_config: FrameConfig,
}

impl Session {
    /// Listener-assigned id, starting at 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Peer (pid, uid, gid) for Unix domain socket sessions on Linux.
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        self.stream.peer_credentials()
    }

    /// Serve requests until the client closes the session.
    pub fn serve<E>(self, environment: &mut E) -> Result<u64>
    where
        E: Environment + ?Sized,
    {
        let served = serve_stream_with_config(self.stream, environment, self.frame_config)?;
        info!(session = self.id, served, "session ended");
        Ok(served)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;
    use std::thread;

    use envrpc_proto::{
        CreateWorldResponse, DestroyWorldRequest, DestroyWorldResponse, JoinWorldRequest,
    };

    use super::*;
    use crate::connector::connect;
    use crate::envelope::pack_environment_request;

    fn make_sock_path(tag: &str) -> PathBuf {
        let dir = std::path::PathBuf::from(format!(
            "/tmp/envrpc-srv-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("env.sock")
    }

    struct Worlds {
        created: Vec<String>,
    }

    impl Environment for Worlds {
        fn handle(&mut self, request: RequestPayload) -> HandlerResult {
            match request {
                RequestPayload::CreateWorld(_) => {
                    let name = format!("world-{}", self.created.len());
                    self.created.push(name.clone());
                    Ok(ResponsePayload::CreateWorld(CreateWorldResponse {
                        world_name: name,
                    }))
                }
                RequestPayload::DestroyWorld(DestroyWorldRequest { world_name }) => {
                    if self.created.contains(&world_name) {
                        Ok(ResponsePayload::DestroyWorld(DestroyWorldResponse {}))
                    } else {
                        Err(Status::new(code::NOT_FOUND, format!("no world {world_name}")))
                    }
                }
                other => Err(Status::new(
                    code::UNIMPLEMENTED,
                    format!("{} is not supported", EnvelopeField::of_request(&other)),
                )),
            }
        }
    }

    fn raw_pair() -> (FrameReader<Stream>, FrameWriter<Stream>, thread::JoinHandle<u64>) {
        let (client, server) = UnixStream::pair().expect("socket pair should open");
        let handle = thread::spawn(move || {
            let mut worlds = Worlds {
                created: Vec::new(),
            };
            serve_stream(Stream::from(server), &mut worlds).expect("server should run")
        });
        let client = Stream::from(client);
        let reader = FrameReader::new(client.try_clone().expect("stream should clone"));
        let writer = FrameWriter::new(client);
        (reader, writer, handle)
    }

    #[test]
    fn trait_environment_keeps_state() {
        let (mut reader, mut writer, handle) = raw_pair();

        writer
            .write_message(&pack_environment_request(
                envrpc_proto::CreateWorldRequest::default(),
            ))
            .expect("request should be written");
        let response: EnvironmentResponse = reader.read_message().expect("response should arrive");
        assert!(matches!(
            response.payload,
            Some(ResponsePayload::CreateWorld(ref r)) if r.world_name == "world-0"
        ));

        writer
            .write_message(&pack_environment_request(JoinWorldRequest::default()))
            .expect("request should be written");
        let response: EnvironmentResponse = reader.read_message().expect("response should arrive");
        assert!(matches!(
            response.payload,
            Some(ResponsePayload::Error(ref s))
                if s.code == code::UNIMPLEMENTED && s.message == "join_world is not supported"
        ));

        drop(writer);
        drop(reader);
        assert_eq!(handle.join().expect("server thread should finish"), 2);
    }

    #[test]
    fn undecodable_request_gets_error_and_loop_continues() {
        let (mut reader, mut writer, handle) = raw_pair();

        writer
            .write_frame(&[0xFF, 0xFF, 0xFF])
            .expect("garbage frame should be written");
        let response: EnvironmentResponse = reader.read_message().expect("response should arrive");
        assert!(matches!(
            response.payload,
            Some(ResponsePayload::Error(ref s)) if s.code == code::INVALID_ARGUMENT
        ));

        writer
            .write_message(&EnvironmentRequest::default())
            .expect("empty envelope should be written");
        let response: EnvironmentResponse = reader.read_message().expect("response should arrive");
        assert!(matches!(
            response.payload,
            Some(ResponsePayload::Error(ref s)) if s.message == "envelope has no payload"
        ));

        writer
            .write_message(&pack_environment_request(DestroyWorldRequest {
                world_name: "missing".to_string(),
            }))
            .expect("request should be written");
        let response: EnvironmentResponse = reader.read_message().expect("response should arrive");
        assert!(matches!(
            response.payload,
            Some(ResponsePayload::Error(ref s)) if s.code == code::NOT_FOUND
        ));

        drop(writer);
        drop(reader);
        assert_eq!(handle.join().expect("server thread should finish"), 3);
    }

    #[test]
    fn listener_assigns_session_ids() {
        let sock_path = make_sock_path("ids");
        let endpoint = Endpoint::Unix(sock_path.clone());
        let listener = EnvironmentListener::bind(&endpoint).expect("listener should bind");
        assert_eq!(listener.endpoint(), endpoint);

        let server = thread::spawn(move || {
            let first = listener.accept().expect("first accept should succeed");
            let second = listener.accept().expect("second accept should succeed");
            assert_eq!(first.id(), 1);
            assert_eq!(second.id(), 2);
            #[cfg(target_os = "linux")]
            assert_eq!(
                first.peer_credentials().map(|(pid, _, _)| pid),
                Some(std::process::id())
            );
        });

        let _c1 = connect(&endpoint).expect("first client should connect");
        let _c2 = connect(&endpoint).expect("second client should connect");
        server.join().expect("server thread should finish");

        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }
}
