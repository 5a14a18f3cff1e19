use std::fmt;

use envrpc_proto::{Any, TYPE_URL_PREFIX};
use prost::{Message, Name};

use crate::error::{ConnectionError, Result};

/// Wrap an application message into an `Any` for the `extension` field.
pub fn pack_extension<M: Message + Name>(message: &M) -> Any {
    Any {
        type_url: format!("{TYPE_URL_PREFIX}{}", M::full_name()),
        value: message.encode_to_vec(),
    }
}

/// Fully-qualified message name embedded in an `Any` type URL.
pub fn type_name(any: &Any) -> &str {
    any.type_url
        .rsplit_once('/')
        .map_or(any.type_url.as_str(), |(_, name)| name)
}

/// Unwrap an extension that must be of type `M`.
pub fn unpack_extension<M>(any: &Any) -> Result<M>
where
    M: Message + Name + Default + 'static,
{
    ExtensionRegistry::new().with(|message: M| message).unpack(any)
}

type Decoder<T> = Box<dyn Fn(&[u8]) -> std::result::Result<T, prost::DecodeError> + Send + Sync>;

/// Allow-list of extension message types, each mapped into a common `T`
/// (typically an application enum).
///
/// ```
/// use envrpc_connection::ExtensionRegistry;
/// use envrpc_proto::{LeaveWorldRequest, ResetRequest};
///
/// enum Command {
///     Leave(LeaveWorldRequest),
///     Reset(ResetRequest),
/// }
///
/// let registry = ExtensionRegistry::new()
///     .with(Command::Leave)
///     .with(Command::Reset);
/// assert_eq!(registry.known().len(), 2);
/// ```
pub struct ExtensionRegistry<T> {
    decoders: Vec<(String, Decoder<T>)>,
}

impl<T> ExtensionRegistry<T> {
    pub fn new() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Allow message type `M`, converted with `wrap` when unpacked.
    pub fn with<M, F>(mut self, wrap: F) -> Self
    where
        M: Message + Name + Default + 'static,
        F: Fn(M) -> T + Send + Sync + 'static,
    {
        let decoder: Decoder<T> = Box::new(move |bytes: &[u8]| M::decode(bytes).map(&wrap));
        self.decoders.push((M::full_name(), decoder));
        self
    }

    /// Type URLs of the allowed messages, in registration order.
    pub fn known(&self) -> Vec<String> {
        self.decoders
            .iter()
            .map(|(name, _)| format!("{TYPE_URL_PREFIX}{name}"))
            .collect()
    }

    /// Decode `any` if its type is allowed.
    pub fn unpack(&self, any: &Any) -> Result<T> {
        let name = type_name(any);
        match self.decoders.iter().find(|(known, _)| known == name) {
            Some((_, decode)) => Ok(decode(&any.value)?),
            None => Err(ConnectionError::UnknownExtension {
                type_url: any.type_url.clone(),
                known: self.known(),
            }),
        }
    }
}

impl<T> Default for ExtensionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ExtensionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("known", &self.known())
            .finish()
    }
}
