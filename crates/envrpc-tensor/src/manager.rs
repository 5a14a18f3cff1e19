use std::collections::{BTreeMap, HashMap};

use envrpc_proto::{Tensor, TensorSpec};
use tracing::debug;

use crate::codec::{pack, tensor_dtype, unpack};
use crate::error::{Result, TensorError};
use crate::spec::{shape_matches, validate_spec};
use crate::value::TensorValue;

/// Maps between the names applications use and the UIDs a session uses on
/// the wire, and packs/unpacks whole value maps against the advertised specs.
///
/// Built once from the specs a peer advertised; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SpecManager {
    specs_by_uid: BTreeMap<u64, TensorSpec>,
    name_to_uid: BTreeMap<String, u64>,
}

impl SpecManager {
    /// Build from UID-keyed specs.
    ///
    /// Fails if a spec has more than one variable dimension or two specs
    /// share a name.
    pub fn new<I>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u64, TensorSpec)>,
    {
        let mut specs_by_uid = BTreeMap::new();
        let mut name_to_uid = BTreeMap::new();
        for (uid, spec) in specs {
            validate_spec(&spec)?;
            if name_to_uid.insert(spec.name.clone(), uid).is_some() {
                return Err(TensorError::DuplicateName { name: spec.name });
            }
            specs_by_uid.insert(uid, spec);
        }
        debug!(specs = specs_by_uid.len(), "built spec manager");
        Ok(Self {
            specs_by_uid,
            name_to_uid,
        })
    }

    /// Pack name-keyed values into UID-keyed tensors, casting each value to
    /// its spec's dtype and checking the resulting shape.
    pub fn pack<'a, I, K>(&self, values: I) -> Result<HashMap<u64, Tensor>>
    where
        I: IntoIterator<Item = (K, &'a TensorValue)>,
        K: AsRef<str>,
    {
        let mut packed = HashMap::new();
        for (name, value) in values {
            let name = name.as_ref();
            let uid = self.name_to_uid(name)?;
            let spec = self.uid_to_spec(uid)?;
            let tensor = pack(value, Some(spec.dtype()), false).map_err(|source| {
                TensorError::Pack {
                    name: name.to_string(),
                    source: Box::new(source),
                }
            })?;
            check_shape(&tensor, spec)?;
            packed.insert(uid, tensor);
        }
        Ok(packed)
    }

    /// Unpack UID-keyed tensors into name-keyed values, checking shape and
    /// dtype against each tensor's spec.
    pub fn unpack<'a, I>(&self, tensors: I) -> Result<HashMap<String, TensorValue>>
    where
        I: IntoIterator<Item = (&'a u64, &'a Tensor)>,
    {
        let mut unpacked = HashMap::new();
        for (&uid, tensor) in tensors {
            let spec = self.uid_to_spec(uid)?;
            check_shape(tensor, spec)?;

            let unpack_error = |source| TensorError::Unpack {
                name: spec.name.clone(),
                source: Box::new(source),
            };
            let actual = tensor_dtype(tensor).map_err(unpack_error)?;
            if actual != spec.dtype() {
                return Err(TensorError::DtypeMismatch {
                    name: spec.name.clone(),
                    actual,
                    expected: spec.dtype(),
                });
            }
            let value = unpack(tensor).map_err(unpack_error)?;
            unpacked.insert(spec.name.clone(), value);
        }
        Ok(unpacked)
    }

    pub fn name_to_uid(&self, name: &str) -> Result<u64> {
        self.name_to_uid
            .get(name)
            .copied()
            .ok_or_else(|| TensorError::UnknownName {
                name: name.to_string(),
            })
    }

    pub fn uid_to_name(&self, uid: u64) -> Result<&str> {
        self.uid_to_spec(uid).map(|spec| spec.name.as_str())
    }

    pub fn name_to_spec(&self, name: &str) -> Result<&TensorSpec> {
        self.uid_to_spec(self.name_to_uid(name)?)
    }

    pub fn uid_to_spec(&self, uid: u64) -> Result<&TensorSpec> {
        self.specs_by_uid
            .get(&uid)
            .ok_or(TensorError::UnknownUid { uid })
    }

    /// Spec names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name_to_uid.keys().map(String::as_str)
    }

    /// UIDs in ascending order.
    pub fn uids(&self) -> impl Iterator<Item = u64> + '_ {
        self.specs_by_uid.keys().copied()
    }

    pub fn specs_by_uid(&self) -> &BTreeMap<u64, TensorSpec> {
        &self.specs_by_uid
    }

    pub fn len(&self) -> usize {
        self.specs_by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs_by_uid.is_empty()
    }
}

fn check_shape(tensor: &Tensor, spec: &TensorSpec) -> Result<()> {
    if shape_matches(&tensor.shape, &spec.shape) {
        return Ok(());
    }
    Err(TensorError::ShapeMismatch {
        name: spec.name.clone(),
        actual: tensor.shape.clone(),
        expected: spec.shape.clone(),
    })
}
