//! # Ownership
//!
//! Owner references are non-owning back-links: an identity tuple that can be
//! compared and looked up, nothing more.

use crate::Error;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

/// Identity of an owning object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerIdentity {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
}

impl OwnerIdentity {
    /// Identity of a typed resource; fails if it has no name or uid yet
    pub fn from_resource<K>(obj: &K) -> Result<Self, Error>
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = K::kind(&()).to_string();
        let name = obj.meta().name.clone().ok_or_else(|| Error::MissingObjectKey {
            kind: kind.clone(),
            field: "name",
        })?;
        let uid = obj.meta().uid.clone().ok_or_else(|| Error::MissingObjectKey {
            kind: kind.clone(),
            field: "uid",
        })?;
        Ok(Self {
            api_version: K::api_version(&()).to_string(),
            kind,
            name,
            uid,
        })
    }

    /// All four fields match exactly
    #[must_use]
    pub fn matches(&self, owner: &OwnerReference) -> bool {
        owner.api_version == self.api_version
            && owner.kind == self.kind
            && owner.name == self.name
            && owner.uid == self.uid
    }

    #[must_use]
    pub fn to_owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            ..Default::default()
        }
    }
}

/// Whether any owner reference on `obj` matches `owner`
#[must_use]
pub fn is_owned_by<K: Resource>(obj: &K, owner: &OwnerIdentity) -> bool {
    obj.meta()
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| owner.matches(r)))
}

/// Add `owner` to the owner references of `obj` unless already present
///
/// Returns whether the references changed.
pub fn ensure_owner_reference<K: Resource>(obj: &mut K, owner: &OwnerIdentity) -> bool {
    if is_owned_by(obj, owner) {
        return false;
    }
    obj.meta_mut()
        .owner_references
        .get_or_insert_with(Vec::new)
        .push(owner.to_owner_reference());
    true
}
