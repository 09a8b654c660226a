use crate::canonical::{CanonicalObject, Profile, Rule};
use crate::converter::Converter;
use crate::error::ConversionError;
use crate::kube::{KubeObject, Namespace, ObjectKind};
use std::collections::BTreeMap;

/// Prefix of profile names and applied label keys derived from namespaces.
/// Keeps them apart from natively-created profiles and from workload labels.
pub(crate) const NAMESPACE_PROFILE_PREFIX: &str = "kns.";

/// Converts a namespace into the profile shared by all its workloads.
pub struct NamespaceConverter;

impl NamespaceConverter {
    pub fn new() -> Self {
        NamespaceConverter
    }

    fn try_convert_namespace(&self, namespace: &Namespace) -> Result<Profile, ConversionError> {
        let name = namespace.metadata.require_name()?;

        let labels_to_apply: BTreeMap<String, String> = namespace
            .metadata
            .labels
            .iter()
            .map(|(key, value)| {
                (
                    format!("{}{}", NAMESPACE_PROFILE_PREFIX, key),
                    value.clone(),
                )
            })
            .collect();

        // Namespace membership alone does not isolate: the profile admits
        // all traffic, and isolation comes from converted policies.
        Ok(Profile {
            name: format!("{}{}", NAMESPACE_PROFILE_PREFIX, name),
            labels_to_apply,
            ingress: vec![Rule::allow_all()],
            egress: vec![Rule::allow_all()],
        })
    }
}

impl Converter for NamespaceConverter {
    type Error = ConversionError;

    fn source_kind(&self) -> ObjectKind {
        ObjectKind::Namespace
    }

    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, ConversionError> {
        let namespace = match input {
            KubeObject::Namespace(namespace) => namespace,
            other => {
                return Err(ConversionError::UnexpectedKind {
                    expected: ObjectKind::Namespace,
                    actual: other.kind(),
                })
            }
        };
        Ok(CanonicalObject::Profile(
            self.try_convert_namespace(namespace)?,
        ))
    }
}
