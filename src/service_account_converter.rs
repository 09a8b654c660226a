use crate::canonical::{CanonicalObject, Profile};
use crate::converter::Converter;
use crate::error::ConversionError;
use crate::kube::{KubeObject, ObjectKind, ServiceAccount};
use std::collections::BTreeMap;

/// Prefix of profile names and applied label keys derived from service
/// accounts.
pub(crate) const SERVICE_ACCOUNT_PROFILE_PREFIX: &str = "ksa.";

/// Converts a service account into an identity profile. The profile carries
/// no rules of its own; it exists so selectors can match workloads by the
/// account they run under.
pub struct ServiceAccountConverter;

impl ServiceAccountConverter {
    pub fn new() -> Self {
        ServiceAccountConverter
    }

    fn try_convert_account(&self, account: &ServiceAccount) -> Result<Profile, ConversionError> {
        let name = account.metadata.require_name()?;
        let namespace = account.metadata.require_namespace()?;

        let labels_to_apply: BTreeMap<String, String> = account
            .metadata
            .labels
            .iter()
            .map(|(key, value)| {
                (
                    format!("{}{}", SERVICE_ACCOUNT_PROFILE_PREFIX, key),
                    value.clone(),
                )
            })
            .collect();

        Ok(Profile {
            name: format!("{}{}.{}", SERVICE_ACCOUNT_PROFILE_PREFIX, namespace, name),
            labels_to_apply,
            ingress: vec![],
            egress: vec![],
        })
    }
}

impl Converter for ServiceAccountConverter {
    type Error = ConversionError;

    fn source_kind(&self) -> ObjectKind {
        ObjectKind::ServiceAccount
    }

    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, ConversionError> {
        let account = match input {
            KubeObject::ServiceAccount(account) => account,
            other => {
                return Err(ConversionError::UnexpectedKind {
                    expected: ObjectKind::ServiceAccount,
                    actual: other.kind(),
                })
            }
        };
        Ok(CanonicalObject::Profile(self.try_convert_account(account)?))
    }
}
