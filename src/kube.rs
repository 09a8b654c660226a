//! The source object model: Kubernetes resources as delivered by an external
//! watcher, restricted to the kinds and fields conversion needs.
//!
//! Unknown fields are ignored and missing sections default, since the external
//! representation is much wider than what the converters consume.

use crate::error::ConversionError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A Kubernetes resource of one of the known kinds, tagged by its `kind`
/// field exactly as the external JSON representation tags it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum KubeObject {
    Pod(Pod),
    Namespace(Namespace),
    NetworkPolicy(NetworkPolicy),
    Node(Node),
    ServiceAccount(ServiceAccount),
}

impl KubeObject {
    /// Decode an object from the JSON representation the external system
    /// delivers. Objects with an unknown `kind` are rejected.
    pub fn from_json(input: &str) -> Result<KubeObject, ConversionError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            KubeObject::Pod(_) => ObjectKind::Pod,
            KubeObject::Namespace(_) => ObjectKind::Namespace,
            KubeObject::NetworkPolicy(_) => ObjectKind::NetworkPolicy,
            KubeObject::Node(_) => ObjectKind::Node,
            KubeObject::ServiceAccount(_) => ObjectKind::ServiceAccount,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            KubeObject::Pod(pod) => &pod.metadata,
            KubeObject::Namespace(namespace) => &namespace.metadata,
            KubeObject::NetworkPolicy(policy) => &policy.metadata,
            KubeObject::Node(node) => &node.metadata,
            KubeObject::ServiceAccount(account) => &account.metadata,
        }
    }
}

/// The kinds of source objects a converter can be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Pod,
    Namespace,
    NetworkPolicy,
    Node,
    ServiceAccount,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Pod => "Pod",
            ObjectKind::Namespace => "Namespace",
            ObjectKind::NetworkPolicy => "NetworkPolicy",
            ObjectKind::Node => "Node",
            ObjectKind::ServiceAccount => "ServiceAccount",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub uid: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<FixedOffset>>,
}

impl ObjectMeta {
    pub fn require_name(&self) -> Result<String, ConversionError> {
        if self.name.is_empty() {
            Err(ConversionError::MissingField("name"))
        } else {
            Ok(self.name.clone())
        }
    }

    pub fn require_namespace(&self) -> Result<String, ConversionError> {
        match &self.namespace {
            Some(namespace) if !namespace.is_empty() => Ok(namespace.clone()),
            _ => Err(ConversionError::MissingField("namespace")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    pub status: PodStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    pub host_network: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodStatus {
    #[serde(rename = "podIP", skip_serializing_if = "Option::is_none")]
    pub pod_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccount {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPolicy {
    pub metadata: ObjectMeta,
    pub spec: NetworkPolicySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkPolicySpec {
    pub pod_selector: LabelSelector,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<IngressRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<EgressRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policy_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<PolicyPeer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PolicyPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EgressRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<PolicyPeer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PolicyPort>,
}

/// One source a rule allows traffic from, or one destination it allows
/// traffic to. `ip_block` is exclusive of the two selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyPeer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_block: Option<IpBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpBlock {
    pub cidr: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyPort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
}

/// Ports appear in the source representation either as numbers or as names
/// declared on a container. Only numeric ports are convertible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Name(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub metadata: ObjectMeta,
    pub spec: NodeSpec,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    #[serde(rename = "podCIDR", skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStatus {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<NodeAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decoding_a_pod_reads_the_fields_conversion_needs() {
        let object = KubeObject::from_json(
            r#"{
                "kind": "Pod",
                "apiVersion": "v1",
                "metadata": {
                    "name": "frontend-7d4b",
                    "namespace": "web",
                    "uid": "f00d",
                    "resourceVersion": "12345",
                    "labels": {"app": "frontend"},
                    "creationTimestamp": "2021-11-16T17:45:40+01:00"
                },
                "spec": {
                    "nodeName": "worker-0",
                    "hostNetwork": false,
                    "serviceAccountName": "web-frontend",
                    "containers": []
                },
                "status": {
                    "podIP": "10.1.2.3",
                    "phase": "Running"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(object.kind(), ObjectKind::Pod);
        assert_eq!(object.metadata().name, "frontend-7d4b");
        assert_eq!(object.metadata().namespace.as_deref(), Some("web"));

        let pod = match object {
            KubeObject::Pod(pod) => pod,
            _ => panic!("expected a pod"),
        };
        assert_eq!(pod.spec.node_name.as_deref(), Some("worker-0"));
        assert_eq!(pod.status.pod_ip.as_deref(), Some("10.1.2.3"));
        assert_eq!(
            pod.metadata.creation_timestamp.unwrap().to_rfc3339(),
            "2021-11-16T17:45:40+01:00"
        );
    }

    #[test]
    fn decoding_dispatches_on_the_kind_tag() {
        let object =
            KubeObject::from_json(r#"{"kind": "Namespace", "metadata": {"name": "web"}}"#).unwrap();
        assert_eq!(object.kind(), ObjectKind::Namespace);

        let object =
            KubeObject::from_json(r#"{"kind": "Node", "metadata": {"name": "worker-0"}}"#).unwrap();
        assert_eq!(object.kind(), ObjectKind::Node);
    }

    #[test]
    fn decoding_an_unknown_kind_is_rejected() {
        let result = KubeObject::from_json(r#"{"kind": "Secret", "metadata": {"name": "creds"}}"#);
        assert_matches!(result, Err(ConversionError::FromSerdeJson(_)));
    }

    #[test]
    fn missing_sections_default_instead_of_failing() {
        let object = KubeObject::from_json(r#"{"kind": "Pod", "metadata": {"name": "p"}}"#).unwrap();
        let pod = match object {
            KubeObject::Pod(pod) => pod,
            _ => panic!("expected a pod"),
        };
        assert_eq!(pod.spec.node_name, None);
        assert!(!pod.spec.host_network);
        assert_eq!(pod.status.pod_ip, None);
    }

    #[test]
    fn named_and_numeric_ports_both_decode() {
        let policy = KubeObject::from_json(
            r#"{
                "kind": "NetworkPolicy",
                "metadata": {"name": "allow-web", "namespace": "web"},
                "spec": {
                    "podSelector": {},
                    "ingress": [{"ports": [{"port": 8080}, {"port": "metrics"}]}]
                }
            }"#,
        )
        .unwrap();

        let policy = match policy {
            KubeObject::NetworkPolicy(policy) => policy,
            _ => panic!("expected a network policy"),
        };
        let ports = &policy.spec.ingress[0].ports;
        assert_eq!(ports[0].port, Some(PortValue::Number(8080)));
        assert_eq!(ports[1].port, Some(PortValue::Name("metrics".into())));
    }

    #[test]
    fn empty_names_are_reported_as_missing() {
        let metadata = ObjectMeta::default();
        assert_matches!(
            metadata.require_name(),
            Err(ConversionError::MissingField("name"))
        );
        assert_matches!(
            metadata.require_namespace(),
            Err(ConversionError::MissingField("namespace"))
        );
    }
}
