//! The canonical datastore model produced by conversion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// A converted object, ready to be keyed and stored by the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CanonicalObject {
    Profile(Profile),
    WorkloadEndpoint(WorkloadEndpoint),
    Policy(Policy),
    Node(Node),
}

impl CanonicalObject {
    /// The stable cache key of this object: `<namespace>/<name>` for
    /// namespaced kinds, the bare name for cluster-scoped ones.
    ///
    /// Total over every object a converter can produce, and non-empty since
    /// conversion validates the name fields.
    pub fn key(&self) -> String {
        match self {
            CanonicalObject::Profile(profile) => profile.name.clone(),
            CanonicalObject::WorkloadEndpoint(endpoint) => {
                format!("{}/{}", endpoint.namespace, endpoint.name)
            }
            CanonicalObject::Policy(policy) => format!("{}/{}", policy.namespace, policy.name),
            CanonicalObject::Node(node) => node.name.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CanonicalObject::Profile(_) => "Profile",
            CanonicalObject::WorkloadEndpoint(_) => "WorkloadEndpoint",
            CanonicalObject::Policy(_) => "Policy",
            CanonicalObject::Node(_) => "Node",
        }
    }
}

/// A grouping object referenced by workload endpoints. Carries the labels to
/// apply to every member workload and the baseline rules for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels_to_apply: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<Rule>,
}

/// One networked pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEndpoint {
    pub namespace: String,
    pub name: String,
    pub node: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_nets: Vec<String>,
    pub interface_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub namespace: String,
    pub name: String,
    pub order: f64,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub egress: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_types: Vec<PolicyType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "EntityRule::is_empty")]
    pub source: EntityRule,
    #[serde(default, skip_serializing_if = "EntityRule::is_empty")]
    pub destination: EntityRule,
}

impl Rule {
    /// A rule matching all traffic, used as the baseline of namespace
    /// profiles.
    pub fn allow_all() -> Rule {
        Rule {
            action: Action::Allow,
            protocol: None,
            source: EntityRule::default(),
            destination: EntityRule::default(),
        }
    }
}

/// The endpoints a rule matches on one side of the connection. An empty
/// entity rule matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_nets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
}

impl EntityRule {
    pub fn is_empty(&self) -> bool {
        self.selector.is_none()
            && self.nets.is_empty()
            && self.not_nets.is_empty()
            && self.ports.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Sctp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    Ingress,
    Egress,
}
