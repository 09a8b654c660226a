use crate::canonical::{Action, CanonicalObject, EntityRule, Policy, PolicyType, Protocol, Rule};
use crate::converter::{Converter, ConverterConfig};
use crate::error::ConversionError;
use crate::kube::{
    EgressRule, IngressRule, KubeObject, NetworkPolicy, NetworkPolicySpec, ObjectKind, PolicyPeer,
    PolicyPort, PortValue,
};
use crate::namespace_converter::NAMESPACE_PROFILE_PREFIX;
use crate::selector::{selector_expression, selector_expression_with_prefix};

/// Prefix of canonical policy names derived from network policies, keeping
/// them apart from natively-created policies.
pub(crate) const POLICY_NAME_PREFIX: &str = "knp.";

/// Converts a network policy into a canonical policy.
pub struct PolicyConverter {
    config: ConverterConfig,
}

impl PolicyConverter {
    pub fn new(config: ConverterConfig) -> Self {
        PolicyConverter { config }
    }

    fn try_convert_policy(&self, policy: &NetworkPolicy) -> Result<Policy, ConversionError> {
        let name = policy.metadata.require_name()?;
        let namespace = policy.metadata.require_namespace()?;
        let selector = selector_expression(&policy.spec.pod_selector)?;

        let mut ingress = Vec::new();
        for rule in &policy.spec.ingress {
            ingress.extend(convert_ingress_rule(rule)?);
        }
        let mut egress = Vec::new();
        for rule in &policy.spec.egress {
            egress.extend(convert_egress_rule(rule)?);
        }

        Ok(Policy {
            namespace,
            name: format!("{}{}", POLICY_NAME_PREFIX, name),
            order: self.config.policy_order,
            selector,
            ingress,
            egress,
            applied_types: applied_policy_types(&policy.spec)?,
        })
    }
}

impl Converter for PolicyConverter {
    type Error = ConversionError;

    fn source_kind(&self) -> ObjectKind {
        ObjectKind::NetworkPolicy
    }

    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, ConversionError> {
        let policy = match input {
            KubeObject::NetworkPolicy(policy) => policy,
            other => {
                return Err(ConversionError::UnexpectedKind {
                    expected: ObjectKind::NetworkPolicy,
                    actual: other.kind(),
                })
            }
        };
        Ok(CanonicalObject::Policy(self.try_convert_policy(policy)?))
    }
}

/// One source ingress rule expands into one canonical rule per peer and
/// protocol group; an empty peer list admits traffic from anywhere.
fn convert_ingress_rule(rule: &IngressRule) -> Result<Vec<Rule>, ConversionError> {
    let groups = port_groups(&rule.ports)?;
    let mut rules = Vec::new();

    if rule.from.is_empty() {
        for (protocol, ports) in &groups {
            rules.push(Rule {
                action: Action::Allow,
                protocol: *protocol,
                source: EntityRule::default(),
                destination: ports_entity(ports),
            });
        }
        return Ok(rules);
    }

    for peer in &rule.from {
        let source = peer_entity_rule(peer)?;
        for (protocol, ports) in &groups {
            rules.push(Rule {
                action: Action::Allow,
                protocol: *protocol,
                source: source.clone(),
                destination: ports_entity(ports),
            });
        }
    }
    Ok(rules)
}

fn convert_egress_rule(rule: &EgressRule) -> Result<Vec<Rule>, ConversionError> {
    let groups = port_groups(&rule.ports)?;
    let mut rules = Vec::new();

    if rule.to.is_empty() {
        for (protocol, ports) in &groups {
            rules.push(Rule {
                action: Action::Allow,
                protocol: *protocol,
                source: EntityRule::default(),
                destination: ports_entity(ports),
            });
        }
        return Ok(rules);
    }

    for peer in &rule.to {
        let mut destination = peer_entity_rule(peer)?;
        for (protocol, ports) in &groups {
            destination.ports = ports.clone();
            rules.push(Rule {
                action: Action::Allow,
                protocol: *protocol,
                source: EntityRule::default(),
                destination: destination.clone(),
            });
        }
    }
    Ok(rules)
}

fn ports_entity(ports: &[u16]) -> EntityRule {
    EntityRule {
        ports: ports.to_vec(),
        ..EntityRule::default()
    }
}

/// Translate one peer into the entity rule matching it. A namespace selector
/// matches the `kns.` labels namespace profiles apply, so its keys are
/// prefixed accordingly; an IP block is exclusive of the selectors.
fn peer_entity_rule(peer: &PolicyPeer) -> Result<EntityRule, ConversionError> {
    if let Some(block) = &peer.ip_block {
        return Ok(EntityRule {
            nets: vec![block.cidr.clone()],
            not_nets: block.except.clone(),
            ..EntityRule::default()
        });
    }

    let mut conjuncts = Vec::new();
    if let Some(namespace_selector) = &peer.namespace_selector {
        conjuncts.push(selector_expression_with_prefix(
            namespace_selector,
            NAMESPACE_PROFILE_PREFIX,
        )?);
    }
    if let Some(pod_selector) = &peer.pod_selector {
        conjuncts.push(selector_expression(pod_selector)?);
    }
    if conjuncts.is_empty() {
        return Err(ConversionError::InvalidSelector(
            "policy peer selects nothing".into(),
        ));
    }
    Ok(EntityRule {
        selector: Some(conjuncts.join(" && ")),
        ..EntityRule::default()
    })
}

/// Group a rule's ports by protocol, defaulting the protocol to TCP the way
/// the source system does. An empty port list yields a single unrestricted
/// group.
fn port_groups(ports: &[PolicyPort]) -> Result<Vec<(Option<Protocol>, Vec<u16>)>, ConversionError> {
    if ports.is_empty() {
        return Ok(vec![(None, Vec::new())]);
    }

    let mut groups: Vec<(Protocol, Vec<u16>)> = Vec::new();
    for port in ports {
        let protocol = match port.protocol.as_deref() {
            None | Some("TCP") => Protocol::Tcp,
            Some("UDP") => Protocol::Udp,
            Some("SCTP") => Protocol::Sctp,
            Some(other) => return Err(ConversionError::InvalidProtocol(other.to_string())),
        };
        let number = match &port.port {
            Some(PortValue::Number(number)) => Some(*number),
            Some(PortValue::Name(name)) => return Err(ConversionError::NamedPort(name.clone())),
            None => None,
        };
        match groups.iter_mut().find(|(existing, _)| *existing == protocol) {
            Some((_, numbers)) => {
                if let Some(number) = number {
                    numbers.push(number);
                }
            }
            None => groups.push((protocol, number.into_iter().collect())),
        }
    }

    Ok(groups
        .into_iter()
        .map(|(protocol, numbers)| (Some(protocol), numbers))
        .collect())
}

/// Which directions the converted policy applies to. An absent list means
/// the policy restricts ingress, plus egress when egress rules are present.
fn applied_policy_types(spec: &NetworkPolicySpec) -> Result<Vec<PolicyType>, ConversionError> {
    if spec.policy_types.is_empty() {
        let mut types = vec![PolicyType::Ingress];
        if !spec.egress.is_empty() {
            types.push(PolicyType::Egress);
        }
        return Ok(types);
    }

    spec.policy_types
        .iter()
        .map(|value| match value.as_str() {
            "Ingress" => Ok(PolicyType::Ingress),
            "Egress" => Ok(PolicyType::Egress),
            other => Err(ConversionError::InvalidPolicyType(other.to_string())),
        })
        .collect()
}
