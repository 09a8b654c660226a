use crate::canonical::{CanonicalObject, WorkloadEndpoint};
use crate::converter::{Converter, ConverterConfig};
use crate::error::ConversionError;
use crate::kube::{KubeObject, ObjectKind, Pod};
use crate::namespace_converter::NAMESPACE_PROFILE_PREFIX;
use crate::service_account_converter::SERVICE_ACCOUNT_PROFILE_PREFIX;
use std::net::IpAddr;

/// Converts a pod into a workload endpoint.
///
/// Only pods that are scheduled and networked through the data plane can be
/// represented: host-networked pods and pods without an assigned IP are
/// rejected, and the consumer retries once the pod reaches a convertible
/// state.
pub struct PodConverter {
    config: ConverterConfig,
}

impl PodConverter {
    pub fn new(config: ConverterConfig) -> Self {
        PodConverter { config }
    }

    fn try_convert_pod(&self, pod: &Pod) -> Result<WorkloadEndpoint, ConversionError> {
        let name = pod.metadata.require_name()?;
        let namespace = pod.metadata.require_namespace()?;

        let node = match &pod.spec.node_name {
            Some(node) => node.clone(),
            None => return Err(ConversionError::PodNotScheduled { pod: name }),
        };
        if pod.spec.host_network {
            return Err(ConversionError::PodNotNetworked { pod: name });
        }
        let pod_ip = match &pod.status.pod_ip {
            Some(pod_ip) => pod_ip,
            None => return Err(ConversionError::PodNotNetworked { pod: name }),
        };
        let address: IpAddr = pod_ip.parse()?;
        let ip_net = match address {
            IpAddr::V4(_) => format!("{}/32", address),
            IpAddr::V6(_) => format!("{}/128", address),
        };

        let mut profile_ids = vec![format!("{}{}", NAMESPACE_PROFILE_PREFIX, namespace)];
        if let Some(account) = &pod.spec.service_account_name {
            profile_ids.push(format!(
                "{}{}.{}",
                SERVICE_ACCOUNT_PROFILE_PREFIX, namespace, account
            ));
        }

        Ok(WorkloadEndpoint {
            namespace,
            name,
            node,
            ip_nets: vec![ip_net],
            interface_name: self.config.pod_interface.clone(),
            profile_ids,
            labels: pod.metadata.labels.clone(),
        })
    }
}

impl Converter for PodConverter {
    type Error = ConversionError;

    fn source_kind(&self) -> ObjectKind {
        ObjectKind::Pod
    }

    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, ConversionError> {
        let pod = match input {
            KubeObject::Pod(pod) => pod,
            other => {
                return Err(ConversionError::UnexpectedKind {
                    expected: ObjectKind::Pod,
                    actual: other.kind(),
                })
            }
        };
        Ok(CanonicalObject::WorkloadEndpoint(
            self.try_convert_pod(pod)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_converter() -> PodConverter {
        PodConverter::new(ConverterConfig::default())
    }

    fn new_pod(input: &str) -> KubeObject {
        KubeObject::from_json(input).unwrap()
    }

    #[test]
    fn converting_a_networked_pod_yields_a_workload_endpoint() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {
                    "name": "frontend-7d4b",
                    "namespace": "web",
                    "labels": {"app": "frontend"}
                },
                "spec": {
                    "nodeName": "worker-0",
                    "serviceAccountName": "web-frontend"
                },
                "status": {"podIP": "10.1.2.3", "phase": "Running"}
            }"#,
        );

        let output = converter.try_convert(&pod).unwrap();
        assert_eq!(converter.key(&output), "web/frontend-7d4b");

        let endpoint = match output {
            CanonicalObject::WorkloadEndpoint(endpoint) => endpoint,
            other => panic!("expected a workload endpoint, got a {}", other.kind()),
        };
        assert_eq!(endpoint.node, "worker-0");
        assert_eq!(endpoint.ip_nets, vec!["10.1.2.3/32".to_string()]);
        assert_eq!(endpoint.interface_name, "eth0");
        assert_eq!(
            endpoint.profile_ids,
            vec!["kns.web".to_string(), "ksa.web.web-frontend".to_string()]
        );
        assert_eq!(endpoint.labels.get("app").map(String::as_str), Some("frontend"));
    }

    #[test]
    fn converting_the_same_pod_twice_yields_equal_endpoints() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "p", "namespace": "web"},
                "spec": {"nodeName": "worker-0"},
                "status": {"podIP": "10.1.2.3"}
            }"#,
        );

        let first = converter.try_convert(&pod).unwrap();
        let second = converter.try_convert(&pod).unwrap();
        assert_eq!(first, second);
        assert_eq!(converter.key(&first), converter.key(&second));
    }

    #[test]
    fn an_ipv6_pod_gets_a_full_length_prefix() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "p", "namespace": "web"},
                "spec": {"nodeName": "worker-0"},
                "status": {"podIP": "fd00::2:1"}
            }"#,
        );

        let output = converter.try_convert(&pod).unwrap();
        let endpoint = match output {
            CanonicalObject::WorkloadEndpoint(endpoint) => endpoint,
            other => panic!("expected a workload endpoint, got a {}", other.kind()),
        };
        assert_eq!(endpoint.ip_nets, vec!["fd00::2:1/128".to_string()]);
    }

    #[test]
    fn an_unscheduled_pod_is_not_convertible_yet() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "pending", "namespace": "web"},
                "status": {"phase": "Pending"}
            }"#,
        );
        assert_matches!(
            converter.try_convert(&pod),
            Err(ConversionError::PodNotScheduled { pod }) if pod == "pending"
        );
    }

    #[test]
    fn a_host_networked_pod_has_no_endpoint() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "kube-proxy-x", "namespace": "kube-system"},
                "spec": {"nodeName": "worker-0", "hostNetwork": true},
                "status": {"podIP": "192.168.0.10"}
            }"#,
        );
        assert_matches!(
            converter.try_convert(&pod),
            Err(ConversionError::PodNotNetworked { .. })
        );
    }

    #[test]
    fn a_pod_without_an_ip_is_not_convertible_yet() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "p", "namespace": "web"},
                "spec": {"nodeName": "worker-0"}
            }"#,
        );
        assert_matches!(
            converter.try_convert(&pod),
            Err(ConversionError::PodNotNetworked { .. })
        );
    }

    #[test]
    fn a_malformed_pod_ip_is_rejected() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "p", "namespace": "web"},
                "spec": {"nodeName": "worker-0"},
                "status": {"podIP": "not-an-address"}
            }"#,
        );
        assert_matches!(
            converter.try_convert(&pod),
            Err(ConversionError::FromAddrParse(_))
        );
    }

    #[test]
    fn keys_ignore_fields_conversion_does_not_read() {
        let converter = new_converter();
        let pod = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {"name": "p", "namespace": "web", "uid": "aaaa"},
                "spec": {"nodeName": "worker-0"},
                "status": {"podIP": "10.1.2.3"}
            }"#,
        );
        let same_pod_later = new_pod(
            r#"{
                "kind": "Pod",
                "metadata": {
                    "name": "p",
                    "namespace": "web",
                    "uid": "aaaa",
                    "annotations": {"checkpoint": "2"}
                },
                "spec": {"nodeName": "worker-0"},
                "status": {"podIP": "10.1.2.3"}
            }"#,
        );

        let first = converter.try_convert(&pod).unwrap();
        let second = converter.try_convert(&same_pod_later).unwrap();
        assert_eq!(converter.key(&first), converter.key(&second));
    }
}
