use crate::canonical;
use crate::canonical::CanonicalObject;
use crate::converter::Converter;
use crate::error::ConversionError;
use crate::kube::{KubeObject, Node, ObjectKind};
use std::net::IpAddr;

const INTERNAL_IP_ADDRESS_TYPE: &str = "InternalIP";

/// Converts a node into its canonical counterpart, carrying the address the
/// data plane peers with.
pub struct NodeConverter;

impl NodeConverter {
    pub fn new() -> Self {
        NodeConverter
    }

    fn try_convert_node(&self, node: &Node) -> Result<canonical::Node, ConversionError> {
        let name = node.metadata.require_name()?;

        // A node can legitimately have no internal address yet; the address
        // is filled in on a later update.
        let internal_address = node
            .status
            .addresses
            .iter()
            .find(|address| address.address_type == INTERNAL_IP_ADDRESS_TYPE);
        let ip_address = match internal_address {
            Some(address) => Some(address.address.parse::<IpAddr>()?),
            None => None,
        };

        Ok(canonical::Node {
            name,
            ip_address,
            pod_cidr: node.spec.pod_cidr.clone(),
            labels: node.metadata.labels.clone(),
        })
    }
}

impl Converter for NodeConverter {
    type Error = ConversionError;

    fn source_kind(&self) -> ObjectKind {
        ObjectKind::Node
    }

    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, ConversionError> {
        let node = match input {
            KubeObject::Node(node) => node,
            other => {
                return Err(ConversionError::UnexpectedKind {
                    expected: ObjectKind::Node,
                    actual: other.kind(),
                })
            }
        };
        Ok(CanonicalObject::Node(self.try_convert_node(node)?))
    }
}
