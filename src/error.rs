use crate::kube::ObjectKind;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("expected a {expected} object, got a {actual} object")]
    UnexpectedKind {
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("object is missing the required metadata field `{0}`")]
    MissingField(&'static str),

    #[error("pod {pod} is not scheduled on any node")]
    PodNotScheduled { pod: String },

    #[error("pod {pod} is not networked")]
    PodNotNetworked { pod: String },

    #[error("invalid IP address: {0}")]
    FromAddrParse(#[from] std::net::AddrParseError),

    #[error("invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("named ports are not supported: {0}")]
    NamedPort(String),

    #[error("invalid protocol: {0}")]
    InvalidProtocol(String),

    #[error("invalid policy type: {0}")]
    InvalidPolicyType(String),

    #[error(transparent)]
    FromSerdeJson(#[from] serde_json::Error),
}
