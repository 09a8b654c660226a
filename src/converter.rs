use crate::canonical::CanonicalObject;
use crate::error::ConversionError;
use crate::kube::{KubeObject, ObjectKind};
use crate::namespace_converter::NamespaceConverter;
use crate::node_converter::NodeConverter;
use crate::pod_converter::PodConverter;
use crate::policy_converter::PolicyConverter;
use crate::service_account_converter::ServiceAccountConverter;
use std::fmt::Display;
use tracing::error;

/// Options shared by the converters.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Order assigned to converted policies, so natively-created policies
    /// can be ordered around them.
    pub policy_order: f64,
    /// Interface name reported on workload endpoints.
    pub pod_interface: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            policy_order: 1000.0,
            pod_interface: "eth0".into(),
        }
    }
}

/// The capability every object conversion implements: mapping a source
/// object to its canonical counterpart, and deriving a stable key for the
/// result.
///
/// Converters are stateless; a single instance may be shared across threads.
pub trait Converter: Send + Sync {
    type Error: Display;

    /// The source kind this converter accepts. Feeding it any other kind
    /// must fail, never convert silently.
    fn source_kind(&self) -> ObjectKind;

    /// Convert one source object into its canonical counterpart.
    ///
    /// Pure: no side effects, and converting the same object twice yields
    /// equal results.
    fn try_convert(&self, input: &KubeObject) -> Result<CanonicalObject, Self::Error>;

    /// Like [`Converter::try_convert`], logging failures before propagating
    /// them. The sync loop drives conversion through this method so every
    /// rejected object leaves a trace.
    fn convert(&self, input: &KubeObject) -> Result<CanonicalObject, Self::Error> {
        self.try_convert(input).map_err(|error| {
            error!(
                "Failed to convert {} {}: {}",
                input.kind(),
                input.metadata().name,
                error
            );
            error
        })
    }

    /// The cache key of a converted object. Guaranteed to succeed, and to be
    /// non-empty, for every object [`Converter::try_convert`] can produce.
    fn key(&self, output: &CanonicalObject) -> String {
        output.key()
    }
}

/// Create the converter for one source kind. The consumer instantiates one
/// per watched kind and drives them uniformly through the trait object.
pub fn create_converter(
    kind: ObjectKind,
    config: &ConverterConfig,
) -> Box<dyn Converter<Error = ConversionError>> {
    match kind {
        ObjectKind::Pod => Box::new(PodConverter::new(config.clone())),
        ObjectKind::Namespace => Box::new(NamespaceConverter::new()),
        ObjectKind::NetworkPolicy => Box::new(PolicyConverter::new(config.clone())),
        ObjectKind::Node => Box::new(NodeConverter::new()),
        ObjectKind::ServiceAccount => Box::new(ServiceAccountConverter::new()),
    }
}
