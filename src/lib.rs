//! A library to translate Kubernetes resources into their canonical network
//! policy representation.
//!
//! An external watcher delivers resources of the known kinds (pods,
//! namespaces, network policies, nodes, service accounts); this crate
//! converts each into its canonical datastore counterpart and derives the
//! stable key the consumer caches it under.
//!
//! ```
//! use kube_converter::converter::{create_converter, ConverterConfig};
//! use kube_converter::kube::{KubeObject, ObjectKind};
//!
//! # fn main() -> Result<(), kube_converter::ConversionError> {
//! let namespace =
//!     KubeObject::from_json(r#"{"kind": "Namespace", "metadata": {"name": "default"}}"#)?;
//!
//! let converter = create_converter(ObjectKind::Namespace, &ConverterConfig::default());
//! let profile = converter.try_convert(&namespace)?;
//! assert_eq!(converter.key(&profile), "kns.default");
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod converter;
pub mod error;
pub mod kube;
pub mod namespace_converter;
pub mod node_converter;
pub mod pod_converter;
pub mod policy_converter;
pub mod selector;
pub mod service_account_converter;

pub use converter::{create_converter, Converter, ConverterConfig};
pub use error::ConversionError;
