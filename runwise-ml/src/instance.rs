//! Building capability objects from `{type, kwargs}` descriptors.
//!
//! A resolver only knows the constructors registered with it, grouped into
//! namespaces. Callers pick which namespaces a lookup may search, so a
//! descriptor can never reach a type outside that set.

use crate::error::MlError;
use crate::registry::RegistrySpec;
use crate::training::metrics::{Accuracy, Metric, MetricRegistry, RunningAverage, to_metric_dict};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Keyword arguments passed to a constructor.
pub type Kwargs = serde_json::Map<String, Value>;

/// Constructor registered for a type name.
pub type Constructor<C> = Box<dyn Fn(Kwargs) -> Result<Box<C>, MlError> + Send + Sync>;

/// Namespace holding the built-in metrics.
pub const METRICS_NAMESPACE: &str = "runwise.metrics";

/// `{"type": ..., "kwargs": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl InstanceDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kwargs: Kwargs::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Parse a descriptor out of free-form JSON.
    pub fn from_value(value: Value) -> Result<Self, MlError> {
        if !value.is_object() {
            return Err(MlError::config(format!(
                "instance descriptor must be an object, got {value}"
            )));
        }
        if value.get("type").and_then(Value::as_str).is_none() {
            return Err(MlError::config(format!(
                "instance descriptor {value} has no string 'type' field"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl fmt::Display for InstanceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name, Value::Object(self.kwargs.clone()))
    }
}

/// Either a ready object or a descriptor to build one from.
pub enum Instance<C: ?Sized> {
    Built(Box<C>),
    Descriptor(InstanceDescriptor),
}

impl<C: ?Sized + fmt::Debug> fmt::Debug for Instance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Built(b) => f.debug_tuple("Built").field(b).finish(),
            Self::Descriptor(d) => f.debug_tuple("Descriptor").field(d).finish(),
        }
    }
}

/// Constructors for one capability `C`, grouped by namespace.
pub struct InstanceResolver<C: ?Sized> {
    capability: &'static str,
    namespaces: IndexMap<String, IndexMap<String, Constructor<C>>>,
}

impl<C: ?Sized> InstanceResolver<C> {
    /// `capability` names the required trait in error messages.
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            namespaces: IndexMap::new(),
        }
    }

    pub fn register<F>(&mut self, namespace: &str, name: &str, constructor: F) -> &mut Self
    where
        F: Fn(Kwargs) -> Result<Box<C>, MlError> + Send + Sync + 'static,
    {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), Box::new(constructor));
        self
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    fn lookup(&self, type_name: &str, modules: &[&str]) -> Option<&Constructor<C>> {
        if let Some((namespace, name)) = type_name.rsplit_once('.')
            && let Some(ctor) = self.namespaces.get(namespace).and_then(|ns| ns.get(name))
        {
            return Some(ctor);
        }
        modules
            .iter()
            .filter_map(|module| self.namespaces.get(*module))
            .find_map(|ns| ns.get(type_name))
    }

    /// Build an object from a descriptor. `extra_kwargs` override the
    /// descriptor's own kwargs.
    pub fn resolve(
        &self,
        descriptor: &InstanceDescriptor,
        modules: &[&str],
        extra_kwargs: Option<&Kwargs>,
    ) -> Result<Box<C>, MlError> {
        let ctor = self.lookup(&descriptor.type_name, modules).ok_or_else(|| {
            MlError::type_error(format!(
                "The instance {descriptor} is not of type {} (searched namespaces {modules:?})",
                self.capability
            ))
        })?;
        let mut kwargs = descriptor.kwargs.clone();
        if let Some(extra) = extra_kwargs {
            kwargs.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        tracing::debug!(type_name = %descriptor.type_name, capability = self.capability, "Resolving instance");
        ctor(kwargs)
    }
}

/// Turn an optional instance-or-descriptor into an object of capability `C`.
pub fn to_instance<C: ?Sized>(
    instance: Option<Instance<C>>,
    resolver: &InstanceResolver<C>,
    modules: &[&str],
    extra_kwargs: Option<&Kwargs>,
) -> Result<Option<Box<C>>, MlError> {
    match instance {
        None => Ok(None),
        Some(Instance::Built(built)) => Ok(Some(built)),
        Some(Instance::Descriptor(descriptor)) => {
            resolver.resolve(&descriptor, modules, extra_kwargs).map(Some)
        }
    }
}

/// Deserialize a constructor's kwargs into its config type.
pub fn from_kwargs<T: DeserializeOwned>(type_name: &str, kwargs: Kwargs) -> Result<T, MlError> {
    serde_json::from_value(Value::Object(kwargs))
        .map_err(|e| MlError::construction(format!("invalid arguments for {type_name}: {e}")))
}

/// Resolver preloaded with the built-in metrics under [`METRICS_NAMESPACE`].
pub fn metric_resolver() -> InstanceResolver<dyn Metric> {
    let mut resolver: InstanceResolver<dyn Metric> = InstanceResolver::new("Metric");
    resolver
        .register(METRICS_NAMESPACE, "Accuracy", |kwargs| {
            Ok(Box::new(from_kwargs::<Accuracy>("Accuracy", kwargs)?))
        })
        .register(METRICS_NAMESPACE, "RunningAverage", |kwargs| {
            Ok(Box::new(from_kwargs::<RunningAverage>("RunningAverage", kwargs)?))
        });
    resolver
}

/// Resolve every descriptor in a metric spec, then normalize it.
pub fn resolve_metric_dict(
    spec: RegistrySpec<Instance<dyn Metric>>,
    resolver: &InstanceResolver<dyn Metric>,
    modules: &[&str],
) -> Result<MetricRegistry, MlError> {
    let resolved = spec.try_map(|instance| match instance {
        Instance::Built(metric) => Ok(metric),
        Instance::Descriptor(descriptor) => resolver.resolve(&descriptor, modules, None),
    })?;
    to_metric_dict(resolved)
}
