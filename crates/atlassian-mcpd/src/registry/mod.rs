//! Static command registry.
//!
//! Commands are registered once during bootstrap through a
//! [`RegistryBuilder`]. [`RegistryBuilder::build`] freezes the table into a
//! [`CommandRegistry`] that is shared behind an `Arc` and never mutated again,
//! so lookups during dispatch need no locking.

mod params;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use atlassian_mcp_types::Product;

use crate::dispatch::CommandHandler;

pub use params::{ParamKind, ParamSpec};

/// Tracing target for registry operations.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// How a command interprets an absent subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectPolicy {
    /// The subject must be supplied.
    Required,
    /// The subject may be omitted.
    Optional,
    /// An omitted subject means the acting user.
    ActingUser,
}

/// Metadata and handler for one exposed command.
#[derive(Clone)]
pub struct CommandRegistration {
    name: String,
    products: Vec<Product>,
    subject: SubjectPolicy,
    params: Vec<ParamSpec>,
    requires_instance: bool,
    handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for CommandRegistration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandRegistration")
            .field("name", &self.name)
            .field("products", &self.products)
            .field("subject", &self.subject)
            .field("params", &self.params)
            .field("requires_instance", &self.requires_instance)
            .finish_non_exhaustive()
    }
}

impl CommandRegistration {
    /// Creates a registration accepting every product with an optional
    /// subject and no parameters.
    pub fn new<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        Self::with_handler(name, Arc::new(handler))
    }

    /// Creates a registration around a shared handler.
    #[must_use]
    pub fn with_handler(name: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            products: Product::ALL.to_vec(),
            subject: SubjectPolicy::Optional,
            params: Vec::new(),
            requires_instance: false,
            handler,
        }
    }

    /// Restricts the products the command accepts.
    #[must_use]
    pub fn accepts(mut self, products: &[Product]) -> Self {
        self.products = products.to_vec();
        self
    }

    /// Sets the subject policy.
    #[must_use]
    pub const fn subject(mut self, policy: SubjectPolicy) -> Self {
        self.subject = policy;
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Marks the command as needing a valid instance URL.
    #[must_use]
    pub const fn requires_instance(mut self) -> Self {
        self.requires_instance = true;
        self
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Accepted products.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Returns `true` when `product` is accepted.
    #[must_use]
    pub fn accepts_product(&self, product: Product) -> bool {
        self.products.contains(&product)
    }

    /// Subject policy.
    #[must_use]
    pub const fn subject_policy(&self) -> SubjectPolicy {
        self.subject
    }

    /// Declared parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Looks up a declared parameter.
    #[must_use]
    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.name() == name)
    }

    /// Whether dispatch must fail with `config_error` when no valid instance
    /// URL is configured.
    #[must_use]
    pub const fn needs_instance(&self) -> bool {
        self.requires_instance
    }

    /// Shared handler.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }
}

/// Errors raised while populating the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two registrations share a name.
    #[error("command '{name}' is already registered")]
    Duplicate {
        /// Conflicting name.
        name: String,
    },
    /// A registration has a blank name.
    #[error("command names must not be blank")]
    BlankName,
}

/// Append-only builder used during bootstrap.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: Vec<Arc<CommandRegistration>>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken and
    /// [`RegistryError::BlankName`] when it is blank.
    pub fn register(
        &mut self,
        registration: CommandRegistration,
    ) -> Result<&mut Self, RegistryError> {
        let name = registration.name().to_owned();
        if name.trim().is_empty() {
            return Err(RegistryError::BlankName);
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        tracing::trace!(target: REGISTRY_TARGET, command = %name, "command registered");
        self.index.insert(name, self.commands.len());
        self.commands.push(Arc::new(registration));
        Ok(self)
    }

    /// Freezes the builder.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        tracing::debug!(
            target: REGISTRY_TARGET,
            commands = self.commands.len(),
            "registry frozen"
        );
        CommandRegistry {
            commands: self.commands,
            index: self.index,
        }
    }
}

/// Immutable command table.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandRegistration>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Exact-match lookup.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<CommandRegistration>> {
        self.index
            .get(name)
            .and_then(|position| self.commands.get(*position))
            .cloned()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name())
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
