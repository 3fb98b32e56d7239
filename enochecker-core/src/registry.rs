//! Checker registry and the dependencies handed to checker constructors
//!
//! One checker runs per process. It is selected by name from configuration
//! at startup; an unknown name fails before the server binds.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::checker::Checker;
use crate::checkers::{DummyChecker, LineStoreChecker};
use crate::config::EnoConfig;
use crate::connection::ConnectOptions;
use crate::error::{EnoError, EnoResult};

/// Everything a checker may depend on, built once at startup
#[derive(Debug, Clone)]
pub struct CheckerDeps {
    pub config: Arc<EnoConfig>,
    pub connect_options: ConnectOptions,
}

impl CheckerDeps {
    pub fn new(config: EnoConfig) -> Self {
        let connect_options = ConnectOptions::from(&config.connection);
        Self {
            config: Arc::new(config),
            connect_options,
        }
    }

    /// Port of the team service under test
    pub fn service_port(&self) -> u16 {
        self.config.checker.service_port
    }
}

pub type CheckerConstructor = fn(&CheckerDeps) -> EnoResult<Arc<dyn Checker>>;

/// Name to constructor map
pub struct CheckerRegistry {
    constructors: BTreeMap<&'static str, CheckerConstructor>,
}

impl CheckerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with every checker shipped in this crate
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(DummyChecker::NAME, DummyChecker::construct);
        registry.constructors.insert(LineStoreChecker::NAME, LineStoreChecker::construct);
        registry
    }

    pub fn register(
        &mut self,
        name: &'static str,
        constructor: CheckerConstructor,
    ) -> EnoResult<()> {
        if self.constructors.contains_key(name) {
            return Err(EnoError::configuration(
                "checker_registry",
                format!("checker '{}' is already registered", name),
            ));
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        self.constructors.keys().copied().collect()
    }

    /// Construct the checker registered under `name` and validate its info
    pub fn build(&self, name: &str, deps: &CheckerDeps) -> EnoResult<Arc<dyn Checker>> {
        let constructor = self.constructors.get(name).ok_or_else(|| EnoError::CheckerNotFound {
            name: name.to_string(),
            available: self.names().join(", "),
        })?;

        let checker = constructor(deps)?;
        let info = checker.info();
        info.validate()?;
        info!(
            checker = name,
            service = %info.service_name,
            flag_variants = info.flag_variants,
            noise_variants = info.noise_variants,
            havoc_variants = info.havoc_variants,
            "Checker loaded"
        );
        Ok(checker)
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_listed() {
        let registry = CheckerRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["dummy", "linestore"]);
    }

    #[test]
    fn test_unknown_checker_lists_available() {
        let registry = CheckerRegistry::with_builtins();
        let deps = CheckerDeps::new(EnoConfig::default());

        match registry.build("nope", &deps) {
            Err(EnoError::CheckerNotFound { name, available }) => {
                assert_eq!(name, "nope");
                assert_eq!(available, "dummy, linestore");
            }
            other => panic!("expected CheckerNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CheckerRegistry::with_builtins();
        assert!(registry.register("dummy", DummyChecker::construct).is_err());
        assert!(registry.register("dummy2", DummyChecker::construct).is_ok());
    }

    #[test]
    fn test_build_dummy() {
        let registry = CheckerRegistry::with_builtins();
        let checker = registry.build("dummy", &CheckerDeps::new(EnoConfig::default())).unwrap();
        assert_eq!(checker.info().service_name, "DummyChecker");
    }
}
