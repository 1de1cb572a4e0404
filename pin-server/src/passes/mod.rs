//! Built-in passes

pub mod inline;

pub use inline::InlineFunctionPass;

use crate::{Pass, PassRegistry, RegistryError, ServerConfig};

/// Registry holding every built-in pass, bound where `config` says
pub fn builtin_registry(config: &ServerConfig) -> Result<PassRegistry, RegistryError> {
    let mut registry = PassRegistry::new();
    let inline = config.inline.clone();
    registry.register(config.inline_point, InlineFunctionPass::NAME, move || -> Box<dyn Pass> {
        Box::new(InlineFunctionPass::new(inline.clone()))
    })?;
    Ok(registry)
}
