//! Provider resolution and model handle construction.

mod endpoints;
mod factory;
mod resolver;

pub use endpoints::{base_url_for, is_reasoning_model, DEFAULT_BASE_URL};
pub use factory::{ModelFactory, ModelParams, ModelRequest};
pub use resolver::{
    credential_env_var, model_env_var, Environment, MapEnv, ProcessEnv, ProviderResolver,
    ResolvedProvider, DEFAULT_MODEL, DEFAULT_PROVIDER, PLACEHOLDER_CREDENTIAL,
};
