#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gw-registry: the cross-process, file-locked catalog of gateway instances
//! running on one host.

pub mod error;
pub mod model;
pub mod paths;
pub mod registry;

pub use error::RegistryError;
pub use model::{InstanceInfo, InstanceState, LifecycleEvent, LifecycleEventType, Pid, RegistryDocument};
pub use registry::{InstanceRegistry, DEFAULT_ZOMBIE_TIMEOUT};
