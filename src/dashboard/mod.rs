pub mod cache;
pub mod client;
pub mod error;
pub mod health;
pub mod options;
pub mod registry;
pub mod scheduler;

pub use cache::{EntityCache, ResourceKind};
pub use client::{DashboardClient, OrderDraft, OrderItemDraft, RegistrationForm};
pub use error::FetchError;
pub use health::{HealthMonitor, HealthStatus};
pub use options::{OptionSets, SelectOption, build_option_sets};
pub use registry::{ServiceDescriptor, ServiceRegistry};
pub use scheduler::PollScheduler;
