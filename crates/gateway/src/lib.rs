pub mod background;
pub mod builder;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod resolver;

pub use background::{SweepConfig, SweepProcessor, SweepProcessorBuilder};
pub use builder::GatewayBuilder;
pub use error::GatewayError;
pub use gateway::{Gateway, Redemption, SweepReport};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use resolver::{MediaLibrary, ResolvedResource, ResourceResolver};
