// Kernel - infrastructure layer
//
// Dependency traits, their production implementations, and the job
// orchestration core. Domain logic lives in domains/ and reaches external
// services only through the traits defined here.

mod classifier;
mod identity;
pub mod jobs;
mod openai_oracle;
mod platform;
pub mod scheduled_tasks;
mod server_kernel;
pub mod test_dependencies;
mod traits;

pub use classifier::HttpClassifier;
pub use identity::PostgresIdentityResolver;
pub use openai_oracle::OpenAiRankingOracle;
pub use platform::{HttpPlatformValidator, Platform};
pub use server_kernel::ServerKernel;
pub use traits::{
    BaseClassifier, BaseIdentityResolver, BasePlatformValidator, BaseRankingOracle, Identity,
    PipelineStages, RankCandidate,
};
