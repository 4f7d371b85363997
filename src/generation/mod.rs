//! World generation: tunable parameters, the per-chunk context bundle
//! handed to terrain/biome/feature passes, terrain density/height rules,
//! and the background-threaded orchestrator tying all of it together.

pub mod context;
pub mod orchestrator;
pub mod parameters;
pub mod terrain;

pub use context::GenerationContext;
pub use orchestrator::GenerationOrchestrator;
pub use parameters::GenerationParameters;
