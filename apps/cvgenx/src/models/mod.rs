pub mod config;
pub mod generation;
pub mod profile;
pub mod resume;

pub use config::{ConfigSummary, ConfigUpdate, ProviderConfig, StoredConfig};
pub use generation::{ContentKind, ContentRequest, GenerationRecord};
pub use profile::{ProfileRecord, Project, UserProfile};
pub use resume::ResumeRecord;
