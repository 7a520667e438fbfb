// Generation: prompt construction, reference resumes and the pipeline that
// ties profile, provider and history together.
// All provider calls go through `crate::provider`; nothing here talks HTTP.

pub mod generator;
pub mod handlers;
pub mod prompt_builder;
pub mod prompts;
pub mod reference;
