pub mod config;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod runner;
pub mod stages;

pub use config::AppConfig;
pub use error::{ConfigError, FormatError};
pub use io::{OutputFormat, RunReport, read_transcript_file};
pub use llm::{ChatClient, ChatConfig, CompletionRequest, PromptTemplates, TextBackend};
pub use models::{Chunk, ChunkRevision, PairedTurn, Turn};
pub use runner::{load_templates, planned_call_count, prepare_transcript, process_transcript};
pub use stages::{
    FailedChunkPolicy, RevisionPipeline, RevisionSettings, assemble, chunk_turns, execute_stage2,
    execute_stage3, map_bounded, normalize,
};
