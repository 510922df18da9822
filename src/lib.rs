//! NEEDLE-SUBMIT: local needle-in-a-haystack evaluation and leaderboard
//! submission for student retrieval agents.

pub mod agents;
pub mod cli;
pub mod collect;
pub mod error;
pub mod eval;
pub mod leaderboard;
pub mod llm;
pub mod pipeline;
pub mod scoring;
