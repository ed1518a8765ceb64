pub mod ai_opponent;
pub mod endings;
