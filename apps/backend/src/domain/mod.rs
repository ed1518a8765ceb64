//! Domain layer: identifiers, colors, outcomes and the rules engine seam.

pub mod color;
pub mod ids;
pub mod outcome;
pub mod rules;

pub use color::Color;
pub use ids::{PlayerId, SessionId};
pub use outcome::{GameOutcome, GameResult, Termination};
pub use rules::{RulesEngine, RulesError, StandardRules};
