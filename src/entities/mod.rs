pub mod checklist;
pub mod disease;
pub mod history;
pub mod prediction;
pub mod recommendation;
