pub mod constraints;
pub mod exclusion;
pub mod ledger;
pub mod model;
pub mod ranker;
pub mod scoring;
pub mod taste_text;
pub mod text;
pub mod time_serde;
