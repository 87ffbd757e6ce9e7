//! Transaction selection strategies.
//!
//! Three passes over the pool, all writing into the same
//! [`CandidateBlockState`](crate::state::CandidateBlockState): the
//! coin-age priority pass always runs first over its byte budget, then
//! either the single-transaction score pass or the ancestor-package pass
//! fills the rest of the block.

mod package;
mod priority;
mod score;

pub use package::{add_package_txs, PackageScan};
pub use priority::add_priority_txs;
pub use score::add_score_txs;
