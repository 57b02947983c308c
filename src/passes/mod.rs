//! Preprocessing passes, run in order on a [`crate::state::DocumentState`]

pub mod pass_0;
pub mod pass_1;
pub mod pass_2;
pub mod pass_3;
pub mod pass_4;
pub mod pass_5;
