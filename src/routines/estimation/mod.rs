//! Expectation-maximization updates of the topic-word matrix

pub mod em;

pub use em::{e_step, m_step, post_step};
