pub mod corpus;
pub mod outcomes;
pub mod parameters;
pub mod simplex;
pub mod statistics;
pub mod stochastic;
