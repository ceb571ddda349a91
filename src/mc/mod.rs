pub mod accumulator;
pub mod mc_engine;
pub mod payoffs;
pub mod pricers;
