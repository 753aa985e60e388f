/*! Schedulability analysis of mixed-criticality task sets on
periodic resources with separate nominal and critical budgets

The entry point is [scaling::solve], which searches for a scaling
factor of the HI tasks' deadlines under which four demand/supply
conditions hold. */

pub mod classic;
pub mod config;
pub mod demand;
pub mod fixed_point;
pub mod generator;
pub mod horizon;
pub mod qpa;
pub mod scaling;
pub mod supply;
pub mod task;
pub mod time;
