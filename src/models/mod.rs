//! Data models for the Gatehouse API

pub mod activity;
pub mod user;
pub mod visit;
pub mod visitor;
