//! Canonical public-transport trip model and backend integration contract.
//!
//! [`domain`] holds the network-independent model (locations, lines, legs,
//! trips), [`query`] the inputs and results exchanged with backends, and
//! [`provider`] the contract backends implement. [`web`] exposes a provider
//! over JSON HTTP.

pub mod config;
pub mod domain;
pub mod provider;
pub mod query;
pub mod web;
