#![doc = "icd-fetch-core: core logic library for icd-fetch."]

//! This crate holds the data model, error taxonomy, API client, persistence
//! layer and traversal engine. The CLI crate only resolves configuration,
//! sets up logging and drives [`traverse::Traversal`].
//!
//! # Usage
//! Build an [`client::IcdClient`] and a [`store::FileStore`] from an
//! [`config::EffectiveConfig`] and hand both to [`traverse::Traversal::from_config`].

pub mod auth;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod store;
pub mod traverse;
