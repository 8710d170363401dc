#![doc = "openapi-sync-core: change detection and transform pipeline for a mirrored OpenAPI document."]

//! This crate holds all pipeline logic and the collaborator contracts it runs against.
//! Version-control and process wiring live in the `openapi-sync` CLI crate.
//!
//! # Usage
//! Build a [`config::SyncConfig`], pick a [`contract::Fetcher`], [`contract::VersionedStorage`]
//! and [`contract::RemoteSync`], and call [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod serialize;
pub mod synchronise;
pub mod transform;
