//! # meshbridge-app
//!
//! Application layer: the bridge core and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** for the three external collaborators:
//!   - `CloudApi`: login, sites, crypto key, device enumeration
//!   - `MeshTransport` / `MeshConnector`: the lighting mesh connection
//!   - `BusClient`: the automation pub/sub bus
//! - Run the ordered startup chain (`Bootstrap`)
//! - Keep the mesh connection alive (`ConnectionSupervisor`)
//! - Normalise bus commands (`translator`) and forward events in both
//!   directions (`StateRelay`)
//! - Drive everything from one event loop (`Bridge`)
//!
//! ## Dependency rule
//! Depends on `meshbridge-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
