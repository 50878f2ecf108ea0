//! # meshbridge-domain
//!
//! Pure domain model for the lighting-mesh ↔ automation-bus bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **Sites** and their opaque **Crypto Keys**
//! - Define **Devices** (lights, switches, rooms, scenes) and the immutable
//!   **Device Set** of a site
//! - Define **Commands** in the two shapes the automation bus sends them
//!   (bare switch state, or a structured object)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod command;
pub mod device;
pub mod site;
