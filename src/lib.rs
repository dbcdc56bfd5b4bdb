//! Depstore backend: order-to-provisioning service for the panel storefront.
//!
//! Sells a fixed catalog of Minecraft hosting packages, collects QRIS
//! payments, provisions Pterodactyl panels in a two-step control-plane
//! sequence and reports completed orders to the operations Telegram chat.

pub mod api;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod provisioner;
pub mod services;
pub mod workers;
