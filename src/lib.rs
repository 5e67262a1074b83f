//! TradeFlow: marketplace backend for trading-strategy scripts.
//!
//! Users sign up, submit strategies for review, and browse the indicator
//! catalog; admins moderate submissions and manage products. Documents live
//! in Sled collection trees, sessions are JWT bearer tokens, and everything
//! is exposed over an Axum REST API.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod files;
pub mod models;
pub mod moderation;
pub mod rest;
pub mod session;
pub mod storage;
pub mod submission;
