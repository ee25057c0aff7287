// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Atlas Ingest Core
//!
//! Retrieves continent, country and city facts from eight LLM providers,
//! normalises their heterogeneous replies into one validated record shape and
//! upserts the records into PostgreSQL in foreign-key order.
//!
//! # Architecture
//!
//! - **domain:** records, the provider contract, the repository contract,
//!   batch outcome types and configuration
//! - **application:** sanitize → validate, retry coordination, persistence
//!   ordering, the per-entity pipeline and the batch runner
//! - **infrastructure:** HTTP provider adapters, prompts and schemas, the
//!   `sqlx` repository and its in-memory twin

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
