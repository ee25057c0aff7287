// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the atlas CLI

pub mod config;
pub mod ingest;

pub use self::config::ConfigCommand;
pub use self::ingest::{BatchArgs, ContinentArgs, CountryArgs};
