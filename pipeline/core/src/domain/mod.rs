// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod batch;
pub mod config;
pub mod error;
pub mod fields;
pub mod provider;
pub mod records;
pub mod repository;
