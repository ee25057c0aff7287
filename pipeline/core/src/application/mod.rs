// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod batch_runner;
pub mod persistence;
pub mod pipeline;
pub mod retry;
pub mod sanitizer;
pub mod validator;
