// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each adapter translates between the `ProviderAdapter` contract and one
// provider wire dialect. Eight providers share four dialects.

mod http;

pub mod anthropic;
pub mod cohere;
pub mod google;
pub mod openai_compatible;
pub mod prompts;
pub mod registry;
pub mod schema;

pub use registry::{adapter_from_config, create_adapter};
