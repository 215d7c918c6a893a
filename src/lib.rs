// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod alerts;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod sample;
pub mod schema;
pub mod store;
pub mod utils;
pub mod validate;
