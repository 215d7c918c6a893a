// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod alerts;
pub mod companies;
pub mod config;
pub mod deals;
pub mod diligence;
pub mod doctor;
pub mod exporter;
pub mod importer;
pub mod reports;
pub mod sample;
pub mod watchlist;
