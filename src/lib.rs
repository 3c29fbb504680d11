// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Garmin-Harvest: pull wearable telemetry out of Garmin Connect
//!
//! This crate logs in to Garmin Connect, walks a date range across the four
//! telemetry streams (activities, heart rate, sleep, steps), filters each
//! record against the capabilities of the device that produced it, and
//! persists every unit to a local JSON file and to Firestore.

pub mod config;
pub mod db;
pub mod devices;
pub mod error;
pub mod filter;
pub mod models;
pub mod services;
pub mod time_utils;
