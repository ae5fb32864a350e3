// src/lib.rs

//! listpager: resumable exporter for X list members.
//!
//! Walks a list's member pages, appends each page to a JSON Lines file and a
//! CSV file, and checkpoints progress after every attempt so an interrupted
//! or rate-limited run picks up where it left off.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
