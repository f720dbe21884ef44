//! Floodgate - In-Process Rate Limiting Library
//!
//! This crate implements a single-process, in-memory rate limiter using a
//! fixed-window counter policy. Callers map each request to an opaque key
//! (for example a client address or user id) and ask the limiter whether the
//! request may proceed; denied callers receive an advisory retry-after
//! duration suitable for an HTTP 429 `Retry-After` header.

pub mod config;
pub mod error;
pub mod ratelimit;
