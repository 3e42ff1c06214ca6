// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware (auth, security headers).

pub mod auth;
pub mod security;
