// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// A single collapsed error type for anything the resolver facade can fail
/// with. The core never distinguishes NXDOMAIN from timeout from refused
/// (§4.2): any of them just means "back off and retry".
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("resolver transport failure: {0}")]
    Resolver(String),
}
