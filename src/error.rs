// SPDX-FileCopyrightText: Copyright (c) 2017-2023 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Library Error type

use crate::frame::ExceptionResponse;

/// A specialized [Result] type for Modbus operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Modbus errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A server (slave) replied with an exception response.
    #[error(transparent)]
    Exception(#[from] ExceptionResponse),

    /// A local or transport error: framing, I/O, or a request that could not be satisfied.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
