// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatching incoming requests to user-supplied register storage.

use std::{io, ops::RangeInclusive, pin::Pin, sync::Arc};

use crate::{
    frame::{exception_response_pdu, Address, Exception, IncomingRequest, Quantity, Response, ResponsePdu, Word},
    server::service::{NewService, Service},
};

/// Valid `quantity_of_registers` range for reading holding/input registers.
const READ_REGISTERS_QUANTITY: RangeInclusive<Quantity> = 1..=125;

/// Implemented by servers that answer the fixed set of requests this crate
/// recognizes. The default `handle` dispatches each recognized variant to its
/// matching method and replies `illegal_function` to everything else;
/// overriding `handle` directly is only necessary for non-standard behavior.
#[async_trait::async_trait]
pub trait RequestHandler: Send + Sync {
    /// Read `quantity` holding registers starting at `address`.
    async fn read_holding_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, Exception>;

    /// Read `quantity` input registers starting at `address`.
    async fn read_input_registers(
        &self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>, Exception>;

    /// Dispatch a decoded request to the matching method and build the
    /// response PDU, translating an `Err(Exception)` into the corresponding
    /// exception response.
    async fn handle(&self, request: IncomingRequest) -> ResponsePdu {
        match request {
            IncomingRequest::ReadHoldingRegisters(address, quantity) => {
                if !READ_REGISTERS_QUANTITY.contains(&quantity) {
                    return exception_response_pdu(0x03, Exception::IllegalDataValue);
                }
                match self.read_holding_registers(address, quantity).await {
                    Ok(words) => Response::ReadHoldingRegisters(words).into(),
                    Err(exception) => exception_response_pdu(0x03, exception),
                }
            }
            IncomingRequest::ReadInputRegisters(address, quantity) => {
                if !READ_REGISTERS_QUANTITY.contains(&quantity) {
                    return exception_response_pdu(0x04, Exception::IllegalDataValue);
                }
                match self.read_input_registers(address, quantity).await {
                    Ok(words) => Response::ReadInputRegisters(words).into(),
                    Err(exception) => exception_response_pdu(0x04, exception),
                }
            }
            IncomingRequest::NotImplemented { function_code, .. } => {
                exception_response_pdu(function_code, Exception::IllegalFunction)
            }
        }
    }
}

/// Adapts a [`RequestHandler`] to the generic [`Service`] trait consumed by
/// the TCP and RTU server loops.
#[derive(Debug)]
pub struct HandlerService<H>(Arc<H>);

impl<H> Service for HandlerService<H>
where
    H: RequestHandler + 'static,
{
    type Request = IncomingRequest;
    type Response = ResponsePdu;
    type Error = io::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = io::Result<ResponsePdu>> + Send + Sync>>;

    fn call(&self, req: IncomingRequest) -> Self::Future {
        let handler = Arc::clone(&self.0);
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

/// Hands out a fresh [`HandlerService`] for each accepted connection, backed
/// by the same shared handler.
#[derive(Debug)]
pub struct NewHandlerService<H>(Arc<H>);

impl<H> NewHandlerService<H>
where
    H: RequestHandler + 'static,
{
    /// Wrap a handler so it can be passed to [`crate::server::tcp::Server::serve`]
    /// or [`crate::server::rtu::Server::serve_forever`].
    pub fn new(handler: H) -> Self {
        Self(Arc::new(handler))
    }
}

impl<H> NewService for NewHandlerService<H>
where
    H: RequestHandler + 'static,
{
    type Request = IncomingRequest;
    type Response = ResponsePdu;
    type Error = io::Error;
    type Instance = HandlerService<H>;

    fn new_service(&self) -> io::Result<Self::Instance> {
        Ok(HandlerService(Arc::clone(&self.0)))
    }
}
