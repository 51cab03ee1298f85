// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus clients

#[cfg(feature = "rtu")]
pub mod rtu;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tcp")]
pub mod tcp;

pub mod util;

use std::{fmt, io};

use async_trait::async_trait;

use crate::{
    frame::{Address, Coil, Quantity, Request, Response, Word},
    slave::SlaveContext,
    Result,
};

/// A transport-independent interface for sending Modbus requests and
/// receiving their responses.
#[async_trait]
pub trait Client: SlaveContext + fmt::Debug + Send {
    /// Invokes a _Modbus_ function.
    async fn call(&mut self, request: Request) -> Result<Response>;
}

/// An owned, opaque Modbus client, connected to a single physical or logical
/// device at construction time.
#[derive(Debug)]
pub struct Context {
    client: Box<dyn Client>,
}

impl Context {
    /// Disconnect the underlying transport, releasing any exclusive resource
    /// it holds (e.g. a serial port).
    pub async fn disconnect(&mut self) -> io::Result<()> {
        let res = self.client.call(Request::Disconnect).await;
        match res {
            Ok(_) => Ok(()),
            Err(crate::Error::Io(err)) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(crate::Error::Io(err)) => Err(err),
            Err(crate::Error::Exception(_)) => {
                unreachable!("Disconnect never produces a Modbus exception")
            }
        }
    }
}

impl From<Box<dyn Client>> for Context {
    fn from(client: Box<dyn Client>) -> Self {
        Self { client }
    }
}

impl SlaveContext for Context {
    fn set_slave(&mut self, slave: crate::slave::Slave) {
        self.client.set_slave(slave);
    }
}

#[async_trait]
impl Client for Context {
    async fn call(&mut self, request: Request) -> Result<Response> {
        self.client.call(request).await
    }
}

fn unexpected_response(response: &Response) -> crate::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Unexpected response: {response:?}"),
    )
    .into()
}

/// Requests that read data from a Modbus server.
#[async_trait]
pub trait Reader: Client {
    /// Read multiple coils.
    async fn read_coils(&mut self, address: Address, quantity: Quantity) -> Result<Vec<Coil>>;

    /// Read multiple discrete inputs.
    async fn read_discrete_inputs(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Coil>>;

    /// Read multiple holding registers.
    async fn read_holding_registers(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>>;

    /// Read multiple input registers.
    async fn read_input_registers(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>>;

    /// Read and write multiple holding registers in a single transaction.
    ///
    /// The write is always performed before the read.
    async fn read_write_multiple_registers(
        &mut self,
        read_address: Address,
        read_quantity: Quantity,
        write_address: Address,
        write_data: &[Word],
    ) -> Result<Vec<Word>>;
}

#[async_trait]
impl<C> Reader for C
where
    C: Client,
{
    async fn read_coils(&mut self, address: Address, quantity: Quantity) -> Result<Vec<Coil>> {
        let rsp = self.call(Request::ReadCoils(address, quantity)).await?;
        match rsp {
            Response::ReadCoils(mut coils) => {
                coils.truncate(quantity.into());
                Ok(coils)
            }
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn read_discrete_inputs(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Coil>> {
        let rsp = self
            .call(Request::ReadDiscreteInputs(address, quantity))
            .await?;
        match rsp {
            Response::ReadDiscreteInputs(mut coils) => {
                coils.truncate(quantity.into());
                Ok(coils)
            }
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn read_holding_registers(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>> {
        let rsp = self
            .call(Request::ReadHoldingRegisters(address, quantity))
            .await?;
        match rsp {
            Response::ReadHoldingRegisters(data) => Ok(data),
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn read_input_registers(
        &mut self,
        address: Address,
        quantity: Quantity,
    ) -> Result<Vec<Word>> {
        let rsp = self
            .call(Request::ReadInputRegisters(address, quantity))
            .await?;
        match rsp {
            Response::ReadInputRegisters(data) => Ok(data),
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn read_write_multiple_registers(
        &mut self,
        read_address: Address,
        read_quantity: Quantity,
        write_address: Address,
        write_data: &[Word],
    ) -> Result<Vec<Word>> {
        let rsp = self
            .call(Request::ReadWriteMultipleRegisters(
                read_address,
                read_quantity,
                write_address,
                write_data.to_vec(),
            ))
            .await?;
        match rsp {
            Response::ReadWriteMultipleRegisters(data) => Ok(data),
            _ => Err(unexpected_response(&rsp)),
        }
    }
}

/// Requests that write data to a Modbus server.
#[async_trait]
pub trait Writer: Client {
    /// Write a single coil.
    async fn write_single_coil(&mut self, address: Address, state: Coil) -> Result<()>;

    /// Write multiple coils.
    async fn write_multiple_coils(&mut self, address: Address, coils: &[Coil]) -> Result<()>;

    /// Write a single register.
    async fn write_single_register(&mut self, address: Address, word: Word) -> Result<()>;

    /// Write multiple registers.
    async fn write_multiple_registers(&mut self, address: Address, data: &[Word]) -> Result<()>;
}

#[async_trait]
impl<C> Writer for C
where
    C: Client,
{
    async fn write_single_coil(&mut self, address: Address, state: Coil) -> Result<()> {
        let rsp = self
            .call(Request::WriteSingleCoil(address, state))
            .await?;
        match rsp {
            Response::WriteSingleCoil(rsp_address) if rsp_address == address => Ok(()),
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn write_multiple_coils(&mut self, address: Address, coils: &[Coil]) -> Result<()> {
        let quantity = coils.len() as Quantity;
        let rsp = self
            .call(Request::WriteMultipleCoils(address, coils.to_vec()))
            .await?;
        match rsp {
            Response::WriteMultipleCoils(rsp_address, rsp_quantity)
                if rsp_address == address && rsp_quantity == quantity =>
            {
                Ok(())
            }
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn write_single_register(&mut self, address: Address, word: Word) -> Result<()> {
        let rsp = self
            .call(Request::WriteSingleRegister(address, word))
            .await?;
        match rsp {
            Response::WriteSingleRegister(rsp_address, rsp_word)
                if rsp_address == address && rsp_word == word =>
            {
                Ok(())
            }
            _ => Err(unexpected_response(&rsp)),
        }
    }

    async fn write_multiple_registers(&mut self, address: Address, data: &[Word]) -> Result<()> {
        let quantity = data.len() as Quantity;
        let rsp = self
            .call(Request::WriteMultipleRegisters(address, data.to_vec()))
            .await?;
        match rsp {
            Response::WriteMultipleRegisters(rsp_address, rsp_quantity)
                if rsp_address == address && rsp_quantity == quantity =>
            {
                Ok(())
            }
            _ => Err(unexpected_response(&rsp)),
        }
    }
}
