// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

pub type TransactionId = u16;
pub type UnitId = u8;

/// The 7-byte MBAP header minus the length field, which is recomputed on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAdu {
    pub hdr: Header,
    pub pdu: RequestPdu,
    pub disconnect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAdu {
    pub hdr: Header,
    pub pdu: ResponsePdu,
}

/// A request as received and decoded by a server, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequestAdu {
    pub hdr: Header,
    pub pdu: IncomingRequestPdu,
}

impl From<RequestAdu> for Request {
    fn from(from: RequestAdu) -> Self {
        from.pdu.into()
    }
}

impl From<IncomingRequestAdu> for IncomingRequest {
    fn from(from: IncomingRequestAdu) -> Self {
        from.pdu.into()
    }
}

/// A request targeting a particular unit id, as delivered to a gateway-style handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveRequest {
    pub slave: UnitId,
    pub request: IncomingRequest,
}

impl From<IncomingRequestAdu> for SlaveRequest {
    fn from(from: IncomingRequestAdu) -> Self {
        Self {
            slave: from.hdr.unit_id,
            request: from.pdu.into(),
        }
    }
}
