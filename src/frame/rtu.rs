// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

use crate::slave::SlaveId;

/// RTU has no transaction id on the wire; a per-stream counter fakes one so the
/// request/response correlation API stays uniform with TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub slave_id: SlaveId,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaveRequest {
    pub slave: SlaveId,
    pub request: IncomingRequest,
}

impl From<IncomingRequestAdu> for SlaveRequest {
    fn from(from: IncomingRequestAdu) -> Self {
        Self {
            slave: from.hdr.slave_id,
            request: from.pdu.into(),
        }
    }
}
