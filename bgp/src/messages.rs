// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire format for messages exchanged with neighbors.
//!
//! Every datagram carries exactly one JSON object of the form
//!
//! ```text
//! {"type": "update", "src": "10.0.0.1", "dst": "10.0.0.2", "msg": {...}}
//! ```
//!
//! The shape of `msg` is determined by `type`. Message types that carry no
//! payload are sent with an empty object.

use crate::error::Error;
use rdb::{Origin, Prefix4, Route, DEFAULT_LOCAL_PREF};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

/// Message types as they appear in the `type` field.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum MessageType {
    /// Announces the router to a neighbor when it comes up.
    #[serde(rename = "handshake")]
    Handshake,

    /// Announces a route to a network.
    #[serde(rename = "update")]
    Update,

    /// Revokes previously announced routes.
    #[serde(rename = "withdraw")]
    Withdraw,

    /// Carries an opaque payload between hosts.
    #[serde(rename = "data")]
    Data,

    /// Asks the router for its current routing table.
    #[serde(rename = "dump")]
    Dump,

    /// The reply to a dump.
    #[serde(rename = "table")]
    Table,

    /// Tells the sender of a data message it could not be delivered.
    #[serde(rename = "no route")]
    NoRoute,
}

impl From<&Body> for MessageType {
    fn from(b: &Body) -> Self {
        match b {
            Body::Handshake => Self::Handshake,
            Body::Update(_) => Self::Update,
            Body::Withdraw(_) => Self::Withdraw,
            Body::Data(_) => Self::Data,
            Body::Dump => Self::Dump,
            Body::Table(_) => Self::Table,
            Body::NoRoute => Self::NoRoute,
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Handshake => "handshake",
            Self::Update => "update",
            Self::Withdraw => "withdraw",
            Self::Data => "data",
            Self::Dump => "dump",
            Self::Table => "table",
            Self::NoRoute => "no route",
        };
        write!(f, "{s}")
    }
}

/// The payload of a message, one variant per [`MessageType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Handshake,
    Update(UpdateMessage),
    Withdraw(Vec<WithdrawNetwork>),

    /// Data payloads are never inspected, only forwarded.
    Data(serde_json::Value),

    Dump,
    Table(Vec<TableRoute>),
    NoRoute,
}

/// A single message and its envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub body: Body,
}

impl Message {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, body: Body) -> Self {
        Self { src, dst, body }
    }

    pub fn kind(&self) -> MessageType {
        MessageType::from(&self.body)
    }

    pub fn title(&self) -> &'static str {
        match self.body {
            Body::Handshake => "handshake message",
            Body::Update(_) => "update message",
            Body::Withdraw(_) => "withdraw message",
            Body::Data(_) => "data message",
            Body::Dump => "dump message",
            Body::Table(_) => "table message",
            Body::NoRoute => "no route message",
        }
    }

    /// Decode a single datagram.
    pub fn from_wire(buf: &[u8]) -> Result<Message, Error> {
        Ok(serde_json::from_slice(buf)?)
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Serialize)]
struct Empty {}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Message", 4)?;
        st.serialize_field("type", &self.kind())?;
        st.serialize_field("src", &self.src)?;
        st.serialize_field("dst", &self.dst)?;
        match &self.body {
            Body::Handshake | Body::Dump | Body::NoRoute => {
                st.serialize_field("msg", &Empty {})?
            }
            Body::Update(u) => st.serialize_field("msg", u)?,
            Body::Withdraw(w) => st.serialize_field("msg", w)?,
            Body::Data(d) => st.serialize_field("msg", d)?,
            Body::Table(t) => st.serialize_field("msg", t)?,
        }
        st.end()
    }
}

/// The envelope as it arrives, before the payload is interpreted.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    typ: MessageType,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    #[serde(default)]
    msg: serde_json::Value,
}

impl TryFrom<RawMessage> for Message {
    type Error = Error;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let body = match raw.typ {
            MessageType::Handshake => Body::Handshake,
            MessageType::Update => {
                Body::Update(serde_json::from_value(raw.msg)?)
            }
            MessageType::Withdraw => {
                Body::Withdraw(serde_json::from_value(raw.msg)?)
            }
            MessageType::Data => Body::Data(raw.msg),
            MessageType::Dump => Body::Dump,
            MessageType::Table => Body::Table(serde_json::from_value(raw.msg)?),
            MessageType::NoRoute => Body::NoRoute,
        };
        Ok(Message::new(raw.src, raw.dst, body))
    }
}

/// A route announcement. Only `network`, `netmask` and `ASPath` are required;
/// the remaining attributes take their defaults when absent and are never
/// re-exported to other neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localpref: Option<u32>,

    #[serde(
        rename = "selfOrigin",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub self_origin: Option<bool>,

    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl UpdateMessage {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Ok(Prefix4::with_netmask(self.network, self.netmask)?)
    }

    /// The table entry for this announcement learned via `nexthop`.
    pub fn route(&self, nexthop: Ipv4Addr) -> Result<Route, Error> {
        Ok(Route {
            prefix: self.prefix()?,
            nexthop,
            local_pref: self.localpref.unwrap_or(DEFAULT_LOCAL_PREF),
            self_originated: self.self_origin.unwrap_or(false),
            as_path: self.as_path.clone(),
            origin: self.origin.unwrap_or_default(),
        })
    }

    /// The announcement as it is passed on to other neighbors: only the
    /// network, netmask and the AS path with `asn` prepended.
    pub fn exported(&self, asn: u32) -> UpdateMessage {
        let mut as_path = Vec::with_capacity(self.as_path.len() + 1);
        as_path.push(asn);
        as_path.extend_from_slice(&self.as_path);
        UpdateMessage {
            network: self.network,
            netmask: self.netmask,
            localpref: None,
            self_origin: None,
            as_path,
            origin: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawNetwork {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl WithdrawNetwork {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Ok(Prefix4::with_netmask(self.network, self.netmask)?)
    }
}

/// One row of a table dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRoute {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Ipv4Addr,
    pub localpref: u32,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
    pub origin: Origin,
}

impl From<&Route> for TableRoute {
    fn from(r: &Route) -> Self {
        TableRoute {
            network: r.prefix.value,
            netmask: r.netmask(),
            peer: r.nexthop,
            localpref: r.local_pref,
            as_path: r.as_path.clone(),
            self_origin: r.self_originated,
            origin: r.origin,
        }
    }
}
