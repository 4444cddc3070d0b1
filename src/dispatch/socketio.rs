//! Text framing for Socket.IO v5 over Engine.IO v4.
//!
//! Only what a queueing client needs: the default namespace, JSON events
//! and the Engine.IO heartbeat. Binary attachments are rejected.

use serde_json::Value;

use crate::app::DispatchError;

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake, carrying `sid`, `pingInterval` and friends.
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    /// Socket.IO namespace connect. The server's reply carries a `sid`.
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, data: Value },
    ConnectError(Value),
}

impl Packet {
    pub fn event(name: impl Into<String>, data: Value) -> Self {
        Packet::Event {
            name: name.into(),
            data,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Open(data) => format!("0{}", data),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(data)) => format!("40{}", data),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, data } => {
                let args = if data.is_null() {
                    Value::Array(vec![Value::String(name.clone())])
                } else {
                    Value::Array(vec![Value::String(name.clone()), data.clone()])
                };
                format!("42{}", args)
            }
            Packet::ConnectError(data) => format!("44{}", data),
        }
    }

    pub fn decode(text: &str) -> Result<Self, DispatchError> {
        let mut chars = text.chars();
        let engine_type = chars
            .next()
            .ok_or_else(|| DispatchError::Protocol("empty packet".into()))?;
        let rest = chars.as_str();

        match engine_type {
            '0' => Ok(Packet::Open(parse_json(rest)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => decode_message(rest),
            '6' => Ok(Packet::Noop),
            other => Err(DispatchError::Protocol(format!(
                "unknown engine packet type '{}'",
                other
            ))),
        }
    }
}

fn decode_message(text: &str) -> Result<Packet, DispatchError> {
    let mut chars = text.chars();
    let socket_type = chars
        .next()
        .ok_or_else(|| DispatchError::Protocol("empty socket.io message".into()))?;
    let body = chars.as_str();

    if body.starts_with('/') {
        return Err(DispatchError::Protocol(format!(
            "unexpected namespace in '{}'",
            text
        )));
    }

    match socket_type {
        '0' if body.is_empty() => Ok(Packet::Connect(None)),
        '0' => Ok(Packet::Connect(Some(parse_json(body)?))),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body),
        '4' => Ok(Packet::ConnectError(parse_json(body)?)),
        other => Err(DispatchError::Protocol(format!(
            "unsupported socket.io packet type '{}'",
            other
        ))),
    }
}

fn decode_event(body: &str) -> Result<Packet, DispatchError> {
    // Skip an ack id, if any.
    let json = body.trim_start_matches(|c: char| c.is_ascii_digit());

    let args = match parse_json(json)? {
        Value::Array(args) => args,
        other => {
            return Err(DispatchError::Protocol(format!(
                "event payload is not an array: {}",
                other
            )))
        }
    };

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => return Err(DispatchError::Protocol("event without a name".into())),
    };
    let data = args.next().unwrap_or(Value::Null);

    Ok(Packet::Event { name, data })
}

fn parse_json(text: &str) -> Result<Value, DispatchError> {
    serde_json::from_str(text)
        .map_err(|e| DispatchError::Protocol(format!("bad JSON in packet: {}", e)))
}
