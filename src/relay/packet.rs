//! MQTT 3.1.1 packet codec (QoS 0 subset).
//!
//! Only what a game board needs: CONNECT, SUBSCRIBE, PUBLISH and PINGREQ
//! out; CONNACK, SUBACK, PUBLISH and PINGRESP in.
//!
//! ## Fixed header
//!
//! ```text
//! Byte 0    : packet type (bits 7..4) | flags (bits 3..0)
//! Byte 1..4 : remaining length, 7 bits per byte, bit 7 = continuation
//! ```

use crate::error::Error;

// First header byte of outbound packets
const CONNECT: u8 = 0x10;
const SUBSCRIBE: u8 = 0x82;
const PINGREQ: u8 = 0xC0;

// Packet types (high nibble)
const CONNACK: u8 = 2;
const PUBLISH: u8 = 3;
const SUBACK: u8 = 9;
const PINGRESP: u8 = 13;

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

const FLAG_CLEAN_SESSION: u8 = 0x02;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_USERNAME: u8 = 0x80;

/// Largest value the 4-byte remaining-length field can carry.
const MAX_REMAINING_LENGTH: usize = 268_435_455;

/// CONNECT parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connect<'a> {
    pub client_id: &'a str,
    pub keep_alive_secs: u16,
    pub username: Option<&'a str>,
    /// Only sent together with a username.
    pub password: Option<&'a str>,
}

/// A decoded inbound packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Packet<'a> {
    ConnAck { session_present: bool, return_code: u8 },
    Publish { topic: &'a str, payload: &'a [u8] },
    SubAck { packet_id: u16, granted: u8 },
    PingResp,
    /// Any other packet type, skipped by the client.
    Unsupported(u8),
}

struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self, v: u8) -> Result<(), Error> {
        self.bytes(&[v])
    }

    fn u16(&mut self, v: u16) -> Result<(), Error> {
        self.bytes(&v.to_be_bytes())
    }

    fn bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        let end = self.pos + data.len();
        let dst = self.buf.get_mut(self.pos..end).ok_or(Error::BufferOverflow)?;
        dst.copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    /// Length-prefixed UTF-8 string.
    fn str(&mut self, s: &str) -> Result<(), Error> {
        let len = u16::try_from(s.len()).map_err(|_| Error::BufferOverflow)?;
        self.u16(len)?;
        self.bytes(s.as_bytes())
    }

    fn header(&mut self, first: u8, remaining: usize) -> Result<(), Error> {
        if remaining > MAX_REMAINING_LENGTH {
            return Err(Error::BufferOverflow);
        }
        self.u8(first)?;
        let mut rest = remaining;
        loop {
            let mut byte = (rest % 128) as u8;
            rest /= 128;
            if rest > 0 {
                byte |= 0x80;
            }
            self.u8(byte)?;
            if rest == 0 {
                return Ok(());
            }
        }
    }

    fn finish(self) -> usize {
        self.pos
    }
}

fn str_len(s: &str) -> usize {
    2 + s.len()
}

/// Encode CONNECT (clean session). Returns the frame length.
pub fn encode_connect(buf: &mut [u8], connect: &Connect<'_>) -> Result<usize, Error> {
    let mut flags = FLAG_CLEAN_SESSION;
    let mut remaining = str_len(PROTOCOL_NAME) + 1 + 1 + 2 + str_len(connect.client_id);
    if let Some(user) = connect.username {
        flags |= FLAG_USERNAME;
        remaining += str_len(user);
        if let Some(pass) = connect.password {
            flags |= FLAG_PASSWORD;
            remaining += str_len(pass);
        }
    }

    let mut w = Writer::new(buf);
    w.header(CONNECT, remaining)?;
    w.str(PROTOCOL_NAME)?;
    w.u8(PROTOCOL_LEVEL)?;
    w.u8(flags)?;
    w.u16(connect.keep_alive_secs)?;
    w.str(connect.client_id)?;
    if let Some(user) = connect.username {
        w.str(user)?;
        if let Some(pass) = connect.password {
            w.str(pass)?;
        }
    }
    Ok(w.finish())
}

/// Encode a single-topic SUBSCRIBE at QoS 0.
pub fn encode_subscribe(buf: &mut [u8], packet_id: u16, topic: &str) -> Result<usize, Error> {
    let mut w = Writer::new(buf);
    w.header(SUBSCRIBE, 2 + str_len(topic) + 1)?;
    w.u16(packet_id)?;
    w.str(topic)?;
    w.u8(0)?;
    Ok(w.finish())
}

/// Encode a QoS 0 PUBLISH (no packet id, no retain).
pub fn encode_publish(buf: &mut [u8], topic: &str, payload: &[u8]) -> Result<usize, Error> {
    let mut w = Writer::new(buf);
    w.header(PUBLISH << 4, str_len(topic) + payload.len())?;
    w.str(topic)?;
    w.bytes(payload)?;
    Ok(w.finish())
}

pub fn encode_pingreq(buf: &mut [u8]) -> Result<usize, Error> {
    let mut w = Writer::new(buf);
    w.header(PINGREQ, 0)?;
    Ok(w.finish())
}

/// Parse the remaining-length field starting at `buf[1]`.
///
/// Returns `(remaining, header_len)`, or `None` while incomplete.
fn remaining_length(buf: &[u8]) -> Result<Option<(usize, usize)>, Error> {
    let mut value = 0usize;
    for i in 0..4 {
        let Some(&byte) = buf.get(1 + i) else {
            return Ok(None);
        };
        value |= ((byte & 0x7F) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, 2 + i)));
        }
    }
    Err(Error::MalformedPacket)
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16, Error> {
    match buf.get(at..at + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(Error::MalformedPacket),
    }
}

/// Total length of the frame starting at `buf[0]`, once its fixed header
/// is complete.
pub fn frame_len(buf: &[u8]) -> Result<Option<usize>, Error> {
    if buf.is_empty() {
        return Ok(None);
    }
    Ok(remaining_length(buf)?.map(|(remaining, header_len)| header_len + remaining))
}

/// Decode one packet from the front of `buf`.
///
/// `Ok(None)` means more bytes are needed; otherwise the packet and the
/// number of bytes it occupied are returned.
pub fn decode(buf: &[u8]) -> Result<Option<(Packet<'_>, usize)>, Error> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    let Some((remaining, header_len)) = remaining_length(buf)? else {
        return Ok(None);
    };
    let total = header_len + remaining;
    let Some(body) = buf.get(header_len..total) else {
        return Ok(None);
    };

    let packet = match first >> 4 {
        CONNACK => match body {
            &[flags, return_code] => Packet::ConnAck {
                session_present: flags & 0x01 != 0,
                return_code,
            },
            _ => return Err(Error::MalformedPacket),
        },
        PUBLISH => {
            let qos = (first >> 1) & 0x03;
            if qos == 3 {
                return Err(Error::MalformedPacket);
            }
            let topic_len = read_u16(body, 0)? as usize;
            let topic_end = 2 + topic_len;
            let topic = body
                .get(2..topic_end)
                .ok_or(Error::MalformedPacket)
                .and_then(|raw| core::str::from_utf8(raw).map_err(|_| Error::MalformedPacket))?;
            // QoS 1/2 carry a packet id we do not acknowledge.
            let payload_start = if qos > 0 { topic_end + 2 } else { topic_end };
            let payload = body.get(payload_start..).ok_or(Error::MalformedPacket)?;
            Packet::Publish { topic, payload }
        }
        SUBACK => {
            let packet_id = read_u16(body, 0)?;
            let granted = *body.get(2).ok_or(Error::MalformedPacket)?;
            Packet::SubAck { packet_id, granted }
        }
        PINGRESP => Packet::PingResp,
        other => Packet::Unsupported(other),
    };
    Ok(Some((packet, total)))
}
