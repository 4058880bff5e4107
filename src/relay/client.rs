//! MQTT 3.1.1 client over an `embedded-io-async` byte pipe.
//!
//! Inbound bytes are buffered and framed incrementally, so a `receive`
//! future dropped mid-frame (e.g. by a `select`) loses nothing: the next
//! call picks up where the last one stopped.

use embedded_io_async::{Read, Write};

use super::packet::{self, Connect, Packet};
use super::{Relay, RelayMessage};
use crate::config::{
    MQTT_CLIENT_ID, MQTT_KEEP_ALIVE_SECS, MQTT_PASSWORD, MQTT_RX_BUFFER, MQTT_TX_BUFFER, MQTT_USERNAME,
};
use crate::error::{Error, RelayError};

/// Session parameters sent in CONNECT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MqttOptions {
    pub client_id: &'static str,
    pub keep_alive_secs: u16,
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
}

impl MqttOptions {
    /// Options from the compile-time configuration.
    pub const fn from_config() -> Self {
        Self {
            client_id: MQTT_CLIENT_ID,
            keep_alive_secs: MQTT_KEEP_ALIVE_SECS,
            username: MQTT_USERNAME,
            password: MQTT_PASSWORD,
        }
    }
}

impl Default for MqttOptions {
    fn default() -> Self {
        Self::from_config()
    }
}

/// A complete frame at the front of the receive buffer.
enum Frame {
    Publish { len: usize },
    ConnAck { return_code: u8, len: usize },
}

enum Scan {
    Frame(Frame),
    Skip(usize),
    Incomplete,
}

pub struct MqttRelay<T> {
    transport: T,
    options: MqttOptions,
    rx: [u8; MQTT_RX_BUFFER],
    rx_len: usize,
    /// Bytes at the front of `rx` already handed out.
    consumed: usize,
    /// Unread tail of an oversize frame, skipped before framing resumes.
    discard: usize,
    tx: [u8; MQTT_TX_BUFFER],
    packet_id: u16,
}

impl<T: Read + Write> MqttRelay<T> {
    pub fn new(transport: T, options: MqttOptions) -> Self {
        Self {
            transport,
            options,
            rx: [0; MQTT_RX_BUFFER],
            rx_len: 0,
            consumed: 0,
            discard: 0,
            tx: [0; MQTT_TX_BUFFER],
            packet_id: 0,
        }
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    fn next_packet_id(&mut self) -> u16 {
        self.packet_id = self.packet_id.wrapping_add(1).max(1);
        self.packet_id
    }

    async fn send(&mut self, len: usize) -> Result<(), Error> {
        self.transport
            .write_all(&self.tx[..len])
            .await
            .map_err(|_| RelayError::Transport)?;
        self.transport.flush().await.map_err(|_| RelayError::Transport)?;
        Ok(())
    }

    fn compact(&mut self) {
        if self.consumed > 0 {
            self.rx.copy_within(self.consumed..self.rx_len, 0);
            self.rx_len -= self.consumed;
            self.consumed = 0;
        }
    }

    async fn fill(&mut self) -> Result<(), Error> {
        if self.rx_len == self.rx.len() {
            let total = packet::frame_len(&self.rx).ok().flatten().unwrap_or(self.rx_len);
            self.discard = total.saturating_sub(self.rx_len);
            warn!("MQTT: {} byte frame exceeds {} byte buffer, skipping", total, MQTT_RX_BUFFER);
            self.rx_len = 0;
            return Err(Error::BufferOverflow);
        }
        let n = self
            .transport
            .read(&mut self.rx[self.rx_len..])
            .await
            .map_err(|_| RelayError::Transport)?;
        if n == 0 {
            return Err(RelayError::Closed.into());
        }

        // rx is empty while discarding, so the new bytes start at 0
        if self.discard > 0 {
            let skipped = n.min(self.discard);
            self.discard -= skipped;
            self.rx.copy_within(skipped..n, 0);
            self.rx_len = n - skipped;
            return Ok(());
        }
        self.rx_len += n;
        Ok(())
    }

    fn scan(&self) -> Result<Scan, Error> {
        let scan = match packet::decode(&self.rx[..self.rx_len])? {
            Some((Packet::Publish { .. }, len)) => Scan::Frame(Frame::Publish { len }),
            Some((Packet::ConnAck { return_code, .. }, len)) => Scan::Frame(Frame::ConnAck { return_code, len }),
            Some((Packet::SubAck { packet_id, granted }, len)) => {
                if granted == 0x80 {
                    warn!("MQTT: subscription {} refused", packet_id);
                }
                Scan::Skip(len)
            }
            Some((Packet::PingResp, len)) => Scan::Skip(len),
            Some((Packet::Unsupported(kind), len)) => {
                debug!("MQTT: skipping packet type {}", kind);
                Scan::Skip(len)
            }
            None => Scan::Incomplete,
        };
        Ok(scan)
    }

    /// Read until a PUBLISH or CONNACK sits at the front of the buffer.
    /// The frame is not consumed.
    async fn next_frame(&mut self) -> Result<Frame, Error> {
        loop {
            self.compact();
            let scan = match self.scan() {
                Ok(scan) => scan,
                Err(e) => {
                    self.rx_len = 0;
                    return Err(e);
                }
            };
            match scan {
                Scan::Frame(frame) => return Ok(frame),
                Scan::Skip(len) => self.consumed = len,
                Scan::Incomplete => self.fill().await?,
            }
        }
    }
}

impl<T: Read + Write> Relay for MqttRelay<T> {
    async fn connect(&mut self) -> Result<(), Error> {
        self.rx_len = 0;
        self.consumed = 0;
        self.discard = 0;

        let connect = Connect {
            client_id: self.options.client_id,
            keep_alive_secs: self.options.keep_alive_secs,
            username: self.options.username,
            password: self.options.password,
        };
        let len = packet::encode_connect(&mut self.tx, &connect)?;
        self.send(len).await?;

        match self.next_frame().await? {
            Frame::ConnAck { return_code, len } => {
                self.consumed = len;
                if return_code != 0 {
                    return Err(RelayError::Refused(return_code).into());
                }
                debug!("MQTT: connected as {}", self.options.client_id);
                Ok(())
            }
            Frame::Publish { .. } => Err(RelayError::UnexpectedPacket.into()),
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), Error> {
        let packet_id = self.next_packet_id();
        let len = packet::encode_subscribe(&mut self.tx, packet_id, topic)?;
        self.send(len).await
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        let len = packet::encode_publish(&mut self.tx, topic, payload)?;
        self.send(len).await
    }

    async fn receive(&mut self) -> Result<RelayMessage<'_>, Error> {
        loop {
            match self.next_frame().await? {
                Frame::Publish { len } => {
                    self.consumed = len;
                    return match packet::decode(&self.rx[..len])? {
                        Some((Packet::Publish { topic, payload }, _)) => Ok(RelayMessage { topic, payload }),
                        _ => Err(Error::MalformedPacket),
                    };
                }
                Frame::ConnAck { len, .. } => {
                    warn!("MQTT: unexpected CONNACK");
                    self.consumed = len;
                }
            }
        }
    }

    async fn ping(&mut self) -> Result<(), Error> {
        let len = packet::encode_pingreq(&mut self.tx)?;
        self.send(len).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Byte pipe fed in chunks; each read returns at most one chunk.
    #[derive(Default)]
    struct MockPipe {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        /// Pend instead of reporting end-of-stream when out of input.
        hang_when_empty: bool,
    }

    impl MockPipe {
        fn feed(&mut self, bytes: &[u8]) {
            self.chunks.push_back(bytes.to_vec());
        }
    }

    impl embedded_io_async::ErrorType for MockPipe {
        type Error = Infallible;
    }

    impl Read for MockPipe {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                if self.hang_when_empty {
                    core::future::pending::<()>().await;
                }
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                chunk.drain(..n);
                self.chunks.push_front(chunk);
            }
            Ok(n)
        }
    }

    impl Write for MockPipe {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        async fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    fn options() -> MqttOptions {
        MqttOptions {
            client_id: "p1",
            keep_alive_secs: 60,
            username: None,
            password: None,
        }
    }

    fn publish_frame(topic: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = [0u8; 512];
        let n = packet::encode_publish(&mut buf, topic, payload).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn connect_waits_for_connack() {
        let mut pipe = MockPipe::default();
        pipe.feed(&[0x20, 2, 0, 0]);
        let mut relay = MqttRelay::new(pipe, options());

        block_on(relay.connect()).unwrap();
        let written = &relay.transport().written;
        assert_eq!(written[0], 0x10);
        assert_eq!(&written[written.len() - 4..], &[0, 2, b'p', b'1']);
    }

    #[test]
    fn connect_refused() {
        let mut pipe = MockPipe::default();
        pipe.feed(&[0x20, 2, 0, 5]);
        let mut relay = MqttRelay::new(pipe, options());
        assert_eq!(block_on(relay.connect()), Err(Error::Network(RelayError::Refused(5))));
    }

    #[test]
    fn connect_on_closed_pipe() {
        let mut relay = MqttRelay::new(MockPipe::default(), options());
        assert_eq!(block_on(relay.connect()), Err(Error::Network(RelayError::Closed)));
    }

    #[test]
    fn subscribe_uses_fresh_packet_ids() {
        let mut relay = MqttRelay::new(MockPipe::default(), options());
        block_on(relay.subscribe("a")).unwrap();
        block_on(relay.subscribe("b")).unwrap();
        assert_eq!(
            relay.transport().written,
            [0x82, 6, 0, 1, 0, 1, b'a', 0, 0x82, 6, 0, 2, 0, 1, b'b', 0]
        );
    }

    #[test]
    fn receive_skips_acks_and_reassembles_split_frames() {
        let mut pipe = MockPipe::default();
        let frame = publish_frame("trellis-duel/status", &[2]);
        pipe.feed(&[0x90, 3, 0, 1, 0]);
        pipe.feed(&[0xD0, 0]);
        pipe.feed(&frame[..5]);
        pipe.feed(&frame[5..]);
        let mut relay = MqttRelay::new(pipe, options());

        let msg = block_on(relay.receive()).unwrap();
        assert_eq!(msg.topic, "trellis-duel/status");
        assert_eq!(msg.payload, &[2]);
    }

    #[test]
    fn receive_returns_back_to_back_publishes() {
        let mut pipe = MockPipe::default();
        let mut stream = publish_frame("a", &[1, 2]);
        stream.extend(publish_frame("b", &[3]));
        pipe.feed(&stream);
        let mut relay = MqttRelay::new(pipe, options());

        let first = block_on(relay.receive()).unwrap();
        assert_eq!((first.topic, first.payload), ("a", &[1u8, 2][..]));
        let second = block_on(relay.receive()).unwrap();
        assert_eq!((second.topic, second.payload), ("b", &[3u8][..]));
        assert_eq!(block_on(relay.receive()), Err(Error::Network(RelayError::Closed)));
    }

    #[test]
    fn receive_survives_cancellation() {
        let pipe = MockPipe {
            hang_when_empty: true,
            ..MockPipe::default()
        };
        let frame = publish_frame("t", &[7, 8, 9]);
        let mut relay = MqttRelay::new(pipe, options());
        relay.transport().feed(&frame[..4]);

        let outcome = block_on(select(relay.receive(), async {}));
        assert!(matches!(outcome, Either::Second(())));

        relay.transport().feed(&frame[4..]);
        let msg = block_on(relay.receive()).unwrap();
        assert_eq!(msg.topic, "t");
        assert_eq!(msg.payload, &[7, 8, 9]);
    }

    #[test]
    fn oversize_frame_is_dropped() {
        let mut pipe = MockPipe::default();
        // header claims 1000 bytes
        pipe.feed(&[0x30, 0xE8, 0x07]);
        pipe.feed(&[0u8; MQTT_RX_BUFFER]);
        let mut relay = MqttRelay::new(pipe, options());
        assert_eq!(block_on(relay.receive()), Err(Error::BufferOverflow));
    }

    #[test]
    fn oversize_frame_tail_is_not_reframed() {
        // 303-byte frame whose payload hides a status publish past the
        // end of the receive buffer
        let fake = publish_frame("trellis-duel/status", &[4]);
        let mut payload = [0u8; 297];
        payload[254..254 + fake.len()].copy_from_slice(&fake);
        let big = publish_frame("x", &payload);
        assert_eq!(big.len(), 303);

        let mut pipe = MockPipe::default();
        pipe.feed(&big[..280]);
        let mut tail = big[280..].to_vec();
        tail.extend(publish_frame("ok", &[1]));
        pipe.feed(&tail);
        let mut relay = MqttRelay::new(pipe, options());

        assert_eq!(block_on(relay.receive()), Err(Error::BufferOverflow));
        let msg = block_on(relay.receive()).unwrap();
        assert_eq!((msg.topic, msg.payload), ("ok", &[1u8][..]));
        assert_eq!(block_on(relay.receive()), Err(Error::Network(RelayError::Closed)));
    }

    #[test]
    fn malformed_frame_resets_buffer() {
        let mut pipe = MockPipe::default();
        pipe.feed(&[0x30, 4, 0, 1, 0xFF, 1]);
        pipe.feed(&publish_frame("ok", &[1]));
        let mut relay = MqttRelay::new(pipe, options());

        assert_eq!(block_on(relay.receive()), Err(Error::MalformedPacket));
        assert_eq!(block_on(relay.receive()).unwrap().topic, "ok");
    }

    #[test]
    fn publish_and_ping_bytes() {
        let mut relay = MqttRelay::new(MockPipe::default(), options());
        block_on(relay.publish("t", &[5])).unwrap();
        block_on(relay.ping()).unwrap();
        assert_eq!(relay.transport().written, [0x30, 4, 0, 1, b't', 5, 0xC0, 0]);
    }

    #[test]
    fn publish_too_large_for_tx_buffer() {
        let mut relay = MqttRelay::new(MockPipe::default(), options());
        let payload = [0u8; MQTT_TX_BUFFER];
        assert_eq!(block_on(relay.publish("t", &payload)), Err(Error::BufferOverflow));
        assert!(relay.transport().written.is_empty());
    }
}
