//! Complete client requests framed as one queue transaction each.
//!
//! Every builder opens a message with [`SendQueue::begin_msg`], writes the
//! header and body, then commits. When a builder fails the message is left
//! open and the partial bytes are dropped by the next `begin_msg` or pop, so
//! the stream never carries a torn request.

use std::ffi::CStr;

use crate::{
    buffer::BufferPool,
    dbr::Payload,
    header::{RequestHeader, align_payload},
    queue::{PayloadRequest, STANDARD_PAYLOAD_LIMIT, SendError, SendQueue},
    request_code::RequestCode,
};

/// First minor revision whose peers parse the extended header.
pub const EXTENDED_HEADER_MINOR: u16 = 9;

const NILL_BYTES: [u8; 8] = [0; 8];

/// Frames requests for one peer into a borrowed [`SendQueue`].
#[derive(Debug)]
pub struct RequestWriter<'q, P: BufferPool> {
    queue: &'q mut SendQueue<P>,
    peer_minor: u16,
}

impl<'q, P: BufferPool> RequestWriter<'q, P> {
    /// Wrap `queue` for a peer that reported minor revision `peer_minor`.
    #[must_use]
    pub const fn new(queue: &'q mut SendQueue<P>, peer_minor: u16) -> Self {
        Self { queue, peer_minor }
    }

    /// Whether the peer accepts the extended header.
    #[must_use]
    pub const fn extended_ok(&self) -> bool { self.peer_minor >= EXTENDED_HEADER_MINOR }

    /// Announce the client's protocol revision and circuit priority.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn version(&mut self, priority: u16, minor: u16) -> Result<(), SendError> {
        let header = RequestHeader {
            data_type: priority,
            count: u32::from(minor),
            ..RequestHeader::new(RequestCode::Version)
        };
        self.header_only(&header)
    }

    /// Circuit keep-alive.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn echo(&mut self) -> Result<(), SendError> {
        self.header_only(&RequestHeader::new(RequestCode::Echo))
    }

    /// Pause subscription updates on this circuit.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn events_off(&mut self) -> Result<(), SendError> {
        self.header_only(&RequestHeader::new(RequestCode::EventsOff))
    }

    /// Resume subscription updates on this circuit.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn events_on(&mut self) -> Result<(), SendError> {
        self.header_only(&RequestHeader::new(RequestCode::EventsOn))
    }

    /// Ask the server to flush outstanding reads.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn read_sync(&mut self) -> Result<(), SendError> {
        self.header_only(&RequestHeader::new(RequestCode::ReadSync))
    }

    /// Announce the client's host name.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] for names that overflow a
    /// standard message when the peer cannot frame a larger one, and
    /// [`SendError::Pool`] when no buffer is available.
    pub fn host_name(&mut self, name: &CStr) -> Result<(), SendError> {
        self.named(RequestHeader::new(RequestCode::HostName), name)
    }

    /// Announce the client's user name.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] for names that overflow a
    /// standard message when the peer cannot frame a larger one, and
    /// [`SendError::Pool`] when no buffer is available.
    pub fn client_name(&mut self, name: &CStr) -> Result<(), SendError> {
        self.named(RequestHeader::new(RequestCode::ClientName), name)
    }

    /// Create channel `name` under client id `cid`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] for names that overflow a
    /// standard message when the peer cannot frame a larger one, and
    /// [`SendError::Pool`] when no buffer is available.
    pub fn create_channel(&mut self, name: &CStr, cid: u32, minor: u16) -> Result<(), SendError> {
        let header = RequestHeader {
            cid,
            available: u32::from(minor),
            ..RequestHeader::new(RequestCode::CreateChannel)
        };
        self.named(header, name)
    }

    /// Write `count` elements to server channel `sid` without a reply.
    ///
    /// # Errors
    ///
    /// Returns the payload validation errors of
    /// [`SendQueue::insert_request_with_payload`].
    pub fn write(
        &mut self,
        sid: u32,
        cid: u32,
        data_type: u16,
        count: u32,
        payload: Payload<'_>,
    ) -> Result<(), SendError> {
        self.with_payload(&PayloadRequest {
            command: RequestCode::Write.into(),
            data_type,
            count,
            cid: sid,
            available: cid,
            payload,
        })
    }

    /// Write `count` elements to server channel `sid`, asking for a
    /// completion reply tagged `ioid`.
    ///
    /// # Errors
    ///
    /// Returns the payload validation errors of
    /// [`SendQueue::insert_request_with_payload`].
    pub fn write_notify(
        &mut self,
        sid: u32,
        ioid: u32,
        data_type: u16,
        count: u32,
        payload: Payload<'_>,
    ) -> Result<(), SendError> {
        self.with_payload(&PayloadRequest {
            command: RequestCode::WriteNotify.into(),
            data_type,
            count,
            cid: sid,
            available: ioid,
            payload,
        })
    }

    /// Read `count` elements of `data_type` from `sid`, replying with `ioid`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] when `count` needs the
    /// extended header and the peer lacks it, or [`SendError::Pool`].
    pub fn read_notify(
        &mut self,
        sid: u32,
        ioid: u32,
        data_type: u16,
        count: u32,
    ) -> Result<(), SendError> {
        let header = RequestHeader {
            data_type,
            count,
            cid: sid,
            available: ioid,
            ..RequestHeader::new(RequestCode::ReadNotify)
        };
        self.header_only(&header)
    }

    /// Subscribe to changes of `sid` selected by `mask`, tagged `subid`.
    ///
    /// The body carries the legacy low/high/timeout fields as zeros.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] when `count` needs the
    /// extended header and the peer lacks it, or [`SendError::Pool`].
    pub fn event_add(
        &mut self,
        sid: u32,
        subid: u32,
        data_type: u16,
        count: u32,
        mask: u16,
    ) -> Result<(), SendError> {
        let header = RequestHeader {
            payload_size: 16,
            data_type,
            count,
            cid: sid,
            available: subid,
            ..RequestHeader::new(RequestCode::EventAdd)
        };
        let extended_ok = self.extended_ok();
        self.transact(|queue| {
            queue.insert_request_header(&header, extended_ok)?;
            for _ in 0..3 {
                queue.push_f32(0.0)?;
            }
            queue.push_u16(mask)?;
            queue.push_u16(0)
        })
    }

    /// Cancel subscription `subid` on `sid`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`] when `count` needs the
    /// extended header and the peer lacks it, or [`SendError::Pool`].
    pub fn event_cancel(
        &mut self,
        sid: u32,
        subid: u32,
        data_type: u16,
        count: u32,
    ) -> Result<(), SendError> {
        let header = RequestHeader {
            data_type,
            count,
            cid: sid,
            available: subid,
            ..RequestHeader::new(RequestCode::EventCancel)
        };
        self.header_only(&header)
    }

    /// Release server channel `sid`, known locally as `cid`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when no buffer is available.
    pub fn clear_channel(&mut self, sid: u32, cid: u32) -> Result<(), SendError> {
        let header = RequestHeader {
            cid: sid,
            available: cid,
            ..RequestHeader::new(RequestCode::ClearChannel)
        };
        self.header_only(&header)
    }

    fn transact(
        &mut self,
        build: impl FnOnce(&mut SendQueue<P>) -> Result<(), SendError>,
    ) -> Result<(), SendError> {
        self.queue.begin_msg();
        build(self.queue)?;
        self.queue.commit_msg();
        Ok(())
    }

    fn header_only(&mut self, header: &RequestHeader) -> Result<(), SendError> {
        let extended_ok = self.extended_ok();
        self.transact(|queue| queue.insert_request_header(header, extended_ok))
    }

    fn named(&mut self, mut header: RequestHeader, name: &CStr) -> Result<(), SendError> {
        let text = name.to_bytes_with_nul();
        let size = u32::try_from(text.len()).unwrap_or(u32::MAX);
        let extended_ok = self.extended_ok();
        header.payload_size = align_payload(size)
            .filter(|&padded| extended_ok || padded <= STANDARD_PAYLOAD_LIMIT)
            .ok_or(SendError::ExtensionRequired {
                payload_size: size,
                count: header.count,
            })?;
        let pad = usize::try_from(header.payload_size - size).unwrap_or_default();
        self.transact(|queue| {
            queue.insert_request_header(&header, extended_ok)?;
            queue.push_string(text)?;
            queue.push_string(NILL_BYTES.get(..pad).unwrap_or_default())
        })
    }

    fn with_payload(&mut self, request: &PayloadRequest<'_>) -> Result<(), SendError> {
        let extended_ok = self.extended_ok();
        self.transact(|queue| queue.insert_request_with_payload(request, extended_ok))
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "test assertions")]
#[expect(clippy::big_endian_bytes, reason = "network protocol uses big-endian")]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        buffer::FreeListPool,
        dbr::{DBR_DOUBLE, DBR_LONG, DBR_STRING, DbrString},
        queue::MessageState,
        request_code::CA_MINOR_PROTOCOL_REVISION,
        test_helpers::drain_stream,
    };

    #[fixture]
    fn queue() -> SendQueue<FreeListPool> { SendQueue::new(FreeListPool::new(16)) }

    fn header_bytes(cmd: u16, size: u16, ty: u16, count: u16, cid: u32, avail: u32) -> Vec<u8> {
        let mut out = Vec::new();
        for field in [cmd, size, ty, count] {
            out.extend_from_slice(&field.to_be_bytes());
        }
        out.extend_from_slice(&cid.to_be_bytes());
        out.extend_from_slice(&avail.to_be_bytes());
        out
    }

    #[rstest]
    fn version_carries_priority_and_revision(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, CA_MINOR_PROTOCOL_REVISION)
            .version(10, CA_MINOR_PROTOCOL_REVISION)
            .expect("version");

        assert_eq!(drain_stream(&mut queue), header_bytes(0, 0, 10, 13, 0, 0));
    }

    #[rstest]
    #[case::echo(23)]
    #[case::events_off(8)]
    #[case::events_on(9)]
    #[case::read_sync(10)]
    fn bare_commands_are_a_zeroed_header(mut queue: SendQueue<FreeListPool>, #[case] cmd: u16) {
        let mut writer = RequestWriter::new(&mut queue, 13);
        let sent = match cmd {
            23 => writer.echo(),
            8 => writer.events_off(),
            9 => writer.events_on(),
            _ => writer.read_sync(),
        };
        sent.expect("request");

        assert_eq!(drain_stream(&mut queue), header_bytes(cmd, 0, 0, 0, 0, 0));
    }

    #[rstest]
    fn host_name_is_terminated_and_padded(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, 13)
            .host_name(c"ioc01")
            .expect("host name");

        let mut expected = header_bytes(21, 8, 0, 0, 0, 0);
        expected.extend_from_slice(b"ioc01\0\0\0");
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn client_name_of_aligned_length_gets_a_full_pad(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, 13)
            .client_name(c"operator")
            .expect("client name");

        let mut expected = header_bytes(20, 16, 0, 0, 0, 0);
        expected.extend_from_slice(b"operator\0\0\0\0\0\0\0\0");
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn create_channel_names_the_client_id(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, 13)
            .create_channel(c"TEMP:1", 42, CA_MINOR_PROTOCOL_REVISION)
            .expect("create channel");

        let mut expected = header_bytes(18, 8, 0, 0, 42, 13);
        expected.extend_from_slice(b"TEMP:1\0\0");
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    #[case::fills_a_standard_message(16_360, 8, true)]
    #[case::overflows_for_an_old_peer(16_368, 8, false)]
    #[case::fits_for_a_new_peer(16_368, 13, true)]
    fn long_names_respect_the_standard_message_size(
        mut queue: SendQueue<FreeListPool>,
        #[case] len: usize,
        #[case] peer_minor: u16,
        #[case] accepted: bool,
    ) {
        let name = std::ffi::CString::new(vec![b'n'; len]).expect("no interior NUL");

        let sent = RequestWriter::new(&mut queue, peer_minor).host_name(&name);

        if accepted {
            sent.expect("host name");
            assert!(drain_stream(&mut queue).len() > len);
        } else {
            assert!(matches!(sent, Err(SendError::ExtensionRequired { .. })));
            assert_eq!(queue.occupied_bytes(), 0);
        }
    }

    #[rstest]
    fn write_addresses_server_and_client_ids(mut queue: SendQueue<FreeListPool>) {
        let values = [7i32];
        RequestWriter::new(&mut queue, 13)
            .write(5, 6, DBR_LONG, 1, Payload::from(&values[..]))
            .expect("write");

        let mut expected = header_bytes(4, 8, DBR_LONG, 1, 5, 6);
        expected.extend_from_slice(&[0, 0, 0, 7, 0, 0, 0, 0]);
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn write_notify_tags_the_io_id(mut queue: SendQueue<FreeListPool>) {
        let values = [DbrString::new("on").expect("valid string")];
        RequestWriter::new(&mut queue, 13)
            .write_notify(5, 99, DBR_STRING, 1, Payload::from(&values[..]))
            .expect("write notify");

        let mut expected = header_bytes(19, 8, DBR_STRING, 1, 5, 99);
        expected.extend_from_slice(b"on\0\0\0\0\0\0");
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn read_notify_has_no_body(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, 13)
            .read_notify(5, 77, DBR_DOUBLE, 3)
            .expect("read notify");

        assert_eq!(drain_stream(&mut queue), header_bytes(15, 0, DBR_DOUBLE, 3, 5, 77));
    }

    #[rstest]
    fn event_add_body_holds_zeros_and_mask(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, 13)
            .event_add(5, 3, DBR_DOUBLE, 1, 0x0005)
            .expect("event add");

        let mut expected = header_bytes(1, 16, DBR_DOUBLE, 1, 5, 3);
        expected.extend_from_slice(&[0; 12]);
        expected.extend_from_slice(&[0x00, 0x05, 0x00, 0x00]);
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn event_cancel_and_clear_channel(mut queue: SendQueue<FreeListPool>) {
        let mut writer = RequestWriter::new(&mut queue, 13);
        writer.event_cancel(5, 3, DBR_DOUBLE, 1).expect("event cancel");
        writer.clear_channel(5, 42).expect("clear channel");

        let mut expected = header_bytes(2, 0, DBR_DOUBLE, 1, 5, 3);
        expected.extend(header_bytes(12, 0, 0, 0, 5, 42));
        assert_eq!(drain_stream(&mut queue), expected);
    }

    #[rstest]
    fn large_reads_use_the_extension_for_new_peers(mut queue: SendQueue<FreeListPool>) {
        RequestWriter::new(&mut queue, EXTENDED_HEADER_MINOR)
            .read_notify(5, 1, DBR_DOUBLE, 100_000)
            .expect("read notify");

        let stream = drain_stream(&mut queue);
        assert_eq!(stream.len(), 24);
        assert_eq!(stream.get(6..8), Some(&[0xFF, 0xFF][..]));
        assert_eq!(stream.get(20..24), Some(&100_000u32.to_be_bytes()[..]));
    }

    #[rstest]
    fn failed_request_is_never_sent(mut queue: SendQueue<FreeListPool>) {
        let mut writer = RequestWriter::new(&mut queue, EXTENDED_HEADER_MINOR - 1);
        writer.echo().expect("echo");
        let err = writer
            .read_notify(5, 1, DBR_DOUBLE, 100_000)
            .expect_err("old peer cannot take the extension");

        assert_eq!(
            err,
            SendError::ExtensionRequired {
                payload_size: 0,
                count: 100_000,
            }
        );
        assert_eq!(queue.state(), MessageState::MessageOpen);
        assert_eq!(drain_stream(&mut queue), header_bytes(23, 0, 0, 0, 0, 0));
    }
}
