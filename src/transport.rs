use crate::endpoint::Endpoint;
use crate::error::Error;
use nix::errno::Errno;

/// usbfs bulk ceiling per transaction; longer payloads are split.
pub const MAX_BULK_TRANSACTION: usize = 4096;

/// One bulk-OUT transaction on an open device channel. `UsbFs` is the real
/// implementation; tests drive the chunking against a recording fake.
pub trait BulkChannel {
    fn bulk_out(&mut self, ep: Endpoint, data: &[u8]) -> Result<usize, Errno>;
}

/// Whether a terminating zero-length packet is sent after a non-empty
/// payload. The fastboot bootloader does not need one; class protocols that
/// frame transfers by short packet do when the payload is an exact multiple
/// of the endpoint's max packet size.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Termination {
    None,
    ZeroLengthPacket,
}

/// Transmit `payload` to `ep` in order, in chunks of at most
/// [`MAX_BULK_TRANSACTION`] bytes. An empty payload is one explicit
/// zero-length transaction. Any short or failed transaction aborts the send
/// with the offset it happened at; nothing is retried. Returns the number of
/// payload bytes transmitted.
pub fn send<C: BulkChannel>(
    channel: &mut C,
    ep: Endpoint,
    payload: &[u8],
    termination: Termination,
) -> Result<usize, Error> {
    if !ep.is_bulk_out() {
        return Err(Error::EndpointNotWritable(ep));
    }

    if payload.is_empty() {
        zero_length(channel, ep, 0)?;
        return Ok(0);
    }

    let mut sent = 0;
    for chunk in payload.chunks(MAX_BULK_TRANSACTION) {
        let n = channel.bulk_out(ep, chunk).map_err(|source| Error::Transport {
            endpoint: ep,
            offset: sent,
            source,
        })?;
        if n != chunk.len() {
            return Err(Error::ShortWrite {
                offset: sent,
                requested: chunk.len(),
                transferred: n,
            });
        }
        sent += n;
    }

    if termination == Termination::ZeroLengthPacket {
        zero_length(channel, ep, sent)?;
    }

    Ok(sent)
}

fn zero_length<C: BulkChannel>(channel: &mut C, ep: Endpoint, offset: usize) -> Result<(), Error> {
    let n = channel.bulk_out(ep, &[]).map_err(|source| Error::Transport {
        endpoint: ep,
        offset,
        source,
    })?;
    if n != 0 {
        return Err(Error::ShortWrite {
            offset,
            requested: 0,
            transferred: n,
        });
    }
    Ok(())
}
