//! Payload streaming
//!
//! Moves bytes between the data socket and the session's byte source or
//! sink (a provider file handle or a generated listing buffer). Socket
//! faults and local I/O faults are reported as distinct errors so the
//! control channel can reply 426 vs 451.

use std::io::{Read, Write};

use log::info;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::TransferError;

/// Streams from a byte source to the data socket until EOF, then shuts
/// down the write side so the client observes end of payload. Returns the
/// number of bytes sent.
pub async fn send_stream(
    data: &mut TcpStream,
    source: &mut (dyn Read + Send),
    buffer_size: usize,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = source.read(&mut buffer).map_err(TransferError::LocalIo)?;
        if n == 0 {
            break;
        }
        data.write_all(&buffer[..n])
            .await
            .map_err(TransferError::Aborted)?;
        total += n as u64;
    }

    data.flush().await.map_err(TransferError::Aborted)?;
    data.shutdown().await.map_err(TransferError::Aborted)?;

    info!("Sent {} bytes over data connection", total);
    Ok(total)
}

/// Streams from the data socket into a byte sink until the client closes
/// the connection. Returns the number of bytes received.
///
/// On failure the sink is left as written so far; partial uploads are not
/// rolled back.
pub async fn receive_stream(
    data: &mut TcpStream,
    sink: &mut (dyn Write + Send),
    buffer_size: usize,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = data.read(&mut buffer).await.map_err(TransferError::Aborted)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buffer[..n]).map_err(TransferError::LocalIo)?;
        total += n as u64;
    }

    sink.flush().map_err(TransferError::LocalIo)?;

    info!("Received {} bytes over data connection", total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::net::TcpListener;

    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dial = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (server_side, _) = listener.accept().await.unwrap();
        (server_side, dial.await.unwrap())
    }

    #[tokio::test]
    async fn send_stream_delivers_all_bytes_and_eof() {
        let (mut server_side, mut client_side) = socket_pair().await;
        let payload = b"directory listing\r\nmore\r\n".to_vec();
        let mut source = Cursor::new(payload.clone());

        let sender = tokio::spawn(async move {
            send_stream(&mut server_side, &mut source, 8).await.unwrap()
        });

        let mut received = Vec::new();
        client_side.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, payload);
        assert_eq!(sender.await.unwrap(), payload.len() as u64);
    }

    #[tokio::test]
    async fn receive_stream_collects_until_client_close() {
        let (mut server_side, mut client_side) = socket_pair().await;

        let writer = tokio::spawn(async move {
            client_side.write_all(b"uploaded bytes").await.unwrap();
            client_side.shutdown().await.unwrap();
        });

        let mut sink = Cursor::new(Vec::new());
        let total = receive_stream(&mut server_side, &mut sink, 4).await.unwrap();
        writer.await.unwrap();

        assert_eq!(total, 14);
        assert_eq!(sink.into_inner(), b"uploaded bytes");
    }
}
