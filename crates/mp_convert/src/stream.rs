//! Async byte streams.
//!
//! Values are written whole and flushed. Reading buffers chunks into an
//! [`IncrementalReader`] until the next value is complete, so a slow or
//! fragmented transport never sees a partial decode.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use futures_lite::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use mp_codec::{DecodeError, DecodeErrorKind, IncrementalReader};

use crate::shape::Shaped;
use crate::{CancellationToken, SerdeError, SerializationContext, Serializer};

const CHUNK_SIZE: usize = 4096;

/// Serializes `value` and writes it to `output`, flushing afterwards.
pub async fn serialize_async<T: Shaped, W: AsyncWrite + Unpin>(
    serializer: &Serializer,
    output: &mut W,
    value: &T,
) -> Result<(), SerdeError> {
    let bytes = serializer.serialize(value)?;
    output.write_all(&bytes).await?;
    output.flush().await?;
    Ok(())
}

/// Reads exactly one value from `input`.
///
/// Bytes following the value are left unread in the internal buffer and
/// discarded; use [`MessageStream`] to read a sequence of values.
pub async fn deserialize_async<T: Shaped, R: AsyncRead + Unpin>(
    serializer: &Serializer,
    input: R,
) -> Result<T, SerdeError> {
    let mut stream = MessageStream::new(serializer, input);
    match stream.next::<T>().await? {
        Some(value) => Ok(value),
        None => Err(DecodeError::new(DecodeErrorKind::EndOfData, 0).into()),
    }
}

/// A sequence of top-level values read from an async byte stream.
///
/// # Examples
///
/// ```
/// use mp_convert::{MessageStream, Serializer};
///
/// let serializer = Serializer::new();
/// let mut bytes = serializer.serialize(&1u8).unwrap();
/// bytes.extend(serializer.serialize(&"two".to_string()).unwrap());
///
/// futures_lite::future::block_on(async {
///     let mut stream = MessageStream::new(&serializer, &bytes[..]);
///     assert_eq!(stream.next::<u8>().await.unwrap(), Some(1));
///     assert_eq!(stream.next::<String>().await.unwrap().as_deref(), Some("two"));
///     assert_eq!(stream.next::<u8>().await.unwrap(), None);
/// });
/// ```
pub struct MessageStream<'s, R> {
    serializer: &'s Serializer,
    source: R,
    input: IncrementalReader,
    ctx: SerializationContext,
    chunk: Box<[u8]>,
}

impl<'s, R: AsyncRead + Unpin> MessageStream<'s, R> {
    pub fn new(serializer: &'s Serializer, source: R) -> Self {
        Self {
            serializer,
            source,
            input: serializer.incremental_reader(),
            ctx: serializer.context(),
            chunk: vec![0; CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Stops the stream between values once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.ctx = self.ctx.with_cancellation(token);
        self
    }

    /// Reads the next value.
    ///
    /// Returns `Ok(None)` when the source ends cleanly between values and an
    /// end-of-data error when it ends inside one.
    pub async fn next<T: Shaped>(&mut self) -> Result<Option<T>, SerdeError> {
        self.ctx.check_cancelled()?;
        loop {
            if let Some(value) = self
                .serializer
                .deserialize_incremental::<T>(&mut self.input, &mut self.ctx)?
            {
                return Ok(Some(value));
            }

            if self.input.is_finished() {
                if self.input.is_empty() {
                    return Ok(None);
                }
                let offset = self.input.buffered().len();
                log::debug!("stream ended inside a value after {offset} buffered bytes");
                return Err(DecodeError::new(DecodeErrorKind::EndOfData, offset).into());
            }

            let read = self.source.read(&mut self.chunk).await?;
            if read == 0 {
                self.input.finish();
            } else {
                self.input.feed(&self.chunk[..read]);
            }
        }
    }

    /// Bytes received but not yet consumed by a value.
    pub fn buffered(&self) -> &[u8] {
        self.input.buffered()
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}
