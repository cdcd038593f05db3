use bytes::Bytes;

/// One step of decoder output: either a completed head or a piece of body.
///
/// The generic parameter `T` is the head payload, typically
/// `(MessageHead, PayloadSize)` as produced by the message decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// The head of a new message.
    Header(T),
    /// A body chunk or the end-of-body marker.
    Payload(PayloadItem),
}

impl<T> Message<T> {
    /// Returns true if this message carries body data or the end-of-body marker.
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    /// Returns true if this message carries a head.
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// Converts the message into its payload item, if it carries one.
    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Header(_) => None,
            Message::Payload(payload_item) => Some(payload_item),
        }
    }
}

/// An item produced by the body framing decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A chunk of body bytes, framing octets already stripped.
    Chunk(Bytes),
    /// Marks the end of the body.
    Eof,
}

impl PayloadItem {
    /// Returns true if this item marks the end of the body.
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item carries body bytes.
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Returns a reference to the chunk bytes, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the item and returns the chunk bytes, if any.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

/// Body framing mode selected from a message head.
///
/// Which mode applies is decided once per message, from the
/// `Transfer-Encoding` and `Content-Length` headers and (for responses) the
/// status code. See the head decoder for the selection rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Fixed-length body of the given number of bytes.
    Length(u64),
    /// Body framed with chunked transfer encoding.
    Chunked,
    /// Body delimited only by connection close (legacy responses).
    CloseDelimited,
    /// No body at all.
    Empty,
}

impl PayloadSize {
    /// Returns true if the body uses chunked transfer encoding.
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if the body ends only when the connection closes.
    #[inline]
    pub fn is_close_delimited(&self) -> bool {
        matches!(self, PayloadSize::CloseDelimited)
    }

    /// Returns true if the message declares no body.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }
}
