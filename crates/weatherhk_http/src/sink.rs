use http::{HeaderMap, StatusCode};

/// Capability set of a response target: header mutation, status write and
/// body write.
///
/// Headers should be set before the first body write; sinks that stream to
/// the network are free to ignore later header changes.
pub trait ResponseSink: Send {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the response status. Expected once per response.
    fn write_status(&mut self, status: StatusCode);

    /// Appends `buf` to the response body, returning the number of bytes
    /// accepted.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
}
