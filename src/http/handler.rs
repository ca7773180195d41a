//! Handler contract between the session core and application logic.

use std::future::Future;

use crate::http::exchange::Exchange;
use crate::http::request::RequestHead;
use crate::payload::Payload;

/// Application logic plugged into every session.
///
/// One handler value is shared read-only by all sessions of a listener.
pub trait Handler: Send + Sync + 'static {
    /// Called once per request with the parsed head, before the body is read.
    ///
    /// May replace `body` with a disk-backed payload. Returning `false`
    /// drops the connection without a response.
    fn accept(&self, head: &RequestHead, body: &mut Payload) -> bool {
        let _ = (head, body);
        true
    }

    /// Produce the response for a fully read request.
    ///
    /// The handler must eventually call [`Exchange::send`] exactly once,
    /// either before returning or from a task it hands the exchange to.
    fn handle(&self, exchange: Exchange) -> impl Future<Output = ()> + Send;
}
