pub mod cfn_response;
pub mod secrets;
pub mod zia;

use std::future::Future;

/// Drives an async SDK call from the synchronous adapter traits. Requires
/// the multi-threaded tokio runtime the Lambda binary starts.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
