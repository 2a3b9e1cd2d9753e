use std::future::Future;
use tokio::task::LocalSet;

/// Runs a future to completion on a fresh current-thread runtime. The mock server engine runs
/// on such a runtime so that all request processing of one server happens on one thread.
pub(crate) fn block_on_current_thread<F, O>(f: F) -> std::io::Result<O>
where
    F: Future<Output = O>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(LocalSet::new().block_on(&runtime, f))
}
