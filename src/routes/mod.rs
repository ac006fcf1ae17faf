mod health_check;
mod members;
pub use health_check::*;
pub use members::*;

/// Write an error followed by every error in its `source` chain, one per line.
/// Used for `Debug` impls, so that logs show the root cause rather than just
/// the outermost message.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
