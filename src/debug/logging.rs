//! Console logging for the reconciler.
//!
//! Lines look like `[undertow] DEBUG commit (commit): committed placed=2 updated=0`:
//! the level, the reconciler stage taken from the event target, the innermost span and
//! then the event fields.

use std::fmt::Write as _;
use std::io;
use std::panic::{self, PanicHookInfo};
use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

const LINE_PREFIX: &str = "[undertow]";
const TARGET_ROOT: &str = "undertow::";
const DEFAULT_FILTER: &str = "info";

static TRACING: Once = Once::new();
static PANIC_HOOK: Once = Once::new();

/// Installs a stderr subscriber honouring `RUST_LOG` (idempotent).
///
/// Without `RUST_LOG` only `info` and above are shown. Reconciler events use the
/// `undertow::scheduler`, `undertow::reconcile`, `undertow::commit` and
/// `undertow::hooks` targets, so `RUST_LOG=undertow::commit=debug` shows one line
/// per commit.
pub fn install_tracing() {
    TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let console = fmt::layer()
            .event_format(StageFormatter)
            .with_writer(io::stderr)
            .with_ansi(false)
            .with_filter(filter);

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            eprintln!("{LINE_PREFIX} a global tracing subscriber is already installed");
        }
    });
}

/// Reports panics as `undertow::panic` error events before running the previous hook
/// (idempotent).
///
/// A component that panics while rendering unwinds through the scheduler, so this is
/// the only place its message reaches the log.
pub fn install_panic_logger() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_panic(info);
            previous(info);
        }));
    });
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    let location = info
        .location()
        .map(|location| format!("{}:{}", location.file(), location.line()))
        .unwrap_or_default();

    tracing::error!(target: "undertow::panic", %location, "{message}");
}

/// Returns the reconciler stage an event target belongs to.
fn stage(target: &str) -> &str {
    target.strip_prefix(TARGET_ROOT).unwrap_or(target)
}

#[derive(Debug, Clone, Copy, Default)]
struct StageFormatter;

impl<S, N> FormatEvent<S, N> for StageFormatter
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut header = format!("{LINE_PREFIX} {} {}", metadata.level(), stage(metadata.target()));
        if let Some(span) = ctx.lookup_current() {
            write!(header, " ({})", span.name())?;
        }
        write!(writer, "{header}: ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
