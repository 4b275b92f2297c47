use std::any::Any;
use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

// Dropping the guard would stop the background writer, so it lives for the
// whole process.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn is_truthy(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

fn env_flag(key: &str) -> bool {
    is_truthy(std::env::var(key).ok().as_deref())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Route panics through `tracing` so they reach the same sink as other logs.
/// `MM_LOG_INCLUDE_BACKTRACE=1` also runs the default hook. Installed once.
pub fn install_tracing_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();
        let chain_default = env_flag("MM_LOG_INCLUDE_BACKTRACE");

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".into());
            let message = panic_message(info.payload());
            let thread = std::thread::current();

            tracing::error!(
                application = app_name,
                thread = thread.name().unwrap_or("unnamed"),
                %location,
                panic_message = %message,
                "panic"
            );

            if chain_default {
                default_hook(info);
            }
        }));
    });
}

/// Daily-rotated `<MM_LOG_DIR>/<app>.log`, or `None` to log to stdout.
fn log_file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = PathBuf::from(std::env::var_os("MM_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("cannot create MM_LOG_DIR {}: {err}; logging to stdout", dir.display());
        return None;
    }

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, format!("{app_name}.log")));
    FILE_WRITER_GUARD.set(guard).ok()?;

    Some(BoxMakeWriter::new(writer))
}

/// Set up the global subscriber for a binary.
///
/// `RUST_LOG` filters (default `info`), `MM_LOG_JSON=1` switches to one JSON
/// object per line and `MM_LOG_DIR` redirects output to rotating files.
/// Calling it again is a no-op.
pub fn init_tracing_subscriber(app_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env_flag("MM_LOG_JSON");
    let writer = log_file_writer(app_name)
        .unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_ok() {
        install_tracing_panic_hook(app_name);
    }
}
