//! Tracing output routed to the browser console.
//!
//! Events are formatted by `tracing-subscriber`'s fmt layer without
//! timestamps (there is no system clock on `wasm32-unknown-unknown`) and
//! written with the console method matching their level.

use std::io;
use std::sync::OnceLock;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};
use wasm_bindgen::prelude::*;
use web_sys::console;

pub(crate) const DEFAULT_DIRECTIVE: &str = "info";

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the console subscriber, or swap its filter if already installed.
///
/// `directive` uses `EnvFilter` syntax, e.g. `"debug"` or
/// `"warn,storykit_core=debug"`. An unparsable directive falls back to
/// `"info"`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(directive: &str) {
    let filter = parse_filter(directive);

    if let Some(handle) = FILTER.get() {
        handle.reload(filter).ok();
        return;
    }

    let (filter, handle) = reload::Layer::new(filter);
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(ConsoleMakeWriter)
            .with_ansi(false)
            .without_time()
            .with_target(true),
    );
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        FILTER.set(handle).ok();
    }
}

fn parse_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[derive(Debug, Clone, Copy, Default)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and emits it on drop.
struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buffer);
        let line = text.trim_end();
        if line.is_empty() {
            return;
        }
        let message = JsValue::from_str(line);
        match self.level {
            Level::ERROR => console::error_1(&message),
            Level::WARN => console::warn_1(&message),
            Level::INFO => console::info_1(&message),
            _ => console::debug_1(&message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_valid_directive_kept() {
        let filter = parse_filter("warn,storykit_core=debug");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_bad_directive_falls_back() {
        let filter = parse_filter("storykit_core=loud");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_empty_writer_is_silent() {
        // Dropping without output must not touch the console.
        drop(ConsoleWriter::new(Level::INFO));
    }
}
