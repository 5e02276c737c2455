use super::*;

    /// Buffers one formatted event and hands it to the browser console when
    /// dropped, so each event becomes a single console line.
    pub(super) struct ConsoleWriter {
        level: ConsoleLevel,
        buffer: Vec<u8>,
    }

    impl std::io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let line = String::from_utf8_lossy(&self.buffer);
            let line = line.trim_end();
            if line.is_empty() {
                return;
            }
            let value = JsValue::from_str(line);
            match self.level {
                ConsoleLevel::Error => web_sys::console::error_1(&value),
                ConsoleLevel::Warn => web_sys::console::warn_1(&value),
                ConsoleLevel::Log => web_sys::console::log_1(&value),
            }
        }
    }

    pub(super) struct ConsoleMakeWriter;

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::Log,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::for_level(meta.level()),
                buffer: Vec::new(),
            }
        }
    }

    pub(super) fn install_console_logging() {
        let directive =
            runtime_env_value(LOG_LEVEL_KEY).unwrap_or_else(|| DEFAULT_LOG_DIRECTIVE.to_string());
        let filter = tracing_subscriber::EnvFilter::try_new(&directive)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVE));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(ConsoleMakeWriter)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .try_init();
        if installed.is_err() {
            web_sys::console::warn_1(&JsValue::from_str("tracing subscriber already installed"));
        }
    }
