//! 跨平台日志初始化
//!
//! - wasm32：每条事件写入一次浏览器 `console.log`（不带时间戳与 ANSI 颜色，
//!   `wasm32-unknown-unknown` 上没有系统时钟）。
//! - 其他平台：写入 stderr，可通过 `RUST_LOG` 覆盖过滤规则。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则
pub const DEFAULT_FILTER: &str = "info";

/// 安装全局 tracing subscriber
///
/// 重复调用是安全的：已存在 subscriber 时直接忽略。
pub fn init(default_filter: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(default_filter))
            .with_writer(console::ConsoleWriter::default)
            .without_time()
            .with_ansi(false)
            .try_init();
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;

    /// 缓冲一条格式化后的日志，drop 时输出到浏览器控制台
    #[derive(Default)]
    pub struct ConsoleWriter {
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            if self.buf.is_empty() {
                return;
            }
            let line = String::from_utf8_lossy(&self.buf);
            web_sys::console::log_1(&line.trim_end().into());
        }
    }
}
