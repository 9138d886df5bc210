//! WebSocket close codes.
//!
//! Only [`NORMAL`] marks an intentional shutdown. Every other code, including
//! the synthetic [`ABNORMAL`] reported when the stream drops without a close
//! frame, is retriable.

/// Normal closure, sent by the client when the widget closes.
pub const NORMAL: u16 = 1000;

/// Close frame carried no status code.
pub const NO_STATUS: u16 = 1005;

/// Connection dropped without a close frame.
pub const ABNORMAL: u16 = 1006;

/// Whether a close with `code` was a clean, intentional shutdown.
pub fn is_clean_shutdown(code: u16) -> bool {
    code == NORMAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_normal_is_clean() {
        assert!(is_clean_shutdown(NORMAL));
        for code in [1001, 1002, NO_STATUS, ABNORMAL, 1011, 4000] {
            assert!(!is_clean_shutdown(code), "{code}");
        }
    }
}
