pub mod looper;
pub mod worker;

pub use looper::{Job, Looper, UiExecutor};
pub use worker::SerialWorker;

use std::any::Any;

/// Text carried by a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_panic_message() {
        let literal = panic::catch_unwind(|| panic!("plain")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "plain");

        let formatted = panic::catch_unwind(|| panic!("item {}", 7)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "item 7");
    }
}
