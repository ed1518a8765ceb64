#[cfg(unix)]
pub mod uci_process;
