use std::sync::atomic::{AtomicBool, Ordering};

static SIGINT: AtomicBool = AtomicBool::new(false);

/// Whether Ctrl-C was pressed since [`initialize`]. Exact searches poll this and stop early.
pub fn received_ctrl_c() -> bool {
    SIGINT.load(Ordering::SeqCst)
}

pub fn initialize() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        SIGINT.store(true, Ordering::SeqCst);
    })
}
