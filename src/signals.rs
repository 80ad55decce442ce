use sd_notify::NotifyState;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tokio::sync::oneshot;

/// Tell systemd, when running under it, that we are watching events.
pub fn notify_ready() {
    let _ = sd_notify::notify(false, &[NotifyState::Ready]);
}

/// What should we do when the user stops this program?
///
/// The first SIGINT/SIGTERM reports that we are stopping and resolves the
/// returned receiver with the signal number, so pending alerts can be
/// flushed. A second signal exits right away.
pub fn handle_shutdown() -> std::io::Result<oneshot::Receiver<i32>> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        let mut received = signals.forever();
        if let Some(signal) = received.next() {
            log::info!("Received signal {signal}, shutting down");
            let _ = sd_notify::notify(false, &[NotifyState::Stopping]);
            if tx.send(signal).is_err() {
                std::process::exit(0);
            }
        }
        if let Some(signal) = received.next() {
            log::warn!("Received signal {signal} again, exiting now");
            std::process::exit(1);
        }
    });

    Ok(rx)
}
