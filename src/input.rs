use std::io::{self, ErrorKind, Read};
use std::thread;

use serde_json::json;
use tokio::sync::mpsc;

use crate::constants::{INPUT_BUFFER_LEN, INPUT_CHANNEL_CAPACITY};
use crate::logging;
use crate::types::{Direction, Intent};

const ESC: u8 = 0x1b;

pub fn decode_input(bytes: &[u8]) -> Option<Intent> {
    match bytes {
        [ESC] => Some(Intent::Quit),
        [ESC, b'[', code, ..] => Direction::from_arrow_byte(*code).map(Intent::Move),
        _ => None,
    }
}

/// Single-slot handoff between the reader thread and the tick engine.
pub fn input_channel() -> (mpsc::Sender<Intent>, mpsc::Receiver<Intent>) {
    mpsc::channel(INPUT_CHANNEL_CAPACITY)
}

/// Reads raw terminal bytes on a dedicated thread and publishes decoded intents.
///
/// Publishing blocks while the previous intent is still unconsumed. A failed
/// or exhausted read publishes `Quit` and ends the thread.
pub fn spawn_input_reader<R>(
    reader: R,
    sender: mpsc::Sender<Intent>,
) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("input-reader".to_string())
        .spawn(move || read_intents(reader, sender))
}

fn read_intents<R: Read>(mut reader: R, sender: mpsc::Sender<Intent>) {
    let mut buffer = [0u8; INPUT_BUFFER_LEN];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => {
                logging::warn("input_reader_stopped", json!({ "reason": "end_of_input" }));
                let _ = sender.blocking_send(Intent::Quit);
                return;
            }
            Ok(count) => count,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                logging::error(
                    "input_reader_stopped",
                    json!({ "reason": "read_failed", "error": error.to_string() }),
                );
                let _ = sender.blocking_send(Intent::Quit);
                return;
            }
        };

        let Some(intent) = decode_input(&buffer[..count]) else {
            continue;
        };
        if sender.blocking_send(intent).is_err() {
            return;
        }
    }
}
