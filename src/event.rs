use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Browse-mode events
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
  /// A line typed by the user
  Line(String),
  /// Periodic tick for query polling
  Tick,
  /// Input closed
  Eof,
}

/// Event handler that produces events from line input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Read lines from stdin, ticking every `tick_rate`
  pub fn new(tick_rate: Duration) -> Self {
    Self::from_reader(BufReader::new(tokio::io::stdin()), tick_rate)
  }

  pub fn from_reader<R>(reader: R, tick_rate: Duration) -> Self
  where
    R: AsyncBufRead + Unpin + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn line reader
    let input_tx = tx.clone();
    tokio::spawn(async move {
      let mut lines = reader.lines();
      loop {
        match lines.next_line().await {
          Ok(Some(line)) => {
            if input_tx.send(Event::Line(line)).is_err() {
              break;
            }
          }
          Ok(None) | Err(_) => {
            let _ = input_tx.send(Event::Eof);
            break;
          }
        }
      }
    });

    // Spawn ticker
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(tick_rate);
      interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
      interval.tick().await;
      loop {
        interval.tick().await;
        if tx.send(Event::Tick).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
