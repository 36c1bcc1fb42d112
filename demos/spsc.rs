use std::thread;
use weft::{unbounded, RecvError};

fn main() {
  let (mut tx, mut rx) = unbounded::<String>();

  let sender_handle = thread::spawn(move || {
    for batch in 0..3 {
      for i in 0..4 {
        let msg = format!("batch-{batch}-item-{i}");
        println!("[Send Thread] Buffering: {msg}");
        if tx.send(msg).is_err() {
          println!("[Send Thread] Receiver dropped.");
          return;
        }
      }
      // Items above are invisible to the receiver until this point.
      println!("[Send Thread] Flushing batch {batch}");
      let _ = tx.flush();
      thread::yield_now();
    }
    println!("[Send Thread] Done sending.");
  });

  let receiver_handle = thread::spawn(move || loop {
    match rx.recv() {
      Ok(value) => println!("[Recv Thread] Received: {value}"),
      Err(RecvError::Disconnected) => {
        println!("[Recv Thread] Sender dropped, draining complete.");
        break;
      }
    }
  });

  sender_handle.join().unwrap();
  receiver_handle.join().unwrap();
}
