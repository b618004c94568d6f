use anyhow::anyhow;

use beatvm_engine::machine::CTRL_MAX;
use beatvm_engine::time::{ClockConfig, TransportUpdate};
use beatvm_engine::{Engine, EngineConfig, EventsBuffer, Notification, ProcessContext, TransportEvent};

const SAMPLE_RATE: f64 = 48_000.0;
const BLOCK_SIZE: usize = 12_000;
const NUM_BLOCKS: usize = 8;

/// Counts sixteenth notes and reports the beat within the bar
const DEFAULT_SOURCE: &str = "time:beat 4 * floor 0.1 * time:barBeat";

fn main() -> anyhow::Result<()> {
  let args: Vec<String> = std::env::args().skip(1).collect();
  let source = if args.is_empty() {
    DEFAULT_SOURCE.to_string()
  } else {
    args.join(" ")
  };

  let config = EngineConfig::default().with_clock(ClockConfig::new(SAMPLE_RATE));
  let (mut controller, mut processor) = Engine::with_config(config).split();
  controller.load_source(&source)?;
  println!("program: {}", controller.program());
  println!("bytes: {:02x?}", controller.save());

  let inputs = vec![vec![0.0f32; BLOCK_SIZE]; CTRL_MAX];
  let mut outputs = vec![vec![0.0f32; BLOCK_SIZE]; CTRL_MAX];
  let mut events = EventsBuffer::new();

  for block in 0..NUM_BLOCKS {
    events.clear();
    if block == 0 {
      let start = TransportUpdate::new().with_speed(1.0);
      events
        .push(TransportEvent::new(0, start))
        .map_err(|_| anyhow!("Events buffer is full"))?;
    }

    let input_ports: [&[f32]; CTRL_MAX] = inputs
      .iter()
      .map(Vec::as_slice)
      .collect::<Vec<_>>()
      .try_into()
      .map_err(|_| anyhow!("Unexpected number of inputs"))?;
    let output_ports: [&mut [f32]; CTRL_MAX] = outputs
      .iter_mut()
      .map(Vec::as_mut_slice)
      .collect::<Vec<_>>()
      .try_into()
      .map_err(|_| anyhow!("Unexpected number of outputs"))?;

    let mut context = ProcessContext::new(BLOCK_SIZE, &events, input_ports, output_ports);
    processor.process(&mut context);

    for notification in controller.notifications() {
      match notification {
        Notification::Transport {
          frames,
          field,
          position,
        } => println!(
          "[{}:{:>5}] {:?} = {}",
          block,
          frames,
          field,
          position.value(field)
        ),
        Notification::Output { index, value } => {
          println!("[{}:{:>5}] output {} = {}", block, BLOCK_SIZE - 1, index, value)
        }
      }
    }
  }

  Ok(())
}
