use ringbuf::{Consumer, Producer};

use beatvm_machine::{Machine, Num, Program, CTRL_MAX};
use beatvm_time::{Clock, TransportUpdate};

use crate::{EngineConfig, EventsBuffer, Notification, PortClass};

/// Buffers of one processing block.
///
/// Transport events are expected in increasing frame order, see `EventsBuffer::sort`.
pub struct ProcessContext<'a> {
  num_samples: usize,
  events: &'a EventsBuffer,
  inputs: [&'a [f32]; CTRL_MAX],
  outputs: [&'a mut [f32]; CTRL_MAX],
}

impl<'a> ProcessContext<'a> {
  pub fn new(
    num_samples: usize,
    events: &'a EventsBuffer,
    inputs: [&'a [f32]; CTRL_MAX],
    outputs: [&'a mut [f32]; CTRL_MAX],
  ) -> Self {
    Self {
      num_samples,
      events,
      inputs,
      outputs,
    }
  }

  pub fn num_samples(&self) -> usize {
    self.num_samples
  }

  pub fn events(&self) -> &'a EventsBuffer {
    self.events
  }

  pub fn input(&self, index: usize) -> &'a [f32] {
    self.inputs[index]
  }

  pub fn output(&mut self, index: usize) -> &mut [f32] {
    &mut *self.outputs[index]
  }
}

/// Realtime side of the engine.
///
/// Drives the clock through the transport events of every block and evaluates the program,
/// once per block for control ports or once per sample otherwise. The program is only
/// evaluated when its inputs changed, when a new program arrived, or when it depends on
/// the transport or on random numbers.
pub struct Processor {
  tx: Producer<Notification>,
  rx: Consumer<Program>,

  port_class: PortClass,
  clock: Clock,
  machine: Machine,
  program: Program,

  needs_execute: bool,
  inputs: [Num; CTRL_MAX],
  outputs: [Num; CTRL_MAX],
  reported: [f32; CTRL_MAX],
}

impl Processor {
  pub fn new(tx: Producer<Notification>, rx: Consumer<Program>, config: EngineConfig) -> Self {
    Self {
      tx,
      rx,
      port_class: config.port_class,
      clock: Clock::new(config.clock),
      machine: Machine::new(config.machine),
      program: Program::new(),
      needs_execute: true,
      inputs: [0.0; CTRL_MAX],
      outputs: [0.0; CTRL_MAX],
      reported: [0.0; CTRL_MAX],
    }
  }

  pub fn port_class(&self) -> PortClass {
    self.port_class
  }

  pub fn clock(&self) -> &Clock {
    &self.clock
  }

  pub fn program(&self) -> &Program {
    &self.program
  }

  /// Outputs of the last evaluation, before clipping.
  pub fn outputs(&self) -> &[Num; CTRL_MAX] {
    &self.outputs
  }

  pub fn process(&mut self, context: &mut ProcessContext) {
    self.receive_program();

    if self.port_class.is_per_sample() {
      self.process_samples(context);
    } else {
      self.process_block(context);
    }

    self.notify_outputs();
  }

  fn receive_program(&mut self) {
    let mut received = None;
    while let Some(program) = self.rx.pop() {
      received = Some(program);
    }

    if let Some(program) = received {
      self.program = program;
      self.needs_execute = true;
    }
  }

  fn process_block(&mut self, context: &mut ProcessContext) {
    let num_samples = context.num_samples as u32;

    let mut last = 0;
    for event in context.events.iter() {
      let frames = event.frames.clamp(last, num_samples);
      self.advance(Some(&event.update), last, frames);
      last = frames;
    }
    self.advance(None, last, num_samples);

    let inputs = self.read_inputs(context, 0);
    self.execute(inputs);

    for (port, value) in context.outputs.iter_mut().zip(self.outputs) {
      port.fill(self.port_class.clip(value as f32));
    }
  }

  fn process_samples(&mut self, context: &mut ProcessContext) {
    let num_samples = context.num_samples;
    let events = context.events;
    let mut events = events.iter().peekable();

    for sample in 0..num_samples {
      let frames = sample as u32;
      while let Some(event) = events.next_if(|event| event.frames <= frames) {
        self.advance(Some(&event.update), frames, frames);
      }

      self.advance(None, frames, frames + 1);

      let inputs = self.read_inputs(context, sample);
      self.execute(inputs);

      for (port, value) in context.outputs.iter_mut().zip(self.outputs) {
        if let Some(output) = port.get_mut(sample) {
          *output = self.port_class.clip(value as f32);
        }
      }
    }

    let frames = num_samples as u32;
    for event in events {
      self.advance(Some(&event.update), frames, frames);
    }
  }

  fn read_inputs(&self, context: &ProcessContext, sample: usize) -> [Num; CTRL_MAX] {
    let mut inputs = [0.0; CTRL_MAX];
    for (input, port) in inputs.iter_mut().zip(context.inputs.iter()) {
      let value = port.get(sample).copied().unwrap_or_default();
      *input = self.port_class.clip(value) as Num;
    }
    inputs
  }

  fn advance(&mut self, update: Option<&TransportUpdate>, from: u32, to: u32) {
    let tx = &mut self.tx;
    self.clock.advance(update, from, to, |frames, field, position| {
      tx.push(Notification::Transport {
        frames,
        field,
        position: *position,
      })
      .ok();
    });
  }

  fn execute(&mut self, inputs: [Num; CTRL_MAX]) {
    if self.needs_execute || inputs != self.inputs || self.program.status().is_dynamic() {
      self.inputs = inputs;
      self.outputs = self.machine.execute(&self.program, &inputs, &self.clock);
      self.needs_execute = false;
    }
  }

  fn notify_outputs(&mut self) {
    for (index, value) in self.outputs.iter().enumerate() {
      let value = self.port_class.clip(*value as f32);
      // bit comparison so an unchanged NaN is not reported again
      if self.reported[index].to_bits() != value.to_bits() {
        self.reported[index] = value;
        self.tx.push(Notification::Output { index, value }).ok();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use beatvm_machine::MachineConfig;
  use beatvm_time::{ClockConfig, TransportField};
  use ringbuf::RingBuffer;

  use super::*;
  use crate::TransportEvent;

  struct Fixture {
    programs: Producer<Program>,
    notifications: Consumer<Notification>,
    processor: Processor,
  }

  impl Fixture {
    fn new(port_class: PortClass) -> Self {
      let config = EngineConfig::default()
        .with_clock(ClockConfig::new(48_000.0).with_initial_notifications(false))
        .with_machine(MachineConfig::default().with_seed(1))
        .with_port_class(port_class);
      let (programs, program_rx) = RingBuffer::new(4).split();
      let (notification_tx, notifications) = RingBuffer::new(1024).split();
      Self {
        programs,
        notifications,
        processor: Processor::new(notification_tx, program_rx, config),
      }
    }

    fn load(&mut self, source: &str) {
      assert!(self.programs.push(source.parse().unwrap()).is_ok());
    }

    fn process(
      &mut self,
      num_samples: usize,
      inputs: [f32; CTRL_MAX],
      events: &EventsBuffer,
    ) -> Vec<Vec<f32>> {
      let input_buffers: Vec<Vec<f32>> = inputs
        .iter()
        .map(|value| vec![*value; num_samples])
        .collect();
      let mut output_buffers = vec![vec![0.0f32; num_samples]; CTRL_MAX];

      let inputs: [&[f32]; CTRL_MAX] = input_buffers
        .iter()
        .map(Vec::as_slice)
        .collect::<Vec<_>>()
        .try_into()
        .unwrap();
      let outputs: [&mut [f32]; CTRL_MAX] = output_buffers
        .iter_mut()
        .map(Vec::as_mut_slice)
        .collect::<Vec<_>>()
        .try_into()
        .unwrap();

      let mut context = ProcessContext::new(num_samples, events, inputs, outputs);
      self.processor.process(&mut context);
      output_buffers
    }

    fn notifications(&mut self) -> Vec<Notification> {
      std::iter::from_fn(|| self.notifications.pop()).collect()
    }
  }

  const INPUTS: [f32; CTRL_MAX] = [0.25, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

  #[test]
  fn control_block() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("0 input 2 *");

    let outputs = fixture.process(16, INPUTS, &EventsBuffer::new());
    assert_eq!(outputs[0], vec![0.5; 16]);
    assert_eq!(outputs[1], vec![0.0; 16]);
    assert_eq!(
      fixture.notifications(),
      vec![Notification::Output {
        index: 0,
        value: 0.5
      }]
    );

    fixture.process(16, INPUTS, &EventsBuffer::new());
    assert!(fixture.notifications().is_empty());
  }

  #[test]
  fn clipping() {
    let test_cases = vec![
      (PortClass::Control, [0.5, 3.0], [1.0, 4.0]),
      (PortClass::Cv, [0.5, 3.0], [1.0, 4.0]),
      (PortClass::Audio, [0.5, 3.0], [2.0, 12.0]),
    ];

    for (class, [first, second], expected) in test_cases {
      let mut fixture = Fixture::new(class);
      fixture.load("0 input 4 * 1 input 4 * swap");

      let mut inputs = [0.0; CTRL_MAX];
      inputs[0] = first;
      inputs[1] = second;

      let outputs = fixture.process(2, inputs, &EventsBuffer::new());
      assert_eq!(outputs[0], vec![expected[0]; 2], "{:?}", class);
      assert_eq!(fixture.processor.outputs()[1], expected[1] as Num, "{:?}", class);
    }
  }

  #[test]
  fn nan_output_reported_once() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("-1 sqrt");

    let outputs = fixture.process(16, INPUTS, &EventsBuffer::new());
    assert!(outputs[0].iter().all(|value| value.is_nan()));

    let notifications = fixture.notifications();
    assert_eq!(notifications.len(), 1);
    assert!(matches!(
      notifications[0],
      Notification::Output { index: 0, value } if value.is_nan()
    ));

    for _ in 0..3 {
      fixture.process(16, INPUTS, &EventsBuffer::new());
      assert!(fixture.notifications().is_empty());
    }
  }

  #[test]
  fn static_programs_run_on_changes() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("0 load 1 + push 0 store 0.01 *");

    let count = |fixture: &Fixture| (fixture.processor.outputs()[0] * 100.0).round();

    fixture.process(4, INPUTS, &EventsBuffer::new());
    assert_eq!(count(&fixture), 1.0);

    fixture.process(4, INPUTS, &EventsBuffer::new());
    assert_eq!(count(&fixture), 1.0);

    let mut inputs = INPUTS;
    inputs[3] = 0.5;
    fixture.process(4, inputs, &EventsBuffer::new());
    assert_eq!(count(&fixture), 2.0);

    fixture.load("0 load 0.01 *");
    fixture.process(4, inputs, &EventsBuffer::new());
    assert_eq!(count(&fixture), 2.0);
  }

  #[test]
  fn dynamic_programs_run_every_block() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("rand");

    fixture.process(4, INPUTS, &EventsBuffer::new());
    let first = fixture.processor.outputs()[0];
    fixture.process(4, INPUTS, &EventsBuffer::new());
    assert_ne!(fixture.processor.outputs()[0], first);
  }

  #[test]
  fn newest_program_wins() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("0.1");
    fixture.load("0.2");
    fixture.process(1, INPUTS, &EventsBuffer::new());
    assert_eq!(fixture.processor.program().to_string(), "0.2");
    assert_eq!(fixture.processor.outputs()[0], 0.2f32 as Num);
  }

  #[test]
  fn transport_events_in_block() {
    let mut fixture = Fixture::new(PortClass::Control);
    fixture.load("time:beat");

    let mut events = EventsBuffer::new();
    let start = TransportUpdate::new().with_speed(1.0);
    assert!(events.push(TransportEvent::new(0, start)).is_ok());

    fixture.process(24_000, INPUTS, &events);
    assert_eq!(fixture.processor.clock().frame(), 24_000);
    assert_eq!(fixture.processor.outputs()[0], 1.0);

    let bar_beats: Vec<u32> = fixture
      .notifications()
      .into_iter()
      .filter_map(|notification| match notification {
        Notification::Transport {
          frames,
          field: TransportField::BarBeat,
          ..
        } => Some(frames),
        _ => None,
      })
      .collect();
    assert_eq!(bar_beats, vec![0, 23_999]);
  }

  #[test]
  fn per_sample_transport() {
    let mut fixture = Fixture::new(PortClass::Audio);
    fixture.load("time:frame");

    let mut events = EventsBuffer::new();
    let start = TransportUpdate::new().with_speed(1.0);
    assert!(events.push(TransportEvent::new(2, start)).is_ok());

    let outputs = fixture.process(4, INPUTS, &events);
    assert_eq!(outputs[0], vec![0.0, 0.0, 1.0, 2.0]);

    let outputs = fixture.process(2, INPUTS, &EventsBuffer::new());
    assert_eq!(outputs[0], vec![3.0, 4.0]);
  }

  #[test]
  fn late_events_apply_at_block_end() {
    let mut fixture = Fixture::new(PortClass::Cv);
    fixture.load("time:beatsPerMinute 0.001 *");

    let mut events = EventsBuffer::new();
    let tempo = TransportUpdate::new().with_beats_per_minute(140.0);
    assert!(events.push(TransportEvent::new(100, tempo)).is_ok());

    let outputs = fixture.process(4, INPUTS, &events);
    assert_eq!(outputs[0][3], (120.0 * 0.001f32 as Num) as f32);
    assert_eq!(fixture.processor.clock().beats_per_minute(), 140.0);
  }
}
