use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use beatvm_time::Clock;

use crate::program::{ITEMS_MASK, ITEMS_MAX};
use crate::stack::{mask_index, Stack};
use crate::{Command, MachineConfig, Num, Opcode, Program, CTRL_MAX};

const CTRL_MASK: usize = CTRL_MAX - 1;

enum Flow {
  Next,
  Jump(usize),
  Halt,
}

/// Stack machine evaluating a program against the inputs and the transport.
///
/// Execution never allocates and never fails. Every run starts from an empty stack,
/// registers are kept between runs, and the number of dispatched commands is bounded
/// by `MachineConfig::max_steps`.
pub struct Machine {
  stack: Stack,
  rng: ChaCha8Rng,
  max_steps: usize,
}

impl Machine {
  pub fn new(config: MachineConfig) -> Self {
    let rng = match config.seed {
      Some(seed) => ChaCha8Rng::seed_from_u64(seed),
      None => ChaCha8Rng::from_entropy(),
    };

    Self {
      stack: Stack::new(),
      rng,
      max_steps: config.max_steps,
    }
  }

  /// Clear the stack and the registers.
  pub fn reset(&mut self) {
    self.stack.clear();
    self.stack.clear_registers();
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  /// Run the program and return the eight topmost values, the top first.
  pub fn execute(
    &mut self,
    program: &Program,
    inputs: &[Num; CTRL_MAX],
    clock: &Clock,
  ) -> [Num; CTRL_MAX] {
    self.stack.clear();

    let mut index = 0;
    for _ in 0..self.max_steps {
      let flow = match program[index] {
        Command::Nop => Flow::Halt,
        Command::Opcode(opcode) => self.step(opcode, inputs, clock),
        literal => {
          self.stack.push(literal.value().unwrap_or_default());
          Flow::Next
        }
      };

      match flow {
        Flow::Next if index + 1 < ITEMS_MAX => index += 1,
        Flow::Jump(target) => index = target,
        Flow::Next | Flow::Halt => break,
      }
    }

    let mut outputs = [0.0; CTRL_MAX];
    for output in outputs.iter_mut() {
      *output = self.stack.pop();
    }
    outputs
  }

  fn step(&mut self, opcode: Opcode, inputs: &[Num; CTRL_MAX], clock: &Clock) -> Flow {
    let stack = &mut self.stack;

    match opcode {
      Opcode::Nop => return Flow::Halt,

      Opcode::Input => {
        let index = stack.pop();
        stack.push(inputs[mask_index(index, CTRL_MASK)]);
      }
      Opcode::Push => {
        let a = stack.peek();
        stack.push(a);
      }
      Opcode::Pop => {
        stack.pop();
      }
      Opcode::Swap => {
        let [b, a] = stack.pop_n();
        stack.push_n([a, b]);
      }
      Opcode::Store => {
        let [value, index] = stack.pop_n();
        stack.store(index, value);
      }
      Opcode::Load => {
        let index = stack.pop();
        let value = stack.load(index);
        stack.push(value);
      }
      Opcode::Break => {
        if truthy(stack.pop()) {
          return Flow::Halt;
        }
      }
      Opcode::Goto => {
        let [target, condition] = stack.pop_n();
        if truthy(condition) {
          return Flow::Jump(mask_index(target, ITEMS_MASK));
        }
      }

      Opcode::Rand => stack.push(self.rng.gen::<Num>()),

      Opcode::Add => binary(stack, |b, a| b + a),
      Opcode::Sub => binary(stack, |b, a| b - a),
      Opcode::Mul => binary(stack, |b, a| b * a),
      Opcode::Div => binary(stack, |b, a| if a == 0.0 { 0.0 } else { b / a }),
      Opcode::Mod => binary(stack, |b, a| if a == 0.0 { 0.0 } else { b % a }),
      Opcode::Pow => binary(stack, Num::powf),

      Opcode::Neg => unary(stack, |a| -a),
      Opcode::Abs => unary(stack, Num::abs),
      Opcode::Sqrt => unary(stack, Num::sqrt),
      Opcode::Cbrt => unary(stack, Num::cbrt),

      Opcode::Floor => unary(stack, Num::floor),
      Opcode::Ceil => unary(stack, Num::ceil),
      Opcode::Round => unary(stack, Num::round),
      Opcode::Rint => unary(stack, libm::rint),
      Opcode::Trunc => unary(stack, Num::trunc),
      Opcode::Modf => {
        let (fractional, integral) = libm::modf(stack.pop());
        stack.push_n([integral, fractional]);
      }

      Opcode::Exp => unary(stack, Num::exp),
      Opcode::Exp2 => unary(stack, Num::exp2),
      Opcode::LdExp => binary(stack, |x, e| libm::ldexp(x, e as i32)),
      Opcode::FrExp => {
        let (mantissa, exponent) = libm::frexp(stack.pop());
        stack.push_n([mantissa, exponent as Num]);
      }
      Opcode::Log => unary(stack, Num::ln),
      Opcode::Log2 => unary(stack, Num::log2),
      Opcode::Log10 => unary(stack, Num::log10),

      Opcode::Pi => stack.push(std::f64::consts::PI),
      Opcode::Sin => unary(stack, Num::sin),
      Opcode::Cos => unary(stack, Num::cos),
      Opcode::Tan => unary(stack, Num::tan),
      Opcode::ASin => unary(stack, Num::asin),
      Opcode::ACos => unary(stack, Num::acos),
      Opcode::ATan => unary(stack, Num::atan),
      Opcode::ATan2 => binary(stack, Num::atan2),
      Opcode::SinH => unary(stack, Num::sinh),
      Opcode::CosH => unary(stack, Num::cosh),
      Opcode::TanH => unary(stack, Num::tanh),
      Opcode::ASinH => unary(stack, Num::asinh),
      Opcode::ACosH => unary(stack, Num::acosh),
      Opcode::ATanH => unary(stack, Num::atanh),

      Opcode::Eq => binary(stack, |b, a| boolean(b == a)),
      Opcode::Lt => binary(stack, |b, a| boolean(b < a)),
      Opcode::Gt => binary(stack, |b, a| boolean(b > a)),
      Opcode::Le => binary(stack, |b, a| boolean(b <= a)),
      Opcode::Ge => binary(stack, |b, a| boolean(b >= a)),
      Opcode::Ternary => {
        let [x, y, condition] = stack.pop_n();
        stack.push(if truthy(condition) { x } else { y });
      }
      Opcode::Min => binary(stack, Num::min),
      Opcode::Max => binary(stack, Num::max),

      Opcode::And => binary(stack, |b, a| boolean(truthy(b) && truthy(a))),
      Opcode::Or => binary(stack, |b, a| boolean(truthy(b) || truthy(a))),
      Opcode::Not => unary(stack, |a| boolean(!truthy(a))),

      Opcode::BAnd => bitwise(stack, |b, a| b & a),
      Opcode::BOr => bitwise(stack, |b, a| b | a),
      Opcode::BNot => unary(stack, |a| !bits(a) as Num),
      Opcode::LShift => bitwise(stack, |b, a| b.checked_shl(a).unwrap_or(0)),
      Opcode::RShift => bitwise(stack, |b, a| b.checked_shr(a).unwrap_or(0)),

      Opcode::BarBeat => stack.push(clock.bar_beat()),
      Opcode::Bar => stack.push(clock.bar() as Num),
      Opcode::Beat => stack.push(clock.beat()),
      Opcode::BeatUnit => stack.push(clock.beat_unit() as Num),
      Opcode::BeatsPerBar => stack.push(clock.beats_per_bar()),
      Opcode::BeatsPerMinute => stack.push(clock.beats_per_minute()),
      Opcode::Frame => stack.push(clock.frame() as Num),
      Opcode::FramesPerSecond => stack.push(clock.frames_per_second()),
      Opcode::Speed => stack.push(clock.speed()),
    }

    Flow::Next
  }
}

impl Default for Machine {
  fn default() -> Self {
    Self::new(MachineConfig::default())
  }
}

#[inline]
fn truthy(value: Num) -> bool {
  value != 0.0
}

#[inline]
fn boolean(value: bool) -> Num {
  if value {
    1.0
  } else {
    0.0
  }
}

/// Truncated to an unsigned integer, zero when out of range.
#[inline]
fn bits(value: Num) -> u32 {
  value.to_u32().unwrap_or(0)
}

#[inline]
fn unary<F: Fn(Num) -> Num>(stack: &mut Stack, f: F) {
  let a = stack.pop();
  stack.push(f(a));
}

#[inline]
fn binary<F: Fn(Num, Num) -> Num>(stack: &mut Stack, f: F) {
  let [b, a] = stack.pop_n();
  stack.push(f(b, a));
}

#[inline]
fn bitwise<F: Fn(u32, u32) -> u32>(stack: &mut Stack, f: F) {
  binary(stack, |b, a| f(bits(b), bits(a)) as Num);
}

#[cfg(test)]
mod tests {
  use assert_approx_eq::assert_approx_eq;
  use beatvm_time::TransportUpdate;

  use super::*;
  use crate::stack::SLOT_MAX;

  const NO_INPUTS: [Num; CTRL_MAX] = [0.0; CTRL_MAX];

  fn machine() -> Machine {
    Machine::new(MachineConfig::default().with_seed(7))
  }

  fn run(source: &str) -> [Num; CTRL_MAX] {
    let program: Program = source.parse().unwrap();
    machine().execute(&program, &NO_INPUTS, &Clock::with_sample_rate(48_000.0))
  }

  #[test]
  fn add() {
    let outputs = run("3.0 4.0 +");
    assert_eq!(outputs[0], 7.0);
    assert_eq!(&outputs[1..], &[0.0; CTRL_MAX - 1]);
  }

  #[test]
  fn division_by_zero() {
    assert_eq!(run("5.0 0.0 /")[0], 0.0);
    assert_eq!(run("5 0 %")[0], 0.0);
  }

  #[test]
  fn operand_order() {
    let test_cases = vec![
      ("10 3 -", 7.0),
      ("12 3 /", 4.0),
      ("7 4 %", 3.0),
      ("2 10 ^", 1024.0),
      ("1 2 <", 1.0),
      ("2 1 <", 0.0),
      ("3 2 >=", 1.0),
      ("3 5 min", 3.0),
      ("3 5 max", 5.0),
      ("3 2 ldexp", 12.0),
      ("1 4 <<", 16.0),
      ("32 2 >>", 8.0),
      ("1 40 <<", 0.0),
      ("6 3 &", 2.0),
      ("6 3 |", 7.0),
      ("-1 5 |", 5.0),
      ("0 ~", u32::MAX as Num),
      ("1 0 &&", 0.0),
      ("1 0 ||", 1.0),
      ("0 !", 1.0),
      ("2.5 neg", -2.5),
      ("2.5 rint", 2.0),
      ("2.5 round", 3.0),
      ("10 20 1 ?", 10.0),
      ("10 20 0 ?", 20.0),
      ("1 2 swap -", 1.0),
      ("3 push *", 9.0),
      ("1 2 pop", 1.0),
    ];

    for (source, expected) in test_cases {
      assert_eq!(run(source)[0], expected, "{}", source);
    }
  }

  #[test]
  fn transcendental() {
    assert_approx_eq!(run("1 0 atan2")[0], std::f64::consts::FRAC_PI_2);
    assert_approx_eq!(run("pi 2 / sin")[0], 1.0);
    assert_approx_eq!(run("27 cbrt")[0], 3.0);
    assert_approx_eq!(run("1 exp log")[0], 1.0);
  }

  #[test]
  fn multiple_results() {
    let outputs = run("2.5 modf");
    assert_eq!(outputs[0], 0.5);
    assert_eq!(outputs[1], 2.0);

    let outputs = run("8 frexp");
    assert_eq!(outputs[0], 4.0);
    assert_eq!(outputs[1], 0.5);
  }

  #[test]
  fn outputs_top_first() {
    let outputs = run("1 2 3 4 5 6 7 8 9");
    assert_eq!(outputs, [9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0]);
  }

  #[test]
  fn break_on_true() {
    assert_eq!(run("1 2 1 break 3")[0], 2.0);
    assert_eq!(run("1 2 0 break 3")[0], 3.0);
  }

  #[test]
  fn terminator_halts() {
    let program = Program::from_commands(vec![
      Command::Int(1),
      Opcode::Nop.into(),
      Command::Int(2),
    ]);
    let outputs = machine().execute(&program, &NO_INPUTS, &Clock::with_sample_rate(48_000.0));
    assert_eq!(outputs[0], 1.0);
  }

  #[test]
  fn goto_loop() {
    let source = "
      0 0 store            # r0 = 0
      0 load 1 + push 0 store
      10 < 3 swap goto     # back to index 3 while r0 < 10
      0 load
    ";
    assert_eq!(run(source)[0], 10.0);
  }

  #[test]
  fn step_budget() {
    let program: Program = "5 1 1 goto".parse().unwrap();
    let mut machine = Machine::new(MachineConfig::default().with_max_steps(10));
    let outputs = machine.execute(&program, &NO_INPUTS, &Clock::with_sample_rate(48_000.0));
    assert_eq!(outputs[0], 5.0);
  }

  #[test]
  fn full_program_ends() {
    let program: Program = std::iter::repeat(Command::Int(1)).take(ITEMS_MAX).collect();
    let outputs = machine().execute(&program, &NO_INPUTS, &Clock::with_sample_rate(48_000.0));
    assert_eq!(outputs, [1.0; CTRL_MAX]);
  }

  #[test]
  fn inputs() {
    let program: Program = "0 input 9 input 2.9 input -1 input".parse().unwrap();
    let inputs = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];
    let outputs = machine().execute(&program, &inputs, &Clock::with_sample_rate(48_000.0));
    assert_eq!(&outputs[..4], &[17.0, 12.0, 11.0, 10.0]);
  }

  #[test]
  fn registers_persist() {
    let clock = Clock::with_sample_rate(48_000.0);
    let mut machine = machine();

    let store: Program = "42 3 store".parse().unwrap();
    let load: Program = "3 load".parse().unwrap();

    machine.execute(&store, &NO_INPUTS, &clock);
    assert_eq!(machine.execute(&load, &NO_INPUTS, &clock)[0], 42.0);
    assert_eq!(machine.stack().registers()[3], 42.0);

    machine.reset();
    assert_eq!(machine.execute(&load, &NO_INPUTS, &clock)[0], 0.0);
  }

  #[test]
  fn transport() {
    let mut clock = Clock::with_sample_rate(48_000.0);
    let program: Program = "time:beatsPerMinute time:framesPerSecond time:beatsPerBar time:beatUnit"
      .parse()
      .unwrap();
    let outputs = machine().execute(&program, &NO_INPUTS, &clock);
    assert_eq!(&outputs[..4], &[4.0, 4.0, 48_000.0, 120.0]);

    let start = TransportUpdate::new().with_speed(1.0);
    clock.advance(Some(&start), 0, 0, |_, _, _| {});
    clock.advance(None, 0, 24_000, |_, _, _| {});

    let program: Program = "time:bar time:barBeat time:beat time:frame time:speed"
      .parse()
      .unwrap();
    let outputs = machine().execute(&program, &NO_INPUTS, &clock);
    assert_eq!(outputs[0], 1.0);
    assert_eq!(outputs[1], 24_000.0);
    assert_approx_eq!(outputs[2], 1.0);
    assert_approx_eq!(outputs[3], 1.0);
    assert_eq!(outputs[4], 0.0);
  }

  #[test]
  fn seeded_rand() {
    let program: Program = "rand rand rand".parse().unwrap();
    let clock = Clock::with_sample_rate(48_000.0);

    let outputs = machine().execute(&program, &NO_INPUTS, &clock);
    for value in &outputs[..3] {
      assert!((0.0..1.0).contains(value), "{}", value);
    }
    assert_ne!(outputs[0], outputs[1]);
    assert_eq!(machine().execute(&program, &NO_INPUTS, &clock), outputs);
  }

  #[test]
  fn arities_match_definitions() {
    let clock = Clock::with_sample_rate(48_000.0);
    let mut machine = machine();

    for opcode in Opcode::ALL.iter().copied().filter(|op| *op != Opcode::Nop) {
      let def = opcode.def();
      let commands = vec![Command::Int(0); 3]
        .into_iter()
        .chain(std::iter::once(opcode.into()));
      let program = Program::from_commands(commands);

      machine.execute(&program, &NO_INPUTS, &clock);

      let depth = 3 + def.pushes as usize - def.pops as usize;
      let expected = (SLOT_MAX - depth + CTRL_MAX) % SLOT_MAX;
      assert_eq!(machine.stack().head(), expected, "{:?}", opcode);
    }
  }
}
