use std::fmt::{Display, Formatter};

/// Static description of an opcode, for introspection and the assembler.
///
/// Execution never looks at this table, see `Machine::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDef {
  pub label: &'static str,
  pub mnemonic: &'static str,
  /// Keyboard shortcut used by editors
  pub key: Option<char>,
  pub pops: u8,
  pub pushes: u8,
}

macro_rules! opcodes {
  ($($variant:ident = $code:literal => ($label:literal, $mnemonic:literal, $key:expr, $pops:literal, $pushes:literal),)*) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[repr(u8)]
    pub enum Opcode {
      $($variant = $code,)*
    }

    impl Opcode {
      pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

      pub fn def(&self) -> &'static OpcodeDef {
        match self {
          $(Opcode::$variant => &OpcodeDef {
            label: $label,
            mnemonic: $mnemonic,
            key: $key,
            pops: $pops,
            pushes: $pushes,
          },)*
        }
      }
    }
  };
}

opcodes! {
  Nop = 0 => ("", "nop", None, 0, 0),

  Input = 1 => ("Input", "input", None, 1, 1),
  Push = 2 => ("Push topmost value", "push", None, 1, 2),
  Pop = 3 => ("Pop topmost value", "pop", None, 1, 0),
  Swap = 4 => ("Swap 2 topmost values", "swap", None, 2, 2),
  Store = 5 => ("Store in register", "store", Some('['), 2, 0),
  Load = 6 => ("Load from register", "load", Some(']'), 1, 1),
  Break = 7 => ("Break program execution if top of stack is true", "break", None, 1, 0),
  Goto = 8 => ("Goto given operation", "goto", None, 2, 0),

  Rand = 9 => ("Generate random number", "rand", Some('r'), 0, 1),

  Add = 10 => ("Add", "+", Some('+'), 2, 1),
  Sub = 11 => ("Subtract", "-", Some('-'), 2, 1),
  Mul = 12 => ("Multiply", "*", Some('*'), 2, 1),
  Div = 13 => ("Divide", "/", Some('/'), 2, 1),
  Mod = 14 => ("Modulo", "%", Some('%'), 2, 1),
  Pow = 15 => ("Power", "^", Some('^'), 2, 1),

  Neg = 16 => ("Negate", "neg", Some('n'), 1, 1),
  Abs = 17 => ("Absolute", "abs", Some('a'), 1, 1),
  Sqrt = 18 => ("Square root", "sqrt", None, 1, 1),
  Cbrt = 19 => ("Cubic root", "cbrt", None, 1, 1),

  Floor = 20 => ("Floor", "floor", None, 1, 1),
  Ceil = 21 => ("Ceiling", "ceil", None, 1, 1),
  Round = 22 => ("Round", "round", None, 1, 1),
  Rint = 23 => ("Round to nearest even", "rint", None, 1, 1),
  Trunc = 24 => ("Truncate", "trunc", None, 1, 1),
  Modf = 25 => ("Break number into integral and fractional parts", "modf", None, 1, 2),

  Exp = 26 => ("Exponential", "exp", Some('e'), 1, 1),
  Exp2 = 27 => ("Exponential base 2", "exp2", None, 1, 1),
  LdExp = 28 => ("Multiply number by 2 raised to a power", "ldexp", None, 2, 1),
  FrExp = 29 => ("Break number into significand and power of 2", "frexp", None, 1, 2),
  Log = 30 => ("Logarithm", "log", Some('l'), 1, 1),
  Log2 = 31 => ("Logarithm base 2", "log2", None, 1, 1),
  Log10 = 32 => ("Logarithm base 10", "log10", None, 1, 1),

  Pi = 33 => ("Pi", "pi", Some('p'), 0, 1),
  Sin = 34 => ("Sine", "sin", Some('s'), 1, 1),
  Cos = 35 => ("Cosine", "cos", Some('c'), 1, 1),
  Tan = 36 => ("Tangent", "tan", Some('t'), 1, 1),
  ASin = 37 => ("Arc sine", "asin", None, 1, 1),
  ACos = 38 => ("Arc cosine", "acos", None, 1, 1),
  ATan = 39 => ("Arc tangent", "atan", None, 1, 1),
  ATan2 = 40 => ("Arc tangent using quadrants", "atan2", None, 2, 1),
  SinH = 41 => ("Hyperbolic sine", "sinh", None, 1, 1),
  CosH = 42 => ("Hyperbolic cosine", "cosh", None, 1, 1),
  TanH = 43 => ("Hyperbolic tangent", "tanh", None, 1, 1),
  ASinH = 44 => ("Inverse hyperbolic sine", "asinh", None, 1, 1),
  ACosH = 45 => ("Inverse hyperbolic cosine", "acosh", None, 1, 1),
  ATanH = 46 => ("Inverse hyperbolic tangent", "atanh", None, 1, 1),

  Eq = 47 => ("Equal", "==", Some('='), 2, 1),
  Lt = 48 => ("Less than", "<", Some('<'), 2, 1),
  Gt = 49 => ("Greater than", ">", Some('>'), 2, 1),
  Le = 50 => ("Less or equal", "<=", None, 2, 1),
  Ge = 51 => ("Greater or equal", ">=", None, 2, 1),
  Ternary = 52 => ("Ternary operator", "?", Some('?'), 3, 1),
  Min = 53 => ("Minimum", "min", Some('{'), 2, 1),
  Max = 54 => ("Maximum", "max", Some('}'), 2, 1),

  And = 55 => ("And", "&&", None, 2, 1),
  Or = 56 => ("Or", "||", None, 2, 1),
  Not = 57 => ("Not", "!", Some('!'), 1, 1),

  BAnd = 58 => ("Bitwise and", "&", Some('&'), 2, 1),
  BOr = 59 => ("Bitwise or", "|", Some('|'), 2, 1),
  BNot = 60 => ("Bitwise not", "~", Some('~'), 1, 1),
  LShift = 61 => ("Left shift", "<<", None, 2, 1),
  RShift = 62 => ("Right shift", ">>", None, 2, 1),

  BarBeat = 63 => ("time:barBeat", "time:barBeat", None, 0, 1),
  Bar = 64 => ("time:bar", "time:bar", None, 0, 1),
  Beat = 65 => ("time:beat", "time:beat", None, 0, 1),
  BeatUnit = 66 => ("time:beatUnit", "time:beatUnit", None, 0, 1),
  BeatsPerBar = 67 => ("time:beatsPerBar", "time:beatsPerBar", None, 0, 1),
  BeatsPerMinute = 68 => ("time:beatsPerMinute", "time:beatsPerMinute", None, 0, 1),
  Frame = 69 => ("time:frame", "time:frame", None, 0, 1),
  FramesPerSecond = 70 => ("time:framesPerSecond", "time:framesPerSecond", None, 0, 1),
  Speed = 71 => ("time:speed", "time:speed", None, 0, 1),
}

impl Opcode {
  pub fn code(&self) -> u8 {
    *self as u8
  }

  pub fn from_code(code: u8) -> Option<Opcode> {
    Self::ALL.get(code as usize).copied()
  }

  pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
    Self::ALL
      .iter()
      .copied()
      .find(|opcode| opcode.def().mnemonic == mnemonic)
  }

  pub fn from_key(key: char) -> Option<Opcode> {
    Self::ALL
      .iter()
      .copied()
      .find(|opcode| opcode.def().key == Some(key))
  }

  pub fn mnemonic(&self) -> &'static str {
    self.def().mnemonic
  }

  /// Reads the transport position and changes while it rolls.
  /// The sample rate is constant and does not count.
  pub fn is_transport(&self) -> bool {
    matches!(
      self,
      Opcode::BarBeat
        | Opcode::Bar
        | Opcode::Beat
        | Opcode::BeatUnit
        | Opcode::BeatsPerBar
        | Opcode::BeatsPerMinute
        | Opcode::Frame
        | Opcode::Speed
    )
  }
}

impl Display for Opcode {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.mnemonic())
  }
}
