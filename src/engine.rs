use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::io::{ByteInput, ByteOutput};
use crate::memory::{DEFAULT_MEMORY_SIZE, Direction, Memory};
use crate::symbol::Symbol;
use crate::tape::Tape;

/// How the instruction count of a run is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    #[default]
    Unbounded,
    /// Report the count modulo 256, for compatibility with 8-bit counters.
    Wrapping8,
}

impl CountMode {
    fn report(self, count: u64) -> u64 {
        match self {
            CountMode::Unbounded => count,
            CountMode::Wrapping8 => count % 256,
        }
    }
}

/// Construction-time parameters of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of memory cells.
    pub memory_size: usize,
    pub count_mode: CountMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            count_mode: CountMode::Unbounded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Ready,
    Running,
    Completed,
    Failed,
}

/// Where a failed run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    /// Index of the instruction that failed.
    pub ip: isize,
    /// Instructions dispatched before the failure (after [`CountMode`]).
    pub instructions: u64,
}

/// Outcome of one run.
#[derive(Debug)]
pub enum ExecutionResult {
    Completed { instructions: u64 },
    Failed { error: Error, context: Diagnostic },
}

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionResult::Completed { .. })
    }

    /// Instructions dispatched, whether or not the run completed.
    pub fn instructions(&self) -> u64 {
        match self {
            ExecutionResult::Completed { instructions } => *instructions,
            ExecutionResult::Failed { context, .. } => context.instructions,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            ExecutionResult::Completed { .. } => None,
            ExecutionResult::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<u64> {
        match self {
            ExecutionResult::Completed { instructions } => Ok(instructions),
            ExecutionResult::Failed { error, .. } => Err(error),
        }
    }
}

/// Runs an instruction tape against a memory.
///
/// The engine owns both for the lifetime of a run and is the only thing
/// that touches either: the current instruction comes from the tape, its
/// effect lands in memory or on the IO collaborators.
///
/// Loop semantics differ from the usual ones on purpose:
/// - `[` does nothing. A loop body is always entered at least once.
/// - `]` jumps back into the body when the current cell is non-zero,
///   found by scanning backward with a bracket depth counter.
#[derive(Debug)]
pub struct Engine {
    tape: Option<Tape>,
    memory: Option<Memory>,
    config: EngineConfig,
    state: EngineState,
}

impl Engine {
    /// An engine with freshly allocated memory and no tape.
    ///
    /// A zero `memory_size` leaves the memory unallocated; running will
    /// then fail with [`Error::MemNotInitialized`].
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tape: None,
            memory: Memory::new(config.memory_size).ok(),
            config,
            state: EngineState::Ready,
        }
    }

    /// Lex `source` and load it into a new engine.
    pub fn from_source(source: &str, config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(config);
        engine.load(Tape::from_source(source)?);
        Ok(engine)
    }

    /// Install `tape`, replacing any previous one, and return to `Ready`.
    pub fn load(&mut self, tape: Tape) {
        self.tape = Some(tape);
        self.reset();
    }

    /// Zero memory, rewind the tape and return to `Ready`.
    pub fn reset(&mut self) {
        if let Some(tape) = self.tape.as_mut() {
            tape.rewind();
        }
        if let Some(memory) = self.memory.as_mut() {
            memory.reset();
        }
        self.state = EngineState::Ready;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn tape(&self) -> Option<&Tape> {
        self.tape.as_ref()
    }

    pub fn memory(&self) -> Option<&Memory> {
        self.memory.as_ref()
    }

    /// Run the loaded tape to completion or failure.
    ///
    /// An engine that already finished a run is reset first, so every run
    /// starts from zeroed memory and `ip = 0`.
    pub fn run<I, O>(&mut self, input: &mut I, output: &mut O) -> ExecutionResult
    where
        I: ByteInput + ?Sized,
        O: ByteOutput + ?Sized,
    {
        if self.state != EngineState::Ready {
            self.reset();
        }
        let count_mode = self.config.count_mode;

        let (tape, memory) = match (self.tape.as_mut(), self.memory.as_mut()) {
            (None, _) => return self.fail(Error::TapeNotInitialized, 0, 0),
            (_, None) => return self.fail(Error::MemNotInitialized, 0, 0),
            (Some(tape), Some(memory)) => (tape, memory),
        };

        debug!(
            tape_len = tape.len(),
            memory_size = memory.size(),
            "engine running"
        );
        self.state = EngineState::Running;

        let mut count: u64 = 0;
        let mut failure = None;

        while tape.in_bounds() {
            let ip = tape.ip();
            let Some(symbol) = tape.current() else {
                break;
            };
            trace!(ip, %symbol, dp = memory.pointer(), "dispatch");

            if let Err(error) = step(symbol, tape, memory, input, output) {
                failure = Some((error, ip));
                break;
            }
            tape.advance();
            count += 1;
        }

        let flushed = output.flush();
        match (failure, flushed) {
            (Some((error, ip)), _) => self.fail(error, ip, count_mode.report(count)),
            (None, Err(e)) => {
                let ip = tape.ip();
                self.fail(e.into(), ip, count_mode.report(count))
            }
            (None, Ok(())) => {
                let instructions = count_mode.report(count);
                debug!(instructions, "engine completed");
                self.state = EngineState::Completed;
                ExecutionResult::Completed { instructions }
            }
        }
    }

    fn fail(&mut self, error: Error, ip: isize, instructions: u64) -> ExecutionResult {
        warn!(%error, ip, instructions, "engine failed");
        self.state = EngineState::Failed;
        ExecutionResult::Failed {
            error,
            context: Diagnostic { ip, instructions },
        }
    }
}

/// Apply one instruction. Leaves `ip` for the caller to advance.
fn step<I, O>(
    symbol: Symbol,
    tape: &mut Tape,
    memory: &mut Memory,
    input: &mut I,
    output: &mut O,
) -> Result<()>
where
    I: ByteInput + ?Sized,
    O: ByteOutput + ?Sized,
{
    match symbol {
        Symbol::MoveRight => memory.move_pointer(Direction::Right)?,
        Symbol::MoveLeft => memory.move_pointer(Direction::Left)?,
        Symbol::Increment => memory.increment_cell(),
        Symbol::Decrement => memory.decrement_cell(),
        Symbol::Output => output.write_byte(memory.read_cell())?,
        Symbol::Input => memory.write_cell(input.read_byte()?),
        Symbol::LoopStart => {}
        Symbol::LoopEnd => loop_back(tape, memory)?,
    }
    Ok(())
}

/// Handle `]` at the current `ip`.
///
/// The matching `[` is looked up by scanning backward with a depth counter
/// every time, so an orphan `]` fails when it is reached even on a zero
/// cell. A zero cell ends the loop and puts `ip` back on the `]`. Otherwise
/// `ip` is left on the matching `[`, so the caller's advance lands on the
/// first instruction of the loop body.
fn loop_back(tape: &mut Tape, memory: &Memory) -> Result<()> {
    let origin = tape.ip();
    let position = origin.max(0) as usize;
    let mut depth: usize = 1;
    loop {
        tape.retreat();
        match tape.current() {
            None => return Err(Error::NoMatchingLoopStart { position }),
            Some(Symbol::LoopEnd) => depth += 1,
            Some(Symbol::LoopStart) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Some(_) => {}
        }
    }

    if memory.read_cell() == 0 {
        tape.seek(origin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn run_with(source: &str, memory_size: usize, input: &[u8]) -> (ExecutionResult, Vec<u8>) {
        let config = EngineConfig {
            memory_size,
            ..EngineConfig::default()
        };
        let mut engine = Engine::from_source(source, config).unwrap();
        let mut input = input;
        let mut output = Vec::new();
        let result = engine.run(&mut input, &mut output);
        (result, output)
    }

    #[test]
    fn test_print_three() {
        let (result, output) = run_with("+++.", 1, b"");
        assert_eq!(output, vec![3]);
        assert!(matches!(result, ExecutionResult::Completed { instructions: 4 }));
    }

    #[test]
    fn test_loop_falls_through_on_zero() {
        let config = EngineConfig {
            memory_size: 1,
            ..EngineConfig::default()
        };
        let mut engine = Engine::from_source("+[-]", config).unwrap();
        let result = engine.run(&mut &b""[..], &mut Vec::new());
        assert!(matches!(result, ExecutionResult::Completed { instructions: 4 }));
        assert_eq!(engine.memory().unwrap().read_cell(), 0);
        assert_eq!(engine.state(), EngineState::Completed);
    }

    #[test]
    fn test_loop_reenters_body_not_bracket() {
        // + + [ - ] : the first `]` jumps back to just after `[`, so only
        // `-` and `]` repeat: 5 + 2 = 7 dispatches.
        let (result, _) = run_with("++[-]", 1, b"");
        assert_eq!(result.instructions(), 7);
    }

    #[test]
    fn test_lone_loop_end() {
        let (result, _) = run_with("]", 1, b"");
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::NoMatchingLoopStart { position: 0 }));
                assert_eq!(context.instructions, 0);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_orphan_loop_end_after_balanced_pair() {
        let (result, _) = run_with("+[-]]", 1, b"");
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::NoMatchingLoopStart { position: 4 }));
                assert_eq!(context.ip, 4);
                assert_eq!(context.instructions, 4);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_orphan_loop_end_fails_when_reached() {
        // Earlier instructions run and their output is kept.
        let (result, output) = run_with("+.]", 1, b"");
        assert_eq!(output, vec![1]);
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::NoMatchingLoopStart { position: 2 }));
                assert_eq!(context.ip, 2);
                assert_eq!(context.instructions, 2);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_overflow_before_orphan_loop_end_wins() {
        let (result, _) = run_with(">]", 1, b"");
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::MemOverflow { pointer: 0, size: 1 }));
                assert_eq!(context.ip, 0);
                assert_eq!(context.instructions, 0);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_loop_back_on_zero_cell_stays_on_loop_end() {
        let mut tape = Tape::from_source("[-]").unwrap();
        let memory = Memory::new(1).unwrap();
        tape.advance();
        tape.advance();
        assert!(loop_back(&mut tape, &memory).is_ok());
        assert_eq!(tape.ip(), 2);
    }

    #[test]
    fn test_move_right_on_single_cell() {
        let (result, _) = run_with(">", 1, b"");
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::MemOverflow { pointer: 0, size: 1 }));
                assert_eq!(context.ip, 0);
                assert_eq!(context.instructions, 0);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_move_left_at_start() {
        let (result, _) = run_with("++<", 8, b"");
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::MemOverflow { pointer: 0, size: 8 }));
                assert_eq!(context.ip, 2);
                assert_eq!(context.instructions, 2);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(
            Engine::from_source("", EngineConfig::default()),
            Err(Error::NoCodeFound)
        ));
    }

    #[test]
    fn test_tape_not_initialized() {
        let mut engine = Engine::new(EngineConfig::default());
        let result = engine.run(&mut &b""[..], &mut Vec::new());
        assert!(matches!(result.error(), Some(Error::TapeNotInitialized)));
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[test]
    fn test_mem_not_initialized() {
        let config = EngineConfig {
            memory_size: 0,
            ..EngineConfig::default()
        };
        let mut engine = Engine::from_source("+", config).unwrap();
        let result = engine.run(&mut &b""[..], &mut Vec::new());
        assert!(matches!(result.error(), Some(Error::MemNotInitialized)));
    }

    #[test]
    fn test_unclosed_loop_start_is_a_no_op() {
        let (result, _) = run_with("[+.", 1, b"");
        assert!(matches!(result, ExecutionResult::Completed { instructions: 3 }));
    }

    #[test]
    fn test_loop_start_does_not_skip_on_zero() {
        // The body runs once even though the cell is zero on entry.
        let (result, output) = run_with("[+.-]", 1, b"");
        assert!(result.is_completed());
        assert_eq!(output, vec![1]);
    }

    #[test]
    fn test_nested_loops() {
        // cell2 = 2 * 2
        let (result, output) = run_with("++[>++[>+<-]<-]>>.", 3, b"");
        assert!(result.is_completed());
        assert_eq!(output, vec![4]);
    }

    #[test]
    fn test_hello_world() {
        let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.\
                      +++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        let (result, output) = run_with(source, DEFAULT_MEMORY_SIZE, b"");
        assert!(result.is_completed());
        assert_eq!(output, b"Hello World!\n");
    }

    #[test]
    fn test_input_echo() {
        let (result, output) = run_with(",.,.,.", 1, b"hi");
        assert!(result.is_completed());
        assert_eq!(output, vec![b'h', b'i', crate::io::END_OF_INPUT]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let (result, output) = run_with("add three: + + + then print: .", 1, b"");
        assert!(matches!(result, ExecutionResult::Completed { instructions: 4 }));
        assert_eq!(output, vec![3]);
    }

    #[test]
    fn test_unbounded_count() {
        let source = "+".repeat(300);
        let (result, _) = run_with(&source, 1, b"");
        assert_eq!(result.instructions(), 300);
    }

    #[test]
    fn test_wrapping_count() {
        let config = EngineConfig {
            memory_size: 1,
            count_mode: CountMode::Wrapping8,
        };
        let mut engine = Engine::from_source(&"+".repeat(300), config).unwrap();
        let result = engine.run(&mut &b""[..], &mut Vec::new());
        assert_eq!(result.instructions(), 44);
    }

    #[test]
    fn test_second_run_starts_clean() {
        let config = EngineConfig {
            memory_size: 2,
            ..EngineConfig::default()
        };
        let mut engine = Engine::from_source("+>++.", config).unwrap();
        let mut first = Vec::new();
        assert!(engine.run(&mut &b""[..], &mut first).is_completed());
        let mut second = Vec::new();
        assert!(engine.run(&mut &b""[..], &mut second).is_completed());
        assert_eq!(first, vec![2]);
        assert_eq!(second, vec![2]);
    }

    #[test]
    fn test_reset() {
        let config = EngineConfig {
            memory_size: 2,
            ..EngineConfig::default()
        };
        let mut engine = Engine::from_source("+>+", config).unwrap();
        engine.run(&mut &b""[..], &mut Vec::new());
        engine.reset();
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.memory().unwrap().pointer(), 0);
        assert_eq!(engine.memory().unwrap().cells(), &[0, 0]);
        assert_eq!(engine.tape().unwrap().ip(), 0);
    }

    struct ClosedOutput;

    impl ByteOutput for ClosedOutput {
        fn write_byte(&mut self, _byte: u8) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn test_output_failure_stops_run() {
        let mut engine = Engine::from_source("+.+", EngineConfig::default()).unwrap();
        let result = engine.run(&mut &b""[..], &mut ClosedOutput);
        match result {
            ExecutionResult::Failed { error, context } => {
                assert!(matches!(error, Error::Io(_)));
                assert_eq!(context.ip, 1);
                assert_eq!(context.instructions, 1);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_loop_back_scan_runs_off_start() {
        let mut tape = Tape::from_source("+]").unwrap();
        let mut memory = Memory::new(1).unwrap();
        memory.increment_cell();
        tape.advance();
        let err = loop_back(&mut tape, &memory).unwrap_err();
        assert!(matches!(err, Error::NoMatchingLoopStart { position: 1 }));
        assert_eq!(tape.ip(), -1);
    }

    #[test]
    fn test_into_result() {
        let (result, _) = run_with("+", 1, b"");
        assert_eq!(result.into_result().unwrap(), 1);
        let (result, _) = run_with(">", 1, b"");
        assert!(matches!(result.into_result(), Err(Error::MemOverflow { .. })));
    }
}
