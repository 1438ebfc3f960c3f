use std::borrow::Cow;
use std::io::Write;

/// Execution context: the interpreter's only I/O conduit. The evaluator
/// borrows it and never closes the underlying stream.
pub trait Context {
    fn output_stream(&mut self) -> &mut dyn Write;
}

/// Context writing straight to a caller-supplied stream; the driver passes
/// the process's stdout.
pub struct SimpleContext<'a> {
    output: &'a mut dyn Write,
}

impl<'a> SimpleContext<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        Self { output }
    }
}

impl Context for SimpleContext<'_> {
    fn output_stream(&mut self) -> &mut dyn Write {
        &mut *self.output
    }
}

/// Context buffering output in memory, for tests and `str(..)`-style
/// rendering checks.
#[derive(Default)]
pub struct DummyContext {
    output: Vec<u8>,
}

impl DummyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the program printed so far.
    pub fn output(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

impl Context for DummyContext {
    fn output_stream(&mut self) -> &mut dyn Write {
        &mut self.output
    }
}
