use std::sync::Arc;

use tracing::debug;

use super::{CalcOptions, Calculation, Error, Evaluator, Interpreter, Tabulator};
use crate::compiler::BytecodeCompiler;
use crate::compiler::native::{self, NativeCompiler};
use crate::ir::{IrSink, NullSink};
use crate::optimizer::Optimizer;
use crate::parser;
use crate::symbols::{
    Arguments, Constants, FunctionItem, Functions, RegistrationError, SymbolResolver,
};
use crate::vm::QuickEvaluator;

/// Symbol tables and options from which formulas are compiled.
///
/// Compiled calculations keep no reference to the context: changing the
/// tables afterwards only affects formulas compiled later.
///
/// # Example
///
/// ```
/// use calcjit_core::{CalcContext, Range, Table};
///
/// let mut context = CalcContext::new();
/// context.add_argument("x").unwrap();
/// context.add_constant("k", 3.0).unwrap();
///
/// assert_eq!(context.evaluate("k x + 1", &[2.0]).unwrap(), 7.0);
///
/// let interpreter = context.create_interpreter("2*x").unwrap();
/// let table = interpreter.tabulate(&[Range::new(0.0, 2.0, 1.0).unwrap()]).unwrap();
/// assert_eq!(table, Table::Row(vec![0.0, 2.0, 4.0]));
/// ```
#[derive(Debug, Default)]
pub struct CalcContext {
    arguments: Arguments,
    constants: Constants,
    functions: Functions,
    options: CalcOptions,
}

impl CalcContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CalcOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CalcOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CalcOptions) {
        self.options = options;
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn constants_mut(&mut self) -> &mut Constants {
        &mut self.constants
    }

    pub fn functions(&self) -> &Functions {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut Functions {
        &mut self.functions
    }

    /// Appends an argument; returns its position.
    pub fn add_argument(&mut self, name: impl Into<String>) -> Result<usize, RegistrationError> {
        self.arguments.push(name)
    }

    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        value: f64,
    ) -> Result<(), RegistrationError> {
        self.constants.insert(name, value)
    }

    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        item: FunctionItem,
    ) -> Result<(), RegistrationError> {
        self.functions.add(name, item)
    }

    /// Parses `source` and feeds the (optimized) IR to `sink`.
    fn compile(&self, source: &str, sink: &mut dyn IrSink) -> Result<(), Error> {
        let resolver = SymbolResolver::new(
            &self.arguments,
            &self.constants,
            &self.functions,
            self.options.ignore_case,
        );
        let settings = self.options.parse_settings();
        if self.options.optimize.is_empty() {
            parser::parse(source, &resolver, &settings, sink)?;
        } else {
            let mut optimizer = Optimizer::new(self.options.optimize, sink);
            parser::parse(source, &resolver, &settings, &mut optimizer)?;
            debug!(folds = optimizer.folds(), "optimized");
        }
        Ok(())
    }

    /// Checks that `source` compiles without producing anything.
    pub fn validate(&self, source: &str) -> Result<(), Error> {
        self.compile(source, &mut NullSink)
    }

    /// Evaluates `source` once, directly from the parser.
    pub fn evaluate(&self, source: &str, args: &[f64]) -> Result<f64, Error> {
        if args.len() != self.arguments.len() {
            return Err(Error::ArgumentCount {
                expected: self.arguments.len(),
                got: args.len(),
            });
        }
        let mut evaluator = QuickEvaluator::new(args);
        self.compile(source, &mut evaluator)?;
        let value = evaluator.result().unwrap_or(f64::NAN);
        if self.options.checked && !value.is_finite() {
            return Err(Error::NotFinite(value));
        }
        Ok(value)
    }

    pub fn create_interpreter(&self, source: &str) -> Result<Interpreter, Error> {
        debug!(source, "compiling to bytecode");
        let mut compiler = BytecodeCompiler::new();
        self.compile(source, &mut compiler)?;
        let program = compiler.finish(source, self.arguments.len());
        Ok(Interpreter::new(program, self.options.checked))
    }

    pub fn create_evaluator(&self, source: &str) -> Result<Evaluator, Error> {
        debug!(source, "compiling to native evaluator");
        NativeCompiler::new()?.compile_evaluator(
            source,
            self.arguments.len(),
            self.options.checked,
            |sink| self.compile(source, sink),
        )
    }

    /// Compiles a native loop nest with one dimension per argument.
    pub fn create_tabulator(&self, source: &str) -> Result<Tabulator, Error> {
        if self.arguments.is_empty() {
            return Err(Error::NothingToTabulate);
        }
        debug!(source, "compiling to native tabulator");
        NativeCompiler::new()?.compile_tabulator(
            source,
            self.arguments.len(),
            self.options.checked,
            |sink| self.compile(source, sink),
        )
    }

    /// Native code where the host supports it, bytecode otherwise.
    pub fn create_calculation(&self, source: &str) -> Result<Arc<dyn Calculation>, Error> {
        if native::is_supported() {
            match self.create_evaluator(source) {
                Ok(evaluator) => return Ok(Arc::new(evaluator)),
                Err(Error::Native(error)) => {
                    debug!(%error, "native compilation failed, using bytecode");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(Arc::new(self.create_interpreter(source)?))
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;
