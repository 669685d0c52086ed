//! Native backend: lowers the IR stream to machine code with Cranelift.
//!
//! Every artifact owns its own `JITModule`, so dropping an [`Evaluator`] or
//! [`Tabulator`] releases its code. Static function targets are called
//! directly by address; bound closures go through a runtime trampoline and
//! a capture table passed as the first parameter of every entry point.

mod artifact;
mod emitter;
mod loops;
mod runtime;

pub use artifact::{Evaluator, Tabulator};

use cranelift::codegen;
use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Linkage, Module, default_libcall_names};
use target_lexicon::{Architecture, Triple};
use thiserror::Error;
use tracing::debug;

use self::emitter::{ArgumentSource, Captures, Helpers, NativeEmitter};
use crate::api::Error;
use crate::ir::IrSink;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    #[error("native code generation is not supported on {0}")]
    Unsupported(String),

    #[error("native code generation failed: {0}")]
    Codegen(String),
}

fn codegen_error(error: impl std::fmt::Display) -> NativeError {
    NativeError::Codegen(error.to_string())
}

/// Whether this host can run generated code.
pub fn is_supported() -> bool {
    matches!(
        Triple::host().architecture,
        Architecture::X86_64 | Architecture::Aarch64(_) | Architecture::Riscv64(_)
    ) && cranelift_native::builder().is_ok()
}

/// One-shot code generator; consumed by the artifact it produces.
pub(crate) struct NativeCompiler {
    module: JITModule,
    helpers: Helpers,
    context: codegen::Context,
    builder_context: FunctionBuilderContext,
}

impl NativeCompiler {
    pub(crate) fn new() -> Result<Self, NativeError> {
        if !is_supported() {
            return Err(NativeError::Unsupported(
                Triple::host().architecture.to_string(),
            ));
        }

        // Configure Cranelift for the host target
        let mut flag_builder = settings::builder();
        flag_builder
            .set("use_colocated_libcalls", "false")
            .map_err(codegen_error)?;
        flag_builder.set("is_pic", "false").map_err(codegen_error)?;
        flag_builder
            .set("opt_level", "speed")
            .map_err(codegen_error)?;

        let isa_builder = cranelift_native::builder().map_err(codegen_error)?;
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(codegen_error)?;

        let mut builder = JITBuilder::with_isa(isa, default_libcall_names());
        builder.symbol("calcjit_pow", runtime::calcjit_pow as *const u8);
        builder.symbol("calcjit_rem", runtime::calcjit_rem as *const u8);
        builder.symbol("calcjit_call_bound", runtime::calcjit_call_bound as *const u8);
        builder.symbol("calcjit_not_finite", runtime::calcjit_not_finite as *const u8);

        let mut module = JITModule::new(builder);
        let helpers = Self::declare_helpers(&mut module)?;
        let context = module.make_context();
        Ok(Self {
            module,
            helpers,
            context,
            builder_context: FunctionBuilderContext::new(),
        })
    }

    fn declare_helpers(module: &mut JITModule) -> Result<Helpers, NativeError> {
        let pointer_type = module.target_config().pointer_type();

        let mut binary = module.make_signature();
        binary.params.push(AbiParam::new(types::F64));
        binary.params.push(AbiParam::new(types::F64));
        binary.returns.push(AbiParam::new(types::F64));

        let mut report = module.make_signature();
        report.params.push(AbiParam::new(types::F64));

        let mut trampoline = module.make_signature();
        for _ in 0..4 {
            trampoline.params.push(AbiParam::new(pointer_type));
        }
        trampoline.returns.push(AbiParam::new(types::F64));

        let mut declare = |name: &str, signature: &Signature| {
            module
                .declare_function(name, Linkage::Import, signature)
                .map_err(codegen_error)
        };
        Ok(Helpers {
            pow: declare("calcjit_pow", &binary)?,
            rem: declare("calcjit_rem", &binary)?,
            call_bound: declare("calcjit_call_bound", &trampoline)?,
            not_finite: declare("calcjit_not_finite", &report)?,
        })
    }

    fn pointer_type(&self) -> Type {
        self.module.target_config().pointer_type()
    }

    fn declare_entry(&mut self, name: &str, signature: Signature) -> Result<FuncId, NativeError> {
        let id = self
            .module
            .declare_function(name, Linkage::Local, &signature)
            .map_err(codegen_error)?;
        self.context.func.signature = signature;
        Ok(id)
    }

    /// Compiles the function built in `self.context` and returns its address.
    fn define(&mut self, id: FuncId) -> Result<*const u8, NativeError> {
        self.module
            .define_function(id, &mut self.context)
            .map_err(codegen_error)?;
        self.module.clear_context(&mut self.context);
        self.module.finalize_definitions().map_err(codegen_error)?;
        Ok(self.module.get_finalized_function(id))
    }

    /// Builds a scalar evaluator. `feed` drives the parser into the sink it
    /// is handed.
    pub(crate) fn compile_evaluator<F>(
        mut self,
        source: &str,
        arg_count: usize,
        checked: bool,
        feed: F,
    ) -> Result<Evaluator, Error>
    where
        F: FnOnce(&mut dyn IrSink) -> Result<(), Error>,
    {
        let pointer_type = self.pointer_type();
        let mut signature = self.module.make_signature();
        signature.params.push(AbiParam::new(pointer_type));
        match arg_count {
            0..=2 => {
                for _ in 0..arg_count {
                    signature.params.push(AbiParam::new(types::F64));
                }
            }
            _ => signature.params.push(AbiParam::new(pointer_type)),
        }
        signature.returns.push(AbiParam::new(types::F64));
        let id = self.declare_entry("evaluate", signature)?;

        let call_conv = self.module.isa().default_call_conv();
        let mut captures = Captures::default();
        {
            let mut builder = FunctionBuilder::new(&mut self.context.func, &mut self.builder_context);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            builder.seal_block(entry);

            let params = builder.block_params(entry).to_vec();
            let arguments = if arg_count <= 2 {
                ArgumentSource::Params(params[1..].to_vec())
            } else {
                ArgumentSource::Array(params[1])
            };
            let helpers = self.helpers.import(&mut self.module, builder.func);

            let result = {
                let mut emitter = NativeEmitter::new(
                    &mut builder,
                    helpers,
                    pointer_type,
                    call_conv,
                    params[0],
                    &arguments,
                    &mut captures,
                );
                feed(&mut emitter)?;
                let result = emitter.finish()?;
                if checked {
                    emitter.check_finite(result);
                }
                result
            };
            builder.ins().return_(&[result]);
            builder.finalize();
        }

        let code = self.define(id)?;
        debug!(source, arg_count, checked, "generated native evaluator");
        Ok(Evaluator::new(
            source,
            arg_count,
            checked,
            code,
            captures.into_boxed_slice(),
            self.module,
        ))
    }
}

#[cfg(test)]
#[path = "native_test.rs"]
mod native_test;
