//! Tabulator code generation: one nested loop per argument, innermost
//! dimension writing consecutive cells of the current row.

use std::mem::size_of;

use cranelift::prelude::*;
use cranelift_module::Module;
use tracing::debug;

use super::artifact::{LoopFrame, Tabulator};
use super::emitter::{ArgumentSource, Captures, NativeEmitter};
use super::NativeCompiler;
use crate::api::Error;
use crate::ir::IrSink;

const FRAME_BEGIN: i32 = 0;
const FRAME_STEP: i32 = 8;
const FRAME_COUNT: i32 = 16;

struct Dimension {
    value: Variable,
    index: Variable,
    step: Value,
    header: Block,
    exit: Block,
}

impl NativeCompiler {
    /// Builds a tabulator over `arg_count` nested ranges.
    ///
    /// The entry takes the capture table, `arg_count` [`LoopFrame`]s and an
    /// array of row pointers; rows are the innermost dimension, walked in
    /// row-major order of the outer dimensions.
    pub(crate) fn compile_tabulator<F>(
        mut self,
        source: &str,
        arg_count: usize,
        checked: bool,
        feed: F,
    ) -> Result<Tabulator, Error>
    where
        F: FnOnce(&mut dyn IrSink) -> Result<(), Error>,
    {
        debug_assert!(arg_count > 0);
        let pointer_type = self.pointer_type();
        let pointer_bytes = i64::from(pointer_type.bytes());

        let mut signature = self.module.make_signature();
        for _ in 0..3 {
            signature.params.push(AbiParam::new(pointer_type));
        }
        let id = self.declare_entry("tabulate", signature)?;

        let call_conv = self.module.isa().default_call_conv();
        let mut captures = Captures::default();
        {
            let mut builder = FunctionBuilder::new(&mut self.context.func, &mut self.builder_context);
            let entry = builder.create_block();
            builder.append_block_params_for_function_params(entry);
            builder.switch_to_block(entry);
            builder.seal_block(entry);

            let params = builder.block_params(entry).to_vec();
            let (captures_base, frames, rows) = (params[0], params[1], params[2]);
            let helpers = self.helpers.import(&mut self.module, builder.func);

            let row = Variable::from_u32(0);
            builder.declare_var(row, pointer_type);
            let zero = builder.ins().iconst(pointer_type, 0);
            builder.def_var(row, zero);

            // Open loops outermost first.
            let mut dimensions = Vec::with_capacity(arg_count);
            for d in 0..arg_count {
                let value = Variable::from_u32((1 + 2 * d) as u32);
                let index = Variable::from_u32((2 + 2 * d) as u32);
                builder.declare_var(value, types::F64);
                builder.declare_var(index, types::I64);

                let offset = (d * size_of::<LoopFrame>()) as i32;
                let flags = MemFlags::trusted();
                let begin = builder
                    .ins()
                    .load(types::F64, flags, frames, offset + FRAME_BEGIN);
                let step = builder
                    .ins()
                    .load(types::F64, flags, frames, offset + FRAME_STEP);
                let count = builder
                    .ins()
                    .load(types::I64, flags, frames, offset + FRAME_COUNT);
                let start = builder.ins().iconst(types::I64, 0);
                builder.def_var(value, begin);
                builder.def_var(index, start);

                let header = builder.create_block();
                let body = builder.create_block();
                let exit = builder.create_block();
                builder.ins().jump(header, &[]);

                builder.switch_to_block(header);
                let i = builder.use_var(index);
                let more = builder.ins().icmp(IntCC::SignedLessThan, i, count);
                builder.ins().brif(more, body, &[], exit, &[]);

                builder.switch_to_block(body);
                builder.seal_block(body);

                dimensions.push(Dimension {
                    value,
                    index,
                    step,
                    header,
                    exit,
                });
            }

            // Innermost body: compute and store one cell.
            let arguments = ArgumentSource::Loop(dimensions.iter().map(|d| d.value).collect());
            let result = {
                let mut emitter = NativeEmitter::new(
                    &mut builder,
                    helpers,
                    pointer_type,
                    call_conv,
                    captures_base,
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
            let innermost = &dimensions[arg_count - 1];
            let r = builder.use_var(row);
            let row_offset = builder.ins().imul_imm(r, pointer_bytes);
            let row_slot = builder.ins().iadd(rows, row_offset);
            let row_ptr = builder
                .ins()
                .load(pointer_type, MemFlags::trusted(), row_slot, 0);
            let i = builder.use_var(innermost.index);
            let i = if pointer_type == types::I64 {
                i
            } else {
                builder.ins().ireduce(pointer_type, i)
            };
            let cell_offset = builder.ins().imul_imm(i, size_of::<f64>() as i64);
            let cell = builder.ins().iadd(row_ptr, cell_offset);
            builder.ins().store(MemFlags::trusted(), result, cell, 0);

            // Close loops innermost first.
            for (d, dimension) in dimensions.iter().enumerate().rev() {
                let x = builder.use_var(dimension.value);
                let x = builder.ins().fadd(x, dimension.step);
                builder.def_var(dimension.value, x);
                let i = builder.use_var(dimension.index);
                let i = builder.ins().iadd_imm(i, 1);
                builder.def_var(dimension.index, i);
                builder.ins().jump(dimension.header, &[]);
                builder.seal_block(dimension.header);

                builder.switch_to_block(dimension.exit);
                builder.seal_block(dimension.exit);
                if d == arg_count - 1 {
                    let r = builder.use_var(row);
                    let r = builder.ins().iadd_imm(r, 1);
                    builder.def_var(row, r);
                }
            }
            builder.ins().return_(&[]);
            builder.finalize();
        }

        let code = self.define(id)?;
        debug!(source, arg_count, checked, "generated native tabulator");
        Ok(Tabulator::new(
            source,
            arg_count,
            checked,
            code,
            captures.into_boxed_slice(),
            self.module,
        ))
    }
}
