use std::mem::size_of;
use std::sync::Arc;

use cranelift::codegen::ir::{FuncRef, Function, SigRef};
use cranelift::prelude::*;
use cranelift_jit::JITModule;
use cranelift_module::{FuncId, Module};
use smallvec::SmallVec;

use super::NativeError;
use crate::ir::{IrEvent, IrSink, Operator};
use crate::symbols::{BoundFn, Target};

/// Runtime helpers declared once per module.
#[derive(Debug, Clone, Copy)]
pub(super) struct Helpers {
    pub pow: FuncId,
    pub rem: FuncId,
    pub call_bound: FuncId,
    pub not_finite: FuncId,
}

impl Helpers {
    pub fn import(&self, module: &mut JITModule, func: &mut Function) -> HelperRefs {
        HelperRefs {
            pow: module.declare_func_in_func(self.pow, func),
            rem: module.declare_func_in_func(self.rem, func),
            call_bound: module.declare_func_in_func(self.call_bound, func),
            not_finite: module.declare_func_in_func(self.not_finite, func),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct HelperRefs {
    pow: FuncRef,
    rem: FuncRef,
    call_bound: FuncRef,
    not_finite: FuncRef,
}

/// Bound functions referenced by one artifact. Native code addresses them by
/// index from the capture base pointer, so each distinct target is stored
/// once.
#[derive(Default)]
pub(super) struct Captures {
    targets: Vec<Arc<BoundFn>>,
}

impl Captures {
    fn intern(&mut self, target: &Arc<BoundFn>) -> usize {
        match self.targets.iter().position(|t| Arc::ptr_eq(t, target)) {
            Some(index) => index,
            None => {
                self.targets.push(Arc::clone(target));
                self.targets.len() - 1
            }
        }
    }

    pub fn into_boxed_slice(self) -> Box<[Arc<BoundFn>]> {
        self.targets.into_boxed_slice()
    }
}

/// Where argument values come from inside the generated function.
pub(super) enum ArgumentSource {
    /// Passed directly as `f64` parameters.
    Params(Vec<Value>),
    /// Loaded from a `*const f64` parameter.
    Array(Value),
    /// Loop accumulators of a tabulator.
    Loop(Vec<Variable>),
}

/// IR sink that lowers the event stream to Cranelift instructions at the
/// builder's current position.
pub(super) struct NativeEmitter<'e, 'f> {
    builder: &'e mut FunctionBuilder<'f>,
    helpers: HelperRefs,
    pointer_type: Type,
    call_conv: isa::CallConv,
    captures_base: Value,
    arguments: &'e ArgumentSource,
    captures: &'e mut Captures,
    static_signatures: [Option<SigRef>; 3],
    stack: SmallVec<[Value; 16]>,
    broken: bool,
}

impl<'e, 'f> NativeEmitter<'e, 'f> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        builder: &'e mut FunctionBuilder<'f>,
        helpers: HelperRefs,
        pointer_type: Type,
        call_conv: isa::CallConv,
        captures_base: Value,
        arguments: &'e ArgumentSource,
        captures: &'e mut Captures,
    ) -> Self {
        Self {
            builder,
            helpers,
            pointer_type,
            call_conv,
            captures_base,
            arguments,
            captures,
            static_signatures: [None; 3],
            stack: SmallVec::new(),
            broken: false,
        }
    }

    /// The value of the complete expression.
    pub fn finish(&mut self) -> Result<Value, NativeError> {
        match self.stack.as_slice() {
            [value] if !self.broken => Ok(*value),
            _ => Err(NativeError::Codegen(
                "expression stream did not reduce to a single value".into(),
            )),
        }
    }

    /// Reports `value` through the runtime when it is NaN or infinite.
    pub fn check_finite(&mut self, value: Value) {
        // `v - v` is zero for every finite `v` and NaN otherwise.
        let difference = self.builder.ins().fsub(value, value);
        let zero = self.builder.ins().f64const(0.0);
        let finite = self.builder.ins().fcmp(FloatCC::Equal, difference, zero);

        let report = self.builder.create_block();
        let next = self.builder.create_block();
        self.builder.ins().brif(finite, next, &[], report, &[]);

        self.builder.switch_to_block(report);
        self.builder.seal_block(report);
        self.builder.ins().call(self.helpers.not_finite, &[value]);
        self.builder.ins().jump(next, &[]);

        self.builder.switch_to_block(next);
        self.builder.seal_block(next);
    }

    fn pop(&mut self) -> Value {
        match self.stack.pop() {
            Some(value) => value,
            None => {
                self.broken = true;
                self.builder.ins().f64const(f64::NAN)
            }
        }
    }

    fn load_argument(&mut self, index: usize) -> Value {
        let arguments = self.arguments;
        let loaded = match arguments {
            ArgumentSource::Params(values) => values.get(index).copied(),
            ArgumentSource::Array(base) => {
                let offset = (index * size_of::<f64>()) as i32;
                Some(
                    self.builder
                        .ins()
                        .load(types::F64, MemFlags::trusted(), *base, offset),
                )
            }
            ArgumentSource::Loop(variables) => variables
                .get(index)
                .map(|variable| self.builder.use_var(*variable)),
        };
        loaded.unwrap_or_else(|| {
            self.broken = true;
            self.builder.ins().f64const(f64::NAN)
        })
    }

    fn call_helper(&mut self, helper: FuncRef, args: &[Value]) -> Value {
        let call = self.builder.ins().call(helper, args);
        self.builder.inst_results(call)[0]
    }

    fn emit_operator(&mut self, op: Operator) -> Value {
        if op == Operator::Neg {
            let operand = self.pop();
            return self.builder.ins().fneg(operand);
        }
        let rhs = self.pop();
        let lhs = self.pop();
        match op {
            Operator::Add => self.builder.ins().fadd(lhs, rhs),
            Operator::Sub => self.builder.ins().fsub(lhs, rhs),
            Operator::Mul => self.builder.ins().fmul(lhs, rhs),
            Operator::Div => self.builder.ins().fdiv(lhs, rhs),
            Operator::Rem => self.call_helper(self.helpers.rem, &[lhs, rhs]),
            Operator::Pow => self.call_helper(self.helpers.pow, &[lhs, rhs]),
            Operator::Neg => unreachable!("handled above"),
        }
    }

    fn static_signature(&mut self, arity: usize) -> SigRef {
        if let Some(signature) = self.static_signatures[arity] {
            return signature;
        }
        let mut signature = Signature::new(self.call_conv);
        for _ in 0..arity {
            signature.params.push(AbiParam::new(types::F64));
        }
        signature.returns.push(AbiParam::new(types::F64));
        let signature = self.builder.import_signature(signature);
        self.static_signatures[arity] = Some(signature);
        signature
    }

    /// Direct call through an absolute function address.
    fn call_static(&mut self, address: usize, args: &[Value]) -> Value {
        let signature = self.static_signature(args.len());
        let callee = self.builder.ins().iconst(self.pointer_type, address as i64);
        let call = self.builder.ins().call_indirect(signature, callee, args);
        self.builder.inst_results(call)[0]
    }

    /// Spills the arguments to a stack slot and calls the trampoline with
    /// the captured target.
    fn call_bound(&mut self, target: &Arc<BoundFn>, fixed: usize, args: &[Value]) -> Value {
        let index = self.captures.intern(target);
        let size = (args.len().max(1) * size_of::<f64>()) as u32;
        let slot = self.builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            size,
            3,
        ));
        for (i, arg) in args.iter().enumerate() {
            self.builder
                .ins()
                .stack_store(*arg, slot, (i * size_of::<f64>()) as i32);
        }
        let args_ptr = self.builder.ins().stack_addr(self.pointer_type, slot, 0);
        let target_ptr = self
            .builder
            .ins()
            .iadd_imm(self.captures_base, (index * size_of::<Arc<BoundFn>>()) as i64);
        let fixed = self.builder.ins().iconst(self.pointer_type, fixed as i64);
        let total = self.builder.ins().iconst(self.pointer_type, args.len() as i64);
        self.call_helper(
            self.helpers.call_bound,
            &[target_ptr, args_ptr, fixed, total],
        )
    }
}

impl IrSink for NativeEmitter<'_, '_> {
    fn emit(&mut self, event: IrEvent) {
        let value = match event {
            IrEvent::Constant(value) => self.builder.ins().f64const(value),
            IrEvent::Argument(index) => self.load_argument(index),
            IrEvent::Operator(op) => self.emit_operator(op),
            IrEvent::Invoke { function, args } => {
                let Some(base) = self.stack.len().checked_sub(args) else {
                    self.broken = true;
                    return;
                };
                let values: SmallVec<[Value; 8]> = self.stack.drain(base..).collect();
                match function.target() {
                    Target::Static0(f) => self.call_static(*f as usize, &values),
                    Target::Static1(f) => self.call_static(*f as usize, &values),
                    Target::Static2(f) => self.call_static(*f as usize, &values),
                    Target::Bound(target) => {
                        self.call_bound(target, function.fixed_count(), &values)
                    }
                }
            }
            IrEvent::BeginCall | IrEvent::Separator | IrEvent::End => return,
        };
        self.stack.push(value);
    }
}
