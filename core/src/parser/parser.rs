use bumpalo::Bump;
use smallvec::SmallVec;
use tracing::trace;

use super::{ParseSettings, SyntaxError, SyntaxErrorKind, literal::scan_literal};
use crate::ir::{IrBuffer, IrEvent, IrSink, Operator};
use crate::symbols::{
    Binding, FunctionGroup, FunctionItem, SymbolResolver, is_identifier_part, is_identifier_start,
};

/// Parses `source` and streams its postfix form into `sink`, followed by
/// [`IrEvent::End`]. Nothing is emitted past the first error, but events
/// emitted before it are not retracted.
pub fn parse(
    source: &str,
    resolver: &SymbolResolver<'_>,
    settings: &ParseSettings,
    sink: &mut dyn IrSink,
) -> Result<(), SyntaxError> {
    if source.trim().is_empty() {
        return Err(SyntaxError::new(
            SyntaxErrorKind::EmptyExpression,
            0..source.len(),
            source,
        ));
    }

    let arena = Bump::new();
    let mut parser = Parser {
        source,
        pos: 0,
        resolver: *resolver,
        settings,
        arena: &arena,
        depth: 0,
    };
    parser.parse_level(sink, Mode::Top, None)?;
    sink.emit(IrEvent::End);
    trace!(source, arena_bytes = arena.allocated_bytes(), "parsed");
    Ok(())
}

/// Classification of the previously scanned item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Begin,
    Operator,
    Separator,
    Number,
    /// Closing brace or a completed call.
    End,
    Identifier,
}

impl Item {
    fn is_value(self) -> bool {
        matches!(self, Item::Number | Item::End | Item::Identifier)
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Top,
    Group { open: usize },
    Call { open: usize },
}

#[derive(Debug)]
enum Terminator {
    End,
    Close,
    Separator(usize),
}

type OperatorStack = SmallVec<[(Operator, usize); 8]>;

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    resolver: SymbolResolver<'a>,
    settings: &'a ParseSettings,
    arena: &'a Bump,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Parses one operator-precedence level: the whole input, the inside of
    /// a group, or one call argument. `after_separator` holds the position of
    /// the separator that opened this argument, if any.
    fn parse_level(
        &mut self,
        sink: &mut dyn IrSink,
        mode: Mode,
        after_separator: Option<usize>,
    ) -> Result<Terminator, SyntaxError> {
        let mut ops = OperatorStack::new();
        let mut prev = if after_separator.is_some() {
            Item::Separator
        } else {
            Item::Begin
        };

        loop {
            self.skip_whitespace();
            let start = self.pos;

            let Some(c) = self.peek() else {
                if let Mode::Group { open } | Mode::Call { open } = mode {
                    return Err(self.error(SyntaxErrorKind::UnmatchedOpeningBrace, open, open + 1));
                }
                self.expect_operand(prev, &ops, after_separator, start)?;
                Self::flush(&mut ops, sink);
                return Ok(Terminator::End);
            };

            if let Some((value, len)) = scan_literal(self.source, start, &self.settings.culture)? {
                match prev {
                    Item::Number => {
                        return Err(self.error(SyntaxErrorKind::MissingOperator, start, start + len));
                    }
                    Item::Identifier | Item::End => {
                        self.implicit_multiply(&mut ops, sink, start, start + len)?
                    }
                    _ => {}
                }
                self.pos += len;
                sink.emit(IrEvent::Constant(value));
                prev = Item::Number;
                continue;
            }

            if is_identifier_start(c) {
                prev = self.parse_identifier(sink, &mut ops, prev)?;
                continue;
            }

            if c == '(' {
                if prev.is_value() {
                    self.implicit_multiply(&mut ops, sink, start, start + 1)?;
                }
                self.pos += 1;
                self.parse_group(sink, start)?;
                prev = Item::End;
                continue;
            }

            if c == ')' {
                match mode {
                    Mode::Top => {
                        return Err(self.error(SyntaxErrorKind::UnmatchedClosingBrace, start, start + 1));
                    }
                    Mode::Group { open } if prev == Item::Begin => {
                        return Err(self.error(SyntaxErrorKind::EmptyBraces, open, start + 1));
                    }
                    _ => {}
                }
                self.expect_operand(prev, &ops, after_separator, start)?;
                self.pos += 1;
                Self::flush(&mut ops, sink);
                return Ok(Terminator::Close);
            }

            if c == self.settings.culture.argument_separator() {
                if !matches!(mode, Mode::Call { .. }) {
                    return Err(self.error(
                        SyntaxErrorKind::SeparatorOutsideCall,
                        start,
                        start + c.len_utf8(),
                    ));
                }
                self.expect_operand(prev, &ops, after_separator, start)?;
                self.pos += c.len_utf8();
                Self::flush(&mut ops, sink);
                return Ok(Terminator::Separator(start));
            }

            if let Some(op) = Operator::from_char(c) {
                self.pos += 1;
                if prev.is_value() {
                    Self::push_operator(&mut ops, sink, op, start);
                } else if op == Operator::Sub {
                    ops.push((Operator::Neg, start));
                } else if op == Operator::Add {
                    return Err(self.error(SyntaxErrorKind::UnaryPlus, start, start + 1));
                } else {
                    return Err(self.error(SyntaxErrorKind::MisplacedOperator(c), start, start + 1));
                }
                prev = Item::Operator;
                continue;
            }

            return Err(self.error(
                SyntaxErrorKind::UnexpectedCharacter(c),
                start,
                start + c.len_utf8(),
            ));
        }
    }

    /// Checks that the level may end here, i.e. the last item produced a
    /// value.
    fn expect_operand(
        &self,
        prev: Item,
        ops: &OperatorStack,
        after_separator: Option<usize>,
        here: usize,
    ) -> Result<(), SyntaxError> {
        match prev {
            Item::Number | Item::Identifier | Item::End => Ok(()),
            Item::Operator => {
                let (op, at) = ops.last().copied().unwrap_or((Operator::Neg, here));
                let symbol = if op == Operator::Neg { '-' } else { op.symbol() };
                Err(self.error(SyntaxErrorKind::MissingOperand(symbol), at, at + 1))
            }
            Item::Separator => {
                let at = after_separator.unwrap_or(here);
                Err(self.error(SyntaxErrorKind::MisplacedSeparator, at, at + 1))
            }
            Item::Begin => {
                if self.peek() == Some(self.settings.culture.argument_separator()) {
                    Err(self.error(SyntaxErrorKind::MisplacedSeparator, here, here + 1))
                } else {
                    Err(self.error(SyntaxErrorKind::EmptyExpression, here, here))
                }
            }
        }
    }

    fn parse_group(&mut self, sink: &mut dyn IrSink, open: usize) -> Result<(), SyntaxError> {
        self.enter(open)?;
        let terminator = self.parse_level(sink, Mode::Group { open }, None)?;
        debug_assert!(matches!(terminator, Terminator::Close));
        self.depth -= 1;
        Ok(())
    }

    /// Parses a call's argument list after its opening brace, recording
    /// every argument into its own buffer.
    fn parse_arguments(&mut self, open: usize) -> Result<Vec<IrBuffer<'a>>, SyntaxError> {
        self.enter(open)?;
        let mut arguments = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(arguments);
        }

        let mut separator = None;
        loop {
            let mut buffer = IrBuffer::new_in(self.arena);
            let terminator = self.parse_level(&mut buffer, Mode::Call { open }, separator)?;
            arguments.push(buffer);
            match terminator {
                Terminator::Separator(at) => separator = Some(at),
                Terminator::Close | Terminator::End => break,
            }
        }

        self.depth -= 1;
        Ok(arguments)
    }

    fn parse_identifier(
        &mut self,
        sink: &mut dyn IrSink,
        ops: &mut OperatorStack,
        prev: Item,
    ) -> Result<Item, SyntaxError> {
        let start = self.pos;
        let rest = &self.source[start..];
        let end = start + rest.find(|c| !is_identifier_part(c)).unwrap_or(rest.len());
        let name = &self.source[start..end];
        self.pos = end;

        let bindings = self.resolver.resolve(name);
        if bindings.is_empty() {
            return Err(self.error(SyntaxErrorKind::UnknownIdentifier(name.into()), start, end));
        }

        let mut values = SmallVec::<[Binding<'a>; 2]>::new();
        let mut groups = SmallVec::<[&'a FunctionGroup; 2]>::new();
        for binding in bindings {
            match binding {
                Binding::Function(group) => groups.push(group),
                other => values.push(other),
            }
        }

        if prev.is_value() {
            self.implicit_multiply(ops, sink, start, end)?;
        }

        let brace_follows = self.source[end..].trim_start().starts_with('(');
        if groups.is_empty() || (!brace_follows && !values.is_empty()) {
            return match values.as_slice() {
                [single] => {
                    emit_value(sink, *single);
                    Ok(Item::Identifier)
                }
                _ => Err(self.error(SyntaxErrorKind::AmbiguousIdentifier(name.into()), start, end)),
            };
        }
        if !brace_follows {
            return Err(self.error(SyntaxErrorKind::MissingCallBrace(name.into()), start, end));
        }

        self.skip_whitespace();
        let open = self.pos;
        self.pos += 1;
        let arguments = self.parse_arguments(open)?;
        let count = arguments.len();

        // `k(x)` where `k` names both a value and a function: with implicit
        // multiplication the value wins and the braces are a group.
        if count == 1 && values.len() == 1 && self.settings.implicit_multiplication {
            emit_value(sink, values[0]);
            Self::push_operator(ops, sink, Operator::Mul, open);
            for argument in arguments {
                argument.replay_into(sink);
            }
            return Ok(Item::End);
        }

        let winners: SmallVec<[&'a FunctionItem; 2]> =
            groups.iter().filter_map(|group| group.resolve(count)).collect();
        let function = match winners.as_slice() {
            [single] => (*single).clone(),
            [] => {
                return Err(self.error(
                    SyntaxErrorKind::WrongArgumentCount {
                        name: name.into(),
                        count,
                    },
                    start,
                    self.pos,
                ));
            }
            _ => {
                return Err(self.error(SyntaxErrorKind::AmbiguousIdentifier(name.into()), start, end));
            }
        };

        sink.emit(IrEvent::BeginCall);
        for (index, argument) in arguments.into_iter().enumerate() {
            if index > 0 {
                sink.emit(IrEvent::Separator);
            }
            argument.replay_into(sink);
        }
        sink.emit(IrEvent::Invoke {
            function,
            args: count,
        });
        Ok(Item::End)
    }

    fn implicit_multiply(
        &self,
        ops: &mut OperatorStack,
        sink: &mut dyn IrSink,
        start: usize,
        end: usize,
    ) -> Result<(), SyntaxError> {
        if !self.settings.implicit_multiplication {
            return Err(self.error(SyntaxErrorKind::MissingOperator, start, end));
        }
        Self::push_operator(ops, sink, Operator::Mul, start);
        Ok(())
    }

    /// Pops every stacked operator binding at least as tightly as `op`, then
    /// pushes `op`.
    fn push_operator(ops: &mut OperatorStack, sink: &mut dyn IrSink, op: Operator, at: usize) {
        while let Some(&(top, _)) = ops.last() {
            if top.precedence() < op.precedence() {
                break;
            }
            ops.pop();
            sink.emit(IrEvent::Operator(top));
        }
        ops.push((op, at));
    }

    fn flush(ops: &mut OperatorStack, sink: &mut dyn IrSink) {
        while let Some((op, _)) = ops.pop() {
            sink.emit(IrEvent::Operator(op));
        }
    }

    fn enter(&mut self, at: usize) -> Result<(), SyntaxError> {
        if self.depth >= self.settings.max_depth {
            return Err(self.error(
                SyntaxErrorKind::TooDeep(self.settings.max_depth),
                at,
                at + 1,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.source[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, kind: SyntaxErrorKind, start: usize, end: usize) -> SyntaxError {
        SyntaxError::new(kind, start..end, self.source)
    }
}

fn emit_value(sink: &mut dyn IrSink, binding: Binding<'_>) {
    match binding {
        Binding::Argument(index) => sink.emit(IrEvent::Argument(index)),
        Binding::Constant(value) => sink.emit(IrEvent::Constant(value)),
        Binding::Function(_) => {}
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod parser_test;
