//! Parser for the SSA input language.
//!
//! ```text
//! define %dot(%a, %b, %c) {
//! entry:
//!     %t0 = mul %a, %b
//!     %t1 = add %t0, %c
//!     br exit
//! exit:
//!     ret %t1
//! }
//! ```

use chumsky::prelude::*;
use chumsky::text::{ascii::ident, digits};
use smallvec::SmallVec;
use strum::IntoEnumIterator;

use crate::module::{BinOp, Block, CmpOp, Function, Instr, Module, Operand, Terminator};

/// One parse diagnostic with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub span: std::ops::Range<usize>,
    pub message: String,
}

fn whitespace<'src>() -> impl Parser<'src, &'src str, (), extra::Err<Rich<'src, char>>> + Clone {
    any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored()
        .labelled("whitespace")
}

fn percent_name<'src>()
-> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    just("%")
        .ignore_then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated()
                .at_least(1)
                .collect::<String>()
                .labelled("identifier"),
        )
        .labelled("register name")
}

fn label_name<'src>()
-> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    ident().map(|s: &str| s.to_string()).labelled("label")
}

fn operand<'src>() -> impl Parser<'src, &'src str, Operand, extra::Err<Rich<'src, char>>> + Clone {
    let literal = just('-')
        .or_not()
        .then(digits(10))
        .to_slice()
        .map(|s: &str| Operand::Lit(s.to_string()))
        .labelled("integer literal");

    choice((percent_name().map(Operand::Reg), literal)).labelled("operand")
}

fn cmp_op<'src>() -> impl Parser<'src, &'src str, CmpOp, extra::Err<Rich<'src, char>>> + Clone {
    ident()
        .validate(|s: &str, extra, emit| match CmpOp::from_str(s) {
            Some(op) => op,
            None => {
                emit.emit(Rich::custom(
                    extra.span(),
                    format!(
                        "unknown comparison predicate: {} (expected one of: {})",
                        s,
                        CmpOp::iter()
                            .map(|x| x.to_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ));
                CmpOp::Eq
            }
        })
        .labelled("comparison predicate")
}

fn instruction_dest<'src>()
-> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    percent_name()
        .padded()
        .then_ignore(just('='))
        .padded()
        .labelled("instruction destination")
}

fn operand_list<'src>(
    count: usize,
) -> impl Parser<'src, &'src str, SmallVec<[Operand; 3]>, extra::Err<Rich<'src, char>>> + Clone {
    operand()
        .padded()
        .separated_by(just(','))
        .exactly(count)
        .collect::<Vec<_>>()
        .map(SmallVec::from_vec)
}

fn instruction<'src>() -> impl Parser<'src, &'src str, Instr, extra::Err<Rich<'src, char>>> + Clone
{
    let bin_op = choice((
        just("add").to(BinOp::Add),
        just("sub").to(BinOp::Sub),
        just("mul").to(BinOp::Mul),
        just("div").to(BinOp::Div),
        just("rem").to(BinOp::Rem),
        just("shl").to(BinOp::Shl),
        just("lshr").to(BinOp::Lshr),
        just("ashr").to(BinOp::Ashr),
        just("and").to(BinOp::And),
        just("or").to(BinOp::Or),
        just("xor").to(BinOp::Xor),
    ))
    .labelled("operation");

    let bin = instruction_dest()
        .then(bin_op)
        .then_ignore(whitespace())
        .then(operand_list(2))
        .map(|((dest, op), mut operands)| Instr::Bin {
            dest,
            op,
            lhs: operands.remove(0),
            rhs: operands.remove(0),
        });

    let cmp = instruction_dest()
        .then_ignore(just("cmp"))
        .then_ignore(whitespace())
        .then(cmp_op())
        .then_ignore(whitespace())
        .then(operand_list(2))
        .map(|((dest, op), mut operands)| Instr::Cmp {
            dest,
            op,
            lhs: operands.remove(0),
            rhs: operands.remove(0),
        });

    let select = instruction_dest()
        .then_ignore(just("select"))
        .then_ignore(whitespace())
        .then(operand_list(3))
        .map(|(dest, mut operands)| Instr::Select {
            dest,
            cond: operands.remove(0),
            on_true: operands.remove(0),
            on_false: operands.remove(0),
        });

    let phi = instruction_dest()
        .then_ignore(just("phi"))
        .then_ignore(whitespace())
        .then(
            label_name()
                .padded()
                .then_ignore(just(','))
                .then(operand().padded())
                .delimited_by(just('['), just(']'))
                .padded()
                .separated_by(just(','))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(|(dest, incoming)| Instr::Phi { dest, incoming });

    choice((phi, cmp, select, bin)).labelled("instruction")
}

fn terminator<'src>()
-> impl Parser<'src, &'src str, Terminator, extra::Err<Rich<'src, char>>> + Clone {
    let br = just("br")
        .ignore_then(whitespace())
        .ignore_then(label_name())
        .map(|target| Terminator::Br { target })
        .labelled("branch terminator");

    let cbr = just("cbr")
        .ignore_then(whitespace())
        .ignore_then(operand().padded())
        .then_ignore(just(','))
        .then(label_name().padded())
        .then_ignore(just(','))
        .then(label_name().padded())
        .map(|((cond, on_true), on_false)| Terminator::Cbr {
            cond,
            on_true,
            on_false,
        })
        .labelled("conditional branch terminator");

    let ret = just("ret")
        .ignore_then(whitespace().ignore_then(operand()).or_not())
        .map(|value| Terminator::Ret { value })
        .labelled("return terminator");

    choice((cbr, br, ret)).labelled("terminator")
}

fn block<'src>() -> impl Parser<'src, &'src str, Block, extra::Err<Rich<'src, char>>> + Clone {
    label_name()
        .padded()
        .then_ignore(just(':'))
        .labelled("block label")
        .padded()
        .then(instruction().padded().repeated().collect::<Vec<_>>())
        .then(terminator().padded())
        .map(|((label, instrs), terminator)| Block {
            label,
            instrs,
            terminator,
        })
        .labelled("block")
}

fn function<'src>() -> impl Parser<'src, &'src str, Function, extra::Err<Rich<'src, char>>> + Clone
{
    just("define")
        .ignore_then(whitespace())
        .ignore_then(percent_name())
        .then(
            percent_name()
                .padded()
                .separated_by(just(','))
                .collect::<Vec<_>>()
                .delimited_by(just('('), just(')'))
                .padded(),
        )
        .then(
            block()
                .padded()
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just('{'), just('}'))
                .padded(),
        )
        .map(|((name, params), blocks)| Function {
            name,
            params,
            blocks,
        })
        .labelled("function")
}

fn module<'src>() -> impl Parser<'src, &'src str, Module, extra::Err<Rich<'src, char>>> {
    function()
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .map(|functions| Module { functions })
}

/// Parses a whole source file. On failure every diagnostic is returned
/// with its byte span so the caller can render a report.
pub fn parse_module(src: &str) -> Result<Module, Vec<ParseReport>> {
    module().parse(src).into_result().map_err(|errors| {
        errors
            .into_iter()
            .map(|error| ParseReport {
                span: error.span().start()..error.span().end(),
                message: error.reason().to_string(),
            })
            .collect()
    })
}
