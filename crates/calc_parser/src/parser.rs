use calc_ast::{Constant, Context, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::multispace0,
    combinator::map,
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::ParseError;

// ============================================================================
// Unicode Math Helpers
// ============================================================================

/// Convert a superscript digit character to its numeric value
fn superscript_to_digit(c: char) -> Option<u32> {
    match c {
        '⁰' => Some(0),
        '¹' => Some(1),
        '²' => Some(2),
        '³' => Some(3),
        '⁴' => Some(4),
        '⁵' => Some(5),
        '⁶' => Some(6),
        '⁷' => Some(7),
        '⁸' => Some(8),
        '⁹' => Some(9),
        _ => None,
    }
}

/// Parse a sequence of superscript digits into a number
/// Returns the number and the remaining string
fn parse_superscript_number(input: &str) -> Option<(u64, &str)> {
    let mut value: u64 = 0;
    let mut byte_len = 0;

    for c in input.chars() {
        match superscript_to_digit(c) {
            Some(digit) => {
                value = value.saturating_mul(10).saturating_add(digit as u64);
                byte_len += c.len_utf8();
            }
            None => break,
        }
    }

    if byte_len > 0 {
        Some((value, &input[byte_len..]))
    } else {
        None
    }
}

// Intermediate AST for parsing
#[derive(Debug, Clone)]
enum ParseNode {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Function(String, Vec<ParseNode>),
}

impl ParseNode {
    fn lower(self, ctx: &mut Context) -> ExprId {
        match self {
            ParseNode::Number(n) => ctx.add(Expr::Number(n)),
            ParseNode::Constant(c) => ctx.add(Expr::Constant(c)),
            ParseNode::Variable(s) => ctx.add(Expr::Variable(s)),
            ParseNode::Add(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Add(lid, rid))
            }
            ParseNode::Sub(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Sub(lid, rid))
            }
            ParseNode::Mul(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Mul(lid, rid))
            }
            ParseNode::Div(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Div(lid, rid))
            }
            ParseNode::Pow(b, e) => {
                let bid = b.lower(ctx);
                let eid = e.lower(ctx);
                ctx.add(Expr::Pow(bid, eid))
            }
            ParseNode::Neg(e) => {
                let eid = e.lower(ctx);
                ctx.add(Expr::Neg(eid))
            }
            ParseNode::Function(name, args) => {
                let arg_ids = args.into_iter().map(|a| a.lower(ctx)).collect();
                ctx.add(Expr::Function(name, arg_ids))
            }
        }
    }
}

fn nom_error(input: &str, kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

/// Convert a decimal string to BigRational.
/// Supports: "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123
fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let int_val: BigInt = if integer_part.is_empty() {
        BigInt::from(0)
    } else {
        integer_part.parse().unwrap_or_else(|_| BigInt::from(0))
    };

    if fractional_part.is_empty() {
        return BigRational::from_integer(int_val);
    }

    let denominator = pow10(fractional_part.len());
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::from(0));

    // BigRational::new reduces the fraction
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

fn pow10(k: usize) -> BigInt {
    let ten = BigInt::from(10);
    let mut acc = BigInt::from(1);
    for _ in 0..k {
        acc *= &ten;
    }
    acc
}

// Parser for numeric literals (integers and decimals)
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    use nom::bytes::complete::take_while;
    use nom::combinator::opt;

    let (remaining, (int_part, maybe_frac)) = pair(
        take_while(|c: char| c.is_ascii_digit()),
        opt(pair(tag("."), take_while(|c: char| c.is_ascii_digit()))),
    )(input)?;

    let frac_str = maybe_frac.map(|(_, frac)| frac).unwrap_or("");

    if int_part.is_empty() && frac_str.is_empty() {
        return Err(nom_error(input, nom::error::ErrorKind::Digit));
    }

    Ok((
        remaining,
        ParseNode::Number(decimal_to_rational(int_part, frac_str)),
    ))
}

fn is_word_boundary(remaining: &str) -> bool {
    remaining
        .chars()
        .next()
        .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
}

// Constants must not match prefixes of longer identifiers (e.g. 'exp', 'pivot')
fn parse_constant(input: &str) -> IResult<&str, ParseNode> {
    const NAMED: [(&str, Constant); 5] = [
        ("pi", Constant::Pi),
        ("oo", Constant::Infinity),
        ("nan", Constant::Undefined),
        ("e", Constant::E),
        ("E", Constant::E),
    ];

    for (name, constant) in NAMED {
        if input.starts_with(name) && is_word_boundary(&input[name.len()..]) {
            return Ok((&input[name.len()..], ParseNode::Constant(constant)));
        }
    }

    for (symbol, constant) in [('π', Constant::Pi), ('∞', Constant::Infinity)] {
        if input.starts_with(symbol) {
            return Ok((&input[symbol.len_utf8()..], ParseNode::Constant(constant)));
        }
    }

    Err(nom_error(input, nom::error::ErrorKind::Tag))
}

// Identifiers start with letter or underscore, then allow letters, digits, underscores
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(nom_error(input, nom::error::ErrorKind::Alpha)),
    }

    let len = 1 + chars
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();

    Ok((&input[len..], &input[..len]))
}

fn parse_variable(input: &str) -> IResult<&str, ParseNode> {
    map(parse_identifier, |s: &str| ParseNode::Variable(s.to_string()))(input)
}

fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("(")),
        parse_expr,
        preceded(multispace0, tag(")")),
    )(input)
}

// Parser for function calls
fn parse_function(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = preceded(multispace0, tag("("))(input)?;
    let (input, args) = separated_list0(preceded(multispace0, tag(",")), parse_expr)(input)?;
    let (input, _) = preceded(multispace0, tag(")"))(input)?;

    // ln is the natural logarithm, which `log` already denotes
    let name = if name == "ln" { "log" } else { name };

    Ok((input, ParseNode::Function(name.to_string(), args)))
}

fn parse_abs(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("|")),
        parse_expr,
        preceded(multispace0, tag("|")),
    )(input)
    .map(|(next_input, expr)| {
        (
            next_input,
            ParseNode::Function("abs".to_string(), vec![expr]),
        )
    })
}

// Parser for the square root symbol: √x, √(x+1)
fn parse_unicode_root(input: &str) -> IResult<&str, ParseNode> {
    let after_prefix = input
        .strip_prefix('√')
        .ok_or_else(|| nom_error(input, nom::error::ErrorKind::Tag))?;

    let (remaining, arg) = alt((parse_parens, parse_postfix))(after_prefix)?;

    Ok((
        remaining,
        ParseNode::Function("sqrt".to_string(), vec![arg]),
    ))
}

// Atom
fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            parse_unicode_root,
            parse_number,
            parse_function,
            parse_constant,
            parse_variable,
            parse_parens,
            parse_abs,
        )),
    )(input)
}

// Superscript exponents attach directly to their base: x² → x^2
fn parse_postfix(input: &str) -> IResult<&str, ParseNode> {
    let (input, atom) = parse_atom(input)?;

    if let Some((exp_value, remaining)) = parse_superscript_number(input) {
        let exp_node = ParseNode::Number(BigRational::from_integer(BigInt::from(exp_value)));
        return Ok((remaining, ParseNode::Pow(Box::new(atom), Box::new(exp_node))));
    }

    Ok((input, atom))
}

// Power - right associative: 2^3^4 = 2^(3^4)
// Accepts both `^` and `**`, and signed exponents: x^-2, x**-(a+b)
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_postfix(input)?;

    let try_op = preceded::<_, _, _, nom::error::Error<&str>, _, _>(
        multispace0,
        alt((tag("**"), tag("^"))),
    )(input);

    if let Ok((input, _)) = try_op {
        let (input, exp) = parse_power_exponent(input)?;
        Ok((input, ParseNode::Pow(Box::new(base), Box::new(exp))))
    } else {
        Ok((input, base))
    }
}

fn parse_power_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(pair(tag("-"), parse_power_exponent), |(_, expr)| {
                ParseNode::Neg(Box::new(expr))
            }),
            map(pair(tag("+"), parse_power_exponent), |(_, expr)| expr),
            parse_power,
        )),
    )(input)
}

// Unary
fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(
            pair(preceded(multispace0, tag("-")), parse_unary),
            |(_, expr)| ParseNode::Neg(Box::new(expr)),
        ),
        map(
            pair(preceded(multispace0, tag("+")), parse_unary),
            |(_, expr)| expr,
        ),
        parse_power,
    ))(input)
}

// Term - explicit * and / operators, then implicit multiplication: 2x, 3(x+y)
fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_unary(input)?;
    let (input, init) = parse_implicit_mul_chain(input, init)?;

    fold_many0(
        pair(
            preceded(multispace0, alt((tag("*"), tag("·"), tag("/")))),
            |inp| {
                let (inp, factor) = parse_unary(inp)?;
                parse_implicit_mul_chain(inp, factor)
            },
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            "/" => ParseNode::Div(Box::new(acc), Box::new(val)),
            _ => ParseNode::Mul(Box::new(acc), Box::new(val)),
        },
    )(input)
}

// Parse implicit multiplication chain: 2xy → 2*x*y, 2sin(x) → 2*sin(x)
// Only applies when there is no whitespace before the next factor.
fn parse_implicit_mul_chain(input: &str, acc: ParseNode) -> IResult<&str, ParseNode> {
    match input.chars().next() {
        Some(c) if (c.is_ascii_alphabetic() || c == '_' || c == '(') && can_implicit_mul(&acc) => {
            if let Ok((remaining, next_factor)) = parse_power(input) {
                let new_acc = ParseNode::Mul(Box::new(acc), Box::new(next_factor));
                return parse_implicit_mul_chain(remaining, new_acc);
            }
            Ok((input, acc))
        }
        _ => Ok((input, acc)),
    }
}

// Check if a ParseNode can be followed by implicit multiplication
fn can_implicit_mul(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) => true,
        ParseNode::Pow(_, exp) => matches!(**exp, ParseNode::Number(_)),
        ParseNode::Mul(_, right) => can_implicit_mul(right),
        ParseNode::Neg(inner) => can_implicit_mul(inner),
        _ => false,
    }
}

// Expr
fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((tag("+"), tag("-")))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => ParseNode::Add(Box::new(acc), Box::new(val)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(val)),
        },
    )(input)
}

pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let (remaining, expr_node) =
        parse_expr(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }

    Ok(expr_node.lower(ctx))
}
